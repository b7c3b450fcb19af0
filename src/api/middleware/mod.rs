//! HTTP middleware for request processing and protection.
//!
//! [`gateway`] is the five-gate security pipeline;
//! [`crate::gateway::sanitize`] provides the outermost response scrub;
//! [`tracing`] adds per-request spans.

pub mod gateway;
pub mod tracing;
