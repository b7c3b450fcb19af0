//! The security gateway pipeline.
//!
//! Executed once per request, in order: canonicalize → validate shape →
//! rate-limit → authenticate → authorize → business handler → sanitize
//! response. Each gate may short-circuit with a typed
//! [`Reject`](crate::error::Reject); handlers run only once every gate has
//! passed, and only ever see the canonical form.
//!
//! # Modules
//!
//! - [`value`] - tagged value tree all gates operate on
//! - [`field_spec`] - per-field pollution and shape policy
//! - [`policy`] - route table (rate class, access rule per route)
//! - [`canonical`] - pollution/ambiguity resolution
//! - [`shape`] - structural injection defense
//! - [`auth`] - bearer verification producing a [`auth::Principal`]
//! - [`authorize`] - ownership and role checks
//! - [`rate_limit`] - fixed-window budgets per (class, client)
//! - [`sanitize`] - response scrubbing

pub mod auth;
pub mod authorize;
pub mod canonical;
pub mod field_spec;
pub mod policy;
pub mod rate_limit;
pub mod sanitize;
pub mod shape;
pub mod value;
