//! # match-gateway
//!
//! Request canonicalization and security-validation gateway for a
//! matrimonial-matching API.
//!
//! Every inbound request passes a five-gate pipeline before any business
//! handler runs:
//!
//! 1. **Canonicalizer** - collapses polluted/duplicated input from query,
//!    headers, body and path into one typed value per field
//! 2. **Shape Validator** - rejects operator-keyed objects, prototype
//!    pollution, oversized payloads and hostile control characters
//! 3. **RateLimiter** - fixed-window budgets per route class and caller
//! 4. **Authenticator** - HS256 bearer verification producing a `Principal`
//! 5. **Authorizer** - ownership/role checks from token claims only
//!
//! and every outbound response is scrubbed of implementation detail by the
//! **Response Sanitizer**.
//!
//! ## Quick Start
//!
//! ```bash
//! export JWT_SECRET="change-me-to-a-long-secret"
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Loaded from environment variables via [`config::Config`]; see the
//! [`config`] module for available options.

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod server;
pub mod state;

pub use error::{Reject, VerdictReason};
pub use state::AppState;

/// Commonly used types for external consumers and integration tests.
pub mod prelude {
    pub use crate::api::routes::app_router;
    pub use crate::config::Config;
    pub use crate::error::{Reject, VerdictReason};
    pub use crate::gateway::auth::{Claims, Principal, Role};
    pub use crate::gateway::canonical::CanonicalRequest;
    pub use crate::state::AppState;
}
