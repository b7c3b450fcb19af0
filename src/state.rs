//! Shared application state for the gateway.

use std::sync::Arc;

use crate::gateway::auth::TokenVerifier;
use crate::gateway::canonical::Canonicalizer;
use crate::gateway::field_spec::FieldRegistry;
use crate::gateway::rate_limit::RateLimiter;
use crate::gateway::shape::ShapeValidator;

/// Everything the gateway pipeline needs, cheap to clone per request.
///
/// Note what is absent: no per-request data. `CanonicalRequest` and
/// `Principal` travel as request extensions and die with the request.
#[derive(Clone)]
pub struct AppState {
    pub canonicalizer: Arc<Canonicalizer>,
    pub shape_validator: Arc<ShapeValidator>,
    pub verifier: Arc<TokenVerifier>,
    pub limiter: Arc<RateLimiter>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &crate::config::Config) -> Self {
        let registry = Arc::new(FieldRegistry::standard());
        Self {
            canonicalizer: Arc::new(Canonicalizer::new(registry.clone())),
            shape_validator: Arc::new(ShapeValidator::new(registry)),
            verifier: Arc::new(TokenVerifier::new(&config.jwt_secret)),
            limiter: Arc::new(RateLimiter::new(config.rate_budgets())),
            max_body_bytes: config.max_body_bytes,
        }
    }
}
