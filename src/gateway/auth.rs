//! Bearer credential verification.
//!
//! The only identity input the gateway trusts is the canonical
//! `Authorization` value. Tokens are never read from query parameters or
//! cookies, and no claim is believed before the signature verifies against
//! the configured secret with an HS256-only algorithm allow-list.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::{Deserialize, Serialize};

use crate::error::{Reject, VerdictReason};

const BEARER_SCHEME: &str = "Bearer ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Admin,
}

/// Verified caller identity. Built exclusively from token claims, created
/// per-request and discarded with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Verifies bearer tokens against a single configured HS256 secret.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact; leeway would blur the AuthExpired boundary.
        validation.leeway = 0;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Authenticates the canonical `Authorization` value.
    ///
    /// The scheme is the literal, case-sensitive `Bearer `; anything else is
    /// `AuthInvalid`, never a 500. Structurally broken tokens are rejected
    /// before any cryptographic work.
    pub fn authenticate(&self, auth_header: Option<&str>) -> Result<Principal, Reject> {
        let header = auth_header.ok_or(Reject::new(VerdictReason::AuthMissing))?;

        let token = header
            .strip_prefix(BEARER_SCHEME)
            .ok_or(Reject::new(VerdictReason::AuthInvalid))?;
        if token.is_empty() {
            return Err(VerdictReason::AuthInvalid.into());
        }

        check_token_structure(token)?;

        // Algorithm allow-list before signature work: `none` or anything
        // other than HS256 is confusion, not a candidate.
        let token_header =
            decode_header(token).map_err(|_| Reject::new(VerdictReason::AuthInvalid))?;
        if token_header.alg != Algorithm::HS256 {
            tracing::warn!(alg = ?token_header.alg, "token with disallowed algorithm");
            return Err(VerdictReason::AuthInvalid.into());
        }

        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Reject::new(VerdictReason::AuthExpired)
                }
                _ => {
                    tracing::warn!(error = %e, "token verification failed");
                    Reject::new(VerdictReason::AuthInvalid)
                }
            }
        })?;

        principal_from_claims(data.claims)
    }
}

/// Requires three non-empty dot-separated base64url segments.
fn check_token_structure(token: &str) -> Result<(), Reject> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        return Err(VerdictReason::AuthInvalid.into());
    }
    for segment in segments {
        if URL_SAFE_NO_PAD.decode(segment).is_err() {
            return Err(VerdictReason::AuthInvalid.into());
        }
    }
    Ok(())
}

fn principal_from_claims(claims: Claims) -> Result<Principal, Reject> {
    let issued_at = DateTime::from_timestamp(claims.iat, 0)
        .ok_or(Reject::new(VerdictReason::AuthInvalid))?;
    let expires_at = DateTime::from_timestamp(claims.exp, 0)
        .ok_or(Reject::new(VerdictReason::AuthInvalid))?;

    if claims.sub.is_empty() {
        return Err(VerdictReason::AuthInvalid.into());
    }

    Ok(Principal {
        user_id: claims.sub,
        email: claims.email,
        role: claims.role,
        issued_at,
        expires_at,
    })
}
