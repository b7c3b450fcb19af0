//! Gateway rejection taxonomy and its HTTP rendering.
//!
//! Every gate reports failure through [`Reject`], which carries a
//! [`VerdictReason`]. The client-facing body is a fixed, reason-coded
//! envelope; the internal cause is logged, never serialized.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Why a request was rejected by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerdictReason {
    /// Undecodable or structurally broken input (bad JSON, traversal, NUL).
    MalformedInput,
    /// Parameter pollution: conflicting duplicates or list-for-scalar.
    PollutionDetected,
    /// Operator-keyed or prototype-polluting object shapes, oversized values.
    InjectionDetected,
    /// No `Authorization` header on a protected route.
    AuthMissing,
    /// Bearer credential present but unverifiable.
    AuthInvalid,
    /// Verified credential whose `exp` has passed.
    AuthExpired,
    /// Authenticated caller lacks access to the addressed resource.
    Forbidden,
    /// Window budget exhausted for this route class and caller.
    RateLimited,
    /// Anything unexpected. The only reason that maps to 500.
    InternalUnexpected,
}

impl VerdictReason {
    pub fn status(self) -> StatusCode {
        match self {
            Self::MalformedInput | Self::PollutionDetected | Self::InjectionDetected => {
                StatusCode::BAD_REQUEST
            }
            // AuthInvalid and AuthExpired deliberately share a status so the
            // response is not an oracle for token validity.
            Self::AuthMissing | Self::AuthInvalid | Self::AuthExpired => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalUnexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::MalformedInput => "malformed_input",
            Self::PollutionDetected => "pollution_detected",
            Self::InjectionDetected => "injection_detected",
            Self::AuthMissing => "auth_missing",
            Self::AuthInvalid => "auth_invalid",
            Self::AuthExpired => "auth_expired",
            Self::Forbidden => "forbidden",
            Self::RateLimited => "rate_limited",
            Self::InternalUnexpected => "internal_error",
        }
    }

    /// Fixed user-facing message. Never interpolates the internal cause.
    pub fn message(self) -> &'static str {
        match self {
            Self::MalformedInput => "Request could not be parsed",
            Self::PollutionDetected => "Conflicting values supplied for a request field",
            Self::InjectionDetected => "Request contains a disallowed value shape",
            Self::AuthMissing => "Authentication required",
            Self::AuthInvalid => "Authentication failed",
            Self::AuthExpired => "Authentication failed",
            Self::Forbidden => "Access denied",
            Self::RateLimited => "Too many requests",
            Self::InternalUnexpected => "An internal error occurred",
        }
    }
}

/// Terminal outcome of a failed gate.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}", .reason.code())]
pub struct Reject {
    pub reason: VerdictReason,
    /// Seconds until the caller's window resets. Only set for `RateLimited`.
    pub retry_after: Option<u64>,
}

impl Reject {
    pub fn new(reason: VerdictReason) -> Self {
        Self {
            reason,
            retry_after: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            reason: VerdictReason::RateLimited,
            retry_after: Some(retry_after),
        }
    }
}

impl From<VerdictReason> for Reject {
    fn from(reason: VerdictReason) -> Self {
        Self::new(reason)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

#[derive(Serialize)]
struct ErrorInfo {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for Reject {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorInfo {
                code: self.reason.code(),
                message: self.reason.message(),
            },
        };

        let mut response = (self.reason.status(), Json(body)).into_response();

        if let Some(secs) = self.retry_after
            && let Ok(value) = HeaderValue::from_str(&secs.to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            VerdictReason::PollutionDetected.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            VerdictReason::InjectionDetected.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(VerdictReason::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            VerdictReason::RateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            VerdictReason::InternalUnexpected.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_expired_and_invalid_share_status() {
        assert_eq!(
            VerdictReason::AuthInvalid.status(),
            VerdictReason::AuthExpired.status()
        );
        // Same message too, so the body is not an oracle either.
        assert_eq!(
            VerdictReason::AuthInvalid.message(),
            VerdictReason::AuthExpired.message()
        );
        assert_ne!(
            VerdictReason::AuthInvalid.code(),
            VerdictReason::AuthExpired.code()
        );
    }

    #[test]
    fn test_rate_limited_carries_retry_after() {
        let response = Reject::rate_limited(42).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            &HeaderValue::from_static("42")
        );
    }
}
