//! Route policy table.
//!
//! Each route the gateway fronts declares its rate-limit class and access
//! rule here. The verb is always the literal HTTP method of the request;
//! method-override headers are never consulted anywhere in the crate.

use axum::http::Method;

/// Rate-limit class. Each class has its own window budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    AuthLogin,
    AuthOtp,
    GenericApi,
}

impl RouteClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthLogin => "auth-login",
            Self::AuthOtp => "auth-otp",
            Self::GenericApi => "generic-api",
        }
    }
}

/// Who may pass the authorizer for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No principal required (login, OTP verification).
    Public,
    /// Any verified principal. Browse/search endpoints live here.
    Authenticated,
    /// The route parameter named here must equal the principal's user id.
    /// Admins bypass the ownership check.
    OwnerOnly { param: &'static str },
    /// Admin role only.
    AdminOnly,
}

/// One protected route.
#[derive(Debug)]
pub struct RouteRule {
    pub method: &'static str,
    /// Axum path template, as reported by `MatchedPath`.
    pub path: &'static str,
    pub class: RouteClass,
    pub access: Access,
}

/// Every route the gateway knows. Anything else is a 404.
pub const ROUTES: &[RouteRule] = &[
    RouteRule {
        method: "POST",
        path: "/auth/login",
        class: RouteClass::AuthLogin,
        access: Access::Public,
    },
    RouteRule {
        method: "POST",
        path: "/auth/otp/verify",
        class: RouteClass::AuthOtp,
        access: Access::Public,
    },
    RouteRule {
        method: "GET",
        path: "/user-personal",
        class: RouteClass::GenericApi,
        access: Access::Authenticated,
    },
    RouteRule {
        method: "PUT",
        path: "/user-personal",
        class: RouteClass::GenericApi,
        access: Access::Authenticated,
    },
    RouteRule {
        method: "POST",
        path: "/user-personal/upload/photos",
        class: RouteClass::GenericApi,
        access: Access::Authenticated,
    },
    RouteRule {
        method: "DELETE",
        path: "/user-personal/upload/photos/{photo_id}",
        class: RouteClass::GenericApi,
        access: Access::Authenticated,
    },
    // Public-read browse endpoint: any principal may view any profile.
    RouteRule {
        method: "GET",
        path: "/profiles/{user_id}",
        class: RouteClass::GenericApi,
        access: Access::Authenticated,
    },
    RouteRule {
        method: "DELETE",
        path: "/profiles/{user_id}",
        class: RouteClass::GenericApi,
        access: Access::OwnerOnly { param: "user_id" },
    },
    RouteRule {
        method: "GET",
        path: "/search",
        class: RouteClass::GenericApi,
        access: Access::Authenticated,
    },
    RouteRule {
        method: "POST",
        path: "/compare",
        class: RouteClass::GenericApi,
        access: Access::Authenticated,
    },
    RouteRule {
        method: "GET",
        path: "/admin/reports",
        class: RouteClass::GenericApi,
        access: Access::AdminOnly,
    },
];

/// Looks up the rule for a matched route template and literal method.
pub fn rule_for(method: &Method, matched_path: &str) -> Option<&'static RouteRule> {
    ROUTES
        .iter()
        .find(|r| r.method == method.as_str() && r.path == matched_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_is_public_and_classed() {
        let rule = rule_for(&Method::POST, "/auth/login").unwrap();
        assert_eq!(rule.class, RouteClass::AuthLogin);
        assert_eq!(rule.access, Access::Public);
    }

    #[test]
    fn test_profile_delete_is_owner_scoped() {
        let rule = rule_for(&Method::DELETE, "/profiles/{user_id}").unwrap();
        assert_eq!(rule.access, Access::OwnerOnly { param: "user_id" });
    }

    #[test]
    fn test_unknown_method_has_no_rule() {
        // Wrong verb on a known path resolves to nothing; the surface
        // reports it as 404, not 405.
        assert!(rule_for(&Method::PATCH, "/auth/login").is_none());
    }
}
