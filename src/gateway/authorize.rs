//! Resource authorization.
//!
//! Decisions depend only on the verified [`Principal`] and the route: any
//! `user_id`, `role`, or `isAdmin` field a caller puts in the body or query
//! is structurally invisible here, so a payload can never elevate privilege.

use std::collections::BTreeMap;

use crate::error::{Reject, VerdictReason};
use crate::gateway::auth::{Principal, Role};
use crate::gateway::policy::Access;

/// Checks the principal against the route's access rule.
///
/// `principal` is `None` only for `Public` routes; the gateway authenticates
/// before authorizing everywhere else.
pub fn authorize(
    access: Access,
    principal: Option<&Principal>,
    route_params: &BTreeMap<String, String>,
) -> Result<(), Reject> {
    match access {
        Access::Public => Ok(()),
        Access::Authenticated => {
            principal.ok_or(Reject::new(VerdictReason::AuthMissing))?;
            Ok(())
        }
        Access::OwnerOnly { param } => {
            let principal = principal.ok_or(Reject::new(VerdictReason::AuthMissing))?;
            if principal.role == Role::Admin {
                return Ok(());
            }
            let owner = route_params
                .get(param)
                .ok_or(Reject::new(VerdictReason::InternalUnexpected))?;
            if *owner == principal.user_id {
                Ok(())
            } else {
                tracing::warn!(user = %principal.user_id, resource = %owner, "cross-user access denied");
                Err(VerdictReason::Forbidden.into())
            }
        }
        Access::AdminOnly => {
            let principal = principal.ok_or(Reject::new(VerdictReason::AuthMissing))?;
            if principal.role == Role::Admin {
                Ok(())
            } else {
                Err(VerdictReason::Forbidden.into())
            }
        }
    }
}
