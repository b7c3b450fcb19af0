//! The gateway pipeline as an Axum middleware layer.
//!
//! Runs canonicalization, shape validation, rate limiting, authentication
//! and authorization in order, short-circuiting on the first rejection. The
//! business handler only ever receives the [`CanonicalRequest`] (and, on
//! protected routes, the [`Principal`]) via request extensions; the raw
//! request shape cannot influence it.

use axum::{
    body::{Body, to_bytes},
    extract::{ConnectInfo, MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use crate::error::{Reject, VerdictReason};
use crate::gateway::authorize::authorize;
use crate::gateway::canonical::{self, RawRequest};
use crate::gateway::policy::{self, Access};
use crate::gateway::sanitize;
use crate::state::AppState;

pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, Reject> {
    // Traversal probes reject as malformed input whether or not their path
    // matches a route.
    canonical::check_raw_path(req.uri().path())?;

    // Routes that did not match carry no template; they are a plain 404 and
    // no gate needs to run.
    let Some(matched) = req.extensions().get::<MatchedPath>().cloned() else {
        return Ok(sanitize::not_found());
    };

    // The literal HTTP method is the only verb considered. A known path with
    // an undeclared verb reads as an unknown route.
    let Some(rule) = policy::rule_for(req.method(), matched.as_str()) else {
        return Ok(sanitize::not_found());
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());

    let (parts, body) = req.into_parts();

    let body_bytes = to_bytes(body, st.max_body_bytes).await.map_err(|e| {
        tracing::warn!(error = %e, "request body over limit or unreadable");
        Reject::new(VerdictReason::MalformedInput)
    })?;

    let raw = RawRequest {
        method: parts.method.clone(),
        path: parts.uri.path().to_owned(),
        route_template: matched.as_str().to_owned(),
        query: parts.uri.query().map(str::to_owned),
        headers: parts.headers.clone(),
        body_bytes: body_bytes.clone(),
    };

    // Gate order fixes which reason wins when several would apply: a
    // polluted field reports PollutionDetected even when the request is
    // also unauthenticated.
    let canonical = st.canonicalizer.canonicalize(&raw)?;
    st.shape_validator.validate(&canonical)?;

    // Bucket keying must not trust the raw header: an unverified credential
    // is attacker-controlled, and a flooder rotating garbage tokens would
    // mint a fresh bucket per request. Verification runs here only to pick
    // the key; its rejection reason surfaces after the rate gate.
    let verified = match rule.access {
        Access::Public => None,
        _ => st
            .verifier
            .authenticate(canonical.auth_header.as_deref())
            .ok(),
    };
    let client = st
        .limiter
        .client_key(verified.as_ref().map(|p| p.user_id.as_str()), peer);
    let slot = st.limiter.check(rule.class, client)?;

    // A rejection past this point is still a completed request and keeps
    // its slot; only a cancelled in-flight request releases one (the slot
    // drops uncommitted).
    let auth_gates = || {
        let principal = match rule.access {
            Access::Public => None,
            _ => match verified {
                Some(principal) => Some(principal),
                // Verify again to report the precise failure reason.
                None => Some(st.verifier.authenticate(canonical.auth_header.as_deref())?),
            },
        };
        authorize(rule.access, principal.as_ref(), &canonical.route_params)?;
        Ok::<_, Reject>(principal)
    };
    let principal = match auth_gates() {
        Ok(principal) => principal,
        Err(reject) => {
            slot.commit();
            return Err(reject);
        }
    };

    let mut req = Request::from_parts(parts, Body::from(body_bytes));
    req.extensions_mut().insert(canonical);
    if let Some(principal) = principal {
        req.extensions_mut().insert(principal);
    }

    let response = next.run(req).await;

    // Committed only after the handler finished; a cancelled request drops
    // the slot and its budget is returned.
    slot.commit();

    Ok(response)
}
