//! Request canonicalization.
//!
//! Collapses the four raw input sources (query multimap, header multimap,
//! JSON body tree, path segments) into one deterministic, typed value per
//! logical field, resolving duplication and pollution before any other gate
//! looks at the request.

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, header};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Reject, VerdictReason};
use crate::gateway::field_spec::{FieldRegistry, FieldShape, PollutionPolicy};
use crate::gateway::value::ValueNode;

/// The untrusted request exactly as it arrived.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    /// Raw, undecoded URI path.
    pub path: String,
    /// Matched route template (e.g. `/profiles/{user_id}`).
    pub route_template: String,
    /// Raw query string, still percent-encoded.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body_bytes: Bytes,
}

/// The single deterministic representation handed to later gates and,
/// eventually, to the business handler.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRequest {
    pub method: Method,
    pub path: String,
    pub query: BTreeMap<String, ValueNode>,
    pub body: ValueNode,
    pub auth_header: Option<String>,
    pub route_params: BTreeMap<String, String>,
}

/// Resolves raw requests into [`CanonicalRequest`]s.
pub struct Canonicalizer {
    registry: Arc<FieldRegistry>,
}

impl Canonicalizer {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self { registry }
    }

    pub fn canonicalize(&self, raw: &RawRequest) -> Result<CanonicalRequest, Reject> {
        let route_params = canonicalize_path(&raw.path, &raw.route_template)?;
        let query = self.canonicalize_query(raw.query.as_deref().unwrap_or(""))?;
        let auth_header = canonical_auth_header(&raw.headers)?;
        let body = self.canonicalize_body(&raw.body_bytes)?;

        Ok(CanonicalRequest {
            method: raw.method.clone(),
            path: raw.path.clone(),
            query,
            body,
            auth_header,
            route_params,
        })
    }

    /// Groups query pairs by key, applying each field's pollution policy.
    fn canonicalize_query(&self, raw_query: &str) -> Result<BTreeMap<String, ValueNode>, Reject> {
        let mut out: BTreeMap<String, ValueNode> = BTreeMap::new();

        for (key, value) in parse_query_pairs(raw_query)? {
            if out.contains_key(&key) {
                match self.registry.policy(&key) {
                    PollutionPolicy::FirstWins => {
                        tracing::debug!(field = %key, "dropping duplicate query value");
                        continue;
                    }
                    PollutionPolicy::RejectOnDuplicate => {
                        tracing::warn!(field = %key, "duplicate query value for protected field");
                        return Err(VerdictReason::PollutionDetected.into());
                    }
                }
            }
            out.insert(key, ValueNode::text(value));
        }

        Ok(out)
    }

    /// Parses the JSON body and rejects list-for-scalar pollution at the top
    /// level. Duplicate object keys are already a parse error ([`ValueNode`]'s
    /// deserializer), so that case never reaches this point.
    fn canonicalize_body(&self, bytes: &Bytes) -> Result<ValueNode, Reject> {
        let body = ValueNode::from_json_bytes(bytes).map_err(|e| {
            tracing::warn!(error = %e, "rejecting unparseable body");
            Reject::new(VerdictReason::MalformedInput)
        })?;

        if let ValueNode::Object(fields) = &body {
            for (name, value) in fields {
                let spec = self.registry.spec(name);
                if spec.shape == FieldShape::Scalar && matches!(value, ValueNode::List(_)) {
                    // `email: ["a@x.com","b@x.com"]` style array smuggling.
                    tracing::warn!(field = %name, "list supplied for scalar field");
                    return Err(VerdictReason::PollutionDetected.into());
                }
            }
        }

        Ok(body)
    }
}

/// Resolves the one canonical `Authorization` value.
///
/// `HeaderMap` already folds header-name casings together, so two spellings
/// of the same header surface as multiple values here. Authorization is
/// auth-critical: conflicting values reject, identical repeats collapse.
fn canonical_auth_header(headers: &HeaderMap) -> Result<Option<String>, Reject> {
    let mut canonical: Option<&str> = None;

    for value in headers.get_all(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| Reject::new(VerdictReason::MalformedInput))?;
        match canonical {
            None => canonical = Some(value),
            Some(existing) if existing == value => {}
            Some(_) => {
                tracing::warn!("conflicting Authorization header values");
                return Err(VerdictReason::PollutionDetected.into());
            }
        }
    }

    Ok(canonical.map(str::to_owned))
}

/// Scans a raw URI path for traversal and smuggling shapes without binding
/// any route. Runs even for paths no route matched, so traversal probes read
/// as malformed input rather than unknown routes.
pub fn check_raw_path(raw_path: &str) -> Result<(), Reject> {
    for raw in raw_path.split('/').filter(|s| !s.is_empty()) {
        let decoded = decode_segment_once(raw)?;
        check_segment(&decoded)?;
    }
    Ok(())
}

/// Validates every raw path segment and binds route parameters from the
/// matched template.
///
/// Segments are percent-decoded exactly once. After that single decode the
/// segment must not contain traversal sequences, a further percent-escape
/// (double encoding), a NUL byte, or a raw delimiter. Segments are opaque:
/// nothing in them is ever treated as further routing structure.
fn canonicalize_path(
    raw_path: &str,
    route_template: &str,
) -> Result<BTreeMap<String, String>, Reject> {
    let raw_segments: Vec<&str> = raw_path.split('/').filter(|s| !s.is_empty()).collect();
    let template_segments: Vec<&str> = route_template
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    if raw_segments.len() != template_segments.len() {
        // The router matched, so a mismatch means the path smuggled empty
        // or collapsed segments.
        return Err(VerdictReason::MalformedInput.into());
    }

    let mut params = BTreeMap::new();

    for (raw, template) in raw_segments.iter().zip(&template_segments) {
        let decoded = decode_segment_once(raw)?;
        check_segment(&decoded)?;

        if let Some(name) = template
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
        {
            params.insert(name.to_owned(), decoded);
        }
    }

    Ok(params)
}

/// Percent-decodes a path segment exactly once.
fn decode_segment_once(raw: &str) -> Result<String, Reject> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16));
            let lo = bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16));
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    out.push((hi * 16 + lo) as u8);
                    i += 3;
                }
                _ => return Err(VerdictReason::MalformedInput.into()),
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).map_err(|_| Reject::new(VerdictReason::MalformedInput))
}

/// Rejects dangerous shapes in a once-decoded path segment.
fn check_segment(segment: &str) -> Result<(), Reject> {
    if segment.contains('\0') {
        return Err(VerdictReason::MalformedInput.into());
    }
    if segment == ".." || segment.contains("../") || segment.contains("..\\") {
        tracing::warn!("path traversal sequence in segment");
        return Err(VerdictReason::MalformedInput.into());
    }
    // A percent-escape that survived one decode means double encoding.
    if has_percent_escape(segment) {
        tracing::warn!("double percent-encoding in segment");
        return Err(VerdictReason::MalformedInput.into());
    }
    if segment.contains([';', '&', '?', '#']) {
        return Err(VerdictReason::MalformedInput.into());
    }
    Ok(())
}

fn has_percent_escape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.windows(3).any(|w| {
        w[0] == b'%' && (w[1] as char).is_ascii_hexdigit() && (w[2] as char).is_ascii_hexdigit()
    })
}

/// Splits a raw query string into once-decoded `(key, value)` pairs in
/// arrival order. `+` decodes to space, per form encoding.
fn parse_query_pairs(raw_query: &str) -> Result<Vec<(String, String)>, Reject> {
    let mut pairs = Vec::new();

    for piece in raw_query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = piece.split_once('=').unwrap_or((piece, ""));
        pairs.push((decode_form_component(key)?, decode_form_component(value)?));
    }

    Ok(pairs)
}

fn decode_form_component(raw: &str) -> Result<String, Reject> {
    decode_segment_once(&raw.replace('+', "%20"))
}
