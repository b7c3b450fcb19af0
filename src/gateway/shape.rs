//! Structural validation of canonicalized input.
//!
//! Rejects dangerous value shapes independent of business meaning:
//! query-operator keys, prototype-pollution keys, oversized strings and
//! lists, declared-type violations, and hostile control characters.

use std::sync::Arc;

use crate::error::{Reject, VerdictReason};
use crate::gateway::canonical::CanonicalRequest;
use crate::gateway::field_spec::{
    DEFAULT_MAX_LIST_LEN, DEFAULT_MAX_STR_LEN, FieldRegistry, FieldShape, FieldSpec,
};
use crate::gateway::value::{Scalar, ValueNode};

/// Query-operator keys that alter downstream query semantics. Any other
/// `$`-prefixed key is rejected by the prefix rule as well; the list exists
/// so the contract is explicit.
const OPERATOR_KEYS: &[&str] = &[
    "$ne", "$gt", "$gte", "$lt", "$lte", "$in", "$nin", "$regex", "$where", "$exists", "$or",
    "$and", "$not", "$expr", "$match", "$group", "$project", "$lookup", "$unwind", "$facet",
];

/// Keys that corrupt prototype-based runtimes downstream.
const PROTOTYPE_KEYS: &[&str] = &["__proto__", "constructor", "prototype"];

/// Characters never allowed in text leaves: NUL, BOM, RTL override.
const FORBIDDEN_CHARS: &[char] = &['\0', '\u{FEFF}', '\u{202E}'];

/// Validates the body and query trees of a [`CanonicalRequest`].
pub struct ShapeValidator {
    registry: Arc<FieldRegistry>,
}

impl ShapeValidator {
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        Self { registry }
    }

    pub fn validate(&self, canonical: &CanonicalRequest) -> Result<(), Reject> {
        for (field, value) in &canonical.query {
            check_key(field)?;
            check_text(field, DEFAULT_MAX_STR_LEN)?;
            self.validate_field(field, value)?;
        }

        match &canonical.body {
            ValueNode::Object(fields) => {
                for (field, value) in fields {
                    check_key(field)?;
                    check_text(field, DEFAULT_MAX_STR_LEN)?;
                    self.validate_field(field, value)?;
                }
            }
            other => walk(other, DEFAULT_MAX_STR_LEN)?,
        }

        Ok(())
    }

    /// Enforces one field's declared shape, then walks its subtree.
    fn validate_field(&self, field: &str, value: &ValueNode) -> Result<(), Reject> {
        let spec = self.registry.spec(field);
        check_declared_shape(field, spec, value)?;
        walk(value, spec.max_str_len)
    }
}

fn check_declared_shape(field: &str, spec: &FieldSpec, value: &ValueNode) -> Result<(), Reject> {
    match &spec.shape {
        FieldShape::Any => Ok(()),
        FieldShape::Scalar => {
            if value.is_scalar_or_null() {
                Ok(())
            } else {
                tracing::warn!(field, "non-scalar value for scalar field");
                Err(VerdictReason::InjectionDetected.into())
            }
        }
        FieldShape::BoundedList { max_len } => match value.as_list() {
            Some(items) if items.len() <= *max_len => Ok(()),
            Some(items) => {
                tracing::warn!(field, len = items.len(), "list exceeds declared bound");
                Err(VerdictReason::InjectionDetected.into())
            }
            None => Err(VerdictReason::InjectionDetected.into()),
        },
        FieldShape::NestedObject { allowed_keys } => match value.as_object() {
            Some(map) => {
                for key in map.keys() {
                    if !allowed_keys.contains(&key.as_str()) {
                        tracing::warn!(field, key = %key, "undeclared key in nested object");
                        return Err(VerdictReason::InjectionDetected.into());
                    }
                }
                Ok(())
            }
            None => Err(VerdictReason::InjectionDetected.into()),
        },
    }
}

/// Recursively validates a subtree: banned keys at every depth, list and
/// string caps, forbidden characters. Oversized input rejects, never
/// truncates.
fn walk(node: &ValueNode, max_str_len: usize) -> Result<(), Reject> {
    match node {
        ValueNode::Null | ValueNode::Scalar(Scalar::Bool(_) | Scalar::Number(_)) => Ok(()),
        ValueNode::Scalar(Scalar::Text(text)) => check_text(text, max_str_len),
        ValueNode::List(items) => {
            if items.len() > DEFAULT_MAX_LIST_LEN {
                return Err(VerdictReason::InjectionDetected.into());
            }
            items.iter().try_for_each(|item| walk(item, max_str_len))
        }
        ValueNode::Object(map) => {
            for (key, value) in map {
                check_key(key)?;
                check_text(key, max_str_len)?;
                walk(value, max_str_len)?;
            }
            Ok(())
        }
    }
}

fn check_key(key: &str) -> Result<(), Reject> {
    if key.starts_with('$') || OPERATOR_KEYS.contains(&key) {
        tracing::warn!(key = %key, "operator key in request");
        return Err(VerdictReason::InjectionDetected.into());
    }
    if PROTOTYPE_KEYS.contains(&key) {
        tracing::warn!(key = %key, "prototype-polluting key in request");
        return Err(VerdictReason::InjectionDetected.into());
    }
    Ok(())
}

fn check_text(text: &str, max_len: usize) -> Result<(), Reject> {
    if text.chars().count() > max_len {
        return Err(VerdictReason::InjectionDetected.into());
    }
    if text.contains(FORBIDDEN_CHARS) {
        return Err(VerdictReason::InjectionDetected.into());
    }
    Ok(())
}
