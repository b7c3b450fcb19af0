//! Per-field canonicalization and validation policy.
//!
//! Fields the application never declared still get a spec: the registry
//! falls back to a conservative default (scalar, first-wins, 10k chars),
//! while every authentication-relevant field is pinned to
//! reject-on-duplicate so pollution can never pick a winner silently.

use std::collections::HashMap;

/// What to do when the same logical field arrives more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollutionPolicy {
    /// Keep the first occurrence, discard the rest.
    FirstWins,
    /// Reject the request with `PollutionDetected`.
    RejectOnDuplicate,
}

/// Declared shape of a field's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// Undeclared: no cardinality constraint, bans and size caps still apply.
    Any,
    /// A single scalar (string, number, bool) or null.
    Scalar,
    /// A list of scalars, at most `max_len` elements.
    BoundedList { max_len: usize },
    /// An object whose keys must all come from `allowed_keys`.
    NestedObject { allowed_keys: &'static [&'static str] },
}

/// Validation spec for one logical field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub shape: FieldShape,
    /// Maximum length for any text leaf under this field.
    pub max_str_len: usize,
    pub policy: PollutionPolicy,
}

/// Default cap for text leaves without a stricter override.
pub const DEFAULT_MAX_STR_LEN: usize = 10_000;
/// Default cap for list fields without a declared bound.
pub const DEFAULT_MAX_LIST_LEN: usize = 50;

impl FieldSpec {
    fn scalar(policy: PollutionPolicy, max_str_len: usize) -> Self {
        Self {
            shape: FieldShape::Scalar,
            max_str_len,
            policy,
        }
    }
}

impl Default for FieldSpec {
    /// Fallback for undeclared fields.
    fn default() -> Self {
        Self {
            shape: FieldShape::Any,
            max_str_len: DEFAULT_MAX_STR_LEN,
            policy: PollutionPolicy::FirstWins,
        }
    }
}

/// Registry of known fields, shared across all requests.
#[derive(Debug)]
pub struct FieldRegistry {
    fields: HashMap<&'static str, FieldSpec>,
    fallback: FieldSpec,
}

impl FieldRegistry {
    /// Field specs for the matrimonial API surface.
    pub fn standard() -> Self {
        use PollutionPolicy::{FirstWins, RejectOnDuplicate};

        let mut fields: HashMap<&'static str, FieldSpec> = HashMap::new();

        // Authentication-relevant fields: a duplicate is always an attack.
        for name in ["email", "password", "role", "token", "otp", "phone"] {
            fields.insert(name, FieldSpec::scalar(RejectOnDuplicate, 256));
        }

        // Identity-shaped fields that may legitimately appear in routes.
        fields.insert("user_id", FieldSpec::scalar(RejectOnDuplicate, 64));
        fields.insert("photo_id", FieldSpec::scalar(RejectOnDuplicate, 64));

        // Profile text fields.
        fields.insert("name", FieldSpec::scalar(FirstWins, 100));
        fields.insert("city", FieldSpec::scalar(FirstWins, 100));
        fields.insert("about", FieldSpec::scalar(FirstWins, DEFAULT_MAX_STR_LEN));

        // Filter-style fields: first occurrence is authoritative.
        for name in ["q", "search", "page", "limit", "sort", "order"] {
            fields.insert(name, FieldSpec::scalar(FirstWins, 256));
        }

        // Compare takes a short list of profile ids.
        fields.insert(
            "profiles",
            FieldSpec {
                shape: FieldShape::BoundedList { max_len: 5 },
                max_str_len: 64,
                policy: RejectOnDuplicate,
            },
        );

        // Structured search preferences with a closed key set.
        fields.insert(
            "preferences",
            FieldSpec {
                shape: FieldShape::NestedObject {
                    allowed_keys: &["age_min", "age_max", "city", "religion", "language"],
                },
                max_str_len: 100,
                policy: FirstWins,
            },
        );

        Self {
            fields,
            fallback: FieldSpec::default(),
        }
    }

    pub fn spec(&self, field: &str) -> &FieldSpec {
        self.fields.get(field).unwrap_or(&self.fallback)
    }

    pub fn policy(&self, field: &str) -> PollutionPolicy {
        self.spec(field).policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_fields_reject_duplicates() {
        let registry = FieldRegistry::standard();
        for name in ["email", "password", "role", "token", "otp"] {
            assert_eq!(
                registry.policy(name),
                PollutionPolicy::RejectOnDuplicate,
                "{name} must reject duplicates"
            );
        }
    }

    #[test]
    fn test_filter_fields_are_first_wins() {
        let registry = FieldRegistry::standard();
        assert_eq!(registry.policy("q"), PollutionPolicy::FirstWins);
        assert_eq!(registry.policy("search"), PollutionPolicy::FirstWins);
    }

    #[test]
    fn test_unknown_field_gets_fallback() {
        let registry = FieldRegistry::standard();
        let spec = registry.spec("no_such_field");
        assert_eq!(spec.policy, PollutionPolicy::FirstWins);
        assert_eq!(spec.max_str_len, DEFAULT_MAX_STR_LEN);
        assert_eq!(spec.shape, FieldShape::Any);
    }

    #[test]
    fn test_name_is_capped_at_100() {
        let registry = FieldRegistry::standard();
        assert_eq!(registry.spec("name").max_str_len, 100);
    }

    #[test]
    fn test_compare_list_is_bounded() {
        let registry = FieldRegistry::standard();
        assert_eq!(
            registry.spec("profiles").shape,
            FieldShape::BoundedList { max_len: 5 }
        );
    }
}
