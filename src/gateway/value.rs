//! Uniform tagged-variant representation of untyped request input.
//!
//! All canonicalization and validation operates on [`ValueNode`], never on
//! `serde_json::Value` directly. The tree has its own `Deserialize` impl so
//! that two properties hold at the raw parse layer, before any gate runs:
//!
//! - a JSON object with the same key twice is a parse error (standard parsers
//!   silently keep the last occurrence, which hides parameter pollution);
//! - nesting deeper than [`MAX_PARSE_DEPTH`] is a parse error.

use serde::de::{self, Deserialize, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum nesting depth accepted from a request body.
pub const MAX_PARSE_DEPTH: usize = 32;

/// A single leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

/// Canonical value tree for request bodies and query fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueNode {
    Null,
    Scalar(Scalar),
    List(Vec<ValueNode>),
    Object(BTreeMap<String, ValueNode>),
}

impl ValueNode {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(s.into()))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::Text(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, ValueNode>> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ValueNode]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_scalar_or_null(&self) -> bool {
        matches!(self, Self::Null | Self::Scalar(_))
    }

    /// Parses a raw JSON body. An empty byte slice canonicalizes to `Null`.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Self::Null);
        }
        serde_json::from_slice(bytes)
    }
}

impl From<serde_json::Value> for ValueNode {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => Self::Scalar(Scalar::Number(n)),
            serde_json::Value::String(s) => Self::Scalar(Scalar::Text(s)),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (k, ValueNode::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for ValueNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            Self::Scalar(Scalar::Number(n)) => n.serialize(serializer),
            Self::Scalar(Scalar::Text(s)) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
            Self::Object(map) => map.serialize(serializer),
        }
    }
}

/// Depth-tracking seed so nested containers count toward [`MAX_PARSE_DEPTH`].
struct NodeSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for NodeSeed {
    type Value = ValueNode;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<ValueNode, D::Error> {
        deserializer.deserialize_any(NodeVisitor { depth: self.depth })
    }
}

struct NodeVisitor {
    depth: usize,
}

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = ValueNode;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E>(self, b: bool) -> Result<ValueNode, E> {
        Ok(ValueNode::Scalar(Scalar::Bool(b)))
    }

    fn visit_i64<E>(self, n: i64) -> Result<ValueNode, E> {
        Ok(ValueNode::Scalar(Scalar::Number(n.into())))
    }

    fn visit_u64<E>(self, n: u64) -> Result<ValueNode, E> {
        Ok(ValueNode::Scalar(Scalar::Number(n.into())))
    }

    fn visit_f64<E: de::Error>(self, n: f64) -> Result<ValueNode, E> {
        serde_json::Number::from_f64(n)
            .map(|n| ValueNode::Scalar(Scalar::Number(n)))
            .ok_or_else(|| E::custom("non-finite number"))
    }

    fn visit_str<E: de::Error>(self, s: &str) -> Result<ValueNode, E> {
        Ok(ValueNode::Scalar(Scalar::Text(s.to_owned())))
    }

    fn visit_string<E: de::Error>(self, s: String) -> Result<ValueNode, E> {
        Ok(ValueNode::Scalar(Scalar::Text(s)))
    }

    fn visit_unit<E>(self) -> Result<ValueNode, E> {
        Ok(ValueNode::Null)
    }

    fn visit_none<E>(self) -> Result<ValueNode, E> {
        Ok(ValueNode::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ValueNode, A::Error> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(de::Error::custom("value nested too deeply"));
        }
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(NodeSeed {
            depth: self.depth + 1,
        })? {
            items.push(item);
        }
        Ok(ValueNode::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ValueNode, A::Error> {
        if self.depth >= MAX_PARSE_DEPTH {
            return Err(de::Error::custom("value nested too deeply"));
        }
        let mut object = BTreeMap::new();
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(NodeSeed {
                depth: self.depth + 1,
            })?;
            if object.insert(key, value).is_some() {
                return Err(de::Error::custom("duplicate object key"));
            }
        }
        Ok(ValueNode::Object(object))
    }
}

impl<'de> Deserialize<'de> for ValueNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        NodeSeed { depth: 0 }.deserialize(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_plain_object() {
        let node = ValueNode::from_json_bytes(br#"{"email":"a@x.com","age":30,"ok":true}"#)
            .expect("valid JSON");
        let map = node.as_object().unwrap();
        assert_eq!(map["email"].as_text(), Some("a@x.com"));
        assert_eq!(map["age"], ValueNode::Scalar(Scalar::Number(30.into())));
        assert_eq!(map["ok"], ValueNode::Scalar(Scalar::Bool(true)));
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let err = ValueNode::from_json_bytes(br#"{"email":"a@x.com","email":"b@x.com"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("duplicate object key"));
    }

    #[test]
    fn test_rejects_duplicate_keys_nested() {
        let raw = br#"{"profile":{"name":"a","name":"b"}}"#;
        assert!(ValueNode::from_json_bytes(raw).is_err());
    }

    #[test]
    fn test_rejects_excessive_depth() {
        let mut raw = String::new();
        for _ in 0..(MAX_PARSE_DEPTH + 2) {
            raw.push_str(r#"{"a":"#);
        }
        raw.push_str("1");
        for _ in 0..(MAX_PARSE_DEPTH + 2) {
            raw.push('}');
        }
        assert!(ValueNode::from_json_bytes(raw.as_bytes()).is_err());
    }

    #[test]
    fn test_empty_body_is_null() {
        assert_eq!(ValueNode::from_json_bytes(b"").unwrap(), ValueNode::Null);
        assert_eq!(ValueNode::from_json_bytes(b"  \n").unwrap(), ValueNode::Null);
    }

    #[test]
    fn test_serialize_round_trips_shape() {
        let node = ValueNode::from_json_bytes(br#"{"a":[1,"x",null],"b":{"c":false}}"#).unwrap();
        let json = serde_json::to_string(&node).unwrap();
        let back = ValueNode::from_json_bytes(json.as_bytes()).unwrap();
        assert_eq!(node, back);
    }
}
