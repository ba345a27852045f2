//! # Data Model Values
//!
//! `Value` is the in-memory form of a record, commit or MST node: the JSON
//! kinds plus two extensions that repository structures depend on, byte
//! strings and CID links.
//!
//! Maps are held in a `BTreeMap`, so construction order never leaks into
//! the value. The canonical encoder applies its own key order on top.
//!
//! ## JSON bridge
//!
//! Records fetched through an XRPC read arrive as JSON. Links are written as
//! `{"$link": "<cid>"}` and byte strings as `{"$bytes": "<base64>"}`;
//! [`Value::from_json`] and [`Value::to_json`] translate between the two
//! representations.

use std::collections::BTreeMap;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;

use crate::cid::Cid;
use crate::error::DataModelError;

/// A structured value in the repository data model.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Integer(i64),
    /// A 64-bit float. Non-finite values cannot be encoded.
    Float(f64),
    /// A UTF-8 text string.
    String(String),
    /// A raw byte string.
    Bytes(Vec<u8>),
    /// An ordered sequence.
    List(Vec<Value>),
    /// A map from text keys to values.
    Map(BTreeMap<String, Value>),
    /// A link to another block.
    Link(Cid),
}

impl Value {
    /// Build a map from `(key, value)` pairs in any order.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Short name of the kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Link(_) => "link",
        }
    }

    /// Look up `key` if this is a map.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(m) => m.get(key),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&Cid> {
        match self {
            Self::Link(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert from the JSON representation of the data model.
    ///
    /// # Errors
    ///
    /// Fails on unparseable `$link` CIDs, invalid `$bytes` base64, and
    /// unsigned integers above `i64::MAX`.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, DataModelError> {
        use serde_json::Value as J;
        Ok(match json {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(*b),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Integer(i)
                } else if n.is_u64() {
                    return Err(DataModelError::NumberOutOfRange(n.to_string()));
                } else {
                    // serde_json numbers are always finite.
                    Self::Float(n.as_f64().unwrap_or_default())
                }
            }
            J::String(s) => Self::String(s.clone()),
            J::Array(items) => Self::List(
                items
                    .iter()
                    .map(Self::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            J::Object(obj) => {
                if obj.len() == 1 {
                    if let Some(J::String(link)) = obj.get("$link") {
                        return Ok(Self::Link(link.parse()?));
                    }
                    if let Some(J::String(b64)) = obj.get("$bytes") {
                        return decode_base64(b64).map(Self::Bytes);
                    }
                }
                Self::Map(
                    obj.iter()
                        .map(|(k, v)| Ok((k.clone(), Self::from_json(v)?)))
                        .collect::<Result<_, DataModelError>>()?,
                )
            }
        })
    }

    /// Convert to the JSON representation of the data model.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as J;
        match self {
            Self::Null => J::Null,
            Self::Bool(b) => J::Bool(*b),
            Self::Integer(i) => J::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(J::Null, J::Number),
            Self::String(s) => J::String(s.clone()),
            Self::Bytes(b) => serde_json::json!({ "$bytes": STANDARD_NO_PAD.encode(b) }),
            Self::List(items) => J::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(m) => J::Object(m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
            Self::Link(cid) => serde_json::json!({ "$link": cid.to_string() }),
        }
    }
}

fn decode_base64(s: &str) -> Result<Vec<u8>, DataModelError> {
    STANDARD_NO_PAD
        .decode(s)
        .or_else(|_| STANDARD.decode(s))
        .map_err(|e| DataModelError::InvalidBytes(e.to_string()))
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Cid> for Value {
    fn from(c: Cid) -> Self {
        Self::Link(c)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cid::{Cid, DAG_CBOR};
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from_json(&json!(null)).unwrap(), Value::Null);
        assert_eq!(Value::from_json(&json!(true)).unwrap(), Value::Bool(true));
        assert_eq!(Value::from_json(&json!(-7)).unwrap(), Value::Integer(-7));
        assert_eq!(Value::from_json(&json!(1.5)).unwrap(), Value::Float(1.5));
        assert_eq!(
            Value::from_json(&json!("hi")).unwrap(),
            Value::String("hi".into())
        );
    }

    #[test]
    fn test_from_json_link_and_bytes() {
        let cid = Cid::compute(DAG_CBOR, b"x");
        let v = Value::from_json(&json!({
            "ref": {"$link": cid.to_string()},
            "blob": {"$bytes": "aGVsbG8"},
        }))
        .unwrap();
        assert_eq!(v.get("ref"), Some(&Value::Link(cid)));
        assert_eq!(v.get("blob"), Some(&Value::Bytes(b"hello".to_vec())));
    }

    #[test]
    fn test_padded_base64_accepted() {
        let v = Value::from_json(&json!({"$bytes": "aGVsbG8="})).unwrap();
        assert_eq!(v, Value::Bytes(b"hello".to_vec()));
    }

    #[test]
    fn test_link_with_extra_keys_is_a_map() {
        let v = Value::from_json(&json!({"$link": "not-a-cid", "other": 1})).unwrap();
        assert_eq!(v.kind(), "map");
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            Value::from_json(&json!({"$link": "nope"})),
            Err(DataModelError::InvalidLink(_))
        ));
        assert!(matches!(
            Value::from_json(&json!({"$bytes": "!!"})),
            Err(DataModelError::InvalidBytes(_))
        ));
        assert!(matches!(
            Value::from_json(&json!(u64::MAX)),
            Err(DataModelError::NumberOutOfRange(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let cid = Cid::compute(DAG_CBOR, b"y");
        let original = json!({
            "$type": "app.bsky.feed.post",
            "text": "hello",
            "langs": ["en"],
            "embed": {"ref": {"$link": cid.to_string()}, "raw": {"$bytes": "AAEC"}},
            "count": 3,
        });
        let v = Value::from_json(&original).unwrap();
        assert_eq!(v.to_json(), original);
    }
}
