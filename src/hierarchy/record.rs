//! Record type and related structures.
//!
//! Records are the flat input rows of the chart. Each record has:
//! - A unique identifier (string or integer)
//! - An optional parent identifier (absent marks the root)
//! - An opaque payload owned by the caller

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::StructuralError;

/// Stable node identifier taken from a record's id field.
///
/// JS numbers and strings both deserialize into a key. Integer-valued strings
/// are kept as strings, so `"1"` and `1` are different keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeKey {
    Int(i64),
    Str(String),
}

impl NodeKey {
    /// Read a key out of a JSON value.
    ///
    /// Empty strings, `null`, booleans, fractional numbers and whole floats
    /// outside the `i64` range are not keys.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::Str(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                        .map(|f| f as i64)
                })
                .map(Self::Int),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for NodeKey {
    #[inline]
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<&str> for NodeKey {
    #[inline]
    fn from(id: &str) -> Self {
        Self::Str(id.to_owned())
    }
}

impl From<String> for NodeKey {
    #[inline]
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

/// Field names used to pull the id and parent id out of a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFields {
    pub id_field: String,
    pub parent_id_field: String,
}

impl Default for KeyFields {
    fn default() -> Self {
        Self {
            id_field: "id".to_owned(),
            parent_id_field: "parentId".to_owned(),
        }
    }
}

impl KeyFields {
    pub fn new(id_field: impl Into<String>, parent_id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
            parent_id_field: parent_id_field.into(),
        }
    }

    /// Wrap one payload into a [`Record`].
    ///
    /// `index` is the payload's position in the input and is only used for
    /// error reporting.
    pub fn extract(&self, index: usize, payload: Value) -> Result<Record, StructuralError> {
        let key = payload
            .get(&self.id_field)
            .and_then(NodeKey::from_json)
            .ok_or_else(|| StructuralError::MissingId {
                index,
                field: self.id_field.clone(),
            })?;
        let parent = payload
            .get(&self.parent_id_field)
            .and_then(NodeKey::from_json);

        Ok(Record {
            key,
            parent,
            payload,
        })
    }

    /// Wrap a batch of payloads, failing on the first unusable one.
    pub fn extract_all(&self, payloads: Vec<Value>) -> Result<Vec<Record>, StructuralError> {
        payloads
            .into_iter()
            .enumerate()
            .map(|(index, payload)| self.extract(index, payload))
            .collect()
    }
}

/// One caller-supplied row, with its id and parent id resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: NodeKey,
    pub parent: Option<NodeKey>,
    pub payload: Value,
}

impl Record {
    /// Create a record with an empty payload.
    pub fn new(key: impl Into<NodeKey>, parent: Option<NodeKey>) -> Self {
        Self {
            key: key.into(),
            parent,
            payload: Value::Null,
        }
    }

    /// A record with no parent, or one pointing at itself, may be the root.
    #[inline]
    pub fn is_root_candidate(&self) -> bool {
        match &self.parent {
            None => true,
            Some(parent) => *parent == self.key,
        }
    }

    /// Read a boolean seed flag such as `_expanded` from the payload.
    pub fn seed_flag(&self, name: &str) -> Option<bool> {
        self.payload.get(name).and_then(Value::as_bool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_key_from_json() {
        assert_eq!(NodeKey::from_json(&json!(7)), Some(NodeKey::Int(7)));
        assert_eq!(NodeKey::from_json(&json!(7.0)), Some(NodeKey::Int(7)));
        assert_eq!(NodeKey::from_json(&json!("a")), Some(NodeKey::from("a")));
        assert_eq!(NodeKey::from_json(&json!("")), None);
        assert_eq!(NodeKey::from_json(&json!(null)), None);
        assert_eq!(NodeKey::from_json(&json!(1.5)), None);
    }

    #[test]
    fn test_out_of_range_numbers_are_not_keys() {
        assert_eq!(NodeKey::from_json(&json!(1e300)), None);
        assert_eq!(NodeKey::from_json(&json!(-1e300)), None);
        assert_eq!(NodeKey::from_json(&json!(u64::MAX)), None);
        assert_eq!(NodeKey::from_json(&json!(9.0e15)), Some(NodeKey::Int(9_000_000_000_000_000)));
    }

    #[test]
    fn test_string_and_int_keys_differ() {
        assert_ne!(NodeKey::from("1"), NodeKey::from(1));
        assert_eq!(format!("{}", NodeKey::from(1)), "1");
        assert_eq!(format!("{}", NodeKey::from("ceo")), "ceo");
    }

    #[test]
    fn test_extract_with_default_fields() {
        let fields = KeyFields::default();
        let record = fields
            .extract(0, json!({"id": 2, "parentId": 1, "name": "Ann"}))
            .unwrap();

        assert_eq!(record.key, NodeKey::Int(2));
        assert_eq!(record.parent, Some(NodeKey::Int(1)));
        assert_eq!(record.payload["name"], "Ann");
        assert!(!record.is_root_candidate());
    }

    #[test]
    fn test_extract_with_custom_fields() {
        let fields = KeyFields::new("employeeId", "managerId");
        let record = fields
            .extract(0, json!({"employeeId": "e1", "managerId": null}))
            .unwrap();

        assert_eq!(record.key, NodeKey::from("e1"));
        assert!(record.parent.is_none());
        assert!(record.is_root_candidate());
    }

    #[test]
    fn test_extract_missing_id() {
        let fields = KeyFields::default();
        let err = fields.extract(3, json!({"name": "nobody"})).unwrap_err();
        assert_eq!(
            err,
            StructuralError::MissingId {
                index: 3,
                field: "id".to_owned()
            }
        );
    }

    #[test]
    fn test_self_parent_is_root_candidate() {
        let record = Record::new(5, Some(NodeKey::Int(5)));
        assert!(record.is_root_candidate());
    }

    #[test]
    fn test_seed_flag() {
        let fields = KeyFields::default();
        let record = fields
            .extract(0, json!({"id": 1, "_expanded": true, "_highlighted": "yes"}))
            .unwrap();
        assert_eq!(record.seed_flag("_expanded"), Some(true));
        assert_eq!(record.seed_flag("_highlighted"), None);
        assert_eq!(record.seed_flag("_centered"), None);
    }
}
