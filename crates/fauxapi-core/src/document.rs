//! Configuration document and alias records.
//!
//! The appliance configuration is a deep, loosely-typed tree. [`ConfigDocument`]
//! keeps the tree as JSON so that unknown sections survive a get/set round trip,
//! and exposes checked accessors for the `aliases.alias` sequence.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Top-level key holding the alias section.
pub const ALIASES_KEY: &str = "aliases";

/// Key of the alias sequence inside the alias section.
pub const ALIAS_KEY: &str = "alias";

/// Alias type used for address/network aliases.
pub const NETWORK_ALIAS_TYPE: &str = "network";

/// The full configuration of an appliance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigDocument {
    root: Map<String, Value>,
}

impl ConfigDocument {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] if `value` is not a JSON object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(Error::InvalidDocument(format!(
                "expected a JSON object at the root, found {}",
                kind_of(&other)
            ))),
        }
    }

    /// Consume the document and return the underlying JSON.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    /// Borrow a top-level section.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.root.get(name)
    }

    /// Replace (or insert) a top-level section.
    pub fn set_section(&mut self, name: impl Into<String>, value: Value) {
        self.root.insert(name.into(), value);
    }

    /// The alias records currently present, or an empty slice when the section
    /// is missing or malformed.
    #[must_use]
    pub fn aliases(&self) -> &[Value] {
        self.root
            .get(ALIASES_KEY)
            .and_then(|section| section.get(ALIAS_KEY))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Mutable access to the alias sequence.
    ///
    /// A missing or non-object `aliases` section is replaced by an empty object,
    /// and a missing or non-array `aliases.alias` by an empty array.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] if the section could not be prepared.
    pub fn aliases_mut(&mut self) -> Result<&mut Vec<Value>> {
        let section = self
            .root
            .entry(ALIASES_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if !section.is_object() {
            *section = Value::Object(Map::new());
        }

        let list = section
            .as_object_mut()
            .ok_or_else(|| Error::InvalidDocument("`aliases` is not an object".to_string()))?
            .entry(ALIAS_KEY)
            .or_insert_with(|| Value::Array(Vec::new()));
        if !list.is_array() {
            *list = Value::Array(Vec::new());
        }

        list.as_array_mut()
            .ok_or_else(|| Error::InvalidDocument("`aliases.alias` is not an array".to_string()))
    }

    /// Index of the first alias record named `name`.
    #[must_use]
    pub fn find_alias(&self, name: &str) -> Option<usize> {
        self.aliases()
            .iter()
            .position(|record| alias_field(record, "name") == Some(name))
    }
}

impl TryFrom<Value> for ConfigDocument {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl From<ConfigDocument> for Value {
    fn from(document: ConfigDocument) -> Self {
        document.into_value()
    }
}

/// Read a string field from a raw alias record.
#[must_use]
pub fn alias_field<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

/// A single alias entry as written by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    /// Unique alias name.
    pub name: String,
    /// Alias type (`network`, `host`, `port`, ...).
    #[serde(rename = "type")]
    pub alias_type: String,
    /// Space separated list of addresses.
    pub address: String,
    /// Human readable description.
    #[serde(default)]
    pub descr: String,
    /// Per-address annotations joined by `||`.
    #[serde(default)]
    pub detail: String,
}

impl AliasRecord {
    /// Build a `network` alias.
    #[must_use]
    pub fn network(
        name: impl Into<String>,
        address: impl Into<String>,
        descr: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            alias_type: NETWORK_ALIAS_TYPE.to_string(),
            address: address.into(),
            descr: descr.into(),
            detail: detail.into(),
        }
    }

    /// JSON form suitable for insertion into `aliases.alias`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "type": self.alias_type,
            "address": self.address,
            "descr": self.descr,
            "detail": self.detail,
        })
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_value_requires_object() {
        assert!(ConfigDocument::from_value(json!({"system": {}})).is_ok());
        let err = ConfigDocument::from_value(json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::InvalidDocument(_)));
    }

    #[test]
    fn aliases_missing_is_empty() {
        let document = ConfigDocument::from_value(json!({"system": {}})).unwrap();
        assert!(document.aliases().is_empty());
        assert_eq!(document.find_alias("anything"), None);
    }

    #[test]
    fn aliases_mut_initializes_missing_section() {
        let mut document = ConfigDocument::new();
        document.aliases_mut().unwrap().push(json!({"name": "a"}));
        assert_eq!(
            document.into_value(),
            json!({"aliases": {"alias": [{"name": "a"}]}})
        );
    }

    #[test]
    fn aliases_mut_replaces_malformed_section() {
        // pfSense exports an empty section as an empty string
        let mut document = ConfigDocument::from_value(json!({"aliases": ""})).unwrap();
        assert!(document.aliases_mut().unwrap().is_empty());
        assert_eq!(document.section(ALIASES_KEY), Some(&json!({"alias": []})));

        let mut document =
            ConfigDocument::from_value(json!({"aliases": {"alias": {"name": "x"}}})).unwrap();
        assert!(document.aliases_mut().unwrap().is_empty());
    }

    #[test]
    fn aliases_mut_keeps_sibling_keys() {
        let mut document = ConfigDocument::from_value(json!({
            "aliases": {"alias": [{"name": "a"}], "extra": true}
        }))
        .unwrap();
        assert_eq!(document.aliases_mut().unwrap().len(), 1);
        assert_eq!(
            document.section(ALIASES_KEY).and_then(|s| s.get("extra")),
            Some(&json!(true))
        );
    }

    #[test]
    fn find_alias_returns_first_match() {
        let document = ConfigDocument::from_value(json!({
            "aliases": {"alias": [
                {"name": "one"},
                {"name": "dup", "address": "1"},
                {"name": "dup", "address": "2"}
            ]}
        }))
        .unwrap();
        assert_eq!(document.find_alias("dup"), Some(1));
        assert_eq!(document.find_alias("missing"), None);
    }

    #[test]
    fn alias_record_to_value() {
        let record = AliasRecord::network("aws_x", "1.1.1.1/32", "AWS x", "note");
        assert_eq!(
            record.to_value(),
            json!({
                "name": "aws_x",
                "type": "network",
                "address": "1.1.1.1/32",
                "descr": "AWS x",
                "detail": "note"
            })
        );
        let parsed: AliasRecord = serde_json::from_value(record.to_value()).unwrap();
        assert_eq!(parsed, record);
    }
}
