//! Domain models for the SaaS platform SDK.
//!
//! Platform records cross the backend boundary as loosely-typed
//! [`ResourceObject`]s: an ordered map from field name to a tagged
//! [`ResourceValue`]. Both backends (in-process rows and decoded JSON
//! bodies) produce the same shape, so callers never branch on the transport.

use std::fmt;

use base64::prelude::{BASE64_STANDARD, Engine as _};
use indexmap::IndexMap;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Partner credential identifying the app to the platform.
///
/// Immutable after construction. The pair doubles as a record filter on the
/// in-process path and as HTTP Basic-auth material on the remote path; no
/// validation happens here - a malformed credential surfaces downstream as
/// an authentication failure, not as a constructor error.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    key: String,
    secret: String,
}

impl Credential {
    /// Create a credential from an API key/secret pair.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: secret.into(),
        }
    }

    /// The API key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The API secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Hex MD5 digest of the key.
    ///
    /// This is the value the platform echoes back in the signed redirect of
    /// the SSO handshake. A peer who knows the partner's public key can
    /// forge it - a known weakness of the platform's handshake contract,
    /// kept as-is for wire compatibility.
    #[must_use]
    pub fn key_digest(&self) -> String {
        hex::encode(Md5::digest(self.key.as_bytes()))
    }

    /// `base64(key:secret)` for the Basic-auth header of the remote path.
    #[must_use]
    pub fn basic_token(&self) -> String {
        BASE64_STANDARD.encode(format!("{}:{}", self.key, self.secret))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A single field value of a platform record.
///
/// Serde-transparent: serializes to the plain JSON value, deserializes from
/// any JSON body the platform returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceValue {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON number (integral or floating).
    Number(serde_json::Number),
    /// JSON string.
    String(String),
    /// JSON array.
    List(Vec<ResourceValue>),
    /// Nested record.
    Object(ResourceObject),
}

impl ResourceValue {
    /// Borrow as a string, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Read as an `i64`, if this is an integral number.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Read as an `f64`, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Read as a boolean, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as a nested record, if this is one.
    #[must_use]
    pub fn as_object(&self) -> Option<&ResourceObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrow as a list of values, if this is one.
    #[must_use]
    pub fn as_list(&self) -> Option<&[ResourceValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is JSON `null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<Value> for ResourceValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(name, value)| (name, ResourceValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ResourceValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for ResourceValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ResourceValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ResourceValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

/// A loosely-typed platform record.
///
/// Field order matches the order the backend produced, and reading an
/// absent field is not an error - `get` returns `None`. The only mutation
/// entry points are construction and explicit [`set`](Self::set) for
/// caller-side enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceObject {
    fields: IndexMap<String, ResourceValue>,
}

impl ResourceObject {
    /// An empty record.
    ///
    /// Absent rows and degraded remote reads both produce this, by design:
    /// callers see one "nothing there" shape.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a decoded JSON value.
    ///
    /// Anything but a JSON object (including `null`) produces an empty
    /// record. Note that going through [`serde_json::Value`] does not
    /// preserve key order; deserialize into `ResourceObject` directly when
    /// order matters.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match ResourceValue::from(value) {
            ResourceValue::Object(object) => object,
            _ => Self::new(),
        }
    }

    /// Build from raw `(name, value)` pairs, preserving their order.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, Value)>) -> Self {
        pairs
            .into_iter()
            .map(|(name, value)| (name, ResourceValue::from(value)))
            .collect()
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResourceValue> {
        self.fields.get(name)
    }

    /// Look up a string field.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ResourceValue::as_str)
    }

    /// Look up an integral field.
    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ResourceValue::as_i64)
    }

    /// Look up a boolean field.
    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(ResourceValue::as_bool)
    }

    /// Assign a field, appending it when new.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ResourceValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in record order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl FromIterator<(String, ResourceValue)> for ResourceObject {
    fn from_iter<I: IntoIterator<Item = (String, ResourceValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// An ordered list of platform records.
///
/// Built eagerly from the backend's raw list, never mutated afterwards, and
/// re-iterable from the start on every pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceCollection {
    items: Vec<ResourceObject>,
}

impl ResourceCollection {
    /// An empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a decoded JSON value; anything but an array is empty.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(items) => items.into_iter().map(ResourceObject::from_value).collect(),
            _ => Self::new(),
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The first record, if any.
    #[must_use]
    pub fn first(&self) -> Option<&ResourceObject> {
        self.items.first()
    }

    /// Record at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ResourceObject> {
        self.items.get(index)
    }

    /// Iterate over records in received order.
    pub fn iter(&self) -> std::slice::Iter<'_, ResourceObject> {
        self.items.iter()
    }
}

impl FromIterator<ResourceObject> for ResourceCollection {
    fn from_iter<I: IntoIterator<Item = ResourceObject>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResourceCollection {
    type Item = ResourceObject;
    type IntoIter = std::vec::IntoIter<ResourceObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceCollection {
    type Item = &'a ResourceObject;
    type IntoIter = std::slice::Iter<'a, ResourceObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn credential_exposes_key_and_secret() {
        let credential = Credential::new("some-key", "s0m3s3cr3t");
        assert_eq!(credential.key(), "some-key");
        assert_eq!(credential.secret(), "s0m3s3cr3t");
    }

    #[test]
    fn credential_key_digest_is_hex_md5() {
        let credential = Credential::new("some-key", "s0m3s3cr3t");
        assert_eq!(credential.key_digest(), "e5bc329a672e042b6b7462b4d3250f8d");
    }

    #[test]
    fn credential_basic_token_encodes_key_colon_secret() {
        let credential = Credential::new("some-key", "s0m3s3cr3t");
        assert_eq!(credential.basic_token(), "c29tZS1rZXk6czBtM3MzY3IzdA==");
    }

    #[test]
    fn credential_debug_redacts_secret() {
        let credential = Credential::new("some-key", "s0m3s3cr3t");
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("some-key"));
        assert!(!rendered.contains("s0m3s3cr3t"));
    }

    #[test]
    fn object_preserves_field_order() {
        let object = ResourceObject::from_pairs([
            ("zulu".to_owned(), json!(1)),
            ("alpha".to_owned(), json!(2)),
            ("mike".to_owned(), json!(3)),
        ]);
        let names: Vec<&str> = object.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["zulu", "alpha", "mike"]);
    }

    #[test]
    fn object_absent_field_reads_as_none() {
        let object = ResourceObject::from_value(json!({"slug": "foo"}));
        assert_eq!(object.get_str("slug"), Some("foo"));
        assert!(object.get("no_such_field").is_none());
        assert!(object.get_str("no_such_field").is_none());
    }

    #[test]
    fn object_supports_caller_enrichment() {
        let mut object = ResourceObject::from_value(json!({"id": 1}));
        object.set("active_plan", "startup");
        assert_eq!(object.get_str("active_plan"), Some("startup"));
        assert_eq!(object.get_i64("id"), Some(1));
    }

    #[test]
    fn object_from_non_object_value_is_empty() {
        assert!(ResourceObject::from_value(json!(null)).is_empty());
        assert!(ResourceObject::from_value(json!("oops")).is_empty());
        assert!(ResourceObject::from_value(json!([1, 2])).is_empty());
    }

    #[test]
    fn object_deserializes_nested_values() {
        let object: ResourceObject = serde_json::from_str(
            r#"{"id": 7, "owner": {"name": "ama"}, "tags": ["a", "b"], "gone": null}"#,
        )
        .expect("valid body");
        assert_eq!(object.get_i64("id"), Some(7));
        let owner = object.get("owner").and_then(ResourceValue::as_object);
        assert_eq!(owner.and_then(|o| o.get_str("name")), Some("ama"));
        let tags = object.get("tags").and_then(ResourceValue::as_list);
        assert_eq!(tags.map(|items| items.len()), Some(2));
        assert!(object.get("gone").is_some_and(ResourceValue::is_null));
    }

    #[test]
    fn collection_keeps_received_order_and_reiterates() {
        let collection = ResourceCollection::from_value(json!([
            {"id": 3}, {"id": 1}, {"id": 2}
        ]));
        let first_pass: Vec<i64> = collection.iter().filter_map(|o| o.get_i64("id")).collect();
        let second_pass: Vec<i64> = collection.iter().filter_map(|o| o.get_i64("id")).collect();
        assert_eq!(first_pass, [3, 1, 2]);
        assert_eq!(first_pass, second_pass);
        assert_eq!(collection.first().and_then(|o| o.get_i64("id")), Some(3));
    }

    #[test]
    fn collection_from_non_array_value_is_empty() {
        assert!(ResourceCollection::from_value(json!({"id": 1})).is_empty());
        assert!(ResourceCollection::from_value(json!(null)).is_empty());
    }
}
