//! Source record model.
//!
//! Records handed over by the content runtime have no fixed shape: fields
//! may be strings, numbers, repeatable components (lists of objects), or
//! nested objects. [`ContentValue`] models that as a recursive tagged
//! value with ordered maps, and [`ContentRecord`] adds the identity fields
//! every record carries.

use semsearch_core::{Error, Result};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A dynamically shaped value inside a source record.
///
/// Maps keep their keys in the order they were encountered.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ContentValue {
    /// JSON `null`.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Any number.
    Number(f64),
    /// Plain string.
    String(String),
    /// Ordered sequence (repeatable components, tags, ...).
    List(Vec<ContentValue>),
    /// Ordered key/value mapping (single component, relation, ...).
    Map(Vec<(String, ContentValue)>),
}

impl ContentValue {
    /// Build a map value from `(key, value)` pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, ContentValue)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a string value.
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Look up a key when this value is a map. First occurrence wins.
    pub fn get(&self, key: &str) -> Option<&ContentValue> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// The string slice, when this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value carries nothing worth looking at.
    ///
    /// Null, `false`, `0`, and empty strings, lists, or maps count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Number(n) => *n == 0.0 || n.is_nan(),
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
        }
    }
}

impl From<serde_json::Value> for ContentValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<&str> for ContentValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ContentValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl Serialize for ContentValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ContentValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// ContentRecord
// ============================================================================

/// A source record as delivered by the content runtime.
///
/// `document_id` is stable across locale variants and draft/publish cycles.
/// Every other property lives in `fields`, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    /// Stable document identifier.
    pub document_id: String,

    /// Locale of this variant, when the runtime reports one.
    pub locale: Option<String>,

    /// Remaining properties in source order.
    pub fields: Vec<(String, ContentValue)>,
}

impl ContentRecord {
    /// Create a record with no fields.
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            locale: None,
            fields: Vec::new(),
        }
    }

    /// Set the locale.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Append a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<ContentValue>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Look up a field by name. First occurrence wins.
    pub fn get(&self, key: &str) -> Option<&ContentValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The `documentId` or `locale` property, which live outside `fields`.
    pub fn identity_field(&self, key: &str) -> Option<&str> {
        match key {
            "documentId" => Some(self.document_id.as_str()),
            "locale" => self.locale.as_deref(),
            _ => None,
        }
    }

    /// Build a record from a JSON object.
    ///
    /// `documentId` must be a string; `locale` is optional and a blank
    /// locale counts as absent. Everything else is kept as fields.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        match ContentValue::from(value) {
            ContentValue::Map(entries) => Self::from_entries(entries),
            _ => Err(Error::invalid_data("content record must be a JSON object")),
        }
    }

    fn from_entries(entries: Vec<(String, ContentValue)>) -> Result<Self> {
        let mut document_id = None;
        let mut locale = None;
        let mut fields = Vec::with_capacity(entries.len());

        for (key, value) in entries {
            match (key.as_str(), value) {
                ("documentId", ContentValue::String(id)) => document_id = Some(id),
                ("documentId", _) => {
                    return Err(Error::invalid_data("documentId must be a string"));
                }
                ("locale", ContentValue::String(l)) => {
                    locale = Some(l).filter(|l| !l.trim().is_empty());
                }
                ("locale", _) => {}
                (_, value) => fields.push((key, value)),
            }
        }

        let document_id =
            document_id.ok_or_else(|| Error::invalid_data("content record has no documentId"))?;

        Ok(Self {
            document_id,
            locale,
            fields,
        })
    }
}

impl Serialize for ContentRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = self.fields.len() + 1 + usize::from(self.locale.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("documentId", &self.document_id)?;
        if let Some(locale) = &self.locale {
            map.serialize_entry("locale", locale)?;
        }
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ContentRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Self::from_json(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================
