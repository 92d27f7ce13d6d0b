//! Text extraction from source records.
//!
//! The extractor decides what text gets embedded: the configured fields of
//! a record, in declared order, flattened into a single string. Component
//! data contributes its direct string properties, minus administrative
//! keys (ids, timestamps, locale, publish state, stored embeddings).
//! Objects nested inside a component (media, relations) are not walked.

use crate::settings::ContentTypeConfig;
use crate::value::{ContentRecord, ContentValue};
use std::collections::HashSet;

/// Keys never embedded when found inside a component.
pub const DEFAULT_EXCLUDED_KEYS: &[&str] = &[
    "id",
    "documentId",
    "embedding",
    "embeddingMetadata",
    "createdAt",
    "updatedAt",
    "publishedAt",
    "locale",
    "__component",
];

/// Flattens configured record fields into embeddable text.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    excluded: HashSet<String>,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor {
    /// Extractor with the default exclusion list.
    pub fn new() -> Self {
        Self {
            excluded: DEFAULT_EXCLUDED_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Extractor for a content type, honoring its extra excluded keys.
    pub fn for_content_type(config: &ContentTypeConfig) -> Self {
        Self::new().with_excluded_keys(config.excluded_fields.iter().cloned())
    }

    /// Add caller-declared keys to the exclusion list.
    pub fn with_excluded_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Whether `key` is skipped inside components.
    pub fn is_excluded(&self, key: &str) -> bool {
        self.excluded.contains(key)
    }

    /// Extract the text for `fields` from `record`.
    ///
    /// Returns an empty string when nothing extractable is present; callers
    /// treat that as "nothing to embed".
    pub fn extract<S: AsRef<str>>(&self, record: &ContentRecord, fields: &[S]) -> String {
        let mut parts: Vec<&str> = Vec::new();

        for field in fields {
            if let Some(text) = record.identity_field(field.as_ref()) {
                push_text(&mut parts, text);
                continue;
            }
            let Some(value) = record.get(field.as_ref()) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            match value {
                ContentValue::String(s) => push_text(&mut parts, s),
                ContentValue::List(items) => self.walk_items(items, &mut parts),
                ContentValue::Map(entries) => self.walk_entries(entries, &mut parts),
                _ => {}
            }
        }

        parts.join(" ").trim().to_string()
    }

    // One level only: nested maps and lists inside a component are skipped.
    fn walk_entries<'a>(&self, entries: &'a [(String, ContentValue)], parts: &mut Vec<&'a str>) {
        for (key, value) in entries {
            if self.is_excluded(key) {
                continue;
            }
            if let ContentValue::String(s) = value {
                push_text(parts, s);
            }
        }
    }

    // Only object items contribute; bare scalars in lists are ignored.
    fn walk_items<'a>(&self, items: &'a [ContentValue], parts: &mut Vec<&'a str>) {
        for item in items {
            if let ContentValue::Map(entries) = item {
                self.walk_entries(entries, parts);
            }
        }
    }
}

fn push_text<'a>(parts: &mut Vec<&'a str>, text: &'a str) {
    if !text.trim().is_empty() {
        parts.push(text);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> ContentRecord {
        ContentRecord::from_json(value).unwrap()
    }

    #[test]
    fn test_extract_plain_strings_in_field_order() {
        let r = record(json!({
            "documentId": "d1",
            "body": "Move workloads step by step.",
            "title": "Cloud migration guide"
        }));
        let text = TextExtractor::new().extract(&r, &["title", "body"]);
        assert_eq!(text, "Cloud migration guide Move workloads step by step.");
    }

    #[test]
    fn test_extract_repeatable_components() {
        let r = record(json!({
            "documentId": "d1",
            "sections": [
                {"id": 1, "__component": "blocks.text", "heading": "Intro", "text": "Why move"},
                {"id": 2, "heading": "Plan", "order": 2, "visible": true},
                "stray string",
                null
            ]
        }));
        let text = TextExtractor::new().extract(&r, &["sections"]);
        assert_eq!(text, "Intro Why move Plan");
    }

    #[test]
    fn test_extract_single_nested_object() {
        let r = record(json!({
            "documentId": "d1",
            "author": {
                "id": 4,
                "documentId": "a-4",
                "name": "Ada",
                "createdAt": "2024-01-01T00:00:00Z",
                "bio": "Writes about clouds"
            }
        }));
        let text = TextExtractor::new().extract(&r, &["author"]);
        assert_eq!(text, "Ada Writes about clouds");
    }

    #[test]
    fn test_excluded_keys_dropped() {
        let r = record(json!({
            "documentId": "d1",
            "blocks": [{
                "caption": "Diagram",
                "locale": "en",
                "publishedAt": "2024-01-01",
                "embedding": "0.1,0.2",
                "alt": "Architecture"
            }]
        }));
        let text = TextExtractor::new().extract(&r, &["blocks"]);
        assert_eq!(text, "Diagram Architecture");
    }

    #[test]
    fn test_nested_objects_inside_components_not_walked() {
        let r = record(json!({
            "documentId": "d1",
            "sections": [{
                "heading": "Intro",
                "image": {"url": "/uploads/x.png", "mime": "image/png", "provider": "local"},
                "links": [{"label": "Docs", "href": "https://example.com"}]
            }],
            "author": {
                "name": "Ada",
                "avatar": {"url": "/uploads/ada.png"}
            }
        }));
        let text = TextExtractor::new().extract(&r, &["sections", "author"]);
        assert_eq!(text, "Intro Ada");
    }

    #[test]
    fn test_caller_declared_exclusions() {
        let r = record(json!({
            "documentId": "d1",
            "profile": {"name": "Ada", "scheduleMeetingLink": "https://cal/ada"}
        }));
        let config =
            ContentTypeConfig::new("people", ["profile"]).with_excluded_fields(["scheduleMeetingLink"]);
        let text = TextExtractor::for_content_type(&config).extract(&r, &config.fields);
        assert_eq!(text, "Ada");
    }

    #[test]
    fn test_absent_or_empty_fields_yield_empty_string() {
        let r = record(json!({
            "documentId": "d1",
            "title": "",
            "views": 12,
            "featured": true,
            "tags": [],
            "seo": {"id": 3, "locale": "en"}
        }));
        let text = TextExtractor::new().extract(&r, &["title", "views", "featured", "tags", "seo", "missing"]);
        assert_eq!(text, "");
    }

    #[test]
    fn test_whitespace_only_values_skipped() {
        let r = record(json!({
            "documentId": "d1",
            "title": "   ",
            "body": "Content",
            "extra": {"note": "  \n "}
        }));
        let text = TextExtractor::new().extract(&r, &["title", "body", "extra"]);
        assert_eq!(text, "Content");
    }

    #[test]
    fn test_top_level_fields_taken_even_if_named_like_excluded_key() {
        let r = record(json!({"documentId": "d1", "id": "SKU-42"}));
        let text = TextExtractor::new().extract(&r, &["id"]);
        assert_eq!(text, "SKU-42");
    }

    #[test]
    fn test_identity_fields_can_be_named() {
        let r = record(json!({"documentId": "SKU-42", "locale": "fr", "title": "Chaise"}));
        let text = TextExtractor::new().extract(&r, &["title", "documentId", "locale"]);
        assert_eq!(text, "Chaise SKU-42 fr");

        let r = record(json!({"documentId": "d1"}));
        assert_eq!(TextExtractor::new().extract(&r, &["locale"]), "");
    }

    #[test]
    fn test_is_excluded() {
        let extractor = TextExtractor::new().with_excluded_keys(["isActive"]);
        for key in DEFAULT_EXCLUDED_KEYS {
            assert!(extractor.is_excluded(key));
        }
        assert!(extractor.is_excluded("isActive"));
        assert!(!extractor.is_excluded("title"));
    }
}
