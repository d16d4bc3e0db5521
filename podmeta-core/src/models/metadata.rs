//! Raw and normalized metadata shapes.
//!
//! [`ApiResponse`] is whatever the model returned, parsed leniently.
//! [`NormalizedMetadata`] is the marketplace-compliant result produced by
//! [`crate::normalize`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Raw Response
// ============================================================================

/// Raw metadata parsed from a model's JSON content.
///
/// Fields are not guaranteed to be schema-valid: missing strings default to
/// empty and `tags` may hold any JSON value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiResponse {
    /// Product title.
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    /// Product description.
    #[serde(deserialize_with = "lenient_string")]
    pub description: String,
    /// Tags as returned; coerced by the normalizer.
    pub tags: Value,
    /// Primary tag (TeePublic).
    #[serde(
        rename = "mainTag",
        alias = "main_tag",
        deserialize_with = "lenient_optional_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub main_tag: Option<String>,
}

impl ApiResponse {
    /// Creates a raw response from well-formed parts.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tags: Value::Array(tags.into_iter().map(|t| Value::String(t.into())).collect()),
            main_tag: None,
        }
    }

    /// Sets the main tag.
    pub fn with_main_tag(mut self, main_tag: impl Into<String>) -> Self {
        self.main_tag = Some(main_tag.into());
        self
    }

    /// Returns the string elements of `tags`, or nothing if it is not an array.
    pub fn tag_strings(&self) -> Vec<&str> {
        match &self.tags {
            Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<NormalizedMetadata> for ApiResponse {
    fn from(meta: NormalizedMetadata) -> Self {
        Self {
            title: meta.title,
            description: meta.description,
            tags: Value::Array(meta.tags.into_iter().map(Value::String).collect()),
            main_tag: meta.main_tag,
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ============================================================================
// Normalized Metadata
// ============================================================================

/// Metadata guaranteed to satisfy a marketplace's constraint table.
///
/// Created once per successful request and not mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMetadata {
    /// Title, within the marketplace limit.
    pub title: String,
    /// Description, within the marketplace limit.
    pub description: String,
    /// Lowercased, deduplicated tags.
    pub tags: Vec<String>,
    /// Primary tag, passed through unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_tag: Option<String>,
}

impl NormalizedMetadata {
    /// Returns the tags joined with `", "`.
    pub fn tags_joined(&self) -> String {
        self.tags.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let raw: ApiResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(raw.title, "");
        assert_eq!(raw.description, "");
        assert!(raw.tags.is_null());
        assert!(raw.main_tag.is_none());
    }

    #[test]
    fn test_null_title_is_empty() {
        let raw: ApiResponse = serde_json::from_str(r#"{"title": null, "tags": "a,b"}"#).unwrap();
        assert_eq!(raw.title, "");
        assert!(raw.tag_strings().is_empty());
    }

    #[test]
    fn test_main_tag_snake_case_alias() {
        let raw: ApiResponse = serde_json::from_str(r#"{"main_tag": "cat lover"}"#).unwrap();
        assert_eq!(raw.main_tag.as_deref(), Some("cat lover"));
    }

    #[test]
    fn test_tag_strings_skips_non_strings() {
        let raw: ApiResponse =
            serde_json::from_str(r#"{"tags": ["cat", 3, null, "pet"]}"#).unwrap();
        assert_eq!(raw.tag_strings(), vec!["cat", "pet"]);
    }

    #[test]
    fn test_normalized_serializes_main_tag_camel_case() {
        let meta = NormalizedMetadata {
            title: "Cat".into(),
            description: "A cat design".into(),
            tags: vec!["cat".into()],
            main_tag: Some("cat lover".into()),
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains(r#""mainTag":"cat lover""#));
    }
}
