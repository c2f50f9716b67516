//! Chart documents.
//!
//! A [`ChartDocument`] is the editable payload sent to the rendering service.
//! Its schema belongs to the backend, so it is kept as an open JSON object
//! rather than a typed struct: the workbench only ever touches the `theme`,
//! `font_family`, `width` and `height` keys and passes everything else through
//! untouched, in the order it was written.

use serde_json::{Map, Value};
use thiserror::Error;

/// Key the selected color theme is merged into.
pub const THEME_KEY: &str = "theme";
/// Key the selected font family overrides.
pub const FONT_FAMILY_KEY: &str = "font_family";
const WIDTH_KEY: &str = "width";
const HEIGHT_KEY: &str = "height";

/// Why a piece of text could not be turned into a [`ChartDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The text is not valid JSON.
    #[error("{message} at line {line} column {column}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },
    /// The text is valid JSON but not an object.
    #[error("chart document must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        // serde_json appends " at line X column Y" to its Display output;
        // keep the bare message and carry the position separately.
        let full = err.to_string();
        let message = full
            .rfind(" at line ")
            .map_or(full.as_str(), |idx| &full[..idx])
            .to_string();
        Self::Syntax {
            message,
            line: err.line(),
            column: err.column(),
        }
    }
}

/// An untyped chart description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartDocument {
    fields: Map<String, Value>,
}

impl ChartDocument {
    /// Parse document text.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Syntax`] for malformed JSON and
    /// [`DocumentError::NotAnObject`] when the top-level value is not an object.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(DocumentError::NotAnObject {
                found: value_kind(&other),
            }),
        }
    }

    /// Wrap an existing JSON object.
    pub const fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build a document from a JSON value, if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Editor representation: pretty-printed with two-space indentation.
    pub fn to_pretty_string(&self) -> String {
        // Serializing a Map<String, Value> cannot fail: keys are strings and
        // every value is already valid JSON.
        serde_json::to_string_pretty(&self.fields).unwrap_or_default()
    }

    /// Wire representation: compact JSON.
    pub fn to_compact_string(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Set a top-level field.
    ///
    /// An existing key keeps its position; a new key is appended.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Declared `width`, or 0 when missing or not a usable number.
    pub fn width(&self) -> u32 {
        self.dimension(WIDTH_KEY)
    }

    /// Declared `height`, or 0 when missing or not a usable number.
    pub fn height(&self) -> u32 {
        self.dimension(HEIGHT_KEY)
    }

    fn dimension(&self, key: &str) -> u32 {
        self.fields
            .get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite() && *v > 0.0)
            // Float-to-int casts saturate, so huge values clamp to u32::MAX.
            .map_or(0, |v| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let px = v.round() as u32;
                px
            })
    }
}

const fn value_kind(value: &Value) -> &'static str {
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
    use serde_json::json;

    #[test]
    fn test_parse_object_keeps_key_order() {
        let doc = ChartDocument::parse(r#"{"zeta":1,"alpha":2,"mid":{"b":1,"a":2}}"#).unwrap();
        let keys: Vec<_> = doc.fields().keys().cloned().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert_eq!(
            doc.to_compact_string(),
            r#"{"zeta":1,"alpha":2,"mid":{"b":1,"a":2}}"#
        );
    }

    #[test]
    fn test_parse_unclosed_brace_is_syntax_error() {
        let err = ChartDocument::parse("{").unwrap_err();
        match err {
            DocumentError::Syntax { line, .. } => assert_eq!(line, 1),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_syntax_error_message_mentions_position_once() {
        let err = ChartDocument::parse("{\n  \"a\": }").unwrap_err();
        let text = err.to_string();
        assert_eq!(text.matches(" at line ").count(), 1, "{text}");
        assert!(text.contains("at line 2 column"), "{text}");
    }

    #[test]
    fn test_parse_array_is_rejected() {
        let err = ChartDocument::parse("[1, 2]").unwrap_err();
        assert_eq!(err, DocumentError::NotAnObject { found: "an array" });
        assert_eq!(
            err.to_string(),
            "chart document must be a JSON object, found an array"
        );
    }

    #[test]
    fn test_pretty_string_uses_two_space_indent() {
        let doc = ChartDocument::from_value(json!({"type": "bar", "width": 600})).unwrap();
        assert_eq!(
            doc.to_pretty_string(),
            "{\n  \"type\": \"bar\",\n  \"width\": 600\n}"
        );
    }

    #[test]
    fn test_set_existing_key_keeps_position() {
        let mut doc =
            ChartDocument::from_value(json!({"theme": "light", "type": "bar"})).unwrap();
        doc.set(THEME_KEY, "dark");
        doc.set("extra", true);
        let keys: Vec<_> = doc.fields().keys().cloned().collect();
        assert_eq!(keys, ["theme", "type", "extra"]);
        assert_eq!(doc.get(THEME_KEY), Some(&json!("dark")));
    }

    #[test]
    fn test_dimensions_read_numbers() {
        let doc = ChartDocument::from_value(json!({"width": 600, "height": 400.4})).unwrap();
        assert_eq!(doc.width(), 600);
        assert_eq!(doc.height(), 400);
    }

    #[test]
    fn test_dimensions_default_to_zero() {
        let doc = ChartDocument::from_value(json!({"width": "600", "height": null})).unwrap();
        assert_eq!(doc.width(), 0);
        assert_eq!(doc.height(), 0);

        let doc = ChartDocument::from_value(json!({"width": -5})).unwrap();
        assert_eq!(doc.width(), 0);
        assert_eq!(doc.height(), 0);
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(ChartDocument::from_value(json!("bar")).is_none());
        assert!(ChartDocument::from_value(json!({})).is_some_and(|d| d.is_empty()));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn leaf() -> impl Strategy<Value = Value> {
            prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i64>().prop_map(Value::from),
                "[a-zA-Z0-9 _#-]{0,12}".prop_map(Value::String),
            ]
        }

        fn json_value() -> impl Strategy<Value = Value> {
            leaf().prop_recursive(3, 32, 6, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                    prop::collection::vec(("[a-z_]{1,8}", inner), 0..6)
                        .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
                ]
            })
        }

        fn document() -> impl Strategy<Value = ChartDocument> {
            prop::collection::vec(("[a-z_]{1,10}", json_value()), 0..10)
                .prop_map(|pairs| ChartDocument::from_map(pairs.into_iter().collect()))
        }

        proptest! {
            #[test]
            fn pretty_text_parses_back_to_same_document(doc in document()) {
                let parsed = ChartDocument::parse(&doc.to_pretty_string()).unwrap();
                prop_assert_eq!(parsed, doc);
            }

            #[test]
            fn compact_text_parses_back_to_same_document(doc in document()) {
                let parsed = ChartDocument::parse(&doc.to_compact_string()).unwrap();
                prop_assert_eq!(parsed, doc);
            }
        }
    }
}
