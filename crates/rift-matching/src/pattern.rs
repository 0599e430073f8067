//! Pattern strings: literal, regex or JSON-schema values with independent
//! negation and optionality flags.
//!
//! A `PatternString` is immutable. Its compiled regex forms and compiled
//! schema are built lazily on first use and shared between clones, so the
//! same expectation evaluated by many request threads compiles each pattern
//! at most a few times, never per request.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::context::MatchContext;
use crate::error::MatchingError;
use crate::observer::MatchEvent;
use crate::schema::CompiledSchema;

/// Upper bound for a compiled pattern regex.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Characters that make a textual pattern a regular expression.
const REGEX_METACHARACTERS: &[char] = &[
    '.', '*', '+', '?', '[', ']', '(', ')', '{', '}', '|', '^', '$', '\\',
];

/// A string value with pre-computed lowercase for efficient case-insensitive matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachedValue {
    /// Original value (for case-sensitive matching)
    pub value: String,
    /// Pre-computed lowercase (for case-insensitive matching)
    pub lower: String,
}

impl CachedValue {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let lower = value.to_lowercase();
        Self { value, lower }
    }

    /// Check equality against a string value.
    #[inline]
    pub fn equals(&self, value: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            value == self.value
        } else {
            value == self.value || value.to_lowercase() == self.lower
        }
    }
}

/// How a pattern's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PatternKind {
    /// Case-insensitive text equality
    Literal,
    /// Full-string regular expression
    Regex,
    /// JSON-schema document the candidate is validated against
    Schema,
}

#[derive(Default)]
struct CompiledForms {
    case_sensitive: OnceCell<Result<Regex, String>>,
    case_insensitive: OnceCell<Result<Regex, String>>,
    schema: OnceCell<Result<CompiledSchema, String>>,
}

/// A literal, regex or schema pattern with `not` and `optional` flags.
#[derive(Clone)]
pub struct PatternString {
    value: CachedValue,
    is_not: bool,
    is_optional: bool,
    kind: PatternKind,
    /// Text this pattern was parsed from, prefixes included.
    source: Option<Arc<str>>,
    compiled: Arc<CompiledForms>,
}

impl PatternString {
    fn build(value: impl Into<String>, kind: PatternKind, is_not: bool, is_optional: bool) -> Self {
        Self {
            value: CachedValue::new(value),
            is_not,
            is_optional,
            kind,
            source: None,
            compiled: Arc::new(CompiledForms::default()),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::build(value, PatternKind::Literal, false, false)
    }

    pub fn regex(value: impl Into<String>) -> Self {
        Self::build(value, PatternKind::Regex, false, false)
    }

    /// A schema pattern; `schema` is the JSON-schema document text.
    pub fn schema(schema: impl Into<String>) -> Self {
        Self::build(schema, PatternKind::Schema, false, false)
    }

    /// A negated pattern parsed from text, e.g. `not("keyOne")`.
    pub fn not(text: &str) -> Self {
        Self::parse(text).negate()
    }

    /// An optional pattern parsed from text.
    pub fn optional(text: &str) -> Self {
        Self::parse(text).with_optional(true)
    }

    /// Parse the textual form used in expectation definitions.
    ///
    /// Leading `!` negates and leading `?` marks the key optional, in either
    /// order. The remainder is a regex when it contains regex metacharacters,
    /// a literal otherwise.
    pub fn parse(text: &str) -> Self {
        let mut rest = text;
        let mut is_not = false;
        let mut is_optional = false;
        loop {
            if !is_not && rest.len() > 1 && rest.starts_with('!') {
                is_not = true;
                rest = &rest[1..];
            } else if !is_optional && rest.len() > 1 && rest.starts_with('?') {
                is_optional = true;
                rest = &rest[1..];
            } else {
                break;
            }
        }
        let kind = if rest.contains(REGEX_METACHARACTERS) {
            PatternKind::Regex
        } else {
            PatternKind::Literal
        };
        Self {
            source: Some(Arc::from(text)),
            ..Self::build(rest, kind, is_not, is_optional)
        }
    }

    /// Same pattern with the negation flag flipped.
    pub fn negate(&self) -> Self {
        Self {
            is_not: !self.is_not,
            source: None,
            ..self.clone()
        }
    }

    /// Same pattern without negation.
    pub fn un_negated(&self) -> Self {
        Self {
            is_not: false,
            source: None,
            ..self.clone()
        }
    }

    pub fn with_optional(&self, is_optional: bool) -> Self {
        Self {
            is_optional,
            source: None,
            ..self.clone()
        }
    }

    pub fn value(&self) -> &str {
        &self.value.value
    }

    pub fn cached_value(&self) -> &CachedValue {
        &self.value
    }

    pub fn is_not(&self) -> bool {
        self.is_not
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn is_literal(&self) -> bool {
        self.kind == PatternKind::Literal
    }

    /// Compiled anchored regex, or `None` if the pattern does not compile.
    ///
    /// The compile result is cached; a failure is reported on every call.
    pub(crate) fn compiled_regex(&self, case_insensitive: bool, ctx: &MatchContext) -> Option<&Regex> {
        let cell = if case_insensitive {
            &self.compiled.case_insensitive
        } else {
            &self.compiled.case_sensitive
        };
        let compiled = cell.get_or_init(|| {
            RegexBuilder::new(&format!("^(?:{})$", self.value()))
                .case_insensitive(case_insensitive)
                .size_limit(REGEX_SIZE_LIMIT)
                .build()
                .map_err(|e| e.to_string())
        });
        match compiled {
            Ok(regex) => Some(regex),
            Err(error) => {
                ctx.emit(MatchEvent::InvalidRegex {
                    pattern: self.value().to_string(),
                    error: error.clone(),
                });
                None
            }
        }
    }

    /// Compiled schema, or `None` if the document is invalid.
    pub(crate) fn compiled_schema(&self, ctx: &MatchContext) -> Option<&CompiledSchema> {
        let compiled = self
            .compiled
            .schema
            .get_or_init(|| CompiledSchema::compile(self.value()));
        match compiled {
            Ok(schema) => Some(schema),
            Err(error) => {
                ctx.emit(MatchEvent::InvalidSchema {
                    schema: self.value().to_string(),
                    error: error.clone(),
                });
                None
            }
        }
    }

    /// Textual form with `!` / `?` prefixes.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(self.value().len() + 2);
        if self.is_not {
            text.push('!');
        }
        if self.is_optional {
            text.push('?');
        }
        text.push_str(self.value());
        text
    }

    /// The text exactly as it was parsed, or [`to_text`](Self::to_text) for
    /// patterns built or modified in code.
    pub fn raw_text(&self) -> Cow<'_, str> {
        match &self.source {
            Some(source) => Cow::Borrowed(source.as_ref()),
            None => Cow::Owned(self.to_text()),
        }
    }
}

impl PartialEq for PatternString {
    fn eq(&self, other: &Self) -> bool {
        self.value.value == other.value.value
            && self.is_not == other.is_not
            && self.is_optional == other.is_optional
            && self.kind == other.kind
    }
}

impl Eq for PatternString {}

impl Hash for PatternString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.value.hash(state);
        self.is_not.hash(state);
        self.is_optional.hash(state);
        self.kind.hash(state);
    }
}

impl fmt::Debug for PatternString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.to_text())
    }
}

impl fmt::Display for PatternString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for PatternString {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<String> for PatternString {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

/// Serialized shapes of a pattern string.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum PatternRepr {
    /// "!?value"
    Text(String),
    /// { "schema": { ... }, "not": true }
    Schema {
        schema: serde_json::Value,
        #[serde(default, skip_serializing_if = "is_false")]
        not: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
    },
    /// { "value": "...", "not": true, "optional": true, "kind": "regex" }
    Explicit {
        value: String,
        #[serde(default, skip_serializing_if = "is_false")]
        not: bool,
        #[serde(default, skip_serializing_if = "is_false")]
        optional: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<PatternKind>,
    },
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl PatternString {
    fn from_repr(repr: PatternRepr) -> Result<Self, MatchingError> {
        match repr {
            PatternRepr::Text(text) => Ok(PatternString::parse(&text)),
            PatternRepr::Schema {
                schema,
                not,
                optional,
            } => {
                if !schema.is_object() && !schema.is_boolean() {
                    return Err(MatchingError::InvalidPattern(format!(
                        "schema must be a JSON object, found {schema}"
                    )));
                }
                Ok(Self::build(
                    schema.to_string(),
                    PatternKind::Schema,
                    not,
                    optional,
                ))
            }
            PatternRepr::Explicit {
                value,
                not,
                optional,
                kind,
            } => {
                let kind = kind.unwrap_or_else(|| PatternString::parse(&value).kind);
                if kind == PatternKind::Schema {
                    serde_json::from_str::<serde_json::Value>(&value)
                        .map_err(|e| MatchingError::InvalidPattern(e.to_string()))?;
                }
                Ok(Self::build(value, kind, not, optional))
            }
        }
    }

    fn to_repr(&self) -> PatternRepr {
        if self.kind == PatternKind::Schema {
            if let Ok(schema) = serde_json::from_str::<serde_json::Value>(self.value()) {
                return PatternRepr::Schema {
                    schema,
                    not: self.is_not,
                    optional: self.is_optional,
                };
            }
        }
        let text = self.to_text();
        if PatternString::parse(&text) == *self {
            PatternRepr::Text(text)
        } else {
            PatternRepr::Explicit {
                value: self.value().to_string(),
                not: self.is_not,
                optional: self.is_optional,
                kind: Some(self.kind),
            }
        }
    }
}

impl Serialize for PatternString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_repr().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PatternString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = PatternRepr::deserialize(deserializer)?;
        PatternString::from_repr(repr).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_value_equals() {
        let cv = CachedValue::new("Test");

        assert!(cv.equals("Test", true));
        assert!(!cv.equals("test", true));

        assert!(cv.equals("test", false));
        assert!(cv.equals("TEST", false));
        assert!(cv.equals("tEsT", false));
    }

    #[test]
    fn test_parse_prefixes() {
        let plain = PatternString::parse("keyOne");
        assert_eq!(plain.value(), "keyOne");
        assert!(!plain.is_not());
        assert!(!plain.is_optional());
        assert_eq!(plain.kind(), PatternKind::Literal);

        let notted = PatternString::parse("!keyOne");
        assert!(notted.is_not());
        assert_eq!(notted.value(), "keyOne");

        let optional = PatternString::parse("?keyOne");
        assert!(optional.is_optional());
        assert!(!optional.is_not());

        let both = PatternString::parse("?!keyOne");
        assert!(both.is_optional());
        assert!(both.is_not());
        assert_eq!(both, PatternString::parse("!?keyOne"));
    }

    #[test]
    fn test_parse_detects_regex() {
        assert_eq!(PatternString::parse("key.*").kind(), PatternKind::Regex);
        assert_eq!(PatternString::parse("keyOne|keyTwo").kind(), PatternKind::Regex);
        assert_eq!(PatternString::parse("application/json").kind(), PatternKind::Literal);
        assert_eq!(PatternString::parse("?key.*").kind(), PatternKind::Regex);
    }

    #[test]
    fn test_raw_text_keeps_prefix_order() {
        let parsed = PatternString::parse("?!x");
        assert_eq!(parsed, PatternString::parse("!?x"));
        assert_eq!(parsed.to_text(), "!?x");
        assert_eq!(parsed.raw_text(), "?!x");
        assert_eq!(PatternString::parse("!?x").raw_text(), "!?x");

        // a modified pattern no longer has a source text
        assert_eq!(parsed.un_negated().raw_text(), "?x");
        assert_eq!(PatternString::literal("a.b").raw_text(), "a.b");
    }

    #[test]
    fn test_parse_keeps_lone_prefix_characters() {
        assert_eq!(PatternString::parse("!").value(), "!");
        assert!(!PatternString::parse("!").is_not());
        assert_eq!(PatternString::parse("?").value(), "?");
    }

    #[test]
    fn test_flags_are_independent() {
        let base = PatternString::literal("keyOne");
        let negated = base.negate();
        assert!(negated.is_not());
        assert!(!negated.is_optional());
        assert_eq!(negated.negate(), base);
        assert_eq!(negated.un_negated(), base);

        let optional = negated.with_optional(true);
        assert!(optional.is_not());
        assert!(optional.is_optional());
    }

    #[test]
    fn test_equality_ignores_compiled_cache() {
        let ctx = MatchContext::data_plane();
        let compiled = PatternString::regex("key.*");
        assert!(compiled.compiled_regex(false, &ctx).is_some());
        assert_eq!(compiled, PatternString::regex("key.*"));
        assert_ne!(compiled, PatternString::literal("key.*"));

        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(compiled);
        assert!(set.contains(&PatternString::regex("key.*")));
    }

    #[test]
    fn test_invalid_regex_compiles_to_none() {
        let ctx = MatchContext::data_plane();
        assert!(PatternString::regex("(unclosed").compiled_regex(false, &ctx).is_none());
    }

    #[test]
    fn test_serde_text_form() {
        let pattern: PatternString = serde_json::from_str("\"!keyOne\"").unwrap();
        assert_eq!(pattern, PatternString::not("keyOne"));
        assert_eq!(serde_json::to_string(&pattern).unwrap(), "\"!keyOne\"");
    }

    #[test]
    fn test_serde_explicit_form() {
        let pattern: PatternString =
            serde_json::from_str(r#"{"value": "a.b", "not": true, "kind": "literal"}"#).unwrap();
        assert_eq!(pattern.kind(), PatternKind::Literal);
        assert!(pattern.is_not());

        // "!a.b" would parse as regex, so the explicit form is kept
        let json = serde_json::to_value(&pattern).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"value": "a.b", "not": true, "kind": "literal"})
        );
    }

    #[test]
    fn test_serde_schema_form() {
        let pattern: PatternString =
            serde_json::from_str(r#"{"schema": {"type": "number"}, "not": true}"#).unwrap();
        assert_eq!(pattern.kind(), PatternKind::Schema);
        assert!(pattern.is_not());
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(pattern.value()).unwrap(),
            serde_json::json!({"type": "number"})
        );

        let err = serde_json::from_str::<PatternString>(r#"{"schema": 12}"#);
        assert!(err.is_err());
    }
}
