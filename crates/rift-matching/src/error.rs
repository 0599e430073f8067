//! Error types for building matchers.
//!
//! Matching itself never fails: a malformed pattern degrades to "no match"
//! and is reported through the [`MatchObserver`](crate::observer::MatchObserver).
//! These errors only surface while containers and configuration are built.

/// Errors raised while building containers or reading matcher definitions.
#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("multiple values for optional key are not allowed, key \"{key}\" has values {values:?}")]
    MultipleValuesForOptionalKey { key: String, values: Vec<String> },
    #[error("invalid pattern string: {0}")]
    InvalidPattern(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
