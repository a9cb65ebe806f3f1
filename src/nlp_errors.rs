//! # NLP Error Types Module
//!
//! This module defines the error types used by the intent-matching core:
//! normalization, catalog loading, scoring and learning-store writes.

/// Custom error types for responder operations
#[derive(Debug, Clone)]
pub enum NlpError {
    /// A token could not be reduced to its base form
    Lemmatization(String),
    /// A regex pattern failed to compile
    Pattern(String),
    /// The intent catalog is malformed or could not be read
    Catalog(String),
    /// The reference dictionary for typo correction is unusable
    Dictionary(String),
    /// A learning-store write or read failed
    Persistence(String),
}

impl std::fmt::Display for NlpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NlpError::Lemmatization(msg) => write!(f, "Lemmatization error: {msg}"),
            NlpError::Pattern(msg) => write!(f, "Pattern error: {msg}"),
            NlpError::Catalog(msg) => write!(f, "Catalog error: {msg}"),
            NlpError::Dictionary(msg) => write!(f, "Dictionary error: {msg}"),
            NlpError::Persistence(msg) => write!(f, "Persistence error: {msg}"),
        }
    }
}

impl std::error::Error for NlpError {}

impl From<regex::Error> for NlpError {
    fn from(err: regex::Error) -> Self {
        NlpError::Pattern(err.to_string())
    }
}

impl From<serde_json::Error> for NlpError {
    fn from(err: serde_json::Error) -> Self {
        NlpError::Catalog(err.to_string())
    }
}

impl From<anyhow::Error> for NlpError {
    fn from(err: anyhow::Error) -> Self {
        NlpError::Persistence(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = NlpError::Catalog("duplicate catch-all".to_string());
        assert_eq!(err.to_string(), "Catalog error: duplicate catch-all");

        let err = NlpError::Dictionary("empty".to_string());
        assert_eq!(format!("{err}"), "Dictionary error: empty");
    }

    #[test]
    fn test_regex_error_maps_to_pattern() {
        let err: NlpError = regex::Regex::new("(unclosed").unwrap_err().into();
        assert!(matches!(err, NlpError::Pattern(_)));
    }

    #[test]
    fn test_store_error_maps_to_persistence() {
        let err = NlpError::from(anyhow::anyhow!("connection refused"));
        assert!(matches!(err, NlpError::Persistence(_)));
        assert_eq!(err.to_string(), "Persistence error: connection refused");
    }
}
