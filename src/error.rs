//! Error types for cfgrules
//!
//! Per-field validation diagnostics are plain strings returned from
//! [`Context::validate`](crate::Context::validate) and never show up here.
//! Everything in [`Error`] is fatal for the call that produced it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cfgrules operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cfgrules
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // Rule Definition Errors
    // -------------------------------------------------------------------------
    #[error("Unsupported rule literal {0}. Try to create the constraint manually")]
    UnsupportedRule(String),

    #[error("Invalid rule {rule}: {reason}")]
    InvalidRule { rule: String, reason: String },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    // -------------------------------------------------------------------------
    // Usage Errors
    // -------------------------------------------------------------------------
    #[error("Rules field is not set")]
    RulesNotSet,

    #[error("No context is registered for rules '{0}'")]
    UnresolvedRules(String),

    #[error("Configuration {0} was already closed")]
    AlreadyClosed(String),

    #[error("Environment of deferred constraint '{0}' is not bound")]
    EnvironmentNotBound(String),

    // -------------------------------------------------------------------------
    // Aggregate Validation Error
    // -------------------------------------------------------------------------
    #[error("Configuration at {scope} breaks rules\n{}", .messages.join("\n"))]
    RulesBroken { scope: String, messages: Vec<String> },

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check if this error was raised while turning a rule literal into a constraint
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedRule(_) | Error::InvalidRule { .. } | Error::InvalidPattern { .. }
        )
    }

    /// Check if this error is a contract violation by the caller
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::RulesNotSet
                | Error::UnresolvedRules(_)
                | Error::AlreadyClosed(_)
                | Error::EnvironmentNotBound(_)
        )
    }

    /// Diagnostics carried by a [`Error::RulesBroken`] error, empty otherwise
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        match self {
            Error::RulesBroken { messages, .. } => messages,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_broken_display() {
        let err = Error::RulesBroken {
            scope: "server".into(),
            messages: vec![
                "[port] missing required configuration".into(),
                "[host] is final".into(),
            ],
        };

        assert_eq!(
            err.to_string(),
            "Configuration at server breaks rules\n[port] missing required configuration\n[host] is final"
        );
        assert_eq!(err.diagnostics().len(), 2);
    }

    #[test]
    fn test_error_categories() {
        assert!(Error::UnsupportedRule("5".into()).is_parse_error());
        assert!(!Error::UnsupportedRule("5".into()).is_usage_error());
        assert!(Error::RulesNotSet.is_usage_error());
        assert!(Error::EnvironmentNotBound("same_as_default".into()).is_usage_error());
        assert!(Error::Config("bad".into()).diagnostics().is_empty());
    }
}
