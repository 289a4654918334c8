//! Error types for the population rules registry.
//!
//! Lookups never fail: a missing rule is `None` / `false`. Errors only come
//! out of document loading and out of programmatic calls that hand the store
//! a value of the wrong shape.

use std::path::PathBuf;

use crate::rules::RuleKind;

/// Failures surfaced by rule loading and configuration.
#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("Failed to read rules document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to expand rules template {path}: {message}")]
    Template { path: PathBuf, message: String },

    #[error("Failed to parse rules document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A substitution must be exactly `[pattern, replacement]`.
    #[error("Substitution for '{operator}' needs [pattern, replacement], got {len} element(s)")]
    MalformedSubstitution { operator: String, len: usize },

    #[error("Unsupported {kind} value for '{operator}': expected a scalar")]
    UnsupportedValue { kind: RuleKind, operator: String },
}

pub type Result<T> = std::result::Result<T, RulesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_substitution_message() {
        let err = RulesError::MalformedSubstitution {
            operator: "status".to_string(),
            len: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("status"));
        assert!(msg.contains("1 element"));
    }

    #[test]
    fn test_io_error_keeps_path() {
        let err = RulesError::Io {
            path: PathBuf::from("config/population/missing.yaml"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("missing.yaml"));
    }
}
