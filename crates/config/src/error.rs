use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// An extends identifier that no loader or preset registry knows about.
    #[error("Config not found: '{identifier}'{}", suggestion_hint(suggestion.as_deref()))]
    NotFound {
        identifier: String,
        suggestion: Option<String>,
    },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    PatternSyntax { pattern: String, message: String },

    /// Only raised by strict merges.
    #[error("Cannot merge {patch_kind} into {base_kind} at '{key}'")]
    MergeConflict {
        key: String,
        base_kind: &'static str,
        patch_kind: &'static str,
    },

    #[error("Cyclic extends: {}", chain.join(" -> "))]
    ExtendsCycle { chain: Vec<String> },

    #[error("Invalid config: {message}")]
    InvalidShape { message: String },

    #[error("Invalid setting for rule '{rule}': {message}")]
    InvalidRule { rule: String, message: String },

    #[error("Invalid config file {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::InvalidShape {
            message: message.into(),
        }
    }
}

fn suggestion_hint(suggestion: Option<&str>) -> String {
    suggestion.map_or_else(String::new, |s| format!(" (did you mean '{s}'?)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_identifier() {
        let err = ConfigError::NotFound {
            identifier: "nonexistent".to_string(),
            suggestion: None,
        };
        assert_eq!(err.to_string(), "Config not found: 'nonexistent'");
    }

    #[test]
    fn test_not_found_with_suggestion() {
        let err = ConfigError::NotFound {
            identifier: "base-c".to_string(),
            suggestion: Some("base-a".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Config not found: 'base-c' (did you mean 'base-a'?)"
        );
    }

    #[test]
    fn test_cycle_message() {
        let err = ConfigError::ExtendsCycle {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "Cyclic extends: a -> b -> a");
    }
}
