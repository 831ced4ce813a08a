//! Exit codes for the lintrc CLI.
//!
//! Distinct codes let scripts and CI tell a bad config apart from a broken
//! file system.

use lintrc_config::ConfigError;

/// Exit codes used by the CLI.
///
/// These follow standard Unix conventions where 0 indicates success
/// and non-zero values indicate different types of failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - no problems
    Success = 0,
    /// `validate` found problems in the config
    ValidationError = 1,
    /// Configuration error (missing config, unknown preset, extends cycle)
    ConfigError = 2,
    /// I/O error (file read failure)
    IoError = 4,
    /// Parse error (malformed config file or glob pattern)
    ParseError = 5,
}

impl ExitCode {
    /// Exit the process with this exit code.
    pub fn exit(self) -> ! {
        std::process::exit(self.code())
    }

    /// Get the numeric value of this exit code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Pick the exit code for an error surfaced by a command.
    ///
    /// Errors that do not originate in the config engine count as
    /// configuration errors.
    #[must_use]
    pub fn for_error(error: &anyhow::Error) -> Self {
        error
            .chain()
            .find_map(|cause| cause.downcast_ref::<ConfigError>())
            .map_or(Self::ConfigError, Self::from)
    }
}

impl From<&ConfigError> for ExitCode {
    fn from(error: &ConfigError) -> Self {
        match error {
            ConfigError::Io(_) => Self::IoError,
            ConfigError::Invalid { .. } | ConfigError::PatternSyntax { .. } => Self::ParseError,
            _ => Self::ConfigError,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::ValidationError => write!(f, "validation error"),
            Self::ConfigError => write!(f, "configuration error"),
            Self::IoError => write!(f, "I/O error"),
            Self::ParseError => write!(f, "parse error"),
        }
    }
}
