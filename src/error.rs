//! Error types for the per-test logging extension.
//!
//! Configuration mistakes are reported through typed [`thiserror`] errors
//! and rejected eagerly: option and settings problems when the
//! [`Session`](crate::Session) is built, hook conflicts when a test is set up.
//!
//! # Error hierarchy
//!
//! ```text
//! LoggerError
//! ├── Options(clap::Error)      - unparsable environment options
//! ├── Level(LevelError)         - unparsable level string
//! ├── LogOption(LogOptionError) - malformed loggers option
//! ├── ConflictingHooks          - config API and loggers hooks mixed
//! ├── UnexpectedOutcomes        - split-by-outcome misconfiguration
//! ├── Settings                  - unreadable or invalid settings file
//! └── Io                        - logs directory or link preparation
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the logging extension.
#[derive(Error, Debug)]
pub enum LoggerError {
    /// The `TESTLOGGER_*` environment options could not be parsed.
    #[error(transparent)]
    Options(#[from] clap::Error),

    /// A level string could not be parsed.
    #[error(transparent)]
    Level(#[from] LevelError),

    /// The loggers option names an unknown logger or level.
    #[error(transparent)]
    LogOption(#[from] LogOptionError),

    /// `LoggerConfig::add_loggers` and a loggers hook were both used.
    #[error("logger config and stdout/file loggers hooks used at the same time")]
    ConflictingHooks,

    /// `LoggerConfig::split_by_outcome` got outcome names it does not know.
    #[error("split_by_outcome got unexpected_outcomes: <{0:?}>")]
    UnexpectedOutcomes(Vec<String>),

    /// The settings file exists but cannot be used.
    #[error("invalid settings file {}: {message}", path.display())]
    Settings {
        /// Path of the offending settings file.
        path: PathBuf,
        /// Rendered error chain.
        message: String,
    },

    /// A filesystem operation on the logs directory failed.
    #[error("failed to prepare {}: {source}", path.display())]
    Io {
        /// Path that could not be prepared.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl LoggerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A level string is neither a known level name nor a decimal number.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("wrong level, expected (INFO, warn, 15, ...), got \"{0}\"")]
pub struct LevelError(pub String);

/// Errors from parsing the loggers option (`name[.level],...`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogOptionError {
    /// The logger part is known but the level part is not a level.
    #[error(transparent)]
    WrongLevel(#[from] LevelError),

    /// The logger part names no configured logger.
    #[error("wrong logger, expected ({expected}), got \"{got}\"")]
    WrongLogger {
        /// Comma-separated list of configured logger names.
        expected: String,
        /// The offending entry.
        got: String,
    },
}
