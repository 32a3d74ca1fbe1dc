//! Numeric logging levels and their parsing.
use std::fmt;
use std::str::FromStr;

use crate::error::LevelError;

/// A numeric logging threshold.
///
/// Named levels sit on a fixed scale so that arbitrary integers such as `15`
/// or `35` can be used as thresholds between them. [`Level::NOTSET`] means
/// "no explicit level".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Level(pub u32);

impl Level {
    /// No explicit level.
    pub const NOTSET: Self = Self(0);
    /// Trace level.
    pub const TRACE: Self = Self(5);
    /// Debug level.
    pub const DEBUG: Self = Self(10);
    /// Informational level.
    pub const INFO: Self = Self(20);
    /// Warning level.
    pub const WARN: Self = Self(30);
    /// Error level.
    pub const ERROR: Self = Self(40);
    /// Fatal level; nothing emitted through `tracing` reaches it.
    pub const FATAL: Self = Self(50);

    /// Three-letter tag used by the default formatter.
    #[must_use]
    pub fn short_name(self) -> String {
        match self {
            Self::FATAL => "ftl".to_string(),
            Self::ERROR => "err".to_string(),
            Self::WARN => "wrn".to_string(),
            Self::INFO => "inf".to_string(),
            Self::DEBUG => "dbg".to_string(),
            Self::TRACE => "trc".to_string(),
            Self(n) => format!("l{n}"),
        }
    }

    /// Canonical upper-case name, if this level has one.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        match self {
            Self::NOTSET => Some("NOTSET"),
            Self::TRACE => Some("TRACE"),
            Self::DEBUG => Some("DEBUG"),
            Self::INFO => Some("INFO"),
            Self::WARN => Some("WARN"),
            Self::ERROR => Some("ERROR"),
            Self::FATAL => Some("FATAL"),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Self::ERROR,
            tracing::Level::WARN => Self::WARN,
            tracing::Level::INFO => Self::INFO,
            tracing::Level::DEBUG => Self::DEBUG,
            _ => Self::TRACE,
        }
    }
}

impl FromStr for Level {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        sanitize_level(s)
    }
}

/// Parse a level given either as a decimal number or as a level name.
///
/// Names are matched case-insensitively; surrounding whitespace is not
/// accepted.
///
/// # Examples
///
/// ```
/// use testlogger::{Level, sanitize_level};
///
/// assert_eq!(sanitize_level("15").unwrap(), Level(15));
/// assert_eq!(sanitize_level("warn").unwrap(), Level::WARN);
/// assert!(sanitize_level("WARN ").is_err());
/// ```
///
/// # Errors
///
/// Returns [`LevelError`] carrying the rejected input.
pub fn sanitize_level(s: &str) -> Result<Level, LevelError> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<u32>()
            .map(Level)
            .map_err(|_| LevelError(s.to_string()));
    }
    match s.to_ascii_lowercase().as_str() {
        "notset" => Ok(Level::NOTSET),
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        "fatal" | "critical" => Ok(Level::FATAL),
        _ => Err(LevelError(s.to_string())),
    }
}

/// Non-failing variant of [`sanitize_level`].
#[must_use]
pub fn level_or_none(s: &str) -> Option<Level> {
    sanitize_level(s).ok()
}
