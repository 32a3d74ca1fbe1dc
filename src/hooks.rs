//! Extension points consulted by a [`Session`](crate::Session).
use std::path::PathBuf;

use crate::cli::Options;
use crate::config::{LoggerConfig, LoggerSpec};
use crate::error::LoggerError;
use crate::nodeid::TestId;

/// The test case a hook is asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestItem {
    /// Identifier of the test.
    pub id: TestId,
}

impl TestItem {
    /// Item for the test `id`.
    #[must_use]
    pub const fn new(id: TestId) -> Self {
        Self { id }
    }

    /// The test id as a string, e.g. `suite::case[param]`.
    #[must_use]
    pub fn nodeid(&self) -> &str {
        self.id.as_str()
    }
}

/// User hooks selecting loggers and directories.
///
/// Every method has a default returning `None` (or doing nothing), meaning
/// "not implemented". Several hook objects may be registered on one session:
/// results of the loggers hooks are concatenated, every `logdirlink` is
/// honoured and the first `logsdir` wins.
///
/// # Examples
///
/// ```
/// use testlogger::{Level, LoggerHooks, LoggerSpec, TestItem};
///
/// struct Hooks;
///
/// impl LoggerHooks for Hooks {
///     fn file_loggers(&self, _item: &TestItem) -> Option<Vec<LoggerSpec>> {
///         Some(vec![LoggerSpec::from("my_crate"), ("other", Level::INFO).into()])
///     }
/// }
/// ```
pub trait LoggerHooks: Send + Sync {
    /// Loggers printed on the terminal while `item` runs.
    fn stdout_loggers(&self, item: &TestItem) -> Option<Vec<LoggerSpec>> {
        let _ = item;
        None
    }

    /// Loggers written to files in `item`'s logdir.
    fn file_loggers(&self, item: &TestItem) -> Option<Vec<LoggerSpec>> {
        let _ = item;
        None
    }

    /// Path of a symlink to create pointing at the logs directory.
    fn logdirlink(&self, options: &Options) -> Option<PathBuf> {
        let _ = options;
        None
    }

    /// Logs directory to use when no option or settings file names one.
    fn logsdir(&self, options: &Options) -> Option<PathBuf> {
        let _ = options;
        None
    }

    /// Configure loggers through the builder API instead of the loggers
    /// hooks. Called once when the session is built.
    ///
    /// # Errors
    ///
    /// Errors abort [`SessionBuilder::build`](crate::SessionBuilder::build).
    fn configure(&self, config: &mut LoggerConfig) -> Result<(), LoggerError> {
        let _ = config;
        Ok(())
    }
}
