//! Logger selection: logger specs, the builder-style [`LoggerConfig`] and the
//! loggers option.
mod log_option;
pub(crate) mod toml_loader;

pub use log_option::parse_log_option;

use crate::error::LoggerError;
use crate::level::Level;
use crate::logging::{DefaultFormatter, Formatter, FormatterFactory, boxed_formatter};
use crate::outcome::{Outcome, SplitByOutcome};

/// A logger name with the level its handler should filter at.
///
/// The empty name is the root logger, which sees every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerSpec {
    /// Logger name (an event target or target prefix).
    pub name: String,
    /// Handler level; [`Level::NOTSET`] for none.
    pub level: Level,
}

impl LoggerSpec {
    /// Spec for `name` at `level`.
    #[must_use]
    pub fn new(name: impl Into<String>, level: Level) -> Self {
        Self {
            name: name.into(),
            level,
        }
    }
}

impl From<&str> for LoggerSpec {
    fn from(name: &str) -> Self {
        Self::new(name, Level::NOTSET)
    }
}

impl From<String> for LoggerSpec {
    fn from(name: String) -> Self {
        Self::new(name, Level::NOTSET)
    }
}

impl From<(&str, Level)> for LoggerSpec {
    fn from((name, level): (&str, Level)) -> Self {
        Self::new(name, level)
    }
}

/// Loggers selected for one test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Loggers {
    /// Loggers printed on the terminal.
    pub stdout: Vec<LoggerSpec>,
    /// Loggers written to files in the test's logdir.
    pub file: Vec<LoggerSpec>,
}

impl Loggers {
    /// True when no logger is selected at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.file.is_empty()
    }
}

/// One `add_loggers` call: a group of names sharing levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerRow {
    /// Logger names in this group.
    pub names: Vec<String>,
    /// Level used on the terminal when the loggers option names no level.
    pub stdout_level: Level,
    /// Level of the file handlers.
    pub file_level: Level,
}

impl LoggerRow {
    /// Row for `names` with the given levels.
    #[must_use]
    pub fn new<S: Into<String>>(
        names: impl IntoIterator<Item = S>,
        stdout_level: Level,
        file_level: Level,
    ) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            stdout_level,
            file_level,
        }
    }
}

/// Builder-style logger configuration, handed to
/// [`LoggerHooks::configure`](crate::LoggerHooks::configure) once per session.
///
/// With [`add_loggers`](Self::add_loggers), every configured logger is
/// written to a file and the loggers option (`TESTLOGGER_LOGGERS`) picks which
/// of them are also printed on the terminal.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    enabled: bool,
    rows: Vec<LoggerRow>,
    log_option_default: Option<String>,
    formatter: FormatterFactory,
    split: Option<SplitByOutcome>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rows: Vec::new(),
            log_option_default: None,
            formatter: boxed_formatter::<DefaultFormatter>,
            split: None,
        }
    }
}

impl LoggerConfig {
    /// Configure `names` with a terminal level and a file level.
    pub fn add_loggers<S: Into<String>>(
        &mut self,
        names: impl IntoIterator<Item = S>,
        stdout_level: Level,
        file_level: Level,
    ) -> &mut Self {
        self.enabled = true;
        self.rows
            .push(LoggerRow::new(names, stdout_level, file_level));
        self
    }

    /// Configure `names` without explicit levels.
    pub fn add_logger_names<S: Into<String>>(
        &mut self,
        names: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.add_loggers(names, Level::NOTSET, Level::NOTSET)
    }

    /// Value of the loggers option when none is given, e.g. `"foo,bar.info"`.
    pub fn set_log_option_default(&mut self, value: impl Into<String>) -> &mut Self {
        self.log_option_default = Some(value.into());
        self
    }

    /// Use `F` to render every handler's output.
    pub fn set_formatter<F: Formatter + Default + 'static>(&mut self) -> &mut Self {
        self.formatter = boxed_formatter::<F>;
        self
    }

    /// Link each test's logdir under `<logsdir>/<subdir>/<outcome>/`.
    ///
    /// An empty `outcomes` list selects `failed` only; `subdir` defaults to
    /// `by_outcome`.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::UnexpectedOutcomes`] listing every name that is
    /// not `passed`, `failed` or `skipped`.
    pub fn split_by_outcome<S: AsRef<str>>(
        &mut self,
        outcomes: &[S],
        subdir: Option<&str>,
    ) -> Result<&mut Self, LoggerError> {
        let mut parsed = Vec::new();
        let mut unexpected = Vec::new();
        for name in outcomes {
            match name.as_ref().parse::<Outcome>() {
                Ok(outcome) => parsed.push(outcome),
                Err(_) => unexpected.push(name.as_ref().to_string()),
            }
        }
        if !unexpected.is_empty() {
            return Err(LoggerError::UnexpectedOutcomes(unexpected));
        }
        if parsed.is_empty() {
            parsed.push(Outcome::Failed);
        }
        self.split = Some(SplitByOutcome {
            outcomes: parsed,
            subdir: subdir
                .unwrap_or(SplitByOutcome::DEFAULT_SUBDIR)
                .to_string(),
        });
        Ok(self)
    }

    /// Whether [`add_loggers`](Self::add_loggers) was used.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Configured logger groups, in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[LoggerRow] {
        &self.rows
    }

    /// Default of the loggers option, if set.
    #[must_use]
    pub fn log_option_default(&self) -> Option<&str> {
        self.log_option_default.as_deref()
    }

    /// Split-by-outcome settings, if enabled.
    #[must_use]
    pub const fn split(&self) -> Option<&SplitByOutcome> {
        self.split.as_ref()
    }

    pub(crate) fn make_formatter(&self) -> Box<dyn Formatter> {
        (self.formatter)()
    }
}

/// Derive one test's loggers from the config and the parsed loggers option.
///
/// Terminal loggers are exactly the option's entries; file loggers are every
/// configured name at its file level.
#[must_use]
pub fn loggers_from_logcfg(cfg: &LoggerConfig, log_option: &[LoggerSpec]) -> Loggers {
    Loggers {
        stdout: log_option.to_vec(),
        file: cfg
            .rows
            .iter()
            .flat_map(|row| {
                row.names
                    .iter()
                    .map(|name| LoggerSpec::new(name.clone(), row.file_level))
            })
            .collect(),
    }
}
