//! Session-wide state: resolved settings, hooks and the logs directory.
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tracing_subscriber::fmt::{MakeWriter, TestWriter};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::cli::Options;
use crate::config::toml_loader::{FileSettings, default_settings_path, load_settings};
use crate::config::{LoggerConfig, LoggerSpec, Loggers, loggers_from_logcfg, parse_log_option};
use crate::error::LoggerError;
use crate::fs::{make_logsdir_dir, make_logsdir_tmpdir, refresh_link};
use crate::hooks::{LoggerHooks, TestItem};
use crate::level::Level;
use crate::nodeid::TestId;
use crate::state::TestGuard;

/// Threshold applied when neither the options nor the settings file set one.
const DEFAULT_LEVEL: Level = Level::WARN;

/// One test binary's logging extension.
///
/// Usually built once and shared through a `static`:
///
/// ```no_run
/// use std::sync::OnceLock;
/// use testlogger::{Session, current_test};
///
/// fn session() -> &'static Session {
///     static SESSION: OnceLock<Session> = OnceLock::new();
///     SESSION.get_or_init(|| Session::from_env().expect("testlogger session"))
/// }
///
/// // Called from a `#[test]` function.
/// fn writes_logs() {
///     let _guard = session().setup(current_test!()).unwrap();
///     tracing::warn!(target: "my_crate", "visible in the test's log files");
/// }
/// ```
pub struct Session {
    options: Options,
    hooks: Vec<Box<dyn LoggerHooks>>,
    config: LoggerConfig,
    log_option: Vec<LoggerSpec>,
    logsdir_setting: Option<PathBuf>,
    default_level: Level,
    logdirlinks: Vec<PathBuf>,
    logsdir: Mutex<Option<PathBuf>>,
    terminal: Arc<BoxMakeWriter>,
}

impl Session {
    /// Start configuring a session.
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Session without hooks, configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment options or the settings file are
    /// invalid.
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::builder().options(Options::from_env()?).build()
    }

    /// Attach the handlers for test `id` to the current thread.
    ///
    /// The handlers stay attached until the returned guard is finished or
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::ConflictingHooks`] when a logger config is used
    /// together with loggers hooks, or an I/O error if the test's logdir
    /// cannot be created.
    pub fn setup(&self, id: impl Into<TestId>) -> Result<TestGuard<'_>, LoggerError> {
        let item = TestItem::new(id.into());
        let loggers = self.loggers_for(&item)?;
        TestGuard::new(self, item.id, loggers)
    }

    /// Loggers selected for `item`, from the config or from the hooks.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::ConflictingHooks`] if a loggers hook answers
    /// while the logger config is enabled.
    pub fn loggers_for(&self, item: &TestItem) -> Result<Loggers, LoggerError> {
        let stdout: Vec<Vec<LoggerSpec>> = self
            .hooks
            .iter()
            .filter_map(|h| h.stdout_loggers(item))
            .collect();
        let file: Vec<Vec<LoggerSpec>> = self
            .hooks
            .iter()
            .filter_map(|h| h.file_loggers(item))
            .collect();

        if self.config.is_enabled() {
            if !stdout.is_empty() || !file.is_empty() {
                return Err(LoggerError::ConflictingHooks);
            }
            return Ok(loggers_from_logcfg(&self.config, &self.log_option));
        }
        Ok(Loggers {
            stdout: stdout.into_iter().flatten().collect(),
            file: file.into_iter().flatten().collect(),
        })
    }

    /// The logs directory, created on first use.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be prepared.
    pub fn logsdir(&self) -> Result<PathBuf, LoggerError> {
        let mut slot = self.logsdir.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dir) = slot.as_ref() {
            return Ok(dir.clone());
        }

        let explicit = self
            .logsdir_setting
            .clone()
            .or_else(|| self.hooks.iter().find_map(|h| h.logsdir(&self.options)));
        let dir = match explicit {
            Some(path) => make_logsdir_dir(&path, true)?,
            None => make_logsdir_tmpdir()?,
        };
        tracing::debug!("logs directory: {}", dir.display());
        for link in &self.logdirlinks {
            refresh_link(&dir, link);
        }
        *slot = Some(dir.clone());
        Ok(dir)
    }

    /// Directory of test `id`, created on first use.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn logdir(&self, id: &TestId) -> Result<PathBuf, LoggerError> {
        let dir = self.logsdir()?.join(id.relative_dir());
        std::fs::create_dir_all(&dir).map_err(|e| LoggerError::io(&dir, e))?;
        Ok(dir)
    }

    /// The logs directory if some test already created it.
    pub(crate) fn logsdir_if_created(&self) -> Option<PathBuf> {
        self.logsdir
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Threshold for handlers without an explicit level.
    #[must_use]
    pub const fn default_level(&self) -> Level {
        self.default_level
    }

    /// Options the session was built from.
    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    /// Logger config filled in by the `configure` hooks.
    #[must_use]
    pub const fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub(crate) fn terminal(&self) -> &Arc<BoxMakeWriter> {
        &self.terminal
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("hooks", &self.hooks.len())
            .field("config", &self.config)
            .field("log_option", &self.log_option)
            .field("default_level", &self.default_level)
            .field("logsdir", &self.logsdir_if_created())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Session`].
#[derive(Default)]
pub struct SessionBuilder {
    options: Options,
    hooks: Vec<Box<dyn LoggerHooks>>,
    terminal: Option<BoxMakeWriter>,
}

impl SessionBuilder {
    /// Register a hooks object. Hooks are consulted in registration order.
    #[must_use]
    pub fn hooks(mut self, hooks: impl LoggerHooks + 'static) -> Self {
        self.hooks.push(Box::new(hooks));
        self
    }

    /// Use `options` instead of the defaults.
    #[must_use]
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Write terminal output to `writer` instead of libtest's captured
    /// stdout.
    #[must_use]
    pub fn terminal<W>(mut self, writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        self.terminal = Some(BoxMakeWriter::new(writer));
        self
    }

    /// Resolve settings and run the `configure` and `logdirlink` hooks.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is invalid, a `configure` hook
    /// fails or the loggers option does not match the logger config.
    pub fn build(self) -> Result<Session, LoggerError> {
        let Self {
            options,
            hooks,
            terminal,
        } = self;

        let settings = match options.config.clone().or_else(default_settings_path) {
            Some(path) => read_settings(&path)?,
            None => FileSettings::default(),
        };

        let mut config = LoggerConfig::default();
        for hook in &hooks {
            hook.configure(&mut config)?;
        }

        let log_option = if config.is_enabled() {
            let value = options
                .loggers
                .as_deref()
                .or_else(|| config.log_option_default())
                .unwrap_or_default();
            parse_log_option(config.rows(), value)?
        } else {
            if let Some(value) = options.loggers.as_deref() {
                tracing::warn!("loggers option {value:?} ignored: no logger config");
            }
            Vec::new()
        };

        let logdirlinks = hooks
            .iter()
            .filter_map(|h| h.logdirlink(&options))
            .collect();

        Ok(Session {
            logsdir_setting: options.logsdir.clone().or(settings.logsdir),
            default_level: options.level.or(settings.level).unwrap_or(DEFAULT_LEVEL),
            options,
            hooks,
            config,
            log_option,
            logdirlinks,
            logsdir: Mutex::new(None),
            terminal: Arc::new(terminal.unwrap_or_else(|| BoxMakeWriter::new(TestWriter::new()))),
        })
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("options", &self.options)
            .field("hooks", &self.hooks.len())
            .field("terminal", &self.terminal.is_some())
            .finish()
    }
}

fn read_settings(path: &Path) -> Result<FileSettings, LoggerError> {
    load_settings(path).map_err(|e| LoggerError::Settings {
        path: path.to_path_buf(),
        message: format!("{e:#}"),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    mockall::mock! {
        Hooks {}
        impl LoggerHooks for Hooks {
            fn stdout_loggers(&self, item: &TestItem) -> Option<Vec<LoggerSpec>>;
            fn file_loggers(&self, item: &TestItem) -> Option<Vec<LoggerSpec>>;
            fn logdirlink(&self, options: &Options) -> Option<PathBuf>;
            fn logsdir(&self, options: &Options) -> Option<PathBuf>;
            fn configure(&self, config: &mut LoggerConfig) -> Result<(), LoggerError>;
        }
    }

    /// Options pointing at a settings file that does not exist.
    fn options_in(dir: &Path) -> Options {
        Options {
            config: Some(dir.join("missing.toml")),
            ..Options::default()
        }
    }

    fn item(id: &str) -> TestItem {
        TestItem::new(TestId::new(id))
    }

    #[test]
    fn default_level_is_warn() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::builder().options(options_in(tmp.path())).build().unwrap();
        assert_eq!(session.default_level(), Level::WARN);
    }

    #[test]
    fn option_level_overrides_settings_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("testlogger.toml");
        std::fs::write(&path, "level = \"error\"\n").unwrap();

        let options = Options {
            config: Some(path.clone()),
            ..Options::default()
        };
        let session = Session::builder().options(options).build().unwrap();
        assert_eq!(session.default_level(), Level::ERROR);

        let options = Options {
            config: Some(path),
            level: Some(Level::INFO),
            ..Options::default()
        };
        let session = Session::builder().options(options).build().unwrap();
        assert_eq!(session.default_level(), Level::INFO);
    }

    #[test]
    fn invalid_settings_file_fails_build() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("testlogger.toml");
        std::fs::write(&path, "logsdir = [").unwrap();
        let options = Options {
            config: Some(path.clone()),
            ..Options::default()
        };
        let err = Session::builder().options(options).build().unwrap_err();
        assert!(matches!(err, LoggerError::Settings { path: p, .. } if p == path));
    }

    #[test]
    fn loggers_hooks_are_concatenated() {
        let tmp = tempfile::tempdir().unwrap();
        let mut first = MockHooks::new();
        first.expect_configure().returning(|_| Ok(()));
        first.expect_logdirlink().returning(|_| None);
        first
            .expect_stdout_loggers()
            .returning(|_| Some(vec![LoggerSpec::from("foo")]));
        first.expect_file_loggers().returning(|_| None);
        let mut second = MockHooks::new();
        second.expect_configure().returning(|_| Ok(()));
        second.expect_logdirlink().returning(|_| None);
        second
            .expect_stdout_loggers()
            .returning(|_| Some(vec![LoggerSpec::new("bar", Level::INFO)]));
        second
            .expect_file_loggers()
            .returning(|item| Some(vec![LoggerSpec::from(item.nodeid())]));

        let session = Session::builder()
            .options(options_in(tmp.path()))
            .hooks(first)
            .hooks(second)
            .build()
            .unwrap();
        let loggers = session.loggers_for(&item("suite::case")).unwrap();
        assert_eq!(
            loggers.stdout,
            vec![LoggerSpec::from("foo"), LoggerSpec::new("bar", Level::INFO)]
        );
        assert_eq!(loggers.file, vec![LoggerSpec::from("suite::case")]);
    }

    #[test]
    fn config_and_loggers_hooks_conflict() {
        let tmp = tempfile::tempdir().unwrap();
        let mut hooks = MockHooks::new();
        hooks.expect_configure().returning(|cfg| {
            cfg.add_logger_names(["foo"]);
            Ok(())
        });
        hooks.expect_logdirlink().returning(|_| None);
        hooks.expect_stdout_loggers().returning(|_| None);
        hooks
            .expect_file_loggers()
            .returning(|_| Some(vec![LoggerSpec::from("foo")]));

        let session = Session::builder()
            .options(options_in(tmp.path()))
            .hooks(hooks)
            .build()
            .unwrap();
        let err = session.loggers_for(&item("case")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "logger config and stdout/file loggers hooks used at the same time"
        );
    }

    #[test]
    fn configure_error_fails_build() {
        let tmp = tempfile::tempdir().unwrap();
        let mut hooks = MockHooks::new();
        hooks.expect_configure().returning(|cfg| {
            cfg.split_by_outcome(&["sthelese"], None)?;
            Ok(())
        });
        let err = Session::builder()
            .options(options_in(tmp.path()))
            .hooks(hooks)
            .build()
            .unwrap_err();
        assert!(matches!(err, LoggerError::UnexpectedOutcomes(_)));
    }

    #[test]
    fn log_option_is_parsed_at_build() {
        let tmp = tempfile::tempdir().unwrap();
        let mut hooks = MockHooks::new();
        hooks.expect_configure().returning(|cfg| {
            cfg.add_loggers(["foo"], Level::WARN, Level::NOTSET);
            Ok(())
        });
        hooks.expect_logdirlink().returning(|_| None);
        let options = Options {
            loggers: Some("alien".into()),
            ..options_in(tmp.path())
        };
        let err = Session::builder()
            .options(options)
            .hooks(hooks)
            .build()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "wrong logger, expected (foo), got \"alien\""
        );
    }

    #[test]
    fn log_option_default_applies_without_option() {
        let tmp = tempfile::tempdir().unwrap();
        let mut hooks = MockHooks::new();
        hooks.expect_configure().returning(|cfg| {
            cfg.add_loggers(["foo", "bar"], Level::WARN, Level::INFO)
                .set_log_option_default("bar.debug");
            Ok(())
        });
        hooks.expect_logdirlink().returning(|_| None);
        hooks.expect_stdout_loggers().returning(|_| None);
        hooks.expect_file_loggers().returning(|_| None);
        let session = Session::builder()
            .options(options_in(tmp.path()))
            .hooks(hooks)
            .build()
            .unwrap();
        let loggers = session.loggers_for(&item("case")).unwrap();
        assert_eq!(loggers.stdout, vec![LoggerSpec::new("bar", Level::DEBUG)]);
        assert_eq!(
            loggers.file,
            vec![
                LoggerSpec::new("foo", Level::INFO),
                LoggerSpec::new("bar", Level::INFO)
            ]
        );
    }

    #[test]
    fn logsdir_prefers_option_over_hook() {
        let tmp = tempfile::tempdir().unwrap();
        let from_option = tmp.path().join("from-option");
        let mut hooks = MockHooks::new();
        hooks.expect_configure().returning(|_| Ok(()));
        hooks.expect_logdirlink().returning(|_| None);
        hooks.expect_logsdir().never();
        let options = Options {
            logsdir: Some(from_option.clone()),
            ..options_in(tmp.path())
        };
        let session = Session::builder()
            .options(options)
            .hooks(hooks)
            .build()
            .unwrap();
        assert_eq!(session.logsdir().unwrap(), from_option);
        assert!(from_option.is_dir());
    }

    #[test]
    fn first_logsdir_hook_wins_and_is_cleaned() {
        let tmp = tempfile::tempdir().unwrap();
        let wanted = tmp.path().join("wanted");
        std::fs::create_dir_all(wanted.join("stale")).unwrap();

        let mut first = MockHooks::new();
        first.expect_configure().returning(|_| Ok(()));
        first.expect_logdirlink().returning(|_| None);
        let dir = wanted.clone();
        first.expect_logsdir().returning(move |_| Some(dir.clone()));
        let mut second = MockHooks::new();
        second.expect_configure().returning(|_| Ok(()));
        second.expect_logdirlink().returning(|_| None);
        second.expect_logsdir().never();

        let session = Session::builder()
            .options(options_in(tmp.path()))
            .hooks(first)
            .hooks(second)
            .build()
            .unwrap();
        assert_eq!(session.logsdir().unwrap(), wanted);
        assert!(!wanted.join("stale").exists());
        // Resolved once per session.
        assert_eq!(session.logsdir().unwrap(), wanted);
    }

    #[test]
    fn logsdir_falls_back_to_tempdir() {
        let tmp = tempfile::tempdir().unwrap();
        let session = Session::builder().options(options_in(tmp.path())).build().unwrap();
        assert!(session.logsdir_if_created().is_none());
        let dir = session.logsdir().unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with("logs"));
        assert_eq!(session.logsdir_if_created(), Some(dir.clone()));
        std::fs::remove_dir_all(dir.parent().unwrap()).ok();
    }

    #[test]
    fn logdir_follows_sanitized_nodeid() {
        let tmp = tempfile::tempdir().unwrap();
        let options = Options {
            logsdir: Some(tmp.path().join("logs")),
            ..options_in(tmp.path())
        };
        let session = Session::builder().options(options).build().unwrap();
        let dir = session
            .logdir(&TestId::new("suite::test_param").with_param("z-/e-1"))
            .unwrap();
        assert_eq!(dir, tmp.path().join("logs/suite/test_param-z-e-1"));
        assert!(dir.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn logdirlinks_point_at_logsdir() {
        let tmp = tempfile::tempdir().unwrap();
        let link = tmp.path().join("latest");
        let mut hooks = MockHooks::new();
        hooks.expect_configure().returning(|_| Ok(()));
        let target = link.clone();
        hooks
            .expect_logdirlink()
            .times(1)
            .returning(move |_| Some(target.clone()));
        let options = Options {
            logsdir: Some(tmp.path().join("logs")),
            ..options_in(tmp.path())
        };
        let session = Session::builder()
            .options(options)
            .hooks(hooks)
            .build()
            .unwrap();
        assert!(link.symlink_metadata().is_err(), "links wait for the logsdir");
        let logsdir = session.logsdir().unwrap();
        assert_eq!(std::fs::read_link(&link).unwrap(), logsdir);
    }
}
