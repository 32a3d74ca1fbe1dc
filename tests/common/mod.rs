// Shared helpers for integration tests.
//
// Provides a temporary logs directory, a terminal writer whose output can be
// inspected, and a hooks object configured from plain data, so each
// integration test can build an isolated session without repeating setup.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use testlogger::{
    LoggerConfig, LoggerError, LoggerHooks, LoggerSpec, Options, Session, SessionBuilder, TestItem,
};

/// Terminal writer collecting everything written to it.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Body of a `configure` hook.
pub type Configure = fn(&mut LoggerConfig) -> Result<(), LoggerError>;

/// Hooks answering with fixed values.
#[derive(Clone, Default)]
pub struct StaticHooks {
    pub stdout: Option<Vec<LoggerSpec>>,
    pub file: Option<Vec<LoggerSpec>>,
    pub logdirlink: Option<PathBuf>,
    pub logsdir: Option<PathBuf>,
    pub configure: Option<Configure>,
}

impl StaticHooks {
    pub fn stdout(mut self, loggers: impl IntoIterator<Item = impl Into<LoggerSpec>>) -> Self {
        self.stdout = Some(loggers.into_iter().map(Into::into).collect());
        self
    }

    pub fn file(mut self, loggers: impl IntoIterator<Item = impl Into<LoggerSpec>>) -> Self {
        self.file = Some(loggers.into_iter().map(Into::into).collect());
        self
    }

    pub fn logdirlink(mut self, link: impl Into<PathBuf>) -> Self {
        self.logdirlink = Some(link.into());
        self
    }

    pub fn logsdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.logsdir = Some(dir.into());
        self
    }

    pub fn configure(mut self, configure: Configure) -> Self {
        self.configure = Some(configure);
        self
    }
}

impl LoggerHooks for StaticHooks {
    fn stdout_loggers(&self, _item: &TestItem) -> Option<Vec<LoggerSpec>> {
        self.stdout.clone()
    }

    fn file_loggers(&self, _item: &TestItem) -> Option<Vec<LoggerSpec>> {
        self.file.clone()
    }

    fn logdirlink(&self, _options: &Options) -> Option<PathBuf> {
        self.logdirlink.clone()
    }

    fn logsdir(&self, _options: &Options) -> Option<PathBuf> {
        self.logsdir.clone()
    }

    fn configure(&self, config: &mut LoggerConfig) -> Result<(), LoggerError> {
        self.configure.map_or(Ok(()), |configure| configure(config))
    }
}

/// An isolated logging environment backed by a [`tempfile::TempDir`].
pub struct LogContext {
    /// Temporary directory holding the logs directory and settings file.
    pub root: tempfile::TempDir,
    /// Terminal output of every session built from this context.
    pub terminal: Captured,
}

impl LogContext {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
            terminal: Captured::default(),
        }
    }

    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Logs directory passed through the options.
    pub fn logsdir(&self) -> PathBuf {
        self.root.path().join("logs")
    }

    /// Options using [`Self::logsdir`] and a settings file inside the
    /// temporary directory.
    pub fn options(&self) -> Options {
        Options {
            logsdir: Some(self.logsdir()),
            config: Some(self.root.path().join("testlogger.toml")),
            ..Options::default()
        }
    }

    /// Session builder writing terminal output to [`Self::terminal`].
    pub fn builder(&self) -> SessionBuilder {
        let terminal = self.terminal.clone();
        Session::builder()
            .options(self.options())
            .terminal(move || terminal.clone())
    }

    /// Session with a single hooks object.
    pub fn session(&self, hooks: StaticHooks) -> Session {
        self.builder().hooks(hooks).build().expect("build session")
    }

    /// Write the settings file used by [`Self::options`].
    pub fn write_settings(&self, content: &str) {
        std::fs::write(self.root.path().join("testlogger.toml"), content)
            .expect("write settings file");
    }

    /// Lines of a log file, relative to the logs directory, without the
    /// leading timestamp.
    pub fn log_lines(&self, rel: &str) -> Vec<String> {
        let content = std::fs::read_to_string(self.logsdir().join(rel))
            .unwrap_or_else(|e| panic!("read {rel}: {e}"));
        strip_timestamps(&content)
    }

    /// Terminal lines without the leading timestamp.
    pub fn terminal_lines(&self) -> Vec<String> {
        strip_timestamps(&self.terminal.contents())
    }
}

/// Drop the `MM:SS.mmm` prefix of every line written by the default
/// formatter. Blank lines are kept.
pub fn strip_timestamps(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| {
            line.split_once(' ')
                .filter(|(time, _)| is_timestamp(time))
                .map_or(line, |(_, rest)| rest)
                .to_string()
        })
        .collect()
}

fn is_timestamp(s: &str) -> bool {
    s.len() == 9
        && s.chars()
            .enumerate()
            .all(|(i, c)| match i {
                2 => c == ':',
                5 => c == '.',
                _ => c.is_ascii_digit(),
            })
}

/// Sorted entry names of `dir`.
pub fn ls(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("read_dir {}: {e}", dir.display()))
        .map(|entry| {
            entry
                .expect("dir entry")
                .file_name()
                .to_string_lossy()
                .into_owned()
        })
        .collect();
    names.sort();
    names
}
