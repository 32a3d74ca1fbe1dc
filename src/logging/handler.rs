//! Handlers: one logger name bound to one destination.
use std::fmt;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use super::formatter::{Formatter, Record};
use super::utils::{log_file_name, strip_ansi};
use crate::level::Level;

/// Where a handler writes.
enum Sink {
    /// Terminal output through a shared writer factory.
    Terminal(Arc<BoxMakeWriter>),
    /// A per-test log file, opened on the first record.
    File {
        path: PathBuf,
        file: Mutex<Option<fs::File>>,
    },
}

/// A handler attached to one logger for the duration of one test.
pub(crate) struct Handler {
    logger: String,
    level: Level,
    sink: Sink,
    formatter: Arc<dyn Formatter>,
    closed: AtomicBool,
    /// First write error, reported when the handler is closed.
    failure: Mutex<Option<io::Error>>,
}

impl Handler {
    /// Handler printing `logger` records to the terminal.
    pub(crate) fn terminal(
        logger: &str,
        level: Level,
        writer: Arc<BoxMakeWriter>,
        formatter: Arc<dyn Formatter>,
    ) -> Self {
        Self {
            logger: logger.to_string(),
            level,
            sink: Sink::Terminal(writer),
            formatter,
            closed: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    /// Handler writing `logger` records to a file in `logdir`.
    ///
    /// The file is created (truncated) only when the first record arrives.
    pub(crate) fn file(
        logger: &str,
        level: Level,
        logdir: &Path,
        formatter: Arc<dyn Formatter>,
    ) -> Self {
        Self {
            logger: logger.to_string(),
            level,
            sink: Sink::File {
                path: logdir.join(log_file_name(logger)),
                file: Mutex::new(None),
            },
            formatter,
            closed: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    /// Whether events for `target` belong to this handler's logger.
    ///
    /// The empty (root) logger matches every target; otherwise the logger
    /// matches itself and its descendants (`foo` matches `foo::bar` and
    /// `foo.bar`).
    pub(crate) fn matches(&self, target: &str) -> bool {
        if self.logger.is_empty() {
            return true;
        }
        target.strip_prefix(self.logger.as_str()).is_some_and(|rest| {
            rest.is_empty() || rest.starts_with("::") || rest.starts_with('.')
        })
    }

    /// Minimum level accepted given the logger's base level.
    pub(crate) fn threshold(&self, base: Level) -> Level {
        self.level.max(base)
    }

    /// Format and write `record`. Closed handlers drop records.
    pub(crate) fn emit(&self, record: &Record<'_>) -> io::Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Ok(());
        }
        let line = self.formatter.format(record);
        match &self.sink {
            Sink::Terminal(writer) => {
                let mut w = writer.make_writer();
                writeln!(w, "{line}")
            }
            Sink::File { path, file } => {
                let mut guard = file.lock().unwrap_or_else(PoisonError::into_inner);
                if guard.is_none() {
                    *guard = Some(fs::File::create(path)?);
                }
                match guard.as_mut() {
                    Some(f) => writeln!(f, "{}", strip_ansi(&line)),
                    None => Ok(()),
                }
            }
        }
    }

    /// Remember a failed write; only the first error is kept.
    pub(crate) fn record_failure(&self, error: io::Error) {
        let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
        if failure.is_none() {
            *failure = Some(error);
        }
    }

    /// Flush and close the handler's file, if any. The file is not reopened
    /// afterwards.
    ///
    /// Returns the first error the handler ran into while writing.
    pub(crate) fn close(&self) -> Option<io::Error> {
        self.closed.store(true, Ordering::Release);
        if let Sink::File { file, .. } = &self.sink {
            let mut guard = file.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(mut f) = guard.take()
                && let Err(e) = f.flush()
            {
                self.record_failure(e);
            }
        }
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Path of the log file for file handlers.
    pub(crate) fn path(&self) -> Option<&Path> {
        match &self.sink {
            Sink::File { path, .. } => Some(path),
            Sink::Terminal(_) => None,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("logger", &self.logger)
            .field("level", &self.level)
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::formatter::PlainFormatter;
    use std::time::Instant;

    fn plain() -> Arc<dyn Formatter> {
        Arc::new(PlainFormatter)
    }

    fn record(message: &str) -> Record<'_> {
        Record {
            level: Level::WARN,
            target: "foo",
            message,
            fields: &[],
            created: Instant::now(),
        }
    }

    #[test]
    fn root_matches_everything() {
        let h = Handler::file("", Level::NOTSET, Path::new("/nonexistent"), plain());
        assert!(h.matches("foo"));
        assert!(h.matches("my_crate::db"));
    }

    #[test]
    fn named_logger_matches_descendants_only() {
        let h = Handler::file("foo", Level::NOTSET, Path::new("/nonexistent"), plain());
        assert!(h.matches("foo"));
        assert!(h.matches("foo::bar"));
        assert!(h.matches("foo.bar"));
        assert!(!h.matches("foobar"));
        assert!(!h.matches("bar"));
        assert!(!h.matches("bar::foo"));
    }

    #[test]
    fn threshold_is_the_stricter_level() {
        let h = Handler::file("foo", Level::ERROR, Path::new("/nonexistent"), plain());
        assert_eq!(h.threshold(Level::WARN), Level::ERROR);
        let h = Handler::file("foo", Level::NOTSET, Path::new("/nonexistent"), plain());
        assert_eq!(h.threshold(Level::WARN), Level::WARN);
        assert_eq!(h.threshold(Level::NOTSET), Level::NOTSET);
    }

    #[test]
    fn file_is_created_lazily() {
        let tmp = tempfile::tempdir().unwrap();
        let h = Handler::file("foo", Level::NOTSET, tmp.path(), plain());
        let path = tmp.path().join("foo");
        assert_eq!(h.path(), Some(path.as_path()));
        assert!(!path.exists(), "no file before the first record");

        h.emit(&record("first")).unwrap();
        h.emit(&record("\x1b[31msecond\x1b[0m")).unwrap();
        h.close();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn file_is_truncated_on_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("logs"), "stale\n").unwrap();
        let h = Handler::file("", Level::NOTSET, tmp.path(), plain());
        h.emit(&record("fresh")).unwrap();
        h.close();
        assert_eq!(
            fs::read_to_string(tmp.path().join("logs")).unwrap(),
            "fresh\n"
        );
    }

    #[test]
    fn closed_handler_keeps_its_file() {
        let tmp = tempfile::tempdir().unwrap();
        let h = Handler::file("foo", Level::NOTSET, tmp.path(), plain());
        h.emit(&record("kept")).unwrap();
        h.close();
        h.emit(&record("late")).unwrap();
        assert_eq!(
            fs::read_to_string(tmp.path().join("foo")).unwrap(),
            "kept\n"
        );
    }

    #[test]
    fn close_reports_the_first_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let h = Handler::file("foo", Level::NOTSET, &tmp.path().join("missing"), plain());
        let first = h.emit(&record("lost")).unwrap_err();
        h.record_failure(first);
        h.record_failure(io::Error::other("second"));
        let err = h.close().expect("failure is reported");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(h.close().is_none(), "reported once");
    }

    #[test]
    fn module_path_loggers_use_dotted_file_names() {
        let tmp = tempfile::tempdir().unwrap();
        let h = Handler::file("my_crate::db", Level::NOTSET, tmp.path(), plain());
        assert_eq!(h.path(), Some(tmp.path().join("my_crate.db").as_path()));
    }
}
