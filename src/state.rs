//! Per-test handler lifecycle: attach on setup, detach on report.
use std::fmt;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::dispatcher::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::Loggers;
use crate::error::LoggerError;
use crate::level::Level;
use crate::logging::{Formatter, Handler, HandlerLayer};
use crate::nodeid::TestId;
use crate::outcome::Outcome;
use crate::session::Session;

/// Handlers of one test and whether they are attached.
struct LoggerState {
    put_newlines: bool,
    handlers: Arc<[Handler]>,
    dispatch: tracing::Dispatch,
    attached: Option<DefaultGuard>,
}

impl LoggerState {
    fn new(session: &Session, id: &TestId, loggers: &Loggers) -> Result<Self, LoggerError> {
        let formatter: Arc<dyn Formatter> = Arc::from(session.config().make_formatter());
        let mut handlers = Vec::with_capacity(loggers.stdout.len() + loggers.file.len());
        for spec in &loggers.stdout {
            handlers.push(Handler::terminal(
                &spec.name,
                spec.level,
                Arc::clone(session.terminal()),
                Arc::clone(&formatter),
            ));
        }
        if !loggers.file.is_empty() {
            let logdir = session.logdir(id)?;
            for spec in &loggers.file {
                handlers.push(Handler::file(
                    &spec.name,
                    spec.level,
                    &logdir,
                    Arc::clone(&formatter),
                ));
            }
        }

        // Terminal and file loggers together lower the floor for everything.
        let base_level = if loggers.stdout.is_empty() || loggers.file.is_empty() {
            session.default_level()
        } else {
            Level::NOTSET
        };
        let handlers: Arc<[Handler]> = handlers.into();
        let dispatch = HandlerLayer::new(Arc::clone(&handlers), base_level).into_dispatch();
        Ok(Self {
            put_newlines: session.options().nocapture && !loggers.stdout.is_empty(),
            handlers,
            dispatch,
            attached: None,
        })
    }

    /// Start terminal output on a fresh line when output is not captured.
    fn put_newline(&self, session: &Session) {
        if self.put_newlines {
            let mut w = session.terminal().make_writer();
            writeln!(w).ok();
        }
    }

    fn on_setup(&mut self, session: &Session) {
        self.put_newline(session);
        self.attached = Some(tracing::dispatcher::set_default(&self.dispatch));
    }

    fn on_teardown(&self, session: &Session) {
        self.put_newline(session);
    }

    fn on_makereport(&mut self) {
        self.attached = None;
        for handler in self.handlers.iter() {
            if let Some(e) = handler.close() {
                tracing::debug!("{handler:?} dropped records: {e}");
            }
        }
    }
}

/// Keeps a test's handlers attached to the current thread.
///
/// Dropping the guard tears the test down and reports it as failed if the
/// thread is panicking, passed otherwise. Use [`finish`](Self::finish) to
/// report another outcome or to see teardown errors.
pub struct TestGuard<'s> {
    session: &'s Session,
    id: TestId,
    state: LoggerState,
    reported: bool,
}

impl<'s> TestGuard<'s> {
    pub(crate) fn new(
        session: &'s Session,
        id: TestId,
        loggers: Loggers,
    ) -> Result<Self, LoggerError> {
        let mut state = LoggerState::new(session, &id, &loggers)?;
        state.on_setup(session);
        Ok(Self {
            session,
            id,
            state,
            reported: false,
        })
    }

    /// Identifier of the guarded test.
    #[must_use]
    pub const fn id(&self) -> &TestId {
        &self.id
    }

    /// Dispatcher routing events to this test's handlers.
    ///
    /// Events from threads spawned by the test reach the handlers only when
    /// those threads run under this dispatcher:
    ///
    /// ```no_run
    /// # fn demo(guard: &testlogger::TestGuard<'_>) {
    /// let dispatch = guard.dispatch().clone();
    /// std::thread::spawn(move || {
    ///     tracing::dispatcher::with_default(&dispatch, || {
    ///         tracing::warn!(target: "worker", "from a spawned thread");
    ///     });
    /// })
    /// .join()
    /// .unwrap();
    /// # }
    /// ```
    ///
    /// After the test is reported the dispatcher has no live handlers.
    #[must_use]
    pub const fn dispatch(&self) -> &tracing::Dispatch {
        &self.state.dispatch
    }

    /// This test's directory, created on first use.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn logdir(&self) -> Result<PathBuf, LoggerError> {
        self.session.logdir(&self.id)
    }

    /// Tear the test down and report `outcome`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the by-outcome link directory cannot be
    /// created.
    pub fn finish(mut self, outcome: Outcome) -> Result<(), LoggerError> {
        self.report(outcome)
    }

    fn report(&mut self, outcome: Outcome) -> Result<(), LoggerError> {
        if self.reported {
            return Ok(());
        }
        self.reported = true;
        self.state.on_teardown(self.session);
        self.state.on_makereport();

        let (Some(split), Some(logsdir)) =
            (self.session.config().split(), self.session.logsdir_if_created())
        else {
            return Ok(());
        };
        if let Some(link) = split.link(&logsdir, &self.id.relative_dir(), outcome)? {
            tracing::debug!("{} linked as {}", self.id, link.display());
        }
        Ok(())
    }
}

impl Drop for TestGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.report(Outcome::detect()) {
            tracing::warn!("teardown of {} failed: {e}", self.id);
        }
    }
}

impl fmt::Debug for TestGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestGuard")
            .field("id", &self.id)
            .field("attached", &self.state.attached.is_some())
            .field("handlers", &self.state.handlers)
            .finish_non_exhaustive()
    }
}
