//! Per-test log handlers for Rust test suites.
//!
//! A [`Session`] decides, for each test, which `tracing` targets ("loggers")
//! are printed on the terminal and which are written to files in a directory
//! of the test's own. [`Session::setup`] attaches those handlers to the
//! test's thread and returns a [`TestGuard`]; dropping the guard detaches
//! them again.
//!
//! Loggers are chosen either by [`LoggerHooks`] implementations or through
//! the [`LoggerConfig`] builder, in which case the `TESTLOGGER_LOGGERS`
//! option (`foo,bar.info`) picks the ones shown on the terminal.
//!
//! The public API is organised into three layers:
//!
//! - **[`config`]**: logger selection and the loggers option
//! - **[`logging`]**: formatters and the tracing layer feeding the handlers
//! - **[`cli`]**: options read from the environment
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod config;
mod error;
mod fs;
mod hooks;
mod level;
pub mod logging;
mod nodeid;
mod outcome;
mod session;
mod state;

pub use cli::Options;
pub use config::{LoggerConfig, LoggerRow, LoggerSpec, Loggers, loggers_from_logcfg, parse_log_option};
pub use error::{LevelError, LogOptionError, LoggerError};
pub use hooks::{LoggerHooks, TestItem};
pub use level::{Level, level_or_none, sanitize_level};
pub use logging::{DefaultFormatter, Formatter, PlainFormatter, Record};
pub use nodeid::{TestId, sanitize_nodeid};
pub use outcome::{Outcome, SplitByOutcome};
pub use session::{Session, SessionBuilder};
pub use state::TestGuard;
