//! Option surface of the extension, parsed with `clap`.
use std::path::PathBuf;

use clap::Parser;
use clap::builder::FalseyValueParser;

use crate::level::Level;

/// Options controlling the logging extension.
///
/// Test binaries own their command line, so every option is normally read
/// from its environment variable; [`Options::from_env`] does that.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(
    name = "testlogger",
    about = "Per-test terminal and file log handlers"
)]
pub struct Options {
    /// Base directory with log files for file loggers (default: a fresh temp dir)
    #[arg(long = "logger-logsdir", env = "TESTLOGGER_LOGSDIR")]
    pub logsdir: Option<PathBuf>,

    /// Loggers to print on the terminal, e.g. "foo,bar.info" (requires a logger config)
    #[arg(long, env = "TESTLOGGER_LOGGERS")]
    pub loggers: Option<String>,

    /// Threshold for handlers without an explicit level (default: WARN)
    #[arg(long = "logger-level", env = "TESTLOGGER_LEVEL")]
    pub level: Option<Level>,

    /// Settings file (default: $CARGO_MANIFEST_DIR/testlogger.toml)
    #[arg(long = "logger-config", env = "TESTLOGGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output capture is disabled for the test run
    #[arg(
        long,
        env = "RUST_TEST_NOCAPTURE",
        value_parser = FalseyValueParser::new()
    )]
    pub nocapture: bool,
}

impl Options {
    /// Read options from `TESTLOGGER_*` environment variables.
    ///
    /// Also honours `--nocapture` passed to the test binary itself.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds an invalid value.
    pub fn from_env() -> Result<Self, clap::Error> {
        let mut options = Self::try_parse_from(["testlogger"])?;
        if std::env::args().any(|arg| arg == "--nocapture" || arg == "--no-capture") {
            options.nocapture = true;
        }
        Ok(options)
    }
}
