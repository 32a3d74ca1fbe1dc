//! Rendering of log records into lines.
use std::fmt::Write as _;
use std::time::{Duration, Instant};

use super::utils::format_elapsed;
use crate::level::Level;

/// One event as seen by a handler.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    /// Level of the event.
    pub level: Level,
    /// Target (logger name) of the event.
    pub target: &'a str,
    /// The `message` field.
    pub message: &'a str,
    /// Remaining fields as `(name, rendered value)` pairs, in record order.
    pub fields: &'a [(String, String)],
    /// When the event was observed.
    pub created: Instant,
}

/// Turns a [`Record`] into one line of output (without the trailing newline).
///
/// A fresh formatter is created for every test, so time-relative formats
/// measure from the start of the test.
pub trait Formatter: Send + Sync {
    /// Render `record`.
    fn format(&self, record: &Record<'_>) -> String;
}

/// Creates the formatter for one test.
pub type FormatterFactory = fn() -> Box<dyn Formatter>;

/// `MM:SS.mmm lvl target: message key=value...`
///
/// The time is measured from the creation of the formatter, i.e. from the
/// start of the test.
#[derive(Debug, Clone, Copy)]
pub struct DefaultFormatter {
    start: Instant,
}

impl DefaultFormatter {
    /// Formatter measuring time from `start`.
    #[must_use]
    pub const fn starting_at(start: Instant) -> Self {
        Self { start }
    }
}

impl Default for DefaultFormatter {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}

impl Formatter for DefaultFormatter {
    fn format(&self, record: &Record<'_>) -> String {
        let elapsed = record
            .created
            .checked_duration_since(self.start)
            .unwrap_or(Duration::ZERO);
        let mut line = format!(
            "{} {} {}: {}",
            format_elapsed(elapsed),
            record.level.short_name(),
            record.target,
            record.message
        );
        for (name, value) in record.fields {
            write!(line, " {name}={value}").ok();
        }
        line
    }
}

/// Renders the message alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn format(&self, record: &Record<'_>) -> String {
        record.message.to_string()
    }
}

pub(crate) fn boxed<F: Formatter + Default + 'static>() -> Box<dyn Formatter> {
    Box::new(F::default())
}
