//! Per-test log handlers and the tracing layer that feeds them.

mod formatter;
mod handler;
mod subscriber;
mod utils;

pub use formatter::{DefaultFormatter, Formatter, FormatterFactory, PlainFormatter, Record};
pub(crate) use formatter::boxed as boxed_formatter;
pub(crate) use handler::Handler;
pub(crate) use subscriber::HandlerLayer;
