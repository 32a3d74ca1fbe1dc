//! Parser for the loggers option: `name[.level],name[.level],...`.
use super::{LoggerRow, LoggerSpec};
use crate::error::LogOptionError;
use crate::level::{Level, sanitize_level};

/// Parse a loggers option value against the configured logger rows.
///
/// A bare `name` takes its row's terminal level; `name.level` overrides it.
/// Names may themselves contain dots, so the whole entry is first tried as a
/// name before splitting off a level suffix.
///
/// # Examples
///
/// ```
/// use testlogger::{Level, LoggerRow, LoggerSpec, parse_log_option};
///
/// let rows = [LoggerRow::new(["foo", "bar"], Level::WARN, Level::NOTSET)];
/// let parsed = parse_log_option(&rows, "foo,bar.info").unwrap();
/// assert_eq!(
///     parsed,
///     [LoggerSpec::new("foo", Level::WARN), LoggerSpec::new("bar", Level::INFO)]
/// );
/// ```
///
/// # Errors
///
/// Returns [`LogOptionError::WrongLevel`] when the logger is known but the
/// level suffix is not a level, and [`LogOptionError::WrongLogger`] when the
/// logger is unknown (reporting the whole entry if the suffix is not a level
/// either).
pub fn parse_log_option(rows: &[LoggerRow], value: &str) -> Result<Vec<LoggerSpec>, LogOptionError> {
    value
        .split(',')
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_entry(rows, entry))
        .collect()
}

fn parse_entry(rows: &[LoggerRow], entry: &str) -> Result<LoggerSpec, LogOptionError> {
    if let Some(level) = stdout_level_of(rows, entry) {
        return Ok(LoggerSpec::new(entry, level));
    }
    let Some((name, level)) = entry.rsplit_once('.') else {
        return Err(wrong_logger(rows, entry));
    };
    match (stdout_level_of(rows, name), sanitize_level(level)) {
        (Some(_), Ok(level)) => Ok(LoggerSpec::new(name, level)),
        (Some(_), Err(e)) => Err(e.into()),
        (None, Ok(_)) => Err(wrong_logger(rows, name)),
        (None, Err(_)) => Err(wrong_logger(rows, entry)),
    }
}

/// Terminal level of the first row configuring `name`.
fn stdout_level_of(rows: &[LoggerRow], name: &str) -> Option<Level> {
    rows.iter()
        .find(|row| row.names.iter().any(|n| n == name))
        .map(|row| row.stdout_level)
}

fn wrong_logger(rows: &[LoggerRow], got: &str) -> LogOptionError {
    let mut names: Vec<&str> = Vec::new();
    for name in rows.iter().flat_map(|row| row.names.iter()) {
        if !names.contains(&name.as_str()) {
            names.push(name);
        }
    }
    LogOptionError::WrongLogger {
        expected: names.join(", "),
        got: got.to_string(),
    }
}
