//! Utility functions for ANSI stripping, time formatting and file naming.
use std::time::Duration;

use chrono::{NaiveTime, TimeDelta};

/// Strip ANSI escape sequences from a string.
///
/// Handles SGR sequences (ending in `m`) and other CSI sequences (ending
/// in any letter in the `@`..`~` range), so cursor movement, erase, etc.
/// are also stripped without consuming unrelated text.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if let Some(next) = chars.next()
                && next == '['
            {
                for inner in chars.by_ref() {
                    if ('@'..='~').contains(&inner) {
                        break;
                    }
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Format a duration as `MM:SS.mmm`; minutes wrap at one hour.
pub(super) fn format_elapsed(elapsed: Duration) -> String {
    let delta = TimeDelta::from_std(elapsed).unwrap_or_default();
    let (time, _) = NaiveTime::default().overflowing_add_signed(delta);
    time.format("%M:%S%.3f").to_string()
}

/// File name for a logger's log file inside a test logdir.
///
/// The root logger writes to `logs`; `::` separators become `.` so module
/// paths are valid file names everywhere.
pub(super) fn log_file_name(logger: &str) -> String {
    if logger.is_empty() {
        "logs".to_string()
    } else {
        logger.replace("::", ".")
    }
}
