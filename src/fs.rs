//! Filesystem helpers for the logs directory and its links.
use std::io;
use std::path::{Path, PathBuf};

use crate::error::LoggerError;

/// Prefix of the session directory allocated under the system temp dir.
const TMPDIR_PREFIX: &str = "testlogger-";

/// Prepare an explicitly configured logs directory.
///
/// With `clean`, anything already at `path` is removed first so every session
/// starts from an empty directory.
pub(crate) fn make_logsdir_dir(path: &Path, clean: bool) -> Result<PathBuf, LoggerError> {
    if clean {
        remove_any(path).map_err(|e| LoggerError::io(path, e))?;
    }
    std::fs::create_dir_all(path).map_err(|e| LoggerError::io(path, e))?;
    Ok(path.to_path_buf())
}

/// Allocate a fresh session directory under the system temp dir and return
/// its `logs` subdirectory.
///
/// The directory outlives the session so logs can be inspected afterwards.
pub(crate) fn make_logsdir_tmpdir() -> Result<PathBuf, LoggerError> {
    let base = tempfile::Builder::new()
        .prefix(TMPDIR_PREFIX)
        .tempdir()
        .map_err(|e| LoggerError::io(std::env::temp_dir(), e))?
        .keep();
    make_logsdir_dir(&base.join("logs"), false)
}

/// Point `link` at `source`, replacing whatever link was there.
///
/// Failures are logged and otherwise ignored: a missing convenience link
/// must not fail a test.
pub(crate) fn refresh_link(source: &Path, link: &Path) {
    if link.symlink_metadata().is_ok()
        && let Err(e) = remove_link(link)
    {
        tracing::debug!("cannot remove {}: {e}", link.display());
    }
    if let Err(e) = create_symlink(source, link) {
        tracing::debug!(
            "cannot link {} -> {}: {e}",
            link.display(),
            source.display()
        );
    }
}

fn remove_any(path: &Path) -> io::Result<()> {
    match path.symlink_metadata() {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn create_symlink(source: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn create_symlink(source: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(source, link)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_source: &Path, _link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlinks are not supported on this platform",
    ))
}

#[cfg(windows)]
fn remove_link(link: &Path) -> io::Result<()> {
    // Directory symlinks on Windows are removed as directories.
    std::fs::remove_dir(link).or_else(|_| std::fs::remove_file(link))
}

#[cfg(not(windows))]
fn remove_link(link: &Path) -> io::Result<()> {
    std::fs::remove_file(link)
}
