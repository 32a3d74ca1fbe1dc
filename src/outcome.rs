//! Test outcomes and the by-outcome link tree.
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::LoggerError;
use crate::fs::refresh_link;

/// Final result of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The test completed without panicking.
    Passed,
    /// The test panicked or was reported as failed.
    Failed,
    /// The test was reported as skipped.
    Skipped,
}

impl Outcome {
    /// Lower-case name, also used as the by-outcome directory name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Outcome implied by the current thread's state.
    #[must_use]
    pub fn detect() -> Self {
        if std::thread::panicking() {
            Self::Failed
        } else {
            Self::Passed
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "passed" => Ok(Self::Passed),
            "failed" => Ok(Self::Failed),
            "skipped" => Ok(Self::Skipped),
            other => Err(LoggerError::UnexpectedOutcomes(vec![other.to_string()])),
        }
    }
}

/// Where to mirror test logdirs, grouped by outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitByOutcome {
    /// Outcomes that get a link.
    pub outcomes: Vec<Outcome>,
    /// Directory under the logs directory holding one subdirectory per outcome.
    pub subdir: String,
}

impl SplitByOutcome {
    /// Default subdirectory name.
    pub const DEFAULT_SUBDIR: &'static str = "by_outcome";

    /// Link `<logsdir>/<rel>` from `<logsdir>/<subdir>/<outcome>/<rel>`.
    ///
    /// Does nothing when the outcome is not selected or the test produced no
    /// logdir. Returns the link path when one was made.
    pub(crate) fn link(
        &self,
        logsdir: &Path,
        rel: &Path,
        outcome: Outcome,
    ) -> Result<Option<PathBuf>, LoggerError> {
        if !self.outcomes.contains(&outcome) || !logsdir.join(rel).is_dir() {
            return Ok(None);
        }
        let outcome_dir = Path::new(&self.subdir).join(outcome.as_str());
        let link = logsdir.join(&outcome_dir).join(rel);
        if let Some(parent) = link.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LoggerError::io(parent, e))?;
        }
        refresh_link(&relative_link_target(&outcome_dir, rel), &link);
        Ok(Some(link))
    }
}

/// Relative path from the parent of `<base>/<rel>` back to `rel`.
///
/// `relative_link_target("by_outcome/failed", "suite/case")` is
/// `../../../suite/case`.
pub(crate) fn relative_link_target(base: &Path, rel: &Path) -> PathBuf {
    let depth = count_normal(base) + count_normal(rel).saturating_sub(1);
    let mut target: PathBuf = std::iter::repeat_n(Component::ParentDir, depth).collect();
    target.push(rel);
    target
}

fn count_normal(path: &Path) -> usize {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
}
