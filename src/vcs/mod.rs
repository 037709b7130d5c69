//! Version-control boundary and revision materialization.
//!
//! The boundary is three blocking operations against a working directory:
//! hard-reset tracked changes, remove untracked and ignored files, and check
//! out a revision. [`GitCli`] runs them through the `git` executable; tests
//! substitute a recording fake through the [`VersionControl`] trait.

pub mod errors;
pub mod materialize;

pub use errors::VcsError;
pub use materialize::{materialize, MaterializeReport, StepReport, VcsStep};

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// Exit information of one version-control operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stderr: String,
}

impl StepOutcome {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {}", code)?,
            None => write!(f, "terminated by signal")?,
        }
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            write!(f, ": {}", stderr)?;
        }
        Ok(())
    }
}

/// The three operations materialization needs.
pub trait VersionControl {
    /// Discard local modifications to tracked files.
    fn reset_hard(&self, workdir: &Path) -> Result<StepOutcome, VcsError>;

    /// Remove untracked and ignored files and directories.
    fn clean_all(&self, workdir: &Path) -> Result<StepOutcome, VcsError>;

    /// Move the working tree to `revision`.
    fn checkout(&self, workdir: &Path, revision: &str) -> Result<StepOutcome, VcsError>;
}

/// Runs the `git` executable. Calls block until git exits; there is no timeout.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl GitCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, workdir: &Path, args: &[&str]) -> Result<StepOutcome, VcsError> {
        debug!(workdir = %workdir.display(), ?args, "running git");

        let output: Output = Command::new(&self.program)
            .args(args)
            .current_dir(workdir)
            .output()
            .map_err(|source| VcsError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(output = %stdout.trim(), "git stdout");
        }

        Ok(StepOutcome {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl VersionControl for GitCli {
    fn reset_hard(&self, workdir: &Path) -> Result<StepOutcome, VcsError> {
        self.run(workdir, &["reset", "--hard"])
    }

    fn clean_all(&self, workdir: &Path) -> Result<StepOutcome, VcsError> {
        self.run(workdir, &["clean", "-fdx"])
    }

    fn checkout(&self, workdir: &Path, revision: &str) -> Result<StepOutcome, VcsError> {
        self.run(workdir, &["checkout", revision])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        let outcome = StepOutcome {
            code: Some(128),
            stderr: "fatal: reference is not a tree: abc123\n".to_string(),
        };
        assert_eq!(
            outcome.to_string(),
            "exit status 128: fatal: reference is not a tree: abc123"
        );
        assert!(!outcome.is_success());
        assert!(StepOutcome::success().is_success());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let git = GitCli::new("definitely-not-a-real-git-binary");
        let result = git.reset_hard(temp_dir.path());
        assert!(matches!(result, Err(VcsError::Spawn { .. })));
    }
}
