//! Force a workspace to exactly match a revision.
//!
//! Steps run in a fixed order: reset, clean, checkout. Every step runs even
//! if an earlier one failed, and no failure is escalated; a bad revision
//! shows up as a failed checkout in the report and the caller moves on.

use super::{StepOutcome, VcsError, VersionControl};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsStep {
    Reset,
    Clean,
    Checkout,
}

impl fmt::Display for VcsStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsStep::Reset => write!(f, "reset"),
            VcsStep::Clean => write!(f, "clean"),
            VcsStep::Checkout => write!(f, "checkout"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: VcsStep,
    /// Exit information, or the reason the command could not be started
    pub outcome: Result<StepOutcome, String>,
}

impl StepReport {
    pub fn succeeded(&self) -> bool {
        matches!(&self.outcome, Ok(outcome) if outcome.is_success())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "MaterializeReport records step failures that are not otherwise surfaced"]
pub enum MaterializeReport {
    /// No revision was given; the workspace keeps whatever the copy inherited
    Skipped,
    Ran {
        revision: String,
        steps: Vec<StepReport>,
    },
}

impl MaterializeReport {
    /// Steps whose command failed to start or exited non-zero.
    pub fn failures(&self) -> Vec<&StepReport> {
        match self {
            MaterializeReport::Skipped => Vec::new(),
            MaterializeReport::Ran { steps, .. } => {
                steps.iter().filter(|s| !s.succeeded()).collect()
            }
        }
    }

    pub fn checked_out(&self) -> Option<&str> {
        match self {
            MaterializeReport::Ran { revision, steps }
                if steps
                    .iter()
                    .any(|s| s.step == VcsStep::Checkout && s.succeeded()) =>
            {
                Some(revision.as_str())
            }
            _ => None,
        }
    }
}

/// Reset, clean, and check out `revision` in `workdir`.
///
/// An absent, empty, or whitespace-only revision skips all three steps. A
/// revision starting with `-` is never handed to the checkout command; that
/// step is recorded as failed.
pub fn materialize<V: VersionControl + ?Sized>(
    vcs: &V,
    workdir: &Path,
    revision: Option<&str>,
) -> MaterializeReport {
    let Some(revision) = revision.map(str::trim).filter(|r| !r.is_empty()) else {
        info!(workspace = %workdir.display(), "no initial revision; keeping copied state");
        return MaterializeReport::Skipped;
    };

    info!(workspace = %workdir.display(), revision, "checking out revision");

    let steps = [VcsStep::Reset, VcsStep::Clean, VcsStep::Checkout]
        .into_iter()
        .map(|step| {
            let outcome = match step {
                VcsStep::Reset => vcs.reset_hard(workdir),
                VcsStep::Clean => vcs.clean_all(workdir),
                VcsStep::Checkout if revision.starts_with('-') => {
                    Err(VcsError::OptionLikeRevision(revision.to_string()))
                }
                VcsStep::Checkout => vcs.checkout(workdir, revision),
            }
            .map_err(|e| e.to_string());

            let report = StepReport { step, outcome };
            match &report.outcome {
                Ok(outcome) if outcome.is_success() => {}
                Ok(outcome) => warn!(%step, revision, %outcome, "version-control step failed"),
                Err(reason) => warn!(%step, revision, %reason, "version-control step did not run"),
            }
            report
        })
        .collect();

    MaterializeReport::Ran {
        revision: revision.to_string(),
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::VcsError;
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingVcs {
        calls: RefCell<Vec<String>>,
        fail_reset_spawn: bool,
        fail_checkout: bool,
    }

    impl VersionControl for RecordingVcs {
        fn reset_hard(&self, _workdir: &Path) -> Result<StepOutcome, VcsError> {
            self.calls.borrow_mut().push("reset".to_string());
            if self.fail_reset_spawn {
                return Err(VcsError::Spawn {
                    program: PathBuf::from("git"),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no git"),
                });
            }
            Ok(StepOutcome::success())
        }

        fn clean_all(&self, _workdir: &Path) -> Result<StepOutcome, VcsError> {
            self.calls.borrow_mut().push("clean".to_string());
            Ok(StepOutcome::success())
        }

        fn checkout(&self, _workdir: &Path, revision: &str) -> Result<StepOutcome, VcsError> {
            self.calls.borrow_mut().push(format!("checkout {revision}"));
            if self.fail_checkout {
                Ok(StepOutcome {
                    code: Some(1),
                    stderr: "error: pathspec did not match".to_string(),
                })
            } else {
                Ok(StepOutcome::success())
            }
        }
    }

    #[test]
    fn test_steps_run_in_order() {
        let vcs = RecordingVcs::default();
        let report = materialize(&vcs, Path::new("/ws"), Some("abc123"));

        assert_eq!(
            *vcs.calls.borrow(),
            vec!["reset", "clean", "checkout abc123"]
        );
        assert_eq!(report.checked_out(), Some("abc123"));
        assert!(report.failures().is_empty());
    }

    #[test]
    fn test_absent_revision_skips_everything() {
        let vcs = RecordingVcs::default();
        assert_eq!(
            materialize(&vcs, Path::new("/ws"), None),
            MaterializeReport::Skipped
        );
        assert_eq!(
            materialize(&vcs, Path::new("/ws"), Some("  ")),
            MaterializeReport::Skipped
        );
        assert!(vcs.calls.borrow().is_empty());
    }

    #[test]
    fn test_failed_checkout_is_recorded_not_escalated() {
        let vcs = RecordingVcs {
            fail_checkout: true,
            ..Default::default()
        };
        let report = materialize(&vcs, Path::new("/ws"), Some("deadbeef"));

        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].step, VcsStep::Checkout);
        assert_eq!(report.checked_out(), None);
    }

    #[test]
    fn test_spawn_failure_does_not_stop_later_steps() {
        let vcs = RecordingVcs {
            fail_reset_spawn: true,
            ..Default::default()
        };
        let report = materialize(&vcs, Path::new("/ws"), Some("abc123"));

        assert_eq!(
            *vcs.calls.borrow(),
            vec!["reset", "clean", "checkout abc123"]
        );
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].step, VcsStep::Reset);
        assert!(matches!(&failures[0].outcome, Err(reason) if reason.contains("no git")));
        assert_eq!(report.checked_out(), Some("abc123"));
    }

    #[test]
    fn test_option_like_revision_is_not_checked_out() {
        let vcs = RecordingVcs::default();
        let report = materialize(&vcs, Path::new("/ws"), Some("--orphan=evil"));

        assert_eq!(*vcs.calls.borrow(), vec!["reset", "clean"]);
        let failures = report.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].step, VcsStep::Checkout);
        assert!(matches!(&failures[0].outcome, Err(reason) if reason.contains("--orphan=evil")));
        assert_eq!(report.checked_out(), None);
    }

    #[test]
    fn test_revision_is_trimmed() {
        let vcs = RecordingVcs::default();
        let _ = materialize(&vcs, Path::new("/ws"), Some(" abc123\n"));
        assert_eq!(vcs.calls.borrow().last().unwrap(), "checkout abc123");
    }
}
