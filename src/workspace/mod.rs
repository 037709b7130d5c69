//! Per-example workspace provisioning.
//!
//! Each example gets its own copy of the canonical repository under the work
//! directory, named `<prefix><stem>` where `stem` is the example file name
//! without its extension. Anything already at that path is destroyed first,
//! so a workspace always starts as an exact snapshot of the canonical tree.

pub mod copy;
pub mod errors;

pub use copy::copy_tree;
pub use errors::WorkspaceError;

use crate::safety::WorkspaceGuard;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Derive the workspace directory name for an example.
///
/// Any leading directories and the final extension are dropped:
/// `data/example_7.json` becomes `test_example_7` with the default prefix.
pub fn workspace_name(prefix: &str, example_name: &str) -> Option<String> {
    let stem = Path::new(example_name).file_stem()?.to_str()?;
    Some(format!("{prefix}{stem}"))
}

#[derive(Debug, Clone)]
pub struct WorkspaceProvisioner {
    guard: WorkspaceGuard,
    prefix: String,
}

impl WorkspaceProvisioner {
    /// Both `work_dir` and `canonical_repo` must already exist.
    pub fn new(
        work_dir: impl AsRef<Path>,
        canonical_repo: impl AsRef<Path>,
        prefix: impl Into<String>,
    ) -> Result<Self, WorkspaceError> {
        Ok(Self {
            guard: WorkspaceGuard::new(work_dir, canonical_repo)?,
            prefix: prefix.into(),
        })
    }

    pub fn canonical_repo(&self) -> &Path {
        self.guard.canonical_repo()
    }

    /// The path `provision` would use, without touching the filesystem.
    pub fn workspace_path(&self, example_name: &str) -> Result<PathBuf, WorkspaceError> {
        let name = workspace_name(&self.prefix, example_name)
            .ok_or_else(|| WorkspaceError::InvalidExampleName(example_name.to_string()))?;
        Ok(self.guard.validate_name(&name)?)
    }

    /// Replace the example's workspace with a fresh copy of the canonical tree.
    pub fn provision(&self, example_name: &str) -> Result<PathBuf, WorkspaceError> {
        let target = self.workspace_path(example_name)?;

        self.remove_existing(&target)?;

        info!(
            from = %self.canonical_repo().display(),
            to = %target.display(),
            "copying repository"
        );
        copy_tree(self.canonical_repo(), &target)?;

        Ok(target)
    }

    fn remove_existing(&self, target: &Path) -> Result<(), WorkspaceError> {
        let metadata = match fs::symlink_metadata(target) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(WorkspaceError::Io {
                    path: target.to_path_buf(),
                    source,
                })
            }
        };

        debug!(path = %target.display(), "removing previous workspace");

        let result = if metadata.is_dir() {
            let resolved = self.guard.revalidate(target)?;
            fs::remove_dir_all(resolved)
        } else {
            // A stale file or symlink: remove the entry itself, never its target.
            fs::remove_file(target)
        };

        result.map_err(|source| WorkspaceError::Io {
            path: target.to_path_buf(),
            source,
        })
    }
}
