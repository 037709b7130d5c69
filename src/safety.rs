use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Safety checks that run before a workspace directory is destroyed.
///
/// Provisioning deletes whatever already sits at the workspace path, so the
/// path must be a plain child of the work directory and must never be,
/// contain, or sit inside the canonical repository.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Absolute path to the work directory
    work_dir: PathBuf,
    /// Canonical path to the shared source tree
    canonical_repo: PathBuf,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("Workspace name is not a plain directory name: {0:?}")]
    InvalidName(String),

    #[error("Path is outside work directory: {path} (work directory: {work_dir})")]
    OutsideWorkDir { path: PathBuf, work_dir: PathBuf },

    #[error("Refusing to replace canonical repository: {path} (repository: {repo})")]
    CanonicalRepository { path: PathBuf, repo: PathBuf },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl WorkspaceGuard {
    /// Create a guard for workspaces under `work_dir` copied from `canonical_repo`.
    ///
    /// Both paths must exist; they are canonicalized to handle symlinks.
    /// A work directory at or below the repository is refused, since every
    /// workspace copy would land inside the tree it copies.
    pub fn new(
        work_dir: impl AsRef<Path>,
        canonical_repo: impl AsRef<Path>,
    ) -> Result<Self, SafetyError> {
        let work_dir = work_dir.as_ref().canonicalize()?;
        let canonical_repo = canonical_repo.as_ref().canonicalize()?;
        if work_dir.starts_with(&canonical_repo) {
            return Err(SafetyError::CanonicalRepository {
                path: work_dir,
                repo: canonical_repo,
            });
        }
        Ok(Self {
            work_dir,
            canonical_repo,
        })
    }

    /// Resolve a workspace directory name to a path that is safe to replace.
    pub fn validate_name(&self, name: &str) -> Result<PathBuf, SafetyError> {
        let mut components = Path::new(name).components();
        let plain = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !plain {
            return Err(SafetyError::InvalidName(name.to_string()));
        }

        let path = self.work_dir.join(name);
        self.check(&path)?;
        Ok(path)
    }

    /// Re-check an existing path right before it is removed.
    ///
    /// Symlinks are resolved, so a workspace path that was swapped for a link
    /// into the canonical repository is caught here.
    pub fn revalidate(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        let canonical = path.canonicalize()?;
        if canonical.parent() != Some(self.work_dir.as_path()) {
            return Err(SafetyError::OutsideWorkDir {
                path: canonical,
                work_dir: self.work_dir.clone(),
            });
        }
        self.check(&canonical)?;
        Ok(canonical)
    }

    fn check(&self, path: &Path) -> Result<(), SafetyError> {
        if !path.starts_with(&self.work_dir) || path == self.work_dir {
            return Err(SafetyError::OutsideWorkDir {
                path: path.to_path_buf(),
                work_dir: self.work_dir.clone(),
            });
        }

        if path.starts_with(&self.canonical_repo) || self.canonical_repo.starts_with(path) {
            return Err(SafetyError::CanonicalRepository {
                path: path.to_path_buf(),
                repo: self.canonical_repo.clone(),
            });
        }

        Ok(())
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn canonical_repo(&self) -> &Path {
        &self.canonical_repo
    }
}
