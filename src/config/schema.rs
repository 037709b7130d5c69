use serde::Deserialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_PROJECT: &str = "Coq-Flow-Equivalence";

/// Settings for one preparation run.
///
/// Every field may be omitted from the TOML file; `work_dir` and
/// `dataset_root` must then come from the command line.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PrepConfig {
    /// Name of the project directory under both roots
    pub project: String,
    /// Directory holding the canonical repository and all workspaces
    pub work_dir: Option<PathBuf>,
    /// Directory holding one dataset directory per project
    pub dataset_root: Option<PathBuf>,
    pub workspace_prefix: String,
    /// Extension of proof sources, without the dot
    pub source_extension: String,
    /// Monad module, relative to the workspace root
    pub monad_file: PathBuf,
    /// Maximum number of examples to process; 0 means all
    pub example_limit: usize,
    /// Wait for Enter between examples
    pub pause: bool,
    /// Version-control executable
    pub git: PathBuf,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            project: DEFAULT_PROJECT.to_string(),
            work_dir: None,
            dataset_root: None,
            workspace_prefix: "test_".to_string(),
            source_extension: "v".to_string(),
            monad_file: PathBuf::from("Monad.v"),
            example_limit: 1,
            pause: true,
            git: PathBuf::from("git"),
        }
    }
}

/// Filesystem locations derived from a validated config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepPaths {
    pub work_dir: PathBuf,
    pub canonical_repo: PathBuf,
    pub dataset_dir: PathBuf,
}

impl PrepConfig {
    /// Check field shapes. Missing roots are not an issue here since the
    /// command line may still supply them.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        let issues = self.field_issues();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Full validation, including the presence of both roots.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        if self.work_dir.is_none() {
            issues.push(ValidationIssue::MissingField { field: "work_dir" });
        }
        if self.dataset_root.is_none() {
            issues.push(ValidationIssue::MissingField {
                field: "dataset_root",
            });
        }
        issues.extend(self.field_issues());

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    fn field_issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if self.project.trim().is_empty() {
            issues.push(ValidationIssue::MissingField { field: "project" });
        } else if !is_plain_name(&self.project) {
            issues.push(ValidationIssue::InvalidValue {
                field: "project",
                message: "must be a single directory name".to_string(),
            });
        }

        if self.workspace_prefix.is_empty() {
            issues.push(ValidationIssue::InvalidValue {
                field: "workspace_prefix",
                message: "must not be empty; workspaces could collide with the repository"
                    .to_string(),
            });
        } else if self.workspace_prefix.contains(|c: char| c == '/' || c == '\\') {
            issues.push(ValidationIssue::InvalidValue {
                field: "workspace_prefix",
                message: "must not contain path separators".to_string(),
            });
        }

        if self.source_extension.is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "source_extension",
            });
        } else if self.source_extension.starts_with('.') {
            issues.push(ValidationIssue::InvalidValue {
                field: "source_extension",
                message: "give the extension without a leading dot".to_string(),
            });
        }

        let monad_relative = self
            .monad_file
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if self.monad_file.as_os_str().is_empty() || !monad_relative {
            issues.push(ValidationIssue::InvalidValue {
                field: "monad_file",
                message: "must be a path relative to the workspace root without '..'"
                    .to_string(),
            });
        }

        issues
    }

    /// Derive the canonical repository and dataset locations.
    pub fn paths(&self) -> Result<PrepPaths, ValidationError> {
        self.validate()?;
        let missing = |field| ValidationError {
            issues: vec![ValidationIssue::MissingField { field }],
        };
        let work_dir = self.work_dir.as_ref().ok_or_else(|| missing("work_dir"))?;
        let dataset_root = self
            .dataset_root
            .as_ref()
            .ok_or_else(|| missing("dataset_root"))?;

        Ok(PrepPaths {
            work_dir: work_dir.clone(),
            canonical_repo: work_dir.join(&self.project),
            dataset_dir: dataset_root.join(&self.project),
        })
    }

    /// Expand a leading `~` in both roots.
    pub fn expand_home(mut self) -> Self {
        self.work_dir = self.work_dir.map(|p| expand_tilde(&p));
        self.dataset_root = self.dataset_root.map(|p| expand_tilde(&p));
        self
    }
}

fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Replace a leading `~` component with the home directory, when known.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match home::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField {
        field: &'static str,
    },
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl ValidationIssue {
    /// The TOML key the issue is about.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationIssue::MissingField { field } | ValidationIssue::InvalidValue { field, .. } => {
                *field
            }
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required setting '{field}'")
            }
            ValidationIssue::InvalidValue { field, message } => {
                write!(f, "invalid setting '{field}': {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> PrepConfig {
        PrepConfig {
            work_dir: Some(PathBuf::from("/work")),
            dataset_root: Some(PathBuf::from("/data")),
            ..PrepConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_coq_flow_equivalence() {
        let config = PrepConfig::default();
        assert_eq!(config.project, "Coq-Flow-Equivalence");
        assert_eq!(config.workspace_prefix, "test_");
        assert_eq!(config.source_extension, "v");
        assert_eq!(config.monad_file, PathBuf::from("Monad.v"));
        assert_eq!(config.example_limit, 1);
        assert!(config.validate_fields().is_ok());
    }

    #[test]
    fn test_paths_derive_from_project() {
        let paths = complete().paths().unwrap();
        assert_eq!(paths.canonical_repo, PathBuf::from("/work/Coq-Flow-Equivalence"));
        assert_eq!(paths.dataset_dir, PathBuf::from("/data/Coq-Flow-Equivalence"));
    }

    #[test]
    fn test_missing_roots_reported() {
        let err = PrepConfig::default().validate().unwrap_err();
        assert_eq!(
            err.issues,
            vec![
                ValidationIssue::MissingField { field: "work_dir" },
                ValidationIssue::MissingField {
                    field: "dataset_root"
                },
            ]
        );
    }

    #[test]
    fn test_invalid_fields_reported() {
        let config = PrepConfig {
            project: "a/b".to_string(),
            workspace_prefix: String::new(),
            source_extension: ".v".to_string(),
            monad_file: PathBuf::from("../Monad.v"),
            ..complete()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.issues.len(), 4);
        assert!(err.to_string().contains("monad_file"));
    }

    #[test]
    fn test_expand_tilde() {
        let plain = PathBuf::from("/abs/path");
        assert_eq!(expand_tilde(&plain), plain);

        if let Some(home) = home::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/work")), home.join("work"));
        }
    }
}
