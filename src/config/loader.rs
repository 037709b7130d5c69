use crate::config::schema::{PrepConfig, ValidationError, ValidationIssue};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Failure to turn a prep config into a [`PrepConfig`].
///
/// `origin` is the file the text came from; it is `None` when parsing a
/// string directly.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        origin: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Rejected {
        origin: Option<PathBuf>,
        source: ValidationError,
    },
}

impl ConfigError {
    /// The keys named by validation issues, in reporting order.
    pub fn rejected_keys(&self) -> Vec<&'static str> {
        match self {
            ConfigError::Rejected { source, .. } => {
                source.issues.iter().map(ValidationIssue::field).collect()
            }
            _ => Vec::new(),
        }
    }

    fn in_file(self, path: &Path) -> Self {
        match self {
            ConfigError::Parse { origin: None, source } => ConfigError::Parse {
                origin: Some(path.to_path_buf()),
                source,
            },
            ConfigError::Rejected { origin: None, source } => ConfigError::Rejected {
                origin: Some(path.to_path_buf()),
                source,
            },
            other => other,
        }
    }
}

fn origin_label(origin: Option<&Path>) -> String {
    match origin {
        Some(path) => format!("prep config {}", path.display()),
        None => "prep config".to_string(),
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "cannot read prep config {}: {}", path.display(), source)
            }
            ConfigError::Parse { origin, source } => {
                write!(f, "{} is not valid TOML: {}", origin_label(origin.as_deref()), source)
            }
            ConfigError::Rejected { origin, source } => {
                let keys = self.rejected_keys().join(", ");
                write!(
                    f,
                    "{} has {} bad setting(s) [{}]:\n{}",
                    origin_label(origin.as_deref()),
                    source.issues.len(),
                    keys,
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Rejected { source, .. } => Some(source),
        }
    }
}

/// Parse a config, expanding `~` in both roots.
///
/// Only field shapes are validated; the roots may still come from the
/// command line.
pub fn load_from_str(input: &str) -> Result<PrepConfig, ConfigError> {
    let config: PrepConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Parse { origin: None, source })?;
    config
        .validate_fields()
        .map_err(|source| ConfigError::Rejected { origin: None, source })?;
    Ok(config.expand_home())
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PrepConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.in_file(path))
}
