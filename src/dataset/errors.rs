use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Record path has no usable file name: {0}")]
    InvalidName(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse record {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DatasetError {
    pub(crate) fn with_path(self, path: &Path) -> Self {
        match self {
            DatasetError::Json { source, .. } => DatasetError::Json {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}
