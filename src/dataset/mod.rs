//! Dataset records describing broken-proof examples.
//!
//! One JSON file per example. Only the revision at which the proof was
//! broken is read, from `error.initial_state.project_state`; everything else
//! in the record is ignored.

pub mod errors;

pub use errors::DatasetError;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One example as seen by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleDescriptor {
    /// File name of the record, e.g. `example_12.json`
    pub name: String,
    /// Where the record was loaded from
    pub source: PathBuf,
    /// Commit at which the proof is broken, if the record names one
    pub revision: Option<String>,
}

impl ExampleDescriptor {
    pub fn new(name: impl Into<String>, revision: Option<&str>) -> Self {
        let name = name.into();
        Self {
            source: PathBuf::from(&name),
            name,
            revision: normalize_revision(revision),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct Record {
    #[serde(default)]
    error: Option<ErrorRecord>,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorRecord {
    #[serde(default)]
    initial_state: Option<InitialState>,
}

#[derive(Debug, Deserialize, Default)]
struct InitialState {
    #[serde(default)]
    project_state: Option<String>,
}

fn normalize_revision(revision: Option<&str>) -> Option<String> {
    revision
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

/// Parse a record's JSON text.
pub fn parse_descriptor(name: &str, json: &str) -> Result<ExampleDescriptor, DatasetError> {
    let record: Record = serde_json::from_str(json).map_err(|source| DatasetError::Json {
        path: PathBuf::from(name),
        source,
    })?;

    let revision = record
        .error
        .and_then(|e| e.initial_state)
        .and_then(|s| s.project_state);

    Ok(ExampleDescriptor::new(name, revision.as_deref()))
}

/// Load one record from disk.
pub fn load_descriptor(path: impl AsRef<Path>) -> Result<ExampleDescriptor, DatasetError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DatasetError::InvalidName(path.to_path_buf()))?;

    let json = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut descriptor = parse_descriptor(name, &json).map_err(|e| e.with_path(path))?;
    descriptor.source = path.to_path_buf();
    Ok(descriptor)
}

/// List record files in `dataset_dir`, sorted by name.
///
/// Only `*.json` files directly in the directory count. A `limit` of 0 means
/// no limit.
pub fn discover(dataset_dir: &Path, limit: usize) -> Result<Vec<PathBuf>, DatasetError> {
    let entries = fs::read_dir(dataset_dir).map_err(|source| DatasetError::Io {
        path: dataset_dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DatasetError::Io {
            path: dataset_dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
            files.push(path);
        }
    }

    files.sort();
    debug!(count = files.len(), dir = %dataset_dir.display(), "found dataset records");

    if limit > 0 {
        files.truncate(limit);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_record() {
        let json = r#"{
            "error": {
                "initial_state": {"project_state": "abc123", "offset": 3},
                "change": {}
            },
            "repaired": true
        }"#;
        let descriptor = parse_descriptor("ex.json", json).unwrap();
        assert_eq!(descriptor.name, "ex.json");
        assert_eq!(descriptor.revision.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_missing_or_empty_revision_is_none() {
        for json in [
            r#"{}"#,
            r#"{"error": null}"#,
            r#"{"error": {}}"#,
            r#"{"error": {"initial_state": {}}}"#,
            r#"{"error": {"initial_state": {"project_state": null}}}"#,
            r#"{"error": {"initial_state": {"project_state": ""}}}"#,
            r#"{"error": {"initial_state": {"project_state": "   "}}}"#,
        ] {
            let descriptor = parse_descriptor("ex.json", json).unwrap();
            assert_eq!(descriptor.revision, None, "record: {json}");
        }
    }

    #[test]
    fn test_malformed_json_is_error() {
        let result = parse_descriptor("bad.json", "{not json");
        assert!(matches!(result, Err(DatasetError::Json { .. })));
    }

    #[test]
    fn test_load_descriptor_records_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("example_3.json");
        fs::write(
            &path,
            r#"{"error": {"initial_state": {"project_state": "0f1e2d"}}}"#,
        )
        .unwrap();

        let descriptor = load_descriptor(&path).unwrap();
        assert_eq!(descriptor.name, "example_3.json");
        assert_eq!(descriptor.source, path);
        assert_eq!(descriptor.revision.as_deref(), Some("0f1e2d"));
    }

    #[test]
    fn test_load_descriptor_error_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "[").unwrap();

        let err = load_descriptor(&path).unwrap_err();
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_discover_sorts_filters_and_limits() {
        let dir = TempDir::new().unwrap();
        for name in ["c.json", "a.json", "b.json", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir_all(dir.path().join("nested.json")).unwrap();

        let all = discover(dir.path(), 0).unwrap();
        let names: Vec<_> = all
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json", "c.json"]);

        let limited = discover(dir.path(), 2).unwrap();
        assert_eq!(limited.len(), 2);
        assert!(limited[0].ends_with("a.json"));
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = discover(&dir.path().join("absent"), 0);
        assert!(matches!(result, Err(DatasetError::Io { .. })));
    }
}
