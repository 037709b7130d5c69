pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    expand_tilde, PrepConfig, PrepPaths, ValidationError, ValidationIssue, DEFAULT_PROJECT,
};
