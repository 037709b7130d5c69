use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Revision {0:?} starts with '-' and would be read as an option")]
    OptionLikeRevision(String),
}
