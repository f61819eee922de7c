use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShotDiffError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File is present but its content could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    /// Diff artifact could not be persisted or removed
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, ShotDiffError>;

#[derive(Error, Debug)]
pub enum VfsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}
