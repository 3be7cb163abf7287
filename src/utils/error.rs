use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BokslZipError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open archive {path}: {reason}")]
    ArchiveOpenFailed { path: PathBuf, reason: String },

    #[error("Failed to write archive {path}: {reason}")]
    ArchiveWriteFailed { path: PathBuf, reason: String },

    #[error("Failed to read entry {name}: {reason}")]
    EntryReadFailed { name: String, reason: String },

    #[error("Path not found: {path}")]
    PathNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Entry name {name:?} must not contain '{character}'")]
    InvalidEntryName { name: String, character: char },

    #[error("An entry named {name:?} already exists")]
    DuplicateEntryName { name: String },

    #[error("Failed to extract to {path}: {reason}")]
    ExtractFailed { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, BokslZipError>;
