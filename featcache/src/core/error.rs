use super::types::ArtifactKind;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for featcache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("No such {kind} in cache: {name}")]
    NotFound { kind: ArtifactKind, name: String },

    #[error("Frame of {volume} bytes exceeds the memory limit of {limit} bytes")]
    CapacityExceeded { volume: u64, limit: u64 },

    #[error("An artifact named '{0}' is already saved, remove it first")]
    DuplicateName(String),

    #[error("Invalid artifact name: {0:?}")]
    InvalidName(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Artifact '{name}' is not a {expected}")]
    KindMismatch { name: String, expected: ArtifactKind },

    #[error("Corrupted file {path:?}: {reason}")]
    Corrupted { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    pub fn not_found(kind: ArtifactKind, name: &str) -> Self {
        Self::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    /// True for errors that mean "the artifact is not there"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}

impl From<bincode::error::EncodeError> for CacheError {
    fn from(e: bincode::error::EncodeError) -> Self {
        CacheError::Serialization(e.to_string())
    }
}

impl From<bincode::error::DecodeError> for CacheError {
    fn from(e: bincode::error::DecodeError) -> Self {
        CacheError::Serialization(e.to_string())
    }
}

/// Result type alias for featcache operations
pub type Result<T> = std::result::Result<T, CacheError>;
