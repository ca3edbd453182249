use super::error::{CacheError, Result};
use super::types::ArtifactKind;
use std::path::{Path, PathBuf};

/// Maps artifact names to files under the storage root
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `root/<name><suffix>`
    pub fn path_for(&self, name: &str, kind: ArtifactKind) -> PathBuf {
        self.root.join(memory_key(name, kind))
    }

    /// Inverse of the file naming: strips the kind suffix from a file name
    pub fn name_from_file<'a>(&self, file_name: &'a str, kind: ArtifactKind) -> Option<&'a str> {
        file_name
            .strip_suffix(kind.suffix())
            .filter(|name| !name.is_empty())
    }
}

/// Prefix of in-flight temp files under the storage root
pub const TEMP_FILE_PREFIX: &str = ".fctmp";

/// Key of an artifact in the memory tier: `<name><suffix>`
pub fn memory_key(name: &str, kind: ArtifactKind) -> String {
    format!("{}{}", name, kind.suffix())
}

/// Reject names that cannot be mapped to a single listable file under the root
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
        || name.starts_with(TEMP_FILE_PREFIX);
    if bad {
        return Err(CacheError::InvalidName(name.to_string()));
    }
    Ok(())
}
