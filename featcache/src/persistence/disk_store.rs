use super::types::{DiskEntry, FRAME_HEADER_LEN, FRAME_MAGIC};
use crate::compression::{CompressionAlgorithm, Compressor};
use crate::core::error::{CacheError, Result};
use crate::core::frame::DataFrame;
use crate::core::paths::{PathResolver, TEMP_FILE_PREFIX};
use crate::core::types::ArtifactKind;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info};

/// Save/load pairs for frame and object files under one storage root.
///
/// Every save returns the modification time of the file it produced, and
/// every load returns the payload with the modification time it observed.
#[derive(Debug, Clone)]
pub struct DiskStore {
    resolver: PathResolver,
    compressor: Compressor,
}

impl DiskStore {
    pub fn new(resolver: PathResolver, compressor: Compressor) -> Self {
        Self {
            resolver,
            compressor,
        }
    }

    /// Create the storage root if it does not exist yet
    pub fn open(resolver: PathResolver, compressor: Compressor) -> Result<Self> {
        if !resolver.root().exists() {
            info!("Creating storage root at {:?}", resolver.root());
        }
        fs::create_dir_all(resolver.root())?;
        Ok(Self::new(resolver, compressor))
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn exists(&self, name: &str, kind: ArtifactKind) -> bool {
        self.resolver.path_for(name, kind).is_file()
    }

    /// Current modification time, `None` when the file is absent
    pub fn modified_at(&self, name: &str, kind: ArtifactKind) -> Result<Option<SystemTime>> {
        let path = self.resolver.path_for(name, kind);
        match fs::metadata(&path) {
            Ok(meta) => Ok(Some(meta.modified()?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_frame(&self, name: &str, df: &DataFrame) -> Result<SystemTime> {
        let body = bincode::serde::encode_to_vec(df, bincode::config::standard())?;
        let (algo, stored) = self.compressor.compress(&body)?;

        let mut bytes = Vec::with_capacity(FRAME_HEADER_LEN + stored.len());
        bytes.extend_from_slice(FRAME_MAGIC);
        bytes.push(algo.tag());
        bytes.extend_from_slice(&crc32fast::hash(&stored).to_le_bytes());
        bytes.extend_from_slice(&stored);

        let path = self.resolver.path_for(name, ArtifactKind::Frame);
        debug!(
            "Writing frame {} ({} bytes, {:?}) to {:?}",
            name,
            bytes.len(),
            algo,
            path
        );
        self.write_atomic(&path, &bytes)
    }

    pub fn load_frame(&self, name: &str) -> Result<(DataFrame, SystemTime)> {
        let path = self.resolver.path_for(name, ArtifactKind::Frame);
        let (bytes, modified) = read_file(&path, ArtifactKind::Frame, name)?;

        if bytes.len() < FRAME_HEADER_LEN || &bytes[..FRAME_MAGIC.len()] != FRAME_MAGIC {
            return Err(corrupted(&path, "missing frame header"));
        }

        let tag = bytes[FRAME_MAGIC.len()];
        let algo = CompressionAlgorithm::from_tag(tag)
            .ok_or_else(|| corrupted(&path, &format!("unknown compression tag {}", tag)))?;

        let mut crc = [0u8; 4];
        crc.copy_from_slice(&bytes[FRAME_MAGIC.len() + 1..FRAME_HEADER_LEN]);
        let stored = &bytes[FRAME_HEADER_LEN..];
        let actual = crc32fast::hash(stored);
        if u32::from_le_bytes(crc) != actual {
            return Err(corrupted(
                &path,
                &format!(
                    "checksum mismatch: expected {:08x}, got {:08x}",
                    u32::from_le_bytes(crc),
                    actual
                ),
            ));
        }

        let body = self.compressor.decompress(stored, algo)?;
        let (df, _): (DataFrame, usize) =
            bincode::serde::decode_from_slice(&body, bincode::config::standard())?;
        df.validate()
            .map_err(|e| corrupted(&path, &e.to_string()))?;

        Ok((df, modified))
    }

    pub fn save_object(&self, name: &str, obj: &serde_json::Value) -> Result<SystemTime> {
        let bytes = serde_json::to_vec_pretty(obj)?;
        let path = self.resolver.path_for(name, ArtifactKind::Object);
        debug!("Writing object {} ({} bytes) to {:?}", name, bytes.len(), path);
        self.write_atomic(&path, &bytes)
    }

    pub fn load_object(&self, name: &str) -> Result<(serde_json::Value, SystemTime)> {
        let path = self.resolver.path_for(name, ArtifactKind::Object);
        let (bytes, modified) = read_file(&path, ArtifactKind::Object, name)?;
        let obj = serde_json::from_slice(&bytes).map_err(|e| corrupted(&path, &e.to_string()))?;
        Ok((obj, modified))
    }

    /// Delete the file if present, returning whether it existed
    pub fn remove(&self, name: &str, kind: ArtifactKind) -> Result<bool> {
        let path = self.resolver.path_for(name, kind);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// All artifacts of `kind`, oldest modification first (ties by name)
    pub fn list(&self, kind: ArtifactKind) -> Result<Vec<DiskEntry>> {
        let dir = match fs::read_dir(self.resolver.root()) {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            // Skip in-flight temp files
            if file_name.starts_with(TEMP_FILE_PREFIX) {
                continue;
            }
            let Some(name) = self.resolver.name_from_file(file_name, kind) else {
                continue;
            };
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            entries.push(DiskEntry {
                name: name.to_string(),
                modified: meta.modified()?,
                size_bytes: meta.len(),
            });
        }

        entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<SystemTime> {
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile_in(self.resolver.root())?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        let file = tmp.persist(path).map_err(|e| CacheError::Io(e.error))?;
        Ok(file.metadata()?.modified()?)
    }
}

fn read_file(path: &Path, kind: ArtifactKind, name: &str) -> Result<(Vec<u8>, SystemTime)> {
    match fs::read(path) {
        Ok(bytes) => {
            let modified = fs::metadata(path)?.modified()?;
            Ok((bytes, modified))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Err(CacheError::not_found(kind, name)),
        Err(e) => Err(e.into()),
    }
}

fn corrupted(path: &Path, reason: &str) -> CacheError {
    CacheError::Corrupted {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
