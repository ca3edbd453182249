use super::frame::DataFrame;
use crate::compression::CompressionConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Suffix for frame files and memory keys
pub const FRAME_SUFFIX: &str = "_df";
/// Suffix for object files and memory keys
pub const OBJECT_SUFFIX: &str = "_obj";

/// The two kinds of cached artifact
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Tabular payload (`DataFrame`)
    Frame,
    /// Opaque serializable payload
    Object,
}

impl ArtifactKind {
    /// Suffix used both for the file name and for the memory-tier key
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Frame => FRAME_SUFFIX,
            Self::Object => OBJECT_SUFFIX,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Frame => f.write_str("frame"),
            Self::Object => f.write_str("object"),
        }
    }
}

/// A cached payload tagged with its kind
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Frame(Arc<DataFrame>),
    Object(Arc<serde_json::Value>),
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Self::Frame(_) => ArtifactKind::Frame,
            Self::Object(_) => ArtifactKind::Object,
        }
    }

    pub fn as_frame(&self) -> Option<&Arc<DataFrame>> {
        match self {
            Self::Frame(df) => Some(df),
            Self::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<serde_json::Value>> {
        match self {
            Self::Object(obj) => Some(obj),
            Self::Frame(_) => None,
        }
    }
}

impl From<DataFrame> for Artifact {
    fn from(df: DataFrame) -> Self {
        Self::Frame(Arc::new(df))
    }
}

impl From<Arc<DataFrame>> for Artifact {
    fn from(df: Arc<DataFrame>) -> Self {
        Self::Frame(df)
    }
}

impl From<serde_json::Value> for Artifact {
    fn from(obj: serde_json::Value) -> Self {
        Self::Object(Arc::new(obj))
    }
}

/// Which backend serves the cache
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheMode {
    /// LRU memory tier backed by disk
    #[default]
    DiskAndRam,
    /// Memory only, nothing is written to disk
    Ram,
    /// Disk only, no memory tier
    Disk,
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiskAndRam => f.write_str("disk_and_ram"),
            Self::Ram => f.write_str("ram"),
            Self::Disk => f.write_str("disk"),
        }
    }
}

/// Which frames are allowed into the cache
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Cache every frame
    #[default]
    Everything,
    /// Cache only frames whose name is a configured service name
    Service,
}

/// Process-wide memory budget in bytes, shared by handle and adjustable at runtime
#[derive(Debug, Clone)]
pub struct MemoryBudget(Arc<AtomicU64>);

impl MemoryBudget {
    pub fn new(limit_bytes: u64) -> Self {
        Self(Arc::new(AtomicU64::new(limit_bytes)))
    }

    pub fn limit(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn set_limit(&self, limit_bytes: u64) {
        self.0.store(limit_bytes, Ordering::Release);
    }
}

/// Configuration consumed by the backend selector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding one file per artifact
    pub storage_root: PathBuf,
    pub mode: CacheMode,
    pub policy: CachePolicy,
    /// Names allowed when `policy` is `service`
    pub service_names: Vec<String>,
    /// Memory budget for frames held in the memory tier
    pub memory_limit_bytes: u64,
    pub compression: CompressionConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./storage"),
            mode: CacheMode::DiskAndRam,
            policy: CachePolicy::Everything,
            service_names: Vec::new(),
            memory_limit_bytes: 1024 * 1024 * 1024,
            compression: CompressionConfig::default(),
        }
    }
}

/// One row of a detailed listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedArtifact {
    pub name: String,
    pub kind: ArtifactKind,
    /// Disk modification time, or insertion time for the RAM backend
    pub modified_at: DateTime<Utc>,
    /// File size on disk (0 when there is no disk copy)
    pub size_bytes: u64,
}

/// Statistics for a cache backend
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    pub mode: CacheMode,
    /// Entries currently held in the memory tier
    pub memory_entries: usize,
    pub memory_frames: usize,
    pub memory_objects: usize,
    /// Sum of volumes of frames in the memory tier
    pub current_volume: u64,
    /// Budget in effect, `None` for backends without a memory tier
    pub memory_limit: Option<u64>,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Memory entries replaced because the disk copy changed
    pub stale_reloads: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
