//! Cache Module
//!
//! Three interchangeable backends behind one trait:
//! - `HybridCache`: LRU memory tier backed by disk files
//! - `RamCache`: memory tier only
//! - `DiskCache`: disk files only

pub mod disk;
pub mod hybrid;
pub(crate) mod memory;
pub mod ram;

pub use disk::DiskCache;
pub use hybrid::HybridCache;
pub use ram::RamCache;

use crate::compression::Compressor;
use crate::core::error::Result;
use crate::core::frame::DataFrame;
use crate::core::paths::PathResolver;
use crate::core::policy::gate_for;
use crate::core::types::{
    ArtifactKind, CacheConfig, CacheMode, CacheStats, ListedArtifact, MemoryBudget,
};
use crate::persistence::DiskStore;
use std::sync::Arc;
use tracing::info;

/// Contract shared by every cache backend.
///
/// Frame writes pass through the configured gate; a rejected write is a
/// silent no-op. Object payloads are never metered or evicted.
pub trait CacheBackend: Send + Sync {
    fn mode(&self) -> CacheMode;

    fn is_cached_df(&self, name: &str) -> bool;

    /// Store a frame; no-op if already cached or rejected by the gate
    fn cache_df(&self, name: &str, df: Arc<DataFrame>) -> Result<()>;

    fn load_df(&self, name: &str) -> Result<Arc<DataFrame>>;

    /// Remove a frame from every tier; absent names are ignored
    fn remove_df(&self, name: &str) -> Result<()>;

    fn is_cached_obj(&self, name: &str) -> bool;

    /// Store an object; no-op if already cached
    fn cache_obj(&self, name: &str, obj: Arc<serde_json::Value>) -> Result<()>;

    fn load_obj(&self, name: &str) -> Result<Arc<serde_json::Value>>;

    fn remove_obj(&self, name: &str) -> Result<()>;

    /// Artifacts of `kind`, oldest first
    fn list(&self, kind: ArtifactKind) -> Result<Vec<ListedArtifact>>;

    /// Names of cached frames, oldest first
    fn cached_dfs(&self) -> Result<Vec<String>> {
        Ok(self
            .list(ArtifactKind::Frame)?
            .into_iter()
            .map(|a| a.name)
            .collect())
    }

    /// Names of cached objects, oldest first
    fn cached_objs(&self) -> Result<Vec<String>> {
        Ok(self
            .list(ArtifactKind::Object)?
            .into_iter()
            .map(|a| a.name)
            .collect())
    }

    /// Whether the artifact currently has a memory-tier copy
    fn is_in_memory(&self, _name: &str, _kind: ArtifactKind) -> bool {
        false
    }

    /// Budget for frames in the memory tier, `None` without a memory tier
    fn memory_limit(&self) -> Option<u64>;

    /// Change the budget; takes effect at the next insertion
    fn set_memory_limit(&self, limit_bytes: u64);

    fn stats(&self) -> CacheStats;
}

/// Build the backend selected by `config.mode`
pub fn build_backend(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>> {
    let gate = gate_for(config.policy, &config.service_names);
    let budget = MemoryBudget::new(config.memory_limit_bytes);

    info!(
        "Initializing {} cache (policy={:?}, memory_limit={} bytes, root={:?})",
        config.mode, config.policy, config.memory_limit_bytes, config.storage_root
    );

    let backend: Arc<dyn CacheBackend> = match config.mode {
        CacheMode::DiskAndRam => {
            let disk = DiskStore::open(
                PathResolver::new(&config.storage_root),
                Compressor::new(config.compression.clone()),
            )?;
            Arc::new(HybridCache::new(disk, gate, budget))
        }
        CacheMode::Ram => Arc::new(RamCache::new(gate, budget)),
        CacheMode::Disk => {
            let disk = DiskStore::open(
                PathResolver::new(&config.storage_root),
                Compressor::new(config.compression.clone()),
            )?;
            Arc::new(DiskCache::new(disk, gate))
        }
    };

    Ok(backend)
}
