use super::CacheBackend;
use super::memory::MemoryTier;
use crate::core::error::{CacheError, Result};
use crate::core::frame::DataFrame;
use crate::core::paths::{memory_key, validate_name};
use crate::core::policy::CacheGate;
use crate::core::types::{
    Artifact, ArtifactKind, CacheMode, CacheStats, ListedArtifact, MemoryBudget,
};
use crate::persistence::DiskStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// LRU memory tier backed by disk files.
///
/// Every artifact lives on disk; the memory tier keeps recently used frames
/// (within the budget) and every object that has been stored or loaded. A
/// memory copy is served only while the disk file's modification time still
/// matches the one recorded when the copy was made.
pub struct HybridCache {
    disk: DiskStore,
    gate: Arc<dyn CacheGate>,
    budget: MemoryBudget,
    state: Mutex<MemoryTier>,
}

impl HybridCache {
    pub fn new(disk: DiskStore, gate: Arc<dyn CacheGate>, budget: MemoryBudget) -> Self {
        info!(
            "Hybrid cache over {:?} with memory_limit={} bytes",
            disk.resolver().root(),
            budget.limit()
        );
        Self {
            disk,
            gate,
            budget,
            state: Mutex::new(MemoryTier::new()),
        }
    }

    /// Sum of volumes of frames held in memory
    pub fn current_volume(&self) -> u64 {
        self.state.lock().current_volume()
    }

    /// Admit a freshly read frame, evicting others to make room.
    ///
    /// A frame larger than the whole budget is handed back without being kept.
    fn admit_frame(
        &self,
        tier: &mut MemoryTier,
        key: String,
        df: Arc<DataFrame>,
        edited_at: std::time::SystemTime,
    ) -> Arc<DataFrame> {
        let volume = df.volume();
        let limit = self.budget.limit();
        if volume > limit {
            warn!(
                "Frame {} ({} bytes) exceeds memory limit {} bytes, serving from disk only",
                key, volume, limit
            );
            return df;
        }

        let evicted = tier.release_volume(volume, limit);
        if !evicted.is_empty() {
            debug!("Evicted {:?} to admit {}", evicted, key);
        }
        tier.insert(key, Artifact::Frame(df.clone()), Some(edited_at));
        df
    }
}

impl CacheBackend for HybridCache {
    fn mode(&self) -> CacheMode {
        CacheMode::DiskAndRam
    }

    fn is_cached_df(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.disk.exists(name, ArtifactKind::Frame)
    }

    fn cache_df(&self, name: &str, df: Arc<DataFrame>) -> Result<()> {
        validate_name(name)?;
        if !self.gate.allow(name) {
            debug!("Gate rejected frame {}, not caching", name);
            return Ok(());
        }

        let mut tier = self.state.lock();
        if self.disk.exists(name, ArtifactKind::Frame) {
            debug!("Frame {} already cached", name);
            return Ok(());
        }

        let volume = df.volume();
        let limit = self.budget.limit();
        if volume > limit {
            return Err(CacheError::CapacityExceeded { volume, limit });
        }

        let edited_at = self.disk.save_frame(name, &df)?;
        let evicted = tier.release_volume(volume, limit);
        if !evicted.is_empty() {
            debug!("Evicted {:?} to cache frame {}", evicted, name);
        }
        tier.insert(
            memory_key(name, ArtifactKind::Frame),
            Artifact::Frame(df),
            Some(edited_at),
        );

        debug!(
            "Cached frame {} ({} bytes, memory volume {}/{})",
            name,
            volume,
            tier.current_volume(),
            limit
        );
        Ok(())
    }

    fn load_df(&self, name: &str) -> Result<Arc<DataFrame>> {
        validate_name(name)?;
        let key = memory_key(name, ArtifactKind::Frame);
        let mut tier = self.state.lock();

        let Some(disk_mtime) = self.disk.modified_at(name, ArtifactKind::Frame)? else {
            // A memory copy without a disk file is an orphan, drop it
            tier.remove(&key);
            tier.misses += 1;
            return Err(CacheError::not_found(ArtifactKind::Frame, name));
        };

        tier.touch(&key);
        let cached = tier.get(&key).map(|e| (e.payload.clone(), e.edited_at));

        match cached {
            Some((Artifact::Frame(df), Some(edited_at))) if edited_at == disk_mtime => {
                tier.hits += 1;
                debug!("Memory HIT for frame {}", name);
                Ok(df)
            }
            Some(_) => {
                debug!("Frame {} changed on disk, reloading", name);
                let (df, modified) = self.disk.load_frame(name)?;
                tier.stale_reloads += 1;
                tier.remove(&key);
                Ok(self.admit_frame(&mut tier, key, Arc::new(df), modified))
            }
            None => {
                tier.misses += 1;
                debug!("Memory MISS for frame {}, reading from disk", name);
                let (df, modified) = self.disk.load_frame(name)?;
                Ok(self.admit_frame(&mut tier, key, Arc::new(df), modified))
            }
        }
    }

    fn remove_df(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let mut tier = self.state.lock();
        tier.remove(&memory_key(name, ArtifactKind::Frame));
        self.disk.remove(name, ArtifactKind::Frame)?;
        Ok(())
    }

    fn is_cached_obj(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.disk.exists(name, ArtifactKind::Object)
    }

    fn cache_obj(&self, name: &str, obj: Arc<serde_json::Value>) -> Result<()> {
        validate_name(name)?;
        let mut tier = self.state.lock();
        if self.disk.exists(name, ArtifactKind::Object) {
            debug!("Object {} already cached", name);
            return Ok(());
        }

        let edited_at = self.disk.save_object(name, &obj)?;
        tier.insert(
            memory_key(name, ArtifactKind::Object),
            Artifact::Object(obj),
            Some(edited_at),
        );
        debug!("Cached object {}", name);
        Ok(())
    }

    fn load_obj(&self, name: &str) -> Result<Arc<serde_json::Value>> {
        validate_name(name)?;
        let key = memory_key(name, ArtifactKind::Object);
        let mut tier = self.state.lock();

        let Some(disk_mtime) = self.disk.modified_at(name, ArtifactKind::Object)? else {
            tier.remove(&key);
            tier.misses += 1;
            return Err(CacheError::not_found(ArtifactKind::Object, name));
        };

        tier.touch(&key);
        let cached = tier.get(&key).map(|e| (e.payload.clone(), e.edited_at));

        match cached {
            Some((Artifact::Object(obj), Some(edited_at))) if edited_at == disk_mtime => {
                tier.hits += 1;
                Ok(obj)
            }
            cached => {
                if cached.is_some() {
                    debug!("Object {} changed on disk, reloading", name);
                    tier.stale_reloads += 1;
                } else {
                    tier.misses += 1;
                }
                let (obj, modified) = self.disk.load_object(name)?;
                let obj = Arc::new(obj);
                tier.insert(key, Artifact::Object(obj.clone()), Some(modified));
                Ok(obj)
            }
        }
    }

    fn remove_obj(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        let mut tier = self.state.lock();
        tier.remove(&memory_key(name, ArtifactKind::Object));
        self.disk.remove(name, ArtifactKind::Object)?;
        Ok(())
    }

    fn list(&self, kind: ArtifactKind) -> Result<Vec<ListedArtifact>> {
        Ok(self
            .disk
            .list(kind)?
            .into_iter()
            .map(|entry| ListedArtifact {
                name: entry.name,
                kind,
                modified_at: entry.modified.into(),
                size_bytes: entry.size_bytes,
            })
            .collect())
    }

    fn is_in_memory(&self, name: &str, kind: ArtifactKind) -> bool {
        self.state.lock().contains(&memory_key(name, kind))
    }

    fn memory_limit(&self) -> Option<u64> {
        Some(self.budget.limit())
    }

    fn set_memory_limit(&self, limit_bytes: u64) {
        info!("Memory limit set to {} bytes", limit_bytes);
        self.budget.set_limit(limit_bytes);
    }

    fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            mode: self.mode(),
            memory_limit: self.memory_limit(),
            ..Default::default()
        };
        self.state.lock().fill_stats(&mut stats);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::Compressor;
    use crate::core::frame::ColumnData;
    use crate::core::paths::PathResolver;
    use crate::core::policy::{AllowAll, AllowList};
    use tempfile::{TempDir, tempdir};

    fn frame(bytes: usize) -> Arc<DataFrame> {
        Arc::new(
            DataFrame::empty()
                .with_column("flag", ColumnData::Bool(vec![true; bytes]))
                .unwrap(),
        )
    }

    fn hybrid(limit: u64) -> (TempDir, HybridCache) {
        let dir = tempdir().unwrap();
        let disk = DiskStore::open(PathResolver::new(dir.path()), Compressor::default()).unwrap();
        let cache = HybridCache::new(disk, Arc::new(AllowAll), MemoryBudget::new(limit));
        (dir, cache)
    }

    #[test]
    fn test_cache_and_load_from_memory() {
        let (_dir, cache) = hybrid(1000);
        cache.cache_df("x", frame(10)).unwrap();

        assert!(cache.is_cached_df("x"));
        assert!(cache.is_in_memory("x", ArtifactKind::Frame));
        assert_eq!(cache.load_df("x").unwrap(), frame(10));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let (_dir, cache) = hybrid(50);
        let err = cache.cache_df("big", frame(51)).unwrap_err();
        assert!(matches!(
            err,
            CacheError::CapacityExceeded {
                volume: 51,
                limit: 50
            }
        ));
        assert!(!cache.is_cached_df("big"));
    }

    #[test]
    fn test_second_cache_is_noop() {
        let (_dir, cache) = hybrid(1000);
        cache.cache_df("x", frame(10)).unwrap();
        cache.cache_df("x", frame(20)).unwrap();
        assert_eq!(cache.load_df("x").unwrap().num_rows(), 10);
        assert_eq!(cache.current_volume(), 10);
    }

    #[test]
    fn test_gate_rejection_is_silent() {
        let dir = tempdir().unwrap();
        let disk = DiskStore::open(PathResolver::new(dir.path()), Compressor::default()).unwrap();
        let cache = HybridCache::new(
            disk,
            Arc::new(AllowList::new(["allowed"])),
            MemoryBudget::new(1000),
        );

        cache.cache_df("other", frame(10)).unwrap();
        assert!(!cache.is_cached_df("other"));

        cache.cache_df("allowed", frame(10)).unwrap();
        assert!(cache.is_cached_df("allowed"));
    }

    #[test]
    fn test_orphan_memory_entry_dropped_when_file_vanishes() {
        let (dir, cache) = hybrid(1000);
        cache.cache_df("x", frame(10)).unwrap();
        std::fs::remove_file(dir.path().join("x_df")).unwrap();

        assert!(cache.load_df("x").unwrap_err().is_not_found());
        assert!(!cache.is_in_memory("x", ArtifactKind::Frame));
        assert_eq!(cache.current_volume(), 0);
    }

    #[test]
    fn test_objects_survive_frame_pressure() {
        let (_dir, cache) = hybrid(100);
        cache
            .cache_obj("params", Arc::new(serde_json::json!({"lr": 0.1})))
            .unwrap();
        cache.cache_df("a", frame(100)).unwrap();
        cache.cache_df("b", frame(100)).unwrap();

        assert!(cache.is_in_memory("params", ArtifactKind::Object));
        assert!(!cache.is_in_memory("a", ArtifactKind::Frame));
        assert_eq!(cache.stats().evictions, 1);
    }
}
