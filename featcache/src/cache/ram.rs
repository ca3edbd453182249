use super::CacheBackend;
use super::memory::MemoryTier;
use crate::core::error::{CacheError, Result};
use crate::core::frame::DataFrame;
use crate::core::paths::{memory_key, validate_name};
use crate::core::policy::CacheGate;
use crate::core::types::{
    Artifact, ArtifactKind, CacheMode, CacheStats, ListedArtifact, MemoryBudget,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Memory-only LRU cache; nothing is written to disk
pub struct RamCache {
    gate: Arc<dyn CacheGate>,
    budget: MemoryBudget,
    state: Mutex<MemoryTier>,
}

impl RamCache {
    pub fn new(gate: Arc<dyn CacheGate>, budget: MemoryBudget) -> Self {
        info!("RAM cache with memory_limit={} bytes", budget.limit());
        Self {
            gate,
            budget,
            state: Mutex::new(MemoryTier::new()),
        }
    }

    pub fn current_volume(&self) -> u64 {
        self.state.lock().current_volume()
    }
}

impl CacheBackend for RamCache {
    fn mode(&self) -> CacheMode {
        CacheMode::Ram
    }

    fn is_cached_df(&self, name: &str) -> bool {
        self.state
            .lock()
            .contains(&memory_key(name, ArtifactKind::Frame))
    }

    fn cache_df(&self, name: &str, df: Arc<DataFrame>) -> Result<()> {
        validate_name(name)?;
        if !self.gate.allow(name) {
            debug!("Gate rejected frame {}, not caching", name);
            return Ok(());
        }

        let key = memory_key(name, ArtifactKind::Frame);
        let mut tier = self.state.lock();
        if tier.contains(&key) {
            return Ok(());
        }

        let volume = df.volume();
        let limit = self.budget.limit();
        if volume > limit {
            return Err(CacheError::CapacityExceeded { volume, limit });
        }

        let evicted = tier.release_volume(volume, limit);
        if !evicted.is_empty() {
            debug!("Evicted {:?} to cache frame {}", evicted, name);
        }
        tier.insert(key, Artifact::Frame(df), None);
        Ok(())
    }

    fn load_df(&self, name: &str) -> Result<Arc<DataFrame>> {
        validate_name(name)?;
        let key = memory_key(name, ArtifactKind::Frame);
        let mut tier = self.state.lock();

        tier.touch(&key);
        let cached = tier.get(&key).and_then(|e| e.payload.as_frame().cloned());
        match cached {
            Some(df) => {
                tier.hits += 1;
                Ok(df)
            }
            None => {
                tier.misses += 1;
                Err(CacheError::not_found(ArtifactKind::Frame, name))
            }
        }
    }

    fn remove_df(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.state
            .lock()
            .remove(&memory_key(name, ArtifactKind::Frame));
        Ok(())
    }

    fn is_cached_obj(&self, name: &str) -> bool {
        self.state
            .lock()
            .contains(&memory_key(name, ArtifactKind::Object))
    }

    fn cache_obj(&self, name: &str, obj: Arc<serde_json::Value>) -> Result<()> {
        validate_name(name)?;
        let key = memory_key(name, ArtifactKind::Object);
        let mut tier = self.state.lock();
        if !tier.contains(&key) {
            tier.insert(key, Artifact::Object(obj), None);
        }
        Ok(())
    }

    fn load_obj(&self, name: &str) -> Result<Arc<serde_json::Value>> {
        validate_name(name)?;
        let key = memory_key(name, ArtifactKind::Object);
        let mut tier = self.state.lock();

        tier.touch(&key);
        let cached = tier.get(&key).and_then(|e| e.payload.as_object().cloned());
        match cached {
            Some(obj) => {
                tier.hits += 1;
                Ok(obj)
            }
            None => {
                tier.misses += 1;
                Err(CacheError::not_found(ArtifactKind::Object, name))
            }
        }
    }

    fn remove_obj(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.state
            .lock()
            .remove(&memory_key(name, ArtifactKind::Object));
        Ok(())
    }

    fn list(&self, kind: ArtifactKind) -> Result<Vec<ListedArtifact>> {
        let tier = self.state.lock();
        Ok(tier
            .entries_of(kind)
            .into_iter()
            .filter_map(|(key, entry)| {
                key.strip_suffix(kind.suffix()).map(|name| ListedArtifact {
                    name: name.to_string(),
                    kind,
                    modified_at: entry.inserted_at,
                    size_bytes: 0,
                })
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
