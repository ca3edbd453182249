use super::CacheBackend;
use crate::core::error::Result;
use crate::core::frame::DataFrame;
use crate::core::paths::validate_name;
use crate::core::policy::CacheGate;
use crate::core::types::{ArtifactKind, CacheMode, CacheStats, ListedArtifact};
use crate::persistence::DiskStore;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct DiskCounters {
    hits: u64,
    misses: u64,
}

/// Reads and writes straight to disk; no memory tier, no budget
pub struct DiskCache {
    disk: DiskStore,
    gate: Arc<dyn CacheGate>,
    // Also serializes check-then-write sequences
    counters: Mutex<DiskCounters>,
}

impl DiskCache {
    pub fn new(disk: DiskStore, gate: Arc<dyn CacheGate>) -> Self {
        info!("Disk cache over {:?}", disk.resolver().root());
        Self {
            disk,
            gate,
            counters: Mutex::new(DiskCounters::default()),
        }
    }

    fn record<T>(&self, result: Result<T>) -> Result<T> {
        let mut counters = self.counters.lock();
        match &result {
            Ok(_) => counters.hits += 1,
            Err(e) if e.is_not_found() => counters.misses += 1,
            Err(_) => {}
        }
        result
    }

    fn listed(&self, kind: ArtifactKind) -> Result<Vec<ListedArtifact>> {
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
}

impl CacheBackend for DiskCache {
    fn mode(&self) -> CacheMode {
        CacheMode::Disk
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

        let _guard = self.counters.lock();
        if !self.disk.exists(name, ArtifactKind::Frame) {
            self.disk.save_frame(name, &df)?;
        }
        Ok(())
    }

    fn load_df(&self, name: &str) -> Result<Arc<DataFrame>> {
        validate_name(name)?;
        let loaded = self.disk.load_frame(name).map(|(df, _)| Arc::new(df));
        self.record(loaded)
    }

    fn remove_df(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.disk.remove(name, ArtifactKind::Frame)?;
        Ok(())
    }

    fn is_cached_obj(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.disk.exists(name, ArtifactKind::Object)
    }

    fn cache_obj(&self, name: &str, obj: Arc<serde_json::Value>) -> Result<()> {
        validate_name(name)?;
        let _guard = self.counters.lock();
        if !self.disk.exists(name, ArtifactKind::Object) {
            self.disk.save_object(name, &obj)?;
        }
        Ok(())
    }

    fn load_obj(&self, name: &str) -> Result<Arc<serde_json::Value>> {
        validate_name(name)?;
        let loaded = self.disk.load_object(name).map(|(obj, _)| Arc::new(obj));
        self.record(loaded)
    }

    fn remove_obj(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.disk.remove(name, ArtifactKind::Object)?;
        Ok(())
    }

    fn list(&self, kind: ArtifactKind) -> Result<Vec<ListedArtifact>> {
        self.listed(kind)
    }

    fn memory_limit(&self) -> Option<u64> {
        None
    }

    fn set_memory_limit(&self, limit_bytes: u64) {
        debug!("Disk cache has no memory tier, ignoring limit {}", limit_bytes);
    }

    fn stats(&self) -> CacheStats {
        let counters = self.counters.lock();
        CacheStats {
            mode: self.mode(),
            hits: counters.hits,
            misses: counters.misses,
            ..Default::default()
        }
    }
}
