//! Memory tier shared by the hybrid and RAM backends
//!
//! Holds payloads keyed by `<name><suffix>`, a logical use clock for LRU
//! ordering and the running volume of resident frames. Only frames are
//! metered and only frames are eviction candidates.

use crate::core::types::{Artifact, ArtifactKind, CacheStats};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::SystemTime;
use tracing::debug;

/// Cache entry held in memory
#[derive(Debug, Clone)]
pub(crate) struct MemoryEntry {
    pub payload: Artifact,
    /// Volume charged against the budget (0 for objects)
    pub volume: u64,
    /// Logical stamp of the last use, strictly increasing across the tier
    pub last_used: u64,
    /// Stamp taken at insertion, used for RAM listing order
    pub inserted: u64,
    pub inserted_at: DateTime<Utc>,
    /// Disk modification time observed at store/load (hybrid only)
    pub edited_at: Option<SystemTime>,
}

#[derive(Debug, Default)]
pub(crate) struct MemoryTier {
    entries: HashMap<String, MemoryEntry>,
    clock: u64,
    current_volume: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub stale_reloads: u64,
}

impl MemoryTier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next use stamp
    pub fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    pub fn current_volume(&self) -> u64 {
        self.current_volume
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&MemoryEntry> {
        self.entries.get(key)
    }

    /// Mark `key` as used now
    pub fn touch(&mut self, key: &str) {
        let stamp = self.tick();
        if let Some(entry) = self.entries.get_mut(key) {
            entry.last_used = stamp;
        }
    }

    /// Insert or replace an entry, stamping it as just used
    pub fn insert(&mut self, key: String, payload: Artifact, edited_at: Option<SystemTime>) {
        self.remove(&key);

        let volume = match &payload {
            Artifact::Frame(df) => df.volume(),
            Artifact::Object(_) => 0,
        };
        let stamp = self.tick();
        self.current_volume += volume;

        debug!("Memory tier PUT: {} ({} bytes)", key, volume);
        self.entries.insert(
            key,
            MemoryEntry {
                payload,
                volume,
                last_used: stamp,
                inserted: stamp,
                inserted_at: Utc::now(),
                edited_at,
            },
        );
    }

    pub fn remove(&mut self, key: &str) -> Option<MemoryEntry> {
        let entry = self.entries.remove(key)?;
        self.current_volume = self.current_volume.saturating_sub(entry.volume);
        debug!("Memory tier DELETE: {}", key);
        Some(entry)
    }

    /// Evict least recently used frames until `incoming` more bytes fit
    /// under `limit`. Candidates are ordered by `(last_used, key)`.
    ///
    /// Returns the evicted keys in eviction order.
    pub fn release_volume(&mut self, incoming: u64, limit: u64) -> Vec<String> {
        if self.current_volume + incoming <= limit {
            return Vec::new();
        }

        let mut candidates: Vec<(u64, String)> = self
            .entries
            .iter()
            .filter(|(_, e)| e.payload.kind() == ArtifactKind::Frame)
            .map(|(k, e)| (e.last_used, k.clone()))
            .collect();
        candidates.sort();

        let mut evicted = Vec::new();
        for (_, key) in candidates {
            if self.current_volume + incoming <= limit {
                break;
            }
            if let Some(entry) = self.entries.remove(&key) {
                self.current_volume = self.current_volume.saturating_sub(entry.volume);
                self.evictions += 1;
                debug!("Memory tier EVICT: {} ({} bytes)", key, entry.volume);
                evicted.push(key);
            }
        }
        evicted
    }

    /// Entries of `kind` in insertion order, as `(key, entry)`
    pub fn entries_of(&self, kind: ArtifactKind) -> Vec<(&str, &MemoryEntry)> {
        let mut items: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, e)| e.payload.kind() == kind)
            .map(|(k, e)| (k.as_str(), e))
            .collect();
        items.sort_by_key(|(_, e)| e.inserted);
        items
    }

    /// Fill the memory-related fields of `stats`
    pub fn fill_stats(&self, stats: &mut CacheStats) {
        let frames = self
            .entries
            .values()
            .filter(|e| e.payload.kind() == ArtifactKind::Frame)
            .count();
        stats.memory_entries = self.entries.len();
        stats.memory_frames = frames;
        stats.memory_objects = self.entries.len() - frames;
        stats.current_volume = self.current_volume;
        stats.hits = self.hits;
        stats.misses = self.misses;
        stats.evictions = self.evictions;
        stats.stale_reloads = self.stale_reloads;
    }
}
