//! Hybrid (memory + disk) cache behaviour

use featcache::{
    AllowAll, AllowList, ArtifactKind, CacheBackend, CacheError, ColumnData, CompressionAlgorithm,
    CompressionConfig, Compressor, DataFrame, DiskStore, HybridCache, MemoryBudget, PathResolver,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};
use tempfile::{TempDir, tempdir};

/// Frame whose volume is exactly `bytes` (one bool column)
fn frame(bytes: usize) -> Arc<DataFrame> {
    Arc::new(
        DataFrame::empty()
            .with_column("flag", ColumnData::Bool(vec![true; bytes]))
            .unwrap(),
    )
}

fn disk(root: &Path) -> DiskStore {
    DiskStore::open(PathResolver::new(root), Compressor::default()).unwrap()
}

fn hybrid(limit: u64) -> (TempDir, HybridCache) {
    let dir = tempdir().unwrap();
    let cache = HybridCache::new(disk(dir.path()), Arc::new(AllowAll), MemoryBudget::new(limit));
    (dir, cache)
}

fn set_mtime(path: &Path, time: SystemTime) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

#[test]
fn test_300_byte_scenario() {
    let (_dir, cache) = hybrid(300);

    cache.cache_df("A", frame(100)).unwrap();
    cache.cache_df("B", frame(150)).unwrap();
    cache.cache_df("C", frame(100)).unwrap();

    assert!(!cache.is_in_memory("A", ArtifactKind::Frame));
    assert!(cache.is_in_memory("B", ArtifactKind::Frame));
    assert!(cache.is_in_memory("C", ArtifactKind::Frame));
    assert_eq!(cache.current_volume(), 250);

    // Evicted from memory only
    assert!(cache.is_cached_df("A"));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn test_lru_evicts_least_recently_used_first() {
    let (_dir, cache) = hybrid(35);

    // Insertion order differs from use order
    cache.cache_df("C", frame(10)).unwrap();
    cache.cache_df("B", frame(10)).unwrap();
    cache.cache_df("A", frame(10)).unwrap();
    cache.load_df("A").unwrap();
    cache.load_df("B").unwrap();
    cache.load_df("C").unwrap();

    cache.cache_df("D", frame(15)).unwrap();
    assert!(!cache.is_in_memory("A", ArtifactKind::Frame));
    for name in ["B", "C", "D"] {
        assert!(cache.is_in_memory(name, ArtifactKind::Frame), "{name}");
    }
}

#[test]
fn test_lru_evicts_second_oldest_when_still_needed() {
    let (_dir, cache) = hybrid(35);

    cache.cache_df("A", frame(10)).unwrap();
    cache.cache_df("B", frame(10)).unwrap();
    cache.cache_df("C", frame(10)).unwrap();
    cache.cache_df("D", frame(25)).unwrap();

    assert!(!cache.is_in_memory("A", ArtifactKind::Frame));
    assert!(!cache.is_in_memory("B", ArtifactKind::Frame));
    assert!(cache.is_in_memory("C", ArtifactKind::Frame));
    assert!(cache.is_in_memory("D", ArtifactKind::Frame));
    assert_eq!(cache.current_volume(), 35);
}

#[test]
fn test_round_trip_from_memory_and_disk() {
    let (_dir, cache) = hybrid(10);
    let x = Arc::new(
        DataFrame::empty()
            .with_column("id", ColumnData::Int64(vec![7]))
            .unwrap()
            .with_column("name", ColumnData::Utf8(vec![String::new()]))
            .unwrap(),
    );
    assert_eq!(x.volume(), 8 + 8);

    // Over budget as a whole, so only "y" stays in memory
    cache.cache_df("y", frame(10)).unwrap();
    assert!(matches!(
        cache.cache_df("x", x.clone()),
        Err(CacheError::CapacityExceeded { volume: 16, limit: 10 })
    ));

    cache.set_memory_limit(100);
    cache.cache_df("x", x.clone()).unwrap();
    assert_eq!(cache.load_df("x").unwrap(), x);
    assert_eq!(cache.stats().hits, 1);

    // Push "x" out of memory and read it back from disk
    cache.set_memory_limit(20);
    cache.cache_df("z", frame(10)).unwrap();
    assert!(!cache.is_in_memory("x", ArtifactKind::Frame));
    assert_eq!(cache.load_df("x").unwrap(), x);
    assert_eq!(cache.stats().misses, 1);
}

#[test]
fn test_round_trip_survives_new_instance() {
    let dir = tempdir().unwrap();
    let df = frame(5);
    {
        let cache = HybridCache::new(disk(dir.path()), Arc::new(AllowAll), MemoryBudget::new(100));
        cache.cache_df("persisted", df.clone()).unwrap();
        cache
            .cache_obj("meta", Arc::new(serde_json::json!({"rows": 5})))
            .unwrap();
    }

    let cache = HybridCache::new(disk(dir.path()), Arc::new(AllowAll), MemoryBudget::new(100));
    assert_eq!(cache.load_df("persisted").unwrap(), df);
    assert_eq!(cache.load_obj("meta").unwrap()["rows"], 5);
    assert!(cache.is_in_memory("persisted", ArtifactKind::Frame));
}

#[test]
fn test_stale_memory_copy_is_replaced() {
    let (dir, cache) = hybrid(1000);
    cache.cache_df("x", frame(10)).unwrap();

    // Another writer replaces the file behind the cache's back
    let other = disk(dir.path());
    let replacement = Arc::new(
        DataFrame::empty()
            .with_column("v", ColumnData::Int64(vec![1, 2, 3]))
            .unwrap(),
    );
    other.save_frame("x", &replacement).unwrap();
    let path = other.resolver().path_for("x", ArtifactKind::Frame);
    set_mtime(&path, SystemTime::now() + Duration::from_secs(60));

    assert_eq!(cache.load_df("x").unwrap(), replacement);
    let stats = cache.stats();
    assert_eq!(stats.stale_reloads, 1);
    assert_eq!(stats.current_volume, 24);

    // The refreshed copy is fresh again
    assert_eq!(cache.load_df("x").unwrap(), replacement);
    assert_eq!(cache.stats().hits, 1);
}

#[test]
fn test_stale_refresh_corrects_volume_and_evicts() {
    let (dir, cache) = hybrid(100);
    cache.cache_df("a", frame(30)).unwrap();
    cache.cache_df("b", frame(40)).unwrap();
    assert_eq!(cache.current_volume(), 70);

    let other = disk(dir.path());
    other.save_frame("a", &frame(80)).unwrap();
    set_mtime(
        &other.resolver().path_for("a", ArtifactKind::Frame),
        SystemTime::now() + Duration::from_secs(60),
    );

    assert_eq!(cache.load_df("a").unwrap().volume(), 80);
    assert_eq!(cache.current_volume(), 80);
    assert!(!cache.is_in_memory("b", ArtifactKind::Frame));
    assert!(cache.is_cached_df("b"));
}

#[test]
fn test_stale_object_is_reloaded() {
    let (dir, cache) = hybrid(100);
    cache
        .cache_obj("params", Arc::new(serde_json::json!({"depth": 3})))
        .unwrap();

    let other = disk(dir.path());
    other
        .save_object("params", &serde_json::json!({"depth": 8}))
        .unwrap();
    set_mtime(
        &other.resolver().path_for("params", ArtifactKind::Object),
        SystemTime::now() + Duration::from_secs(60),
    );

    assert_eq!(cache.load_obj("params").unwrap()["depth"], 8);
    assert_eq!(cache.stats().stale_reloads, 1);
}

#[test]
fn test_removal_is_idempotent() {
    let (dir, cache) = hybrid(100);
    cache.cache_df("x", frame(10)).unwrap();

    cache.remove_df("x").unwrap();
    assert!(!cache.is_cached_df("x"));
    assert!(!cache.is_in_memory("x", ArtifactKind::Frame));
    assert_eq!(cache.current_volume(), 0);
    assert!(!dir.path().join("x_df").exists());

    let before = cache.stats();
    cache.remove_df("x").unwrap();
    cache.remove_obj("never").unwrap();
    let after = cache.stats();
    assert_eq!(before.memory_entries, after.memory_entries);
    assert_eq!(before.current_volume, after.current_volume);
}

#[test]
fn test_deleted_file_drops_memory_copy() {
    let (dir, cache) = hybrid(100);
    cache.cache_df("x", frame(10)).unwrap();
    fs::remove_file(dir.path().join("x_df")).unwrap();

    let err = cache.load_df("x").unwrap_err();
    assert!(err.is_not_found());
    assert!(!cache.is_in_memory("x", ArtifactKind::Frame));
    assert_eq!(cache.current_volume(), 0);
}

#[test]
fn test_lowered_limit_applies_at_next_insert() {
    let (_dir, cache) = hybrid(100);
    cache.cache_df("a", frame(40)).unwrap();
    cache.cache_df("b", frame(40)).unwrap();

    cache.set_memory_limit(50);
    assert_eq!(cache.memory_limit(), Some(50));
    assert_eq!(cache.current_volume(), 80);

    cache.cache_df("c", frame(10)).unwrap();
    assert!(!cache.is_in_memory("a", ArtifactKind::Frame));
    assert_eq!(cache.current_volume(), 50);

    // Larger than the whole budget: served from disk, not admitted
    cache.set_memory_limit(20);
    assert_eq!(cache.load_df("a").unwrap().volume(), 40);
    assert!(!cache.is_in_memory("a", ArtifactKind::Frame));
}

#[test]
fn test_lowered_limit_applies_when_load_admits() {
    let (_dir, cache) = hybrid(50);
    cache.cache_df("a", frame(40)).unwrap();
    cache.cache_df("b", frame(40)).unwrap();
    assert!(!cache.is_in_memory("a", ArtifactKind::Frame));

    cache.set_memory_limit(45);
    cache.load_df("a").unwrap();
    assert!(cache.is_in_memory("a", ArtifactKind::Frame));
    assert!(!cache.is_in_memory("b", ArtifactKind::Frame));
    assert!(cache.current_volume() <= 45);
}

#[test]
fn test_cached_names_ordered_by_mtime() {
    let (dir, cache) = hybrid(1000);
    cache.cache_df("zeta", frame(1)).unwrap();
    cache.cache_df("alpha", frame(1)).unwrap();
    cache.cache_obj("obj", Arc::new(serde_json::json!([]))).unwrap();

    let now = SystemTime::now();
    set_mtime(&dir.path().join("zeta_df"), now - Duration::from_secs(120));
    set_mtime(&dir.path().join("alpha_df"), now - Duration::from_secs(60));

    assert_eq!(cache.cached_dfs().unwrap(), vec!["zeta", "alpha"]);
    assert_eq!(cache.cached_objs().unwrap(), vec!["obj"]);

    set_mtime(&dir.path().join("zeta_df"), now);
    assert_eq!(cache.cached_dfs().unwrap(), vec!["alpha", "zeta"]);
}

#[test]
fn test_dot_prefixed_names_are_listed() {
    let (_dir, cache) = hybrid(100);
    cache.cache_df(".hidden", frame(5)).unwrap();
    cache.cache_df("v1..v2", frame(5)).unwrap();
    cache
        .cache_obj(".env", Arc::new(serde_json::json!({"v": 1})))
        .unwrap();

    let mut frames = cache.cached_dfs().unwrap();
    frames.sort();
    assert_eq!(frames, vec![".hidden", "v1..v2"]);
    assert!(cache.is_cached_df(".hidden"));
    assert_eq!(cache.cached_objs().unwrap(), vec![".env"]);
    assert_eq!(cache.load_df(".hidden").unwrap().volume(), 5);
}

#[test]
fn test_existing_frame_is_not_overwritten() {
    let (_dir, cache) = hybrid(100);
    cache.cache_df("x", frame(10)).unwrap();
    cache.cache_df("x", frame(20)).unwrap();

    assert_eq!(cache.load_df("x").unwrap().volume(), 10);
}

#[test]
fn test_gate_rejects_frames_but_not_objects() {
    let dir = tempdir().unwrap();
    let cache = HybridCache::new(
        disk(dir.path()),
        Arc::new(AllowList::new(["features"])),
        MemoryBudget::new(100),
    );

    cache.cache_df("features", frame(10)).unwrap();
    cache.cache_df("scratch", frame(10)).unwrap();
    cache.cache_obj("scratch", Arc::new(serde_json::json!(1))).unwrap();

    assert!(cache.is_cached_df("features"));
    assert!(!cache.is_cached_df("scratch"));
    assert!(cache.is_cached_obj("scratch"));
}

#[test]
fn test_invalid_names_rejected() {
    let (_dir, cache) = hybrid(100);
    for name in ["", "..", "a/b", "../escape", ".fctmp1"] {
        assert!(matches!(
            cache.cache_df(name, frame(1)),
            Err(CacheError::InvalidName(_))
        ));
    }
    assert!(!cache.is_cached_df("a/b"));
}

#[test]
fn test_corrupted_file_reported() {
    let (dir, cache) = hybrid(100);
    fs::write(dir.path().join("broken_df"), b"not a frame file").unwrap();

    assert!(matches!(
        cache.load_df("broken"),
        Err(CacheError::Corrupted { .. })
    ));
}

#[test]
fn test_compressed_frames_round_trip() {
    let dir = tempdir().unwrap();
    let compressor = Compressor::new(CompressionConfig {
        enabled: true,
        min_payload_size: 0,
        default_algorithm: CompressionAlgorithm::Zstd,
        zstd_level: 3,
    });
    let store = DiskStore::open(PathResolver::new(dir.path()), compressor).unwrap();
    let cache = HybridCache::new(store, Arc::new(AllowAll), MemoryBudget::new(1 << 20));

    let df = Arc::new(
        DataFrame::empty()
            .with_column("v", ColumnData::Float64(vec![0.25; 4096]))
            .unwrap(),
    );
    cache.cache_df("big", df.clone()).unwrap();

    let size = fs::metadata(dir.path().join("big_df")).unwrap().len();
    assert!(size < df.volume());

    let fresh = HybridCache::new(disk(dir.path()), Arc::new(AllowAll), MemoryBudget::new(1 << 20));
    assert_eq!(fresh.load_df("big").unwrap(), df);
}

#[test]
fn test_concurrent_writers_respect_budget() {
    let (_dir, cache) = hybrid(200);
    let cache = Arc::new(cache);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..10 {
                    cache.cache_df(&format!("t{t}_{i}"), frame(30)).unwrap();
                    assert!(cache.current_volume() <= 200);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.cached_dfs().unwrap().len(), 40);
    assert!(cache.current_volume() <= 200);
}
