pub mod cache;
pub mod compression;
pub mod config;
pub mod core;
pub mod persistence;
pub mod store;

// Re-export commonly used types
pub use cache::{CacheBackend, DiskCache, HybridCache, RamCache, build_backend};
pub use compression::{CompressionAlgorithm, CompressionConfig, Compressor};
pub use config::{FeatCacheConfig, LoggingConfig, StorageConfig};
pub use crate::core::{
    AllowAll, AllowList, Artifact, ArtifactKind, CacheConfig, CacheError, CacheGate, CacheMode,
    CachePolicy, CacheStats, Column, ColumnData, DataFrame, ListedArtifact, MemoryBudget,
    PathResolver, Result,
};
pub use persistence::DiskStore;
pub use store::{ArtifactStore, USER_SEP};
