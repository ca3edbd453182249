pub mod error;
pub mod frame;
pub mod paths;
pub mod policy;
pub mod types;

pub use error::{CacheError, Result};
pub use frame::{Column, ColumnData, DataFrame, volume_of};
pub use paths::{PathResolver, memory_key, validate_name};
pub use policy::{AllowAll, AllowList, CacheGate, gate_for};
pub use types::{
    Artifact, ArtifactKind, CacheConfig, CacheMode, CachePolicy, CacheStats, ListedArtifact,
    MemoryBudget,
};
