use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::compression::CompressionConfig;
use crate::core::{CacheConfig, CacheMode, CachePolicy};

/// Main featcache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatCacheConfig {
    pub storage: StorageConfig,
    pub compression: CompressionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub mode: CacheMode,
    pub policy: CachePolicy,
    pub service_names: Vec<String>,
    pub memory_limit_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            root: cache.storage_root,
            mode: cache.mode,
            policy: cache.policy,
            service_names: cache.service_names,
            memory_limit_bytes: cache.memory_limit_bytes,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl FeatCacheConfig {
    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: FeatCacheConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Convert to the configuration consumed by the backend selector
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            storage_root: self.storage.root.clone(),
            mode: self.storage.mode,
            policy: self.storage.policy,
            service_names: self.storage.service_names.clone(),
            memory_limit_bytes: self.storage.memory_limit_bytes,
            compression: self.compression.clone(),
        }
    }
}
