//! Named artifact store
//!
//! User-facing `save` / `load` / `remove` / `ls` on top of any cache backend.
//! User names are stored with the `__USER__` separator appended so they never
//! collide with keys cached internally by pipelines, and a name can be saved
//! only once across both kinds.

use crate::cache::CacheBackend;
use crate::core::error::{CacheError, Result};
use crate::core::frame::DataFrame;
use crate::core::types::{Artifact, ArtifactKind, ListedArtifact};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};

/// Separator appended to user-saved names
pub const USER_SEP: &str = "__USER__";

pub struct ArtifactStore {
    backend: Arc<dyn CacheBackend>,
}

impl ArtifactStore {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Save `artifact` under `name`.
    ///
    /// Fails with `DuplicateName` if `name` is already listed; remove it first
    /// to overwrite.
    pub fn save(&self, name: &str, artifact: impl Into<Artifact>) -> Result<()> {
        if self.find(name)?.is_some() {
            return Err(CacheError::DuplicateName(name.to_string()));
        }

        let key = user_key(name);
        match artifact.into() {
            Artifact::Frame(df) => {
                self.backend.cache_df(&key, df)?;
                // The gate may skip frames without an error
                if !self.backend.is_cached_df(&key) {
                    debug!("Frame {} not saved, rejected by cache policy", name);
                    return Ok(());
                }
            }
            Artifact::Object(obj) => self.backend.cache_obj(&key, obj)?,
        }
        info!("Saved artifact {}", name);
        Ok(())
    }

    pub fn save_frame(&self, name: &str, df: DataFrame) -> Result<()> {
        self.save(name, df)
    }

    /// Save any serializable value as an object artifact
    pub fn save_object<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        self.save(name, serde_json::to_value(value)?)
    }

    pub fn load(&self, name: &str) -> Result<Artifact> {
        let Some(listed) = self.find(name)? else {
            return Err(CacheError::not_found(ArtifactKind::Object, name));
        };

        let key = user_key(name);
        debug!("Loading {} {}", listed.kind, name);
        match listed.kind {
            ArtifactKind::Frame => Ok(Artifact::Frame(self.backend.load_df(&key)?)),
            ArtifactKind::Object => Ok(Artifact::Object(self.backend.load_obj(&key)?)),
        }
    }

    pub fn load_frame(&self, name: &str) -> Result<Arc<DataFrame>> {
        match self.load(name)? {
            Artifact::Frame(df) => Ok(df),
            Artifact::Object(_) => Err(CacheError::KindMismatch {
                name: name.to_string(),
                expected: ArtifactKind::Frame,
            }),
        }
    }

    /// Load an object artifact and deserialize it into `T`
    pub fn load_object<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        match self.load(name)? {
            Artifact::Object(obj) => Ok(T::deserialize(obj.as_ref())?),
            Artifact::Frame(_) => Err(CacheError::KindMismatch {
                name: name.to_string(),
                expected: ArtifactKind::Object,
            }),
        }
    }

    /// Remove `name`; no-op if it is not listed
    pub fn remove(&self, name: &str) -> Result<()> {
        let Some(listed) = self.find(name)? else {
            return Ok(());
        };

        let key = user_key(name);
        match listed.kind {
            ArtifactKind::Frame => self.backend.remove_df(&key)?,
            ArtifactKind::Object => self.backend.remove_obj(&key)?,
        }
        info!("Removed artifact {}", name);
        Ok(())
    }

    /// Alias for [`ArtifactStore::remove`]
    pub fn rm(&self, name: &str) -> Result<()> {
        self.remove(name)
    }

    /// User-saved names: objects first, then frames, each oldest first
    pub fn ls(&self) -> Result<Vec<String>> {
        Ok(self.ls_detailed()?.into_iter().map(|a| a.name).collect())
    }

    /// Like [`ArtifactStore::ls`] with kind, modification time and size
    pub fn ls_detailed(&self) -> Result<Vec<ListedArtifact>> {
        let mut listed = Vec::new();
        for kind in [ArtifactKind::Object, ArtifactKind::Frame] {
            listed.extend(
                self.backend
                    .list(kind)?
                    .into_iter()
                    .filter_map(|mut artifact| {
                        let name = artifact.name.strip_suffix(USER_SEP)?.to_string();
                        artifact.name = name;
                        Some(artifact)
                    }),
            );
        }
        Ok(listed)
    }

    fn find(&self, name: &str) -> Result<Option<ListedArtifact>> {
        Ok(self.ls_detailed()?.into_iter().find(|a| a.name == name))
    }
}

fn user_key(name: &str) -> String {
    format!("{}{}", name, USER_SEP)
}
