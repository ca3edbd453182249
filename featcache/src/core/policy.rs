use super::types::CachePolicy;
use std::collections::HashSet;
use std::sync::Arc;

/// Decides whether a frame may be written to the cache.
///
/// A rejection is not an error: the write is skipped silently.
pub trait CacheGate: Send + Sync {
    fn allow(&self, name: &str) -> bool;
}

/// Admits every frame
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl CacheGate for AllowAll {
    fn allow(&self, _name: &str) -> bool {
        true
    }
}

/// Admits only frames named in the service allow-list
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    names: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl CacheGate for AllowList {
    fn allow(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Build the gate selected by configuration
pub fn gate_for(policy: CachePolicy, service_names: &[String]) -> Arc<dyn CacheGate> {
    match policy {
        CachePolicy::Everything => Arc::new(AllowAll),
        CachePolicy::Service => Arc::new(AllowList::new(service_names.iter().cloned())),
    }
}
