use crate::kv::{KeyValueStore, KvError};
use crate::store::RemoteId;
use derivative::Derivative;
use drift_assets::ResourcePath;
use std::sync::Arc;

/// Durable mapping from remote file id to the logical path its bytes were cached under
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct CacheIndex {
    #[derivative(Debug = "ignore")]
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl CacheIndex {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    pub fn key(&self, id: &RemoteId) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Entries are only ever overwritten
    pub fn record(&self, id: &RemoteId, path: &ResourcePath) -> Result<(), KvError> {
        self.store.set(&self.key(id), path.as_str())
    }

    /// [`Self::record`] on the blocking pool, for stores that write to disk
    pub async fn record_in_background(
        &self,
        id: &RemoteId,
        path: &ResourcePath,
    ) -> Result<(), KvError> {
        let index = self.clone();
        let (id, path) = (id.clone(), path.clone());
        tokio::task::spawn_blocking(move || index.record(&id, &path))
            .await
            .map_err(|e| KvError::Io(std::io::Error::other(e)))?
    }

    pub fn path_for(&self, id: &RemoteId) -> Option<ResourcePath> {
        let path = self.store.get(&self.key(id))?;
        match ResourcePath::parse(&path) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Ignoring cache index entry for {id}: {e}");
                None
            }
        }
    }
}
