#![allow(dead_code)]

use bytes::Bytes;
use drift_remote::{
    CacheIndex, DiskCache, EntryFilter, FOLDER_MIME_TYPE, LoaderContext, MemoryStore,
    NativeSupport, RemoteEntry, RemoteId, RemoteLoaderFactory, RemoteProvider, RemoteStore,
    StoreError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};

pub const INDEX_PREFIX: &str = "drift.cache.";

/// One call made against [`MockStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    List {
        parent: String,
        name: Option<String>,
        mime_type: String,
    },
    Download(String),
    Export { id: String, mime_type: String },
}

impl Query {
    pub fn folder(parent: &str, name: &str) -> Self {
        Query::List {
            parent: parent.to_string(),
            name: Some(name.to_string()),
            mime_type: FOLDER_MIME_TYPE.to_string(),
        }
    }

    pub fn file(parent: &str, name: &str, mime_type: &str) -> Self {
        Query::List {
            parent: parent.to_string(),
            name: Some(name.to_string()),
            mime_type: mime_type.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct MockEntry {
    id: String,
    parent: String,
    name: String,
    mime_type: String,
    content: Vec<u8>,
    exports: Vec<(String, Vec<u8>)>,
}

/// In-memory store recording every query. With a gate, fetches wait for a permit after
/// signalling [`MockStore::started`].
#[derive(Debug, Default)]
pub struct MockStore {
    entries: Mutex<Vec<MockEntry>>,
    queries: Mutex<Vec<Query>>,
    fetches: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    pub started: Notify,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: &Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate.clone()),
            ..Self::default()
        }
    }

    fn insert(&self, parent: &str, name: &str, mime_type: &str, content: &[u8]) -> String {
        let mut entries = self.entries.lock().unwrap();
        let id = format!("id{}", entries.len());
        entries.push(MockEntry {
            id: id.clone(),
            parent: parent.to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            content: content.to_vec(),
            exports: Vec::new(),
        });
        id
    }

    /// Adds a folder under `parent`, returning its id. Adding the same name twice makes it
    /// ambiguous.
    pub fn folder(&self, parent: &str, name: &str) -> String {
        self.insert(parent, name, FOLDER_MIME_TYPE, &[])
    }

    pub fn file(&self, parent: &str, name: &str, mime_type: &str, content: &[u8]) -> String {
        self.insert(parent, name, mime_type, content)
    }

    /// Registers what exporting `id` as `mime_type` answers
    pub fn export_as(&self, id: &str, mime_type: &str, content: &[u8]) {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.iter_mut().find(|entry| entry.id == id).unwrap();
        entry.exports.push((mime_type.to_string(), content.to_vec()));
    }

    /// Creates the folders of a `/` separated file path as needed, then the file itself
    pub fn add(&self, path: &str, mime_type: &str, content: &[u8]) -> String {
        let (folders, name) = path.rsplit_once('/').unwrap_or(("", path));
        let mut parent = RemoteId::root().to_string();
        for segment in folders.split('/').filter(|segment| !segment.is_empty()) {
            let existing = self
                .entries
                .lock()
                .unwrap()
                .iter()
                .find(|entry| {
                    entry.parent == parent
                        && entry.name == segment
                        && entry.mime_type == FOLDER_MIME_TYPE
                })
                .map(|entry| entry.id.clone());
            parent = match existing {
                Some(id) => id,
                None => self.folder(&parent, segment),
            };
        }
        self.file(&parent, name, mime_type, content)
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    pub fn clear_queries(&self) {
        self.queries.lock().unwrap().clear();
    }

    /// Downloads and exports issued so far
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn record(&self, query: Query) {
        self.queries.lock().unwrap().push(query);
    }

    async fn fetch(&self, id: &RemoteId) -> Result<MockEntry, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| StoreError::Request(e.to_string()))?
                .forget();
        }
        self.entry(id).ok_or_else(|| StoreError::UnknownId(id.clone()))
    }

    fn entry(&self, id: &RemoteId) -> Option<MockEntry> {
        let entries = self.entries.lock().unwrap();
        entries.iter().find(|entry| entry.id == id.as_str()).cloned()
    }

    fn children(
        &self,
        parent: &RemoteId,
        name: Option<&str>,
        mime_type: &str,
    ) -> Vec<RemoteEntry> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .filter(|entry| entry.parent == parent.as_str())
            .filter(|entry| name.is_none_or(|name| entry.name == name))
            .filter(|entry| entry.mime_type == mime_type)
            .map(|entry| RemoteEntry {
                id: RemoteId::new(entry.id.clone()),
                name: entry.name.clone(),
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl RemoteStore for MockStore {
    async fn list_children(
        &self,
        parent: &RemoteId,
        name: Option<&str>,
        filter: EntryFilter<'_>,
    ) -> Result<Vec<RemoteEntry>, StoreError> {
        self.record(Query::List {
            parent: parent.to_string(),
            name: name.map(str::to_string),
            mime_type: filter.mime_type().to_string(),
        });
        Ok(self.children(parent, name, filter.mime_type()))
    }

    async fn download(&self, id: &RemoteId) -> Result<Bytes, StoreError> {
        self.record(Query::Download(id.to_string()));
        let entry = self.fetch(id).await?;
        Ok(Bytes::from(entry.content))
    }

    async fn export(&self, id: &RemoteId, target_mime: &str) -> Result<Bytes, StoreError> {
        self.record(Query::Export {
            id: id.to_string(),
            mime_type: target_mime.to_string(),
        });
        let entry = self.fetch(id).await?;
        entry
            .exports
            .into_iter()
            .find(|(mime_type, _)| mime_type == target_mime)
            .map(|(_, content)| Bytes::from(content))
            .ok_or_else(|| StoreError::ExportUnsupported {
                id: id.clone(),
                mime_type: target_mime.to_string(),
            })
    }
}

/// A provider over a mock store, a temporary disk cache and an in-memory cache index
pub struct Harness {
    pub store: Arc<MockStore>,
    pub index: Arc<MemoryStore>,
    pub cache_dir: tempfile::TempDir,
    pub provider: RemoteProvider,
}

impl Harness {
    pub fn new(store: MockStore) -> Self {
        Self::with_native(store, NativeSupport::default())
    }

    pub fn with_native(store: MockStore, native: NativeSupport) -> Self {
        Self::build(Arc::new(store), tempfile::tempdir().unwrap(), native)
    }

    /// Same store and cache directory, fresh provider and index
    pub fn restart(self) -> Self {
        Self::build(self.store, self.cache_dir, NativeSupport::default())
    }

    fn build(store: Arc<MockStore>, cache_dir: tempfile::TempDir, native: NativeSupport) -> Self {
        let index = Arc::new(MemoryStore::new());
        let context = LoaderContext {
            store: store.clone(),
            cache: DiskCache::new(cache_dir.path()),
            index: CacheIndex::new(index.clone(), INDEX_PREFIX),
            native,
        };
        let provider = RemoteProvider::new(RemoteLoaderFactory::new(context)).unwrap();
        Self {
            store,
            index,
            cache_dir,
            provider,
        }
    }

    pub fn cache(&self) -> DiskCache {
        DiskCache::new(self.cache_dir.path())
    }

    /// Cache file names currently committed
    pub fn cached_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.cache_dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|kind| kind.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }
}

pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}
