use crate::cache::{CacheIndex, DiskCache};
use crate::kv::JsonFileStore;
use crate::loader::LoaderContext;
use crate::store::RemoteStore;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What the platform's native decoder accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeSupport {
    pub enabled: bool,
    /// Encodings the native path cannot handle; these always go through the converter
    pub unsupported_mime_types: Vec<String>,
}

impl Default for NativeSupport {
    fn default() -> Self {
        Self {
            enabled: true,
            unsupported_mime_types: Vec::new(),
        }
    }
}

impl NativeSupport {
    pub fn supports(&self, mime_type: &str) -> bool {
        self.enabled
            && !self
                .unsupported_mime_types
                .iter()
                .any(|unsupported| unsupported == mime_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Root of the cache; fetched bytes live in its `files` directory
    pub cache_dir: PathBuf,
    /// Durable cache index, `<cache_dir>/index.json` when unset
    pub index_file: Option<PathBuf>,
    pub index_key_prefix: String,
    pub native: NativeSupport,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./drift-cache"),
            index_file: None,
            index_key_prefix: "drift.cache.".to_string(),
            native: NativeSupport::default(),
        }
    }
}

impl LoaderConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn files_dir(&self) -> PathBuf {
        self.cache_dir.join("files")
    }

    pub fn index_file(&self) -> PathBuf {
        self.index_file
            .clone()
            .unwrap_or_else(|| self.cache_dir.join("index.json"))
    }

    pub fn open_index(&self) -> anyhow::Result<CacheIndex> {
        let index_file = self.index_file();
        let store = JsonFileStore::open(&index_file)
            .with_context(|| format!("Failed to open cache index {}", index_file.display()))?;
        Ok(CacheIndex::new(Arc::new(store), self.index_key_prefix.clone()))
    }

    /// Opens the cache and its index for loads against `store`
    pub fn build_context(&self, store: Arc<dyn RemoteStore>) -> anyhow::Result<LoaderContext> {
        Ok(LoaderContext {
            store,
            cache: DiskCache::new(self.files_dir()),
            index: self.open_index()?,
            native: self.native.clone(),
        })
    }
}
