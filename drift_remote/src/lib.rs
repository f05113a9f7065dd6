//! Remote fetch pipeline behind [`drift_assets::ResourceProvider`].
//!
//! A [`RemoteLoader`] resolves a logical path against a [`RemoteStore`] one folder at a time,
//! negotiates the encoding from the converter's representations, fetches the bytes and keeps a
//! write-through copy in the [`DiskCache`].

mod cache;
mod config;
mod directory;
mod factory;
mod http;
mod kv;
mod loader;
mod resolve;
mod store;
mod strategy;

pub use cache::{CacheIndex, DiskCache, StagedWrite};
pub use config::{LoaderConfig, NativeSupport};
pub use directory::{DirectoryStore, guess_mime_type};
pub use factory::RemoteLoaderFactory;
pub use http::HttpStore;
pub use kv::{JsonFileStore, KeyValueStore, KvError, MemoryStore};
pub use loader::{LoaderContext, LoaderState, RemoteLoader};
pub use resolve::{RemoteResolver, ResolvedFile};
pub use store::{EntryFilter, FOLDER_MIME_TYPE, RemoteEntry, RemoteId, RemoteStore, StoreError};
pub use strategy::{
    ConverterStrategy, DecodeStrategy, NativeStrategy, StrategyKind, select_strategy,
};

/// Provider loading through a [`RemoteLoaderFactory`]
pub type RemoteProvider = drift_assets::ResourceProvider<RemoteLoaderFactory>;
