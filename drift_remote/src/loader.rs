use crate::NativeSupport;
use crate::cache::{CacheIndex, DiskCache};
use crate::resolve::RemoteResolver;
use crate::store::RemoteStore;
use crate::strategy::{DecodeStrategy, select_strategy};
use bytes::Bytes;
use derivative::Derivative;
use drift_assets::{
    Asset, Capability, Converter, DecodeError, LoadError, RawDataRepresentation, Resource,
};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Everything loaders share: the store, the disk cache and its index
#[derive(Derivative)]
#[derivative(Debug)]
pub struct LoaderContext {
    #[derivative(Debug = "ignore")]
    pub store: Arc<dyn RemoteStore>,
    pub cache: DiskCache,
    pub index: CacheIndex,
    pub native: NativeSupport,
}

/// Pipeline position of a [`RemoteLoader`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoaderState {
    NotStarted,
    ResolvingCache,
    ResolvingMetadata,
    Fetching,
    Decoding,
    Completed,
    Cancelled,
}

impl LoaderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoaderState::Completed | LoaderState::Cancelled)
    }
}

/// Encodings a cache file of this converter may be stored in, most preferred first
pub(crate) fn cache_candidates<T: Asset>(converter: &T::Converter) -> &[RawDataRepresentation] {
    match converter.export_target() {
        Some(target) => std::slice::from_ref(target),
        None => converter.representations(),
    }
}

/// Fetch pipeline for one resource: cache, remote resolution, fetch, cache write, decode
///
/// Every failure completes the loader with the resource left invalid.
pub struct RemoteLoader<T: Asset> {
    resource: Resource<T>,
    context: Arc<LoaderContext>,
    converter: Arc<T::Converter>,
    state: watch::Sender<LoaderState>,
}

impl<T: Asset> RemoteLoader<T> {
    pub fn new(resource: Resource<T>, context: Arc<LoaderContext>) -> Self {
        let (state, _) = watch::channel(LoaderState::NotStarted);
        Self {
            resource,
            context,
            converter: Arc::new(T::Converter::default()),
            state,
        }
    }

    pub fn resource(&self) -> &Resource<T> {
        &self.resource
    }

    /// Observes the pipeline position
    pub fn subscribe(&self) -> watch::Receiver<LoaderState> {
        self.state.subscribe()
    }

    /// Runs the pipeline until it completes or `cancel` fires
    ///
    /// Cancellation drops the pipeline at its current suspension point, so nothing after it runs.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), LoadError> {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LoadError::Cancelled),
            result = self.pipeline(&cancel) => result,
        };

        let path = self.resource.path();
        match &result {
            Ok(()) => {}
            Err(LoadError::Cancelled) => tracing::debug!("Load of {path} cancelled"),
            Err(LoadError::Cache(e)) => tracing::warn!("Failed to load {path}: {e}"),
            Err(e) => tracing::error!("Failed to load {path}: {e}"),
        }
        self.set_state(match result {
            Err(LoadError::Cancelled) => LoaderState::Cancelled,
            _ => LoaderState::Completed,
        });
        result
    }

    fn set_state(&self, state: LoaderState) {
        self.state.send_replace(state);
    }

    async fn pipeline(&self, cancel: &CancellationToken) -> Result<(), LoadError> {
        let path = self.resource.path();
        if T::CAPABILITY == Capability::Folder {
            let folder = T::from_folder(path).ok_or_else(|| {
                DecodeError::UnsupportedRepresentation(crate::FOLDER_MIME_TYPE.to_string())
            })?;
            self.resource.resolve(folder);
            return Ok(());
        }

        self.set_state(LoaderState::ResolvingCache);
        let candidates = cache_candidates::<T>(&self.converter);
        let cached = match self.context.cache.lookup(path, candidates).await {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache for {path}: {e}");
                None
            }
        };

        let (representation, bytes, fetched) = match cached {
            Some((representation, bytes)) => {
                tracing::trace!("Cache hit for {path}");
                (representation.clone(), Bytes::from(bytes), None)
            }
            None => {
                self.set_state(LoaderState::ResolvingMetadata);
                let resolver = RemoteResolver::new(&*self.context.store);
                let file = resolver
                    .resolve_file(path, self.converter.representations())
                    .await?;

                self.set_state(LoaderState::Fetching);
                let (representation, bytes) = match self.converter.export_target() {
                    Some(target) => (
                        target.clone(),
                        self.context.store.export(&file.id, target.mime_type()).await?,
                    ),
                    None => (
                        file.representation,
                        self.context.store.download(&file.id).await?,
                    ),
                };
                if bytes.is_empty() {
                    return Err(LoadError::Transport(format!("{path} returned no content")));
                }
                (representation, bytes, Some(file.id))
            }
        };

        let value = self
            .decode_blocking(&bytes, &representation, |strategy, raw, encoding| {
                strategy.decode_on_read(raw, encoding)
            })
            .await?;
        let value = match value {
            Some(Ok(value)) => Some(value),
            Some(Err(e)) => {
                tracing::debug!("Native decode of {path} failed, using the converter: {e}");
                None
            }
            None => None,
        };

        if let Some(id) = &fetched {
            self.write_cache(&representation, &bytes, cancel).await?;
            if cancel.is_cancelled() {
                return Err(LoadError::Cancelled);
            }
            if let Err(e) = self.context.index.record_in_background(id, path).await {
                tracing::warn!("Failed to record {id} in the cache index: {e}");
            }
        }

        self.set_state(LoaderState::Decoding);
        let value = match value {
            Some(value) => value,
            None => {
                let decoded = self
                    .decode_blocking(&bytes, &representation, |strategy, raw, encoding| {
                        strategy.decode(raw, encoding)
                    })
                    .await?;
                match decoded {
                    Ok(value) => value,
                    Err(e) if fetched.is_none() => {
                        // undecodable cache entries are evicted so the next load fetches
                        if let Err(e) = self.context.cache.remove(path, &representation).await {
                            tracing::warn!("Failed to evict cached {path}: {e}");
                        }
                        return Err(e.into());
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };
        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        self.resource.resolve(value);
        Ok(())
    }

    /// Runs `decode` on the blocking pool with the strategy picked for `representation`
    ///
    /// The wait is a suspension point, so a cancelled load stops waiting on a slow converter and
    /// its result is dropped.
    async fn decode_blocking<R, D>(
        &self,
        bytes: &Bytes,
        representation: &RawDataRepresentation,
        decode: D,
    ) -> Result<R, LoadError>
    where
        R: Send + 'static,
        D: FnOnce(&dyn DecodeStrategy<T>, &[u8], &RawDataRepresentation) -> R + Send + 'static,
    {
        let native = self.context.native.clone();
        let converter = self.converter.clone();
        let bytes = bytes.clone();
        let representation = representation.clone();
        tokio::task::spawn_blocking(move || {
            let strategy = select_strategy::<T>(&native, &representation, &converter);
            decode(&*strategy, &bytes[..], &representation)
        })
        .await
        .map_err(|e| DecodeError::Malformed(format!("Decoder did not finish: {e}")).into())
    }

    /// Stages the bytes, then commits them only if the load is still wanted. Cache failures are
    /// not fatal.
    async fn write_cache(
        &self,
        representation: &RawDataRepresentation,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> Result<(), LoadError> {
        let path = self.resource.path();
        let staged = match self.context.cache.stage(path, representation, bytes).await {
            Ok(staged) => staged,
            Err(e) => {
                tracing::warn!("Failed to cache {path}: {e}");
                return Ok(());
            }
        };
        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        if let Err(e) = staged.commit() {
            tracing::warn!("Failed to cache {path}: {e}");
        }
        Ok(())
    }
}
