use crate::loader::{LoaderContext, RemoteLoader, cache_candidates};
use crate::resolve::RemoteResolver;
use crate::store::EntryFilter;
use crate::strategy::select_strategy;
use drift_assets::{
    Asset, Capability, Converter, LoadError, Located, Resource, ResourcePath, RunnerFactory,
};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// [`RunnerFactory`] backed by a remote store and the write-through disk cache
#[derive(Debug, Clone)]
pub struct RemoteLoaderFactory {
    context: Arc<LoaderContext>,
}

impl RemoteLoaderFactory {
    pub fn new(context: LoaderContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    pub fn context(&self) -> &LoaderContext {
        &self.context
    }

    pub fn loader<T: Asset>(&self, resource: Resource<T>) -> RemoteLoader<T> {
        RemoteLoader::new(resource, self.context.clone())
    }
}

impl RunnerFactory for RemoteLoaderFactory {
    fn create_load_runner<T: Asset>(
        &self,
        resource: Resource<T>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<(), LoadError>> {
        self.loader(resource).run(cancel).boxed()
    }

    fn locate<T: Asset>(
        &self,
        prefix: &ResourcePath,
    ) -> BoxFuture<'static, Result<Vec<Located<T>>, LoadError>> {
        let context = self.context.clone();
        let prefix = prefix.clone();
        async move { locate::<T>(&context, &prefix).await }.boxed()
    }
}

/// Direct children of `prefix`, from the disk cache and the remote folder, in path order
///
/// Cache entries that decode are returned already valid. The remote listing fails the whole
/// call only if the cache had nothing either.
async fn locate<T: Asset>(
    context: &LoaderContext,
    prefix: &ResourcePath,
) -> Result<Vec<Located<T>>, LoadError> {
    let converter = T::Converter::default();
    let mut found: BTreeMap<ResourcePath, Located<T>> = BTreeMap::new();

    if T::CAPABILITY != Capability::Folder {
        locate_cached(context, prefix, &converter, &mut found).await;
    }

    let resolver = RemoteResolver::new(&*context.store);
    let remote = match resolver.resolve_folder(prefix).await {
        Ok(folder) => folder,
        Err(e) if !found.is_empty() => {
            tracing::warn!("Listing {prefix} from the cache only: {e}");
            return Ok(found.into_values().collect());
        }
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    if T::CAPABILITY == Capability::Folder {
        let entries = context
            .store
            .list_children(&remote, None, EntryFilter::Folder)
            .await?;
        names.extend(entries.into_iter().map(|entry| entry.name));
    } else {
        for representation in converter.representations() {
            let filter = EntryFilter::File {
                mime_type: representation.mime_type(),
            };
            let entries = context.store.list_children(&remote, None, filter).await?;
            names.extend(entries.into_iter().filter_map(|entry| {
                representation
                    .strip_file_name(&entry.name)
                    .map(str::to_string)
            }));
        }
    }

    for name in names {
        match prefix.join(&name) {
            Ok(path) => {
                found
                    .entry(path.clone())
                    .or_insert_with(|| Located::Path(path));
            }
            Err(e) => tracing::warn!("Skipping remote entry {name} under {prefix}: {e}"),
        }
    }
    Ok(found.into_values().collect())
}

async fn locate_cached<T: Asset>(
    context: &LoaderContext,
    prefix: &ResourcePath,
    converter: &T::Converter,
    found: &mut BTreeMap<ResourcePath, Located<T>>,
) {
    let entries = match context.cache.entries().await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to list the disk cache: {e}");
            return;
        }
    };
    let candidates = cache_candidates::<T>(converter);

    for (path, extension) in entries {
        if !path.is_child_of(prefix) || found.contains_key(&path) {
            continue;
        }
        let Some(representation) = candidates
            .iter()
            .find(|candidate| candidate.extension() == extension)
        else {
            continue;
        };
        let bytes = match context.cache.read(&path, representation).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("Failed to read cached {path}: {e}");
                continue;
            }
        };
        let strategy = select_strategy::<T>(&context.native, representation, converter);
        match strategy.decode_now(&bytes, representation) {
            Ok(value) => {
                tracing::trace!("Located {path} in the disk cache");
                let resource = Resource::with_value(path.clone(), value);
                found.insert(path, Located::Resolved(resource));
            }
            Err(e) => {
                tracing::debug!("Cached {path} does not decode, fetching instead: {e}");
                if let Err(e) = context.cache.remove(&path, representation).await {
                    tracing::warn!("Failed to evict cached {path}: {e}");
                }
            }
        }
    }
}
