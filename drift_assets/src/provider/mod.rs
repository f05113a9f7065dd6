mod batch;
mod events;
mod registry;

pub use batch::BatchHandle;
pub use events::{LoadOutcome, ProviderEvent};

use crate::{
    Asset, AsyncRunner, LoadError, LoadHandle, Located, ProviderError, Resource, ResourcePath,
    RunnerFactory,
};
use registry::{InFlight, Registered, Registry};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct ProviderInner<F: RunnerFactory> {
    factory: F,
    /// Resource and in-flight maps. Every check-then-insert runs under this one lock.
    registry: Mutex<Registry>,
    runtime: tokio::runtime::Handle,
    event_send: crossbeam_channel::Sender<ProviderEvent>,
    event_recv: crossbeam_channel::Receiver<ProviderEvent>,
}

/// Registry and orchestrator of resource loads
///
/// At most one [`Resource`] exists per path. Concurrent loads of the same path attach to the
/// same in-flight [`LoadHandle`], so the factory runs once per path until it is unloaded.
#[derive(Debug)]
pub struct ResourceProvider<F: RunnerFactory> {
    inner: Arc<ProviderInner<F>>,
}

impl<F: RunnerFactory> Clone for ResourceProvider<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F: RunnerFactory> ResourceProvider<F> {
    /// Creates a provider spawning loads on the current tokio runtime
    pub fn new(factory: F) -> Result<Self, ProviderError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ProviderError::NoRuntime)?;
        Ok(Self::with_runtime(factory, runtime))
    }

    pub fn with_runtime(factory: F, runtime: tokio::runtime::Handle) -> Self {
        let (event_send, event_recv) = crossbeam_channel::unbounded();
        Self {
            inner: Arc::new(ProviderInner {
                factory,
                registry: Mutex::new(Registry::default()),
                runtime,
                event_send,
                event_recv,
            }),
        }
    }

    pub fn factory(&self) -> &F {
        &self.inner.factory
    }

    /// Loads `path`, joining an in-flight load or returning an already registered resource
    pub fn load_resource<T: Asset>(&self, path: &str) -> Result<LoadHandle<T>, ProviderError> {
        let path = ResourcePath::parse(path)?;
        self.load_path(path)
    }

    fn load_path<T: Asset>(&self, path: ResourcePath) -> Result<LoadHandle<T>, ProviderError> {
        let (handle, runner) = {
            let mut registry = self.inner.lock_registry();
            if let Some(flight) = registry.in_flight.get(&path) {
                tracing::trace!("Joining in-flight load of {path}");
                return flight.handle::<T>(&path);
            }
            if let Some(registered) = registry.resources.get(&path) {
                return registered.resource::<T>(&path).map(LoadHandle::instant);
            }

            let resource = Resource::<T>::new(path.clone());
            let runner = AsyncRunner::new(registry.next_runner_id());
            let handle = runner.handle(resource.clone());
            registry
                .resources
                .insert(path.clone(), Registered::new(resource));
            registry
                .in_flight
                .insert(path.clone(), InFlight::new(runner.clone(), handle.clone()));
            self.inner.update_progress(&mut registry);
            (handle, runner)
        };

        tracing::debug!("Loading {path}");
        self.inner.spawn(handle.resource().clone(), runner);
        Ok(handle)
    }

    /// Loads every resource directly below `prefix`
    ///
    /// Resources the factory already decoded while locating are registered without a fetch.
    /// Locate failures are logged and yield an empty batch.
    pub async fn load_resources<T: Asset>(
        &self,
        prefix: &str,
    ) -> Result<BatchHandle<T>, ProviderError> {
        let prefix = ResourcePath::parse(prefix)?;
        let located = match self.inner.factory.locate::<T>(&prefix).await {
            Ok(located) => located,
            Err(err) => {
                tracing::error!("Failed to locate resources under {prefix}: {err}");
                Vec::new()
            }
        };

        let mut handles = Vec::with_capacity(located.len());
        for entry in located {
            let handle = match entry {
                Located::Path(path) => self.load_path::<T>(path)?,
                Located::Resolved(resource) => self.adopt(resource)?,
            };
            handles.push(handle);
        }
        Ok(BatchHandle::new(handles))
    }

    /// Registers an already valid resource unless the path is known, in which case the known
    /// resource wins
    fn adopt<T: Asset>(&self, resource: Resource<T>) -> Result<LoadHandle<T>, ProviderError> {
        {
            let mut registry = self.inner.lock_registry();
            let path = resource.path();
            if !registry.in_flight.contains_key(path) && !registry.resources.contains_key(path) {
                tracing::trace!("Registering {path} without fetching");
                registry
                    .resources
                    .insert(path.clone(), Registered::new(resource.clone()));
                return Ok(LoadHandle::instant(resource));
            }
        }
        self.load_path(resource.path().clone())
    }

    /// Cancels any in-flight load of `path` and forgets its resource
    ///
    /// Returns whether a resource was registered. Invalid paths are a no-op.
    pub fn unload_resource(&self, path: &str) -> bool {
        let path = match ResourcePath::parse(path) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!("Ignoring unload of invalid path: {err}");
                return false;
            }
        };

        let (flight, existed) = {
            let mut registry = self.inner.lock_registry();
            let flight = registry.in_flight.remove(&path);
            if flight.is_some() {
                self.inner.update_progress(&mut registry);
            }
            (flight, registry.resources.remove(&path).is_some())
        };

        if let Some(flight) = flight {
            self.inner.cancel(path.clone(), flight);
        }
        if existed {
            tracing::debug!("Unloaded {path}");
        }
        existed
    }

    /// Unloads every tracked resource
    pub fn unload_resources(&self) {
        let flights = {
            let mut registry = self.inner.lock_registry();
            registry.resources.clear();
            let flights: Vec<_> = registry.in_flight.drain().collect();
            self.inner.update_progress(&mut registry);
            flights
        };
        for (path, flight) in flights {
            self.inner.cancel(path, flight);
        }
    }

    /// True if a resource is registered for `path`, whether or not it is still loading
    pub fn resource_exists(&self, path: &str) -> bool {
        ResourcePath::parse(path)
            .map(|path| self.inner.lock_registry().resources.contains_key(&path))
            .unwrap_or(false)
    }

    pub fn is_loading(&self, path: &str) -> bool {
        ResourcePath::parse(path)
            .map(|path| self.inner.lock_registry().in_flight.contains_key(&path))
            .unwrap_or(false)
    }

    /// The registered resource for `path`, if any and of type `T`
    pub fn get_resource<T: Asset>(&self, path: &str) -> Option<Resource<T>> {
        let path = ResourcePath::parse(path).ok()?;
        let registry = self.inner.lock_registry();
        registry.resources.get(&path)?.resource::<T>(&path).ok()
    }

    /// Aggregate progress; a heuristic, not a byte count
    pub fn progress(&self) -> f32 {
        self.inner.lock_registry().progress()
    }

    pub fn loading_count(&self) -> usize {
        self.inner.lock_registry().in_flight.len()
    }

    pub fn resource_count(&self) -> usize {
        self.inner.lock_registry().resources.len()
    }

    /// Drains queued events
    pub fn get_events(&self) -> Vec<ProviderEvent> {
        self.inner.event_recv.try_iter().collect()
    }
}

impl<F: RunnerFactory> ProviderInner<F> {
    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ProviderEvent) {
        if let Err(e) = self.event_send.send(event) {
            tracing::error!("Failed to send provider event: {:?}", e);
        }
    }

    fn update_progress(&self, registry: &mut Registry) {
        if let Some(progress) = registry.update_progress() {
            self.emit(ProviderEvent::Progress(progress));
        }
    }

    fn spawn<T: Asset>(self: &Arc<Self>, resource: Resource<T>, runner: AsyncRunner) {
        let work = self
            .factory
            .create_load_runner(resource.clone(), runner.cancellation_token());
        let inner = self.clone();
        runner.start();
        self.runtime.spawn(async move {
            let result = work.await;
            inner.finish(resource.path(), &runner, result);
        });
    }

    /// Completion handler; only the runner still registered for `path` updates the registry
    fn finish(&self, path: &ResourcePath, runner: &AsyncRunner, result: Result<(), LoadError>) {
        let owned = {
            let mut registry = self.lock_registry();
            let owned = registry.finish(path, runner.id()).is_some();
            if owned {
                self.update_progress(&mut registry);
            }
            owned
        };
        if owned {
            let outcome = LoadOutcome::from(result);
            match &outcome {
                LoadOutcome::Loaded => tracing::debug!("Loaded {path}"),
                LoadOutcome::Invalid(err) => tracing::debug!("{path} completed invalid: {err}"),
                LoadOutcome::Cancelled => tracing::debug!("{path} was cancelled"),
            }
            self.emit(ProviderEvent::Completed {
                path: path.clone(),
                outcome,
            });
        }
        runner.complete();
    }

    fn cancel(&self, path: ResourcePath, flight: InFlight) {
        tracing::debug!("Cancelling load of {path}");
        flight.runner.cancel();
        if flight.runner.complete() {
            self.emit(ProviderEvent::Completed {
                path,
                outcome: LoadOutcome::Cancelled,
            });
        }
    }
}
