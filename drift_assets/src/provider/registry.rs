use crate::{Asset, AsyncRunner, LoadHandle, ProviderError, Resource, ResourcePath, RunnerId};
use derivative::Derivative;
use std::any::Any;
use std::collections::HashMap;

/// Highest progress reported while any load is in flight
pub const MAX_ACTIVE_PROGRESS: f32 = 0.999;

/// Heuristic load progress, `1.0` only when idle
pub fn aggregate_progress(active: usize) -> f32 {
    if active == 0 {
        1.0
    } else {
        (1.0 / active as f32).min(MAX_ACTIVE_PROGRESS)
    }
}

/// A registered resource with its concrete type erased
#[derive(Derivative)]
#[derivative(Debug)]
pub(super) struct Registered {
    type_name: &'static str,
    #[derivative(Debug = "ignore")]
    resource: Box<dyn Any + Send + Sync>,
}

impl Registered {
    pub(super) fn new<T: Asset>(resource: Resource<T>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            resource: Box::new(resource),
        }
    }

    pub(super) fn resource<T: Asset>(
        &self,
        path: &ResourcePath,
    ) -> Result<Resource<T>, ProviderError> {
        self.resource
            .downcast_ref::<Resource<T>>()
            .cloned()
            .ok_or_else(|| mismatch::<T>(path, self.type_name))
    }
}

/// A load currently in progress
#[derive(Derivative)]
#[derivative(Debug)]
pub(super) struct InFlight {
    pub(super) runner: AsyncRunner,
    type_name: &'static str,
    #[derivative(Debug = "ignore")]
    handle: Box<dyn Any + Send + Sync>,
}

impl InFlight {
    pub(super) fn new<T: Asset>(runner: AsyncRunner, handle: LoadHandle<T>) -> Self {
        Self {
            runner,
            type_name: std::any::type_name::<T>(),
            handle: Box::new(handle),
        }
    }

    pub(super) fn handle<T: Asset>(
        &self,
        path: &ResourcePath,
    ) -> Result<LoadHandle<T>, ProviderError> {
        self.handle
            .downcast_ref::<LoadHandle<T>>()
            .cloned()
            .ok_or_else(|| mismatch::<T>(path, self.type_name))
    }
}

fn mismatch<T>(path: &ResourcePath, registered: &'static str) -> ProviderError {
    ProviderError::TypeMismatch {
        path: path.to_string(),
        registered,
        requested: std::any::type_name::<T>(),
    }
}

/// Provider owned maps. Only ever touched under the provider's registry lock.
#[derive(Debug)]
pub(super) struct Registry {
    pub(super) resources: HashMap<ResourcePath, Registered>,
    pub(super) in_flight: HashMap<ResourcePath, InFlight>,
    progress: f32,
    next_runner: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            resources: HashMap::new(),
            in_flight: HashMap::new(),
            progress: 1.0,
            next_runner: 0,
        }
    }
}

impl Registry {
    pub(super) fn next_runner_id(&mut self) -> RunnerId {
        let id = RunnerId(self.next_runner);
        self.next_runner += 1;
        id
    }

    pub(super) fn progress(&self) -> f32 {
        self.progress
    }

    /// Recomputes progress, returning the new value only if it changed
    pub(super) fn update_progress(&mut self) -> Option<f32> {
        let progress = aggregate_progress(self.in_flight.len());
        if progress != self.progress {
            self.progress = progress;
            Some(progress)
        } else {
            None
        }
    }

    /// Removes the in-flight entry for `path` if it still belongs to `runner`
    pub(super) fn finish(&mut self, path: &ResourcePath, runner: RunnerId) -> Option<InFlight> {
        if self
            .in_flight
            .get(path)
            .is_some_and(|flight| flight.runner.id() == runner)
        {
            self.in_flight.remove(path)
        } else {
            None
        }
    }
}
