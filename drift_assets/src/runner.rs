use crate::{Asset, LoadError, Resource, ResourcePath};
use derivative::Derivative;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Observable state of an [`AsyncRunner`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunnerState {
    Pending,
    Running,
    Completed,
}

/// Identifies one runner across its lifetime in the registry
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunnerId(pub(crate) u64);

/// Control side of a cancellable unit of asynchronous work
///
/// Completion is signalled at most once, no matter how many times or from where
/// [`AsyncRunner::complete`] is called. Cancellation is idempotent.
#[derive(Debug, Clone)]
pub struct AsyncRunner {
    id: RunnerId,
    state: Arc<watch::Sender<RunnerState>>,
    cancel: CancellationToken,
}

impl AsyncRunner {
    pub(crate) fn new(id: RunnerId) -> Self {
        let (state, _) = watch::channel(RunnerState::Pending);
        Self {
            id,
            state: Arc::new(state),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> RunnerId {
        self.id
    }

    pub fn state(&self) -> RunnerState {
        *self.state.borrow()
    }

    /// Observer handle over this runner for `resource`
    pub fn handle<T>(&self, resource: Resource<T>) -> LoadHandle<T> {
        LoadHandle {
            resource,
            state: self.state.subscribe(),
        }
    }

    /// Pending -> Running. Returns `false` if the runner already left pending.
    pub fn start(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == RunnerState::Pending {
                *state = RunnerState::Running;
                true
            } else {
                false
            }
        })
    }

    /// Signals completion. Returns `true` only for the call that actually completed the runner.
    pub fn complete(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == RunnerState::Completed {
                false
            } else {
                *state = RunnerState::Completed;
                true
            }
        })
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Observer side of a load. Every clone observes the same single completion.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct LoadHandle<T> {
    resource: Resource<T>,
    #[derivative(Debug = "ignore")]
    state: watch::Receiver<RunnerState>,
}

impl<T> LoadHandle<T> {
    /// A handle that is completed from the start
    pub fn instant(resource: Resource<T>) -> Self {
        let (_, state) = watch::channel(RunnerState::Completed);
        Self { resource, state }
    }

    pub fn path(&self) -> &ResourcePath {
        self.resource.path()
    }

    pub fn resource(&self) -> &Resource<T> {
        &self.resource
    }

    pub fn state(&self) -> RunnerState {
        *self.state.borrow()
    }

    pub fn is_completed(&self) -> bool {
        self.state() == RunnerState::Completed
    }

    /// Waits for completion. The returned resource may still be invalid.
    pub async fn completed(&self) -> Resource<T> {
        let mut state = self.state.clone();
        // A dropped runner can no longer complete; treat that as completion.
        let _ = state
            .wait_for(|state| *state == RunnerState::Completed)
            .await;
        self.resource.clone()
    }
}

impl<T: Send + Sync + 'static> IntoFuture for LoadHandle<T> {
    type Output = Resource<T>;
    type IntoFuture = BoxFuture<'static, Resource<T>>;

    fn into_future(self) -> Self::IntoFuture {
        async move { self.completed().await }.boxed()
    }
}

/// Result of locating resources under a prefix
#[derive(Debug)]
pub enum Located<T> {
    /// Exists and needs a regular load
    Path(ResourcePath),
    /// Already decoded while locating; registered as-is
    Resolved(Resource<T>),
}

/// Builds the work behind each load. The seam between the registry and a concrete fetch pipeline.
pub trait RunnerFactory: Send + Sync + 'static {
    /// Work that fills `resource`. Must return promptly once `cancel` fires.
    fn create_load_runner<T: Asset>(
        &self,
        resource: Resource<T>,
        cancel: CancellationToken,
    ) -> BoxFuture<'static, Result<(), LoadError>>;

    /// Finds the resources directly below `prefix`
    fn locate<T: Asset>(
        &self,
        prefix: &ResourcePath,
    ) -> BoxFuture<'static, Result<Vec<Located<T>>, LoadError>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn resource() -> Resource<u32> {
        Resource::new(ResourcePath::parse("a").unwrap())
    }

    #[test]
    fn test_transitions() {
        let runner = AsyncRunner::new(RunnerId(0));
        assert_eq!(runner.state(), RunnerState::Pending);
        assert!(runner.start());
        assert!(!runner.start());
        assert_eq!(runner.state(), RunnerState::Running);
        assert!(runner.complete());
        assert!(!runner.complete());
        assert_eq!(runner.state(), RunnerState::Completed);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let runner = AsyncRunner::new(RunnerId(0));
        let token = runner.cancellation_token();
        runner.cancel();
        runner.cancel();
        assert!(runner.is_cancelled());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_instant_handle() {
        let handle = LoadHandle::instant(resource());
        assert!(handle.is_completed());
        let resource = tokio::time::timeout(Duration::from_secs(1), handle.completed())
            .await
            .unwrap();
        assert_eq!(resource.path().as_str(), "a");
    }

    #[tokio::test]
    async fn test_all_handles_observe_completion() {
        let runner = AsyncRunner::new(RunnerId(1));
        let first = runner.handle(resource());
        let second = first.clone();
        runner.start();

        let waiter = tokio::spawn(async move { second.await });
        first.resource().resolve(3);
        runner.complete();

        let done = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(done.ptr_eq(first.resource()));
        assert_eq!(*first.completed().await.value().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_dropped_runner_releases_waiters() {
        let runner = AsyncRunner::new(RunnerId(2));
        let handle = runner.handle(resource());
        drop(runner);
        let resource = tokio::time::timeout(Duration::from_secs(1), handle.completed())
            .await
            .unwrap();
        assert!(!resource.is_valid());
    }
}
