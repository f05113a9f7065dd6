use crate::{LoadHandle, Resource};
use derivative::Derivative;

/// Fan-in over several loads, completing once every constituent has completed
///
/// Constituents complete in no particular order.
#[derive(Derivative)]
#[derivative(Debug(bound = ""), Clone(bound = ""))]
pub struct BatchHandle<T> {
    handles: Vec<LoadHandle<T>>,
}

impl<T> BatchHandle<T> {
    pub(crate) fn new(handles: Vec<LoadHandle<T>>) -> Self {
        Self { handles }
    }

    pub fn handles(&self) -> &[LoadHandle<T>] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.handles
            .iter()
            .filter(|handle| handle.is_completed())
            .count()
    }

    pub fn is_completed(&self) -> bool {
        self.handles.iter().all(LoadHandle::is_completed)
    }

    /// Waits for every load; results are in locate order
    pub async fn completed(&self) -> Vec<Resource<T>> {
        futures::future::join_all(self.handles.iter().map(|handle| handle.completed())).await
    }
}
