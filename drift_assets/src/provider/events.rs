use crate::{LoadError, ResourcePath};

/// How a single load ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Invalid(LoadError),
    Cancelled,
}

impl From<Result<(), LoadError>> for LoadOutcome {
    fn from(value: Result<(), LoadError>) -> Self {
        match value {
            Ok(()) => LoadOutcome::Loaded,
            Err(LoadError::Cancelled) => LoadOutcome::Cancelled,
            Err(err) => LoadOutcome::Invalid(err),
        }
    }
}

/// Changes observed on a [`super::ResourceProvider`], drained with
/// [`super::ResourceProvider::get_events`]
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// Aggregate progress changed, in `[0, 1]`
    Progress(f32),
    /// A load finished. Look the resource up through its [`crate::LoadHandle`] and check validity.
    Completed {
        path: ResourcePath,
        outcome: LoadOutcome,
    },
}
