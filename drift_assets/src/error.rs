use crate::{DecodeError, PathError};

/// Why a load finished without a value
///
/// None of these cross the provider boundary as errors; they end up in
/// [`crate::LoadOutcome::Invalid`] and leave the resource invalid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("{0} does not exist remotely")]
    NotFound(String),
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("Cache failure: {0}")]
    Cache(String),
    #[error("Load was cancelled")]
    Cancelled,
}

/// Misuse of the provider API
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("{path} is registered as {registered}, requested as {requested}")]
    TypeMismatch {
        path: String,
        registered: &'static str,
        requested: &'static str,
    },
    #[error("No tokio runtime available to drive loads")]
    NoRuntime,
}
