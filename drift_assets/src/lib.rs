//! Typed resources, converters and the [`ResourceProvider`] registry.
//!
//! A [`Resource`] is identified by a logical [`ResourcePath`] and receives its decoded value
//! exactly once. The provider deduplicates concurrent loads of the same path, tracks aggregate
//! progress and hands the actual fetch work to a [`RunnerFactory`].

mod asset;
pub mod assets;
mod converter;
mod error;
mod path;
mod provider;
mod representation;
mod resource;
mod runner;

pub use asset::{Asset, Capability};
pub use converter::{Converter, DecodeError};
pub use error::{LoadError, ProviderError};
pub use path::{PathError, ResourcePath, SEPARATOR};
pub use provider::{BatchHandle, LoadOutcome, ProviderEvent, ResourceProvider};
pub use representation::RawDataRepresentation;
pub use resource::Resource;
pub use runner::{AsyncRunner, LoadHandle, Located, RunnerFactory, RunnerId, RunnerState};

pub mod prelude {
    pub use super::assets::{Blob, Folder, Text, Texture};
    pub use super::{
        Asset, Capability, Converter, LoadHandle, RawDataRepresentation, Resource,
        ResourcePath, ResourceProvider,
    };
}
