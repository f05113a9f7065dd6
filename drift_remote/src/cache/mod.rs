mod disk;
mod index;

pub use disk::{DiskCache, StagedWrite};
pub use index::CacheIndex;
