//! Built-in asset kinds
mod blob;
mod folder;
mod text;
mod texture;

pub use blob::{Blob, BlobConverter};
pub use folder::{Folder, FolderConverter};
pub use text::{Text, TextConverter};
pub use texture::{Texture, TextureConverter};
