use crate::{Asset, Capability, Converter, DecodeError, RawDataRepresentation, ResourcePath};

/// A directory-like grouping of other resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    path: ResourcePath,
}

impl Folder {
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }
}

/// Folders carry no bytes; every conversion is rejected
#[derive(Debug, Default)]
pub struct FolderConverter;

impl Converter<Folder> for FolderConverter {
    fn representations(&self) -> &[RawDataRepresentation] {
        &[]
    }

    fn convert(
        &self,
        _bytes: &[u8],
        representation: &RawDataRepresentation,
    ) -> Result<Folder, DecodeError> {
        Err(DecodeError::UnsupportedRepresentation(
            representation.mime_type().to_string(),
        ))
    }
}

impl Asset for Folder {
    type Converter = FolderConverter;

    const CAPABILITY: Capability = Capability::Folder;

    fn from_folder(path: &ResourcePath) -> Option<Self> {
        Some(Self { path: path.clone() })
    }
}
