use crate::{Converter, DecodeError, RawDataRepresentation, ResourcePath};

/// Capability tag selecting how a loader treats an asset kind
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Directory-like grouping, synthesized from the path without any I/O
    Folder,
    /// Raw bytes decoded through [`Asset::Converter`]
    Converted,
    /// May be decoded directly while the bytes are read, falling back to the converter when the
    /// platform does not support the encoding
    SupportsNativeDecode,
}

/// A typed asset a [`crate::Resource`] can hold
pub trait Asset: Sized + Send + Sync + 'static {
    type Converter: Converter<Self> + Default;

    const CAPABILITY: Capability = Capability::Converted;

    /// Builds the value of a [`Capability::Folder`] asset
    fn from_folder(path: &ResourcePath) -> Option<Self> {
        let _ = path;
        None
    }

    /// Native fast path. `None` means the encoding has to go through the converter.
    fn decode_native(
        bytes: &[u8],
        representation: &RawDataRepresentation,
    ) -> Option<Result<Self, DecodeError>> {
        let _ = (bytes, representation);
        None
    }
}
