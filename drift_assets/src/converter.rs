use crate::RawDataRepresentation;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Representation {0} is not accepted by this converter")]
    UnsupportedRepresentation(String),
    #[error("Malformed data: {0}")]
    Malformed(String),
}

/// Decodes raw bytes into a typed asset
///
/// Converters are pure: the same bytes and representation always give the same result.
pub trait Converter<T>: Send + Sync + 'static {
    /// Accepted encodings, most preferred first. Also the probing order against a remote store.
    fn representations(&self) -> &[RawDataRepresentation];

    /// Encoding the store must convert the content to server-side, instead of a plain download
    fn export_target(&self) -> Option<&RawDataRepresentation> {
        None
    }

    fn convert(&self, bytes: &[u8], representation: &RawDataRepresentation)
    -> Result<T, DecodeError>;
}
