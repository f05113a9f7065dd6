use crate::{Asset, Converter, DecodeError, RawDataRepresentation};

/// Opaque bytes, tagged with the encoding they were fetched in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Default)]
pub struct BlobConverter;

static REPRESENTATIONS: [RawDataRepresentation; 1] = [RawDataRepresentation::from_static(
    "",
    "application/octet-stream",
)];

impl Converter<Blob> for BlobConverter {
    fn representations(&self) -> &[RawDataRepresentation] {
        &REPRESENTATIONS
    }

    fn convert(
        &self,
        bytes: &[u8],
        representation: &RawDataRepresentation,
    ) -> Result<Blob, DecodeError> {
        Ok(Blob {
            data: bytes.to_vec(),
            mime_type: representation.mime_type().to_string(),
        })
    }
}

impl Asset for Blob {
    type Converter = BlobConverter;
}
