use crate::{Asset, Capability, Converter, DecodeError, RawDataRepresentation};

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl From<image::DynamicImage> for Texture {
    fn from(image: image::DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        }
    }
}

/// Decodes PNG, then JPEG, with the format taken from the representation
#[derive(Debug, Default)]
pub struct TextureConverter;

static REPRESENTATIONS: [RawDataRepresentation; 2] = [
    RawDataRepresentation::from_static("png", "image/png"),
    RawDataRepresentation::from_static("jpg", "image/jpeg"),
];

impl Converter<Texture> for TextureConverter {
    fn representations(&self) -> &[RawDataRepresentation] {
        &REPRESENTATIONS
    }

    fn convert(
        &self,
        bytes: &[u8],
        representation: &RawDataRepresentation,
    ) -> Result<Texture, DecodeError> {
        let format = image::ImageFormat::from_mime_type(representation.mime_type()).ok_or_else(
            || DecodeError::UnsupportedRepresentation(representation.mime_type().to_string()),
        )?;
        image::load_from_memory_with_format(bytes, format)
            .map(Texture::from)
            .map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}

impl Asset for Texture {
    type Converter = TextureConverter;

    const CAPABILITY: Capability = Capability::SupportsNativeDecode;

    /// Sniffs the format from the bytes themselves
    fn decode_native(
        bytes: &[u8],
        _representation: &RawDataRepresentation,
    ) -> Option<Result<Self, DecodeError>> {
        Some(
            image::load_from_memory(bytes)
                .map(Texture::from)
                .map_err(|e| DecodeError::Malformed(e.to_string())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode(format: image::ImageFormat) -> Vec<u8> {
        let image = image::DynamicImage::ImageRgb8(image::RgbImage::new(3, 2));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    #[test]
    fn test_convert_png_and_jpeg() {
        let converter = TextureConverter;
        let [png, jpg] = &REPRESENTATIONS;

        let texture = converter
            .convert(&encode(image::ImageFormat::Png), png)
            .unwrap();
        assert_eq!((texture.width, texture.height), (3, 2));
        assert_eq!(texture.pixels.len(), 3 * 2 * 4);

        let texture = converter
            .convert(&encode(image::ImageFormat::Jpeg), jpg)
            .unwrap();
        assert_eq!((texture.width, texture.height), (3, 2));
    }

    #[test]
    fn test_convert_rejects_garbage() {
        let converter = TextureConverter;
        assert!(matches!(
            converter.convert(b"not an image", &REPRESENTATIONS[0]),
            Err(DecodeError::Malformed(_))
        ));
        let unknown = RawDataRepresentation::new("xyz", "application/x-unknown");
        assert!(matches!(
            converter.convert(b"", &unknown),
            Err(DecodeError::UnsupportedRepresentation(_))
        ));
    }

    #[test]
    fn test_native_decode_sniffs_format() {
        let bytes = encode(image::ImageFormat::Png);
        let texture = Texture::decode_native(&bytes, &REPRESENTATIONS[1])
            .unwrap()
            .unwrap();
        assert_eq!((texture.width, texture.height), (3, 2));
    }
}
