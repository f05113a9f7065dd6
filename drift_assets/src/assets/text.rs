use crate::{Asset, Converter, DecodeError, RawDataRepresentation};
use std::ops::Deref;

/// UTF-8 text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text(pub String);

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Default)]
pub struct TextConverter;

static REPRESENTATIONS: [RawDataRepresentation; 2] = [
    RawDataRepresentation::from_static("txt", "text/plain"),
    RawDataRepresentation::from_static("json", "application/json"),
];

impl Converter<Text> for TextConverter {
    fn representations(&self) -> &[RawDataRepresentation] {
        &REPRESENTATIONS
    }

    fn convert(
        &self,
        bytes: &[u8],
        _representation: &RawDataRepresentation,
    ) -> Result<Text, DecodeError> {
        String::from_utf8(bytes.to_vec())
            .map(Text)
            .map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}

impl Asset for Text {
    type Converter = TextConverter;
}
