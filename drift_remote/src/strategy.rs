use crate::NativeSupport;
use drift_assets::{Asset, Capability, Converter, DecodeError, RawDataRepresentation};
use std::marker::PhantomData;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StrategyKind {
    /// Bytes are decoded natively as they are read
    Native,
    /// Bytes are handed to the asset's converter
    Converter,
}

/// How raw bytes become a typed value
pub trait DecodeStrategy<T>: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Decodes while the bytes are read. `None` leaves the work to [`Self::decode`].
    fn decode_on_read(
        &self,
        bytes: &[u8],
        representation: &RawDataRepresentation,
    ) -> Option<Result<T, DecodeError>>;

    fn decode(&self, bytes: &[u8], representation: &RawDataRepresentation)
    -> Result<T, DecodeError>;

    /// Both steps at once, for bytes that are already fully available
    fn decode_now(
        &self,
        bytes: &[u8],
        representation: &RawDataRepresentation,
    ) -> Result<T, DecodeError> {
        match self.decode_on_read(bytes, representation) {
            Some(Ok(value)) => Ok(value),
            _ => self.decode(bytes, representation),
        }
    }
}

pub struct ConverterStrategy<'c, C> {
    converter: &'c C,
}

impl<T, C: Converter<T>> DecodeStrategy<T> for ConverterStrategy<'_, C> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Converter
    }

    fn decode_on_read(
        &self,
        _bytes: &[u8],
        _representation: &RawDataRepresentation,
    ) -> Option<Result<T, DecodeError>> {
        None
    }

    fn decode(
        &self,
        bytes: &[u8],
        representation: &RawDataRepresentation,
    ) -> Result<T, DecodeError> {
        self.converter.convert(bytes, representation)
    }
}

/// Native fast path, with the converter as the fallback when it declines or fails
pub struct NativeStrategy<'c, T, C> {
    converter: &'c C,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Asset, C: Converter<T>> DecodeStrategy<T> for NativeStrategy<'_, T, C> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Native
    }

    fn decode_on_read(
        &self,
        bytes: &[u8],
        representation: &RawDataRepresentation,
    ) -> Option<Result<T, DecodeError>> {
        T::decode_native(bytes, representation)
    }

    fn decode(
        &self,
        bytes: &[u8],
        representation: &RawDataRepresentation,
    ) -> Result<T, DecodeError> {
        self.converter.convert(bytes, representation)
    }
}

/// Picks the native path only for kinds tagged [`Capability::SupportsNativeDecode`] whose
/// encoding the platform's native decoder accepts
pub fn select_strategy<'c, T: Asset>(
    native: &NativeSupport,
    representation: &RawDataRepresentation,
    converter: &'c T::Converter,
) -> Box<dyn DecodeStrategy<T> + 'c> {
    if T::CAPABILITY == Capability::SupportsNativeDecode
        && native.supports(representation.mime_type())
    {
        Box::new(NativeStrategy {
            converter,
            _marker: PhantomData,
        })
    } else {
        Box::new(ConverterStrategy { converter })
    }
}
