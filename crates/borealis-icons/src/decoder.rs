//! Default byte-stream decoder backed by the `image` crate.

use image::imageops::FilterType;

use crate::bitmap::Bitmap;
use crate::error::Result;
use crate::provider::StreamDecoder;

/// Decoder that understands every format the `image` crate does.
///
/// Scaling preserves aspect ratio against a maximum dimension: the decoded
/// bitmap's larger axis equals the requested size, the other axis may come
/// out smaller.
#[derive(Debug, Clone)]
pub struct ImageStreamDecoder {
    filter: FilterType,
}

impl ImageStreamDecoder {
    /// Create a decoder with bilinear filtering.
    pub fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }

    /// Use a specific resampling filter.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }
}

impl Default for ImageStreamDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDecoder for ImageStreamDecoder {
    fn decode_scaled(&self, bytes: &[u8], max_dimension: u32) -> Result<Bitmap> {
        let decoded = image::load_from_memory(bytes)?;
        let scaled = if decoded.width().max(decoded.height()) == max_dimension {
            decoded
        } else {
            decoded.resize(max_dimension, max_dimension, self.filter)
        };
        let rgba = scaled.to_rgba8();
        let (width, height) = rgba.dimensions();
        Bitmap::from_rgba(width, height, rgba.into_raw())
    }
}
