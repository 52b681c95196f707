//! Immutable decoded bitmaps.

use std::sync::Arc;

use crate::error::{IconError, Result};

/// An immutable decoded RGBA8 image.
///
/// Pixel storage lives behind an `Arc`, so clones are cheap and a bitmap
/// handed out of the result cache is the same storage every caller sees.
/// Once a bitmap has been stored it is never mutated.
///
/// The decoder scales against a *maximum* dimension while preserving aspect
/// ratio, so width and height may differ from the requested icon size on
/// one axis.
#[derive(Debug, Clone)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl Bitmap {
    /// Wrap raw RGBA8 pixel data, row-major.
    ///
    /// Fails if the buffer length does not match `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(IconError::invalid_dimensions(expected, pixels.len()));
        }
        Ok(Self {
            width,
            height,
            pixels: pixels.into(),
        })
    }

    /// Create a solid-color bitmap. Useful for tests and placeholders.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels: pixels.into(),
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixel data, row-major.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// In-memory size of the pixel data in bytes.
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.pixels.len()
    }

    /// Whether two bitmaps share the same pixel storage.
    ///
    /// Cache hits hand back the stored bitmap itself, so a request that hit
    /// the cache satisfies `shares_storage` with the original resolution.
    pub fn shares_storage(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}
