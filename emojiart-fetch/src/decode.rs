//! Raster image decoding.

use emojiart_core::{BackgroundImage, FetchError, ImageDecoder};

/// Image formats recognised by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF (first frame only).
    Gif,
    /// WebP (alpha support).
    WebP,
    /// Windows bitmap.
    Bmp,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        if data.starts_with(b"BM") {
            return Self::Bmp;
        }

        Self::Unknown
    }
}

/// Decodes common raster formats to RGBA8.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl RasterDecoder {
    /// Create a decoder.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for RasterDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<BackgroundImage, FetchError> {
        let format = ImageFormat::from_magic_bytes(bytes);

        let img = image::load_from_memory(bytes)
            .map_err(|e| FetchError::Decode(format!("{format:?} image: {e}")))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        tracing::debug!("Decoded {format:?} background {width}x{height}");

        Ok(BackgroundImage::new(width, height, rgba.into_raw()))
    }
}
