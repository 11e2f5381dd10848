//! Decoded input images.
//!
//! An [`ImageAsset`] is what the collaborator hands the engine: a decoded
//! RGBA bitmap and its natural size. The engine never mutates or keeps an
//! asset past the export that borrowed it.

use crate::error::{ExportError, Result};
use image::{ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ImageAsset {
    pixels: RgbaImage,
}

impl ImageAsset {
    /// Decode an image file. The format is sniffed from content, not the extension.
    pub fn open(path: &Path) -> Result<Self> {
        let reader = ImageReader::open(path)
            .map_err(|e| ExportError::resource(format!("{}: {e}", path.display())))?
            .with_guessed_format()
            .map_err(|e| ExportError::resource(format!("{}: {e}", path.display())))?;
        let decoded = reader
            .decode()
            .map_err(|e| ExportError::resource(format!("Failed to decode {}: {e}", path.display())))?;
        Self::from_rgba(decoded.to_rgba8())
    }

    /// Decode an in-memory encoded image (PNG, JPEG, ...).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let decoded = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(ExportError::resource)?
            .decode()
            .map_err(|e| ExportError::resource(format!("Failed to decode image bytes: {e}")))?;
        Self::from_rgba(decoded.to_rgba8())
    }

    /// Wrap an already-decoded bitmap.
    pub fn from_rgba(pixels: RgbaImage) -> Result<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(ExportError::resource("image has zero width or height"));
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}
