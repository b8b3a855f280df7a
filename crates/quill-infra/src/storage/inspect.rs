//! Image dimension reader backed by the `image` crate.

use std::io::Cursor;

use image::ImageReader;

use quill_core::ports::{ImageInspector, ObjectStoreError};

/// Reads width and height from the image header without decoding pixels.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateInspector;

impl ImageInspector for ImageCrateInspector {
    fn dimensions(&self, bytes: &[u8]) -> Result<(u32, u32), ObjectStoreError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ObjectStoreError::InvalidImage(e.to_string()))?
            .into_dimensions()
            .map_err(|e| ObjectStoreError::InvalidImage(e.to_string()))
    }
}
