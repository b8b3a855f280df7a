//! Constraints on images attached to posts.

use crate::error::DomainError;

/// An image file received with a create or update request.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

/// Size, format and geometry rules for post images.
#[derive(Debug, Clone)]
pub struct ImageRules {
    pub max_bytes: usize,
    pub min_width: u32,
    pub min_height: u32,
    pub aspect_ratios: Vec<f64>,
    pub aspect_tolerance: f64,
}

const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "avif", "webp"];
const ACCEPTED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/avif", "image/webp"];

impl Default for ImageRules {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            min_width: 800,
            min_height: 600,
            aspect_ratios: vec![16.0 / 9.0, 4.0 / 3.0],
            aspect_tolerance: 0.1,
        }
    }
}

impl ImageRules {
    /// Reject empty, oversized or non-image uploads before decoding them.
    pub fn check_format(&self, upload: &ImageUpload) -> Result<(), DomainError> {
        if upload.bytes.is_empty() {
            return Err(DomainError::Validation("Image file is empty".to_string()));
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(DomainError::Validation(format!(
                "Image must be at most {} bytes",
                self.max_bytes
            )));
        }

        let extension_ok = upload
            .extension()
            .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()));
        let content_type_ok = upload
            .content_type
            .as_deref()
            .is_some_and(|ct| ACCEPTED_CONTENT_TYPES.contains(&ct));

        if !(extension_ok && content_type_ok) {
            return Err(DomainError::Validation(
                "Only JPEG, PNG, avif, webp images are allowed".to_string(),
            ));
        }
        Ok(())
    }

    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), DomainError> {
        if width < self.min_width || height < self.min_height {
            return Err(DomainError::Validation(format!(
                "Image dimensions must be at least {}x{} pixels",
                self.min_width, self.min_height
            )));
        }

        let ratio = f64::from(width) / f64::from(height);
        let ratio_ok = self
            .aspect_ratios
            .iter()
            .any(|accepted| (ratio - accepted).abs() < self.aspect_tolerance);
        if !ratio_ok {
            return Err(DomainError::Validation(
                "Image must have a 16:9 or 4:3 aspect ratio".to_string(),
            ));
        }
        Ok(())
    }
}
