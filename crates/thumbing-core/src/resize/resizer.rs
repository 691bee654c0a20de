//! Exact-size resize and re-encode.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use crate::config::{OutputFormat, ResizeConfig};
use crate::error::ResizeError;

/// Resizes decoded images to the configured dimensions and encodes them.
///
/// Encoding is deterministic: the same input always yields the same bytes,
/// which is what makes redelivered events safe to reprocess.
pub struct Resizer {
    config: ResizeConfig,
}

impl Resizer {
    /// Create a new resizer with the given configuration.
    pub fn new(config: ResizeConfig) -> Self {
        Self { config }
    }

    /// Target `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Resize to exactly the target dimensions, ignoring aspect ratio.
    pub fn resize(&self, image: &DynamicImage) -> DynamicImage {
        image.resize_exact(
            self.config.width,
            self.config.height,
            self.config.filter.into(),
        )
    }

    /// Format the derivative is encoded in, given the source format.
    ///
    /// With `OutputFormat::Source`, PNG, JPEG and WebP are kept; anything else
    /// is written as PNG.
    pub fn output_format(&self, source: ImageFormat) -> ImageFormat {
        match self.config.format {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Webp => ImageFormat::WebP,
            OutputFormat::Source => match source {
                ImageFormat::Jpeg => ImageFormat::Jpeg,
                ImageFormat::WebP => ImageFormat::WebP,
                _ => ImageFormat::Png,
            },
        }
    }

    /// Resize and encode in one step.
    pub fn resize_and_encode(
        &self,
        image: &DynamicImage,
        source: ImageFormat,
        key: &str,
    ) -> Result<Vec<u8>, ResizeError> {
        let resized = self.resize(image);
        encode(&resized, self.output_format(source), key)
    }
}

/// Encode `image` as `format`, converting the pixel layout where the encoder
/// requires it (JPEG has no alpha, the WebP encoder takes RGBA only).
pub fn encode(image: &DynamicImage, format: ImageFormat, key: &str) -> Result<Vec<u8>, ResizeError> {
    let converted;
    let image = match format {
        ImageFormat::Jpeg => {
            converted = DynamicImage::ImageRgb8(image.to_rgb8());
            &converted
        }
        ImageFormat::WebP => {
            converted = DynamicImage::ImageRgba8(image.to_rgba8());
            &converted
        }
        _ => image,
    };

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .map_err(|e| ResizeError::Encode {
            key: key.to_string(),
            message: e.to_string(),
        })?;
    Ok(buffer.into_inner())
}
