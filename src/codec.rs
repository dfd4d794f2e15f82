use std::path::Path;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::error::{Result, SnapshotError};
use crate::padding::Dimensions;

pub struct DecodedImage {
    pub rgba: Vec<u8>,
    pub dimensions: Dimensions,
}

/// Encodes tightly packed RGBA8 pixels as a PNG, alpha included.
///
/// `rgba` must hold exactly `width * height * 4` bytes.
pub fn encode_png(rgba: &[u8], dimensions: Dimensions) -> Result<Vec<u8>> {
    let expected = dimensions.width as usize * dimensions.height as usize * 4;
    if rgba.len() < expected {
        return Err(SnapshotError::BufferTooSmall {
            expected,
            actual: rgba.len(),
        });
    }
    if rgba.len() > expected {
        return Err(SnapshotError::InvalidLayout(format!(
            "{} bytes of pixel data for a {}x{} RGBA8 image, expected {expected}",
            rgba.len(),
            dimensions.width,
            dimensions.height
        )));
    }
    let mut out = Vec::new();
    PngEncoder::new(&mut out).write_image(
        rgba,
        dimensions.width,
        dimensions.height,
        ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

pub fn decode_png(bytes: &[u8]) -> Result<DecodedImage> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    let dimensions = Dimensions::new(img.width(), img.height())?;
    Ok(DecodedImage {
        rgba: img.into_raw(),
        dimensions,
    })
}

/// Loads a fixture image from disk as RGBA8.
pub fn load_image(path: impl AsRef<Path>) -> Result<DecodedImage> {
    let bytes = std::fs::read(path)?;
    decode_png(&bytes)
}
