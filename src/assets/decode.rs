use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::WrapResult;

/// Decoded raster source in straight-alpha RGBA8 form.
///
/// Sources stay straight-alpha because recolor and crop semantics are defined
/// on source pixels; premultiplication happens at composite time.
#[derive(Clone, Debug)]
pub struct SourceImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major straight-alpha RGBA8.
    pub rgba8: Arc<Vec<u8>>,
}

impl SourceImage {
    /// Build a source from raw straight-alpha RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> WrapResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| crate::WrapError::validation("source image size overflow"))?;
        if rgba8.len() != expected {
            return Err(crate::WrapError::validation(
                "source image byte length does not match width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        })
    }

    /// Straight-alpha RGBA of the pixel at `(x, y)`; transparent outside bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.rgba8[i..i + 4];
        [px[0], px[1], px[2], px[3]]
    }
}

/// Decode encoded image bytes into a straight-alpha RGBA8 source.
pub fn decode_image(bytes: &[u8]) -> WrapResult<SourceImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(SourceImage {
        width,
        height,
        rgba8: Arc::new(rgba.into_raw()),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
