use std::sync::Arc;

use crate::{
    assets::decode::SourceImage,
    foundation::core::{Canvas, Point, Rect},
    foundation::error::{WrapError, WrapResult},
};

/// The base UV-unwrap texture for a vehicle model.
///
/// Immutable for the lifetime of a design session. The alpha channel defines
/// the paintable region; native pixel dimensions define the export size.
#[derive(Clone, Debug)]
pub struct Template {
    /// Native width in pixels.
    pub width: u32,
    /// Native height in pixels.
    pub height: u32,
    /// Template pixels in straight-alpha RGBA8.
    pub rgba8: Arc<Vec<u8>>,
}

impl Template {
    /// Build a template from a decoded source image.
    pub fn from_source(source: &SourceImage) -> WrapResult<Self> {
        if source.width == 0 || source.height == 0 {
            return Err(WrapError::validation(
                "template must have non-zero dimensions",
            ));
        }
        Ok(Self {
            width: source.width,
            height: source.height,
            rgba8: source.rgba8.clone(),
        })
    }

    /// View the template pixels as a [`SourceImage`].
    pub fn as_source(&self) -> SourceImage {
        SourceImage {
            width: self.width,
            height: self.height,
            rgba8: self.rgba8.clone(),
        }
    }

    /// Alpha at `(x, y)`; zero outside bounds.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.rgba8[(y as usize * self.width as usize + x as usize) * 4 + 3]
    }
}

/// The template's current on-canvas placement: centered, uniformly scaled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemplatePlacement {
    /// Center position in canvas coordinates.
    pub center: Point,
    /// Uniform canvas-units-per-source-pixel scale.
    pub scale: f64,
}

impl TemplatePlacement {
    /// Fit the template inside the canvas, centered, preserving aspect ratio.
    pub fn fit(template: &Template, canvas: Canvas) -> Self {
        let cw = f64::from(canvas.width);
        let ch = f64::from(canvas.height);
        let scale = (cw / f64::from(template.width)).min(ch / f64::from(template.height));
        Self {
            center: canvas.center(),
            scale,
        }
    }

    /// On-canvas bounding rectangle (center plus or minus half the scaled size).
    pub fn bounds(&self, template: &Template) -> Rect {
        let w = f64::from(template.width) * self.scale;
        let h = f64::from(template.height) * self.scale;
        Rect::new(
            self.center.x - w / 2.0,
            self.center.y - h / 2.0,
            self.center.x + w / 2.0,
            self.center.y + h / 2.0,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/template.rs"]
mod tests;
