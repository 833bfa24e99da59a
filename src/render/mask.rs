use crate::{
    foundation::core::{Canvas, Vec2},
    foundation::error::WrapResult,
    model::template::{Template, TemplatePlacement},
};

/// A canvas-sized clip image rasterized from the template's alpha channel.
///
/// Alpha at each canvas pixel equals the template's alpha at the corresponding
/// source pixel under the template's on-canvas transform; the RGB channels of
/// the conceptual clip image are uniformly white and therefore not stored.
/// Raw template alpha is passed through unmodified (no thresholding, no
/// erosion) so anti-aliased template edges stay smooth in the composite.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateMask {
    /// Mask width in physical pixels (`canvas.width * scale`).
    pub width: u32,
    /// Mask height in physical pixels (`canvas.height * scale`).
    pub height: u32,
    /// Physical pixels per canvas unit (device pixel ratio).
    pub scale: f64,
    /// Alpha plane, row-major.
    pub alpha: Vec<u8>,
}

impl TemplateMask {
    /// Sample the mask alpha at a canvas-space point (bilinear).
    pub fn sample(&self, canvas_pt: Vec2) -> u8 {
        let x = canvas_pt.x * self.scale - 0.5;
        let y = canvas_pt.y * self.scale - 0.5;

        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let a00 = self.texel(x0, y0);
        let a10 = self.texel(x0 + 1.0, y0);
        let a01 = self.texel(x0, y0 + 1.0);
        let a11 = self.texel(x0 + 1.0, y0 + 1.0);

        let top = a00 + (a10 - a00) * fx;
        let bot = a01 + (a11 - a01) * fx;
        (top + (bot - top) * fy).round().clamp(0.0, 255.0) as u8
    }

    fn texel(&self, x: f64, y: f64) -> f64 {
        if x < 0.0 || y < 0.0 || x >= f64::from(self.width) || y >= f64::from(self.height) {
            return 0.0;
        }
        f64::from(self.alpha[y as usize * self.width as usize + x as usize])
    }
}

/// Rasterize the template's alpha channel into a canvas-space clip mask.
///
/// `device_pixel_ratio` > 1 generates the mask at higher resolution so clip
/// edges stay smooth when the consumer renders high-DPI. Must be called again
/// whenever the template's on-canvas transform changes.
pub fn build_template_mask(
    template: &Template,
    placement: &TemplatePlacement,
    canvas: Canvas,
    device_pixel_ratio: f64,
) -> WrapResult<TemplateMask> {
    let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };
    let width = (f64::from(canvas.width) * dpr).round() as u32;
    let height = (f64::from(canvas.height) * dpr).round() as u32;

    let bounds = placement.bounds(template);
    let mut alpha = vec![0u8; width as usize * height as usize];

    for y in 0..height {
        let row = &mut alpha[y as usize * width as usize..(y as usize + 1) * width as usize];
        let canvas_y = (f64::from(y) + 0.5) / dpr;
        let ty = (canvas_y - bounds.y0) / placement.scale;
        for (x, out) in row.iter_mut().enumerate() {
            let canvas_x = (x as f64 + 0.5) / dpr;
            let tx = (canvas_x - bounds.x0) / placement.scale;
            *out = sample_template_alpha(template, tx, ty);
        }
    }

    Ok(TemplateMask {
        width,
        height,
        scale: dpr,
        alpha,
    })
}

/// Bilinear alpha sample in template source pixels; zero outside the template.
fn sample_template_alpha(template: &Template, x: f64, y: f64) -> u8 {
    if x < 0.0 || y < 0.0 || x > f64::from(template.width) || y > f64::from(template.height) {
        return 0;
    }

    let sx = x - 0.5;
    let sy = y - 0.5;
    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;

    let at = |px: f64, py: f64| -> f64 {
        if px < 0.0 || py < 0.0 {
            return 0.0;
        }
        f64::from(template.alpha_at(px as u32, py as u32))
    };

    let a00 = at(x0, y0);
    let a10 = at(x0 + 1.0, y0);
    let a01 = at(x0, y0 + 1.0);
    let a11 = at(x0 + 1.0, y0 + 1.0);

    let top = a00 + (a10 - a00) * fx;
    let bot = a01 + (a11 - a01) * fx;
    (top + (bot - top) * fy).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/render/mask.rs"]
mod tests;
