use rayon::prelude::*;

use crate::{
    assets::decode::SourceImage,
    foundation::core::{Affine, Point},
    foundation::error::{WrapError, WrapResult},
    foundation::math::premul_channel,
    model::layer::SourceRect,
    render::composite::{PremulRgba8, Surface, over},
    render::mask::TemplateMask,
    transform::space::LayerFrame,
};

/// Everything needed to rasterize one layer onto a surface.
///
/// A pure description: the renderer is a function from this value (plus the
/// world transform) to pixels, with no hidden state.
pub struct LayerDraw<'a> {
    /// Placement of the layer on the canvas.
    pub frame: LayerFrame,
    /// Effective source pixels (already recolored if the layer recolors).
    pub source: &'a SourceImage,
    /// Optional source-pixel crop; the cropped sub-rectangle is treated as the
    /// whole image by every downstream transform.
    pub crop: Option<SourceRect>,
    /// Layer opacity in `[0, 1]`.
    pub opacity: f64,
    /// Clip mask sampled in canvas space, when masking is enabled.
    pub mask: Option<&'a TemplateMask>,
}

/// Rasterize `draw` onto `surface`.
///
/// `world` maps canvas coordinates to surface pixel coordinates (identity for
/// an editor-sized surface; the template-space mapping for export). Pixels are
/// inverse-mapped through the layer transform and sampled bilinearly from the
/// (cropped) source, so rotation/flip/scale pivot around the layer center.
pub fn draw_layer(surface: &mut Surface, world: Affine, draw: &LayerDraw<'_>) -> WrapResult<()> {
    let src = draw.source;
    if src.width == 0 || src.height == 0 {
        return Err(WrapError::render("layer source has zero dimensions"));
    }

    let crop = draw
        .crop
        .map(|c| c.clamped_to(src.width, src.height))
        .unwrap_or(SourceRect {
            x: 0,
            y: 0,
            width: src.width,
            height: src.height,
        });
    let object_w = f64::from(crop.width);
    let object_h = f64::from(crop.height);

    let object_to_surface = world * draw.frame.object_to_canvas(object_w, object_h);
    let surface_to_object = object_to_surface.inverse();
    let surface_to_canvas = world.inverse();

    // Surface-space bounding box of the transformed object.
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(object_w, 0.0),
        Point::new(0.0, object_h),
        Point::new(object_w, object_h),
    ];
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for c in corners {
        let p = object_to_surface * c;
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let x0 = min_x.floor().max(0.0) as u32;
    let y0 = min_y.floor().max(0.0) as u32;
    let x1 = (max_x.ceil().max(0.0) as u32).min(surface.width);
    let y1 = (max_y.ceil().max(0.0) as u32).min(surface.height);
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }

    let stride = surface.stride();
    surface
        .data
        .par_chunks_exact_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as u32;
            if y < y0 || y >= y1 {
                return;
            }
            for x in x0..x1 {
                let p_surf = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let obj = surface_to_object * p_surf;
                if obj.x < 0.0 || obj.y < 0.0 || obj.x >= object_w || obj.y >= object_h {
                    continue;
                }

                let sample = sample_premul_bilinear(
                    src,
                    crop,
                    f64::from(crop.x) + obj.x,
                    f64::from(crop.y) + obj.y,
                );
                if sample[3] == 0 {
                    continue;
                }

                let mut opacity = draw.opacity;
                if let Some(mask) = draw.mask {
                    let canvas_pt = (surface_to_canvas * p_surf).to_vec2();
                    opacity *= f64::from(mask.sample(canvas_pt)) / 255.0;
                }
                if opacity <= 0.0 {
                    continue;
                }

                let i = x as usize * 4;
                let dst = [row[i], row[i + 1], row[i + 2], row[i + 3]];
                let out = over(dst, sample, opacity as f32);
                row[i..i + 4].copy_from_slice(&out);
            }
        });

    Ok(())
}

/// Bilinear sample of straight-alpha source pixels, premultiplied per texel
/// before interpolation so transparent texels cannot bleed color. Texel
/// lookups clamp to the crop rectangle, never outside it.
fn sample_premul_bilinear(src: &SourceImage, crop: SourceRect, x: f64, y: f64) -> PremulRgba8 {
    let lo_x = f64::from(crop.x);
    let lo_y = f64::from(crop.y);
    let hi_x = f64::from(crop.x + crop.width - 1);
    let hi_y = f64::from(crop.y + crop.height - 1);

    let sx = x - 0.5;
    let sy = y - 0.5;
    let x0 = sx.floor();
    let y0 = sy.floor();
    let fx = sx - x0;
    let fy = sy - y0;

    let texel = |px: f64, py: f64| -> [f64; 4] {
        let cx = px.clamp(lo_x, hi_x) as u32;
        let cy = py.clamp(lo_y, hi_y) as u32;
        let p = src.pixel(cx, cy);
        let a = p[3];
        [
            f64::from(premul_channel(p[0], a)),
            f64::from(premul_channel(p[1], a)),
            f64::from(premul_channel(p[2], a)),
            f64::from(a),
        ]
    };

    let t00 = texel(x0, y0);
    let t10 = texel(x0 + 1.0, y0);
    let t01 = texel(x0, y0 + 1.0);
    let t11 = texel(x0 + 1.0, y0 + 1.0);

    let mut out = [0u8; 4];
    for i in 0..4 {
        let top = t00[i] + (t10[i] - t00[i]) * fx;
        let bot = t01[i] + (t11[i] - t01[i]) * fx;
        out[i] = (top + (bot - top) * fy).round().clamp(0.0, 255.0) as u8;
    }

    // Premultiplied invariant can be violated by independent channel rounding.
    for i in 0..3 {
        out[i] = out[i].min(out[3]);
    }

    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/layer.rs"]
mod tests;
