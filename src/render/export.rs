use crate::{
    assets::decode::SourceImage,
    foundation::core::{Affine, FrameRgba, Vec2},
    foundation::error::WrapResult,
    model::template::{Template, TemplatePlacement},
    render::composite::Surface,
    render::layer::{LayerDraw, draw_layer},
    transform::space::LayerFrame,
};

/// Flatten input: the drawable content of a design session.
///
/// Helper-only objects (snap guide lines, crop overlays and rectangles) and
/// the active selection are excluded by construction: they are never part of
/// this scene. Likewise the interactive viewport does not appear here, so
/// export output is always in template space regardless of pan/zoom state.
pub struct ExportScene<'a> {
    /// The session template at native resolution.
    pub template: &'a Template,
    /// The template's current on-canvas placement.
    pub placement: TemplatePlacement,
    /// Native-resolution base-color fill, drawn above the raw template and
    /// below all layers, when a base color is set.
    pub base_color: Option<&'a SourceImage>,
    /// Visible content layers in z-order (first is bottom-most).
    pub layers: Vec<LayerDraw<'a>>,
}

/// Flatten the scene into a buffer of exactly the template's native pixel
/// dimensions, over a transparent background.
///
/// The canvas-to-output multiplier is derived from the template's actual
/// on-canvas rectangle size rather than from scale fields directly; the ratio
/// form cancels accumulated floating-point drift that could otherwise shave a
/// pixel off the output (1023 instead of 1024).
#[tracing::instrument(skip(scene), fields(w = scene.template.width, h = scene.template.height))]
pub fn flatten(scene: &ExportScene<'_>) -> WrapResult<FrameRgba> {
    let template = scene.template;
    let bounds = scene.placement.bounds(template);

    let crop_w = bounds.width();
    let crop_h = bounds.height();
    let multiplier_w = f64::from(template.width) / crop_w;
    let multiplier_h = f64::from(template.height) / crop_h;
    let multiplier = (multiplier_w + multiplier_h) / 2.0;

    // Canvas coordinates -> output pixel coordinates.
    let world = Affine::scale(multiplier) * Affine::translate(Vec2::new(-bounds.x0, -bounds.y0));

    let mut surface = Surface::new(template.width, template.height)?;

    let template_frame = LayerFrame {
        center: scene.placement.center.to_vec2(),
        scale_x: scene.placement.scale,
        scale_y: scene.placement.scale,
        rotation_deg: 0.0,
        flip_x: false,
        flip_y: false,
    };

    let template_source = template.as_source();
    draw_layer(
        &mut surface,
        world,
        &LayerDraw {
            frame: template_frame,
            source: &template_source,
            crop: None,
            opacity: 1.0,
            mask: None,
        },
    )?;

    if let Some(fill) = scene.base_color {
        draw_layer(
            &mut surface,
            world,
            &LayerDraw {
                frame: template_frame,
                source: fill,
                crop: None,
                opacity: 1.0,
                mask: None,
            },
        )?;
    }

    for layer in &scene.layers {
        draw_layer(&mut surface, world, layer)?;
    }

    Ok(FrameRgba {
        width: template.width,
        height: template.height,
        data: surface.into_straight_rgba8(),
        premultiplied: false,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/export.rs"]
mod tests;
