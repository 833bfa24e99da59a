use crate::{
    assets::decode::SourceImage,
    foundation::core::Vec2,
    model::layer::{Layer, LayerPatch, SourceRect},
    transform::space::LayerFrame,
};

/// In-progress crop of one layer.
///
/// While a session is live the full source image is shown in place of the
/// layer's cropped view, and a rectangle tracking the layer's rotation, flip
/// and scale selects the region to keep. All geometry is resolved through
/// [`LayerFrame`], so the committed crop round-trips exactly with the layer
/// renderer's forward mapping.
#[derive(Clone, Debug)]
pub struct CropSession {
    layer_id: String,
    /// Transform of the full (uncropped) image during the session.
    frame: LayerFrame,
    full_w: f64,
    full_h: f64,
    rect_center: Vec2,
    rect_w: f64,
    rect_h: f64,
}

impl CropSession {
    /// Open a crop session for `layer` backed by its full source image.
    ///
    /// When the layer already carries a crop, the full image is positioned so
    /// the currently visible region stays exactly where it is on canvas and
    /// the rectangle starts over that region. Otherwise the rectangle starts
    /// over the full image extent.
    pub fn start(layer: &Layer, source: &SourceImage) -> Self {
        let full_w = f64::from(source.width);
        let full_h = f64::from(source.height);

        let mut frame = LayerFrame::from_layer(layer);
        let layer_center = frame.center;

        match layer.crop {
            Some(crop) => {
                // Offset of the crop region's center from the full image
                // center, in source pixels.
                let local = Vec2::new(
                    f64::from(crop.x) + f64::from(crop.width) / 2.0 - full_w / 2.0,
                    f64::from(crop.y) + f64::from(crop.height) / 2.0 - full_h / 2.0,
                );
                let origin_frame = LayerFrame {
                    center: Vec2::ZERO,
                    ..frame
                };
                frame.center = layer_center - origin_frame.to_canvas_space(local);
                Self {
                    layer_id: layer.id.clone(),
                    frame,
                    full_w,
                    full_h,
                    rect_center: layer_center,
                    rect_w: f64::from(crop.width) * frame.scale_x,
                    rect_h: f64::from(crop.height) * frame.scale_y,
                }
            }
            None => Self {
                layer_id: layer.id.clone(),
                frame,
                full_w,
                full_h,
                rect_center: layer_center,
                rect_w: full_w * frame.scale_x,
                rect_h: full_h * frame.scale_y,
            },
        }
    }

    /// Id of the layer being cropped.
    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    /// Transform of the full image shown during the session.
    pub fn frame(&self) -> LayerFrame {
        self.frame
    }

    /// Current rectangle center in canvas coordinates.
    pub fn rect_center(&self) -> Vec2 {
        self.rect_center
    }

    /// Current rectangle size in canvas units.
    pub fn rect_size(&self) -> (f64, f64) {
        (self.rect_w, self.rect_h)
    }

    /// Scale the rectangle by gesture factors, then fold any overshoot back
    /// inside the image.
    pub fn resize_by(&mut self, scale_x: f64, scale_y: f64) {
        if scale_x.is_finite() && scale_x > 0.0 {
            self.rect_w *= scale_x;
        }
        if scale_y.is_finite() && scale_y > 0.0 {
            self.rect_h *= scale_y;
        }
        self.clamp_rect();
    }

    /// Move the rectangle center, then fold any overshoot back inside the
    /// image.
    pub fn move_to(&mut self, x: f64, y: f64) {
        self.rect_center = Vec2::new(x, y);
        self.clamp_rect();
    }

    /// Reset the rectangle to the full image extent.
    pub fn reset(&mut self) {
        self.rect_center = self.frame.center;
        self.rect_w = self.full_w * self.frame.scale_x;
        self.rect_h = self.full_h * self.frame.scale_y;
    }

    /// Clamp the rectangle to the image bounds in the image's own local
    /// space, so clamping is correct at any rotation and flip.
    fn clamp_rect(&mut self) {
        let mut local = self.frame.to_source_space(self.rect_center);

        let w = (self.rect_w / self.frame.scale_x)
            .round()
            .clamp(1.0, self.full_w);
        let h = (self.rect_h / self.frame.scale_y)
            .round()
            .clamp(1.0, self.full_h);

        let max_dx = (self.full_w - w) / 2.0;
        let max_dy = (self.full_h - h) / 2.0;
        local.x = local.x.clamp(-max_dx, max_dx);
        local.y = local.y.clamp(-max_dy, max_dy);

        self.rect_center = self.frame.to_canvas_space(local);
        self.rect_w = w * self.frame.scale_x;
        self.rect_h = h * self.frame.scale_y;
    }

    /// Commit the session: the patch sets the layer's crop to the selected
    /// source region and moves the layer to the rectangle's position, so the
    /// kept pixels do not shift on canvas.
    pub fn apply(&self) -> LayerPatch {
        let local = self.frame.to_source_space(self.rect_center);

        let w = (self.rect_w / self.frame.scale_x).round().max(1.0);
        let h = (self.rect_h / self.frame.scale_y).round().max(1.0);
        let w = w.min(self.full_w);
        let h = h.min(self.full_h);

        let x = (local.x + self.full_w / 2.0 - w / 2.0)
            .round()
            .clamp(0.0, self.full_w - w);
        let y = (local.y + self.full_h / 2.0 - h / 2.0)
            .round()
            .clamp(0.0, self.full_h - h);

        LayerPatch {
            x: Some(self.rect_center.x),
            y: Some(self.rect_center.y),
            crop: Some(Some(SourceRect {
                x: x as u32,
                y: y as u32,
                width: w as u32,
                height: h as u32,
            })),
            ..LayerPatch::default()
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/crop.rs"]
mod tests;
