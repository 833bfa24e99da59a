//! The single home of canvas/layer-local/source-pixel coordinate mapping.
//!
//! Both the layer renderer (forward) and the crop session (inverse) go through
//! these functions, so the two directions cannot drift apart.

use crate::{foundation::core::Affine, foundation::core::Vec2, model::layer::Layer};

/// A layer's placement parameters, used to map between canvas space and the
/// layer's own source-pixel space.
///
/// Order of operations, center-anchored: scale (with flip signs) first, then
/// rotation, then translation to the canvas center position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerFrame {
    /// Layer center in canvas coordinates.
    pub center: Vec2,
    /// Horizontal canvas-units-per-source-pixel scale.
    pub scale_x: f64,
    /// Vertical canvas-units-per-source-pixel scale.
    pub scale_y: f64,
    /// Rotation in degrees, clockwise in screen space.
    pub rotation_deg: f64,
    /// Mirror horizontally about the layer center.
    pub flip_x: bool,
    /// Mirror vertically about the layer center.
    pub flip_y: bool,
}

impl LayerFrame {
    /// Snapshot the transform of a layer.
    pub fn from_layer(layer: &Layer) -> Self {
        Self {
            center: Vec2::new(layer.x, layer.y),
            scale_x: layer.scale_x,
            scale_y: layer.scale_y,
            rotation_deg: layer.rotation,
            flip_x: layer.flip_x,
            flip_y: layer.flip_y,
        }
    }

    fn rotation(&self) -> (f64, f64) {
        let rad = self.rotation_deg.to_radians();
        (rad.cos(), rad.sin())
    }

    fn flip_signs(&self) -> (f64, f64) {
        (
            if self.flip_x { -1.0 } else { 1.0 },
            if self.flip_y { -1.0 } else { 1.0 },
        )
    }

    /// Map a point in source pixels, relative to the image center, into canvas
    /// coordinates.
    pub fn to_canvas_space(&self, local: Vec2) -> Vec2 {
        let (cos, sin) = self.rotation();
        let (fx, fy) = self.flip_signs();

        let sx = local.x * self.scale_x * fx;
        let sy = local.y * self.scale_y * fy;

        Vec2::new(
            self.center.x + sx * cos - sy * sin,
            self.center.y + sx * sin + sy * cos,
        )
    }

    /// Map a canvas point into source pixels relative to the image center
    /// (undo rotation, then flip, then scale).
    pub fn to_source_space(&self, canvas: Vec2) -> Vec2 {
        let (cos, sin) = self.rotation();
        let (fx, fy) = self.flip_signs();

        let d = canvas - self.center;
        let local_scaled_x = d.x * cos + d.y * sin;
        let local_scaled_y = -d.x * sin + d.y * cos;

        Vec2::new(
            local_scaled_x * fx / self.scale_x,
            local_scaled_y * fy / self.scale_y,
        )
    }

    /// Full affine from object pixel coordinates (origin at the object's
    /// top-left, `object_w x object_h` extent) to canvas coordinates.
    pub fn object_to_canvas(&self, object_w: f64, object_h: f64) -> Affine {
        let (fx, fy) = self.flip_signs();
        Affine::translate(self.center)
            * Affine::rotate(self.rotation_deg.to_radians())
            * Affine::scale_non_uniform(self.scale_x * fx, self.scale_y * fy)
            * Affine::translate(Vec2::new(-object_w / 2.0, -object_h / 2.0))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/space.rs"]
mod tests;
