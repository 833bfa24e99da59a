use crate::foundation::error::{WrapError, WrapResult};

/// Rotation snap increment in degrees.
pub const ROTATION_SNAP_DEG: f64 = 10.0;

/// A sub-rectangle of a layer's source image, in source pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceRect {
    /// Source pixels from the left edge.
    pub x: u32,
    /// Source pixels from the top edge.
    pub y: u32,
    /// Width in source pixels.
    pub width: u32,
    /// Height in source pixels.
    pub height: u32,
}

impl SourceRect {
    /// Clamp this rect into `[0, source_w) x [0, source_h)` with positive size.
    ///
    /// Transient out-of-bounds rects are expected during interactive editing
    /// and are silently corrected rather than rejected. A zero-sized source
    /// collapses the rect to a 1x1 at the origin; renderers reject such
    /// sources before sampling.
    pub fn clamped_to(self, source_w: u32, source_h: u32) -> Self {
        let x = self.x.min(source_w.saturating_sub(1));
        let y = self.y.min(source_h.saturating_sub(1));
        let width = self.width.clamp(1, source_w.saturating_sub(x).max(1));
        let height = self.height.clamp(1, source_h.saturating_sub(y).max(1));
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One user-placed, transformable image contributing to the wrap texture.
///
/// Serialized field names follow the persisted design-document format
/// (`imageUrl`, `scaleX`, ...).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Opaque unique id, stable within a design session.
    pub id: String,
    /// Reference to source pixel data (data URI, file, remote URL).
    pub image_url: String,
    /// Center x in canvas coordinates.
    pub x: f64,
    /// Center y in canvas coordinates.
    pub y: f64,
    /// Horizontal scale in canvas units per source pixel. Must be > 0.
    pub scale_x: f64,
    /// Vertical scale in canvas units per source pixel. Must be > 0.
    pub scale_y: f64,
    /// Rotation in degrees; persisted values are multiples of 10.
    pub rotation: f64,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Optional target hex color for recoloring.
    #[serde(default)]
    pub recolor: Option<String>,
    /// Replace RGB outright when `true`; tint-multiply when `false`.
    #[serde(default)]
    pub total_recolor: bool,
    /// Mirror horizontally about the layer's own center.
    #[serde(default)]
    pub flip_x: bool,
    /// Mirror vertically about the layer's own center.
    #[serde(default)]
    pub flip_y: bool,
    /// Optional source-pixel crop; `None` means the full image.
    #[serde(default)]
    pub crop: Option<SourceRect>,
}

impl Layer {
    /// Build a default-transform layer centered at `(x, y)`.
    pub fn new(id: impl Into<String>, image_url: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            image_url: image_url.into(),
            x,
            y,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation: 0.0,
            opacity: 1.0,
            recolor: None,
            total_recolor: false,
            flip_x: false,
            flip_y: false,
            crop: None,
        }
    }

    /// Validate layer invariants.
    pub fn validate(&self) -> WrapResult<()> {
        if self.id.trim().is_empty() {
            return Err(WrapError::validation("layer id must be non-empty"));
        }
        if self.image_url.trim().is_empty() {
            return Err(WrapError::validation("layer imageUrl must be non-empty"));
        }
        for (name, v) in [("x", self.x), ("y", self.y)] {
            if !v.is_finite() {
                return Err(WrapError::validation(format!("layer {name} must be finite")));
            }
        }
        for (name, v) in [("scaleX", self.scale_x), ("scaleY", self.scale_y)] {
            if !v.is_finite() || v <= 0.0 {
                return Err(WrapError::validation(format!(
                    "layer {name} must be finite and > 0"
                )));
            }
        }
        if !self.rotation.is_finite() || self.rotation.rem_euclid(ROTATION_SNAP_DEG) != 0.0 {
            return Err(WrapError::validation(
                "layer rotation must be a multiple of 10 degrees",
            ));
        }
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(WrapError::validation("layer opacity must be in [0, 1]"));
        }
        if let Some(crop) = self.crop
            && (crop.width == 0 || crop.height == 0)
        {
            return Err(WrapError::validation(
                "layer crop must have positive width and height",
            ));
        }
        Ok(())
    }
}

/// Snap an angle to the nearest 10 degrees.
pub fn snap_rotation(deg: f64) -> f64 {
    (deg / ROTATION_SNAP_DEG).round() * ROTATION_SNAP_DEG
}

/// Normalize an angle into `[0, 360)`.
pub fn normalize_rotation(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}

/// Partial update applied to a layer.
///
/// `None` leaves a field untouched; the nested options on `recolor` and `crop`
/// distinguish "no change" from "clear".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerPatch {
    /// New center x.
    pub x: Option<f64>,
    /// New center y.
    pub y: Option<f64>,
    /// New horizontal scale.
    pub scale_x: Option<f64>,
    /// New vertical scale.
    pub scale_y: Option<f64>,
    /// New rotation in degrees.
    pub rotation: Option<f64>,
    /// New opacity.
    pub opacity: Option<f64>,
    /// Set (`Some(Some(..))`) or clear (`Some(None)`) the recolor color.
    pub recolor: Option<Option<String>>,
    /// New total-recolor flag.
    pub total_recolor: Option<bool>,
    /// New horizontal flip flag.
    pub flip_x: Option<bool>,
    /// New vertical flip flag.
    pub flip_y: Option<bool>,
    /// Set (`Some(Some(..))`) or clear (`Some(None)`) the crop rect.
    pub crop: Option<Option<SourceRect>>,
}

impl LayerPatch {
    /// Apply this patch to `layer` in place.
    pub fn apply_to(&self, layer: &mut Layer) {
        if let Some(v) = self.x {
            layer.x = v;
        }
        if let Some(v) = self.y {
            layer.y = v;
        }
        if let Some(v) = self.scale_x {
            layer.scale_x = v;
        }
        if let Some(v) = self.scale_y {
            layer.scale_y = v;
        }
        if let Some(v) = self.rotation {
            layer.rotation = v;
        }
        if let Some(v) = self.opacity {
            layer.opacity = v;
        }
        if let Some(v) = &self.recolor {
            layer.recolor = v.clone();
        }
        if let Some(v) = self.total_recolor {
            layer.total_recolor = v;
        }
        if let Some(v) = self.flip_x {
            layer.flip_x = v;
        }
        if let Some(v) = self.flip_y {
            layer.flip_y = v;
        }
        if let Some(v) = self.crop {
            layer.crop = v;
        }
    }
}

/// Ordered layer collection; array order is z-order (index 0 is bottom-most).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    /// Construct an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Layers in render order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Lookup a layer by id.
    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Index of a layer by id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Append a layer on top; its position is reserved immediately even if its
    /// source has not decoded yet.
    pub fn add(&mut self, layer: Layer) -> WrapResult<()> {
        layer.validate()?;
        if self.get(&layer.id).is_some() {
            return Err(WrapError::validation(format!(
                "duplicate layer id '{}'",
                layer.id
            )));
        }
        self.layers.push(layer);
        Ok(())
    }

    /// Apply a partial update to the layer with `id`.
    pub fn update(&mut self, id: &str, patch: &LayerPatch) -> WrapResult<()> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| WrapError::validation(format!("unknown layer id '{id}'")))?;
        patch.apply_to(layer);
        Ok(())
    }

    /// Remove the layer with `id`.
    pub fn delete(&mut self, id: &str) -> WrapResult<Layer> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| WrapError::validation(format!("unknown layer id '{id}'")))?;
        Ok(self.layers.remove(idx))
    }

    /// Move the layer at `from` to index `to`; other layers shift accordingly.
    pub fn reorder(&mut self, from: usize, to: usize) -> WrapResult<()> {
        if from >= self.layers.len() || to >= self.layers.len() {
            return Err(WrapError::validation("reorder index out of bounds"));
        }
        let layer = self.layers.remove(from);
        self.layers.insert(to, layer);
        Ok(())
    }
}

/// A complete persisted wrap design.
///
/// This is the pure data document the surrounding application stores and
/// reloads; the engine reconstructs editor state from it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapDesign {
    /// Reference to the vehicle template texture.
    pub template_url: String,
    /// Base fill color as a hex string, or `None` for the raw template.
    #[serde(default)]
    pub base_color: Option<String>,
    /// Ordered layers (index 0 is bottom-most).
    pub layers: Vec<Layer>,
}

impl WrapDesign {
    /// Serialize to the persisted JSON format.
    pub fn to_json(&self) -> WrapResult<String> {
        serde_json::to_string(self).map_err(|e| WrapError::serde(e.to_string()))
    }

    /// Deserialize from the persisted JSON format and validate layers.
    pub fn from_json(json: &str) -> WrapResult<Self> {
        let design: Self =
            serde_json::from_str(json).map_err(|e| WrapError::serde(e.to_string()))?;
        for layer in &design.layers {
            layer.validate()?;
        }
        Ok(design)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/layer.rs"]
mod tests;
