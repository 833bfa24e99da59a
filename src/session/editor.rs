use std::sync::Arc;

use crate::{
    assets::decode::SourceImage,
    assets::store::{SourceProvider, SourceStore},
    effects::recolor::RecolorCache,
    foundation::core::{Canvas, Color, FrameRgba, Point, Vec2, Viewport},
    foundation::error::{WrapError, WrapResult},
    model::layer::{
        Layer, LayerPatch, LayerStack, WrapDesign, normalize_rotation, snap_rotation,
    },
    model::template::{Template, TemplatePlacement},
    render::base_color::base_color_image,
    render::export::{ExportScene, flatten},
    render::layer::LayerDraw,
    render::mask::{TemplateMask, build_template_mask},
    session::crop::CropSession,
    transform::space::LayerFrame,
};

/// Horizontal center-snap threshold during drag, in canvas units.
pub const SNAP_THRESHOLD_PX: f64 = 15.0;

/// Offset applied to each pasted layer so repeated pastes cascade.
const PASTE_OFFSET_PX: f64 = 20.0;

/// Square upload size treated as pre-sized wrap art and placed 1:1.
const NATIVE_FIT_DIM: u32 = 1024;

/// Fraction of the template's on-canvas size that a non-native upload is
/// fitted into.
const UPLOAD_FIT_FRACTION: f64 = 0.5;

/// Keyboard commands the session responds to.
///
/// An active crop session takes priority: `Enter` commits it and `Escape`
/// discards it before any other binding is considered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorKey {
    /// Commit the active crop session.
    Enter,
    /// Discard the active crop session.
    Escape,
    /// Delete the selected layer.
    Delete,
    /// Copy the selected layer to the session clipboard.
    Copy,
    /// Copy the selected layer and delete it.
    Cut,
    /// Paste the clipboard layer with a small offset.
    Paste,
}

/// Loaded template plus its current on-canvas placement.
#[derive(Clone, Debug)]
struct TemplateState {
    url: String,
    template: Template,
    placement: TemplatePlacement,
}

/// One interactive wrap-design session.
///
/// Owns all mutable editor state: the template, the layer stack, selection,
/// the clipboard, pan/zoom, caches and any in-progress crop. Pixel sources
/// are front-loaded through [`EditorSession::insert_source_bytes`]; every
/// operation after that is synchronous.
#[derive(Debug)]
pub struct EditorSession {
    viewport: Viewport,
    device_pixel_ratio: f64,
    template: Option<TemplateState>,
    base_color: Option<Color>,
    mask_enabled: bool,
    layers: LayerStack,
    sources: SourceStore,
    recolor: RecolorCache,
    crop: Option<CropSession>,
    selected: Option<String>,
    clipboard: Option<Layer>,
    dragging: Option<String>,
    center_guide_visible: bool,
    // Rebuilt lazily; dropped whenever the template transform or canvas
    // changes.
    mask_cache: Option<TemplateMask>,
    next_layer_seq: u64,
}

impl EditorSession {
    /// Open a session over a canvas of the given logical size.
    pub fn new(canvas: Canvas, device_pixel_ratio: f64) -> Self {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            viewport: Viewport::new(canvas),
            device_pixel_ratio: dpr,
            template: None,
            base_color: None,
            mask_enabled: true,
            layers: LayerStack::new(),
            sources: SourceStore::new(),
            recolor: RecolorCache::new(),
            crop: None,
            selected: None,
            clipboard: None,
            dragging: None,
            center_guide_visible: false,
            mask_cache: None,
            next_layer_seq: 1,
        }
    }

    /// Decode `bytes` and register them under `image_url` for later use by
    /// templates and layers.
    pub fn insert_source_bytes(
        &mut self,
        image_url: &str,
        bytes: &[u8],
    ) -> WrapResult<Arc<SourceImage>> {
        self.sources.insert_bytes(image_url, bytes)
    }

    /// Register an already-decoded source under `image_url`.
    pub fn insert_source(&mut self, image_url: &str, source: SourceImage) -> Arc<SourceImage> {
        self.sources.insert(image_url, source)
    }

    /// The session's source store.
    pub fn sources(&self) -> &SourceStore {
        &self.sources
    }

    /// The session's layer stack.
    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    /// The current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Load the template from a previously registered source and fit it to
    /// the canvas.
    pub fn load_template(&mut self, image_url: &str) -> WrapResult<()> {
        let source = self.sources.source(image_url)?;
        let template = Template::from_source(&source)?;
        let placement = TemplatePlacement::fit(&template, self.viewport.canvas);
        self.template = Some(TemplateState {
            url: image_url.to_string(),
            template,
            placement,
        });
        self.mask_cache = None;
        Ok(())
    }

    /// The loaded template's on-canvas placement, if any.
    pub fn template_placement(&self) -> Option<TemplatePlacement> {
        self.template.as_ref().map(|t| t.placement)
    }

    /// Resize the logical canvas.
    ///
    /// Pan/zoom reset to identity and the template is re-fitted, so the
    /// design re-centers in the new canvas.
    pub fn set_viewport_size(&mut self, canvas: Canvas) {
        self.viewport.resize(canvas);
        if let Some(state) = &mut self.template {
            state.placement = TemplatePlacement::fit(&state.template, canvas);
        }
        self.mask_cache = None;
    }

    /// Translate the viewport by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport.pan_by(delta);
    }

    /// Zoom about a screen point, clamped to the viewport's zoom bounds.
    pub fn zoom_to_point(&mut self, screen: Point, zoom: f64) {
        self.viewport.zoom_to_point(screen, zoom);
    }

    /// Add a layer for a registered source, auto-fitted and centered on the
    /// template. Returns the new layer's id; the layer becomes selected.
    ///
    /// Sources whose dimensions match the template exactly, or the standard
    /// pre-sized wrap-art dimensions, are placed at native 1:1 scale so their
    /// pixels line up with the template's. Anything else is fitted inside
    /// half the template's on-canvas extent.
    pub fn add_image_layer(&mut self, image_url: &str) -> WrapResult<String> {
        let source = self.sources.source(image_url)?;

        let (center, scale) = match &self.template {
            Some(state) => {
                let t = &state.template;
                let native = (source.width == t.width && source.height == t.height)
                    || (source.width == NATIVE_FIT_DIM && source.height == NATIVE_FIT_DIM);
                let scale = if native {
                    state.placement.scale
                } else {
                    let bounds = state.placement.bounds(t);
                    let max_w = bounds.width() * UPLOAD_FIT_FRACTION;
                    let max_h = bounds.height() * UPLOAD_FIT_FRACTION;
                    (max_w / f64::from(source.width)).min(max_h / f64::from(source.height))
                };
                (state.placement.center, scale)
            }
            None => (self.viewport.canvas.center(), 1.0),
        };

        let id = self.next_layer_id();
        let mut layer = Layer::new(id.clone(), image_url, center.x, center.y);
        layer.scale_x = scale;
        layer.scale_y = scale;
        self.layers.add(layer)?;
        self.selected = Some(id.clone());
        Ok(id)
    }

    fn next_layer_id(&mut self) -> String {
        let id = format!("layer-{}", self.next_layer_seq);
        self.next_layer_seq += 1;
        id
    }

    /// Apply a partial update to a layer.
    pub fn update_layer(&mut self, id: &str, patch: &LayerPatch) -> WrapResult<()> {
        self.layers.update(id, patch)
    }

    /// Delete a layer. Any crop session on it is discarded and its selection
    /// cleared.
    pub fn delete_layer(&mut self, id: &str) -> WrapResult<Layer> {
        if self.crop.as_ref().is_some_and(|c| c.layer_id() == id) {
            self.crop = None;
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        if self.dragging.as_deref() == Some(id) {
            self.dragging = None;
            self.center_guide_visible = false;
        }
        self.layers.delete(id)
    }

    /// Move the layer at `from` to z-index `to`.
    pub fn reorder_layers(&mut self, from: usize, to: usize) -> WrapResult<()> {
        self.layers.reorder(from, to)
    }

    /// Select a layer by id, or clear the selection.
    pub fn select(&mut self, id: Option<&str>) -> WrapResult<()> {
        if let Some(id) = id {
            if self.layers.get(id).is_none() {
                return Err(WrapError::validation(format!("unknown layer id '{id}'")));
            }
            self.selected = Some(id.to_string());
        } else {
            self.selected = None;
        }
        Ok(())
    }

    /// The selected layer's id, if any.
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Toggle a layer's horizontal mirror and select it.
    pub fn mirror_layer(&mut self, id: &str) -> WrapResult<()> {
        let flipped = !self
            .layers
            .get(id)
            .ok_or_else(|| WrapError::validation(format!("unknown layer id '{id}'")))?
            .flip_x;
        self.layers.update(
            id,
            &LayerPatch {
                flip_x: Some(flipped),
                ..LayerPatch::default()
            },
        )?;
        self.selected = Some(id.to_string());
        Ok(())
    }

    /// Set or clear the base fill color.
    pub fn set_base_color(&mut self, hex: Option<&str>) -> WrapResult<()> {
        self.base_color = match hex {
            Some(h) => Some(Color::from_hex(h)?),
            None => None,
        };
        Ok(())
    }

    /// The current base fill color.
    pub fn base_color(&self) -> Option<Color> {
        self.base_color
    }

    /// Enable or disable clipping of layers to the template's alpha.
    pub fn set_mask_enabled(&mut self, enabled: bool) {
        self.mask_enabled = enabled;
    }

    /// Whether layers clip to the template's alpha.
    pub fn mask_enabled(&self) -> bool {
        self.mask_enabled
    }

    /// Begin dragging a layer; it becomes selected.
    pub fn begin_drag(&mut self, id: &str) -> WrapResult<()> {
        self.select(Some(id))?;
        self.dragging = Some(id.to_string());
        self.center_guide_visible = false;
        Ok(())
    }

    /// Move the dragged layer to `(x, y)` in canvas coordinates.
    ///
    /// Within [`SNAP_THRESHOLD_PX`] of the template's vertical center line
    /// the layer snaps onto it and the guide becomes visible. Thresholding is
    /// in canvas units, so snapping feels the same at any zoom.
    pub fn drag_to(&mut self, x: f64, y: f64) -> WrapResult<()> {
        let id = self
            .dragging
            .clone()
            .ok_or_else(|| WrapError::validation("no drag in progress"))?;

        let mut x = x;
        self.center_guide_visible = false;
        if let Some(state) = &self.template {
            let cx = state.placement.center.x;
            if (x - cx).abs() <= SNAP_THRESHOLD_PX {
                x = cx;
                self.center_guide_visible = true;
            }
        }

        self.layers.update(
            &id,
            &LayerPatch {
                x: Some(x),
                y: Some(y),
                ..LayerPatch::default()
            },
        )
    }

    /// End the drag gesture and hide the guide.
    pub fn end_drag(&mut self) {
        self.dragging = None;
        self.center_guide_visible = false;
    }

    /// Whether the vertical center guide is showing.
    pub fn center_guide_visible(&self) -> bool {
        self.center_guide_visible
    }

    /// Rotate a layer to `degrees`, snapped to the nearest 10 degrees.
    ///
    /// Snapping happens continuously during the gesture, so intermediate
    /// angles are already multiples of 10.
    pub fn rotate_to(&mut self, id: &str, degrees: f64) -> WrapResult<()> {
        if !degrees.is_finite() {
            return Err(WrapError::validation("rotation must be finite"));
        }
        self.layers.update(
            id,
            &LayerPatch {
                rotation: Some(snap_rotation(degrees)),
                ..LayerPatch::default()
            },
        )
    }

    /// End the rotate gesture, normalizing the angle into `[0, 360)`.
    pub fn end_rotate(&mut self, id: &str) -> WrapResult<()> {
        let rotation = self
            .layers
            .get(id)
            .ok_or_else(|| WrapError::validation(format!("unknown layer id '{id}'")))?
            .rotation;
        self.layers.update(
            id,
            &LayerPatch {
                rotation: Some(normalize_rotation(rotation)),
                ..LayerPatch::default()
            },
        )
    }

    /// Copy the selected layer to the session clipboard.
    pub fn copy_selected(&mut self) -> WrapResult<()> {
        let id = self
            .selected
            .clone()
            .ok_or_else(|| WrapError::validation("no layer selected"))?;
        self.clipboard = self.layers.get(&id).cloned();
        Ok(())
    }

    /// Copy the selected layer to the clipboard and delete it.
    pub fn cut_selected(&mut self) -> WrapResult<()> {
        self.copy_selected()?;
        let id = self
            .selected
            .clone()
            .ok_or_else(|| WrapError::validation("no layer selected"))?;
        self.delete_layer(&id)?;
        Ok(())
    }

    /// Paste the clipboard layer as a new top-most layer, offset by 20px.
    ///
    /// The stored clipboard position advances by the same offset, so repeated
    /// pastes cascade diagonally. Returns the new layer's id, or `None` when
    /// the clipboard is empty.
    pub fn paste(&mut self) -> WrapResult<Option<String>> {
        let Some(stored) = &mut self.clipboard else {
            return Ok(None);
        };
        stored.x += PASTE_OFFSET_PX;
        stored.y += PASTE_OFFSET_PX;
        let mut layer = stored.clone();

        let id = self.next_layer_id();
        layer.id = id.clone();
        self.layers.add(layer)?;
        self.selected = Some(id.clone());
        Ok(Some(id))
    }

    /// Open a crop session on a layer, replacing any previous session.
    pub fn start_crop(&mut self, id: &str) -> WrapResult<()> {
        let layer = self
            .layers
            .get(id)
            .ok_or_else(|| WrapError::validation(format!("unknown layer id '{id}'")))?
            .clone();
        let source = self.sources.source(&layer.image_url)?;
        self.crop = Some(CropSession::start(&layer, &source));
        self.selected = Some(id.to_string());
        Ok(())
    }

    /// The active crop session, if any.
    pub fn crop_session(&self) -> Option<&CropSession> {
        self.crop.as_ref()
    }

    /// Move the crop rectangle.
    pub fn crop_move_to(&mut self, x: f64, y: f64) -> WrapResult<()> {
        let session = self
            .crop
            .as_mut()
            .ok_or_else(|| WrapError::validation("no crop session active"))?;
        session.move_to(x, y);
        Ok(())
    }

    /// Scale the crop rectangle by gesture factors.
    pub fn crop_resize_by(&mut self, scale_x: f64, scale_y: f64) -> WrapResult<()> {
        let session = self
            .crop
            .as_mut()
            .ok_or_else(|| WrapError::validation("no crop session active"))?;
        session.resize_by(scale_x, scale_y);
        Ok(())
    }

    /// Reset the crop rectangle to the full image.
    pub fn crop_reset(&mut self) -> WrapResult<()> {
        let session = self
            .crop
            .as_mut()
            .ok_or_else(|| WrapError::validation("no crop session active"))?;
        session.reset();
        Ok(())
    }

    /// Commit the active crop session to its layer.
    pub fn apply_crop(&mut self) -> WrapResult<()> {
        let session = self
            .crop
            .take()
            .ok_or_else(|| WrapError::validation("no crop session active"))?;
        self.layers.update(session.layer_id(), &session.apply())
    }

    /// Discard the active crop session, leaving the layer unchanged.
    pub fn cancel_crop(&mut self) {
        self.crop = None;
    }

    /// Dispatch a keyboard command.
    pub fn handle_key(&mut self, key: EditorKey) -> WrapResult<()> {
        // A crop session swallows every key; only Enter and Escape act.
        if self.crop.is_some() {
            return match key {
                EditorKey::Enter => self.apply_crop(),
                EditorKey::Escape => {
                    self.cancel_crop();
                    Ok(())
                }
                _ => Ok(()),
            };
        }
        match key {
            EditorKey::Enter | EditorKey::Escape => Ok(()),
            EditorKey::Delete => {
                if let Some(id) = self.selected.clone() {
                    self.delete_layer(&id)?;
                }
                Ok(())
            }
            EditorKey::Copy => {
                if self.selected.is_some() {
                    self.copy_selected()?;
                }
                Ok(())
            }
            EditorKey::Cut => {
                if self.selected.is_some() {
                    self.cut_selected()?;
                }
                Ok(())
            }
            EditorKey::Paste => self.paste().map(|_| ()),
        }
    }

    /// Snapshot the session as a persistable design document.
    pub fn to_design(&self) -> Option<WrapDesign> {
        let template = self.template.as_ref()?;
        Some(WrapDesign {
            template_url: template.url.clone(),
            base_color: self.base_color.map(Color::to_hex),
            layers: self.layers.iter().cloned().collect(),
        })
    }

    /// Rebuild session state from a design document.
    ///
    /// Every referenced source, the template's included, must already be
    /// registered. Existing layers, selection and clipboard are replaced.
    pub fn load_design(&mut self, design: &WrapDesign) -> WrapResult<()> {
        self.load_template(&design.template_url)?;
        self.base_color = match &design.base_color {
            Some(hex) => Some(Color::from_hex(hex)?),
            None => None,
        };
        let mut layers = LayerStack::new();
        let mut max_seq = 0u64;
        for layer in &design.layers {
            self.sources.source(&layer.image_url)?;
            if let Some(n) = layer
                .id
                .strip_prefix("layer-")
                .and_then(|s| s.parse::<u64>().ok())
            {
                max_seq = max_seq.max(n);
            }
            layers.add(layer.clone())?;
        }
        self.layers = layers;
        self.next_layer_seq = self.next_layer_seq.max(max_seq + 1);
        self.selected = None;
        self.clipboard = None;
        self.crop = None;
        Ok(())
    }

    fn ensure_mask(&mut self) -> WrapResult<()> {
        if self.mask_cache.is_some() {
            return Ok(());
        }
        let Some(state) = &self.template else {
            return Ok(());
        };
        self.mask_cache = Some(build_template_mask(
            &state.template,
            &state.placement,
            self.viewport.canvas,
            self.device_pixel_ratio,
        )?);
        Ok(())
    }

    /// Flatten the design to a straight-alpha frame at the template's native
    /// resolution, independent of the current pan/zoom.
    ///
    /// Returns `None` when no template is loaded. A layer whose source cannot
    /// be resolved is logged and skipped rather than failing the export; the
    /// layer under an active crop session is excluded, matching what the
    /// editor shows while cropping.
    #[tracing::instrument(skip(self))]
    pub fn export_image(&mut self) -> WrapResult<Option<FrameRgba>> {
        if self.template.is_none() {
            return Ok(None);
        }
        if self.mask_enabled {
            self.ensure_mask()?;
        }

        let crop_layer = self.crop.as_ref().map(|c| c.layer_id().to_string());

        // Resolve every layer's effective pixels up front; rasterization
        // below borrows them immutably.
        let mut resolved: Vec<(LayerFrame, Arc<SourceImage>, &Layer)> = Vec::new();
        for layer in self.layers.iter() {
            if crop_layer.as_deref() == Some(layer.id.as_str()) {
                continue;
            }
            match self.recolor.effective_source(
                &mut self.sources,
                &layer.image_url,
                layer.recolor.as_deref(),
                layer.total_recolor,
            ) {
                Ok(source) => resolved.push((LayerFrame::from_layer(layer), source, layer)),
                Err(err) => {
                    tracing::warn!(layer = %layer.id, %err, "skipping layer with unresolvable source");
                }
            }
        }

        let state = match &self.template {
            Some(state) => state,
            None => return Ok(None),
        };
        let mask = if self.mask_enabled {
            self.mask_cache.as_ref()
        } else {
            None
        };
        let fill = self
            .base_color
            .map(|color| base_color_image(&state.template, color));

        let scene = ExportScene {
            template: &state.template,
            placement: state.placement,
            base_color: fill.as_ref(),
            layers: resolved
                .iter()
                .map(|(frame, source, layer)| LayerDraw {
                    frame: *frame,
                    source: source.as_ref(),
                    crop: layer.crop,
                    opacity: layer.opacity,
                    mask,
                })
                .collect(),
        };

        flatten(&scene).map(Some)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
