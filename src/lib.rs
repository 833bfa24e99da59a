//! Wraptex is a compositing engine for vehicle wrap textures.
//!
//! A wrap design is a UV-unwrap template, an optional base fill color and an
//! ordered stack of user-placed image layers. Wraptex turns that design into
//! pixels, both interactively (per-layer transforms, cropping, recoloring,
//! template-alpha clipping) and for final output (a flattened frame at the
//! template's exact native resolution).
//!
//! # Pipeline overview
//!
//! 1. **Load**: decoded sources are front-loaded into a [`SourceStore`]
//! 2. **Edit**: an [`EditorSession`] mutates the layer stack through
//!    validated operations (gestures, crop sessions, clipboard, recolor)
//! 3. **Export**: [`EditorSession::export_image`] flattens the design in
//!    template space, independent of the on-screen pan/zoom
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **No IO in renderers**: external IO is front-loaded in [`SourceStore`].
//! - **Premultiplied RGBA8** on compositing surfaces; decoded sources and
//!   exported frames carry straight alpha.
//! - **One coordinate mapper**: forward rendering and inverse crop math both
//!   go through [`LayerFrame`], so they cannot disagree.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod effects;
mod foundation;
mod model;
mod render;
mod session;
mod transform;

pub use assets::decode::{SourceImage, decode_image};
pub use assets::store::{SourceProvider, SourceStore};
pub use effects::recolor::{RecolorCache, RecolorKey, recolor_source};
pub use foundation::core::{
    Affine, Canvas, Color, FrameRgba, Point, Rect, Rgba8Premul, Vec2, Viewport,
};
pub use foundation::error::{WrapError, WrapResult};
pub use model::layer::{
    Layer, LayerPatch, LayerStack, ROTATION_SNAP_DEG, SourceRect, WrapDesign, normalize_rotation,
    snap_rotation,
};
pub use model::template::{Template, TemplatePlacement};
pub use render::base_color::base_color_image;
pub use render::composite::{PremulRgba8, Surface, over, unpremultiply_in_place};
pub use render::export::{ExportScene, flatten};
pub use render::layer::{LayerDraw, draw_layer};
pub use render::mask::{TemplateMask, build_template_mask};
pub use session::crop::CropSession;
pub use session::editor::{EditorKey, EditorSession, SNAP_THRESHOLD_PX};
pub use transform::space::LayerFrame;
