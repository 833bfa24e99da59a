use crate::foundation::error::{WrapError, WrapResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Logical editor canvas dimensions in CSS-style pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in logical pixels.
    pub width: u32,
    /// Height in logical pixels.
    pub height: u32,
}

impl Canvas {
    /// Construct a canvas, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> WrapResult<Self> {
        if width == 0 || height == 0 {
            return Err(WrapError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Canvas center point.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Opaque RGB color parsed from a hex string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Parse a 3- or 6-digit hex color, with or without a leading `#`.
    ///
    /// 3-digit colors expand per CSS rules (`#f03` -> `#ff0033`).
    pub fn from_hex(hex: &str) -> WrapResult<Self> {
        let cleaned = hex.trim().trim_start_matches('#');
        let expanded: String = match cleaned.len() {
            3 => cleaned.chars().flat_map(|c| [c, c]).collect(),
            6 => cleaned.to_string(),
            _ => {
                return Err(WrapError::validation(format!(
                    "hex color must have 3 or 6 digits, got '{hex}'"
                )));
            }
        };
        let value = u32::from_str_radix(&expanded, 16)
            .map_err(|_| WrapError::validation(format!("invalid hex color '{hex}'")))?;
        Ok(Self {
            r: ((value >> 16) & 255) as u8,
            g: ((value >> 8) & 255) as u8,
            b: (value & 255) as u8,
        })
    }

    /// Render as a lowercase 6-digit `#rrggbb` string.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8Premul {
    /// Red channel, premultiplied.
    pub r: u8,
    /// Green channel, premultiplied.
    pub g: u8,
    /// Blue channel, premultiplied.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent pixel.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Premultiply a straight-alpha pixel.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        use crate::foundation::math::premul_channel;
        Self {
            r: premul_channel(r, a),
            g: premul_channel(g, a),
            b: premul_channel(b, a),
            a,
        }
    }
}

/// A flattened RGBA8 frame returned by the exporter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgba {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major RGBA8.
    pub data: Vec<u8>,
    /// Whether `data` carries premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRgba {
    /// Convert into an [`image::RgbaImage`] for encoding (PNG etc.).
    ///
    /// Requires straight (non-premultiplied) pixel data.
    pub fn to_rgba_image(&self) -> WrapResult<image::RgbaImage> {
        if self.premultiplied {
            return Err(WrapError::render(
                "frame must be unpremultiplied before encoding",
            ));
        }
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| WrapError::render("frame byte length does not match dimensions"))
    }
}

/// Zoom bounds matching the interactive editor.
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 5.0;

/// Interactive pan/zoom state over the editor canvas.
///
/// The viewport affects on-screen display only; the exporter always renders in
/// template space and never consults it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Canvas dimensions the viewport maps onto.
    pub canvas: Canvas,
    /// Uniform zoom factor, clamped to `[0.1, 5.0]`.
    pub zoom: f64,
    /// Pan offset in screen pixels.
    pub pan: Vec2,
}

impl Viewport {
    /// Identity viewport over `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            zoom: 1.0,
            pan: Vec2::ZERO,
        }
    }

    /// Resize the canvas and reset pan/zoom to identity.
    pub fn resize(&mut self, canvas: Canvas) {
        self.canvas = canvas;
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
    }

    /// Translate the viewport by a screen-space delta.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Set zoom while keeping the given screen point fixed on the same canvas point.
    pub fn zoom_to_point(&mut self, screen: Point, zoom: f64) {
        let zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        let ratio = zoom / self.zoom;
        self.pan = screen.to_vec2() - (screen.to_vec2() - self.pan) * ratio;
        self.zoom = zoom;
    }

    /// Canvas-to-screen affine for this viewport.
    pub fn to_affine(&self) -> Affine {
        Affine::new([self.zoom, 0.0, 0.0, self.zoom, self.pan.x, self.pan.y])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
