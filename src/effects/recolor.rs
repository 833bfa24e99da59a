use std::{collections::HashMap, sync::Arc};

use crate::{
    assets::decode::SourceImage,
    assets::store::SourceProvider,
    foundation::core::Color,
    foundation::error::WrapResult,
    foundation::math::mul_div255_u8,
};

/// Recolor every non-transparent pixel of `src` toward `color`.
///
/// `total` replaces RGB outright; otherwise each channel is tint-multiplied by
/// the corresponding color channel and rounded. Alpha is preserved per pixel,
/// and fully transparent pixels are left untouched.
pub fn recolor_source(src: &SourceImage, color: Color, total: bool) -> SourceImage {
    let mut out = src.rgba8.as_ref().clone();
    for px in out.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        if total {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
        } else {
            px[0] = mul_div255_u8(u16::from(px[0]), u16::from(color.r));
            px[1] = mul_div255_u8(u16::from(px[1]), u16::from(color.g));
            px[2] = mul_div255_u8(u16::from(px[2]), u16::from(color.b));
        }
    }
    SourceImage {
        width: src.width,
        height: src.height,
        rgba8: Arc::new(out),
    }
}

/// Identity key of a recolored source.
///
/// The color is stored normalized, so `#F00` and `#ff0000` share an entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecolorKey {
    /// Source image URL.
    pub image_url: String,
    /// Normalized target color.
    pub color: Color,
    /// Tint vs. total replacement.
    pub total: bool,
}

/// Append-only cache of recolored sources, owned by the design session.
///
/// Never invalidated for the session's lifetime; identical requests return the
/// cached buffer without touching the source provider again.
#[derive(Clone, Debug, Default)]
pub struct RecolorCache {
    entries: HashMap<RecolorKey, Arc<SourceImage>>,
}

impl RecolorCache {
    /// Construct an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup a cached recolored source.
    pub fn get(&self, key: &RecolorKey) -> Option<Arc<SourceImage>> {
        self.entries.get(key).cloned()
    }

    /// Insert a recolored source.
    pub fn set(&mut self, key: RecolorKey, value: Arc<SourceImage>) {
        self.entries.insert(key, value);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the effective source for a layer: recolored when `recolor` is
    /// set, the plain decoded source otherwise.
    ///
    /// On a cache miss the source is pulled from `provider` once and the
    /// recolored result cached. An unparseable recolor color fails soft: the
    /// unmodified source is returned so the layer stays visible.
    pub fn effective_source<P: SourceProvider + ?Sized>(
        &mut self,
        provider: &mut P,
        image_url: &str,
        recolor: Option<&str>,
        total: bool,
    ) -> WrapResult<Arc<SourceImage>> {
        let Some(hex) = recolor else {
            return provider.source(image_url);
        };

        let color = match Color::from_hex(hex) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(%image_url, %hex, %err, "unparseable recolor color, using plain source");
                return provider.source(image_url);
            }
        };

        let key = RecolorKey {
            image_url: image_url.to_string(),
            color,
            total,
        };
        if let Some(cached) = self.get(&key) {
            return Ok(cached);
        }

        let src = provider.source(image_url)?;
        let recolored = Arc::new(recolor_source(&src, color, total));
        self.set(key, recolored.clone());
        Ok(recolored)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/recolor.rs"]
mod tests;
