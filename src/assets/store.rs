use std::{collections::HashMap, sync::Arc};

use crate::{
    assets::decode::{SourceImage, decode_image},
    foundation::error::{WrapError, WrapResult},
};

/// Seam through which renderers and filters obtain decoded sources.
///
/// Implemented by [`SourceStore`] in production; tests substitute doubles to
/// observe decode counts.
pub trait SourceProvider {
    /// Return the decoded source for `image_url`.
    fn source(&mut self, image_url: &str) -> WrapResult<Arc<SourceImage>>;
}

/// Per-session cache of decoded sources keyed by image URL.
///
/// The embedding application front-loads IO: it fetches bytes (data URI, file,
/// network) and hands them to [`SourceStore::insert_bytes`]. Everything
/// downstream of the store is synchronous and IO-free.
#[derive(Clone, Debug, Default)]
pub struct SourceStore {
    sources: HashMap<String, Arc<SourceImage>>,
    decode_count: u64,
}

impl SourceStore {
    /// Construct an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `bytes` and register the result under `image_url`.
    ///
    /// Re-inserting an already-known URL replaces the previous source.
    pub fn insert_bytes(&mut self, image_url: &str, bytes: &[u8]) -> WrapResult<Arc<SourceImage>> {
        let decoded = Arc::new(decode_image(bytes)?);
        self.decode_count += 1;
        self.sources.insert(image_url.to_string(), decoded.clone());
        Ok(decoded)
    }

    /// Register an already-decoded source under `image_url`.
    pub fn insert(&mut self, image_url: &str, source: SourceImage) -> Arc<SourceImage> {
        let arc = Arc::new(source);
        self.sources.insert(image_url.to_string(), arc.clone());
        arc
    }

    /// Whether a source is registered under `image_url`.
    pub fn contains(&self, image_url: &str) -> bool {
        self.sources.contains_key(image_url)
    }

    /// Number of decode calls performed by this store.
    pub fn decode_count(&self) -> u64 {
        self.decode_count
    }
}

impl SourceProvider for SourceStore {
    fn source(&mut self, image_url: &str) -> WrapResult<Arc<SourceImage>> {
        self.sources
            .get(image_url)
            .cloned()
            .ok_or_else(|| WrapError::decode(format!("no source registered for '{image_url}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
