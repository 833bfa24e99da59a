use std::sync::Arc;

use super::*;
use crate::assets::store::SourceStore;

fn source_2px() -> SourceImage {
    // One opaque gray pixel, one fully transparent pixel with stale RGB.
    SourceImage::from_rgba8(2, 1, vec![128, 128, 128, 200, 77, 66, 55, 0]).unwrap()
}

#[test]
fn total_replaces_rgb_and_keeps_alpha() {
    let out = recolor_source(&source_2px(), Color { r: 10, g: 20, b: 30 }, true);
    assert_eq!(out.pixel(0, 0), [10, 20, 30, 200]);
}

#[test]
fn tint_multiplies_channels() {
    let out = recolor_source(
        &source_2px(),
        Color {
            r: 255,
            g: 0,
            b: 128,
        },
        false,
    );
    let px = out.pixel(0, 0);
    assert_eq!(px[0], 128);
    assert_eq!(px[1], 0);
    assert_eq!(px[2], 64); // (128 * 128 + 127) / 255
    assert_eq!(px[3], 200);
}

#[test]
fn transparent_pixels_stay_untouched() {
    let out = recolor_source(&source_2px(), Color { r: 1, g: 2, b: 3 }, true);
    assert_eq!(out.pixel(1, 0), [77, 66, 55, 0]);
}

#[test]
fn cache_hits_skip_the_provider() {
    let mut store = SourceStore::new();
    store.insert("img://a", source_2px());

    let mut cache = RecolorCache::new();
    let first = cache
        .effective_source(&mut store, "img://a", Some("#ff0000"), true)
        .unwrap();
    assert_eq!(cache.len(), 1);

    let second = cache
        .effective_source(&mut store, "img://a", Some("#F00"), true)
        .unwrap();
    assert_eq!(cache.len(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn no_recolor_returns_plain_source() {
    let mut store = SourceStore::new();
    let original = store.insert("img://a", source_2px());

    let mut cache = RecolorCache::new();
    let out = cache
        .effective_source(&mut store, "img://a", None, false)
        .unwrap();
    assert!(Arc::ptr_eq(&original, &out));
    assert!(cache.is_empty());
}

#[test]
fn bad_hex_fails_soft_to_plain_source() {
    let mut store = SourceStore::new();
    let original = store.insert("img://a", source_2px());

    let mut cache = RecolorCache::new();
    let out = cache
        .effective_source(&mut store, "img://a", Some("#nothex"), false)
        .unwrap();
    assert!(Arc::ptr_eq(&original, &out));
    assert!(cache.is_empty());
}

#[test]
fn tint_and_total_cache_separately() {
    let mut store = SourceStore::new();
    store.insert("img://a", source_2px());

    let mut cache = RecolorCache::new();
    cache
        .effective_source(&mut store, "img://a", Some("#123456"), true)
        .unwrap();
    cache
        .effective_source(&mut store, "img://a", Some("#123456"), false)
        .unwrap();
    assert_eq!(cache.len(), 2);
}
