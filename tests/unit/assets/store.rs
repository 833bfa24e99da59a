use std::io::Cursor;

use super::*;

fn png_1x1(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(1, 1, rgba.to_vec()).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn insert_bytes_registers_and_counts() {
    let mut store = SourceStore::new();
    assert_eq!(store.decode_count(), 0);
    store.insert_bytes("img://a", &png_1x1([1, 2, 3, 255])).unwrap();
    assert!(store.contains("img://a"));
    assert_eq!(store.decode_count(), 1);
}

#[test]
fn reinsert_replaces_previous_source() {
    let mut store = SourceStore::new();
    store.insert_bytes("img://a", &png_1x1([1, 2, 3, 255])).unwrap();
    store.insert_bytes("img://a", &png_1x1([9, 9, 9, 255])).unwrap();
    let src = store.source("img://a").unwrap();
    assert_eq!(src.pixel(0, 0), [9, 9, 9, 255]);
    assert_eq!(store.decode_count(), 2);
}

#[test]
fn source_errors_on_unknown_url() {
    let mut store = SourceStore::new();
    let err = store.source("img://missing").unwrap_err();
    assert!(err.to_string().contains("img://missing"));
}

#[test]
fn insert_decoded_skips_decode_counter() {
    let mut store = SourceStore::new();
    let src = SourceImage::from_rgba8(1, 1, vec![0, 0, 0, 0]).unwrap();
    store.insert("img://pre", src);
    assert!(store.contains("img://pre"));
    assert_eq!(store.decode_count(), 0);
}
