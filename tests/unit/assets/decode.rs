use std::io::Cursor;

use super::*;

#[test]
fn decode_image_png_keeps_straight_alpha() {
    let src_rgba = vec![100u8, 50u8, 200u8, 128u8];
    let img = image::RgbaImage::from_raw(1, 1, src_rgba.clone()).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let decoded = decode_image(&buf).unwrap();
    assert_eq!(decoded.width, 1);
    assert_eq!(decoded.height, 1);
    assert_eq!(decoded.rgba8.as_slice(), src_rgba.as_slice());
}

#[test]
fn decode_rejects_garbage() {
    assert!(decode_image(b"not an image").is_err());
}

#[test]
fn from_rgba8_checks_byte_length() {
    assert!(SourceImage::from_rgba8(2, 2, vec![0u8; 16]).is_ok());
    assert!(SourceImage::from_rgba8(2, 2, vec![0u8; 15]).is_err());
}

#[test]
fn pixel_is_transparent_outside_bounds() {
    let src = SourceImage::from_rgba8(1, 1, vec![9, 8, 7, 6]).unwrap();
    assert_eq!(src.pixel(0, 0), [9, 8, 7, 6]);
    assert_eq!(src.pixel(1, 0), [0, 0, 0, 0]);
    assert_eq!(src.pixel(0, 9), [0, 0, 0, 0]);
}
