use super::*;

#[test]
fn over_opacity_0_is_noop() {
    let dst = [1, 2, 3, 4];
    let src = [200, 200, 200, 200];
    assert_eq!(over(dst, src, 0.0), dst);
}

#[test]
fn over_src_alpha_0_is_noop() {
    let dst = [10, 20, 30, 40];
    let src = [255, 255, 255, 0];
    assert_eq!(over(dst, src, 1.0), dst);
}

#[test]
fn over_src_opaque_replaces_dst() {
    let dst = [0, 0, 0, 255];
    let src = [255, 0, 0, 255];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_dst_transparent_returns_scaled_src() {
    let dst = [0, 0, 0, 0];
    let src = [100, 110, 120, 200];
    assert_eq!(over(dst, src, 1.0), src);
}

#[test]
fn over_half_opacity_halves_src() {
    let dst = [0, 0, 0, 0];
    let src = [200, 100, 50, 255];
    let out = over(dst, src, 0.5);
    assert_eq!(out[3], 128);
    assert_eq!(out[0], 100);
}

#[test]
fn surface_rejects_overflowing_dimensions() {
    assert!(Surface::new(u32::MAX, u32::MAX).is_err());
    assert!(Surface::new(4, 4).is_ok());
}

#[test]
fn surface_pixel_outside_is_transparent() {
    let s = Surface::new(2, 2).unwrap();
    assert_eq!(s.pixel(0, 0), [0, 0, 0, 0]);
    assert_eq!(s.pixel(2, 0), [0, 0, 0, 0]);
}

#[test]
fn into_straight_recovers_flat_fill() {
    let mut s = Surface::new(1, 1).unwrap();
    // White at half alpha, premultiplied.
    s.data.copy_from_slice(&[128, 128, 128, 128]);
    let straight = s.into_straight_rgba8();
    assert_eq!(straight, vec![255, 255, 255, 128]);
}

#[test]
fn unpremultiply_leaves_transparent_black() {
    let mut px = vec![0u8, 0, 0, 0];
    unpremultiply_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0]);
}
