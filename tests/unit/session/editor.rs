use super::*;

fn solid_source(w: u32, h: u32, rgba: [u8; 4]) -> SourceImage {
    let mut bytes = Vec::with_capacity((w * h * 4) as usize);
    for _ in 0..w * h {
        bytes.extend_from_slice(&rgba);
    }
    SourceImage::from_rgba8(w, h, bytes).unwrap()
}

fn session_with_template(canvas_w: u32, canvas_h: u32, tpl_w: u32, tpl_h: u32) -> EditorSession {
    let mut s = EditorSession::new(Canvas::new(canvas_w, canvas_h).unwrap(), 1.0);
    s.insert_source("tpl://van", solid_source(tpl_w, tpl_h, [128, 128, 128, 255]));
    s.load_template("tpl://van").unwrap();
    s
}

#[test]
fn template_fits_and_centers_on_load() {
    let s = session_with_template(512, 512, 1024, 1024);
    let p = s.template_placement().unwrap();
    assert_eq!(p.scale, 0.5);
    assert_eq!(p.center, Point::new(256.0, 256.0));
}

#[test]
fn matching_upload_is_placed_native() {
    let mut s = session_with_template(512, 512, 1024, 1024);
    s.insert_source("img://art", solid_source(1024, 1024, [255, 0, 0, 255]));
    let id = s.add_image_layer("img://art").unwrap();
    let layer = s.layers().get(&id).unwrap();
    // Native placement: one source pixel per template pixel on canvas.
    assert_eq!(layer.scale_x, 0.5);
    assert_eq!((layer.x, layer.y), (256.0, 256.0));
    assert_eq!(s.selected_id(), Some(id.as_str()));
}

#[test]
fn odd_sized_upload_fits_in_half_the_template() {
    let mut s = session_with_template(512, 512, 1024, 1024);
    s.insert_source("img://photo", solid_source(100, 50, [0, 255, 0, 255]));
    let id = s.add_image_layer("img://photo").unwrap();
    let layer = s.layers().get(&id).unwrap();
    // Template displays at 512; half of that is 256 canvas units.
    assert_eq!(layer.scale_x, 2.56);
    assert_eq!(layer.scale_y, 2.56);
}

#[test]
fn layer_ids_are_sequential() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(4, 4, [1, 1, 1, 255]));
    let a = s.add_image_layer("img://a").unwrap();
    let b = s.add_image_layer("img://a").unwrap();
    assert_eq!(a, "layer-1");
    assert_eq!(b, "layer-2");
}

#[test]
fn drag_snaps_to_template_center_line() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(4, 4, [1, 1, 1, 255]));
    let id = s.add_image_layer("img://a").unwrap();

    s.begin_drag(&id).unwrap();
    s.drag_to(265.0, 300.0).unwrap();
    assert_eq!(s.layers().get(&id).unwrap().x, 256.0);
    assert!(s.center_guide_visible());

    s.drag_to(300.0, 300.0).unwrap();
    assert_eq!(s.layers().get(&id).unwrap().x, 300.0);
    assert!(!s.center_guide_visible());

    s.end_drag();
    assert!(!s.center_guide_visible());
}

#[test]
fn drag_requires_begin() {
    let mut s = session_with_template(512, 512, 64, 64);
    assert!(s.drag_to(10.0, 10.0).is_err());
}

#[test]
fn rotation_snaps_to_ten_degrees() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(4, 4, [1, 1, 1, 255]));
    let id = s.add_image_layer("img://a").unwrap();

    s.rotate_to(&id, 47.0).unwrap();
    assert_eq!(s.layers().get(&id).unwrap().rotation, 50.0);

    s.rotate_to(&id, -14.0).unwrap();
    assert_eq!(s.layers().get(&id).unwrap().rotation, -10.0);
    s.end_rotate(&id).unwrap();
    assert_eq!(s.layers().get(&id).unwrap().rotation, 350.0);
}

#[test]
fn paste_cascades_by_twenty() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(4, 4, [1, 1, 1, 255]));
    let id = s.add_image_layer("img://a").unwrap();
    let (x0, y0) = {
        let l = s.layers().get(&id).unwrap();
        (l.x, l.y)
    };

    s.copy_selected().unwrap();
    let p1 = s.paste().unwrap().unwrap();
    let p2 = s.paste().unwrap().unwrap();
    assert_ne!(p1, p2);
    assert_eq!(s.layers().len(), 3);

    let l1 = s.layers().get(&p1).unwrap();
    let l2 = s.layers().get(&p2).unwrap();
    assert_eq!((l1.x, l1.y), (x0 + 20.0, y0 + 20.0));
    assert_eq!((l2.x, l2.y), (x0 + 40.0, y0 + 40.0));
    assert_eq!(s.selected_id(), Some(p2.as_str()));
}

#[test]
fn empty_clipboard_paste_is_a_noop() {
    let mut s = session_with_template(512, 512, 64, 64);
    assert_eq!(s.paste().unwrap(), None);
}

#[test]
fn cut_removes_and_keeps_clipboard() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(4, 4, [1, 1, 1, 255]));
    s.add_image_layer("img://a").unwrap();
    s.cut_selected().unwrap();
    assert!(s.layers().is_empty());
    assert!(s.paste().unwrap().is_some());
    assert_eq!(s.layers().len(), 1);
}

#[test]
fn delete_clears_selection_and_crop() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(4, 4, [1, 1, 1, 255]));
    let id = s.add_image_layer("img://a").unwrap();
    s.start_crop(&id).unwrap();
    assert!(s.crop_session().is_some());

    s.delete_layer(&id).unwrap();
    assert!(s.crop_session().is_none());
    assert_eq!(s.selected_id(), None);
}

#[test]
fn enter_commits_crop_before_other_bindings() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(40, 40, [1, 1, 1, 255]));
    let id = s.add_image_layer("img://a").unwrap();
    s.start_crop(&id).unwrap();
    s.crop_resize_by(0.5, 0.5).unwrap();

    s.handle_key(EditorKey::Enter).unwrap();
    assert!(s.crop_session().is_none());
    let crop = s.layers().get(&id).unwrap().crop.unwrap();
    assert_eq!((crop.width, crop.height), (20, 20));
}

#[test]
fn escape_discards_crop() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(40, 40, [1, 1, 1, 255]));
    let id = s.add_image_layer("img://a").unwrap();
    s.start_crop(&id).unwrap();
    s.crop_resize_by(0.5, 0.5).unwrap();

    s.handle_key(EditorKey::Escape).unwrap();
    assert!(s.crop_session().is_none());
    assert_eq!(s.layers().get(&id).unwrap().crop, None);
}

#[test]
fn delete_key_only_acts_outside_crop() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(4, 4, [1, 1, 1, 255]));
    let id = s.add_image_layer("img://a").unwrap();
    s.start_crop(&id).unwrap();

    s.handle_key(EditorKey::Delete).unwrap();
    assert_eq!(s.layers().len(), 1);

    s.cancel_crop();
    s.handle_key(EditorKey::Delete).unwrap();
    assert!(s.layers().is_empty());
}

#[test]
fn clipboard_keys_are_inert_during_crop() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(4, 4, [1, 1, 1, 255]));
    let id = s.add_image_layer("img://a").unwrap();
    s.start_crop(&id).unwrap();

    s.handle_key(EditorKey::Copy).unwrap();
    s.handle_key(EditorKey::Paste).unwrap();
    s.handle_key(EditorKey::Cut).unwrap();
    assert_eq!(s.layers().len(), 1);
    assert!(s.crop_session().is_some());

    // Nothing was copied while the session was live.
    s.cancel_crop();
    assert_eq!(s.paste().unwrap(), None);
}

#[test]
fn mirror_toggles_and_selects() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(4, 4, [1, 1, 1, 255]));
    let id = s.add_image_layer("img://a").unwrap();
    s.select(None).unwrap();

    s.mirror_layer(&id).unwrap();
    assert!(s.layers().get(&id).unwrap().flip_x);
    assert_eq!(s.selected_id(), Some(id.as_str()));

    s.mirror_layer(&id).unwrap();
    assert!(!s.layers().get(&id).unwrap().flip_x);
}

#[test]
fn base_color_parses_and_clears() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.set_base_color(Some("#ff0000")).unwrap();
    assert_eq!(s.base_color().unwrap().to_hex(), "#ff0000");
    assert!(s.set_base_color(Some("nope")).is_err());
    s.set_base_color(None).unwrap();
    assert_eq!(s.base_color(), None);
}

#[test]
fn viewport_resize_refits_template() {
    let mut s = session_with_template(512, 512, 1024, 1024);
    s.zoom_to_point(Point::new(10.0, 10.0), 2.0);
    s.set_viewport_size(Canvas::new(256, 256).unwrap());
    assert_eq!(s.viewport().zoom, 1.0);
    assert_eq!(s.template_placement().unwrap().scale, 0.25);
}

#[test]
fn export_without_template_is_none() {
    let mut s = EditorSession::new(Canvas::new(64, 64).unwrap(), 1.0);
    assert!(s.export_image().unwrap().is_none());
}

#[test]
fn export_is_native_resolution() {
    let mut s = session_with_template(512, 512, 100, 40);
    let frame = s.export_image().unwrap().unwrap();
    assert_eq!((frame.width, frame.height), (100, 40));
    assert!(!frame.premultiplied);
}

#[test]
fn export_excludes_layer_under_active_crop() {
    let mut s = session_with_template(4, 4, 4, 4);
    s.insert_source("img://a", solid_source(4, 4, [255, 0, 0, 255]));
    let id = s.add_image_layer("img://a").unwrap();

    s.start_crop(&id).unwrap();
    let during = s.export_image().unwrap().unwrap();
    // Only the gray template shows while the layer is being cropped.
    assert_eq!(&during.data[0..4], &[128, 128, 128, 255]);

    s.cancel_crop();
    let after = s.export_image().unwrap().unwrap();
    assert_eq!(&after.data[0..4], &[255, 0, 0, 255]);
}

#[test]
fn mask_clips_layers_to_template_alpha() {
    let mut s = EditorSession::new(Canvas::new(4, 4).unwrap(), 1.0);
    s.insert_source("tpl://holes", solid_source(4, 4, [0, 0, 0, 0]));
    s.load_template("tpl://holes").unwrap();
    s.insert_source("img://a", solid_source(4, 4, [255, 0, 0, 255]));
    s.add_image_layer("img://a").unwrap();

    let masked = s.export_image().unwrap().unwrap();
    assert!(masked.data.chunks_exact(4).all(|px| px[3] == 0));

    s.set_mask_enabled(false);
    let unmasked = s.export_image().unwrap().unwrap();
    assert_eq!(&unmasked.data[0..4], &[255, 0, 0, 255]);
}

#[test]
fn mask_toggle_round_trip_is_idempotent() {
    let make = || {
        let mut s = session_with_template(4, 4, 4, 4);
        s.insert_source("img://a", solid_source(4, 4, [255, 0, 0, 255]));
        s.add_image_layer("img://a").unwrap();
        s
    };

    let mut untouched = make();
    let reference = untouched.export_image().unwrap().unwrap();

    let mut toggled = make();
    toggled.set_mask_enabled(false);
    toggled.set_mask_enabled(true);
    let after_round_trip = toggled.export_image().unwrap().unwrap();
    assert_eq!(reference.data, after_round_trip.data);

    // Toggling after a masked export must not leave stale state either.
    toggled.set_mask_enabled(false);
    toggled.export_image().unwrap().unwrap();
    toggled.set_mask_enabled(true);
    let again = toggled.export_image().unwrap().unwrap();
    assert_eq!(reference.data, again.data);
}

#[test]
fn repeated_recolor_export_decodes_and_recolors_once() {
    let mut s = session_with_template(4, 4, 4, 4);
    s.insert_source("img://a", solid_source(4, 4, [100, 100, 100, 255]));
    let id = s.add_image_layer("img://a").unwrap();
    s.update_layer(
        &id,
        &LayerPatch {
            recolor: Some(Some("#00ff00".into())),
            total_recolor: Some(true),
            ..LayerPatch::default()
        },
    )
    .unwrap();

    let a = s.export_image().unwrap().unwrap();
    let b = s.export_image().unwrap().unwrap();
    assert_eq!(a.data, b.data);
    assert_eq!(&a.data[0..4], &[0, 255, 0, 255]);
    // Sources were registered pre-decoded; nothing re-decodes at render time.
    assert_eq!(s.sources().decode_count(), 0);
}

#[test]
fn design_round_trip_preserves_layers() {
    let mut s = session_with_template(512, 512, 64, 64);
    s.insert_source("img://a", solid_source(4, 4, [1, 1, 1, 255]));
    let id = s.add_image_layer("img://a").unwrap();
    s.set_base_color(Some("#123456")).unwrap();
    s.rotate_to(&id, 30.0).unwrap();

    let design = s.to_design().unwrap();
    let json = design.to_json().unwrap();
    let back = WrapDesign::from_json(&json).unwrap();

    let mut restored = EditorSession::new(Canvas::new(512, 512).unwrap(), 1.0);
    restored.insert_source("tpl://van", solid_source(64, 64, [128, 128, 128, 255]));
    restored.insert_source("img://a", solid_source(4, 4, [1, 1, 1, 255]));
    restored.load_design(&back).unwrap();

    assert_eq!(restored.layers().len(), 1);
    assert_eq!(restored.layers().get(&id).unwrap().rotation, 30.0);
    assert_eq!(restored.base_color().unwrap().to_hex(), "#123456");

    // New layers never collide with restored ids.
    restored.insert_source("img://b", solid_source(4, 4, [2, 2, 2, 255]));
    let fresh = restored.add_image_layer("img://b").unwrap();
    assert_ne!(fresh, id);
}

#[test]
fn load_design_requires_registered_sources() {
    let design = WrapDesign {
        template_url: "tpl://van".into(),
        base_color: None,
        layers: Vec::new(),
    };
    let mut s = EditorSession::new(Canvas::new(64, 64).unwrap(), 1.0);
    assert!(s.load_design(&design).is_err());
}
