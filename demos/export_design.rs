use wraptex::{Canvas, EditorSession, LayerPatch, SourceImage};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut session = EditorSession::new(Canvas::new(800, 600)?, 1.0);

    // Synthetic 256x256 template: an opaque disc on a transparent surround.
    let mut tpl = vec![0u8; 256 * 256 * 4];
    for y in 0..256u32 {
        for x in 0..256u32 {
            let dx = f64::from(x) - 127.5;
            let dy = f64::from(y) - 127.5;
            if (dx * dx + dy * dy).sqrt() < 120.0 {
                let i = ((y * 256 + x) * 4) as usize;
                tpl[i..i + 4].copy_from_slice(&[210, 210, 210, 255]);
            }
        }
    }
    session.insert_source("tpl://disc", SourceImage::from_rgba8(256, 256, tpl)?);
    session.load_template("tpl://disc")?;
    session.set_base_color(Some("#1c3d6e"))?;

    let stripe = vec![255u8; 64 * 16 * 4];
    session.insert_source("img://stripe", SourceImage::from_rgba8(64, 16, stripe)?);
    let id = session.add_image_layer("img://stripe")?;
    session.update_layer(
        &id,
        &LayerPatch {
            rotation: Some(30.0),
            recolor: Some(Some("#e03131".to_string())),
            total_recolor: Some(true),
            ..LayerPatch::default()
        },
    )?;

    let frame = session
        .export_image()?
        .ok_or_else(|| anyhow::anyhow!("no template loaded"))?;
    println!("exported {}x{} frame", frame.width, frame.height);
    frame.to_rgba_image()?.save("wrap_export.png")?;

    Ok(())
}
