use crate::{
    assets::decode::SourceImage, effects::recolor::recolor_source, foundation::core::Color,
    model::template::Template,
};

/// Produce the base-color fill image: a native-resolution copy of the template
/// with every non-transparent pixel's RGB replaced by `color`, alpha preserved.
///
/// Working at native resolution matters because this image becomes the literal
/// exported texture background. Anti-aliased silhouette edges keep their
/// original alpha rather than being hard-thresholded, so the filled region
/// blends smoothly against the transparent surround. Drawn directly above the
/// raw template and below every content layer.
pub fn base_color_image(template: &Template, color: Color) -> SourceImage {
    // Semantically a total recolor of the template itself.
    recolor_source(&template.as_source(), color, true)
}

#[cfg(test)]
#[path = "../../tests/unit/render/base_color.rs"]
mod tests;
