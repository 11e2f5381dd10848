//! Still snapshot: one frame at the before image's native size, as PNG.

use super::{ArtifactKind, ExportArtifact};
use crate::asset::ImageAsset;
use crate::config::RenderConfig;
use crate::error::{ExportError, Result};
use crate::imaging::{CompositeFrame, Compositor, SplitPosition};
use image::ImageEncoder;
use image::codecs::png::PngEncoder;

pub fn export_snapshot(
    before: &ImageAsset,
    after: &ImageAsset,
    position: SplitPosition,
    render: &RenderConfig,
) -> Result<ExportArtifact> {
    let (width, height) = before.dimensions();
    let frame = Compositor::with_background(before, after, width, height, render.background_rgba())
        .render(position.as_f64());
    let bytes = encode_png(&frame)?;
    tracing::debug!(width, height, split = position.value(), bytes = bytes.len(), "snapshot encoded");
    Ok(ExportArtifact::new(
        ArtifactKind::StaticImage,
        bytes,
        "png",
        "image/png",
    ))
}

pub fn encode_png(frame: &CompositeFrame) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(
            frame.as_raw(),
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| ExportError::encoding(format!("PNG encode failed: {e}")))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{solid_asset, split_assets};

    #[test]
    fn snapshot_uses_before_native_size() {
        let before = solid_asset(120, 80, [255, 0, 0, 255]);
        let after = solid_asset(300, 300, [0, 0, 255, 255]);
        let artifact =
            export_snapshot(&before, &after, SplitPosition::default(), &RenderConfig::default())
                .unwrap();

        let decoded = image::load_from_memory(&artifact.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 80));
    }

    #[test]
    fn snapshot_reflects_split() {
        let before = solid_asset(100, 100, [255, 0, 0, 255]);
        let after = solid_asset(100, 100, [0, 0, 255, 255]);
        let artifact =
            export_snapshot(&before, &after, SplitPosition::new(50), &RenderConfig::default())
                .unwrap();
        let decoded = image::load_from_memory(&artifact.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(10, 10).0, [255, 0, 0, 255]);
        assert_eq!(decoded.get_pixel(90, 10).0, [0, 0, 255, 255]);
    }

    #[test]
    fn png_is_lossless() {
        let (before, after) = split_assets(50, 40);
        let frame = Compositor::new(&before, &after, 50, 40).render(37.0);
        let decoded = image::load_from_memory(&encode_png(&frame).unwrap())
            .unwrap()
            .to_rgba8();
        assert_eq!(&decoded, frame.image());
    }
}
