//! Looping GIF export.
//!
//! Frames follow the [`GifTimeline`](crate::timeline::GifTimeline): render at
//! the working resolution, quantize each frame to its own ≤256-color NeuQuant
//! palette, then append in timeline order. Rendering and quantization run on
//! the rayon pool; encoding is sequential, so the output does not depend on
//! the thread count.

use super::{ArtifactKind, ExportArtifact};
use crate::asset::ImageAsset;
use crate::config::{GifConfig, RenderConfig};
use crate::error::{ExportError, Result};
use crate::imaging::{CompositeFrame, Compositor, calculate_gif_dimensions};
use crate::timeline::GifSample;
use color_quant::NeuQuant;
use rayon::prelude::*;
use std::borrow::Cow;

/// Browsers clamp anything shorter than this to ~100ms, so never emit it.
const MIN_DELAY_CS: u16 = 2;

/// Timeline delay (ms) to GIF delay (cs), rounded half-up, floored at 2cs.
pub fn delay_to_centiseconds(delay_ms: u32) -> u16 {
    let cs = (delay_ms.saturating_add(5) / 10).min(u16::MAX as u32) as u16;
    cs.max(MIN_DELAY_CS)
}

/// A frame reduced to palette indices, ready for the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedFrame {
    pub width: u16,
    pub height: u16,
    /// Flat RGB triples, at most 256 entries.
    pub palette: Vec<u8>,
    pub indices: Vec<u8>,
    pub delay_cs: u16,
}

/// Quantize one composite frame to an adaptive palette.
pub fn quantize(frame: &CompositeFrame, sample_factor: i32, delay_ms: u32) -> Result<IndexedFrame> {
    let width = gif_dimension(frame.width())?;
    let height = gif_dimension(frame.height())?;
    let rgba = frame.as_raw();

    let quant = NeuQuant::new(sample_factor.clamp(1, 30), 256, rgba);
    let palette = quant.color_map_rgb();
    let indices = rgba
        .chunks_exact(4)
        .map(|px| quant.index_of(px) as u8)
        .collect();

    Ok(IndexedFrame {
        width,
        height,
        palette,
        indices,
        delay_cs: delay_to_centiseconds(delay_ms),
    })
}

fn gif_dimension(v: u32) -> Result<u16> {
    u16::try_from(v).map_err(|_| ExportError::encoding(format!("GIF dimension {v} exceeds 65535")))
}

/// Accumulates indexed frames into one infinitely looping GIF.
pub struct GifSession {
    encoder: gif::Encoder<Vec<u8>>,
    width: u16,
    height: u16,
    frames: usize,
}

impl GifSession {
    pub fn new(width: u16, height: u16) -> Result<Self> {
        let mut encoder = gif::Encoder::new(Vec::new(), width, height, &[])
            .map_err(|e| ExportError::encoding(format!("GIF header: {e}")))?;
        encoder
            .set_repeat(gif::Repeat::Infinite)
            .map_err(|e| ExportError::encoding(format!("GIF loop extension: {e}")))?;
        Ok(Self {
            encoder,
            width,
            height,
            frames: 0,
        })
    }

    pub fn push(&mut self, frame: &IndexedFrame) -> Result<()> {
        if (frame.width, frame.height) != (self.width, self.height) {
            return Err(ExportError::encoding(format!(
                "frame is {}x{}, session is {}x{}",
                frame.width, frame.height, self.width, self.height
            )));
        }
        let gif_frame = gif::Frame {
            width: frame.width,
            height: frame.height,
            delay: frame.delay_cs,
            palette: Some(frame.palette.clone()),
            buffer: Cow::Borrowed(&frame.indices),
            ..Default::default()
        };
        self.encoder
            .write_frame(&gif_frame)
            .map_err(|e| ExportError::encoding(format!("GIF frame {}: {e}", self.frames)))?;
        self.frames += 1;
        Ok(())
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    /// Write the trailer and hand back the complete file.
    pub fn finish(self) -> Result<Vec<u8>> {
        self.encoder
            .into_inner()
            .map_err(|e| ExportError::encoding(format!("GIF trailer: {e}")))
    }
}

/// Render and quantize every sample. Order matches `samples`.
pub fn render_frames(
    compositor: &Compositor,
    samples: &[GifSample],
    sample_factor: i32,
) -> Result<Vec<IndexedFrame>> {
    samples
        .par_iter()
        .map(|s| quantize(&compositor.render(s.position as f64), sample_factor, s.delay_ms))
        .collect()
}

/// Encode already-indexed frames into GIF bytes.
pub fn encode_frames(width: u16, height: u16, frames: &[IndexedFrame]) -> Result<Vec<u8>> {
    let mut session = GifSession::new(width, height)?;
    for frame in frames {
        session.push(frame)?;
    }
    session.finish()
}

pub fn export_gif(
    before: &ImageAsset,
    after: &ImageAsset,
    config: &GifConfig,
    render: &RenderConfig,
) -> Result<ExportArtifact> {
    let (width, height) = calculate_gif_dimensions(before.dimensions(), config.max_width);
    let (gif_w, gif_h) = (gif_dimension(width)?, gif_dimension(height)?);
    let compositor =
        Compositor::with_background(before, after, width, height, render.background_rgba());

    let samples: Vec<GifSample> = config.timeline().iter().collect();
    tracing::debug!(width, height, frames = samples.len(), "rendering GIF frames");
    let frames = render_frames(&compositor, &samples, config.sample_factor)?;
    let bytes = encode_frames(gif_w, gif_h, &frames)?;

    if bytes.len() > config.max_bytes {
        return Err(ExportError::SizeLimit {
            what: "GIF",
            actual: bytes.len(),
            limit: config.max_bytes,
        });
    }
    tracing::debug!(bytes = bytes.len(), frames = frames.len(), "GIF encoded");
    Ok(ExportArtifact::new(
        ArtifactKind::AnimatedGif,
        bytes,
        "gif",
        "image/gif",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{solid_asset, split_assets};
    use std::io::Cursor;

    fn decode_frames(bytes: &[u8]) -> (u16, u16, Vec<u16>) {
        let mut opts = gif::DecodeOptions::new();
        opts.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = opts.read_info(Cursor::new(bytes)).unwrap();
        let (w, h) = (decoder.width(), decoder.height());
        let mut delays = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            delays.push(frame.delay);
        }
        (w, h, delays)
    }

    fn small_config() -> GifConfig {
        GifConfig {
            sample_factor: 30,
            ..Default::default()
        }
    }

    #[test]
    fn delay_conversion() {
        assert_eq!(delay_to_centiseconds(0), 2);
        assert_eq!(delay_to_centiseconds(5), 2);
        assert_eq!(delay_to_centiseconds(24), 2);
        assert_eq!(delay_to_centiseconds(25), 3);
        assert_eq!(delay_to_centiseconds(200), 20);
        assert_eq!(delay_to_centiseconds(u32::MAX), u16::MAX);
    }

    #[test]
    fn export_has_54_frames_with_holds() {
        let (before, after) = split_assets(40, 30);
        let artifact =
            export_gif(&before, &after, &small_config(), &RenderConfig::default()).unwrap();
        assert_eq!(artifact.mime, "image/gif");
        assert!(artifact.filename.starts_with("diffslide-optimized-"));

        let (w, h, delays) = decode_frames(&artifact.bytes);
        assert_eq!((w, h), (40, 30));
        assert_eq!(delays.len(), 54);
        assert_eq!(delays[26], 20);
        assert_eq!(delays[53], 20);
        assert!(delays.iter().enumerate().all(|(i, &d)| d == if i == 26 || i == 53 { 20 } else { 2 }));
    }

    #[test]
    fn export_loops_forever() {
        let (before, after) = split_assets(16, 16);
        let artifact =
            export_gif(&before, &after, &small_config(), &RenderConfig::default()).unwrap();
        let netscape = b"NETSCAPE2.0";
        assert!(artifact.bytes.windows(netscape.len()).any(|w| w == netscape));
    }

    #[test]
    fn wide_input_is_scaled_to_max_width() {
        let before = solid_asset(1000, 750, [10, 200, 10, 255]);
        let after = solid_asset(500, 500, [200, 10, 10, 255]);
        let config = GifConfig {
            step: 50,
            ..small_config()
        };
        let artifact = export_gif(&before, &after, &config, &RenderConfig::default()).unwrap();
        let (w, h, delays) = decode_frames(&artifact.bytes);
        assert_eq!((w, h), (800, 600));
        assert_eq!(delays.len(), config.timeline().len());
    }

    #[test]
    fn parallel_matches_sequential() {
        let (before, after) = split_assets(48, 32);
        let config = small_config();
        let compositor = Compositor::new(&before, &after, 48, 32);
        let samples: Vec<_> = config.timeline().iter().collect();

        let parallel = render_frames(&compositor, &samples, config.sample_factor).unwrap();
        let sequential: Vec<_> = samples
            .iter()
            .map(|s| {
                quantize(
                    &compositor.render(s.position as f64),
                    config.sample_factor,
                    s.delay_ms,
                )
                .unwrap()
            })
            .collect();
        assert_eq!(parallel, sequential);
        assert_eq!(
            encode_frames(48, 32, &parallel).unwrap(),
            encode_frames(48, 32, &sequential).unwrap()
        );
    }

    #[test]
    fn palette_never_exceeds_256_colors() {
        let (before, after) = split_assets(64, 64);
        let frame = Compositor::new(&before, &after, 64, 64).render(50.0);
        let indexed = quantize(&frame, 10, 5).unwrap();
        assert!(indexed.palette.len() <= 256 * 3);
        assert_eq!(indexed.indices.len(), 64 * 64);
    }

    #[test]
    fn size_limit_rejects_large_output() {
        let (before, after) = split_assets(40, 30);
        let config = GifConfig {
            max_bytes: 100,
            ..small_config()
        };
        let err = export_gif(&before, &after, &config, &RenderConfig::default()).unwrap_err();
        assert!(matches!(err, ExportError::SizeLimit { what: "GIF", limit: 100, .. }));
    }

    #[test]
    fn session_rejects_mismatched_frame() {
        let mut session = GifSession::new(10, 10).unwrap();
        let frame = IndexedFrame {
            width: 5,
            height: 5,
            palette: vec![0; 3],
            indices: vec![0; 25],
            delay_cs: 2,
        };
        assert!(matches!(session.push(&frame), Err(ExportError::Encoding(_))));
        assert_eq!(session.frame_count(), 0);
    }
}
