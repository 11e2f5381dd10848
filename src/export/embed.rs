//! Standalone HTML embeds.
//!
//! Both images are downscaled, flattened onto white, re-encoded as JPEG and
//! inlined as `data:` URLs, so a generated document makes no network request
//! at all. One template covers both layouts:
//!
//! - **Slider**: "after" underneath, "before" on top clipped with
//!   `clip-path: inset(0 (100-V)% 0 0)`, a handle at `left: V%`, and an
//!   invisible range input over everything driving both. A small inline
//!   script does the updates and shows `#error-log` if its elements are
//!   missing.
//! - **Hover**: "before" underneath, "after" on top at opacity 0, revealed on
//!   `:hover`. No script.
//!
//! Both containers take the aspect ratio of the unscaled before image.

use super::{ArtifactKind, ExportArtifact};
use crate::asset::ImageAsset;
use crate::config::EmbedConfig;
use crate::error::{ExportError, Result};
use crate::imaging::{Quality, SplitPosition, calculate_bounded_dimensions};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageEncoder, RgbImage};
use maud::{DOCTYPE, Markup, PreEscaped, html};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedMode {
    Slider,
    Hover,
}

/// Inline style values for a slider at `position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliderState {
    pub clip_path: String,
    pub handle_left: String,
}

/// ```
/// # use diffslide::export::embed::slider_state;
/// # use diffslide::imaging::SplitPosition;
/// let s = slider_state(SplitPosition::new(30));
/// assert_eq!(s.clip_path, "inset(0 70% 0 0)");
/// assert_eq!(s.handle_left, "30%");
/// ```
pub fn slider_state(position: SplitPosition) -> SliderState {
    let v = position.value();
    SliderState {
        clip_path: format!("inset(0 {}% 0 0)", 100 - v),
        handle_left: format!("{v}%"),
    }
}

/// Downscale to `max_width`, flatten onto white, and encode as JPEG.
pub fn recompress(asset: &ImageAsset, max_width: u32, quality: Quality) -> Result<Vec<u8>> {
    let (width, height) = calculate_bounded_dimensions(asset.dimensions(), max_width);
    let resized;
    let src = if asset.dimensions() == (width, height) {
        asset.pixels()
    } else {
        resized = imageops::resize(asset.pixels(), width, height, FilterType::Lanczos3);
        &resized
    };

    let flat = RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = src.get_pixel(x, y).0;
        let a = a as u32;
        let over_white = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        image::Rgb([over_white(r), over_white(g), over_white(b)])
    });

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.value())
        .write_image(flat.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| ExportError::encoding(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}

pub fn jpeg_data_url(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg))
}

/// Inputs to the embed template, with images already inlined.
#[derive(Debug, Clone)]
pub struct EmbedDocument<'a> {
    pub mode: EmbedMode,
    /// Natural size of the before image; sets the container aspect ratio.
    pub aspect: (u32, u32),
    pub before_url: &'a str,
    pub after_url: &'a str,
    pub initial: SplitPosition,
}

const BASE_CSS: &str = r#"
body { margin: 0; padding: 0; display: flex; align-items: center; justify-content: center;
       min-height: 100vh; overflow: hidden; font-family: system-ui, -apple-system, sans-serif; }
.container { position: relative; width: 100%; max-height: 100vh; overflow: hidden;
             user-select: none; background-color: #0f172a; }
img { display: block; width: 100%; height: 100%; object-fit: cover; pointer-events: none; }
.label { position: absolute; bottom: 16px; padding: 4px 12px; border-radius: 999px;
         background: rgba(0,0,0,0.6); backdrop-filter: blur(4px); color: #fff;
         border: 1px solid rgba(255,255,255,0.1); font-size: 12px; font-weight: bold;
         pointer-events: none; }
"#;

const SLIDER_CSS: &str = r#"
body { background-color: #1e293b; color: #f8fafc; }
.img-layer { position: absolute; inset: 0; }
.img-after { z-index: 5; }
.img-before { z-index: 10; }
.label { z-index: 15; }
.label-before { left: 16px; }
.label-after { right: 16px; }
.handle { position: absolute; top: 0; bottom: 0; width: 2px; margin-left: -1px; background: #fff;
          z-index: 20; pointer-events: none; box-shadow: 0 0 10px rgba(0,0,0,0.5); }
.handle-knob { position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%);
               width: 40px; height: 40px; border-radius: 50%; background: #fff;
               box-shadow: 0 4px 6px -1px rgb(0 0 0 / 0.3); display: flex;
               align-items: center; justify-content: center; color: #0f172a; font-weight: bold; }
input[type=range] { position: absolute; inset: 0; width: 100%; height: 100%; margin: 0;
                    opacity: 0; cursor: col-resize; z-index: 30; }
#error-log { position: fixed; left: 0; right: 0; bottom: 0; padding: 8px; display: none;
             background: #991b1b; color: #fff; font-size: 12px; z-index: 9999; }
"#;

const HOVER_CSS: &str = r#"
body { background-color: #0f172a; }
.container img { position: absolute; top: 0; left: 0; }
.img-before { z-index: 10; }
.img-after { z-index: 20; opacity: 0; transition: opacity 0.3s ease-in-out; }
.container:hover .img-after { opacity: 1; }
.label { left: 50%; transform: translateX(-50%); z-index: 30; transition: opacity 0.3s; }
.container:hover .label { opacity: 0; }
"#;

const SLIDER_JS: &str = r#"
window.addEventListener('DOMContentLoaded', () => {
  try {
    const slider = document.getElementById('slider');
    const before = document.getElementById('before-layer');
    const handle = document.getElementById('handle');
    if (!slider || !before || !handle) {
      throw new Error('Missing slider elements');
    }
    const apply = (v) => {
      before.style.clipPath = `inset(0 ${100 - v}% 0 0)`;
      handle.style.left = `${v}%`;
    };
    slider.addEventListener('input', (e) => {
      const v = Number(e.target.value);
      requestAnimationFrame(() => apply(v));
    });
  } catch (err) {
    const log = document.getElementById('error-log');
    if (log) {
      log.style.display = 'block';
      log.textContent = 'Slider error: ' + err.message;
    }
  }
});
"#;

/// Render the embed document for either mode.
pub fn render_document(doc: &EmbedDocument<'_>) -> Markup {
    let (title, mode_css) = match doc.mode {
        EmbedMode::Slider => ("DiffSlide Embed", SLIDER_CSS),
        EmbedMode::Hover => ("DiffSlide Hover Reveal", HOVER_CSS),
    };
    let aspect = format!("aspect-ratio: {} / {};", doc.aspect.0, doc.aspect.1);

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(BASE_CSS)) (PreEscaped(mode_css)) }
            }
            body {
                div.container id="container" style=(aspect) {
                    @match doc.mode {
                        EmbedMode::Slider => { (slider_body(doc)) }
                        EmbedMode::Hover => { (hover_body(doc)) }
                    }
                }
                @if doc.mode == EmbedMode::Slider {
                    div id="error-log" {}
                    script { (PreEscaped(SLIDER_JS)) }
                }
            }
        }
    }
}

fn slider_body(doc: &EmbedDocument<'_>) -> Markup {
    let state = slider_state(doc.initial);
    html! {
        div.img-layer.img-after {
            img src=(doc.after_url) alt="After image";
            div.label.label-after { "AFTER" }
        }
        div.img-layer.img-before id="before-layer" style={ "clip-path: " (state.clip_path) ";" } {
            img src=(doc.before_url) alt="Before image";
            div.label.label-before { "BEFORE" }
        }
        div.handle id="handle" style={ "left: " (state.handle_left) ";" } {
            div.handle-knob { "↔" }
        }
        input type="range" min="0" max="100" value=(doc.initial.value()) id="slider"
            aria-label="Comparison slider";
    }
}

fn hover_body(doc: &EmbedDocument<'_>) -> Markup {
    html! {
        img.img-before src=(doc.before_url) alt="Before";
        img.img-after src=(doc.after_url) alt="After";
        div.label { "Hover to reveal" }
    }
}

/// Recompress both images and render the document as a string.
pub fn generate_html(
    before: &ImageAsset,
    after: &ImageAsset,
    mode: EmbedMode,
    max_width: u32,
    config: &EmbedConfig,
) -> Result<String> {
    let quality = Quality::new(config.jpeg_quality);
    let (before_jpeg, after_jpeg) = rayon::join(
        || recompress(before, max_width, quality),
        || recompress(after, max_width, quality),
    );
    let before_url = jpeg_data_url(&before_jpeg?);
    let after_url = jpeg_data_url(&after_jpeg?);

    let doc = EmbedDocument {
        mode,
        aspect: before.dimensions(),
        before_url: &before_url,
        after_url: &after_url,
        initial: config.initial(),
    };
    let html = render_document(&doc).into_string();
    tracing::debug!(?mode, max_width, bytes = html.len(), "embed rendered");
    Ok(html)
}

/// Downloadable embed at the download width bound.
pub fn export_embed(
    before: &ImageAsset,
    after: &ImageAsset,
    mode: EmbedMode,
    config: &EmbedConfig,
) -> Result<ExportArtifact> {
    let html = generate_html(before, after, mode, config.download_max_width, config)?;
    let kind = match mode {
        EmbedMode::Slider => ArtifactKind::InteractiveEmbed,
        EmbedMode::Hover => ArtifactKind::HoverEmbed,
    };
    Ok(ExportArtifact::new(kind, html.into_bytes(), "html", "text/html"))
}

/// Interactive embed as clipboard text, at the tighter clipboard bound.
pub fn clipboard_payload(
    before: &ImageAsset,
    after: &ImageAsset,
    config: &EmbedConfig,
) -> Result<String> {
    let html = generate_html(
        before,
        after,
        EmbedMode::Slider,
        config.clipboard_max_width,
        config,
    )?;
    if html.len() > config.clipboard_max_bytes {
        return Err(ExportError::SizeLimit {
            what: "clipboard payload",
            actual: html.len(),
            limit: config.clipboard_max_bytes,
        });
    }
    Ok(html)
}
