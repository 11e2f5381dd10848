//! Split-view frame rendering.
//!
//! A frame is built in layers:
//!
//! 1. Solid background (`#0f172a` unless configured otherwise).
//! 2. "After" image, contain-fit and centered.
//! 3. "Before" image stretched over the whole canvas, visible only left of the
//!    split line.
//! 4. White divider at the split line, always drawn.
//! 5. BEFORE badge (bottom-left) when the split is past 10, AFTER badge
//!    (bottom-right) while the split is under 90.
//!
//! Layers 1-2 and the stretched "before" copy do not depend on the split, so
//! [`Compositor`] prepares them once and each [`Compositor::render`] only does
//! the clip blend and the overlays. Animated exports render dozens of frames
//! from one prepared compositor, from several threads at once.

use super::badge::{BadgeSide, Label, draw_divider};
use super::calculations::{
    BadgeMetrics, calculate_badge_metrics, calculate_contain_fit, calculate_divider_width,
    calculate_split_x,
};
use crate::asset::ImageAsset;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use resvg::tiny_skia::PixmapMut;

pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([0x0f, 0x17, 0x2a, 0xff]);

const BEFORE_BADGE_MIN: f64 = 10.0;
const AFTER_BADGE_MAX: f64 = 90.0;

/// One rendered comparison frame. Always fully opaque RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeFrame {
    pixels: RgbaImage,
}

impl CompositeFrame {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    pub fn into_image(self) -> RgbaImage {
        self.pixels
    }
}

/// Split-independent layers for one before/after pair at one canvas size.
#[derive(Debug, Clone)]
pub struct Compositor {
    width: u32,
    height: u32,
    base: RgbaImage,
    before: RgbaImage,
    metrics: BadgeMetrics,
    before_label: Label,
    after_label: Label,
}

impl Compositor {
    pub fn new(before: &ImageAsset, after: &ImageAsset, width: u32, height: u32) -> Self {
        Self::with_background(before, after, width, height, DEFAULT_BACKGROUND)
    }

    pub fn with_background(
        before: &ImageAsset,
        after: &ImageAsset,
        width: u32,
        height: u32,
        background: Rgba<u8>,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        // Badge fill and the clip blend assume an opaque base.
        let background = Rgba([background[0], background[1], background[2], 0xff]);

        let mut base = RgbaImage::from_pixel(width, height, background);
        let fit = calculate_contain_fit(after.dimensions(), (width, height));
        let fit_w = (fit.width.round() as u32).clamp(1, width);
        let fit_h = (fit.height.round() as u32).clamp(1, height);
        let fitted = scale_to(after.pixels(), fit_w, fit_h);
        imageops::overlay(
            &mut base,
            &fitted,
            fit.x.round() as i64,
            fit.y.round() as i64,
        );

        let before = scale_to(before.pixels(), width, height);

        let metrics = calculate_badge_metrics(width);
        let before_label = Label::new("BEFORE", BadgeSide::Left, &metrics);
        let after_label = Label::new("AFTER", BadgeSide::Right, &metrics);

        Self {
            width,
            height,
            base,
            before,
            metrics,
            before_label,
            after_label,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render the comparison at `split` (0-100, clamped; fractional allowed).
    pub fn render(&self, split: f64) -> CompositeFrame {
        let split = if split.is_nan() { 0.0 } else { split.clamp(0.0, 100.0) };
        let split_x = calculate_split_x(self.width, split);
        let clip_x = (split_x.round() as u32).min(self.width) as usize;

        let mut pixels = self.base.clone();
        if clip_x > 0 {
            let row_len = self.width as usize * 4;
            let clip_len = clip_x * 4;
            for (dst_row, src_row) in pixels
                .chunks_exact_mut(row_len)
                .zip(self.before.chunks_exact(row_len))
            {
                for (dst, src) in dst_row[..clip_len]
                    .chunks_exact_mut(4)
                    .zip(src_row[..clip_len].chunks_exact(4))
                {
                    blend_over_opaque(dst, src);
                }
            }
        }

        self.draw_overlays(&mut pixels, split, split_x);
        CompositeFrame { pixels }
    }

    /// Divider and badges, drawn straight into the frame buffer.
    fn draw_overlays(&self, pixels: &mut RgbaImage, split: f64, split_x: f64) {
        let canvas = (self.width, self.height);
        // Both sides are at least 1 and the buffer is exactly width * height * 4.
        let Some(mut pixmap) = PixmapMut::from_bytes(pixels, self.width, self.height) else {
            tracing::error!(
                width = self.width,
                height = self.height,
                "frame buffer rejected, overlays not drawn"
            );
            return;
        };
        draw_divider(
            &mut pixmap,
            split_x,
            calculate_divider_width(self.width),
            self.height,
        );
        if split > BEFORE_BADGE_MIN {
            self.before_label.draw(&mut pixmap, &self.metrics, canvas);
        }
        if split < AFTER_BADGE_MAX {
            self.after_label.draw(&mut pixmap, &self.metrics, canvas);
        }
    }
}

/// One-shot render. Same pixels as preparing a [`Compositor`] and rendering once.
pub fn render(
    before: &ImageAsset,
    after: &ImageAsset,
    width: u32,
    height: u32,
    split: f64,
) -> CompositeFrame {
    Compositor::new(before, after, width, height).render(split)
}

fn scale_to(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if src.dimensions() == (width, height) {
        src.clone()
    } else {
        imageops::resize(src, width, height, FilterType::Triangle)
    }
}

/// Source-over of a straight-alpha pixel onto an opaque one.
fn blend_over_opaque(dst: &mut [u8], src: &[u8]) {
    let a = src[3] as u32;
    match a {
        255 => dst[..3].copy_from_slice(&src[..3]),
        0 => {}
        _ => {
            for c in 0..3 {
                dst[c] = ((src[c] as u32 * a + dst[c] as u32 * (255 - a) + 127) / 255) as u8;
            }
        }
    }
    dst[3] = 255;
}
