//! Pure calculation functions for frame geometry.
//!
//! All functions here are pure and testable without any I/O or images.

/// Placement of a layer inside the canvas, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Contain-fit a source into the canvas: keep the aspect ratio, touch two
/// opposite edges, center along the other axis (letterbox or pillarbox).
///
/// # Examples
/// ```
/// # use diffslide::imaging::calculate_contain_fit;
/// // 2:1 source in a square canvas → letterboxed, centered vertically
/// let fit = calculate_contain_fit((200, 100), (100, 100));
/// assert_eq!((fit.width, fit.height), (100.0, 50.0));
/// assert_eq!((fit.x, fit.y), (0.0, 25.0));
/// ```
pub fn calculate_contain_fit(source: (u32, u32), canvas: (u32, u32)) -> FitRect {
    let (src_w, src_h) = (source.0 as f64, source.1 as f64);
    let (canvas_w, canvas_h) = (canvas.0 as f64, canvas.1 as f64);

    let src_aspect = src_w / src_h;
    let canvas_aspect = canvas_w / canvas_h;

    if src_aspect > canvas_aspect {
        // Source is wider: full width, bars top and bottom
        let height = canvas_w / src_aspect;
        FitRect {
            x: 0.0,
            y: (canvas_h - height) / 2.0,
            width: canvas_w,
            height,
        }
    } else {
        // Source is taller (or equal): full height, bars left and right
        let width = canvas_h * src_aspect;
        FitRect {
            x: (canvas_w - width) / 2.0,
            y: 0.0,
            width,
            height: canvas_h,
        }
    }
}

/// Horizontal pixel position of the split line.
pub fn calculate_split_x(canvas_width: u32, split: f64) -> f64 {
    canvas_width as f64 * split.clamp(0.0, 100.0) / 100.0
}

/// Divider stroke width: half a percent of the canvas width, never below 2px.
pub fn calculate_divider_width(canvas_width: u32) -> f64 {
    (canvas_width as f64 * 0.005).max(2.0)
}

/// Working resolution for GIF frames.
///
/// Scales down (never up) so the width fits `max_width`, flooring both
/// dimensions. Each dimension is at least 1.
pub fn calculate_gif_dimensions(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (w, h) = source;
    if w <= max_width {
        return (w, h);
    }
    // Integer floor of h * (max_width / w), exact where the float product drifts
    let out_h = (h as u64 * max_width as u64 / w as u64) as u32;
    (max_width.max(1), out_h.max(1))
}

/// Capture resolution for video frames.
///
/// If either side exceeds `max_dimension`, the longer side is set to it and
/// the other is scaled and rounded. Both sides are then forced even (odd
/// values are decremented) because yuv420p encoders reject odd sizes.
pub fn calculate_video_dimensions(source: (u32, u32), max_dimension: u32) -> (u32, u32) {
    let (mut w, mut h) = source;

    if w > max_dimension || h > max_dimension {
        let ratio = w as f64 / h as f64;
        if ratio > 1.0 {
            w = max_dimension;
            h = (max_dimension as f64 / ratio).round() as u32;
        } else {
            h = max_dimension;
            w = (max_dimension as f64 * ratio).round() as u32;
        }
    }

    (make_even(w), make_even(h))
}

fn make_even(v: u32) -> u32 {
    let v = if v % 2 != 0 { v - 1 } else { v };
    v.max(2)
}

/// Size of a downscaled copy bounded by `max_width`.
///
/// Images already within the bound keep their size. Height is rounded, not
/// floored, so a 3000x2000 source bounded to 1600 comes out 1600x1067.
pub fn calculate_bounded_dimensions(source: (u32, u32), max_width: u32) -> (u32, u32) {
    let (w, h) = source;
    if w <= max_width {
        return (w, h);
    }
    let out_h = (h as f64 * (max_width as f64 / w as f64)).round() as u32;
    (max_width, out_h.max(1))
}

/// Badge geometry for one canvas width.
///
/// Every value scales linearly with canvas width against an 800px baseline
/// and has a fixed floor so small frames stay legible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeMetrics {
    pub font_size: u32,
    pub padding_x: u32,
    pub padding_y: u32,
    pub radius: u32,
    pub margin: u32,
}

impl BadgeMetrics {
    pub fn box_height(&self) -> u32 {
        self.font_size + self.padding_y * 2
    }

    pub fn box_width(&self, text_width: f64) -> f64 {
        text_width + (self.padding_x * 2) as f64
    }
}

pub fn calculate_badge_metrics(canvas_width: u32) -> BadgeMetrics {
    let scale = canvas_width as f64 / 800.0;
    let scaled = |base: f64, min: u32| ((base * scale).round() as u32).max(min);
    BadgeMetrics {
        font_size: scaled(16.0, 14),
        padding_x: scaled(12.0, 12),
        padding_y: scaled(6.0, 6),
        radius: scaled(6.0, 4),
        margin: scaled(20.0, 16),
    }
}
