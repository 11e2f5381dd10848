//! BEFORE/AFTER badges and the split divider, drawn over a finished frame.
//!
//! Shapes go through `tiny-skia` (re-exported by `resvg`). Label text is laid
//! out by `usvg` against the system font database so the badge box can be
//! sized from the measured text width, the same way a canvas `measureText`
//! would. Machines without any usable font still get correctly placed badge
//! boxes; only the glyphs are missing.

use super::calculations::BadgeMetrics;
use resvg::tiny_skia::{FillRule, Paint, PathBuilder, PixmapMut, Rect, Transform};
use std::sync::{Arc, LazyLock};

/// Average advance of a bold sans-serif capital, as a fraction of font size.
/// Used only when no system font can be resolved.
const FALLBACK_ADVANCE: f64 = 0.62;

const BADGE_FILL: [u8; 4] = [0, 0, 0, 153];

static FONT_DB: LazyLock<Arc<usvg::fontdb::Database>> = LazyLock::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    tracing::debug!(faces = db.len(), "loaded system fonts for badge labels");
    Arc::new(db)
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeSide {
    Left,
    Right,
}

/// A measured badge label, ready to draw at any position.
#[derive(Debug, Clone)]
pub struct Label {
    side: BadgeSide,
    text_width: f64,
    /// Positioned-at-origin SVG for the glyphs; `None` when no font resolved.
    glyphs_svg: Option<String>,
}

impl Label {
    pub fn new(text: &'static str, side: BadgeSide, metrics: &BadgeMetrics) -> Self {
        let svg = label_svg(text, metrics.font_size);
        match measure_text(&svg) {
            Some(text_width) => Self {
                side,
                text_width,
                glyphs_svg: Some(svg),
            },
            None => Self {
                side,
                text_width: text.chars().count() as f64
                    * metrics.font_size as f64
                    * FALLBACK_ADVANCE,
                glyphs_svg: None,
            },
        }
    }

    /// Badge box for this label on a canvas of the given size.
    pub fn box_rect(&self, metrics: &BadgeMetrics, canvas: (u32, u32)) -> (f64, f64, f64, f64) {
        let box_w = metrics.box_width(self.text_width);
        let box_h = metrics.box_height() as f64;
        let margin = metrics.margin as f64;
        let x = match self.side {
            BadgeSide::Left => margin,
            BadgeSide::Right => canvas.0 as f64 - margin - box_w,
        };
        let y = canvas.1 as f64 - margin - box_h;
        (x, y, box_w, box_h)
    }

    pub fn draw(&self, pixmap: &mut PixmapMut<'_>, metrics: &BadgeMetrics, canvas: (u32, u32)) {
        let (x, y, w, h) = self.box_rect(metrics, canvas);
        fill_rounded_rect(pixmap, x, y, w, h, metrics.radius as f64, BADGE_FILL);

        let Some(svg) = &self.glyphs_svg else {
            return;
        };
        let Ok(tree) = parse_svg(svg) else {
            return;
        };
        // Label SVG centers glyphs on y = font_size / 2; nudge 1px down like the UI does.
        let tx = x + metrics.padding_x as f64;
        let ty = y + h / 2.0 - metrics.font_size as f64 / 2.0 + 1.0;
        resvg::render(
            &tree,
            Transform::from_translate(tx as f32, ty as f32),
            pixmap,
        );
    }
}

/// Draw the white split divider centered on `split_x`.
pub fn draw_divider(pixmap: &mut PixmapMut<'_>, split_x: f64, line_width: f64, height: u32) {
    let Some(rect) = Rect::from_xywh(
        (split_x - line_width / 2.0) as f32,
        0.0,
        line_width as f32,
        height as f32,
    ) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = true;
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

fn fill_rounded_rect(
    pixmap: &mut PixmapMut<'_>,
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    radius: f64,
    rgba: [u8; 4],
) {
    let r = radius.min(w / 2.0).min(h / 2.0) as f32;
    let (x, y, w, h) = (x as f32, y as f32, w as f32, h as f32);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    let Some(path) = pb.finish() else {
        return;
    };

    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
    paint.anti_alias = true;
    pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
}

fn label_svg(text: &str, font_size: u32) -> String {
    let canvas_w = font_size as usize * (text.len() + 2);
    let canvas_h = font_size * 2;
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{canvas_w}" height="{canvas_h}"><text x="0" y="{half}" font-family="system-ui, sans-serif" font-weight="bold" font-size="{font_size}" dominant-baseline="central" fill="white">{text}</text></svg>"#,
        half = font_size as f64 / 2.0,
    )
}

fn parse_svg(svg: &str) -> Result<usvg::Tree, usvg::Error> {
    let opts = usvg::Options {
        fontdb: Arc::clone(&FONT_DB),
        ..Default::default()
    };
    usvg::Tree::from_str(svg, &opts)
}

/// Rendered width of the label glyphs, or `None` if no font produced outlines.
fn measure_text(svg: &str) -> Option<f64> {
    let tree = parse_svg(svg).ok()?;
    let root = tree.root();
    if root.children().is_empty() {
        return None;
    }
    let width = root.abs_bounding_box().width() as f64;
    (width > 0.0).then_some(width)
}
