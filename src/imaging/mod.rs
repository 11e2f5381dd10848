//! Frame compositing: pure Rust, no external processes.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Layer scaling** | `image::imageops::resize` (triangle filter) |
//! | **Clip blend** | row-wise source-over in [`compositor`] |
//! | **Divider / badge boxes** | `tiny-skia` fills via `resvg` |
//! | **Badge labels** | `usvg` text layout against system fonts |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry (unit testable)
//! - **Parameters**: Clamped value types ([`SplitPosition`], [`Quality`])
//! - **Badge**: Overlay drawing onto a finished frame
//! - **Compositor**: [`Compositor`] and the one-shot [`render`]

mod badge;
mod calculations;
pub mod compositor;
mod params;

pub use calculations::{
    BadgeMetrics, FitRect, calculate_badge_metrics, calculate_bounded_dimensions,
    calculate_contain_fit, calculate_divider_width, calculate_gif_dimensions, calculate_split_x,
    calculate_video_dimensions,
};
pub use compositor::{CompositeFrame, Compositor, DEFAULT_BACKGROUND, render};
pub use params::{Quality, SplitPosition};
