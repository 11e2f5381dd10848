//! Parameter types for rendering and encoding.
//!
//! ## Types
//!
//! - [`SplitPosition`]: Interactive slider value (0–100). Clamped on construction.
//! - [`Quality`]: Lossy encoding quality (1–100, default 85). Clamped on construction.

use serde::{Deserialize, Serialize};

/// Slider value: 0 shows only "after", 100 shows only "before".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct SplitPosition(u8);

impl SplitPosition {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);

    pub fn new(value: u8) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }
}

impl Default for SplitPosition {
    fn default() -> Self {
        Self(50)
    }
}

impl From<u8> for SplitPosition {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<SplitPosition> for u8 {
    fn from(value: SplitPosition) -> Self {
        value.0
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}
