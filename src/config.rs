//! Export configuration.
//!
//! Handles loading, validating, and merging `diffslide.toml`. Stock defaults
//! are the base layer; a user file overrides any subset of keys on top.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [render]
//! background = "#0f172a"       # Canvas fill behind the fitted "after" image
//!
//! [gif]
//! max_width = 800              # Working width cap (never upscales)
//! step = 4                     # Split increment between sweep frames
//! sweep_delay_ms = 5           # Delay of each sweep frame
//! hold_delay_ms = 200          # Delay of the hold frames at 0 and 100
//! sample_factor = 10           # NeuQuant sampling (1 = best, 30 = fastest)
//! max_bytes = 20971520         # Refuse GIFs larger than this
//!
//! [video]
//! max_dimension = 1920         # Longer side cap
//! fps = 30
//! hold_ms = 1000
//! sweep_ms = 1500
//! bitrate = 8000000            # Bits per second
//! realtime = false             # Pace capture by wall clock
//!
//! [embed]
//! download_max_width = 1600
//! clipboard_max_width = 1024
//! jpeg_quality = 85
//! clipboard_max_bytes = 4194304
//! initial_position = 50
//!
//! [logging]
//! level = "info"               # RUST_LOG wins when set
//! json = false
//!
//! [processing]
//! max_processes = 4            # Max GIF render workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::SplitPosition;
use crate::timeline::{GifTimeline, VideoTimeline};
use image::Rgba;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "diffslide.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Engine configuration loaded from `diffslide.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub render: RenderConfig,
    pub gif: GifConfig,
    pub video: VideoConfig,
    pub embed: EmbedConfig,
    pub logging: LoggingConfig,
    pub processing: ProcessingConfig,
}

impl ExportConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_hex_color(&self.render.background)?;
        if self.gif.max_width == 0 {
            return Err(ConfigError::Validation("gif.max_width must be non-zero".into()));
        }
        if self.gif.step == 0 || self.gif.step > 100 {
            return Err(ConfigError::Validation("gif.step must be 1-100".into()));
        }
        if !(1..=30).contains(&self.gif.sample_factor) {
            return Err(ConfigError::Validation("gif.sample_factor must be 1-30".into()));
        }
        if self.video.max_dimension < 2 {
            return Err(ConfigError::Validation(
                "video.max_dimension must be at least 2".into(),
            ));
        }
        if self.video.fps == 0 {
            return Err(ConfigError::Validation("video.fps must be non-zero".into()));
        }
        if self.video.sweep_ms == 0 {
            return Err(ConfigError::Validation("video.sweep_ms must be non-zero".into()));
        }
        if self.embed.download_max_width == 0 || self.embed.clipboard_max_width == 0 {
            return Err(ConfigError::Validation(
                "embed max widths must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.embed.jpeg_quality) {
            return Err(ConfigError::Validation("embed.jpeg_quality must be 1-100".into()));
        }
        if self.embed.initial_position > 100 {
            return Err(ConfigError::Validation(
                "embed.initial_position must be 0-100".into(),
            ));
        }
        Ok(())
    }
}

/// Frame appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// Canvas background as `#rrggbb`.
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            background: "#0f172a".to_string(),
        }
    }
}

impl RenderConfig {
    /// Background as an opaque pixel. Falls back to the stock color when invalid;
    /// loaded configs are validated so this only matters for hand-built values.
    pub fn background_rgba(&self) -> Rgba<u8> {
        parse_hex_color(&self.background).unwrap_or(crate::imaging::DEFAULT_BACKGROUND)
    }
}

/// Parse `#rrggbb` (leading `#` optional) into an opaque pixel.
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>, ConfigError> {
    let hex = value.strip_prefix('#').unwrap_or(value);
    let invalid = || ConfigError::Validation(format!("invalid color '{value}', expected #rrggbb"));
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 0xff]))
}

/// Animated GIF export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GifConfig {
    pub max_width: u32,
    pub step: u32,
    pub sweep_delay_ms: u32,
    pub hold_delay_ms: u32,
    /// NeuQuant sampling factor: 1 samples every pixel, 30 is fastest.
    pub sample_factor: i32,
    /// Largest GIF accepted, in bytes.
    pub max_bytes: usize,
}

impl Default for GifConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            step: 4,
            sweep_delay_ms: 5,
            hold_delay_ms: 200,
            sample_factor: 10,
            max_bytes: 20 * 1024 * 1024,
        }
    }
}

impl GifConfig {
    pub fn timeline(&self) -> GifTimeline {
        GifTimeline {
            step: self.step,
            sweep_delay_ms: self.sweep_delay_ms,
            hold_delay_ms: self.hold_delay_ms,
        }
    }
}

/// Video export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    pub max_dimension: u32,
    pub fps: u32,
    pub hold_ms: u64,
    pub sweep_ms: u64,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
    /// Sample the timeline by wall clock instead of the frame clock.
    pub realtime: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1920,
            fps: 30,
            hold_ms: 1000,
            sweep_ms: 1500,
            bitrate: 8_000_000,
            realtime: false,
        }
    }
}

impl VideoConfig {
    pub fn timeline(&self) -> VideoTimeline {
        VideoTimeline {
            hold_ms: self.hold_ms,
            sweep_ms: self.sweep_ms,
        }
    }
}

/// HTML embed settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbedConfig {
    pub download_max_width: u32,
    pub clipboard_max_width: u32,
    pub jpeg_quality: u8,
    pub clipboard_max_bytes: usize,
    /// Slider value the interactive embed opens at.
    pub initial_position: u8,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            download_max_width: 1600,
            clipboard_max_width: 1024,
            jpeg_quality: 85,
            clipboard_max_bytes: 4 * 1024 * 1024,
            initial_position: 50,
        }
    }
}

impl EmbedConfig {
    pub fn initial(&self) -> SplitPosition {
        SplitPosition::new(self.initial_position)
    }
}

/// Log output settings. `RUST_LOG` overrides `level` when set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel GIF render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    // Every field of the default config is a plain TOML scalar or table.
    toml::Value::try_from(ExportConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ExportConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ExportConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, merged over stock defaults.
///
/// A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<ExportConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_some() {
        tracing::debug!(path = %path.display(), "loaded config file");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `diffslide.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# DiffSlide Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Frame rendering
# ---------------------------------------------------------------------------
[render]
# Canvas color behind the contain-fitted "after" image (#rrggbb).
background = "#0f172a"

# ---------------------------------------------------------------------------
# Animated GIF
# ---------------------------------------------------------------------------
[gif]
# Frames are rendered at most this wide; smaller inputs keep their size.
max_width = 800

# Split increment between sweep frames (0, 4, 8, ... 100).
step = 4

# Per-frame delay during sweeps, and at the two hold frames (milliseconds).
# GIF stores centiseconds; anything under 20ms plays at 20ms in browsers.
sweep_delay_ms = 5
hold_delay_ms = 200

# NeuQuant palette sampling: 1 = slowest/best, 30 = fastest.
sample_factor = 10

# Refuse to produce GIFs larger than this many bytes (20 MiB).
max_bytes = 20971520

# ---------------------------------------------------------------------------
# Video
# ---------------------------------------------------------------------------
[video]
# Longer side cap in pixels. Both sides are forced even.
max_dimension = 1920

# Capture rate in frames per second.
fps = 30

# Hold at each end, and sweep duration between them (milliseconds).
hold_ms = 1000
sweep_ms = 1500

# Encoder target bitrate (bits per second).
bitrate = 8000000

# Sample by wall clock while encoding instead of the exact frame clock.
realtime = false

# ---------------------------------------------------------------------------
# HTML embeds
# ---------------------------------------------------------------------------
[embed]
# Images are downscaled to these widths before inlining as JPEG.
download_max_width = 1600
clipboard_max_width = 1024

# JPEG quality for inlined images (1-100).
jpeg_quality = 85

# Largest clipboard payload in bytes (4 MiB).
clipboard_max_bytes = 4194304

# Slider value (0-100) the interactive embed opens at.
initial_position = 50

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# trace, debug, info, warn, error. RUST_LOG overrides this when set.
level = "info"

# Emit JSON lines instead of human-readable output.
json = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel GIF frame workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn default_config_values() {
        let config = ExportConfig::default();
        assert_eq!(config.render.background, "#0f172a");
        assert_eq!(config.gif.max_width, 800);
        assert_eq!(config.gif.step, 4);
        assert_eq!(config.video.fps, 30);
        assert_eq!(config.video.bitrate, 8_000_000);
        assert_eq!(config.embed.download_max_width, 1600);
        assert_eq!(config.embed.clipboard_max_width, 1024);
        assert_eq!(config.embed.jpeg_quality, 85);
    }

    #[test]
    fn validate_default_config_passes() {
        ExportConfig::default().validate().unwrap();
    }

    #[test]
    fn parse_partial_config() {
        let overlay: toml::Value = toml::from_str("[gif]\nstep = 5\n").unwrap();
        let config = resolve_config(stock_defaults_value(), Some(overlay)).unwrap();
        assert_eq!(config.gif.step, 5);
        assert_eq!(config.gif.max_width, 800);
        assert_eq!(config.video, VideoConfig::default());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, ExportConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r##"
[render]
background = "#000000"

[video]
realtime = true
hold_ms = 500

[processing]
max_processes = 2
"##,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.render.background, "#000000");
        assert!(config.video.realtime);
        assert_eq!(config.video.hold_ms, 500);
        assert_eq!(config.video.sweep_ms, 1500);
        assert_eq!(config.processing.max_processes, Some(2));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[gif\nstep = ");
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let overlay: toml::Value = toml::from_str("[gif]\nspeed = 3\n").unwrap();
        assert!(resolve_config(stock_defaults_value(), Some(overlay)).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let overlay: toml::Value = toml::from_str("[audio]\nenabled = true\n").unwrap();
        assert!(resolve_config(stock_defaults_value(), Some(overlay)).is_err());
    }

    #[test]
    fn validate_rejects_zero_step() {
        let mut config = ExportConfig::default();
        config.gif.step = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_bad_background() {
        let mut config = ExportConfig::default();
        config.render.background = "navy".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_zero_fps() {
        let mut config = ExportConfig::default();
        config.video.fps = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_initial_position_over_100() {
        let mut config = ExportConfig::default();
        config.embed.initial_position = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[embed]\njpeg_quality = 0\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn parse_hex_color_variants() {
        assert_eq!(parse_hex_color("#0f172a").unwrap(), Rgba([15, 23, 42, 255]));
        assert_eq!(parse_hex_color("FFFFFF").unwrap(), Rgba([255, 255, 255, 255]));
        assert!(parse_hex_color("#fff").is_err());
        assert!(parse_hex_color("#gg0000").is_err());
    }

    #[test]
    fn background_rgba_matches_default_constant() {
        assert_eq!(
            RenderConfig::default().background_rgba(),
            crate::imaging::DEFAULT_BACKGROUND
        );
    }

    #[test]
    fn timelines_follow_config() {
        let config = ExportConfig::default();
        assert_eq!(config.gif.timeline(), GifTimeline::default());
        assert_eq!(config.video.timeline(), VideoTimeline::default());
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[t]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 5\nz = 6").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(5));
        assert_eq!(merged["t"]["z"].as_integer(), Some(6));
    }

    // =========================================================================
    // processing
    // =========================================================================

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_zero_means_one() {
        let config = ProcessingConfig {
            max_processes: Some(0),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    // =========================================================================
    // stock config
    // =========================================================================

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(stock_defaults_value(), Some(value)).unwrap();
        assert_eq!(config, ExportConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let toml = stock_config_toml();
        for section in [
            "[render]",
            "[gif]",
            "[video]",
            "[embed]",
            "[logging]",
            "[processing]",
        ] {
            assert!(toml.contains(section), "missing {section}");
        }
    }

    #[test]
    fn stock_defaults_value_is_table() {
        assert!(stock_defaults_value().is_table());
    }
}
