//! CLI output formatting.
//!
//! # Output Format
//!
//! ```text
//! Inputs
//!     Before: 1920x1080  shots/old.png
//!     After:  1920x1080  shots/new.png
//!
//! 001 diffslide-optimized-1700000000000.gif
//!     Type: image/gif
//!     Size: 1.4 MiB
//!     Saved: dist/diffslide-optimized-1700000000000.gif
//!
//! Exported 1 artifact (1.4 MiB)
//! ```
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.
//!
//! `manifest.json` written next to the artifacts lists the same information
//! in machine-readable form.

use crate::asset::ImageAsset;
use crate::export::{ArtifactKind, ExportArtifact};
use crate::naming::{format_timestamp, parse_artifact_name};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable byte count with binary units.
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

// ============================================================================
// Inputs
// ============================================================================

pub fn format_inputs(
    before: (&ImageAsset, &Path),
    after: (&ImageAsset, &Path),
) -> Vec<String> {
    let line = |label: &str, asset: &ImageAsset, path: &Path| {
        format!(
            "    {label:<7} {}x{}  {}",
            asset.width(),
            asset.height(),
            path.display()
        )
    };
    vec![
        "Inputs".to_string(),
        line("Before:", before.0, before.1),
        line("After:", after.0, after.1),
    ]
}

pub fn print_inputs(before: (&ImageAsset, &Path), after: (&ImageAsset, &Path)) {
    for line in format_inputs(before, after) {
        println!("{}", line);
    }
}

// ============================================================================
// Artifacts
// ============================================================================

/// Format one saved artifact.
pub fn format_artifact(index: usize, artifact: &ExportArtifact, saved_to: &Path) -> Vec<String> {
    vec![
        format!("{} {}", format_index(index), artifact.filename),
        format!("    Type: {}", artifact.mime),
        format!("    Size: {}", format_size(artifact.len())),
        format!("    Saved: {}", saved_to.display()),
    ]
}

pub fn format_summary(artifacts: &[SavedArtifact]) -> String {
    let total: usize = artifacts.iter().map(|a| a.size).sum();
    let noun = if artifacts.len() == 1 {
        "artifact"
    } else {
        "artifacts"
    };
    format!(
        "Exported {} {} ({})",
        artifacts.len(),
        noun,
        format_size(total)
    )
}

pub fn print_artifact(index: usize, artifact: &ExportArtifact, saved_to: &Path) {
    for line in format_artifact(index, artifact, saved_to) {
        println!("{}", line);
    }
}

pub fn print_summary(artifacts: &[SavedArtifact]) {
    println!("{}", format_summary(artifacts));
}

// ============================================================================
// Manifest
// ============================================================================

/// One artifact as recorded in `manifest.json`.
#[derive(Debug, Clone, Serialize)]
pub struct SavedArtifact {
    pub kind: ArtifactKind,
    pub filename: String,
    pub mime: &'static str,
    pub size: usize,
    pub path: PathBuf,
    /// RFC 3339 time parsed back from the filename.
    pub created: Option<String>,
}

impl SavedArtifact {
    pub fn new(artifact: &ExportArtifact, path: PathBuf) -> Self {
        let created = parse_artifact_name(&artifact.filename)
            .and_then(|parsed| format_timestamp(parsed.timestamp_ms));
        Self {
            kind: artifact.kind,
            filename: artifact.filename.clone(),
            mime: artifact.mime,
            size: artifact.len(),
            path,
            created,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportManifest {
    pub before: PathBuf,
    pub after: PathBuf,
    pub artifacts: Vec<SavedArtifact>,
}

pub fn format_manifest_json(manifest: &ExportManifest) -> serde_json::Result<String> {
    serde_json::to_string_pretty(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> ExportArtifact {
        ExportArtifact::with_timestamp(
            ArtifactKind::AnimatedGif,
            vec![0; 2048],
            "gif",
            "image/gif",
            1_700_000_000_000,
        )
    }

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1000), "1000");
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.0 KiB");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(20 * 1024 * 1024), "20.0 MiB");
    }

    #[test]
    fn artifact_lines() {
        let lines = format_artifact(1, &artifact(), Path::new("dist/x.gif"));
        assert_eq!(
            lines,
            vec![
                "001 diffslide-optimized-1700000000000.gif",
                "    Type: image/gif",
                "    Size: 2.0 KiB",
                "    Saved: dist/x.gif",
            ]
        );
    }

    #[test]
    fn inputs_lines() {
        let before =
            ImageAsset::from_rgba(image::RgbaImage::new(640, 480)).unwrap();
        let after = ImageAsset::from_rgba(image::RgbaImage::new(320, 200)).unwrap();
        let lines = format_inputs(
            (&before, Path::new("a.png")),
            (&after, Path::new("b.png")),
        );
        assert_eq!(lines[0], "Inputs");
        assert_eq!(lines[1], "    Before: 640x480  a.png");
        assert_eq!(lines[2], "    After:  320x200  b.png");
    }

    #[test]
    fn summary_pluralizes() {
        let one = vec![SavedArtifact::new(&artifact(), "x".into())];
        assert_eq!(format_summary(&one), "Exported 1 artifact (2.0 KiB)");
        let two = vec![one[0].clone(), one[0].clone()];
        assert_eq!(format_summary(&two), "Exported 2 artifacts (4.0 KiB)");
    }

    #[test]
    fn manifest_json_fields() {
        let manifest = ExportManifest {
            before: "a.png".into(),
            after: "b.png".into(),
            artifacts: vec![SavedArtifact::new(&artifact(), "dist/x.gif".into())],
        };
        let json: serde_json::Value =
            serde_json::from_str(&format_manifest_json(&manifest).unwrap()).unwrap();
        let entry = &json["artifacts"][0];
        assert_eq!(entry["kind"], "animated-gif");
        assert_eq!(entry["mime"], "image/gif");
        assert_eq!(entry["size"], 2048);
        assert_eq!(entry["created"], "2023-11-14T22:13:20.000Z");
    }
}
