//! Export pipelines and the engine that serializes them.
//!
//! | Export | Module | Artifact |
//! |---|---|---|
//! | Snapshot | [`raster`] | PNG at the before image's native size |
//! | GIF | [`gif`] | looping palette GIF, at most 800px wide |
//! | Video | [`video`] | mp4 or webm via the negotiated encoder |
//! | Embeds | [`embed`] | standalone slider / hover HTML, or clipboard text |
//!
//! [`ExportEngine`] is the single entry point callers use. It owns the busy
//! state (`Idle → Exporting(kind) → Idle`) and the failure boundary: every
//! error is logged once there and handed back unchanged.

pub mod embed;
pub mod gif;
pub mod raster;
pub mod video;

use crate::asset::ImageAsset;
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::imaging::SplitPosition;
use crate::naming::{artifact_filename, now_ms};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use video::{FfmpegBackend, VideoBackend};

/// Which export operation is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportKind {
    Snapshot,
    Gif,
    Video,
    InteractiveEmbed,
    HoverEmbed,
    Clipboard,
}

impl ExportKind {
    pub const ALL: [ExportKind; 6] = [
        ExportKind::Snapshot,
        ExportKind::Gif,
        ExportKind::Video,
        ExportKind::InteractiveEmbed,
        ExportKind::HoverEmbed,
        ExportKind::Clipboard,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExportKind::Snapshot => "snapshot",
            ExportKind::Gif => "gif",
            ExportKind::Video => "video",
            ExportKind::InteractiveEmbed => "interactive embed",
            ExportKind::HoverEmbed => "hover embed",
            ExportKind::Clipboard => "clipboard",
        }
    }

    fn code(self) -> u8 {
        match self {
            ExportKind::Snapshot => 1,
            ExportKind::Gif => 2,
            ExportKind::Video => 3,
            ExportKind::InteractiveEmbed => 4,
            ExportKind::HoverEmbed => 5,
            ExportKind::Clipboard => 6,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The five artifact shapes an export can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    StaticImage,
    AnimatedGif,
    Video,
    InteractiveEmbed,
    HoverEmbed,
}

impl ArtifactKind {
    /// Filename stem, before the timestamp.
    pub fn stem(self) -> &'static str {
        match self {
            ArtifactKind::StaticImage => "comparison-snapshot",
            ArtifactKind::AnimatedGif => "diffslide-optimized",
            ArtifactKind::Video => "diffslide-video",
            ArtifactKind::InteractiveEmbed => "diffslide-embed",
            ArtifactKind::HoverEmbed => "diffslide-hover",
        }
    }
}

/// Finished export output: complete bytes plus how to save them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportArtifact {
    pub kind: ArtifactKind,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime: &'static str,
}

impl ExportArtifact {
    /// Wrap encoded bytes, naming them with the current time.
    pub fn new(kind: ArtifactKind, bytes: Vec<u8>, extension: &str, mime: &'static str) -> Self {
        Self::with_timestamp(kind, bytes, extension, mime, now_ms())
    }

    pub fn with_timestamp(
        kind: ArtifactKind,
        bytes: Vec<u8>,
        extension: &str,
        mime: &'static str,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            kind,
            filename: artifact_filename(kind.stem(), timestamp_ms, extension),
            bytes,
            mime,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Observable engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Exporting(ExportKind),
}

const IDLE: u8 = 0;

/// Marks the engine busy until dropped.
///
/// Dropping resets the engine to idle on every exit path, unwinding included.
#[derive(Debug)]
#[must_use = "the engine is idle again as soon as the guard drops"]
pub struct ExportGuard<'a> {
    state: &'a AtomicU8,
    kind: ExportKind,
}

impl ExportGuard<'_> {
    pub fn kind(&self) -> ExportKind {
        self.kind
    }
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.state.store(IDLE, Ordering::Release);
    }
}

/// Runs exports one at a time against a fixed configuration.
pub struct ExportEngine {
    config: ExportConfig,
    video_backend: Box<dyn VideoBackend>,
    state: AtomicU8,
}

impl ExportEngine {
    /// Engine with the system `ffmpeg` video backend.
    pub fn new(config: ExportConfig) -> Self {
        Self::with_video_backend(config, FfmpegBackend::default())
    }

    pub fn with_video_backend(config: ExportConfig, backend: impl VideoBackend + 'static) -> Self {
        Self {
            config,
            video_backend: Box::new(backend),
            state: AtomicU8::new(IDLE),
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        match ExportKind::from_code(self.state.load(Ordering::Acquire)) {
            Some(kind) => EngineState::Exporting(kind),
            None => EngineState::Idle,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.state() != EngineState::Idle
    }

    /// Claim the engine for `kind`, or fail with [`ExportError::Busy`].
    pub fn begin(&self, kind: ExportKind) -> Result<ExportGuard<'_>> {
        match self
            .state
            .compare_exchange(IDLE, kind.code(), Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(ExportGuard {
                state: &self.state,
                kind,
            }),
            Err(active) => Err(ExportError::Busy {
                // A non-idle code always maps to a kind; `kind` is only a placeholder.
                active: ExportKind::from_code(active).unwrap_or(kind),
            }),
        }
    }

    fn run<T>(&self, kind: ExportKind, export: impl FnOnce() -> Result<T>) -> Result<T> {
        let _guard = match self.begin(kind) {
            Ok(guard) => guard,
            Err(e) => {
                tracing::warn!(requested = %kind, "{e}");
                return Err(e);
            }
        };
        let started = std::time::Instant::now();
        tracing::info!(kind = %kind, "export started");
        match export() {
            Ok(value) => {
                tracing::info!(
                    kind = %kind,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "export finished"
                );
                Ok(value)
            }
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "export failed");
                Err(e)
            }
        }
    }

    /// Still PNG at the before image's native size.
    pub fn snapshot(
        &self,
        before: &ImageAsset,
        after: &ImageAsset,
        position: SplitPosition,
    ) -> Result<ExportArtifact> {
        self.run(ExportKind::Snapshot, || {
            raster::export_snapshot(before, after, position, &self.config.render)
        })
    }

    pub fn gif(&self, before: &ImageAsset, after: &ImageAsset) -> Result<ExportArtifact> {
        self.run(ExportKind::Gif, || {
            gif::export_gif(before, after, &self.config.gif, &self.config.render)
        })
    }

    pub fn video(&self, before: &ImageAsset, after: &ImageAsset) -> Result<ExportArtifact> {
        self.run(ExportKind::Video, || {
            video::export_video(
                self.video_backend.as_ref(),
                before,
                after,
                &self.config.video,
                &self.config.render,
            )
        })
    }

    pub fn interactive_embed(
        &self,
        before: &ImageAsset,
        after: &ImageAsset,
    ) -> Result<ExportArtifact> {
        self.run(ExportKind::InteractiveEmbed, || {
            embed::export_embed(before, after, embed::EmbedMode::Slider, &self.config.embed)
        })
    }

    pub fn hover_embed(&self, before: &ImageAsset, after: &ImageAsset) -> Result<ExportArtifact> {
        self.run(ExportKind::HoverEmbed, || {
            embed::export_embed(before, after, embed::EmbedMode::Hover, &self.config.embed)
        })
    }

    /// Interactive HTML as clipboard text.
    pub fn clipboard(&self, before: &ImageAsset, after: &ImageAsset) -> Result<String> {
        self.run(ExportKind::Clipboard, || {
            embed::clipboard_payload(before, after, &self.config.embed)
        })
    }
}
