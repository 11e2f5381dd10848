//! # DiffSlide
//!
//! Render and export engine for before/after image comparisons. Two images
//! and a split position go in. Out come a still PNG, a looping GIF, a short
//! video, or a self-contained HTML embed (draggable slider or hover reveal).
//!
//! # Architecture
//!
//! ```text
//! ImageAsset ×2 ──► Compositor ──► RasterExporter  → PNG
//!                       ▲     ├──► GifExporter     → GIF   (GifTimeline)
//!                       │     └──► VideoExporter   → mp4/webm (VideoTimeline)
//!                  split value
//! ImageAsset ×2 ──► EmbedGenerator → HTML (slider / hover / clipboard)
//! ```
//!
//! Every export goes through [`export::ExportEngine`], which allows one export
//! at a time and logs failures in one place.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`asset`] | Decoded input images |
//! | [`imaging`] | Frame geometry, the compositor, badge and divider overlays |
//! | [`timeline`] | Easing and the GIF / video split schedules |
//! | [`export`] | Raster, GIF, video and embed pipelines plus the engine |
//! | [`error`] | `ExportError` taxonomy and per-export user messages |
//! | [`config`] | `diffslide.toml` loading, merging and validation |
//! | [`naming`] | `<stem>-<unixMs>.<ext>` artifact filenames |
//! | [`output`] | CLI output formatting and the export manifest |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## Prepared Compositor
//!
//! An animated export renders 54 (GIF) or 150 (video) frames of the same
//! pair. Scaling both images and measuring badge text happen once in
//! [`imaging::Compositor::new`]; each frame then costs one clip blend plus
//! the overlays. The compositor is `Sync`, so GIF frames render on the rayon
//! pool.
//!
//! ## ffmpeg Over In-Process Codecs
//!
//! Video goes through the system `ffmpeg` binary over a raw RGBA pipe. That
//! keeps H.264 and VP9 out of the build and lets codec support be probed at
//! runtime. Everything else (PNG, GIF, JPEG, HTML) is pure Rust.
//!
//! ## Offline Embeds
//!
//! Embed documents inline both images as JPEG `data:` URLs and carry their
//! own CSS and script. A saved file opens anywhere with no network access.

pub mod asset;
pub mod config;
pub mod error;
pub mod export;
pub mod imaging;
pub mod logging;
pub mod naming;
pub mod output;
pub mod timeline;

pub use asset::ImageAsset;
pub use error::{ExportError, Result};
pub use export::{ArtifactKind, ExportArtifact, ExportEngine, ExportKind};

#[cfg(test)]
pub(crate) mod test_helpers;
