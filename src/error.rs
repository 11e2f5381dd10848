//! Error taxonomy shared by every export path.
//!
//! | Variant | Raised when |
//! |---|---|
//! | [`ExportError::Resource`] | an input image cannot be read or decoded |
//! | [`ExportError::Encoding`] | palette quantization, codec, or encoder failure |
//! | [`ExportError::Capability`] | no usable capture/recording capability (e.g. no video encoder) |
//! | [`ExportError::SizeLimit`] | a payload is larger than its sink accepts |
//! | [`ExportError::Busy`] | another export is already in flight |
//! | [`ExportError::Io`] | scratch file or pipe I/O failed |
//!
//! The `Display` text is diagnostic and goes to the log. What a user sees is
//! [`ExportError::user_message`], which is short and depends on which export
//! was running.

use crate::export::ExportKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to load image resource: {0}")]
    Resource(String),
    #[error("Encoding failed: {0}")]
    Encoding(String),
    #[error("Capability unavailable: {0}")]
    Capability(String),
    #[error("{what} is {actual} bytes, limit is {limit} bytes")]
    SizeLimit {
        what: &'static str,
        actual: usize,
        limit: usize,
    },
    #[error("Another export is already running ({active})")]
    Busy { active: ExportKind },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;

impl ExportError {
    pub fn encoding(msg: impl std::fmt::Display) -> Self {
        Self::Encoding(msg.to_string())
    }

    pub fn resource(msg: impl std::fmt::Display) -> Self {
        Self::Resource(msg.to_string())
    }

    /// Short message for the person who triggered `kind`.
    pub fn user_message(&self, kind: ExportKind) -> String {
        match (self, kind) {
            (Self::Busy { .. }, _) => "Please wait for the current export to finish.".into(),
            (Self::Capability(_), ExportKind::Video) => {
                "Video recording is not supported on this system.".into()
            }
            (_, ExportKind::Gif) => "Could not generate GIF. Try smaller images.".into(),
            (_, ExportKind::Video) => format!("Video export failed: {self}"),
            (_, ExportKind::Snapshot) => "Failed to generate image.".into(),
            (_, ExportKind::InteractiveEmbed) => format!("Failed to export HTML file: {self}"),
            (_, ExportKind::HoverEmbed) => format!("Failed to export Hover HTML: {self}"),
            (_, ExportKind::Clipboard) => {
                "Failed to copy code. Images might be too large.".into()
            }
        }
    }
}
