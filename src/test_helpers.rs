//! Shared test utilities for the diffslide test suite.
//!
//! Provides synthetic image assets and a recording video backend so export
//! paths can be exercised without image files or an `ffmpeg` install.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let (before, after) = split_assets(64, 48);
//! let backend = MockVideoBackend::supporting(&["libvpx"]);
//! let artifact = video::export_video(&backend, &before, &after, &cfg, &render).unwrap();
//! assert_eq!(backend.sessions()[0].frames, 150);
//! ```

use crate::asset::ImageAsset;
use crate::error::{ExportError, Result};
use crate::export::video::{SessionSpec, VideoBackend, VideoCodec, VideoSession};
use crate::imaging::CompositeFrame;
use image::{Rgba, RgbaImage};
use std::sync::{Arc, Mutex};

// =========================================================================
// Synthetic assets
// =========================================================================

/// A single-color asset.
pub fn solid_asset(width: u32, height: u32, rgba: [u8; 4]) -> ImageAsset {
    ImageAsset::from_rgba(RgbaImage::from_pixel(width, height, Rgba(rgba))).unwrap()
}

/// A horizontal gradient, so resampling and quantization have real work to do.
pub fn gradient_asset(width: u32, height: u32, tint: [u8; 3]) -> ImageAsset {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        let t = x as f32 / width.max(1) as f32;
        let s = y as f32 / height.max(1) as f32;
        Rgba([
            (tint[0] as f32 * t) as u8,
            (tint[1] as f32 * s) as u8,
            (tint[2] as f32 * (1.0 - t)) as u8,
            255,
        ])
    });
    ImageAsset::from_rgba(img).unwrap()
}

/// A distinguishable before/after pair of the same size.
pub fn split_assets(width: u32, height: u32) -> (ImageAsset, ImageAsset) {
    (
        gradient_asset(width, height, [240, 120, 40]),
        gradient_asset(width, height, [40, 200, 240]),
    )
}

// =========================================================================
// Recording video backend
// =========================================================================

/// What one mock session saw.
#[derive(Debug, Clone)]
pub struct MockSessionRecord {
    pub spec: SessionSpec,
    pub frames: usize,
    pub finished: bool,
}

/// Video backend that encodes nothing and records every session.
///
/// Clones share the same record list, so a test can hand one clone to the
/// engine and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MockVideoBackend {
    /// `None` supports every encoder.
    supported: Option<Vec<String>>,
    fail_after: Option<usize>,
    sessions: Arc<Mutex<Vec<MockSessionRecord>>>,
}

impl MockVideoBackend {
    pub fn supporting(encoders: &[&str]) -> Self {
        Self {
            supported: Some(encoders.iter().map(|e| e.to_string()).collect()),
            ..Default::default()
        }
    }

    /// Fail the push after `frames` frames were accepted.
    pub fn failing_after(mut self, frames: usize) -> Self {
        self.fail_after = Some(frames);
        self
    }

    pub fn sessions(&self) -> Vec<MockSessionRecord> {
        self.sessions.lock().unwrap().clone()
    }
}

impl VideoBackend for MockVideoBackend {
    fn supports(&self, codec: &VideoCodec) -> bool {
        match &self.supported {
            None => true,
            Some(list) => list.iter().any(|e| e == codec.encoder),
        }
    }

    fn start(&self, spec: &SessionSpec) -> Result<Box<dyn VideoSession>> {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.push(MockSessionRecord {
            spec: spec.clone(),
            frames: 0,
            finished: false,
        });
        Ok(Box::new(MockSession {
            index: sessions.len() - 1,
            frame_len: spec.frame_len(),
            fail_after: self.fail_after,
            sessions: Arc::clone(&self.sessions),
        }))
    }
}

struct MockSession {
    index: usize,
    frame_len: usize,
    fail_after: Option<usize>,
    sessions: Arc<Mutex<Vec<MockSessionRecord>>>,
}

impl VideoSession for MockSession {
    fn push_frame(&mut self, frame: &CompositeFrame) -> Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        let record = &mut sessions[self.index];
        if Some(record.frames) == self.fail_after {
            return Err(ExportError::encoding("mock encoder failure"));
        }
        assert_eq!(frame.as_raw().len(), self.frame_len, "frame size mismatch");
        record.frames += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>> {
        let mut sessions = self.sessions.lock().unwrap();
        let record = &mut sessions[self.index];
        record.finished = true;
        Ok(format!("mock-video:{}", record.frames).into_bytes())
    }
}
