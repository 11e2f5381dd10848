//! Video export.
//!
//! The flow is fixed: negotiate a codec, size the capture, open one encoder
//! session, push one frame per clock tick until the [`VideoTimeline`] ends,
//! finish. Negotiation runs before anything with side effects, so a machine
//! with no usable encoder fails with [`ExportError::Capability`] and no child
//! process or scratch file is ever created.
//!
//! Encoding goes through a [`VideoBackend`]. The production backend is
//! [`FfmpegBackend`], which pipes raw RGBA frames into the system `ffmpeg`
//! and reads the finished file back from a scratch directory. Dropping an
//! unfinished [`FfmpegSession`] kills the child and removes the directory, so
//! a failed capture never leaves a partial file behind.

use super::{ArtifactKind, ExportArtifact};
use crate::asset::ImageAsset;
use crate::config::{RenderConfig, VideoConfig};
use crate::error::{ExportError, Result};
use crate::imaging::{CompositeFrame, Compositor, calculate_video_dimensions};
use crate::timeline::VideoTimeline;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Webm,
}

impl Container {
    pub fn extension(self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Container::Mp4 => "video/mp4",
            Container::Webm => "video/webm",
        }
    }
}

/// An encoder and the container it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VideoCodec {
    pub encoder: &'static str,
    pub container: Container,
}

/// Candidates in priority order: H.264 in mp4 first, then VP9/VP8 in webm.
pub const CODEC_CANDIDATES: [VideoCodec; 4] = [
    VideoCodec {
        encoder: "libx264",
        container: Container::Mp4,
    },
    VideoCodec {
        encoder: "libopenh264",
        container: Container::Mp4,
    },
    VideoCodec {
        encoder: "libvpx-vp9",
        container: Container::Webm,
    },
    VideoCodec {
        encoder: "libvpx",
        container: Container::Webm,
    },
];

/// Everything an encoder session needs up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub codec: VideoCodec,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate: u64,
}

impl SessionSpec {
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Something that can encode a stream of frames into a video file.
pub trait VideoBackend: Send + Sync {
    /// Whether `codec` can be used on this machine.
    fn supports(&self, codec: &VideoCodec) -> bool;

    /// Open a session. Nothing is written until frames are pushed.
    fn start(&self, spec: &SessionSpec) -> Result<Box<dyn VideoSession>>;
}

/// One in-progress encode. Finished at most once; dropping it unfinished
/// must release every resource without producing output.
pub trait VideoSession: Send {
    fn push_frame(&mut self, frame: &CompositeFrame) -> Result<()>;

    fn finish(self: Box<Self>) -> Result<Vec<u8>>;
}

/// First candidate the backend supports, or a `Capability` error.
pub fn negotiate(candidates: &[VideoCodec], backend: &dyn VideoBackend) -> Result<VideoCodec> {
    candidates
        .iter()
        .find(|c| backend.supports(c))
        .copied()
        .ok_or_else(|| {
            let tried: Vec<&str> = candidates.iter().map(|c| c.encoder).collect();
            ExportError::Capability(format!(
                "no supported video encoder (tried {})",
                tried.join(", ")
            ))
        })
}

// ============================================================================
// ffmpeg backend
// ============================================================================

/// Encodes through the system `ffmpeg` binary.
#[derive(Debug)]
pub struct FfmpegBackend {
    program: PathBuf,
    encoders: OnceLock<Vec<String>>,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::with_program("ffmpeg")
    }
}

impl FfmpegBackend {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            encoders: OnceLock::new(),
        }
    }

    /// Encoder names `ffmpeg -encoders` reports. Empty when ffmpeg is missing.
    fn encoders(&self) -> &[String] {
        self.encoders.get_or_init(|| {
            let output = Command::new(&self.program)
                .args(["-hide_banner", "-encoders"])
                .stdin(Stdio::null())
                .stderr(Stdio::null())
                .output();
            match output {
                Ok(out) if out.status.success() => {
                    let list = parse_encoder_list(&String::from_utf8_lossy(&out.stdout));
                    tracing::debug!(count = list.len(), "probed ffmpeg encoders");
                    list
                }
                Ok(out) => {
                    tracing::warn!(status = %out.status, "ffmpeg -encoders failed");
                    Vec::new()
                }
                Err(e) => {
                    tracing::warn!(program = %self.program.display(), "ffmpeg not available: {e}");
                    Vec::new()
                }
            }
        })
    }
}

/// Pull encoder names out of `ffmpeg -encoders` output.
///
/// Entries look like ` V....D libx264   libx264 H.264 / AVC ...`: a six-char
/// capability column followed by the name. Header lines are skipped.
pub fn parse_encoder_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            let is_entry = flags.len() == 6
                && flags.starts_with(['V', 'A', 'S'])
                && flags[1..].chars().all(|c| c == '.' || c.is_ascii_uppercase())
                && name != "=";
            is_entry.then(|| name.to_string())
        })
        .collect()
}

impl VideoBackend for FfmpegBackend {
    fn supports(&self, codec: &VideoCodec) -> bool {
        self.encoders().iter().any(|e| e == codec.encoder)
    }

    fn start(&self, spec: &SessionSpec) -> Result<Box<dyn VideoSession>> {
        Ok(Box::new(FfmpegSession::spawn(&self.program, spec)?))
    }
}

/// A running `ffmpeg` child writing into a scratch directory.
pub struct FfmpegSession {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    output: PathBuf,
    frame_len: usize,
    frames: u64,
    // Removed on drop, after the child is gone.
    _scratch: tempfile::TempDir,
}

impl FfmpegSession {
    fn spawn(program: &std::path::Path, spec: &SessionSpec) -> Result<Self> {
        if spec.width % 2 != 0 || spec.height % 2 != 0 {
            return Err(ExportError::encoding(format!(
                "capture size {}x{} must be even for yuv420p",
                spec.width, spec.height
            )));
        }

        let scratch = tempfile::Builder::new().prefix("diffslide-video").tempdir()?;
        let output = scratch
            .path()
            .join(format!("capture.{}", spec.codec.container.extension()));

        let mut cmd = Command::new(program);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .args(["-y", "-hide_banner", "-loglevel", "error"])
            .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
            .args(["-s", &format!("{}x{}", spec.width, spec.height)])
            .args(["-r", &spec.fps.to_string()])
            .args(["-i", "pipe:0", "-an"])
            .args(["-c:v", spec.codec.encoder])
            .args(["-b:v", &spec.bitrate.to_string()])
            .args(["-pix_fmt", "yuv420p"]);
        if spec.codec.container == Container::Mp4 {
            cmd.args(["-movflags", "+faststart"]);
        }
        cmd.arg(&output);

        let mut child = cmd
            .spawn()
            .map_err(|e| ExportError::Capability(format!("failed to start ffmpeg: {e}")))?;
        let stdin = child.stdin.take();
        if stdin.is_none() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExportError::encoding("ffmpeg stdin was not captured"));
        }

        tracing::debug!(
            encoder = spec.codec.encoder,
            width = spec.width,
            height = spec.height,
            fps = spec.fps,
            "ffmpeg session started"
        );
        Ok(Self {
            child: Some(child),
            stdin,
            output,
            frame_len: spec.frame_len(),
            frames: 0,
            _scratch: scratch,
        })
    }
}

impl VideoSession for FfmpegSession {
    fn push_frame(&mut self, frame: &CompositeFrame) -> Result<()> {
        if frame.as_raw().len() != self.frame_len {
            return Err(ExportError::encoding(format!(
                "frame is {} bytes, session expects {}",
                frame.as_raw().len(),
                self.frame_len
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ExportError::encoding("ffmpeg session already finished"))?;
        stdin.write_all(frame.as_raw()).map_err(|e| {
            ExportError::encoding(format!("writing frame {} to ffmpeg: {e}", self.frames))
        })?;
        self.frames += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<u8>> {
        // Closing stdin signals end of stream.
        drop(self.stdin.take());
        let child = self
            .child
            .take()
            .ok_or_else(|| ExportError::encoding("ffmpeg session already finished"))?;
        let out = child.wait_with_output()?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ExportError::encoding(format!(
                "ffmpeg exited with {}: {}",
                out.status,
                stderr.trim()
            )));
        }
        let bytes = std::fs::read(&self.output)?;
        if bytes.is_empty() {
            return Err(ExportError::encoding("ffmpeg produced an empty file"));
        }
        tracing::debug!(frames = self.frames, bytes = bytes.len(), "ffmpeg session finished");
        Ok(bytes)
    }
}

impl Drop for FfmpegSession {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            tracing::debug!(frames = self.frames, "ffmpeg session aborted");
        }
    }
}

// ============================================================================
// capture
// ============================================================================

/// Push one rendered frame per tick until the timeline ends. Returns the
/// number of frames pushed.
///
/// Offline capture samples frame `i` at exactly `i / fps` seconds. Realtime
/// capture samples the wall clock, sleeping between ticks, the way a screen
/// recorder paced by the display would.
pub fn capture(
    compositor: &Compositor,
    session: &mut dyn VideoSession,
    timeline: &VideoTimeline,
    fps: u32,
    realtime: bool,
) -> Result<u64> {
    let mut pushed = 0;
    if !realtime {
        for sample in timeline.frames(fps) {
            session.push_frame(&compositor.render(sample.position))?;
            pushed += 1;
        }
        return Ok(pushed);
    }

    let interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
    let start = Instant::now();
    loop {
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        let Some(position) = timeline.position_at(elapsed_ms) else {
            break;
        };
        session.push_frame(&compositor.render(position))?;
        pushed += 1;

        let next_tick = interval * pushed as u32;
        if let Some(wait) = next_tick.checked_sub(start.elapsed()) {
            std::thread::sleep(wait);
        }
    }
    Ok(pushed)
}

pub fn export_video(
    backend: &dyn VideoBackend,
    before: &ImageAsset,
    after: &ImageAsset,
    config: &VideoConfig,
    render: &RenderConfig,
) -> Result<ExportArtifact> {
    let codec = negotiate(&CODEC_CANDIDATES, backend)?;
    tracing::info!(encoder = codec.encoder, container = codec.container.extension(), "video codec selected");

    let (width, height) = calculate_video_dimensions(before.dimensions(), config.max_dimension);
    let compositor =
        Compositor::with_background(before, after, width, height, render.background_rgba());
    let spec = SessionSpec {
        codec,
        width,
        height,
        fps: config.fps,
        bitrate: config.bitrate,
    };

    let mut session = backend.start(&spec)?;
    let frames = capture(
        &compositor,
        session.as_mut(),
        &config.timeline(),
        config.fps,
        config.realtime,
    )?;
    let bytes = session.finish()?;
    tracing::debug!(frames, bytes = bytes.len(), width, height, "video encoded");

    Ok(ExportArtifact::new(
        ArtifactKind::Video,
        bytes,
        codec.container.extension(),
        codec.container.mime(),
    ))
}
