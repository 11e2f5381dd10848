//! Split-position schedules for animated exports.
//!
//! Both schedules run the same cycle: hold on "after", sweep to "before",
//! hold, sweep back. [`VideoTimeline`] is continuous in time and sampled by a
//! frame clock; [`GifTimeline`] is a fixed list of discrete positions, each
//! with its own frame delay.
//!
//! Neither holds iteration state: every call to [`GifTimeline::iter`] or
//! [`VideoTimeline::frames`] yields the same sequence from the start.

use serde::{Deserialize, Serialize};

/// Quadratic ease-in-out on `[0, 1]`. Input is clamped.
///
/// ```
/// # use diffslide::timeline::ease;
/// assert_eq!(ease(0.0), 0.0);
/// assert_eq!(ease(0.5), 0.5);
/// assert_eq!(ease(1.0), 1.0);
/// ```
pub fn ease(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - 2.0 * (1.0 - t) * (1.0 - t)
    }
}

/// Time-based schedule: `hold@0 → ease 0→100 → hold@100 → ease 100→0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoTimeline {
    pub hold_ms: u64,
    pub sweep_ms: u64,
}

impl Default for VideoTimeline {
    fn default() -> Self {
        Self {
            hold_ms: 1000,
            sweep_ms: 1500,
        }
    }
}

impl VideoTimeline {
    pub fn total_ms(&self) -> u64 {
        2 * self.hold_ms + 2 * self.sweep_ms
    }

    /// Split position at `elapsed_ms`, or `None` once the cycle is over.
    pub fn position_at(&self, elapsed_ms: f64) -> Option<f64> {
        let hold = self.hold_ms as f64;
        let sweep = self.sweep_ms as f64;
        let e = elapsed_ms.max(0.0);

        if e < hold {
            Some(0.0)
        } else if e < hold + sweep {
            Some(ease((e - hold) / sweep) * 100.0)
        } else if e < 2.0 * hold + sweep {
            Some(100.0)
        } else if e < self.total_ms() as f64 {
            Some(100.0 - ease((e - 2.0 * hold - sweep) / sweep) * 100.0)
        } else {
            None
        }
    }

    /// Offline frame clock: frame `i` is sampled at `i * 1000 / fps` ms.
    pub fn frames(&self, fps: u32) -> VideoFrames {
        VideoFrames {
            timeline: *self,
            interval_ms: 1000.0 / fps.max(1) as f64,
            index: 0,
        }
    }
}

/// One sampled video frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSample {
    pub index: u64,
    pub elapsed_ms: f64,
    pub position: f64,
}

#[derive(Debug, Clone)]
pub struct VideoFrames {
    timeline: VideoTimeline,
    interval_ms: f64,
    index: u64,
}

impl Iterator for VideoFrames {
    type Item = VideoSample;

    fn next(&mut self) -> Option<VideoSample> {
        let elapsed_ms = self.index as f64 * self.interval_ms;
        let position = self.timeline.position_at(elapsed_ms)?;
        let sample = VideoSample {
            index: self.index,
            elapsed_ms,
            position,
        };
        self.index += 1;
        Some(sample)
    }
}

/// Step-based schedule for GIF frames. Delays are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GifTimeline {
    pub step: u32,
    pub sweep_delay_ms: u32,
    pub hold_delay_ms: u32,
}

impl Default for GifTimeline {
    fn default() -> Self {
        Self {
            step: 4,
            sweep_delay_ms: 5,
            hold_delay_ms: 200,
        }
    }
}

/// One GIF frame: where the split sits and how long the frame shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GifSample {
    pub position: u32,
    pub delay_ms: u32,
}

impl GifTimeline {
    /// Forward sweep, hold at 100, reverse sweep, hold at 0.
    pub fn iter(&self) -> impl Iterator<Item = GifSample> + Clone + use<> {
        let step = self.step.max(1) as usize;
        let sweep = self.sweep_delay_ms;
        let hold = self.hold_delay_ms;
        let at = move |position: u32, delay_ms: u32| GifSample { position, delay_ms };

        let forward = (0..=100u32).step_by(step).map(move |p| at(p, sweep));
        let reverse = (0..=100u32).rev().step_by(step).map(move |p| at(p, sweep));
        forward
            .chain(std::iter::once(at(100, hold)))
            .chain(reverse)
            .chain(std::iter::once(at(0, hold)))
    }

    pub fn len(&self) -> usize {
        let per_sweep = 100 / self.step.max(1) as usize + 1;
        2 * per_sweep + 2
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn total_delay_ms(&self) -> u64 {
        self.iter().map(|s| s.delay_ms as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // ease
    // =========================================================================

    #[test]
    fn ease_fixed_points() {
        assert_eq!(ease(0.0), 0.0);
        assert_eq!(ease(0.5), 0.5);
        assert_eq!(ease(1.0), 1.0);
    }

    #[test]
    fn ease_clamps_input() {
        assert_eq!(ease(-3.0), 0.0);
        assert_eq!(ease(7.0), 1.0);
    }

    #[test]
    fn ease_is_non_decreasing() {
        let mut prev = ease(0.0);
        for i in 1..=1000 {
            let v = ease(i as f64 / 1000.0);
            assert!(v >= prev, "ease decreased at {i}");
            prev = v;
        }
    }

    #[test]
    fn ease_is_symmetric() {
        for i in 0..=100 {
            let t = i as f64 / 100.0;
            assert!((ease(t) + ease(1.0 - t) - 1.0).abs() < 1e-12);
        }
    }

    // =========================================================================
    // video timeline
    // =========================================================================

    #[test]
    fn video_phases() {
        let tl = VideoTimeline::default();
        assert_eq!(tl.position_at(0.0), Some(0.0));
        assert_eq!(tl.position_at(999.0), Some(0.0));
        assert_eq!(tl.position_at(1750.0), Some(50.0));
        assert_eq!(tl.position_at(2500.0), Some(100.0));
        assert_eq!(tl.position_at(3499.0), Some(100.0));
        assert_eq!(tl.position_at(4250.0), Some(50.0));
        assert_eq!(tl.position_at(5000.0), None);
    }

    #[test]
    fn video_total_is_two_holds_two_sweeps() {
        assert_eq!(VideoTimeline::default().total_ms(), 5000);
        let tl = VideoTimeline {
            hold_ms: 200,
            sweep_ms: 300,
        };
        assert_eq!(tl.total_ms(), 1000);
    }

    #[test]
    fn video_frames_at_30fps() {
        let tl = VideoTimeline::default();
        let frames: Vec<_> = tl.frames(30).collect();
        assert_eq!(frames.len(), 150);
        let last = frames.last().unwrap();
        // Last frame lands within one capture interval of the end
        assert!(tl.total_ms() as f64 - last.elapsed_ms <= 1000.0 / 30.0);
        assert_eq!(frames[0].position, 0.0);
    }

    #[test]
    fn video_frames_restart() {
        let tl = VideoTimeline::default();
        let a: Vec<_> = tl.frames(30).collect();
        let b: Vec<_> = tl.frames(30).collect();
        assert_eq!(a, b);
    }

    // =========================================================================
    // gif timeline
    // =========================================================================

    #[test]
    fn gif_default_has_54_samples() {
        let tl = GifTimeline::default();
        assert_eq!(tl.iter().count(), 54);
        assert_eq!(tl.len(), 54);
    }

    #[test]
    fn gif_default_shape() {
        let samples: Vec<_> = GifTimeline::default().iter().collect();
        assert_eq!(samples[0], GifSample { position: 0, delay_ms: 5 });
        assert_eq!(samples[25], GifSample { position: 100, delay_ms: 5 });
        assert_eq!(samples[26], GifSample { position: 100, delay_ms: 200 });
        assert_eq!(samples[27], GifSample { position: 100, delay_ms: 5 });
        assert_eq!(samples[52], GifSample { position: 0, delay_ms: 5 });
        assert_eq!(samples[53], GifSample { position: 0, delay_ms: 200 });
    }

    #[test]
    fn gif_step_not_dividing_100() {
        let tl = GifTimeline {
            step: 3,
            ..Default::default()
        };
        let samples: Vec<_> = tl.iter().collect();
        assert_eq!(samples.len(), tl.len());
        // Forward stops at 99, then the explicit hold at 100
        assert_eq!(samples[33].position, 99);
        assert_eq!(samples[34], GifSample { position: 100, delay_ms: 200 });
        // Reverse starts at 100 and stops at 1
        assert_eq!(samples[35].position, 100);
        assert_eq!(samples[68].position, 1);
        assert_eq!(samples[69], GifSample { position: 0, delay_ms: 200 });
    }

    #[test]
    fn gif_iter_is_restartable() {
        let tl = GifTimeline::default();
        let a: Vec<_> = tl.iter().collect();
        let b: Vec<_> = tl.iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn gif_total_delay() {
        // 52 sweep frames at 5ms + 2 holds at 200ms
        assert_eq!(GifTimeline::default().total_delay_ms(), 52 * 5 + 400);
    }
}
