use std::collections::VecDeque;

/// Rolling window the fps figure is computed over, in milliseconds.
const WINDOW_MS: f64 = 1000.0;

/// Frame timing: fps over the last second and per-frame milliseconds.
///
/// Fed one timestamp per rendered frame, in milliseconds from any fixed
/// origin (the loop's refresh timestamp).
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// (timestamp, frame duration) for frames inside the window.
    window: VecDeque<(f64, f64)>,
    last_time: Option<f64>,
    last_frame_ms: f64,
    frames: u64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, now_ms: f64) {
        let frame_ms = self.last_time.map_or(0.0, |t| (now_ms - t).max(0.0));
        self.last_time = Some(now_ms);
        self.last_frame_ms = frame_ms;
        self.frames += 1;
        self.window.push_back((now_ms, frame_ms));
        while let Some(&(t, _)) = self.window.front() {
            if now_ms - t > WINDOW_MS {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Frames per second across the window; 0 until two frames are seen.
    pub fn fps(&self) -> f64 {
        let (Some(first), Some(last)) = (self.window.front(), self.window.back()) else {
            return 0.0;
        };
        let span = last.0 - first.0;
        if span <= 0.0 {
            return 0.0;
        }
        (self.window.len() - 1) as f64 * 1000.0 / span
    }

    pub fn last_frame_ms(&self) -> f64 {
        self.last_frame_ms
    }

    pub fn average_frame_ms(&self) -> f64 {
        // the oldest entry's duration belongs to a frame before the window
        let durations: Vec<f64> = self.window.iter().skip(1).map(|(_, d)| *d).collect();
        if durations.is_empty() {
            return 0.0;
        }
        durations.iter().sum::<f64>() / durations.len() as f64
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl std::fmt::Display for FrameStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.0} FPS ({:.1} ms)",
            self.fps(),
            self.average_frame_ms()
        )
    }
}
