//! Frame-rate measurement.

/// Counts frames and reports the rate once per measurement window.
///
/// Driven by host time in seconds so that it works with any clock the
/// host already has (the egui frame time, a test counter, ...).
#[derive(Clone, Debug)]
pub struct FpsCounter {
    window_start: Option<f64>,
    frames: u32,
    fps: f32,
    window: f64,
}

impl FpsCounter {
    /// Measurement window used by the viewer.
    pub const DEFAULT_WINDOW: f64 = 1.0;

    pub fn new(window: f64) -> Self {
        Self {
            window_start: None,
            frames: 0,
            fps: 0.0,
            window,
        }
    }

    /// Records one frame at `now`.
    ///
    /// ### Returns
    /// The updated rate when a window just closed, `None` otherwise.
    pub fn frame(&mut self, now: f64) -> Option<f32> {
        let start = *self.window_start.get_or_insert(now);
        self.frames += 1;

        let span = now - start;
        if span < self.window {
            return None;
        }

        self.fps = (self.frames as f64 / span) as f32;
        self.frames = 0;
        self.window_start = Some(now);
        log::info!("{:.1} fps", self.fps);
        Some(self.fps)
    }

    /// Rate measured over the last complete window; `0` before the first.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn reset(&mut self) {
        self.window_start = None;
        self.frames = 0;
        self.fps = 0.0;
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_window() {
        let mut fps = FpsCounter::default();
        let mut reports = Vec::new();

        // 3 seconds at 60 Hz, plus the frame that closes the last window.
        for frame in 0..=180 {
            if let Some(rate) = fps.frame(frame as f64 / 60.0) {
                reports.push(rate);
            }
        }

        assert_eq!(reports.len(), 3);
        for rate in reports {
            assert!((rate - 60.0).abs() < 1.5, "rate {rate}");
        }
    }

    #[test]
    fn zero_until_first_window_closes() {
        let mut fps = FpsCounter::new(2.0);
        for frame in 0..100 {
            assert_eq!(fps.frame(frame as f64 / 60.0), None);
        }
        assert_eq!(fps.fps(), 0.0);
    }

    #[test]
    fn reset_forgets_history() {
        let mut fps = FpsCounter::new(0.5);
        for frame in 0..=60 {
            fps.frame(frame as f64 / 60.0);
        }
        assert!(fps.fps() > 0.0);

        fps.reset();
        assert_eq!(fps.fps(), 0.0);
        assert_eq!(fps.frame(10.0), None);
    }
}
