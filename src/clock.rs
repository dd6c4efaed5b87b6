use std::time::{Duration, Instant};

/// Fixed-rate frame pacing.
///
/// In realtime mode `wait_for_next_tick` sleeps until the next frame boundary.
/// A step that overruns its frame is not followed by catch-up steps: the
/// schedule restarts from the late tick, so steps never pile up.
#[derive(Debug)]
pub struct FrameClock {
    interval: Duration,
    realtime: bool,
    next_tick: Instant,
    overruns: u64,
}

impl FrameClock {
    pub fn new(fps: u32, realtime: bool) -> Self {
        let interval = Duration::from_secs_f64(1.0 / fps.max(1) as f64);
        FrameClock {
            interval,
            realtime,
            next_tick: Instant::now() + interval,
            overruns: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Steps that finished after their frame boundary.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Blocks until the next frame boundary (realtime mode only).
    /// Returns how long it slept.
    pub fn wait_for_next_tick(&mut self) -> Duration {
        if !self.realtime {
            return Duration::ZERO;
        }

        let now = Instant::now();
        if now >= self.next_tick {
            self.overruns += 1;
            log::trace!(
                "Frame overran by {:.2} ms",
                (now - self.next_tick).as_secs_f64() * 1000.0
            );
            self.next_tick = now + self.interval;
            return Duration::ZERO;
        }

        let remaining = self.next_tick - now;
        std::thread::sleep(remaining);
        self.next_tick += self.interval;
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_matches_fps() {
        let clock = FrameClock::new(60, false);
        assert!((clock.interval().as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
        assert_eq!(FrameClock::new(0, false).interval(), Duration::from_secs(1));
    }

    #[test]
    fn headless_clock_never_sleeps() {
        let mut clock = FrameClock::new(1, false);
        let start = Instant::now();
        for _ in 0..100 {
            assert_eq!(clock.wait_for_next_tick(), Duration::ZERO);
        }
        assert!(start.elapsed() < Duration::from_millis(500));
        assert_eq!(clock.overruns(), 0);
    }

    #[test]
    fn realtime_clock_paces_steps() {
        let mut clock = FrameClock::new(200, true);
        let start = Instant::now();
        for _ in 0..10 {
            clock.wait_for_next_tick();
        }
        // Ten 5 ms frames
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn overrun_is_counted_without_catch_up() {
        let mut clock = FrameClock::new(1000, true);
        std::thread::sleep(Duration::from_millis(20));

        let before = Instant::now();
        assert_eq!(clock.wait_for_next_tick(), Duration::ZERO);
        let after = Instant::now();
        assert_eq!(clock.overruns(), 1);

        // Rescheduled a full interval after the late tick, not at the missed boundary
        assert!(clock.next_tick >= before + clock.interval());
        assert!(clock.next_tick <= after + clock.interval());
    }
}
