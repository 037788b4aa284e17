use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Frames of sustained overrun before the pacer yields the thread.
const NO_DELAYS_PER_YIELD: u32 = 15;

/// Converts a frames-per-second target into a period in nanoseconds.
///
/// Callers validate `fps` before handing it over; this only guards the
/// arithmetic.
pub fn period_nanos(fps: f32) -> u64 {
    (1_000_000_000.0 / f64::from(fps)) as u64
}

/// Paces a frame loop toward a target period.
///
/// The period lives in a shared atomic so the target can be retuned while
/// the loop is running. Sleep overshoot is measured and debited from the
/// next cycle; when frames persistently take longer than the period the
/// pacer stops sleeping and instead yields every [`NO_DELAYS_PER_YIELD`]
/// frames so starved threads still get scheduled.
pub struct FramePacer {
    period: Arc<AtomicU64>,
    before: Instant,
    over_sleep: Duration,
    no_delays: u32,
}

impl FramePacer {
    pub fn new(period: Arc<AtomicU64>) -> Self {
        Self {
            period,
            before: Instant::now(),
            over_sleep: Duration::ZERO,
            no_delays: 0,
        }
    }

    /// Call once per frame, after the frame's work is done.
    pub fn pace(&mut self) {
        let after = Instant::now();
        let work = after.saturating_duration_since(self.before);
        let period = Duration::from_nanos(self.period.load(Ordering::Relaxed));

        let budget = work + self.over_sleep;
        if budget < period {
            let sleep_for = period - budget;
            thread::sleep(sleep_for);
            self.no_delays = 0;
            self.over_sleep = Instant::now()
                .saturating_duration_since(after)
                .saturating_sub(sleep_for);
        } else {
            self.over_sleep = Duration::ZERO;
            self.no_delays += 1;
            if self.no_delays > NO_DELAYS_PER_YIELD {
                thread::yield_now();
                self.no_delays = 0;
            }
        }

        self.before = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_fps_to_a_nanosecond_period() {
        assert_eq!(period_nanos(10.0), 100_000_000);
        assert_eq!(period_nanos(60.0), 16_666_666);
    }

    #[test]
    fn sleeps_out_the_remainder_of_the_period() {
        let period = Arc::new(AtomicU64::new(20_000_000));
        let mut pacer = FramePacer::new(period);

        let start = Instant::now();
        pacer.pace();
        // Generous lower bound; the cycle began at construction.
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn overrun_frames_do_not_sleep() {
        let period = Arc::new(AtomicU64::new(1));
        let mut pacer = FramePacer::new(period);

        let start = Instant::now();
        for _ in 0..50 {
            pacer.pace();
        }
        assert!(start.elapsed() < Duration::from_millis(200));
    }
}
