//! Headless surface: the frame loop on a plain named thread.
//!
//! This is the surface every sketch gets unless the builder installs another
//! one. It has no window and no input source of its own; events arrive only
//! through the controller. What it does provide:
//!
//! - a dedicated `gesso-animation` thread running the frame loop
//! - pacing toward the target rate via [`FramePacer`]
//! - pause/resume parking on a condvar
//! - first-stop semantics so teardown runs once

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use crate::schedule::{FrameControl, FrameDriver};
use crate::time::{FramePacer, period_nanos};

use super::{CursorKind, Surface};

struct ThreadState {
    started: bool,
    paused: bool,
    stopped: bool,
}

struct SurfaceState {
    state: Mutex<ThreadState>,
    unpaused: Condvar,
    /// Pacing target in nanoseconds, shared with the loop's [`FramePacer`].
    period: Arc<AtomicU64>,
}

impl SurfaceState {
    fn locked(&self) -> MutexGuard<'_, ThreadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Surface without a window.
///
/// Cursor operations are accepted and ignored.
pub struct HeadlessSurface {
    inner: Arc<SurfaceState>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SurfaceState {
                state: Mutex::new(ThreadState {
                    started: false,
                    paused: false,
                    stopped: false,
                }),
                unpaused: Condvar::new(),
                period: Arc::new(AtomicU64::new(period_nanos(60.0))),
            }),
        }
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for HeadlessSurface {
    fn start(&self, driver: FrameDriver) {
        {
            let mut state = self.inner.locked();
            if state.started {
                log::warn!("animation thread already started; ignoring start");
                return;
            }
            state.started = true;
        }

        let inner = Arc::clone(&self.inner);
        let loop_driver = driver.clone();
        let spawned = thread::Builder::new()
            .name("gesso-animation".into())
            .spawn(move || run_loop(&inner, &loop_driver));

        if let Err(err) = spawned {
            driver.fail(anyhow::Error::new(err).context("spawning the animation thread failed"));
            driver.shutdown();
        }
    }

    fn pause(&self) {
        self.inner.locked().paused = true;
    }

    fn resume(&self) {
        self.inner.locked().paused = false;
        self.inner.unpaused.notify_all();
    }

    fn stop(&self) -> bool {
        let mut state = self.inner.locked();
        let first = !state.stopped;
        state.stopped = true;
        // A paused loop must wake to observe the stop.
        self.inner.unpaused.notify_all();
        first
    }

    fn is_stopped(&self) -> bool {
        self.inner.locked().stopped
    }

    fn set_frame_rate(&self, fps: f32) {
        if !fps.is_finite() || fps <= 0.0 {
            log::warn!("ignoring frame rate target {fps}; it must be finite and positive");
            return;
        }
        self.inner.period.store(period_nanos(fps), Ordering::Relaxed);
    }

    fn set_cursor(&self, _cursor: CursorKind) {}

    fn show_cursor(&self) {}

    fn hide_cursor(&self) {}
}

/// Marks the run complete when the loop ends, panicking or not.
struct CompletionGuard {
    driver: FrameDriver,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("animation thread panicked; shutting the sketch down");
            self.driver.mark_panicked();
        }
        self.driver.shutdown();
    }
}

fn run_loop(inner: &SurfaceState, driver: &FrameDriver) {
    let _completion = CompletionGuard {
        driver: driver.clone(),
    };
    let mut pacer = FramePacer::new(Arc::clone(&inner.period));

    driver.begin();

    loop {
        if driver.is_finished() || inner.locked().stopped {
            break;
        }
        wait_while_paused(inner, driver);
        if driver.is_finished() || inner.locked().stopped {
            break;
        }

        match driver.run_frame() {
            Ok(FrameControl::Continue) => {}
            Ok(FrameControl::Exit) => break,
            Err(err) => {
                driver.fail(err.into());
                break;
            }
        }

        pacer.pace();
    }
}

/// Parks the loop while paused.
///
/// Waits with a timeout of one frame period and re-checks the finish and
/// stop flags each wakeup, so an exit requested while paused still tears
/// the sketch down promptly.
fn wait_while_paused(inner: &SurfaceState, driver: &FrameDriver) {
    let mut state = inner.locked();
    while state.paused && !state.stopped && !driver.is_finished() {
        let period = Duration::from_nanos(inner.period.load(Ordering::Relaxed));
        let (next, _) = inner
            .unpaused
            .wait_timeout(state, period)
            .unwrap_or_else(PoisonError::into_inner);
        state = next;
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
