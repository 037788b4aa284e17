use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::input::EventQueue;
use crate::sketch::{ExitAction, SketchCore};
use crate::surface::Surface;

/// Flags crossing between the animation context and producing contexts.
///
/// The booleans are the only state producers mutate directly (looping,
/// redraw-pending, exit machinery). Frame count and frame rate are mirrors
/// the scheduler publishes after each frame so diagnostics reads never take
/// the context lock.
pub(crate) struct SharedFlags {
    looping: AtomicBool,
    redraw: AtomicBool,
    finished: AtomicBool,
    exit_requested: AtomicBool,
    inside_frame: AtomicBool,
    panicked: AtomicBool,
    frame_count: AtomicU64,
    frame_rate_bits: AtomicU32,
    fatal: Mutex<Option<anyhow::Error>>,
    done: Mutex<bool>,
    done_cv: Condvar,
}

impl SharedFlags {
    pub(crate) fn new() -> Self {
        Self {
            looping: AtomicBool::new(true),
            // Pending from the start so the first frame draws even when
            // looping is turned off during setup.
            redraw: AtomicBool::new(true),
            finished: AtomicBool::new(false),
            exit_requested: AtomicBool::new(false),
            inside_frame: AtomicBool::new(false),
            panicked: AtomicBool::new(false),
            frame_count: AtomicU64::new(0),
            frame_rate_bits: AtomicU32::new(10.0f32.to_bits()),
            fatal: Mutex::new(None),
            done: Mutex::new(false),
            done_cv: Condvar::new(),
        }
    }

    pub(crate) fn looping(&self) -> bool {
        self.looping.load(Ordering::SeqCst)
    }

    pub(crate) fn set_looping(&self, looping: bool) {
        self.looping.store(looping, Ordering::SeqCst);
    }

    pub(crate) fn redraw(&self) -> bool {
        self.redraw.load(Ordering::SeqCst)
    }

    pub(crate) fn set_redraw(&self, redraw: bool) {
        self.redraw.store(redraw, Ordering::SeqCst);
    }

    pub(crate) fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub(crate) fn set_finished(&self, finished: bool) {
        self.finished.store(finished, Ordering::SeqCst);
    }

    pub(crate) fn exit_requested(&self) -> bool {
        self.exit_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn set_exit_requested(&self, requested: bool) {
        self.exit_requested.store(requested, Ordering::SeqCst);
    }

    /// Claims the frame-in-progress marker. `false` means a frame is
    /// already running and the caller is re-entering.
    pub(crate) fn try_enter_frame(&self) -> bool {
        self.inside_frame
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn leave_frame(&self) {
        self.inside_frame.store(false, Ordering::SeqCst);
    }

    pub(crate) fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    pub(crate) fn store_frame_count(&self, count: u64) {
        self.frame_count.store(count, Ordering::Relaxed);
    }

    pub(crate) fn frame_rate(&self) -> f32 {
        f32::from_bits(self.frame_rate_bits.load(Ordering::Relaxed))
    }

    pub(crate) fn store_frame_rate(&self, rate: f32) {
        self.frame_rate_bits.store(rate.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn panicked(&self) -> bool {
        self.panicked.load(Ordering::SeqCst)
    }

    pub(crate) fn set_panicked(&self) {
        self.panicked.store(true, Ordering::SeqCst);
    }

    /// Stores the first fatal error of the run; later ones are only logged.
    pub(crate) fn store_fatal(&self, err: anyhow::Error) {
        let mut slot = self.fatal.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        } else {
            log::error!("further failure while already failing: {err:#}");
        }
    }

    pub(crate) fn take_fatal(&self) -> Option<anyhow::Error> {
        self.fatal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Wakes everyone blocked in [`SharedFlags::wait_done`].
    pub(crate) fn mark_done(&self) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        *done = true;
        self.done_cv.notify_all();
    }

    /// Blocks until the animation thread has fully wound down.
    pub(crate) fn wait_done(&self) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        while !*done {
            done = self
                .done_cv
                .wait(done)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Everything the runtime, the frame driver, and controller handles share.
///
/// The sketch core sits behind one exclusive lock which doubles as the
/// dispatch-exclusion lock; producing-context entry points (inline drain,
/// pause, resume, exit) take it, so they must never be called from inside a
/// sketch callback.
pub(crate) struct Shared {
    pub(crate) core: Mutex<SketchCore>,
    pub(crate) queue: Arc<EventQueue>,
    pub(crate) flags: Arc<SharedFlags>,
    pub(crate) surface: Arc<dyn Surface>,
    pub(crate) exit_action: ExitAction,
}

impl Shared {
    // A callback panic unwinds through this lock; shutdown still needs the
    // core to dispose renderers.
    pub(crate) fn core(&self) -> MutexGuard<'_, SketchCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records a fatal failure and ends the run. The error surfaces from
    /// `Runtime::run` once the animation thread winds down.
    pub(crate) fn fail_run(&self, err: anyhow::Error) {
        log::error!("{err:#}");
        self.flags.store_fatal(err);
        self.flags.set_finished(true);
    }
}
