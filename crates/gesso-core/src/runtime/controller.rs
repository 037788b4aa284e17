use std::sync::Arc;

use crate::input::{InputEvent, dispatcher};

use super::shared::Shared;

/// Cloneable host-side handle to a running sketch.
///
/// This is the producing-context face of the runtime: event posting, the
/// two scheduling hints, pause/resume, exit, and diagnostics queries. The
/// mutating entry points take the context lock, so they are for host
/// threads only; calling them from inside a sketch callback deadlocks.
#[derive(Clone)]
pub struct SketchController {
    shared: Arc<Shared>,
}

impl SketchController {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Posts an input event.
    ///
    /// While looping the event waits for the next frame's drain. While not
    /// looping there is no frame boundary coming, so the queue is drained
    /// inline on this thread before returning.
    pub fn post_event(&self, event: impl Into<InputEvent>) {
        self.shared.queue.push(event.into());
        if !self.shared.flags.looping() {
            let mut core = self.shared.core();
            if let Err(err) = dispatcher::drain(&mut core, &self.shared.queue) {
                self.shared.fail_run(err);
            }
        }
    }

    /// Retunes the frame rate target. Safe from any context.
    pub fn set_frame_rate(&self, fps: f32) {
        self.shared.surface.set_frame_rate(fps);
    }

    /// Requests a single frame. No-op unless the sketch is not looping.
    /// Safe from any context.
    pub fn request_redraw(&self) {
        if !self.shared.flags.looping() {
            self.shared.flags.set_redraw(true);
        }
    }

    /// Pauses frame production. Idempotent.
    pub fn pause(&self) {
        let result = self.shared.core().stop();
        if let Err(err) = result {
            self.shared.fail_run(err);
        }
    }

    /// Resumes frame production after a pause. Idempotent.
    pub fn resume(&self) {
        let result = self.shared.core().start();
        if let Err(err) = result {
            self.shared.fail_run(err);
        }
    }

    /// Requests a graceful exit: deferred to the frame boundary while
    /// looping, immediate otherwise.
    pub fn request_exit(&self) {
        self.shared.core().sketch.exit();
    }

    // ── diagnostics ──────────────────────────────────────────────────────

    pub fn frame_count(&self) -> u64 {
        self.shared.flags.frame_count()
    }

    pub fn frame_rate(&self) -> f32 {
        self.shared.flags.frame_rate()
    }

    pub fn is_looping(&self) -> bool {
        self.shared.flags.looping()
    }

    pub fn is_finished(&self) -> bool {
        self.shared.flags.finished()
    }
}
