//! Frame scheduling.
//!
//! [`FrameDriver`] runs the fixed per-frame sequence on behalf of a surface:
//!
//! 1. skip when no renderer is bound, or neither looping nor a redraw is
//!    pending (the frame counter does not advance)
//! 2. begin-frame on the primary renderer and any attached recorder
//! 3. frame 0 runs `setup` and nothing else
//! 4. later frames fold the measured rate into the smoothed frame rate,
//!    fire `pre` hooks, rebind the frame-stable previous pointer position,
//!    run `draw`, snapshot the end-of-frame pointer reference, drain the
//!    event queue, fire `draw` and `post` hooks, and clear the redraw flag
//! 5. end-frame on the renderers
//! 6. advance the frame counter and record the frame-start timestamp
//! 7. honor a pending exit request now that the frame is complete
//!
//! Frames never nest. The driver refuses to start a frame while another is
//! in flight; that means the driving surface is broken, and the failure is
//! fatal.

use std::process;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;

use crate::error::FrameError;
use crate::hooks::Hook;
use crate::input::dispatcher;
use crate::runtime::{Shared, SharedFlags};
use crate::sketch::{ExitAction, SketchCore};

/// What the surface loop should do after a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameControl {
    Continue,
    Exit,
}

/// Per-frame entry point handed to the driving surface.
///
/// Clones share the same sketch; a surface keeps one for its animation
/// thread and calls [`FrameDriver::run_frame`] once per frame.
#[derive(Clone)]
pub struct FrameDriver {
    shared: Arc<Shared>,
}

impl FrameDriver {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Runs the resume path once, as the animation thread starts.
    pub fn begin(&self) {
        let result = self.shared.core().start();
        if let Err(err) = result {
            self.shared.fail_run(err);
        }
    }

    /// Runs one frame now.
    pub fn run_frame(&self) -> Result<FrameControl, FrameError> {
        self.run_frame_at(Instant::now())
    }

    /// Whether the run is over and the loop should wind down.
    pub fn is_finished(&self) -> bool {
        self.shared.flags.finished()
    }

    /// Records a fatal surface-side failure; the run ends with it.
    pub fn fail(&self, err: anyhow::Error) {
        self.shared.fail_run(err);
    }

    /// Notes that the animation thread is unwinding from a panic.
    pub(crate) fn mark_panicked(&self) {
        self.shared.flags.set_panicked();
        self.shared.flags.set_finished(true);
    }

    /// Final teardown. Idempotent; surfaces call it as their thread winds
    /// down, including when unwinding from a panic.
    pub fn shutdown(&self) {
        match self.shared.core.try_lock() {
            Ok(mut core) => core.sketch.dispose(),
            Err(std::sync::TryLockError::Poisoned(poisoned)) => {
                poisoned.into_inner().sketch.dispose();
            }
            Err(std::sync::TryLockError::WouldBlock) => {
                log::warn!("sketch core still busy during shutdown; skipping disposal");
            }
        }
        self.shared.flags.mark_done();
    }

    pub(crate) fn run_frame_at(&self, now: Instant) -> Result<FrameControl, FrameError> {
        if !self.shared.flags.try_enter_frame() {
            log::error!(
                "frame re-entered at frame {}: {}",
                self.shared.flags.frame_count(),
                FrameError::Reentrant
            );
            match self.shared.exit_action {
                ExitAction::TerminateProcess => {
                    // The offending frame holds the core lock, so disposal
                    // is attempted but may be skipped.
                    if let Ok(mut core) = self.shared.core.try_lock() {
                        core.sketch.dispose();
                    }
                    process::exit(1);
                }
                ExitAction::ReturnFromRun => return Err(FrameError::Reentrant),
            }
        }
        let _guard = FrameGuard {
            flags: &self.shared.flags,
        };
        let mut core = self.shared.core();
        Ok(frame_body(&mut core, &self.shared, now))
    }
}

/// Clears the frame-in-progress marker even when a callback panics.
struct FrameGuard<'a> {
    flags: &'a SharedFlags,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.flags.leave_frame();
    }
}

fn frame_body(core: &mut SketchCore, shared: &Shared, now: Instant) -> FrameControl {
    let flags = &shared.flags;

    if core.sketch.primary.is_none() || (!flags.looping() && !flags.redraw()) {
        return FrameControl::Continue;
    }

    core.sketch.begin_frame_renderers();

    if core.sketch.frame_count == 0 {
        if let Some(setup) = core.callbacks.setup.as_mut() {
            if let Err(err) = setup(&mut core.sketch).context("setup failed") {
                shared.fail_run(err);
                return FrameControl::Continue;
            }
        }
    } else {
        if let Some(last) = core.sketch.last_frame_start {
            let elapsed = now.saturating_duration_since(last).as_nanos() as u64;
            if elapsed > 0 {
                let instantaneous = 1.0e9_f32 / elapsed as f32;
                core.sketch.frame_rate = core.sketch.frame_rate * 0.9 + instantaneous * 0.1;
                flags.store_frame_rate(core.sketch.frame_rate);
            }
        }

        let hooks = Arc::clone(&core.sketch.hooks);
        hooks.fire(Hook::Pre, &core.sketch);

        // Once per frame the sketch-visible previous position becomes the
        // position at the end of the previous frame, so code reading it
        // during draw sees a stable value.
        core.sketch.prev_pointer_x = core.sketch.frame_pointer_x;
        core.sketch.prev_pointer_y = core.sketch.frame_pointer_y;

        if let Some(draw) = core.callbacks.draw.as_mut() {
            if let Err(err) = draw(&mut core.sketch).context("draw failed") {
                shared.fail_run(err);
                return FrameControl::Continue;
            }
        }

        core.sketch.frame_pointer_x = core.sketch.pointer_x;
        core.sketch.frame_pointer_y = core.sketch.pointer_y;

        if let Err(err) = dispatcher::drain(core, &shared.queue) {
            shared.fail_run(err);
            return FrameControl::Continue;
        }

        let hooks = Arc::clone(&core.sketch.hooks);
        hooks.fire(Hook::Draw, &core.sketch);
        hooks.fire(Hook::Post, &core.sketch);

        flags.set_redraw(false);
    }

    core.sketch.end_frame_renderers();

    core.sketch.frame_count += 1;
    flags.store_frame_count(core.sketch.frame_count);
    core.sketch.last_frame_start = Some(now);

    if flags.exit_requested() {
        // The frame completed in full; tear down here, on the animation
        // context, where the sketch is still coherent.
        core.sketch.dispose();
        core.sketch.exit_now(0);
        return FrameControl::Exit;
    }
    if flags.finished() {
        return FrameControl::Exit;
    }
    FrameControl::Continue
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use super::*;
    use crate::hooks::{HookResult, SharedHook, SketchHook, shared};
    use crate::input::{PointerAction, PointerEvent};
    use crate::render::{HeadlessRenderer, RenderStats};
    use crate::runtime::Runtime;
    use crate::sketch::{ExitAction, Sketch, SketchBuilder};

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn hooked(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> SharedHook {
            shared(Recorder {
                label,
                log: log.clone(),
            })
        }

        fn note(&self) {
            self.log.lock().unwrap().push(self.label.to_string());
        }
    }

    impl SketchHook for Recorder {
        fn pre(&mut self, _sketch: &Sketch) -> HookResult {
            self.note();
            Ok(())
        }

        fn draw(&mut self, _sketch: &Sketch) -> HookResult {
            self.note();
            Ok(())
        }

        fn post(&mut self, _sketch: &Sketch) -> HookResult {
            self.note();
            Ok(())
        }
    }

    fn booted(builder: SketchBuilder) -> Runtime {
        let runtime = builder.exit_action(ExitAction::ReturnFromRun).build().unwrap();
        runtime.bootstrap().unwrap();
        runtime
    }

    fn counted(builder: SketchBuilder) -> (SketchBuilder, Arc<RenderStats>) {
        let stats = Arc::new(RenderStats::default());
        let factory_stats = stats.clone();
        let builder = builder
            .register_renderer(
                "counted",
                false,
                Box::new(move |_| Ok(Box::new(HeadlessRenderer::with_stats(factory_stats.clone())))),
            )
            .renderer("counted");
        (builder, stats)
    }

    // ── ordering ─────────────────────────────────────────────────────────

    #[test]
    fn frame_sequence_routes_events_between_draw_and_post() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let setup_log = log.clone();
        let draw_log = log.clone();
        let event_log = log.clone();
        let runtime = booted(
            SketchBuilder::new()
                .setup(move |_| {
                    setup_log.lock().unwrap().push("setup".to_string());
                    Ok(())
                })
                .draw(move |_| {
                    draw_log.lock().unwrap().push("draw".to_string());
                    Ok(())
                })
                .pointer_moved(move |_, _| {
                    event_log.lock().unwrap().push("event".to_string());
                    Ok(())
                })
                .hook(Hook::Pre, "probe-pre", Recorder::hooked("pre", &log))
                .hook(Hook::Draw, "probe-draw", Recorder::hooked("draw-hook", &log))
                .hook(Hook::Post, "probe-post", Recorder::hooked("post", &log)),
        );
        let driver = runtime.frame_driver();

        let t0 = Instant::now();
        assert_eq!(driver.run_frame_at(t0).unwrap(), FrameControl::Continue);
        runtime
            .controller()
            .post_event(PointerEvent::new(PointerAction::Move, 3, 4));
        assert_eq!(
            driver.run_frame_at(t0 + Duration::from_millis(16)).unwrap(),
            FrameControl::Continue
        );

        assert_eq!(
            *log.lock().unwrap(),
            vec!["setup", "pre", "draw", "event", "draw-hook", "post"]
        );
    }

    #[test]
    fn frame_counter_is_zero_during_setup_and_advances_once_per_frame() {
        let counts = Arc::new(Mutex::new(Vec::new()));
        let setup_counts = counts.clone();
        let draw_counts = counts.clone();
        let runtime = booted(
            SketchBuilder::new()
                .setup(move |s| {
                    setup_counts.lock().unwrap().push(s.frame_count());
                    Ok(())
                })
                .draw(move |s| {
                    draw_counts.lock().unwrap().push(s.frame_count());
                    Ok(())
                }),
        );
        let driver = runtime.frame_driver();

        let t0 = Instant::now();
        for i in 0..3 {
            driver.run_frame_at(t0 + Duration::from_millis(16 * i)).unwrap();
        }

        assert_eq!(*counts.lock().unwrap(), vec![0, 1, 2]);
        assert_eq!(runtime.controller().frame_count(), 3);
    }

    // ── looping and redraw ───────────────────────────────────────────────

    #[test]
    fn no_loop_runs_one_more_frame_then_waits_for_redraw() {
        let draws = Arc::new(Mutex::new(0));
        let counter = draws.clone();
        let runtime = booted(
            SketchBuilder::new()
                .setup(|s| {
                    s.set_looping(false);
                    Ok(())
                })
                .draw(move |_| {
                    *counter.lock().unwrap() += 1;
                    Ok(())
                }),
        );
        let driver = runtime.frame_driver();

        let t0 = Instant::now();
        for i in 0..4 {
            driver.run_frame_at(t0 + Duration::from_millis(16 * i)).unwrap();
        }
        // The redraw pending at startup covers exactly one drawn frame.
        assert_eq!(*draws.lock().unwrap(), 1);
        assert_eq!(runtime.controller().frame_count(), 2);

        runtime.controller().request_redraw();
        driver.run_frame_at(t0 + Duration::from_millis(80)).unwrap();
        assert_eq!(*draws.lock().unwrap(), 2);
    }

    // ── frame rate smoothing ─────────────────────────────────────────────

    #[test]
    fn measured_rate_holds_steady_at_matching_cadence() {
        let runtime = booted(SketchBuilder::new().draw(|_| Ok(())));
        let driver = runtime.frame_driver();

        let t0 = Instant::now();
        for i in 0..10 {
            driver.run_frame_at(t0 + Duration::from_millis(100 * i)).unwrap();
        }
        // 100ms frames measure exactly the 10fps starting value.
        assert!((runtime.controller().frame_rate() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn measured_rate_converges_monotonically_toward_the_actual_rate() {
        let runtime = booted(SketchBuilder::new().draw(|_| Ok(())));
        let driver = runtime.frame_driver();
        let controller = runtime.controller();

        let t0 = Instant::now();
        driver.run_frame_at(t0).unwrap();

        let mut previous = controller.frame_rate();
        assert_eq!(previous, 10.0);
        for i in 1..=8 {
            driver.run_frame_at(t0 + Duration::from_millis(200 * i)).unwrap();
            let rate = controller.frame_rate();
            assert!(rate < previous);
            assert!(rate > 5.0);
            previous = rate;
        }
    }

    // ── exit and disposal ────────────────────────────────────────────────

    #[test]
    fn exit_from_draw_completes_the_frame_before_disposal() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (builder, stats) = counted(SketchBuilder::new());

        let draw_log = log.clone();
        let event_log = log.clone();
        let runtime = booted(
            builder
                .draw(move |s| {
                    draw_log.lock().unwrap().push("draw".to_string());
                    s.exit();
                    Ok(())
                })
                .pointer_moved(move |_, _| {
                    event_log.lock().unwrap().push("event".to_string());
                    Ok(())
                })
                .hook(Hook::Post, "probe", Recorder::hooked("post", &log)),
        );
        let driver = runtime.frame_driver();
        let controller = runtime.controller();

        let t0 = Instant::now();
        driver.run_frame_at(t0).unwrap();
        controller.post_event(PointerEvent::new(PointerAction::Move, 1, 2));

        let control = driver
            .run_frame_at(t0 + Duration::from_millis(16))
            .unwrap();
        assert_eq!(control, FrameControl::Exit);

        // Event drain and post hooks ran despite the exit, the frame was
        // closed on the renderer, and teardown ran exactly once.
        assert_eq!(*log.lock().unwrap(), vec!["draw", "event", "post"]);
        assert_eq!(stats.frames_ended(), 2);
        assert_eq!(stats.disposals(), 1);
        assert!(controller.is_finished());

        driver.shutdown();
        assert_eq!(stats.disposals(), 1);
    }

    #[test]
    fn recorder_mirrors_the_primary_frame_protocol() {
        let (builder, primary_stats) = counted(SketchBuilder::new());
        let recorder_stats = Arc::new(RenderStats::default());
        let attach_stats = recorder_stats.clone();
        let runtime = booted(
            builder
                .setup(move |s| {
                    s.attach_recorder(Box::new(HeadlessRenderer::with_stats(
                        attach_stats.clone(),
                    )));
                    Ok(())
                })
                .draw(|_| Ok(())),
        );
        let driver = runtime.frame_driver();

        let t0 = Instant::now();
        for i in 0..3 {
            driver.run_frame_at(t0 + Duration::from_millis(16 * i)).unwrap();
        }

        // Attached mid-frame 0, so it misses that frame's begin but closes
        // with it and mirrors the two later frames in full.
        assert_eq!(recorder_stats.frames_begun(), 2);
        assert_eq!(recorder_stats.frames_ended(), 3);
        assert_eq!(primary_stats.frames_begun(), 3);

        runtime.shared.core().sketch.detach_recorder();
        driver.run_frame_at(t0 + Duration::from_millis(64)).unwrap();
        assert_eq!(recorder_stats.frames_ended(), 3);
        assert_eq!(primary_stats.frames_ended(), 4);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let (builder, stats) = counted(SketchBuilder::new());
        let runtime = booted(builder);
        let driver = runtime.frame_driver();

        driver.shutdown();
        driver.shutdown();
        assert_eq!(stats.disposals(), 1);
        assert!(driver.is_finished());
    }

    // ── failure paths ────────────────────────────────────────────────────

    #[test]
    fn reentered_frame_is_rejected() {
        let runtime = booted(SketchBuilder::new().draw(|_| Ok(())));
        let driver = runtime.frame_driver();

        assert!(runtime.shared.flags.try_enter_frame());
        assert!(matches!(driver.run_frame(), Err(FrameError::Reentrant)));
        runtime.shared.flags.leave_frame();

        assert!(driver.run_frame().is_ok());
    }

    #[test]
    fn setup_failure_ends_the_run_with_the_error() {
        let runtime = booted(
            SketchBuilder::new().setup(|_| Err(anyhow::anyhow!("missing asset"))),
        );
        let driver = runtime.frame_driver();

        assert_eq!(driver.run_frame().unwrap(), FrameControl::Continue);
        assert!(driver.is_finished());

        let err = runtime.shared.flags.take_fatal().unwrap();
        assert!(format!("{err:#}").contains("setup failed"));
    }

    #[test]
    fn frames_are_skipped_before_a_primary_renderer_exists() {
        let runtime = SketchBuilder::new()
            .exit_action(ExitAction::ReturnFromRun)
            .build()
            .unwrap();
        let driver = runtime.frame_driver();

        assert_eq!(driver.run_frame().unwrap(), FrameControl::Continue);
        assert_eq!(runtime.controller().frame_count(), 0);
    }
}
