use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;

use crate::error::{ConfigError, HookError, RendererError};
use crate::hooks::{Hook, HookRegistry, SharedHook};
use crate::input::PointerButton;
use crate::lifecycle::Lifecycle;
use crate::render::{Renderer, RendererRegistry, RendererRequest};
use crate::runtime::SharedFlags;
use crate::surface::{CursorKind, Surface};

use super::callbacks::Callbacks;
use super::settings::{ExitAction, SketchSettings};

/// The sketch context: every piece of state a running sketch reads or
/// writes, owned by the scheduler and handed to callbacks by reference.
///
/// Pointer position comes in three generations. `pointer` is the latest
/// routed event position. `prev_pointer` is what sketch code reads as "the
/// previous position": during `draw` it holds the position at the end of the
/// previous frame (copied once per frame), while event callbacks see it
/// rebound per event. `event_pointer` is the dispatcher's own end-of-event
/// reference and is never read by sketch code directly.
pub struct Sketch {
    pub(crate) settings: SketchSettings,
    pub(crate) lifecycle: Lifecycle,

    pub(crate) frame_count: u64,
    pub(crate) frame_rate: f32,
    pub(crate) last_frame_start: Option<Instant>,
    started_at: Instant,

    pub(crate) pixel_width: u32,
    pub(crate) pixel_height: u32,

    pub(crate) pointer_x: i32,
    pub(crate) pointer_y: i32,
    pub(crate) prev_pointer_x: i32,
    pub(crate) prev_pointer_y: i32,
    pub(crate) frame_pointer_x: i32,
    pub(crate) frame_pointer_y: i32,
    pub(crate) event_pointer_x: i32,
    pub(crate) event_pointer_y: i32,
    pub(crate) first_pointer: bool,
    pub(crate) pointer_button: Option<PointerButton>,
    pub(crate) pointer_pressed: bool,

    pub(crate) key: char,
    pub(crate) key_code: u32,
    pub(crate) key_pressed: bool,
    pub(crate) pressed_keys: HashSet<(u32, char)>,

    pub(crate) primary: Option<Box<dyn Renderer>>,
    pub(crate) recorder: Option<Box<dyn Renderer>>,

    pub(crate) hooks: Arc<HookRegistry>,
    pub(crate) renderers: Arc<RendererRegistry>,
    pub(crate) surface: Arc<dyn Surface>,
    pub(crate) flags: Arc<SharedFlags>,
}

impl Sketch {
    pub(crate) fn new(
        settings: SketchSettings,
        hooks: Arc<HookRegistry>,
        renderers: Arc<RendererRegistry>,
        surface: Arc<dyn Surface>,
        flags: Arc<SharedFlags>,
    ) -> Self {
        let pixel_width = settings.width * settings.pixel_density;
        let pixel_height = settings.height * settings.pixel_density;
        Self {
            settings,
            lifecycle: Lifecycle::new(),
            frame_count: 0,
            // Starts low on purpose; the smoothed rate converges toward the
            // real value as frames complete.
            frame_rate: 10.0,
            last_frame_start: None,
            started_at: Instant::now(),
            pixel_width,
            pixel_height,
            pointer_x: 0,
            pointer_y: 0,
            prev_pointer_x: 0,
            prev_pointer_y: 0,
            frame_pointer_x: 0,
            frame_pointer_y: 0,
            event_pointer_x: 0,
            event_pointer_y: 0,
            first_pointer: true,
            pointer_button: None,
            pointer_pressed: false,
            key: '\0',
            key_code: 0,
            key_pressed: false,
            pressed_keys: HashSet::new(),
            primary: None,
            recorder: None,
            hooks,
            renderers,
            surface,
            flags,
        }
    }

    #[cfg(test)]
    pub(crate) fn stub() -> Self {
        Self::new(
            SketchSettings::default(),
            Arc::new(HookRegistry::new()),
            Arc::new(RendererRegistry::with_defaults()),
            Arc::new(crate::surface::HeadlessSurface::new()),
            Arc::new(SharedFlags::new()),
        )
    }

    // ── configuration ────────────────────────────────────────────────────

    /// Sets the sketch size in logical pixels.
    ///
    /// Structural: legal only inside `settings`. Restating the current size
    /// is accepted anywhere and does nothing.
    pub fn set_size(&mut self, width: u32, height: u32) -> Result<(), ConfigError> {
        if width == self.settings.width && height == self.settings.height {
            return Ok(());
        }
        self.config_gate("set_size")?;
        if width == 0 || height == 0 {
            return Err(self.config_reject(ConfigError::InvalidSize(width, height)));
        }
        self.settings.width = width;
        self.settings.height = height;
        self.update_pixel_dimensions();
        Ok(())
    }

    /// Selects the renderer backing the primary surface by registry id.
    pub fn set_renderer(&mut self, id: &str) -> Result<(), ConfigError> {
        self.config_gate("set_renderer")?;
        self.settings.renderer = id.to_string();
        Ok(())
    }

    pub fn set_pixel_density(&mut self, density: u32) -> Result<(), ConfigError> {
        self.config_gate("set_pixel_density")?;
        if density != 1 && density != 2 {
            return Err(self.config_reject(ConfigError::InvalidDensity(density)));
        }
        self.settings.pixel_density = density;
        self.update_pixel_dimensions();
        Ok(())
    }

    pub fn set_smoothing(&mut self, level: u32) -> Result<(), ConfigError> {
        self.config_gate("set_smoothing")?;
        self.settings.smoothing = level;
        Ok(())
    }

    /// Sets the output path handed to file-backed renderers.
    pub fn set_output_path(&mut self, path: impl Into<PathBuf>) -> Result<(), ConfigError> {
        self.config_gate("set_output_path")?;
        self.settings.output_path = Some(path.into());
        Ok(())
    }

    fn config_gate(&self, what: &'static str) -> Result<(), ConfigError> {
        if self.lifecycle.is_configuring() {
            Ok(())
        } else {
            Err(self.config_reject(ConfigError::OutsidePhase { what }))
        }
    }

    fn update_pixel_dimensions(&mut self) {
        self.pixel_width = self.settings.width * self.settings.pixel_density;
        self.pixel_height = self.settings.height * self.settings.pixel_density;
    }

    fn config_reject(&self, err: ConfigError) -> ConfigError {
        log::warn!("{err}");
        err
    }

    // ── environment ──────────────────────────────────────────────────────

    pub fn width(&self) -> u32 {
        self.settings.width
    }

    pub fn height(&self) -> u32 {
        self.settings.height
    }

    pub fn pixel_width(&self) -> u32 {
        self.pixel_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.pixel_height
    }

    pub fn pixel_density(&self) -> u32 {
        self.settings.pixel_density
    }

    pub fn smoothing(&self) -> u32 {
        self.settings.smoothing
    }

    pub fn renderer_id(&self) -> &str {
        &self.settings.renderer
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.settings.output_path.as_deref()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> crate::lifecycle::Phase {
        self.lifecycle.phase()
    }

    /// Completed frames so far; `0` while `setup` runs.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Smoothed measured frame rate in frames per second.
    pub fn frame_rate(&self) -> f32 {
        self.frame_rate
    }

    /// Retunes the frame rate target. Takes effect on the next frame.
    pub fn set_frame_rate(&self, fps: f32) {
        self.surface.set_frame_rate(fps);
    }

    /// Milliseconds since the sketch was created.
    pub fn millis(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Halts the calling context for `ms` milliseconds.
    ///
    /// Not a drawing-speed control; the frame loop paces itself through the
    /// frame rate target.
    pub fn delay(&self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }

    // ── loop control ─────────────────────────────────────────────────────

    pub fn is_looping(&self) -> bool {
        self.flags.looping()
    }

    /// Turns continuous frame production on or off. While off, frames run
    /// only when [`Sketch::redraw`] asks for one.
    pub fn set_looping(&self, looping: bool) {
        self.flags.set_looping(looping);
    }

    /// Requests a single frame. Only meaningful while not looping.
    pub fn redraw(&self) {
        if !self.flags.looping() {
            self.flags.set_redraw(true);
        }
    }

    /// Requests a graceful exit.
    ///
    /// While looping this is deferred to the end of the current frame so
    /// `draw`, the event drain, and the frame hooks all complete first.
    pub fn exit(&mut self) {
        if self.surface.is_stopped() {
            // Disposal already ran; leave immediately.
            self.exit_now(0);
        } else if self.flags.looping() {
            // The frame loop picks this up at the frame boundary and
            // disposes there.
            self.flags.set_finished(true);
            self.flags.set_exit_requested(true);
        } else {
            // Not looping, so no frame boundary is coming.
            self.dispose();
            self.exit_now(0);
        }
    }

    /// Releases the renderers and fires the `dispose` hooks.
    ///
    /// Only the first call tears down; the surface's first-stop result makes
    /// repeats no-ops.
    pub fn dispose(&mut self) {
        self.flags.set_finished(true);
        if self.surface.stop() {
            self.lifecycle.begin_shutdown();
            if let Some(mut renderer) = self.primary.take() {
                renderer.dispose();
            }
            if let Some(mut renderer) = self.recorder.take() {
                renderer.dispose();
            }
            let hooks = Arc::clone(&self.hooks);
            hooks.fire(Hook::Dispose, self);
            self.lifecycle.complete_shutdown();
            log::debug!("sketch disposed");
        }
    }

    pub(crate) fn exit_now(&mut self, code: i32) {
        match self.settings.exit_action {
            ExitAction::TerminateProcess => {
                log::debug!("exiting with status {code}");
                process::exit(code);
            }
            ExitAction::ReturnFromRun => {
                self.flags.set_finished(true);
            }
        }
    }

    // ── pointer state ────────────────────────────────────────────────────

    pub fn pointer_x(&self) -> i32 {
        self.pointer_x
    }

    pub fn pointer_y(&self) -> i32 {
        self.pointer_y
    }

    pub fn prev_pointer_x(&self) -> i32 {
        self.prev_pointer_x
    }

    pub fn prev_pointer_y(&self) -> i32 {
        self.prev_pointer_y
    }

    /// Button involved in the most recent pointer event.
    pub fn pointer_button(&self) -> Option<PointerButton> {
        self.pointer_button
    }

    pub fn is_pointer_pressed(&self) -> bool {
        self.pointer_pressed
    }

    // ── key state ────────────────────────────────────────────────────────

    /// Character of the most recent key event, or [`crate::input::CODED`].
    pub fn key(&self) -> char {
        self.key
    }

    /// Overwrites the stored key character. A `key_pressed` callback can
    /// clear an escape press this way to keep it from ending the sketch.
    pub fn set_key(&mut self, key: char) {
        self.key = key;
    }

    pub fn key_code(&self) -> u32 {
        self.key_code
    }

    /// Whether any key is currently held down.
    pub fn is_key_pressed(&self) -> bool {
        self.key_pressed
    }

    pub fn key_repeat(&self) -> bool {
        self.settings.key_repeat
    }

    /// Enables or disables delivery of auto-repeated key events.
    pub fn set_key_repeat(&mut self, enabled: bool) {
        self.settings.key_repeat = enabled;
    }

    // ── renderers ────────────────────────────────────────────────────────

    /// Creates an offscreen renderer through the registry.
    pub fn create_renderer(
        &self,
        width: u32,
        height: u32,
        id: &str,
    ) -> Result<Box<dyn Renderer>, RendererError> {
        self.build_renderer(width, height, id, None)
    }

    /// Creates an offscreen renderer that writes to `path`.
    pub fn create_renderer_with_path(
        &self,
        width: u32,
        height: u32,
        id: &str,
        path: &Path,
    ) -> Result<Box<dyn Renderer>, RendererError> {
        self.build_renderer(width, height, id, Some(path))
    }

    fn build_renderer(
        &self,
        width: u32,
        height: u32,
        id: &str,
        output_path: Option<&Path>,
    ) -> Result<Box<dyn Renderer>, RendererError> {
        let request = RendererRequest {
            width,
            height,
            id,
            output_path,
            primary: false,
            primary_accelerated: Some(
                self.primary.as_ref().is_some_and(|r| r.is_accelerated()),
            ),
        };
        self.renderers.create(&request)
    }

    /// Attaches a second renderer that mirrors the frame protocol of the
    /// primary, for recording a run to another backend.
    pub fn attach_recorder(&mut self, renderer: Box<dyn Renderer>) {
        self.recorder = Some(renderer);
    }

    pub fn detach_recorder(&mut self) -> Option<Box<dyn Renderer>> {
        self.recorder.take()
    }

    pub(crate) fn create_primary(&mut self) -> Result<(), RendererError> {
        let renderer = {
            let request = RendererRequest {
                width: self.settings.width,
                height: self.settings.height,
                id: &self.settings.renderer,
                output_path: self.settings.output_path.as_deref(),
                primary: true,
                primary_accelerated: None,
            };
            self.renderers.create(&request)?
        };
        self.primary = Some(renderer);
        self.update_pixel_dimensions();
        Ok(())
    }

    pub(crate) fn begin_frame_renderers(&mut self) {
        if let Some(renderer) = self.primary.as_mut() {
            renderer.begin_frame();
        }
        if let Some(renderer) = self.recorder.as_mut() {
            renderer.begin_frame();
        }
    }

    pub(crate) fn end_frame_renderers(&mut self) {
        if let Some(renderer) = self.primary.as_mut() {
            renderer.end_frame();
        }
        if let Some(renderer) = self.recorder.as_mut() {
            renderer.end_frame();
        }
    }

    // ── surface passthrough ──────────────────────────────────────────────

    pub fn set_cursor(&self, cursor: CursorKind) {
        self.surface.set_cursor(cursor);
    }

    pub fn show_cursor(&self) {
        self.surface.show_cursor();
    }

    pub fn hide_cursor(&self) {
        self.surface.hide_cursor();
    }

    // ── hooks ────────────────────────────────────────────────────────────

    /// Registers a library handler. See [`HookRegistry::register`].
    pub fn register_hook(
        &self,
        hook: Hook,
        owner: &str,
        handler: SharedHook,
    ) -> Result<(), HookError> {
        self.hooks.register(hook, owner, handler)
    }

    pub fn unregister_hook(&self, hook: Hook, owner: &str) {
        self.hooks.unregister(hook, owner);
    }
}

/// The sketch paired with its callbacks, kept behind the context lock.
///
/// Split so the scheduler can borrow a callback mutably while it hands the
/// sketch to it.
pub(crate) struct SketchCore {
    pub(crate) sketch: Sketch,
    pub(crate) callbacks: Callbacks,
}

impl SketchCore {
    /// Starts or resumes frame production: lifecycle transition, user
    /// callback, `resume` hooks, then the surface.
    pub(crate) fn start(&mut self) -> anyhow::Result<()> {
        if self.sketch.lifecycle.resume() {
            if let Some(callback) = self.callbacks.resume.as_mut() {
                callback(&mut self.sketch).context("resume callback failed")?;
            }
            let hooks = Arc::clone(&self.sketch.hooks);
            hooks.fire(Hook::Resume, &self.sketch);
            self.sketch.surface.resume();
        }
        Ok(())
    }

    /// Pauses frame production: lifecycle transition, user callback,
    /// `pause` hooks, then the surface.
    pub(crate) fn stop(&mut self) -> anyhow::Result<()> {
        if self.sketch.lifecycle.pause() {
            if let Some(callback) = self.callbacks.pause.as_mut() {
                callback(&mut self.sketch).context("pause callback failed")?;
            }
            let hooks = Arc::clone(&self.sketch.hooks);
            hooks.fire(Hook::Pause, &self.sketch);
            self.sketch.surface.pause();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_mutation_outside_the_phase_keeps_prior_values() {
        let mut sketch = Sketch::stub();
        // Configuration was never opened, so the gate is closed.
        let err = sketch.set_size(640, 480).unwrap_err();
        assert!(matches!(err, ConfigError::OutsidePhase { .. }));
        assert_eq!(sketch.width(), 100);
        assert_eq!(sketch.height(), 100);

        assert!(sketch.set_renderer("gl").is_err());
        assert_eq!(sketch.renderer_id(), "headless");
    }

    #[test]
    fn restating_the_current_size_is_accepted_anywhere() {
        let mut sketch = Sketch::stub();
        assert!(sketch.set_size(100, 100).is_ok());
    }

    #[test]
    fn size_and_density_validate_inside_the_phase() {
        let mut sketch = Sketch::stub();
        sketch.lifecycle.begin_configuration().unwrap();

        assert!(matches!(
            sketch.set_size(0, 100).unwrap_err(),
            ConfigError::InvalidSize(0, 100)
        ));
        assert_eq!(sketch.width(), 100);

        assert!(matches!(
            sketch.set_pixel_density(3).unwrap_err(),
            ConfigError::InvalidDensity(3)
        ));
        assert_eq!(sketch.pixel_density(), 1);

        sketch.set_size(640, 480).unwrap();
        sketch.set_pixel_density(2).unwrap();
        assert_eq!((sketch.width(), sketch.height()), (640, 480));
    }

    #[test]
    fn pixel_dimensions_track_size_and_density() {
        let mut sketch = Sketch::stub();
        sketch.lifecycle.begin_configuration().unwrap();
        sketch.set_size(200, 150).unwrap();
        assert_eq!((sketch.pixel_width(), sketch.pixel_height()), (200, 150));

        sketch.set_pixel_density(2).unwrap();
        assert_eq!((sketch.pixel_width(), sketch.pixel_height()), (400, 300));
        sketch.lifecycle.end_configuration().unwrap();

        sketch.create_primary().unwrap();
        assert_eq!((sketch.pixel_width(), sketch.pixel_height()), (400, 300));
    }

    #[test]
    fn offscreen_creation_sees_a_missing_primary_as_unaccelerated() {
        let sketch = Sketch::stub();
        sketch.renderers.register(
            "gl",
            true,
            Box::new(|_| Ok(Box::new(crate::render::HeadlessRenderer::new()))),
        );
        assert!(matches!(
            sketch.create_renderer(64, 64, "gl").unwrap_err(),
            crate::error::RendererError::Incompatible { .. }
        ));
    }

    #[test]
    fn redraw_is_ignored_while_looping() {
        let sketch = Sketch::stub();
        sketch.flags.set_redraw(false);
        sketch.redraw();
        assert!(!sketch.flags.redraw());

        sketch.set_looping(false);
        sketch.redraw();
        assert!(sketch.flags.redraw());
    }
}
