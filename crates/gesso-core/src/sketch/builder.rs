use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};

use crate::error::ConfigError;
use crate::hooks::{Hook, HookRegistry, SharedHook};
use crate::input::{EventQueue, KeyEvent, PointerEvent};
use crate::render::{RendererFactory, RendererRegistry};
use crate::runtime::{Runtime, Shared, SharedFlags};
use crate::surface::{HeadlessSurface, Surface};

use super::Sketch;
use super::callbacks::Callbacks;
use super::settings::{ExitAction, SketchSettings};
use super::state::SketchCore;

/// Sketch program builder.
///
/// Configure the sketch, provide its callbacks, then hand control over:
///
/// ```rust,ignore
/// SketchBuilder::new()
///     .size(640, 360)
///     .setup(|s| {
///         s.set_frame_rate(30.0);
///         Ok(())
///     })
///     .draw(|s| {
///         if s.frame_count() == 300 {
///             s.exit();
///         }
///         Ok(())
///     })
///     .run()
/// ```
///
/// Builder-level values (size, renderer, density) are applied before the
/// `settings` callback runs, so the callback can still override them.
pub struct SketchBuilder {
    settings:  SketchSettings,
    callbacks: Callbacks,
    hooks:     Vec<(Hook, String, SharedHook)>,
    renderers: RendererRegistry,
    surface:   Option<Arc<dyn Surface>>,
}

impl SketchBuilder {
    pub fn new() -> Self {
        Self {
            settings:  SketchSettings::default(),
            callbacks: Callbacks::default(),
            hooks:     Vec::new(),
            renderers: RendererRegistry::with_defaults(),
            surface:   None,
        }
    }

    // ── configuration ────────────────────────────────────────────────────

    /// Sketch size in logical pixels.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.settings.width = width;
        self.settings.height = height;
        self
    }

    /// Primary renderer id, resolved through the registry at startup.
    pub fn renderer(mut self, id: impl Into<String>) -> Self {
        self.settings.renderer = id.into();
        self
    }

    pub fn pixel_density(mut self, density: u32) -> Self {
        self.settings.pixel_density = density;
        self
    }

    pub fn smoothing(mut self, level: u32) -> Self {
        self.settings.smoothing = level;
        self
    }

    /// Output path handed to file-backed renderers.
    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.output_path = Some(path.into());
        self
    }

    /// Initial frame rate target. Defaults to 60.
    pub fn frame_rate(mut self, fps: f32) -> Self {
        self.settings.target_frame_rate = fps;
        self
    }

    /// Whether auto-repeated key events are delivered. Defaults to off.
    pub fn key_repeat(mut self, enabled: bool) -> Self {
        self.settings.key_repeat = enabled;
        self
    }

    /// Marks the sketch as driven by an external editor, which enables the
    /// editor's close-window key chord.
    pub fn external(mut self, external: bool) -> Self {
        self.settings.external = external;
        self
    }

    /// What exiting does. Defaults to terminating the process.
    pub fn exit_action(mut self, action: ExitAction) -> Self {
        self.settings.exit_action = action;
        self
    }

    // ── lifecycle callbacks ──────────────────────────────────────────────

    /// Runs inside the configuration phase, before anything is created.
    pub fn settings<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch) -> Result<()> + Send + 'static,
    {
        self.callbacks.settings = Some(Box::new(f));
        self
    }

    /// Runs once, on frame 0.
    pub fn setup<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch) -> Result<()> + Send + 'static,
    {
        self.callbacks.setup = Some(Box::new(f));
        self
    }

    /// Runs every frame after frame 0.
    pub fn draw<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch) -> Result<()> + Send + 'static,
    {
        self.callbacks.draw = Some(Box::new(f));
        self
    }

    pub fn on_pause<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch) -> Result<()> + Send + 'static,
    {
        self.callbacks.pause = Some(Box::new(f));
        self
    }

    pub fn on_resume<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch) -> Result<()> + Send + 'static,
    {
        self.callbacks.resume = Some(Box::new(f));
        self
    }

    // ── pointer callbacks ────────────────────────────────────────────────

    pub fn pointer_pressed<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch, &PointerEvent) -> Result<()> + Send + 'static,
    {
        self.callbacks.pointer_pressed = Some(Box::new(f));
        self
    }

    pub fn pointer_released<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch, &PointerEvent) -> Result<()> + Send + 'static,
    {
        self.callbacks.pointer_released = Some(Box::new(f));
        self
    }

    pub fn pointer_clicked<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch, &PointerEvent) -> Result<()> + Send + 'static,
    {
        self.callbacks.pointer_clicked = Some(Box::new(f));
        self
    }

    pub fn pointer_dragged<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch, &PointerEvent) -> Result<()> + Send + 'static,
    {
        self.callbacks.pointer_dragged = Some(Box::new(f));
        self
    }

    pub fn pointer_moved<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch, &PointerEvent) -> Result<()> + Send + 'static,
    {
        self.callbacks.pointer_moved = Some(Box::new(f));
        self
    }

    pub fn pointer_entered<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch, &PointerEvent) -> Result<()> + Send + 'static,
    {
        self.callbacks.pointer_entered = Some(Box::new(f));
        self
    }

    pub fn pointer_exited<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch, &PointerEvent) -> Result<()> + Send + 'static,
    {
        self.callbacks.pointer_exited = Some(Box::new(f));
        self
    }

    pub fn pointer_wheel<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch, &PointerEvent) -> Result<()> + Send + 'static,
    {
        self.callbacks.pointer_wheel = Some(Box::new(f));
        self
    }

    // ── key callbacks ────────────────────────────────────────────────────

    pub fn key_pressed<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch, &KeyEvent) -> Result<()> + Send + 'static,
    {
        self.callbacks.key_pressed = Some(Box::new(f));
        self
    }

    pub fn key_released<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch, &KeyEvent) -> Result<()> + Send + 'static,
    {
        self.callbacks.key_released = Some(Box::new(f));
        self
    }

    pub fn key_typed<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut Sketch, &KeyEvent) -> Result<()> + Send + 'static,
    {
        self.callbacks.key_typed = Some(Box::new(f));
        self
    }

    // ── extensions ───────────────────────────────────────────────────────

    /// Queues a library handler for registration at build time. Duplicate
    /// `(owner, hook)` pairs make [`SketchBuilder::build`] fail.
    pub fn hook(mut self, hook: Hook, owner: impl Into<String>, handler: SharedHook) -> Self {
        self.hooks.push((hook, owner.into(), handler));
        self
    }

    /// Registers a renderer backend under `id`.
    pub fn register_renderer(mut self, id: &str, accelerated: bool, factory: RendererFactory) -> Self {
        self.renderers.register(id, accelerated, factory);
        self
    }

    /// Replaces the default headless surface with a host-provided one.
    pub fn surface(mut self, surface: impl Surface + 'static) -> Self {
        self.surface = Some(Arc::new(surface));
        self
    }

    // ── entry points ─────────────────────────────────────────────────────

    /// Assembles the runtime without starting it.
    pub fn build(mut self) -> Result<Runtime> {
        if self.settings.pixel_density != 1 && self.settings.pixel_density != 2 {
            log::warn!("{}", ConfigError::InvalidDensity(self.settings.pixel_density));
            self.settings.pixel_density = 1;
        }

        let hooks = Arc::new(HookRegistry::new());
        for (hook, owner, handler) in self.hooks {
            hooks
                .register(hook, &owner, handler)
                .with_context(|| format!("registering \"{owner}\" for the {hook} hook"))?;
        }

        let flags = Arc::new(SharedFlags::new());
        let surface: Arc<dyn Surface> = match self.surface {
            Some(surface) => surface,
            None => Arc::new(HeadlessSurface::new()),
        };
        let exit_action = self.settings.exit_action;

        let sketch = Sketch::new(
            self.settings,
            hooks,
            Arc::new(self.renderers),
            Arc::clone(&surface),
            Arc::clone(&flags),
        );
        let core = SketchCore {
            sketch,
            callbacks: self.callbacks,
        };

        Ok(Runtime::new(Arc::new(Shared {
            core: Mutex::new(core),
            queue: Arc::new(EventQueue::new()),
            flags,
            surface,
            exit_action,
        })))
    }

    /// Builds and runs the sketch to completion.
    pub fn run(self) -> Result<()> {
        self.build()?.run()
    }
}

impl Default for SketchBuilder {
    fn default() -> Self {
        Self::new()
    }
}
