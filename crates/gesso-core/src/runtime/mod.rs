//! Runtime assembly.
//!
//! [`Runtime`] owns the state a `SketchBuilder` produces and wires the three
//! faces of a run together:
//!
//! - [`Runtime::run`] bootstraps the sketch and blocks until it is done
//! - [`Runtime::frame_driver`] is the per-frame entry point for a surface
//! - [`Runtime::controller`] yields cloneable host-side handles

mod controller;
mod shared;

pub use controller::SketchController;

pub(crate) use shared::{Shared, SharedFlags};

use std::sync::Arc;

use anyhow::{Context, Result, bail};

use crate::schedule::FrameDriver;

pub struct Runtime {
    pub(crate) shared: Arc<Shared>,
}

impl Runtime {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Runs the configuration phase and creates the primary renderer.
    pub(crate) fn bootstrap(&self) -> Result<()> {
        let mut core = self.shared.core();
        let core = &mut *core;

        core.sketch.lifecycle.begin_configuration()?;
        if let Some(settings) = core.callbacks.settings.as_mut() {
            settings(&mut core.sketch).context("settings callback failed")?;
        }
        core.sketch.lifecycle.end_configuration()?;

        core.sketch
            .create_primary()
            .context("creating the primary renderer failed")?;

        let target = core.sketch.settings.target_frame_rate;
        self.shared.surface.set_frame_rate(target);
        self.shared.flags.store_frame_rate(core.sketch.frame_rate());

        log::info!(
            "sketch ready: {}x{} on \"{}\", {} fps target",
            core.sketch.width(),
            core.sketch.height(),
            core.sketch.renderer_id(),
            target
        );
        Ok(())
    }

    pub fn frame_driver(&self) -> FrameDriver {
        FrameDriver::new(Arc::clone(&self.shared))
    }

    pub fn controller(&self) -> SketchController {
        SketchController::new(Arc::clone(&self.shared))
    }

    /// Runs the sketch to completion.
    ///
    /// Blocks while the surface's animation thread produces frames. Fails
    /// when initialization fails, when a sketch callback fails, or when the
    /// animation thread panics. Under the default exit action the process
    /// terminates from the animation context instead of returning here.
    pub fn run(&self) -> Result<()> {
        self.bootstrap().context("sketch initialization failed")?;

        self.shared.surface.start(self.frame_driver());
        self.shared.flags.wait_done();

        if let Some(err) = self.shared.flags.take_fatal() {
            return Err(err);
        }
        if self.shared.flags.panicked() {
            bail!("animation thread panicked");
        }
        Ok(())
    }
}
