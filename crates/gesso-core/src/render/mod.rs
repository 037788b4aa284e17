//! Rendering seam.
//!
//! The core never draws; it only drives a backend through the [`Renderer`]
//! contract and resolves backends by name through the [`RendererRegistry`].
//!
//! Convention:
//! - exactly one primary renderer per sketch, created by the runtime
//! - offscreen renderers are created on demand and owned by the caller
//! - construction order is fixed: build, assign output path, size

mod factory;
mod headless;

pub use factory::{RendererFactory, RendererRegistry, RendererRequest};
pub use headless::{HeadlessRenderer, RenderStats};

use std::fmt;
use std::path::Path;

/// Identifier of the built-in headless renderer.
pub const HEADLESS: &str = "headless";

/// Capability contract a drawing backend provides to the scheduler.
pub trait Renderer: Send {
    /// Called at the top of every frame, before any callback runs.
    fn begin_frame(&mut self);

    /// Called at the bottom of every frame.
    fn end_frame(&mut self);

    /// Resizes the backing store. Also used once during construction.
    fn resize(&mut self, width: u32, height: u32);

    /// Releases backend resources. Must tolerate repeated calls.
    fn dispose(&mut self);

    /// Whether the backend is hardware accelerated. Offscreen accelerated
    /// renderers require an accelerated primary.
    fn is_accelerated(&self) -> bool {
        false
    }

    /// Assigns the output path for file-backed renderers.
    fn set_output_path(&mut self, path: &Path) {
        let _ = path;
    }
}

impl fmt::Debug for dyn Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer").finish_non_exhaustive()
    }
}
