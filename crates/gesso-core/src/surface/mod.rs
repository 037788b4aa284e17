//! Surface abstraction.
//!
//! A surface owns the animation thread and the host-facing presentation
//! concerns (cursor, pacing). The runtime drives it through the [`Surface`]
//! trait so the scheduling core never depends on a concrete host:
//!
//! - [`HeadlessSurface`] runs the loop on a plain named thread
//! - windowed backends implement the same trait out of tree

mod headless;

pub use headless::HeadlessSurface;

use crate::schedule::FrameDriver;

/// Cursor shapes a surface may be asked to present.
///
/// Headless surfaces accept these and do nothing.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CursorKind {
    Arrow,
    Cross,
    Hand,
    Move,
    Text,
    Wait,
}

/// Host surface contract.
///
/// All methods take `&self`; implementations keep their mutable state behind
/// their own synchronization because the runtime calls in from both the host
/// thread and the animation thread.
pub trait Surface: Send + Sync {
    /// Starts the animation thread driving `driver`.
    fn start(&self, driver: FrameDriver);

    /// Suspends frame production until [`Surface::resume`].
    fn pause(&self);

    /// Resumes frame production after [`Surface::pause`].
    fn resume(&self);

    /// Stops the animation thread. Returns `true` on the first call only.
    fn stop(&self) -> bool;

    fn is_stopped(&self) -> bool;

    /// Sets the pacing target in frames per second.
    fn set_frame_rate(&self, fps: f32);

    fn set_cursor(&self, cursor: CursorKind);

    fn show_cursor(&self);

    fn hide_cursor(&self);
}
