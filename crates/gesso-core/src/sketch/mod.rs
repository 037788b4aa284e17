//! The sketch context and its builder.
//!
//! A sketch is configured once through [`SketchBuilder`], then runs as a set
//! of callbacks over the [`Sketch`] context object:
//!
//! - `settings` runs inside the configuration phase; structural values
//!   (size, renderer, density, smoothing, output path) may only change there
//! - `setup` runs on frame 0, `draw` on every frame after it
//! - pointer and key callbacks run during the per-frame event drain

mod builder;
mod callbacks;
mod settings;
mod state;

pub use builder::SketchBuilder;
pub use settings::ExitAction;
pub use state::Sketch;

pub(crate) use callbacks::Callbacks;
pub(crate) use settings::SketchSettings;
pub(crate) use state::SketchCore;
