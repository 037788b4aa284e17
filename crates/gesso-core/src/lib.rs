//! Gesso core crate.
//!
//! This crate owns the animation loop, lifecycle, and input plumbing that a
//! sketch program runs on. Rendering backends and surfaces plug in through
//! the traits in `render` and `surface`.

pub mod error;
pub mod hooks;
pub mod input;
pub mod lifecycle;
pub mod render;
pub mod runtime;
pub mod schedule;
pub mod sketch;
pub mod surface;
pub mod time;

pub mod logging;
