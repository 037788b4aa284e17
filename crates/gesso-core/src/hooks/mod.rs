//! Extension hooks.
//!
//! Libraries extend a sketch by registering a handler for one or more named
//! hooks. The set of hook names is fixed; there is no general plugin system.
//! Handlers run on the animation context, in registration order, and a
//! handler that fails with an error is logged and skipped without breaking
//! the frame. Panics are treated as programmer errors and propagate.

mod registry;

pub use registry::{Hook, HookRegistry, HookResult, SharedHook, SketchHook, shared};
