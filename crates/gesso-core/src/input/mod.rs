//! Input subsystem.
//!
//! Event types are platform-agnostic; the host (or a surface implementation)
//! is responsible for translating native input into `InputEvent`s and posting
//! them through the controller. Routing happens on the animation context at a
//! fixed point per frame, or inline when the sketch is not looping.

pub(crate) mod dispatcher;
mod queue;
mod types;

pub use queue::EventQueue;
pub use types::{
    CODED,
    ESC,
    InputEvent,
    KeyAction,
    KeyEvent,
    Modifiers,
    PointerAction,
    PointerButton,
    PointerEvent,
};
