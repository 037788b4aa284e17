use anyhow::Result;

use crate::input::{KeyEvent, PointerEvent};

use super::Sketch;

pub(crate) type LifecycleFn = Box<dyn FnMut(&mut Sketch) -> Result<()> + Send>;
pub(crate) type PointerFn = Box<dyn FnMut(&mut Sketch, &PointerEvent) -> Result<()> + Send>;
pub(crate) type KeyFn = Box<dyn FnMut(&mut Sketch, &KeyEvent) -> Result<()> + Send>;

/// The sketch program itself: one optional closure per lifecycle moment and
/// per input action. All of them run on the animation context with exclusive
/// access to the sketch; an `Err` from any of them ends the run.
#[derive(Default)]
pub(crate) struct Callbacks {
    pub(crate) settings: Option<LifecycleFn>,
    pub(crate) setup: Option<LifecycleFn>,
    pub(crate) draw: Option<LifecycleFn>,
    pub(crate) pause: Option<LifecycleFn>,
    pub(crate) resume: Option<LifecycleFn>,

    pub(crate) pointer_pressed: Option<PointerFn>,
    pub(crate) pointer_released: Option<PointerFn>,
    pub(crate) pointer_clicked: Option<PointerFn>,
    pub(crate) pointer_dragged: Option<PointerFn>,
    pub(crate) pointer_moved: Option<PointerFn>,
    pub(crate) pointer_entered: Option<PointerFn>,
    pub(crate) pointer_exited: Option<PointerFn>,
    pub(crate) pointer_wheel: Option<PointerFn>,

    pub(crate) key_pressed: Option<KeyFn>,
    pub(crate) key_released: Option<KeyFn>,
    pub(crate) key_typed: Option<KeyFn>,
}
