//! Event routing.
//!
//! Runs on whichever context holds the sketch core: the scheduler drains at
//! its fixed per-frame point, and the controller drains inline when the
//! sketch is not looping. The core lock is the dispatch-exclusion lock, so
//! only one drain can ever be in flight.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::sketch::SketchCore;

use super::queue::EventQueue;
use super::types::{ESC, InputEvent, KeyAction, KeyEvent, Modifiers, PointerAction, PointerEvent};

/// Empties the queue, routing every event in arrival order.
///
/// Events posted while the drain runs are picked up by the same pass. An
/// error from a sketch callback stops the drain and leaves the remaining
/// events queued.
pub(crate) fn drain(core: &mut SketchCore, queue: &EventQueue) -> Result<()> {
    while let Some(event) = queue.pop() {
        match event {
            InputEvent::Pointer(event) => route_pointer(core, &event)?,
            InputEvent::Key(event) => route_key(core, &event)?,
        }
    }
    Ok(())
}

fn route_pointer(core: &mut SketchCore, event: &PointerEvent) -> Result<()> {
    {
        let sketch = &mut core.sketch;

        // The previous position follows drag, move, and press only. A
        // release delivered on focus loss keeps the last good value.
        if matches!(
            event.action,
            PointerAction::Drag | PointerAction::Move | PointerAction::Press
        ) {
            sketch.prev_pointer_x = sketch.event_pointer_x;
            sketch.prev_pointer_y = sketch.event_pointer_y;
            sketch.pointer_x = event.x;
            sketch.pointer_y = event.y;
        }

        sketch.pointer_button = event.button;

        // On the very first pointer event of the run there is no history;
        // snap both references to the current position so nobody computes
        // a delta against 0,0.
        if sketch.first_pointer {
            sketch.prev_pointer_x = sketch.pointer_x;
            sketch.prev_pointer_y = sketch.pointer_y;
            sketch.frame_pointer_x = sketch.pointer_x;
            sketch.frame_pointer_y = sketch.pointer_y;
            sketch.first_pointer = false;
        }

        // Transition the flag before the hooks so a handler reading it sees
        // the post-event value.
        match event.action {
            PointerAction::Press => sketch.pointer_pressed = true,
            PointerAction::Release => sketch.pointer_pressed = false,
            _ => {}
        }

        let hooks = Arc::clone(&sketch.hooks);
        hooks.fire_pointer(sketch, event);
    }

    let callback = match event.action {
        PointerAction::Press => core.callbacks.pointer_pressed.as_mut(),
        PointerAction::Release => core.callbacks.pointer_released.as_mut(),
        PointerAction::Click => core.callbacks.pointer_clicked.as_mut(),
        PointerAction::Drag => core.callbacks.pointer_dragged.as_mut(),
        PointerAction::Move => core.callbacks.pointer_moved.as_mut(),
        PointerAction::Enter => core.callbacks.pointer_entered.as_mut(),
        PointerAction::Exit => core.callbacks.pointer_exited.as_mut(),
        PointerAction::Wheel => core.callbacks.pointer_wheel.as_mut(),
    };
    if let Some(callback) = callback {
        callback(&mut core.sketch, event)
            .with_context(|| format!("{:?} pointer callback failed", event.action))?;
    }

    // The dispatcher's own end-of-event reference advances on drag and
    // move only.
    if matches!(event.action, PointerAction::Drag | PointerAction::Move) {
        core.sketch.event_pointer_x = core.sketch.pointer_x;
        core.sketch.event_pointer_y = core.sketch.pointer_y;
    }
    Ok(())
}

fn route_key(core: &mut SketchCore, event: &KeyEvent) -> Result<()> {
    if event.repeat && !core.sketch.settings.key_repeat {
        log::trace!("dropping auto-repeated {:?} event", event.action);
        return Ok(());
    }

    {
        let sketch = &mut core.sketch;
        sketch.key = event.key;
        sketch.key_code = event.code;

        match event.action {
            KeyAction::Press => {
                sketch.pressed_keys.insert((event.code, event.key));
                sketch.key_pressed = true;
            }
            KeyAction::Release => {
                sketch.pressed_keys.remove(&(event.code, event.key));
                sketch.key_pressed = !sketch.pressed_keys.is_empty();
            }
            KeyAction::Type => {}
        }

        let hooks = Arc::clone(&sketch.hooks);
        hooks.fire_key(sketch, event);
    }

    let callback = match event.action {
        KeyAction::Press => core.callbacks.key_pressed.as_mut(),
        KeyAction::Release => core.callbacks.key_released.as_mut(),
        KeyAction::Type => core.callbacks.key_typed.as_mut(),
    };
    if let Some(callback) = callback {
        callback(&mut core.sketch, event)
            .with_context(|| format!("{:?} key callback failed", event.action))?;
    }

    if event.action == KeyAction::Press {
        // Checked against the stored field, not the event, so the callback
        // above may overwrite the key to swallow the escape.
        if core.sketch.key == ESC {
            core.sketch.exit();
        }
        // Under external supervision the editor's close chord ends the
        // sketch as well.
        if core.sketch.settings.external
            && event.code == u32::from('W')
            && close_chord(&event.modifiers)
        {
            core.sketch.exit();
        }
    }
    Ok(())
}

fn close_chord(modifiers: &Modifiers) -> bool {
    if cfg!(target_os = "macos") {
        modifiers.meta
    } else {
        modifiers.ctrl
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::hooks::{Hook, HookResult, SketchHook, shared};
    use crate::input::PointerButton;
    use crate::sketch::{Callbacks, Sketch};

    fn test_core() -> SketchCore {
        SketchCore {
            sketch: Sketch::stub(),
            callbacks: Callbacks::default(),
        }
    }

    fn pointer(action: PointerAction, x: i32, y: i32) -> InputEvent {
        PointerEvent::new(action, x, y).into()
    }

    fn key(action: KeyAction, key: char) -> KeyEvent {
        KeyEvent::new(action, key, key.to_ascii_uppercase() as u32)
    }

    // ── pointer position bookkeeping ─────────────────────────────────────

    #[test]
    fn first_event_snaps_previous_to_current() {
        let mut core = test_core();
        let queue = EventQueue::new();
        queue.push(pointer(PointerAction::Move, 10, 10));
        queue.push(pointer(PointerAction::Drag, 20, 15));

        drain(&mut core, &queue).unwrap();

        assert_eq!((core.sketch.pointer_x(), core.sketch.pointer_y()), (20, 15));
        assert_eq!(
            (core.sketch.prev_pointer_x(), core.sketch.prev_pointer_y()),
            (10, 10)
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn release_keeps_the_previous_position() {
        let mut core = test_core();
        let queue = EventQueue::new();
        queue.push(pointer(PointerAction::Move, 10, 10));
        queue.push(
            PointerEvent::new(PointerAction::Release, 50, 50)
                .with_button(PointerButton::Left)
                .into(),
        );

        drain(&mut core, &queue).unwrap();

        // Position fields untouched by the release; the button still lands.
        assert_eq!((core.sketch.pointer_x(), core.sketch.pointer_y()), (10, 10));
        assert_eq!(
            (core.sketch.prev_pointer_x(), core.sketch.prev_pointer_y()),
            (10, 10)
        );
        assert_eq!(core.sketch.pointer_button(), Some(PointerButton::Left));
    }

    // ── pressed flag visibility ──────────────────────────────────────────

    #[test]
    fn pressed_flag_transitions_before_the_hook_fires() {
        struct Probe {
            seen: Arc<Mutex<Vec<bool>>>,
        }

        impl SketchHook for Probe {
            fn pointer_event(&mut self, sketch: &Sketch, _event: &PointerEvent) -> HookResult {
                self.seen.lock().unwrap().push(sketch.is_pointer_pressed());
                Ok(())
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut core = test_core();
        core.sketch
            .hooks
            .register(Hook::PointerEvent, "probe", shared(Probe { seen: seen.clone() }))
            .unwrap();

        let queue = EventQueue::new();
        queue.push(
            PointerEvent::new(PointerAction::Press, 5, 5)
                .with_button(PointerButton::Left)
                .into(),
        );
        queue.push(
            PointerEvent::new(PointerAction::Release, 5, 5)
                .with_button(PointerButton::Left)
                .into(),
        );
        drain(&mut core, &queue).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
        assert!(!core.sketch.is_pointer_pressed());
    }

    // ── action callback routing ──────────────────────────────────────────

    #[test]
    fn actions_reach_their_own_callbacks() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut core = test_core();

        let log = order.clone();
        core.callbacks.pointer_moved = Some(Box::new(move |_, _| {
            log.lock().unwrap().push("moved");
            Ok(())
        }));
        let log = order.clone();
        core.callbacks.pointer_clicked = Some(Box::new(move |_, _| {
            log.lock().unwrap().push("clicked");
            Ok(())
        }));
        let log = order.clone();
        core.callbacks.pointer_wheel = Some(Box::new(move |_, ev: &PointerEvent| {
            assert_eq!(ev.wheel, 3.0);
            log.lock().unwrap().push("wheel");
            Ok(())
        }));

        let queue = EventQueue::new();
        queue.push(pointer(PointerAction::Move, 1, 1));
        queue.push(pointer(PointerAction::Click, 1, 1));
        queue.push(PointerEvent::new(PointerAction::Wheel, 1, 1).with_wheel(3.0).into());
        drain(&mut core, &queue).unwrap();

        assert_eq!(*order.lock().unwrap(), vec!["moved", "clicked", "wheel"]);
    }

    #[test]
    fn callback_error_stops_the_drain_and_keeps_the_rest_queued() {
        let mut core = test_core();
        core.callbacks.pointer_moved =
            Some(Box::new(|_, _| Err(anyhow::anyhow!("sketch failure"))));

        let queue = EventQueue::new();
        queue.push(pointer(PointerAction::Move, 1, 1));
        queue.push(pointer(PointerAction::Click, 2, 2));

        assert!(drain(&mut core, &queue).is_err());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn events_posted_during_a_drain_join_the_same_pass() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::new(EventQueue::new());
        let mut core = test_core();

        let log = order.clone();
        let feedback = queue.clone();
        core.callbacks.key_typed = Some(Box::new(move |_, ev: &KeyEvent| {
            log.lock().unwrap().push(ev.key);
            if ev.key == 'a' {
                feedback.push(KeyEvent::new(KeyAction::Type, 'b', 66).into());
            }
            Ok(())
        }));

        queue.push(KeyEvent::new(KeyAction::Type, 'a', 65).into());
        drain(&mut core, &queue).unwrap();

        assert_eq!(*order.lock().unwrap(), vec!['a', 'b']);
        assert!(queue.is_empty());
    }

    // ── key state ────────────────────────────────────────────────────────

    #[test]
    fn auto_repeat_presses_are_dropped_unless_enabled() {
        let calls = Arc::new(Mutex::new(0));
        let mut core = test_core();
        let count = calls.clone();
        core.callbacks.key_pressed = Some(Box::new(move |_, _| {
            *count.lock().unwrap() += 1;
            Ok(())
        }));

        let queue = EventQueue::new();
        queue.push(key(KeyAction::Press, 'a').with_repeat().into());
        drain(&mut core, &queue).unwrap();
        assert_eq!(*calls.lock().unwrap(), 0);
        assert_eq!(core.sketch.key(), '\0');

        core.sketch.set_key_repeat(true);
        queue.push(key(KeyAction::Press, 'a').with_repeat().into());
        drain(&mut core, &queue).unwrap();
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(core.sketch.key(), 'a');
    }

    #[test]
    fn any_key_down_tracks_multiple_held_keys() {
        let mut core = test_core();
        let queue = EventQueue::new();

        queue.push(key(KeyAction::Press, 'a').into());
        queue.push(key(KeyAction::Press, 'b').into());
        queue.push(key(KeyAction::Release, 'a').into());
        drain(&mut core, &queue).unwrap();
        assert!(core.sketch.is_key_pressed());

        queue.push(key(KeyAction::Release, 'b').into());
        drain(&mut core, &queue).unwrap();
        assert!(!core.sketch.is_key_pressed());
    }

    // ── reserved interrupts ──────────────────────────────────────────────

    #[test]
    fn escape_press_requests_a_graceful_exit() {
        let mut core = test_core();
        let queue = EventQueue::new();
        queue.push(KeyEvent::new(KeyAction::Press, ESC, 27).into());
        drain(&mut core, &queue).unwrap();

        assert!(core.sketch.flags.finished());
        assert!(core.sketch.flags.exit_requested());
    }

    #[test]
    fn callback_may_swallow_the_escape() {
        let mut core = test_core();
        core.callbacks.key_pressed = Some(Box::new(|sketch, _| {
            sketch.set_key('\0');
            Ok(())
        }));

        let queue = EventQueue::new();
        queue.push(KeyEvent::new(KeyAction::Press, ESC, 27).into());
        drain(&mut core, &queue).unwrap();

        assert!(!core.sketch.flags.finished());
    }

    #[test]
    fn close_chord_exits_only_under_external_supervision() {
        let modifiers = if cfg!(target_os = "macos") {
            Modifiers {
                meta: true,
                ..Modifiers::default()
            }
        } else {
            Modifiers {
                ctrl: true,
                ..Modifiers::default()
            }
        };
        let chord = KeyEvent::new(KeyAction::Press, 'w', u32::from('W')).with_modifiers(modifiers);

        let mut core = test_core();
        let queue = EventQueue::new();
        queue.push(chord.into());
        drain(&mut core, &queue).unwrap();
        assert!(!core.sketch.flags.finished());

        core.sketch.settings.external = true;
        queue.push(chord.into());
        drain(&mut core, &queue).unwrap();
        assert!(core.sketch.flags.finished());
    }
}
