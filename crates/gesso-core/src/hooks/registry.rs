use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{BoxError, HookError};
use crate::input::{KeyEvent, PointerEvent};
use crate::sketch::Sketch;

/// Named extension points fired by the scheduler and the dispatcher.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Hook {
    /// Before the sketch's `draw` callback, once per frame.
    Pre,
    /// After `draw` and the event drain, once per frame.
    Draw,
    /// After the `draw` hooks, once per frame.
    Post,
    /// When the sketch is paused by the host.
    Pause,
    /// When the sketch starts or resumes.
    Resume,
    /// Once, during disposal.
    Dispose,
    /// For every routed pointer event.
    PointerEvent,
    /// For every routed key event.
    KeyEvent,
}

impl Hook {
    pub const ALL: [Hook; 8] = [
        Hook::Pre,
        Hook::Draw,
        Hook::Post,
        Hook::Pause,
        Hook::Resume,
        Hook::Dispose,
        Hook::PointerEvent,
        Hook::KeyEvent,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Hook::Pre => "pre",
            Hook::Draw => "draw",
            Hook::Post => "post",
            Hook::Pause => "pause",
            Hook::Resume => "resume",
            Hook::Dispose => "dispose",
            Hook::PointerEvent => "pointerEvent",
            Hook::KeyEvent => "keyEvent",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result returned by hook methods.
///
/// `Err` marks a recoverable failure: it is logged with the owner identity
/// and the remaining handlers for the hook still run. Programmer errors
/// should panic instead; a panic aborts the frame.
pub type HookResult = Result<(), BoxError>;

/// Capability implemented by hook owners.
///
/// One default no-op method per hook; a handler may be registered for any
/// subset of hooks. Handlers receive a read-only view of the sketch so they
/// can observe state such as the pointer-pressed flag, which is updated
/// before the event hooks fire.
pub trait SketchHook: Send {
    fn pre(&mut self, sketch: &Sketch) -> HookResult {
        let _ = sketch;
        Ok(())
    }

    fn draw(&mut self, sketch: &Sketch) -> HookResult {
        let _ = sketch;
        Ok(())
    }

    fn post(&mut self, sketch: &Sketch) -> HookResult {
        let _ = sketch;
        Ok(())
    }

    fn pause(&mut self, sketch: &Sketch) -> HookResult {
        let _ = sketch;
        Ok(())
    }

    fn resume(&mut self, sketch: &Sketch) -> HookResult {
        let _ = sketch;
        Ok(())
    }

    fn dispose(&mut self, sketch: &Sketch) -> HookResult {
        let _ = sketch;
        Ok(())
    }

    fn pointer_event(&mut self, sketch: &Sketch, event: &PointerEvent) -> HookResult {
        let _ = (sketch, event);
        Ok(())
    }

    fn key_event(&mut self, sketch: &Sketch, event: &KeyEvent) -> HookResult {
        let _ = (sketch, event);
        Ok(())
    }
}

/// Shared, lockable handler handle as stored in the registry.
pub type SharedHook = Arc<Mutex<dyn SketchHook>>;

/// Wraps a handler for registration.
pub fn shared(hook: impl SketchHook + 'static) -> SharedHook {
    Arc::new(Mutex::new(hook))
}

#[derive(Clone)]
struct Entry {
    owner: String,
    handler: SharedHook,
}

/// Hook table keyed by hook name.
///
/// At most one registration per (owner, hook) pair. Invocation iterates a
/// snapshot taken under the table lock, so a handler may register or
/// unregister any handler, including itself, from inside its own invocation.
#[derive(Default)]
pub struct HookRegistry {
    table: Mutex<HashMap<Hook, Vec<Entry>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `(owner, hook)`.
    ///
    /// Rejects duplicates and keeps the existing entry.
    pub fn register(
        &self,
        hook: Hook,
        owner: &str,
        handler: SharedHook,
    ) -> Result<(), HookError> {
        let mut table = self.locked();
        let entries = table.entry(hook).or_default();
        if entries.iter().any(|e| e.owner == owner) {
            return Err(HookError::Duplicate {
                owner: owner.to_string(),
                hook,
            });
        }
        entries.push(Entry {
            owner: owner.to_string(),
            handler,
        });
        log::debug!("registered \"{owner}\" for the {hook} hook");
        Ok(())
    }

    /// Removes the `(owner, hook)` entry if present; silently does nothing
    /// otherwise. The relative order of the remaining entries is preserved.
    pub fn unregister(&self, hook: Hook, owner: &str) {
        let mut table = self.locked();
        if let Some(entries) = table.get_mut(&hook) {
            if let Some(pos) = entries.iter().position(|e| e.owner == owner) {
                entries.remove(pos);
                log::debug!("unregistered \"{owner}\" from the {hook} hook");
            }
        }
    }

    pub fn is_registered(&self, hook: Hook, owner: &str) -> bool {
        self.locked()
            .get(&hook)
            .is_some_and(|entries| entries.iter().any(|e| e.owner == owner))
    }

    /// Fires one of the event-less hooks.
    pub(crate) fn fire(&self, hook: Hook, sketch: &Sketch) {
        debug_assert!(!matches!(hook, Hook::PointerEvent | Hook::KeyEvent));
        for entry in self.snapshot(hook) {
            let result = {
                let mut handler = lock_handler(&entry.handler);
                match hook {
                    Hook::Pre => handler.pre(sketch),
                    Hook::Draw => handler.draw(sketch),
                    Hook::Post => handler.post(sketch),
                    Hook::Pause => handler.pause(sketch),
                    Hook::Resume => handler.resume(sketch),
                    Hook::Dispose => handler.dispose(sketch),
                    Hook::PointerEvent | Hook::KeyEvent => Ok(()),
                }
            };
            log_failure(hook, &entry.owner, result);
        }
    }

    /// Fires the `pointerEvent` hook with the routed event.
    pub(crate) fn fire_pointer(&self, sketch: &Sketch, event: &PointerEvent) {
        for entry in self.snapshot(Hook::PointerEvent) {
            let result = lock_handler(&entry.handler).pointer_event(sketch, event);
            log_failure(Hook::PointerEvent, &entry.owner, result);
        }
    }

    /// Fires the `keyEvent` hook with the routed event.
    pub(crate) fn fire_key(&self, sketch: &Sketch, event: &KeyEvent) {
        for entry in self.snapshot(Hook::KeyEvent) {
            let result = lock_handler(&entry.handler).key_event(sketch, event);
            log_failure(Hook::KeyEvent, &entry.owner, result);
        }
    }

    fn snapshot(&self, hook: Hook) -> Vec<Entry> {
        self.locked().get(&hook).cloned().unwrap_or_default()
    }

    // Disposal hooks still fire after a panicking frame poisoned the lock.
    fn locked(&self) -> MutexGuard<'_, HashMap<Hook, Vec<Entry>>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn lock_handler(handler: &SharedHook) -> MutexGuard<'_, dyn SketchHook + 'static> {
    handler.lock().unwrap_or_else(PoisonError::into_inner)
}

fn log_failure(hook: Hook, owner: &str, result: HookResult) {
    if let Err(err) = result {
        log::error!("{hook} hook of \"{owner}\" failed: {err}; continuing");
    }
}
