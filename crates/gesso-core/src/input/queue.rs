use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::types::InputEvent;

/// Unbounded FIFO queue for inbound events.
///
/// Producers push from any thread; the dispatcher pops one event at a time so
/// the queue lock is never held while an event is routed. Events posted while
/// a drain is in progress are picked up by the same drain pass.
#[derive(Debug, Default)]
pub struct EventQueue {
    inner: Mutex<VecDeque<InputEvent>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: InputEvent) {
        self.locked().push_back(event);
    }

    pub fn pop(&self) -> Option<InputEvent> {
        self.locked().pop_front()
    }

    pub fn len(&self) -> usize {
        self.locked().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked().is_empty()
    }

    // A panicking sketch must not wedge the queue for the shutdown path.
    fn locked(&self) -> MutexGuard<'_, VecDeque<InputEvent>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
