//! Sketch lifecycle state machine.
//!
//! Tracks which phase a sketch is in so that configuration, looping, and
//! shutdown transitions stay legal:
//!
//! - configuration is only open between `begin_configuration` and
//!   `end_configuration`
//! - pause and resume report whether they actually transitioned
//! - shutdown is one-way; a disposed sketch never runs again

use std::fmt;

use crate::error::LifecycleError;

/// Phases a sketch moves through, in rough chronological order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Constructed, configuration not yet opened.
    Unconfigured,
    /// Inside the configuration window; structural settings may change.
    Configuring,
    /// Configured and initialized, not yet producing frames.
    Ready,
    /// Producing frames.
    Looping,
    /// Frame production suspended.
    Paused,
    /// Shutdown began; resources are being released.
    Stopping,
    /// Fully released.
    Disposed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Unconfigured => "unconfigured",
            Phase::Configuring => "configuring",
            Phase::Ready => "ready",
            Phase::Looping => "looping",
            Phase::Paused => "paused",
            Phase::Stopping => "stopping",
            Phase::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// The state machine itself. Owned by the sketch and mutated only from
/// whichever thread currently holds the sketch.
#[derive(Debug)]
pub struct Lifecycle {
    phase: Phase,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: Phase::Unconfigured,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_configuring(&self) -> bool {
        self.phase == Phase::Configuring
    }

    /// Opens the configuration window.
    pub fn begin_configuration(&mut self) -> Result<(), LifecycleError> {
        match self.phase {
            Phase::Unconfigured => {
                self.phase = Phase::Configuring;
                Ok(())
            }
            phase => Err(LifecycleError::Illegal {
                op: "opening configuration",
                phase,
            }),
        }
    }

    /// Closes the configuration window; structural settings freeze here.
    pub fn end_configuration(&mut self) -> Result<(), LifecycleError> {
        match self.phase {
            Phase::Configuring => {
                self.phase = Phase::Ready;
                Ok(())
            }
            phase => Err(LifecycleError::Illegal {
                op: "closing configuration",
                phase,
            }),
        }
    }

    /// Moves into `Looping` from `Ready` or `Paused`.
    ///
    /// Returns whether a transition happened; resuming an already looping
    /// sketch is a quiet no-op so hosts can deliver redundant focus events.
    pub fn resume(&mut self) -> bool {
        match self.phase {
            Phase::Ready | Phase::Paused => {
                self.phase = Phase::Looping;
                true
            }
            _ => false,
        }
    }

    /// Moves into `Paused` from `Looping`. Returns whether a transition
    /// happened.
    pub fn pause(&mut self) -> bool {
        match self.phase {
            Phase::Looping => {
                self.phase = Phase::Paused;
                true
            }
            _ => false,
        }
    }

    /// Enters shutdown. Legal from any phase that is not already shutting
    /// down, so an error during configuration still tears down cleanly.
    pub fn begin_shutdown(&mut self) -> bool {
        match self.phase {
            Phase::Stopping | Phase::Disposed => false,
            _ => {
                self.phase = Phase::Stopping;
                true
            }
        }
    }

    pub fn complete_shutdown(&mut self) {
        self.phase = Phase::Disposed;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
