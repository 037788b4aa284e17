//! Error taxonomy.
//!
//! Typed errors cover the failures the runtime itself can diagnose; sketch
//! code reports its own failures as `anyhow::Error` through callback results.

use thiserror::Error;

use crate::hooks::Hook;
use crate::lifecycle::Phase;

/// Boxed error used where failures originate in user or library code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Raised when a configuration value is mutated outside the configuration
/// phase, or set to a value the runtime cannot honor. The prior value is
/// always kept.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{what}() is only available inside settings(); keeping the previous value")]
    OutsidePhase { what: &'static str },

    #[error("pixel density can only be 1 or 2, not {0}; keeping the previous value")]
    InvalidDensity(u32),

    #[error("{0}x{1} is not a usable size; both dimensions must be at least 1")]
    InvalidSize(u32, u32),
}

/// Renderer resolution and construction failures.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("renderer \"{id}\" could not be constructed: {hint}")]
    Instantiation {
        id: String,
        hint: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error(
        "renderer \"{id}\" is hardware accelerated; offscreen use requires the \
         primary renderer to be accelerated as well (pick one in settings())"
    )]
    Incompatible { id: String },
}

/// Hook registration failures.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("\"{owner}\" is already registered for the {hook} hook")]
    Duplicate { owner: String, hook: Hook },
}

/// Frame scheduling failures.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error(
        "frame entered before the previous one returned; \
         the driving surface must serialize frame callbacks"
    )]
    Reentrant,
}

/// Illegal lifecycle transitions.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{op} is not legal while the sketch is {phase}")]
    Illegal { op: &'static str, phase: Phase },
}
