use std::path::PathBuf;

use crate::render::HEADLESS;

/// What the runtime does once the sketch is done.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum ExitAction {
    /// Terminate the process, the way a standalone sketch application ends.
    #[default]
    TerminateProcess,
    /// Return from `Runtime::run` instead, for embedders and tests.
    ReturnFromRun,
}

/// Configuration captured during the configuration phase.
///
/// Structural fields (size, renderer, density, smoothing, output path)
/// freeze when the phase closes; the rest may be retuned at runtime.
#[derive(Debug, Clone)]
pub(crate) struct SketchSettings {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) pixel_density: u32,
    pub(crate) smoothing: u32,
    pub(crate) renderer: String,
    pub(crate) output_path: Option<PathBuf>,
    pub(crate) target_frame_rate: f32,
    pub(crate) key_repeat: bool,
    pub(crate) external: bool,
    pub(crate) exit_action: ExitAction,
}

impl Default for SketchSettings {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            pixel_density: 1,
            smoothing: 1,
            renderer: HEADLESS.to_string(),
            output_path: None,
            target_frame_rate: 60.0,
            key_repeat: false,
            external: false,
            exit_action: ExitAction::default(),
        }
    }
}
