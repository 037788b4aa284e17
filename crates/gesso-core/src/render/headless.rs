use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::Renderer;

/// Shared counters for the headless renderer, mostly useful in tests that
/// need to observe lifecycle traffic from outside the runtime.
#[derive(Default)]
pub struct RenderStats {
    frames_begun: AtomicU64,
    frames_ended: AtomicU64,
    resizes: AtomicU64,
    disposals: AtomicU64,
}

impl RenderStats {
    pub fn frames_begun(&self) -> u64 {
        self.frames_begun.load(Ordering::Relaxed)
    }

    pub fn frames_ended(&self) -> u64 {
        self.frames_ended.load(Ordering::Relaxed)
    }

    pub fn resized(&self) -> u64 {
        self.resizes.load(Ordering::Relaxed)
    }

    pub fn disposals(&self) -> u64 {
        self.disposals.load(Ordering::Relaxed)
    }
}

/// A renderer that draws nothing.
///
/// It keeps the frame protocol honest (begin, end, resize, dispose) without
/// touching any display, which makes it the default backend for tests and
/// for sketches that only want the scheduling machinery.
pub struct HeadlessRenderer {
    stats: Arc<RenderStats>,
    width: u32,
    height: u32,
    output_path: Option<PathBuf>,
    disposed: bool,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::with_stats(Arc::new(RenderStats::default()))
    }

    /// Builds a renderer reporting into an externally held counter block.
    pub fn with_stats(stats: Arc<RenderStats>) -> Self {
        Self {
            stats,
            width: 0,
            height: 0,
            output_path: None,
            disposed: false,
        }
    }

    pub fn stats(&self) -> Arc<RenderStats> {
        self.stats.clone()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HeadlessRenderer {
    fn begin_frame(&mut self) {
        self.stats.frames_begun.fetch_add(1, Ordering::Relaxed);
    }

    fn end_frame(&mut self) {
        self.stats.frames_ended.fetch_add(1, Ordering::Relaxed);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.stats.resizes.fetch_add(1, Ordering::Relaxed);
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.stats.disposals.fetch_add(1, Ordering::Relaxed);
    }

    fn is_accelerated(&self) -> bool {
        false
    }

    fn set_output_path(&mut self, path: &Path) {
        self.output_path = Some(path.to_path_buf());
    }
}
