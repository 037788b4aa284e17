use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{BoxError, RendererError};

use super::headless::HeadlessRenderer;
use super::{HEADLESS, Renderer};

/// Factory closure producing a renderer. The argument says whether the
/// instance will back the primary surface.
pub type RendererFactory = Box<dyn Fn(bool) -> Result<Box<dyn Renderer>, BoxError> + Send + Sync>;

/// Parameters for one renderer construction.
#[derive(Copy, Clone)]
pub struct RendererRequest<'a> {
    pub width: u32,
    pub height: u32,
    pub id: &'a str,
    pub output_path: Option<&'a Path>,
    pub primary: bool,
    /// Acceleration capability of the already-constructed primary renderer;
    /// `None` while the primary itself is being constructed.
    pub primary_accelerated: Option<bool>,
}

struct Registration {
    accelerated: bool,
    factory: RendererFactory,
}

/// Name → factory registry, populated at startup.
///
/// Renderer identifiers are late-bound strings so backends can be swapped
/// without recompiling the core; there is no runtime code loading involved.
#[derive(Default)]
pub struct RendererRegistry {
    factories: Mutex<HashMap<String, Arc<Registration>>>,
}

impl RendererRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in headless renderer registered.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(HEADLESS, false, Box::new(|_primary| Ok(Box::new(HeadlessRenderer::new()))));
        registry
    }

    /// Registers (or replaces) a factory under `id`.
    ///
    /// `accelerated` declares the capability of the instances the factory
    /// produces; it gates offscreen construction against the primary.
    pub fn register(&self, id: &str, accelerated: bool, factory: RendererFactory) {
        let previous = self.locked().insert(
            id.to_string(),
            Arc::new(Registration {
                accelerated,
                factory,
            }),
        );
        if previous.is_some() {
            log::debug!("renderer \"{id}\" re-registered");
        }
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.locked().contains_key(id)
    }

    /// Declared acceleration capability for `id`, if registered.
    pub fn is_accelerated(&self, id: &str) -> Option<bool> {
        self.locked().get(id).map(|r| r.accelerated)
    }

    /// Resolves and constructs a renderer.
    ///
    /// Every failure is wrapped into [`RendererError`] with a remediation
    /// hint; compatibility violations get their own variant so the caller
    /// can name the required primary configuration.
    pub fn create(&self, request: &RendererRequest<'_>) -> Result<Box<dyn Renderer>, RendererError> {
        if request.width == 0 || request.height == 0 {
            return Err(RendererError::Instantiation {
                id: request.id.to_string(),
                hint: format!(
                    "invalid dimensions {}x{}; both must be at least 1",
                    request.width, request.height
                ),
                source: None,
            });
        }

        let registration = {
            let factories = self.locked();
            match factories.get(request.id) {
                Some(r) => r.clone(),
                None => {
                    return Err(RendererError::Instantiation {
                        id: request.id.to_string(),
                        hint: "renderer not registered; register a factory for it at startup"
                            .to_string(),
                        source: None,
                    });
                }
            }
        };

        if !request.primary
            && registration.accelerated
            && request.primary_accelerated != Some(true)
        {
            return Err(RendererError::Incompatible {
                id: request.id.to_string(),
            });
        }

        // The factory runs outside the table lock so it may consult the
        // registry itself.
        let mut renderer =
            (registration.factory)(request.primary).map_err(|source| {
                RendererError::Instantiation {
                    id: request.id.to_string(),
                    hint: "the renderer factory failed".to_string(),
                    source: Some(source),
                }
            })?;

        if let Some(path) = request.output_path {
            renderer.set_output_path(path);
        }
        renderer.resize(request.width, request.height);

        log::debug!(
            "constructed {} renderer \"{}\" at {}x{}",
            if request.primary { "primary" } else { "offscreen" },
            request.id,
            request.width,
            request.height
        );
        Ok(renderer)
    }

    fn locked(&self) -> MutexGuard<'_, HashMap<String, Arc<Registration>>> {
        self.factories.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
