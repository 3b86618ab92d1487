//! Native full-text engine availability probe. The probe function runs at most once; its result is
//! cached for the lifetime of this handle.

use std::sync::OnceLock;

/// Caches whether a native full-text engine is available, so the query
/// executor does not re-probe on every text search.
pub struct TextEngineCapability {
    probe: Box<dyn Fn() -> bool + Send + Sync>,
    cached: OnceLock<bool>,
}

impl TextEngineCapability {
    /// Wrap a probe function; it is invoked at most once.
    pub fn new(probe: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        TextEngineCapability {
            probe: Box::new(probe),
            cached: OnceLock::new(),
        }
    }

    /// A capability that always reports the given availability, without a probe.
    pub fn always(available: bool) -> Self {
        Self::new(move || available)
    }

    /// Whether the native engine is available, probing and caching on first call.
    pub fn is_available(&self) -> bool {
        *self.cached.get_or_init(|| (self.probe)())
    }
}
