//! # Engine Registry
//!
//! Maps engine identifiers to [`BuildEngine`] implementations. Builds name
//! an engine in their spec; builds that name none get the configured
//! default. Resolution of an unknown id is a terminal error, reported on
//! the build instead of retried.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::constants::engine::DEFAULT_ENGINE;

use super::{BuildEngine, EngineError};

/// Registry of build engines keyed by their self-reported names.
pub struct EngineRegistry {
    engines: RwLock<HashMap<String, Arc<dyn BuildEngine>>>,
    default_id: String,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::with_default(DEFAULT_ENGINE)
    }

    /// Registry whose unnamed-engine fallback is `default_id`.
    pub fn with_default(default_id: impl Into<String>) -> Self {
        Self {
            engines: RwLock::new(HashMap::new()),
            default_id: default_id.into(),
        }
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// Register an engine under the name it reports. Re-registering a name
    /// replaces the previous engine.
    pub fn register(&self, engine: Arc<dyn BuildEngine>) {
        let id = engine.name().to_string();
        let mut engines = self.engines.write();
        if engines.insert(id.clone(), engine).is_some() {
            info!(engine_id = %id, "Replaced registered build engine");
        } else {
            info!(engine_id = %id, "Registered build engine");
        }
    }

    /// Resolve the engine a build selects, falling back to the default
    /// when the build names none.
    pub fn resolve(&self, requested: Option<&str>) -> Result<Arc<dyn BuildEngine>, EngineError> {
        let id = requested.unwrap_or(&self.default_id);
        let engines = self.engines.read();
        match engines.get(id) {
            Some(engine) => {
                debug!(engine_id = %id, "Resolved build engine");
                Ok(Arc::clone(engine))
            }
            None => Err(EngineError::EngineNotFound { id: id.to_string() }),
        }
    }

    pub fn registered_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.engines.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("default_id", &self.default_id)
            .field("registered", &self.registered_ids())
            .finish()
    }
}
