use indexmap::IndexMap;

use super::{Backend, ModelEmitter};
use crate::error::GeneratorError;
use crate::typescript::TypeScriptModels;

/// Backends and model emitters keyed by their id. Resolved once per run.
pub struct GeneratorRegistry {
    backends: IndexMap<&'static str, Box<dyn Backend>>,
    models: IndexMap<&'static str, Box<dyn ModelEmitter>>,
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        let mut registry = Self {
            backends: IndexMap::new(),
            models: IndexMap::new(),
        };
        registry.register_models(Box::new(TypeScriptModels));
        registry
    }
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a backend. A backend with the same id is replaced.
    pub fn register(&mut self, backend: Box<dyn Backend>) -> &mut Self {
        self.backends.insert(backend.id(), backend);
        self
    }

    pub fn get(&self, id: &str) -> Result<&dyn Backend, GeneratorError> {
        self.backends
            .get(id)
            .map(|b| b.as_ref())
            .ok_or_else(|| GeneratorError::UnknownBackend(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.backends.keys().copied()
    }

    /// Add a model emitter. The TypeScript emitter is always present.
    pub fn register_models(&mut self, emitter: Box<dyn ModelEmitter>) -> &mut Self {
        self.models.insert(emitter.id(), emitter);
        self
    }

    pub fn models(&self, id: &str) -> Result<&dyn ModelEmitter, GeneratorError> {
        self.models
            .get(id)
            .map(|m| m.as_ref())
            .ok_or_else(|| GeneratorError::UnknownBackend(id.to_string()))
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("backends", &self.backends.keys().collect::<Vec<_>>())
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}
