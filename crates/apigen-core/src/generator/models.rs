use super::GeneratorDependency;
use crate::config::{OutputMode, TargetConfig};
use crate::emit::SchemaFileEntry;
use crate::error::GeneratorError;
use crate::ir::model_path;
use crate::parse::schema::SchemaOrRef;
use crate::resolve::SchemaArena;

/// What a model emitter knows about the run.
#[derive(Debug, Clone, Copy)]
pub struct ModelContext<'a> {
    pub arena: &'a SchemaArena,
    pub config: &'a TargetConfig,
    pub file_stem: &'a str,
}

impl ModelContext<'_> {
    /// Destination of the named model.
    pub fn path_for(&self, schema_name: &str) -> String {
        model_path(self.config.mode, self.file_stem, schema_name)
    }

    /// Whether all models land in one shared file.
    pub fn shared_file(&self) -> bool {
        !matches!(
            self.config.mode,
            OutputMode::TagsSplit | OutputMode::Operations
        )
    }
}

/// Renders named component schemas as model declarations.
pub trait ModelEmitter: Send + Sync {
    fn id(&self) -> &'static str;

    fn emit(
        &self,
        name: &str,
        schema: &SchemaOrRef,
        ctx: &ModelContext<'_>,
    ) -> Result<SchemaFileEntry, GeneratorError>;

    /// Imports every model file needs regardless of content.
    fn dependencies(&self) -> Vec<GeneratorDependency>;

    /// Whether cross-model imports only need the type side of a binding.
    fn type_only_imports(&self) -> bool;
}
