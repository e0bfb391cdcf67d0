//! The backend protocol every target implements, plus the per-run state it may touch.

pub mod deferred;
pub mod imports;
pub mod models;
pub mod registry;

use crate::config::{MutatorConfig, TargetConfig};
use crate::error::GeneratorError;
use crate::ir::{IrInfo, OperationRecord, OutputUnit};
use crate::resolve::SchemaArena;

pub use deferred::DeferredRegistry;
pub use models::{ModelContext, ModelEmitter};
pub use registry::GeneratorRegistry;

/// A module specifier plus the names imported from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorDependency {
    pub dependency: String,
    pub exports: Vec<GeneratorImport>,
}

impl GeneratorDependency {
    pub fn new(dependency: impl Into<String>, exports: Vec<GeneratorImport>) -> Self {
        Self {
            dependency: dependency.into(),
            exports,
        }
    }
}

/// One imported binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GeneratorImport {
    pub name: String,
    pub alias: Option<String>,
    pub default: bool,
    pub type_only: bool,
}

impl GeneratorImport {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            default: false,
            type_only: false,
        }
    }

    pub fn default_export(name: impl Into<String>) -> Self {
        Self {
            default: true,
            ..Self::named(name)
        }
    }

    pub fn type_only(name: impl Into<String>) -> Self {
        Self {
            type_only: true,
            ..Self::named(name)
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..Self::named(name)
        }
    }

    /// The identifier this import binds in the importing file.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Inputs to [`Backend::dependencies`] for one output unit.
#[derive(Debug, Clone, Default)]
pub struct DependencyOptions {
    /// Distinct mutators used by the unit's operations.
    pub mutators: Vec<MutatorConfig>,
    pub params_serializer: Option<MutatorConfig>,
    pub has_query_params: bool,
    pub zod_version: Option<String>,
}

/// What a backend sees when rendering a unit's header or footer.
#[derive(Debug)]
pub struct UnitContext<'a> {
    pub unit: &'a OutputUnit,
    /// Result of [`Backend::title`] for the unit's raw name.
    pub title: String,
    pub records: Vec<&'a OperationRecord>,
    pub config: &'a TargetConfig,
    pub info: &'a IrInfo,
}

impl UnitContext<'_> {
    pub fn operation_names(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.name.camel_case.as_str())
            .collect()
    }
}

/// Mutable state available to [`Backend::client`].
pub struct ClientContext<'a> {
    pub unit: &'a str,
    pub config: &'a TargetConfig,
    pub arena: &'a SchemaArena,
    pub deferred: &'a mut DeferredRegistry,
}

/// Rendered source for one operation plus the model names it refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOutput {
    pub implementation: String,
    pub imports: Vec<String>,
}

/// A code generation target.
///
/// The pipeline calls `header`, then `client` once per operation of the unit, then
/// `footer`. Nothing else about a backend is special-cased.
pub trait Backend: Send + Sync {
    /// Registry key, e.g. `fetch`.
    fn id(&self) -> &'static str;

    /// Identifier fragment derived from a unit's raw name.
    fn title(&self, raw: &str) -> String;

    fn header(&self, unit: &UnitContext<'_>) -> Result<String, GeneratorError>;

    /// Runs after every `client` call of the unit. Flushes the unit's deferred entries.
    fn footer(
        &self,
        unit: &UnitContext<'_>,
        deferred: &DeferredRegistry,
    ) -> Result<String, GeneratorError>;

    fn dependencies(&self, options: &DependencyOptions) -> Vec<GeneratorDependency>;

    fn client(
        &self,
        record: &OperationRecord,
        ctx: &mut ClientContext<'_>,
    ) -> Result<ClientOutput, GeneratorError>;
}
