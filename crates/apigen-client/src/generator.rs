use apigen_core::config::MutatorConfig;
use apigen_core::error::GeneratorError;
use apigen_core::generator::{
    Backend, ClientContext, ClientOutput, DeferredRegistry, DependencyOptions,
    GeneratorDependency, GeneratorImport, GeneratorRegistry, UnitContext,
};
use apigen_core::ir::OperationRecord;
use apigen_core::transform::name_normalizer::normalize_name;
use log::debug;

use crate::emitters;

/// Native `fetch` client: one URL builder and one typed request function per operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct FetchBackend;

/// How axios operations are exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxiosStyle {
    /// `export const getPetstore = () => { ...; return { ... }; };`
    Factory,
    /// Plain functions exported at module level.
    Functions,
}

#[derive(Debug, Clone, Copy)]
pub struct AxiosBackend {
    style: AxiosStyle,
}

impl AxiosBackend {
    pub fn factory() -> Self {
        Self {
            style: AxiosStyle::Factory,
        }
    }

    pub fn functions() -> Self {
        Self {
            style: AxiosStyle::Functions,
        }
    }

    pub fn style(&self) -> AxiosStyle {
        self.style
    }
}

/// Register the `fetch`, `axios` and `axios-functions` backends.
pub fn register(registry: &mut GeneratorRegistry) {
    registry
        .register(Box::new(FetchBackend))
        .register(Box::new(AxiosBackend::factory()))
        .register(Box::new(AxiosBackend::functions()));
}

fn mutator_import(mutator: &MutatorConfig) -> GeneratorDependency {
    let import = if mutator.default {
        GeneratorImport::default_export(mutator.name.as_str())
    } else {
        GeneratorImport::named(mutator.name.as_str())
    };
    GeneratorDependency::new(mutator.path.as_str(), vec![import])
}

/// Imports of custom executors and the query serializer.
fn custom_dependencies(options: &DependencyOptions) -> Vec<GeneratorDependency> {
    let mut deps: Vec<GeneratorDependency> = options.mutators.iter().map(mutator_import).collect();
    if options.has_query_params
        && let Some(serializer) = &options.params_serializer
    {
        deps.push(mutator_import(serializer));
    }
    deps
}

fn model_imports(record: &OperationRecord) -> Vec<String> {
    record.model_refs().into_iter().collect()
}

fn flush(unit: &UnitContext<'_>, deferred: &DeferredRegistry) -> String {
    deferred.flush(&unit.operation_names()).join("\n\n")
}

impl Backend for FetchBackend {
    fn id(&self) -> &'static str {
        "fetch"
    }

    fn title(&self, raw: &str) -> String {
        normalize_name(raw).pascal_case
    }

    fn header(&self, _unit: &UnitContext<'_>) -> Result<String, GeneratorError> {
        Ok(String::new())
    }

    fn footer(
        &self,
        unit: &UnitContext<'_>,
        deferred: &DeferredRegistry,
    ) -> Result<String, GeneratorError> {
        Ok(flush(unit, deferred))
    }

    fn dependencies(&self, options: &DependencyOptions) -> Vec<GeneratorDependency> {
        custom_dependencies(options)
    }

    fn client(
        &self,
        record: &OperationRecord,
        ctx: &mut ClientContext<'_>,
    ) -> Result<ClientOutput, GeneratorError> {
        Ok(ClientOutput {
            implementation: emitters::fetch::render_operation(record, ctx.config)?,
            imports: model_imports(record),
        })
    }
}

impl Backend for AxiosBackend {
    fn id(&self) -> &'static str {
        match self.style {
            AxiosStyle::Factory => "axios",
            AxiosStyle::Functions => "axios-functions",
        }
    }

    fn title(&self, raw: &str) -> String {
        normalize_name(raw).pascal_case
    }

    fn header(&self, unit: &UnitContext<'_>) -> Result<String, GeneratorError> {
        Ok(match self.style {
            AxiosStyle::Factory => format!("export const get{} = () => {{", unit.title),
            AxiosStyle::Functions => String::new(),
        })
    }

    fn footer(
        &self,
        unit: &UnitContext<'_>,
        deferred: &DeferredRegistry,
    ) -> Result<String, GeneratorError> {
        let names = unit.operation_names().join(", ");
        let exports = match self.style {
            AxiosStyle::Factory => format!("  return {{ {names} }};\n}};"),
            AxiosStyle::Functions if names.is_empty() => String::new(),
            AxiosStyle::Functions => format!("export {{ {names} }};"),
        };
        let deferred = flush(unit, deferred);
        Ok([exports, deferred]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    fn dependencies(&self, options: &DependencyOptions) -> Vec<GeneratorDependency> {
        let mut deps = vec![GeneratorDependency::new(
            "axios",
            vec![
                GeneratorImport::default_export("axios"),
                GeneratorImport::type_only("AxiosRequestConfig"),
                GeneratorImport::type_only("AxiosResponse"),
            ],
        )];
        deps.extend(custom_dependencies(options));
        deps
    }

    fn client(
        &self,
        record: &OperationRecord,
        ctx: &mut ClientContext<'_>,
    ) -> Result<ClientOutput, GeneratorError> {
        let implementation = emitters::axios::render_operation(record, ctx.config)?;
        let factory = match self.style {
            AxiosStyle::Factory => Some(format!("get{}", self.title(ctx.unit))),
            AxiosStyle::Functions => None,
        };
        let deferred = emitters::axios::render_deferred(record, ctx.config, factory.as_deref());
        debug!("deferring declarations of {}", record.name.camel_case);
        ctx.deferred.register(&record.name.camel_case, deferred);
        Ok(ClientOutput {
            implementation,
            imports: model_imports(record),
        })
    }
}
