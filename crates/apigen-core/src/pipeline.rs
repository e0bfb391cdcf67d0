//! One generation run: resolve, model operations, render every output unit and its models.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info, warn};

use crate::GeneratedFile;
use crate::config::TargetConfig;
use crate::emit::assemble::locate;
use crate::emit::{AssembledFile, IndexFile, assemble_entries, banner, export_line, render_file};
use crate::error::{GeneratorError, PipelineError};
use crate::generator::imports::{merge_dependencies, relative_import, render_dependency};
use crate::generator::{
    Backend, ClientContext, DeferredRegistry, DependencyOptions, GeneratorDependency,
    GeneratorImport, GeneratorRegistry, ModelContext, ModelEmitter, UnitContext,
};
use crate::ir::{IrInfo, OperationRecord, OutputUnit, check_collisions, plan_units};
use crate::parse::OpenApiSpec;
use crate::resolve::{ReachabilitySet, ResolvedSpec, resolve_spec};
use crate::transform::build_operations;
use crate::transform::name_normalizer::normalize_name;

/// Everything one target produced. Paths are relative to the target output directory.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub target: String,
    pub files: Vec<GeneratedFile>,
    pub indexes: Vec<IndexFile>,
    /// Units or models that failed to render. Their files are absent from `files`.
    pub errors: Vec<GeneratorError>,
    pub operations: usize,
    pub models: usize,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn file(&self, path: &str) -> Option<&GeneratedFile> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Drives backends and model emitters from a [`GeneratorRegistry`].
#[derive(Debug)]
pub struct Pipeline<'a> {
    registry: &'a GeneratorRegistry,
}

struct RunState<'a> {
    resolved: &'a ResolvedSpec,
    target: &'a TargetConfig,
    info: &'a IrInfo,
    banner: String,
    locations: HashMap<String, String>,
    /// Whether client files import models as types only.
    type_only_models: bool,
    /// Model files whose path coincides with a client file, keyed by lowercased path.
    embedded: HashMap<String, (String, Vec<GeneratorDependency>)>,
}

impl<'a> Pipeline<'a> {
    pub fn new(registry: &'a GeneratorRegistry) -> Self {
        Self { registry }
    }

    /// Generate every file for `target`.
    ///
    /// Resolution failures, naming collisions and unknown backends abort the run. A
    /// backend error only drops the unit it occurred in and is recorded in the report.
    pub fn run(
        &self,
        spec: &OpenApiSpec,
        target: &TargetConfig,
    ) -> Result<GenerationReport, PipelineError> {
        let backend = self.registry.get(&target.client)?;
        let model_emitter = self.registry.models(target.models.as_str())?;

        let resolved = resolve_spec(spec)?;
        let records = build_operations(&resolved, target)?;
        let info = IrInfo {
            title: resolved.title().to_string(),
            description: resolved.spec.info.description.clone(),
            version: resolved.spec.info.version.clone(),
        };
        let file_stem = target
            .file_name
            .clone()
            .unwrap_or_else(|| normalize_name(&info.title).camel_case);

        let units = plan_units(&records, target.mode, &info.title, &file_stem);
        for unit in &units {
            check_collisions(&records, unit)?;
        }

        let reachable =
            ReachabilitySet::from_roots(&resolved.arena, records.iter().flat_map(|r| r.schema_roots()));
        info!(
            "target {}: {} operations in {} units, {} of {} schemas reachable",
            target.name,
            records.len(),
            units.len(),
            reachable.len(),
            resolved.arena.len()
        );

        let mut report = GenerationReport {
            target: target.name.clone(),
            operations: records.len(),
            ..GenerationReport::default()
        };

        let model_ctx = ModelContext {
            arena: &resolved.arena,
            config: target,
            file_stem: &file_stem,
        };
        let model_files = emit_models(model_emitter, &reachable, &model_ctx, &mut report.errors);
        report.models = model_files.iter().map(|f| f.entries.len()).sum();

        let mut state = RunState {
            resolved: &resolved,
            target,
            info: &info,
            banner: banner(&info.title, &info.version),
            locations: locate(&model_files),
            type_only_models: model_emitter.type_only_imports(),
            embedded: HashMap::new(),
        };

        let unit_paths: BTreeSet<String> = units.iter().map(|u| u.path.to_lowercase()).collect();
        for file in &model_files {
            let mut deps = model_emitter.dependencies();
            deps.extend(file.model_imports(&state.locations, model_emitter.type_only_imports()));
            if unit_paths.contains(&file.path.to_lowercase()) {
                state
                    .embedded
                    .insert(file.path.to_lowercase(), (file.body(), deps));
                continue;
            }
            let imports: Vec<String> = merge_dependencies(deps).iter().map(render_dependency).collect();
            report.files.push(GeneratedFile {
                path: file.path.clone(),
                content: render_file(&state.banner, &imports, &[file.body()]),
            });
        }

        let mut deferred = DeferredRegistry::new();
        let mut written_units = Vec::new();
        for unit in &units {
            let unit_records: Vec<&OperationRecord> =
                unit.operations.iter().map(|&i| &records[i]).collect();
            let result = render_unit(backend, &state, unit, &unit_records, &mut deferred);
            let names: Vec<&str> = unit_records
                .iter()
                .map(|r| r.name.camel_case.as_str())
                .collect();
            deferred.clear(&names);
            match result {
                Ok(file) => {
                    debug!("rendered unit {} ({} operations)", unit.name, unit_records.len());
                    report.files.push(file);
                    written_units.push(unit.path.clone());
                }
                Err(err) => {
                    warn!("unit {} failed: {err}", unit.name);
                    report.errors.push(err.for_unit(&unit.name));
                }
            }
        }

        if target.index {
            report.indexes = plan_indexes(&state, &model_files, &written_units);
        }
        Ok(report)
    }
}

fn emit_models(
    emitter: &dyn ModelEmitter,
    reachable: &ReachabilitySet,
    ctx: &ModelContext<'_>,
    errors: &mut Vec<GeneratorError>,
) -> Vec<AssembledFile> {
    let mut entries = Vec::new();
    for name in reachable.iter() {
        let Some(schema) = ctx.arena.get(name) else {
            continue;
        };
        match emitter.emit(name, schema, ctx) {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                warn!("model {name} failed: {err}");
                errors.push(err.for_unit(name));
            }
        }
    }
    assemble_entries(entries)
}

fn render_unit(
    backend: &dyn Backend,
    state: &RunState<'_>,
    unit: &OutputUnit,
    records: &[&OperationRecord],
    deferred: &mut DeferredRegistry,
) -> Result<GeneratedFile, GeneratorError> {
    let ctx = UnitContext {
        unit,
        title: backend.title(&unit.name),
        records: records.to_vec(),
        config: state.target,
        info: state.info,
    };

    let header = backend.header(&ctx)?;
    let mut implementations = Vec::with_capacity(records.len());
    let mut referenced: BTreeSet<String> = BTreeSet::new();
    for record in records {
        let mut client_ctx = ClientContext {
            unit: &unit.name,
            config: state.target,
            arena: &state.resolved.arena,
            deferred: &mut *deferred,
        };
        let output = backend
            .client(record, &mut client_ctx)
            .map_err(|e| e.for_operation(&record.name.camel_case))?;
        implementations.push(output.implementation);
        referenced.extend(output.imports);
    }
    let footer = backend.footer(&ctx, deferred)?;

    let options = dependency_options(state.target, records);
    let mut deps = backend.dependencies(&options);
    let embedded = state.embedded.get(&unit.path.to_lowercase());
    if let Some((_, model_deps)) = embedded {
        deps.extend(model_deps.iter().cloned());
    }
    deps.extend(client_model_imports(
        &unit.path,
        &referenced,
        &state.locations,
        state.type_only_models,
    ));
    let imports: Vec<String> = merge_dependencies(deps)
        .iter()
        .filter(|d| !d.exports.is_empty())
        .map(render_dependency)
        .collect();

    let mut sections = Vec::with_capacity(implementations.len() + 3);
    if let Some((body, _)) = embedded {
        sections.push(body.clone());
    }
    sections.push(header);
    sections.extend(implementations);
    sections.push(footer);

    Ok(GeneratedFile {
        path: unit.path.clone(),
        content: render_file(&state.banner, &imports, &sections),
    })
}

fn dependency_options(target: &TargetConfig, records: &[&OperationRecord]) -> DependencyOptions {
    let mut mutators = Vec::new();
    for mutator in records.iter().filter_map(|r| r.mutator.as_ref()) {
        if !mutators.contains(mutator) {
            mutators.push(mutator.clone());
        }
    }
    DependencyOptions {
        mutators,
        params_serializer: target.params_serializer.clone(),
        has_query_params: records.iter().any(|r| !r.query_params.is_empty()),
        zod_version: target.zod.version.clone(),
    }
}

/// Imports of the models a client file mentions, one per model file.
fn client_model_imports(
    unit_path: &str,
    referenced: &BTreeSet<String>,
    locations: &HashMap<String, String>,
    type_only: bool,
) -> Vec<GeneratorDependency> {
    let mut by_file: BTreeMap<String, Vec<GeneratorImport>> = BTreeMap::new();
    for name in referenced {
        let Some(path) = locations.get(name) else {
            continue;
        };
        if path.eq_ignore_ascii_case(unit_path) {
            continue;
        }
        by_file
            .entry(relative_import(unit_path, path))
            .or_default()
            .push(if type_only {
                GeneratorImport::type_only(name.as_str())
            } else {
                GeneratorImport::named(name.as_str())
            });
    }
    by_file
        .into_iter()
        .map(|(dependency, exports)| GeneratorDependency::new(dependency, exports))
        .collect()
}

fn plan_indexes(
    state: &RunState<'_>,
    model_files: &[AssembledFile],
    unit_paths: &[String],
) -> Vec<IndexFile> {
    let mut indexes = Vec::new();
    let mut root_lines: Vec<String> = unit_paths.iter().map(|p| export_line("index.ts", p)).collect();

    if state.target.mode.splits_models() {
        if !model_files.is_empty() {
            let model_index = "model/index.ts";
            indexes.push(IndexFile {
                path: model_index.to_string(),
                lines: model_files
                    .iter()
                    .map(|f| export_line(model_index, &f.path))
                    .collect(),
            });
            root_lines.push(export_line("index.ts", model_index));
        }
    } else {
        root_lines.extend(
            model_files
                .iter()
                .filter(|f| !state.embedded.contains_key(&f.path.to_lowercase()))
                .map(|f| export_line("index.ts", &f.path)),
        );
    }

    indexes.push(IndexFile {
        path: "index.ts".to_string(),
        lines: root_lines,
    });
    indexes
}
