use std::collections::BTreeSet;

use apigen_core::config::{ModelKind, ZodConfig};
use apigen_core::error::GeneratorError;
use apigen_core::generator::{
    Backend, ClientContext, ClientOutput, DependencyOptions, DeferredRegistry,
    GeneratorDependency, GeneratorImport, UnitContext,
};
use apigen_core::ir::{OperationRecord, ParamRecord};
use apigen_core::parse::schema::SchemaOrRef;
use apigen_core::resolve::SchemaArena;
use apigen_core::transform::name_normalizer::normalize_name;
use log::debug;

use crate::ast::ZodValidator;
use crate::generate::{RefStyle, Site, ZodGenerator, ZodOptions};
use crate::render::render_declaration;

/// `import { z as zod } from 'zod';`
pub fn zod_dependency() -> GeneratorDependency {
    GeneratorDependency::new("zod", vec![GeneratorImport::aliased("z", "zod")])
}

/// Per-operation validation schemas: path params, query params, headers, body and
/// success responses.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZodBackend;

impl Backend for ZodBackend {
    fn id(&self) -> &'static str {
        "zod"
    }

    fn title(&self, raw: &str) -> String {
        normalize_name(raw).pascal_case
    }

    fn header(&self, _unit: &UnitContext<'_>) -> Result<String, GeneratorError> {
        Ok(String::new())
    }

    fn footer(
        &self,
        _unit: &UnitContext<'_>,
        _deferred: &DeferredRegistry,
    ) -> Result<String, GeneratorError> {
        Ok(String::new())
    }

    fn dependencies(&self, _options: &DependencyOptions) -> Vec<GeneratorDependency> {
        vec![zod_dependency()]
    }

    fn client(
        &self,
        record: &OperationRecord,
        ctx: &mut ClientContext<'_>,
    ) -> Result<ClientOutput, GeneratorError> {
        let name = record.name.camel_case.as_str();
        let refs = match ctx.config.models {
            ModelKind::Zod => RefStyle::Named {
                current: None,
                shared_file: false,
            },
            ModelKind::Typescript => RefStyle::Inline,
        };
        let mut decls = Declarations {
            arena: ctx.arena,
            config: &ctx.config.zod,
            refs,
            sections: Vec::new(),
            imports: BTreeSet::new(),
        };

        if !record.path_params.is_empty() {
            let fields = fields(&record.path_params);
            decls.add(Site::Param, format!("{name}Params"), |g, n| g.object_of(&fields, n))?;
        }
        if !record.query_params.is_empty() {
            let fields = fields(&record.query_params);
            decls.add(Site::Query, format!("{name}QueryParams"), |g, n| {
                g.object_of(&fields, n)
            })?;
        }
        if !record.headers.is_empty() {
            let fields = fields(&record.headers);
            decls.add(Site::Header, format!("{name}Header"), |g, n| g.object_of(&fields, n))?;
        }
        if let Some(body) = &record.body
            && let Some(schema) = &body.schema
        {
            decls.add(Site::Body, format!("{name}Body"), |g, n| g.generate(schema, n, true))?;
        }

        let responses: Vec<_> = record
            .response
            .success
            .iter()
            .filter_map(|v| v.schema.as_ref().map(|s| (v, s)))
            .collect();
        for (variant, schema) in &responses {
            let const_name = if responses.len() == 1 {
                format!("{name}Response")
            } else {
                let suffix = variant
                    .type_name
                    .strip_prefix(record.name.pascal_case.as_str())
                    .unwrap_or(&variant.type_name);
                format!("{name}Response{suffix}")
            };
            decls.add(Site::Response, const_name, |g, n| g.generate(schema, n, true))?;
        }

        debug!("{name}: {} zod schemas", decls.sections.len());
        Ok(ClientOutput {
            implementation: decls.sections.join("\n\n"),
            imports: decls.imports.into_iter().collect(),
        })
    }
}

struct Declarations<'a> {
    arena: &'a SchemaArena,
    config: &'a ZodConfig,
    refs: RefStyle,
    sections: Vec<String>,
    imports: BTreeSet<String>,
}

impl<'a> Declarations<'a> {
    fn add(
        &mut self,
        site: Site,
        name: String,
        build: impl FnOnce(&mut ZodGenerator<'a>, &str) -> Result<ZodValidator, GeneratorError>,
    ) -> Result<(), GeneratorError> {
        let options = ZodOptions::for_site(self.config, site);
        let mut generator = ZodGenerator::new(self.arena, options, self.refs.clone());
        let validator = build(&mut generator, &name)?;
        self.imports.extend(generator.imports().iter().cloned());
        self.sections.push(render_declaration(&name, &validator));
        Ok(())
    }
}

fn fields(params: &[ParamRecord]) -> Vec<(String, Option<&SchemaOrRef>, bool)> {
    params
        .iter()
        .map(|p| (p.original_name.clone(), p.schema.as_ref(), p.required))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use apigen_core::config::TargetConfig;
    use apigen_core::parse;
    use apigen_core::resolve::resolve_spec;
    use apigen_core::transform::build_operations;

    const SPEC: &str = r#"
openapi: 3.0.3
info: { title: Petstore, version: 1.0.0 }
paths:
  /pets/{petId}:
    put:
      operationId: updatePet
      parameters:
        - { name: petId, in: path, required: true, schema: { type: integer, minimum: 1 } }
        - { name: dryRun, in: query, schema: { type: boolean } }
      requestBody:
        required: true
        content:
          application/json:
            schema: { $ref: '#/components/schemas/Pet' }
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema: { $ref: '#/components/schemas/Pet' }
        '404': { description: missing }
components:
  schemas:
    Pet:
      type: object
      required: [name]
      properties:
        name: { type: string }
"#;

    fn render(config: &TargetConfig) -> ClientOutput {
        let resolved = resolve_spec(&parse::from_yaml(SPEC).unwrap()).unwrap();
        let record = build_operations(&resolved, config).unwrap().remove(0);
        let mut deferred = DeferredRegistry::new();
        let mut ctx = ClientContext {
            unit: "petstore",
            config,
            arena: &resolved.arena,
            deferred: &mut deferred,
        };
        ZodBackend.client(&record, &mut ctx).unwrap()
    }

    #[test]
    fn test_operation_schemas_inline_refs() {
        let config = TargetConfig {
            client: "zod".to_string(),
            ..TargetConfig::default()
        };
        let output = render(&config);
        assert!(output.imports.is_empty());
        insta::assert_snapshot!(output.implementation, @r"
        export const updatePetParamsPetIdMin = 1;

        export const updatePetParams = zod.object({
          petId: zod.number().min(updatePetParamsPetIdMin),
        });

        export const updatePetQueryParams = zod.object({
          dryRun: zod.boolean().optional(),
        });

        export const updatePetBody = zod.object({
          name: zod.string(),
        });

        export const updatePetResponse = zod.object({
          name: zod.string(),
        });
        ");
    }

    #[test]
    fn test_zod_models_are_referenced() {
        let config = TargetConfig {
            client: "zod".to_string(),
            models: ModelKind::Zod,
            ..TargetConfig::default()
        };
        let output = render(&config);
        assert_eq!(output.imports, vec!["Pet"]);
        assert!(output.implementation.contains("export const updatePetBody = Pet;"));
        assert!(output.implementation.contains("export const updatePetResponse = Pet;"));
    }
}
