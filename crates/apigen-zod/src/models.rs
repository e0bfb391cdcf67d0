use apigen_core::emit::SchemaFileEntry;
use apigen_core::error::GeneratorError;
use apigen_core::generator::{GeneratorDependency, ModelContext, ModelEmitter};
use apigen_core::parse::schema::SchemaOrRef;
use apigen_core::transform::name_normalizer::normalize_name;
use apigen_core::typescript::escape_jsdoc;
use log::debug;

use crate::backend::zod_dependency;
use crate::generate::{RefStyle, Site, ZodGenerator, ZodOptions};
use crate::render::render_expression;

/// Emits component schemas as exported Zod schemas with inferred types.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZodModels;

impl ModelEmitter for ZodModels {
    fn id(&self) -> &'static str {
        "zod"
    }

    fn emit(
        &self,
        name: &str,
        schema: &SchemaOrRef,
        ctx: &ModelContext<'_>,
    ) -> Result<SchemaFileEntry, GeneratorError> {
        let schema_name = normalize_name(name).pascal_case;
        let style = RefStyle::Named {
            current: Some(name.to_string()),
            shared_file: ctx.shared_file(),
        };
        let options = ZodOptions::for_site(&ctx.config.zod, Site::Model);
        let mut generator = ZodGenerator::new(ctx.arena, options, style);
        let mut validator = generator.generate(schema, &schema_name, true)?;

        // Recursive schemas cannot be inferred through their own initializer.
        let annotation = if generator.is_recursive() {
            debug!("model {schema_name} is recursive, typing it as unknown");
            ": zod.ZodType<unknown>"
        } else {
            ""
        };
        let mut expression = String::new();
        if let Some(description) = schema.as_schema().and_then(|s| s.description.as_deref()) {
            expression.push_str(&format!(
                "/** {} */\n",
                escape_jsdoc(description.replace('\n', " "))
            ));
        }
        expression.push_str(&format!(
            "export const {schema_name}{annotation} = {};\nexport type {schema_name} = zod.infer<typeof {schema_name}>;",
            render_expression(&validator)
        ));

        Ok(SchemaFileEntry {
            imports: generator
                .imports()
                .iter()
                .filter(|i| **i != schema_name)
                .cloned()
                .collect(),
            consts: std::mem::take(&mut validator.consts),
            expression,
            path: ctx.path_for(name),
            schema_name,
        })
    }

    fn dependencies(&self) -> Vec<GeneratorDependency> {
        vec![zod_dependency()]
    }

    fn type_only_imports(&self) -> bool {
        false
    }
}
