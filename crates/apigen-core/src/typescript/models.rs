use minijinja::{Environment, Value, context};

use super::type_mapper::{ir_type_to_ts, property_key};
use crate::emit::SchemaFileEntry;
use crate::error::GeneratorError;
use crate::generator::{GeneratorDependency, ModelContext, ModelEmitter};
use crate::ir::{IrSchema, IrSchemaKind};
use crate::parse::schema::SchemaOrRef;
use crate::transform::schema_or_ref_to_ir_schema;

/// Escape `*/` sequences that would prematurely close JSDoc comment blocks.
pub fn escape_jsdoc(value: String) -> String {
    value.replace("*/", "*\\/")
}

/// Emits interfaces and type aliases for component schemas.
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptModels;

impl TypeScriptModels {
    fn environment() -> Result<Environment<'static>, GeneratorError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.add_filter("escape_jsdoc", escape_jsdoc);
        env.add_template("model.ts.j2", include_str!("../../templates/model.ts.j2"))
            .map_err(|e| GeneratorError::Render(e.to_string()))?;
        Ok(env)
    }

    /// Render a single IR schema as a TypeScript declaration.
    pub fn render(schema: &IrSchema) -> Result<String, GeneratorError> {
        let env = Self::environment()?;
        let tmpl = env
            .get_template("model.ts.j2")
            .map_err(|e| GeneratorError::Render(e.to_string()))?;
        tmpl.render(schema_to_ctx(schema))
            .map(|s| s.trim_end().to_string())
            .map_err(|e| GeneratorError::Render(e.to_string()))
    }
}

impl ModelEmitter for TypeScriptModels {
    fn id(&self) -> &'static str {
        "typescript"
    }

    fn emit(
        &self,
        name: &str,
        schema: &SchemaOrRef,
        ctx: &ModelContext<'_>,
    ) -> Result<SchemaFileEntry, GeneratorError> {
        let ir = schema_or_ref_to_ir_schema(name, schema);
        let schema_name = ir.name.pascal_case.clone();
        let imports = ir
            .refs()
            .into_iter()
            .filter(|r| *r != schema_name)
            .collect();
        Ok(SchemaFileEntry {
            expression: Self::render(&ir)?,
            schema_name,
            path: ctx.path_for(name),
            consts: vec![],
            imports,
        })
    }

    fn dependencies(&self) -> Vec<GeneratorDependency> {
        vec![]
    }

    fn type_only_imports(&self) -> bool {
        true
    }
}

fn schema_to_ctx(schema: &IrSchema) -> Value {
    let name = schema.name.pascal_case.clone();
    let description = schema.description.clone();
    match &schema.kind {
        IrSchemaKind::Object { fields, extra } => {
            let fields: Vec<Value> = fields
                .iter()
                .map(|f| {
                    context! {
                        key => property_key(&f.name),
                        type => ir_type_to_ts(&f.ty),
                        required => f.required,
                        read_only => f.read_only,
                        description => f.description.clone(),
                    }
                })
                .collect();
            context! {
                kind => "object",
                name,
                description,
                fields,
                additional_properties => extra.as_ref().map(ir_type_to_ts),
            }
        }
        IrSchemaKind::Enum { values, nullable } => {
            let mut literals: Vec<String> = values
                .iter()
                .map(|v| match v {
                    serde_json::Value::String(s) => format!("'{}'", s.replace('\'', "\\'")),
                    other => other.to_string(),
                })
                .collect();
            if *nullable {
                literals.push("null".to_string());
            }
            context! { kind => "enum", name, description, target => literals.join(" | ") }
        }
        IrSchemaKind::Union { variants, .. } => {
            let members: Vec<String> = variants.iter().map(ir_type_to_ts).collect();
            context! { kind => "union", name, description, target => members.join(" | ") }
        }
        IrSchemaKind::Alias(target) => {
            context! { kind => "alias", name, description, target => ir_type_to_ts(target) }
        }
    }
}
