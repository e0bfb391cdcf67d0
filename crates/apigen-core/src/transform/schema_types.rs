use indexmap::IndexMap;

use crate::ir::{IrDiscriminator, IrField, IrSchema, IrSchemaKind, IrType};
use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef, SchemaType, TypeSet};
use crate::resolve::schema_ref_name;

use super::name_normalizer::normalize_name;

/// PascalCase type name for a schema reference.
pub fn ref_type_name(ref_path: &str) -> String {
    let name = schema_ref_name(ref_path)
        .unwrap_or_else(|| ref_path.rsplit('/').next().unwrap_or("Unknown").to_string());
    normalize_name(&name).pascal_case
}

/// Convert a parsed `SchemaOrRef` to an `IrType`.
pub fn schema_or_ref_to_ir_type(schema_or_ref: &SchemaOrRef) -> IrType {
    match schema_or_ref {
        SchemaOrRef::Ref { ref_path } => IrType::Ref(ref_type_name(ref_path)),
        SchemaOrRef::Schema(schema) => schema_to_ir_type(schema),
    }
}

/// Convert a parsed `Schema` to an `IrType`, honouring `nullable`.
pub fn schema_to_ir_type(schema: &Schema) -> IrType {
    let base = base_ir_type(schema);
    if schema.nullable == Some(true) {
        with_null(base)
    } else {
        base
    }
}

fn with_null(ty: IrType) -> IrType {
    match ty {
        IrType::Null | IrType::Any => ty,
        IrType::Union(mut variants) => {
            if !variants.contains(&IrType::Null) {
                variants.push(IrType::Null);
            }
            IrType::Union(variants)
        }
        other => IrType::Union(vec![other, IrType::Null]),
    }
}

fn base_ir_type(schema: &Schema) -> IrType {
    if !schema.one_of.is_empty() {
        return IrType::Union(schema.one_of.iter().map(schema_or_ref_to_ir_type).collect());
    }
    if !schema.any_of.is_empty() {
        return IrType::Union(schema.any_of.iter().map(schema_or_ref_to_ir_type).collect());
    }
    if !schema.all_of.is_empty() {
        return all_of_type(schema);
    }

    if !schema.enum_values.is_empty() {
        return enum_type(schema);
    }

    if let Some(val) = &schema.const_value {
        return match val {
            serde_json::Value::String(s) => IrType::StringLiteral(s.clone()),
            serde_json::Value::Bool(_) => IrType::Boolean,
            serde_json::Value::Number(_) => IrType::Number,
            serde_json::Value::Null => IrType::Null,
            _ => IrType::Any,
        };
    }

    match &schema.schema_type {
        Some(TypeSet::Single(t)) => single_type(schema, t),
        Some(TypeSet::Multiple(types)) => {
            let non_null: Vec<&SchemaType> =
                types.iter().filter(|t| **t != SchemaType::Null).collect();
            let has_null = types.contains(&SchemaType::Null);
            let mut variants: Vec<IrType> =
                non_null.iter().map(|t| single_type(schema, t)).collect();
            if has_null {
                variants.push(IrType::Null);
            }
            match variants.len() {
                0 => IrType::Any,
                1 => variants.remove(0),
                _ => IrType::Union(variants),
            }
        }
        None => {
            if !schema.properties.is_empty() || schema.additional_properties.is_some() {
                object_type(schema)
            } else if let Some(items) = &schema.items {
                IrType::Array(Box::new(schema_or_ref_to_ir_type(items)))
            } else {
                IrType::Any
            }
        }
    }
}

fn single_type(schema: &Schema, t: &SchemaType) -> IrType {
    match t {
        SchemaType::String => match schema.format.as_deref() {
            Some("date-time" | "date") => IrType::DateTime,
            Some("binary") => IrType::Binary,
            _ => IrType::String,
        },
        SchemaType::Number => IrType::Number,
        SchemaType::Integer => IrType::Integer,
        SchemaType::Boolean => IrType::Boolean,
        SchemaType::Null => IrType::Null,
        SchemaType::Array => match &schema.items {
            Some(items) => IrType::Array(Box::new(schema_or_ref_to_ir_type(items))),
            None => IrType::Array(Box::new(IrType::Any)),
        },
        SchemaType::Object => object_type(schema),
    }
}

fn enum_type(schema: &Schema) -> IrType {
    let mut variants: Vec<IrType> = Vec::new();
    for value in &schema.enum_values {
        let ty = match value {
            serde_json::Value::String(s) => IrType::StringLiteral(s.clone()),
            serde_json::Value::Null => IrType::Null,
            serde_json::Value::Bool(_) => IrType::Boolean,
            serde_json::Value::Number(_) => IrType::Number,
            _ => IrType::Any,
        };
        if !variants.contains(&ty) {
            variants.push(ty);
        }
    }
    match variants.len() {
        1 => variants.remove(0),
        _ => IrType::Union(variants),
    }
}

fn object_type(schema: &Schema) -> IrType {
    if schema.properties.is_empty() {
        return match &schema.additional_properties {
            Some(AdditionalProperties::Schema(s)) => {
                IrType::Map(Box::new(schema_or_ref_to_ir_type(s)))
            }
            Some(AdditionalProperties::Bool(true)) => IrType::Map(Box::new(IrType::Any)),
            Some(AdditionalProperties::Bool(false)) | None => IrType::Object(vec![]),
        };
    }
    IrType::Object(inline_fields(build_fields(&schema.properties, &schema.required)))
}

fn all_of_type(schema: &Schema) -> IrType {
    if schema.all_of.len() == 1 && schema.properties.is_empty() {
        return schema_or_ref_to_ir_type(&schema.all_of[0]);
    }
    let has_refs = schema
        .all_of
        .iter()
        .any(|s| matches!(s, SchemaOrRef::Ref { .. }));
    if !has_refs {
        let merged = merge_all_of(&schema.all_of, &schema.properties, &schema.required);
        return IrType::Object(inline_fields(merged));
    }

    let mut parts: Vec<IrType> = schema
        .all_of
        .iter()
        .map(|sub| match sub {
            SchemaOrRef::Ref { .. } => schema_or_ref_to_ir_type(sub),
            SchemaOrRef::Schema(s) if s.properties.is_empty() => schema_to_ir_type(s),
            SchemaOrRef::Schema(s) => {
                IrType::Object(inline_fields(build_fields(&s.properties, &s.required)))
            }
        })
        .collect();
    if !schema.properties.is_empty() {
        parts.push(IrType::Object(inline_fields(build_fields(
            &schema.properties,
            &schema.required,
        ))));
    }
    IrType::Intersection(parts)
}

fn inline_fields(fields: Vec<IrField>) -> Vec<(String, IrType, bool)> {
    fields
        .into_iter()
        .map(|f| (f.name, f.ty, f.required))
        .collect()
}

/// Convert a named arena schema to an `IrSchema`.
pub fn schema_or_ref_to_ir_schema(name: &str, schema_or_ref: &SchemaOrRef) -> IrSchema {
    match schema_or_ref {
        SchemaOrRef::Ref { .. } => IrSchema {
            name: normalize_name(name),
            description: None,
            kind: IrSchemaKind::Alias(schema_or_ref_to_ir_type(schema_or_ref)),
        },
        SchemaOrRef::Schema(schema) => schema_to_ir_schema(name, schema),
    }
}

/// Convert a named `Schema` to an `IrSchema`.
pub fn schema_to_ir_schema(name: &str, schema: &Schema) -> IrSchema {
    IrSchema {
        name: normalize_name(name),
        description: schema.description.clone(),
        kind: schema_kind(schema),
    }
}

fn schema_kind(schema: &Schema) -> IrSchemaKind {
    if !schema.enum_values.is_empty() && schema.schema_type.as_ref().is_none_or(is_scalar) {
        return IrSchemaKind::Enum {
            values: schema
                .enum_values
                .iter()
                .filter(|v| !v.is_null())
                .cloned()
                .collect(),
            nullable: schema.is_nullable() || schema.enum_values.iter().any(|v| v.is_null()),
        };
    }

    let members = if schema.one_of.is_empty() {
        &schema.any_of
    } else {
        &schema.one_of
    };
    if !members.is_empty() {
        let mut variants: Vec<IrType> = members.iter().map(schema_or_ref_to_ir_type).collect();
        if schema.is_nullable() && !variants.contains(&IrType::Null) {
            variants.push(IrType::Null);
        }
        let discriminator = schema.discriminator.as_ref().map(|d| IrDiscriminator {
            property_name: d.property_name.clone(),
            mapping: d
                .mapping
                .iter()
                .map(|(value, target)| (value.clone(), ref_type_name(target)))
                .collect(),
        });
        return IrSchemaKind::Union {
            variants,
            discriminator,
        };
    }

    let interface_like = matches!(
        &schema.schema_type,
        Some(TypeSet::Single(SchemaType::Object)) | None
    ) && !schema.nullable.unwrap_or(false);

    // Inline-only `allOf` flattens into one interface.
    if interface_like
        && !schema.all_of.is_empty()
        && schema.all_of.iter().all(|s| s.as_schema().is_some())
    {
        return IrSchemaKind::Object {
            fields: merge_all_of(&schema.all_of, &schema.properties, &schema.required),
            extra: None,
        };
    }

    if interface_like && schema.all_of.is_empty() && !schema.properties.is_empty() {
        let extra = match &schema.additional_properties {
            Some(AdditionalProperties::Schema(s)) => Some(schema_or_ref_to_ir_type(s)),
            Some(AdditionalProperties::Bool(true)) => Some(IrType::Any),
            Some(AdditionalProperties::Bool(false)) | None => None,
        };
        return IrSchemaKind::Object {
            fields: build_fields(&schema.properties, &schema.required),
            extra,
        };
    }

    IrSchemaKind::Alias(schema_to_ir_type(schema))
}

fn is_scalar(types: &TypeSet) -> bool {
    let scalar = |t: &SchemaType| !matches!(t, SchemaType::Array | SchemaType::Object);
    match types {
        TypeSet::Single(t) => scalar(t),
        TypeSet::Multiple(ts) => ts.iter().all(scalar),
    }
}

fn build_fields(properties: &IndexMap<String, SchemaOrRef>, required: &[String]) -> Vec<IrField> {
    properties
        .iter()
        .map(|(name, prop)| {
            let inline = prop.as_schema();
            IrField {
                name: name.clone(),
                ty: schema_or_ref_to_ir_type(prop),
                required: required.contains(name),
                read_only: inline.and_then(|s| s.read_only).unwrap_or(false),
                description: inline.and_then(|s| s.description.clone()),
            }
        })
        .collect()
}

/// Flatten inline `allOf` members and the parent's own properties into one field list.
/// A field declared more than once keeps its first position and its last definition.
fn merge_all_of(
    all_of: &[SchemaOrRef],
    extra_properties: &IndexMap<String, SchemaOrRef>,
    extra_required: &[String],
) -> Vec<IrField> {
    let mut fields: IndexMap<String, IrField> = IndexMap::new();
    let mut push = |batch: Vec<IrField>| {
        for field in batch {
            fields.insert(field.name.clone(), field);
        }
    };

    for item in all_of {
        if let SchemaOrRef::Schema(schema) = item {
            push(build_fields(&schema.properties, &schema.required));
            if !schema.all_of.is_empty() {
                push(merge_all_of(&schema.all_of, &IndexMap::new(), &[]));
            }
        }
    }
    push(build_fields(extra_properties, extra_required));

    fields.into_values().collect()
}
