use std::collections::BTreeSet;

use super::types::NormalizedName;

/// A named component schema, shaped for TypeScript model emission.
#[derive(Debug, Clone)]
pub struct IrSchema {
    pub name: NormalizedName,
    pub description: Option<String>,
    pub kind: IrSchemaKind,
}

#[derive(Debug, Clone)]
pub enum IrSchemaKind {
    /// Rendered as an `interface`.
    Object {
        fields: Vec<IrField>,
        /// Index signature value from `additionalProperties`.
        extra: Option<IrType>,
    },
    /// Literal union. Values keep their JSON form so numeric enums survive.
    Enum {
        values: Vec<serde_json::Value>,
        nullable: bool,
    },
    Union {
        variants: Vec<IrType>,
        discriminator: Option<IrDiscriminator>,
    },
    Alias(IrType),
}

impl IrSchemaKind {
    pub fn label(&self) -> &'static str {
        match self {
            IrSchemaKind::Object { .. } => "object",
            IrSchemaKind::Enum { .. } => "enum",
            IrSchemaKind::Union { .. } => "union",
            IrSchemaKind::Alias(_) => "alias",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IrField {
    /// Property name as it appears on the wire.
    pub name: String,
    pub ty: IrType,
    pub required: bool,
    pub read_only: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IrDiscriminator {
    pub property_name: String,
    /// Discriminator value to PascalCase schema name.
    pub mapping: Vec<(String, String)>,
}

/// A TypeScript type expression before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum IrType {
    String,
    StringLiteral(String),
    Number,
    Integer,
    Boolean,
    Null,
    DateTime,
    Binary,
    Array(Box<IrType>),
    /// Inline object literal: `(wire name, type, required)`.
    Object(Vec<(String, IrType, bool)>),
    /// `Record<string, T>`.
    Map(Box<IrType>),
    /// A component schema by its PascalCase name.
    Ref(String),
    Union(Vec<IrType>),
    Intersection(Vec<IrType>),
    Any,
    Void,
}

impl IrType {
    /// Insert every component schema this type mentions into `out`.
    pub fn collect_refs(&self, out: &mut BTreeSet<String>) {
        match self {
            IrType::Ref(name) => {
                out.insert(name.clone());
            }
            IrType::Array(inner) | IrType::Map(inner) => inner.collect_refs(out),
            IrType::Union(members) | IrType::Intersection(members) => {
                members.iter().for_each(|m| m.collect_refs(out));
            }
            IrType::Object(fields) => fields.iter().for_each(|(_, ty, _)| ty.collect_refs(out)),
            _ => {}
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, IrType::Void)
    }
}

impl IrSchema {
    /// Component schemas the declaration body refers to.
    pub fn refs(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        match &self.kind {
            IrSchemaKind::Object { fields, extra } => {
                fields.iter().for_each(|f| f.ty.collect_refs(&mut out));
                if let Some(extra) = extra {
                    extra.collect_refs(&mut out);
                }
            }
            IrSchemaKind::Union { variants, .. } => {
                variants.iter().for_each(|v| v.collect_refs(&mut out));
            }
            IrSchemaKind::Alias(target) => target.collect_refs(&mut out),
            IrSchemaKind::Enum { .. } => {}
        }
        out
    }
}
