use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

/// `type: string` or, in 3.1 documents, `type: [string, "null"]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(SchemaType),
    Multiple(Vec<SchemaType>),
}

impl TypeSet {
    pub fn contains(&self, ty: &SchemaType) -> bool {
        match self {
            TypeSet::Single(t) => t == ty,
            TypeSet::Multiple(types) => types.contains(ty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SchemaOrRef {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Schema(Box<Schema>),
}

impl SchemaOrRef {
    pub fn inline(schema: Schema) -> Self {
        SchemaOrRef::Schema(Box::new(schema))
    }

    pub fn reference(name: &str) -> Self {
        SchemaOrRef::Ref {
            ref_path: format!("#/components/schemas/{name}"),
        }
    }

    /// The inline schema, or `None` for a reference.
    pub fn as_schema(&self) -> Option<&Schema> {
        match self {
            SchemaOrRef::Schema(schema) => Some(schema),
            SchemaOrRef::Ref { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    #[serde(default)]
    pub mapping: IndexMap<String, String>,
}

/// The JSON Schema keywords code generation reads. Other keywords (`title`, `example`,
/// `uniqueItems`, ...) are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: Option<TypeSet>,
    pub format: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "default")]
    pub default_value: Option<serde_json::Value>,
    /// OpenAPI 3.0 spelling; 3.1 documents put `null` in `type` instead.
    pub nullable: Option<bool>,
    pub read_only: Option<bool>,

    pub properties: IndexMap<String, SchemaOrRef>,
    pub required: Vec<String>,
    pub additional_properties: Option<AdditionalProperties>,
    pub pattern_properties: IndexMap<String, SchemaOrRef>,
    pub dependent_schemas: IndexMap<String, SchemaOrRef>,
    pub items: Option<Box<SchemaOrRef>>,

    pub all_of: Vec<SchemaOrRef>,
    pub one_of: Vec<SchemaOrRef>,
    pub any_of: Vec<SchemaOrRef>,
    pub not: Option<Box<SchemaOrRef>>,
    #[serde(rename = "if")]
    pub if_schema: Option<Box<SchemaOrRef>>,
    #[serde(rename = "then")]
    pub then_schema: Option<Box<SchemaOrRef>>,
    #[serde(rename = "else")]
    pub else_schema: Option<Box<SchemaOrRef>>,
    /// Local definitions, `$defs` in 2020-12 documents.
    #[serde(alias = "$defs")]
    pub definitions: IndexMap<String, SchemaOrRef>,
    pub discriminator: Option<Discriminator>,

    #[serde(rename = "enum")]
    pub enum_values: Vec<serde_json::Value>,
    #[serde(rename = "const")]
    pub const_value: Option<serde_json::Value>,

    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: Option<ExclusiveBound>,
    pub exclusive_maximum: Option<ExclusiveBound>,
    pub multiple_of: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub pattern: Option<String>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

impl Schema {
    pub fn is_nullable(&self) -> bool {
        self.nullable.unwrap_or(false)
            || self
                .schema_type
                .as_ref()
                .is_some_and(|t| t.contains(&SchemaType::Null))
    }

    pub fn is_array(&self) -> bool {
        self.schema_type
            .as_ref()
            .is_some_and(|t| t.contains(&SchemaType::Array))
            || (self.schema_type.is_none() && self.items.is_some())
    }
}

/// `additionalProperties` can be a boolean or a schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaOrRef>),
}

/// `exclusiveMinimum`/`exclusiveMaximum` are booleans in OpenAPI 3.0 and numbers in 3.1.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
    Flag(bool),
    Value(f64),
}
