use indexmap::IndexMap;
use serde::Deserialize;

use super::operation::{Parameter, PathItem, RequestBody, Response};
use super::schema::SchemaOrRef;

/// Either a `$ref` into `#/components/...` or the object itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Referenced<T> {
    Ref {
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    Item(T),
}

impl<T> Referenced<T> {
    pub fn item(&self) -> Option<&T> {
        match self {
            Self::Item(item) => Some(item),
            Self::Ref { .. } => None,
        }
    }
}

pub type ParameterOrRef = Referenced<Parameter>;
pub type RequestBodyOrRef = Referenced<RequestBody>;
pub type ResponseOrRef = Referenced<Response>;

/// A parsed OpenAPI 3.x document. Only the parts code generation reads are kept;
/// servers, security and the tag catalogue are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenApiSpec {
    pub openapi: String,
    pub info: Info,
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    pub components: Option<Components>,
    /// Swagger-style top-level definitions, folded into the component schema arena.
    #[serde(default)]
    pub definitions: IndexMap<String, SchemaOrRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

/// Reusable definitions addressable by `$ref`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Components {
    pub schemas: IndexMap<String, SchemaOrRef>,
    pub parameters: IndexMap<String, ParameterOrRef>,
    pub request_bodies: IndexMap<String, RequestBodyOrRef>,
    pub responses: IndexMap<String, ResponseOrRef>,
}

impl Components {
    /// Drop everything the resolver has inlined or moved into the arena.
    pub fn clear(&mut self) {
        self.schemas.clear();
        self.parameters.clear();
        self.request_bodies.clear();
        self.responses.clear();
    }
}
