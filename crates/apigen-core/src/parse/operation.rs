use indexmap::IndexMap;
use serde::Deserialize;

use super::document::{ParameterOrRef, RequestBodyOrRef, ResponseOrRef};
use super::schema::SchemaOrRef;

/// HTTP verbs in the order operations are visited within a path.
const VERBS: [&str; 8] = [
    "get", "post", "put", "delete", "patch", "options", "head", "trace",
];

/// Operations under one route, plus parameters shared by all of them.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PathItem {
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
    pub get: Option<Operation>,
    pub post: Option<Operation>,
    pub put: Option<Operation>,
    pub delete: Option<Operation>,
    pub patch: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub trace: Option<Operation>,
}

impl PathItem {
    fn slot(&self, verb: &str) -> Option<&Operation> {
        match verb {
            "get" => self.get.as_ref(),
            "post" => self.post.as_ref(),
            "put" => self.put.as_ref(),
            "delete" => self.delete.as_ref(),
            "patch" => self.patch.as_ref(),
            "options" => self.options.as_ref(),
            "head" => self.head.as_ref(),
            "trace" => self.trace.as_ref(),
            _ => None,
        }
    }

    /// Declared operations with their lowercase verb.
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        VERBS
            .into_iter()
            .filter_map(|verb| self.slot(verb).map(|op| (verb, op)))
            .collect()
    }

    pub fn operations_mut(&mut self) -> Vec<(&'static str, &mut Operation)> {
        let slots = [
            &mut self.get,
            &mut self.post,
            &mut self.put,
            &mut self.delete,
            &mut self.patch,
            &mut self.options,
            &mut self.head,
            &mut self.trace,
        ];
        VERBS
            .into_iter()
            .zip(slots)
            .filter_map(|(verb, op)| op.as_mut().map(|op| (verb, op)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
    pub request_body: Option<RequestBodyOrRef>,
    #[serde(default)]
    pub responses: IndexMap<String, ResponseOrRef>,
    #[serde(default)]
    pub deprecated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub deprecated: bool,
    pub schema: Option<SchemaOrRef>,
    pub explode: Option<bool>,
}

impl Parameter {
    /// Name and location identify a parameter; an operation-level entry with the same
    /// key replaces the path-level one.
    pub fn key(&self) -> (&str, ParameterLocation) {
        (&self.name, self.location)
    }

    /// Path parameters are always required, whatever the document says.
    pub fn is_required(&self) -> bool {
        self.required || self.location == ParameterLocation::Path
    }

    /// An explicit `explode: true` wins; otherwise the target-wide setting applies.
    pub fn explodes(&self, default: bool) -> bool {
        self.explode == Some(true) || default
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestBody {
    pub description: Option<String>,
    pub content: IndexMap<String, MediaType>,
    #[serde(default)]
    pub required: bool,
}

impl RequestBody {
    /// `application/json`, then any JSON flavour, then the first declared type.
    pub fn preferred_content(&self) -> Option<(&str, &MediaType)> {
        self.content
            .get_key_value("application/json")
            .or_else(|| self.content.iter().find(|(ct, _)| is_json(ct)))
            .or_else(|| self.content.first())
            .map(|(ct, media)| (ct.as_str(), media))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: IndexMap<String, MediaType>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MediaType {
    pub schema: Option<SchemaOrRef>,
}

/// `application/json`, `application/problem+json`, `text/json; charset=utf-8`.
pub fn is_json(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or(content_type).trim();
    essence.ends_with("+json") || essence.ends_with("/json")
}
