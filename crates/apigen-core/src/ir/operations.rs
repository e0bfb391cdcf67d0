use std::collections::BTreeSet;

use crate::config::MutatorConfig;
use crate::parse::schema::SchemaOrRef;

use super::schemas::IrType;
use super::types::NormalizedName;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }

    pub fn as_lower(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Trace => "trace",
        }
    }

    pub fn from_verb(verb: &str) -> Option<Self> {
        match verb.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            "options" => Some(HttpMethod::Options),
            "head" => Some(HttpMethod::Head),
            "trace" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    /// Verbs whose body is only modeled when the operation declares one.
    pub fn is_bodyless(&self) -> bool {
        matches!(
            self,
            HttpMethod::Get
                | HttpMethod::Head
                | HttpMethod::Options
                | HttpMethod::Trace
                | HttpMethod::Delete
        )
    }
}

/// A normalized API operation, ready for any backend.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub name: NormalizedName,
    pub operation_id: Option<String>,
    pub method: HttpMethod,
    pub route: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub deprecated: bool,
    /// Signature arguments in call order.
    pub props: Vec<Prop>,
    pub path_params: Vec<ParamRecord>,
    pub query_params: Vec<ParamRecord>,
    pub headers: Vec<ParamRecord>,
    pub body: Option<RequestBodyRecord>,
    pub response: ResponseRecord,
    pub mutator: Option<MutatorConfig>,
    /// `VERB /path`, used in diagnostics.
    pub location: String,
}

impl OperationRecord {
    /// Every schema the operation touches: parameters, request body and responses.
    pub fn schema_roots(&self) -> Vec<&SchemaOrRef> {
        let params = self
            .path_params
            .iter()
            .chain(&self.query_params)
            .chain(&self.headers)
            .filter_map(|p| p.schema.as_ref());
        let body = self.body.iter().filter_map(|b| b.schema.as_ref());
        let responses = self
            .response
            .variants()
            .filter_map(|v| v.schema.as_ref());
        params.chain(body).chain(responses).collect()
    }

    /// Named model types mentioned anywhere in the operation's signature or responses.
    pub fn model_refs(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for p in self
            .path_params
            .iter()
            .chain(&self.query_params)
            .chain(&self.headers)
        {
            p.ty.collect_refs(&mut out);
        }
        if let Some(body) = &self.body {
            body.ty.collect_refs(&mut out);
        }
        for v in self.response.variants() {
            v.ty.collect_refs(&mut out);
        }
        out
    }

    pub fn prop(&self, kind: PropKind) -> Option<&Prop> {
        self.props.iter().find(|p| p.kind == kind)
    }
}

/// What a signature argument carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    PathParam,
    Body,
    Params,
    Headers,
}

/// One argument of the generated function signature.
#[derive(Debug, Clone)]
pub struct Prop {
    pub name: String,
    pub kind: PropKind,
    pub ty: IrType,
    pub required: bool,
}

/// A path, query or header parameter.
#[derive(Debug, Clone)]
pub struct ParamRecord {
    pub name: NormalizedName,
    pub original_name: String,
    pub ty: IrType,
    pub schema: Option<SchemaOrRef>,
    pub required: bool,
    pub description: Option<String>,
    pub deprecated: bool,
    /// Array values are written as repeated `key=value` pairs.
    pub explode: bool,
}

/// How the request body is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySerialization {
    Json,
    FormData,
    UrlEncoded,
    Text,
    Binary,
}

impl BodySerialization {
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "multipart/form-data" => BodySerialization::FormData,
            "application/x-www-form-urlencoded" => BodySerialization::UrlEncoded,
            "text/plain" => BodySerialization::Text,
            "application/octet-stream" => BodySerialization::Binary,
            _ => BodySerialization::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequestBodyRecord {
    pub ty: IrType,
    pub schema: Option<SchemaOrRef>,
    pub required: bool,
    pub content_type: String,
    pub serialization: BodySerialization,
    pub description: Option<String>,
}

/// Response variants split by status family.
#[derive(Debug, Clone, Default)]
pub struct ResponseRecord {
    pub success: Vec<ResponseVariant>,
    pub errors: Vec<ResponseVariant>,
}

impl ResponseRecord {
    pub fn variants(&self) -> impl Iterator<Item = &ResponseVariant> {
        self.success.iter().chain(&self.errors)
    }

    /// Union of the distinct success types, or `void` when none carries content.
    pub fn success_type(&self) -> IrType {
        let mut types: Vec<IrType> = Vec::new();
        for v in &self.success {
            if !v.ty.is_void() && !types.contains(&v.ty) {
                types.push(v.ty.clone());
            }
        }
        match types.len() {
            0 => IrType::Void,
            1 => types.remove(0),
            _ => IrType::Union(types),
        }
    }

    /// Content type of the first success variant that has one.
    pub fn success_content_type(&self) -> Option<&str> {
        self.success
            .iter()
            .map(|v| v.content_type.as_str())
            .find(|ct| !ct.is_empty())
    }
}

/// One (status, content type) response.
#[derive(Debug, Clone)]
pub struct ResponseVariant {
    /// `200`, `2XX`, `default`, ...
    pub status_key: String,
    /// Empty when the response declares no content.
    pub content_type: String,
    pub ty: IrType,
    /// Unique per operation, e.g. `ListPets200` or `GetFile200ApplicationPdf`.
    pub type_name: String,
    pub schema: Option<SchemaOrRef>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_from_content_type() {
        assert_eq!(
            BodySerialization::from_content_type("multipart/form-data; boundary=x"),
            BodySerialization::FormData
        );
        assert_eq!(
            BodySerialization::from_content_type("application/x-www-form-urlencoded"),
            BodySerialization::UrlEncoded
        );
        assert_eq!(
            BodySerialization::from_content_type("text/plain"),
            BodySerialization::Text
        );
        assert_eq!(
            BodySerialization::from_content_type("application/octet-stream"),
            BodySerialization::Binary
        );
        assert_eq!(
            BodySerialization::from_content_type("application/vnd.api+json"),
            BodySerialization::Json
        );
    }

    #[test]
    fn test_success_type_dedupes_and_skips_void() {
        let variant = |ty: IrType| ResponseVariant {
            status_key: "200".to_string(),
            content_type: "application/json".to_string(),
            ty,
            type_name: String::new(),
            schema: None,
            description: None,
        };
        let record = ResponseRecord {
            success: vec![
                variant(IrType::Ref("Pet".to_string())),
                variant(IrType::Ref("Pet".to_string())),
                variant(IrType::Void),
            ],
            errors: vec![],
        };
        assert_eq!(record.success_type(), IrType::Ref("Pet".to_string()));
        assert_eq!(ResponseRecord::default().success_type(), IrType::Void);
    }

    #[test]
    fn test_method_round_trip_and_body_rules() {
        assert_eq!(HttpMethod::from_verb("PATCH"), Some(HttpMethod::Patch));
        assert!(HttpMethod::Delete.is_bodyless());
        assert!(!HttpMethod::Post.is_bodyless());
    }
}
