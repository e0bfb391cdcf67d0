//! Serde model of an OpenAPI 3.x document. Swagger 2.0 input is upgraded to that
//! shape before deserialization.

pub mod document;
pub mod operation;
pub mod schema;
pub mod swagger;

pub use document::OpenApiSpec;

use serde::Deserialize;

use crate::error::ParseError;

/// Just enough of a document to tell Swagger from OpenAPI.
#[derive(Deserialize)]
struct Dialect {
    swagger: Option<serde::de::IgnoredAny>,
}

pub fn from_yaml(input: &str) -> Result<OpenApiSpec, ParseError> {
    let dialect: Dialect = serde_yaml_ng::from_str(input)?;
    if dialect.swagger.is_some() {
        return from_value(serde_yaml_ng::from_str(input)?);
    }
    checked(serde_yaml_ng::from_str(input)?)
}

pub fn from_json(input: &str) -> Result<OpenApiSpec, ParseError> {
    from_value(serde_json::from_str(input)?)
}

/// For documents already loaded as JSON, e.g. after format sniffing.
pub fn from_value(mut value: serde_json::Value) -> Result<OpenApiSpec, ParseError> {
    if swagger::is_swagger(&value) {
        swagger::upgrade(&mut value)?;
    }
    checked(serde_json::from_value(value)?)
}

/// Only 3.0 and 3.1 documents are accepted once Swagger input has been upgraded.
fn checked(spec: OpenApiSpec) -> Result<OpenApiSpec, ParseError> {
    if spec.openapi.starts_with("3.") {
        Ok(spec)
    } else {
        Err(ParseError::UnsupportedVersion(spec.openapi))
    }
}
