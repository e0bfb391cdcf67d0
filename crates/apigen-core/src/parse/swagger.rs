//! Upgrade of Swagger 2.0 documents to the OpenAPI 3.0 shape the rest of the crate reads.
//!
//! The rewrite happens on the raw JSON tree before typed deserialization:
//!
//! - `definitions`, `parameters` and `responses` move under `components`,
//! - `in: body` and `in: formData` parameters become request bodies,
//! - response `schema`s are wrapped in `content` keyed by the `produces` media types,
//! - `collectionFormat: multi` becomes `explode: true`,
//! - `x-nullable` becomes `nullable` and `type: file` becomes a binary string.

use std::collections::HashSet;

use serde_json::{Map, Value, json};

use crate::error::ParseError;

const DEFAULT_MEDIA_TYPE: &str = "application/json";
const VERBS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// Parameter keywords that describe the value and belong in a 3.0 `schema`.
const SCHEMA_KEYWORDS: &[&str] = &[
    "type",
    "format",
    "items",
    "enum",
    "default",
    "minimum",
    "maximum",
    "exclusiveMinimum",
    "exclusiveMaximum",
    "minLength",
    "maxLength",
    "pattern",
    "minItems",
    "maxItems",
    "uniqueItems",
    "multipleOf",
];

/// Whether `doc` declares itself a Swagger document.
pub fn is_swagger(doc: &Value) -> bool {
    doc.get("swagger").is_some()
}

/// Rewrite a Swagger 2.x document in place into OpenAPI 3.0 form.
pub fn upgrade(doc: &mut Value) -> Result<(), ParseError> {
    let Some(root) = doc.as_object_mut() else {
        return Ok(());
    };
    let version = match root.remove("swagger") {
        Some(Value::String(v)) => v,
        Some(other) => other.to_string(),
        None => return Ok(()),
    };
    if !version.starts_with("2.") {
        return Err(ParseError::UnsupportedVersion(version));
    }
    root.insert("openapi".to_string(), json!("3.0.3"));

    if let Some(Value::Object(info)) = root.get_mut("info")
        && let Some(Value::Number(n)) = info.get("version")
    {
        let text = n.to_string();
        info.insert("version".to_string(), Value::String(text));
    }

    let consumes = media_types(root.remove("consumes"));
    let produces = media_types(root.remove("produces"));

    let mut components = Map::new();
    if let Some(definitions) = root.remove("definitions") {
        components.insert("schemas".to_string(), definitions);
    }

    let mut body_params = HashSet::new();
    if let Some(Value::Object(params)) = root.remove("parameters") {
        let mut parameters = Map::new();
        let mut bodies = Map::new();
        for (name, param) in params {
            if location(&param) == Some("body") {
                bodies.insert(name.clone(), request_body(&param, &consumes));
                body_params.insert(name);
            } else {
                parameters.insert(name, parameter(param));
            }
        }
        components.insert("parameters".to_string(), Value::Object(parameters));
        components.insert("requestBodies".to_string(), Value::Object(bodies));
    }

    if let Some(Value::Object(responses)) = root.remove("responses") {
        let converted = responses
            .into_iter()
            .map(|(name, r)| (name, response(r, &produces)))
            .collect();
        components.insert("responses".to_string(), Value::Object(converted));
    }
    root.insert("components".to_string(), Value::Object(components));

    if let Some(Value::Object(paths)) = root.get_mut("paths") {
        for item in paths.values_mut() {
            if let Value::Object(item) = item {
                upgrade_path_item(item, &consumes, &produces, &body_params);
            }
        }
    }

    rewrite(doc);
    Ok(())
}

fn upgrade_path_item(
    item: &mut Map<String, Value>,
    consumes: &[String],
    produces: &[String],
    body_params: &HashSet<String>,
) {
    // Body and form parameters declared on the path apply to every operation.
    let shared = match item.remove("parameters") {
        Some(Value::Array(params)) => params,
        _ => Vec::new(),
    };
    let (request, plain): (Vec<Value>, Vec<Value>) = shared
        .into_iter()
        .partition(|p| is_request_param(p, body_params));
    if !plain.is_empty() {
        let plain = plain.into_iter().map(parameter).collect();
        item.insert("parameters".to_string(), Value::Array(plain));
    }

    for verb in VERBS {
        let Some(Value::Object(op)) = item.get_mut(*verb) else {
            continue;
        };
        let consumes = op
            .remove("consumes")
            .map(|v| media_types(Some(v)))
            .unwrap_or_else(|| consumes.to_vec());
        let produces = op
            .remove("produces")
            .map(|v| media_types(Some(v)))
            .unwrap_or_else(|| produces.to_vec());

        let mut params = request.clone();
        if let Some(Value::Array(own)) = op.remove("parameters") {
            params.extend(own);
        }
        upgrade_operation(op, params, &consumes, &produces, body_params);
    }
}

fn upgrade_operation(
    op: &mut Map<String, Value>,
    params: Vec<Value>,
    consumes: &[String],
    produces: &[String],
    body_params: &HashSet<String>,
) {
    let mut plain = Vec::new();
    let mut form = Vec::new();
    let mut body = None;
    for param in params {
        if let Some(name) = ref_name(&param, "#/parameters/")
            && body_params.contains(name)
        {
            body = Some(json!({ "$ref": format!("#/components/requestBodies/{name}") }));
            continue;
        }
        match location(&param) {
            Some("body") => body = Some(request_body(&param, consumes)),
            Some("formData") => form.push(param),
            _ => plain.push(parameter(param)),
        }
    }

    if body.is_none() && !form.is_empty() {
        body = Some(form_body(form, consumes));
    }
    if let Some(body) = body {
        op.insert("requestBody".to_string(), body);
    }
    if !plain.is_empty() {
        op.insert("parameters".to_string(), Value::Array(plain));
    }

    if let Some(Value::Object(responses)) = op.get_mut("responses") {
        for r in responses.values_mut() {
            *r = response(r.take(), produces);
        }
    }
}

fn media_types(value: Option<Value>) -> Vec<String> {
    let types: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
    if types.is_empty() {
        vec![DEFAULT_MEDIA_TYPE.to_string()]
    } else {
        types
    }
}

fn location(param: &Value) -> Option<&str> {
    param.get("in").and_then(Value::as_str)
}

fn ref_name<'a>(value: &'a Value, prefix: &str) -> Option<&'a str> {
    value.get("$ref")?.as_str()?.strip_prefix(prefix)
}

fn is_request_param(param: &Value, body_params: &HashSet<String>) -> bool {
    matches!(location(param), Some("body" | "formData"))
        || ref_name(param, "#/parameters/").is_some_and(|n| body_params.contains(n))
}

fn content(schema: Option<Value>, media_types: &[String]) -> Value {
    let entry = match schema {
        Some(schema) => json!({ "schema": schema }),
        None => json!({}),
    };
    Value::Object(
        media_types
            .iter()
            .map(|mt| (mt.clone(), entry.clone()))
            .collect(),
    )
}

fn request_body(param: &Value, consumes: &[String]) -> Value {
    let mut body = Map::new();
    if let Some(description) = param.get("description") {
        body.insert("description".to_string(), description.clone());
    }
    if let Some(required) = param.get("required") {
        body.insert("required".to_string(), required.clone());
    }
    body.insert(
        "content".to_string(),
        content(param.get("schema").cloned(), consumes),
    );
    Value::Object(body)
}

/// `formData` parameters collapse into one object schema.
fn form_body(params: Vec<Value>, consumes: &[String]) -> Value {
    let media_type = if consumes.iter().any(|mt| mt == "multipart/form-data") {
        "multipart/form-data"
    } else {
        "application/x-www-form-urlencoded"
    };
    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut any_required = false;
    for param in params {
        let Value::Object(mut param) = param else {
            continue;
        };
        let Some(Value::String(name)) = param.remove("name") else {
            continue;
        };
        if param.get("required").and_then(Value::as_bool) == Some(true) {
            required.push(Value::String(name.clone()));
            any_required = true;
        }
        let mut schema = take_schema(&mut param);
        if let Some(description) = param.remove("description") {
            schema.insert("description".to_string(), description);
        }
        properties.insert(name, Value::Object(schema));
    }

    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = Value::Array(required);
    }
    json!({
        "required": any_required,
        "content": content(Some(schema), &[media_type.to_string()]),
    })
}

fn take_schema(param: &mut Map<String, Value>) -> Map<String, Value> {
    SCHEMA_KEYWORDS
        .iter()
        .filter_map(|key| param.remove(*key).map(|v| (key.to_string(), v)))
        .collect()
}

fn parameter(param: Value) -> Value {
    let Value::Object(mut param) = param else {
        return param;
    };
    if param.contains_key("$ref") {
        return Value::Object(param);
    }
    let collection = param.remove("collectionFormat");
    let schema = take_schema(&mut param);
    if schema.get("type").and_then(Value::as_str) == Some("array") {
        let multi = collection.as_ref().and_then(Value::as_str) == Some("multi");
        param.insert("explode".to_string(), Value::Bool(multi));
    }
    param.remove("allowEmptyValue");
    param.insert("schema".to_string(), Value::Object(schema));
    Value::Object(param)
}

fn response(response: Value, produces: &[String]) -> Value {
    let Value::Object(mut response) = response else {
        return response;
    };
    if let Some(schema) = response.remove("schema") {
        response.insert("content".to_string(), content(Some(schema), produces));
    }
    response.remove("examples");
    Value::Object(response)
}

/// Point every `$ref` at its 3.0 location and translate Swagger-only schema keywords.
fn rewrite(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get_mut("$ref") {
                for (from, to) in [
                    ("#/definitions/", "#/components/schemas/"),
                    ("#/parameters/", "#/components/parameters/"),
                    ("#/responses/", "#/components/responses/"),
                ] {
                    if let Some(name) = target.strip_prefix(from) {
                        *target = format!("{to}{name}");
                        break;
                    }
                }
            }
            if let Some(nullable) = map.remove("x-nullable") {
                map.insert("nullable".to_string(), nullable);
            }
            if map.get("type").and_then(Value::as_str) == Some("file") {
                map.insert("type".to_string(), json!("string"));
                map.insert("format".to_string(), json!("binary"));
            }
            map.values_mut().for_each(rewrite);
        }
        Value::Array(items) => items.iter_mut().for_each(rewrite),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upgraded(doc: Value) -> Value {
        let mut doc = doc;
        upgrade(&mut doc).unwrap();
        doc
    }

    #[test]
    fn test_components_move_and_refs_follow() {
        let doc = upgraded(json!({
            "swagger": "2.0",
            "info": { "title": "Petstore", "version": 1.0 },
            "paths": {},
            "definitions": {
                "Pet": { "type": "object", "properties": { "owner": { "$ref": "#/definitions/Owner" } } },
                "Owner": { "type": "string", "x-nullable": true }
            }
        }));
        assert_eq!(doc["openapi"], "3.0.3");
        assert!(doc.get("swagger").is_none());
        assert_eq!(doc["info"]["version"], "1.0");
        let schemas = &doc["components"]["schemas"];
        assert_eq!(
            schemas["Pet"]["properties"]["owner"]["$ref"],
            "#/components/schemas/Owner"
        );
        assert_eq!(schemas["Owner"]["nullable"], true);
    }

    #[test]
    fn test_body_and_query_parameters() {
        let doc = upgraded(json!({
            "swagger": "2.0",
            "info": { "title": "Petstore", "version": "1.0.0" },
            "consumes": ["application/json"],
            "produces": ["application/json"],
            "paths": {
                "/pets": {
                    "post": {
                        "parameters": [
                            { "name": "pet", "in": "body", "required": true, "schema": { "$ref": "#/definitions/Pet" } },
                            { "name": "tags", "in": "query", "type": "array", "items": { "type": "string" }, "collectionFormat": "multi" },
                            { "name": "ids", "in": "query", "type": "array", "items": { "type": "integer" } }
                        ],
                        "responses": {
                            "200": { "description": "ok", "schema": { "$ref": "#/definitions/Pet" } },
                            "404": { "description": "missing" }
                        }
                    }
                }
            },
            "definitions": { "Pet": { "type": "object" } }
        }));
        let op = &doc["paths"]["/pets"]["post"];
        assert_eq!(op["requestBody"]["required"], true);
        assert_eq!(
            op["requestBody"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/Pet"
        );
        let params = op["parameters"].as_array().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0]["explode"], true);
        assert_eq!(params[0]["schema"]["items"]["type"], "string");
        assert_eq!(params[1]["explode"], false);
        assert_eq!(
            op["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/Pet"
        );
        assert!(op["responses"]["404"].get("content").is_none());
    }

    #[test]
    fn test_form_data_collapses_into_one_body() {
        let doc = upgraded(json!({
            "swagger": "2.0",
            "info": { "title": "Uploads", "version": "1.0.0" },
            "paths": {
                "/upload": {
                    "post": {
                        "consumes": ["multipart/form-data"],
                        "parameters": [
                            { "name": "file", "in": "formData", "type": "file", "required": true },
                            { "name": "note", "in": "formData", "type": "string" }
                        ],
                        "responses": { "204": { "description": "stored" } }
                    }
                }
            }
        }));
        let schema = &doc["paths"]["/upload"]["post"]["requestBody"]["content"]["multipart/form-data"]["schema"];
        assert_eq!(schema["properties"]["file"]["format"], "binary");
        assert_eq!(schema["properties"]["note"]["type"], "string");
        assert_eq!(schema["required"], json!(["file"]));
    }

    #[test]
    fn test_shared_body_parameter_becomes_request_body_ref() {
        let doc = upgraded(json!({
            "swagger": "2.0",
            "info": { "title": "Petstore", "version": "1.0.0" },
            "parameters": {
                "PetBody": { "name": "pet", "in": "body", "schema": { "type": "object" } },
                "Limit": { "name": "limit", "in": "query", "type": "integer" }
            },
            "paths": {
                "/pets": {
                    "put": {
                        "parameters": [
                            { "$ref": "#/parameters/PetBody" },
                            { "$ref": "#/parameters/Limit" }
                        ],
                        "responses": { "200": { "description": "ok" } }
                    }
                }
            }
        }));
        let op = &doc["paths"]["/pets"]["put"];
        assert_eq!(op["requestBody"]["$ref"], "#/components/requestBodies/PetBody");
        assert_eq!(op["parameters"][0]["$ref"], "#/components/parameters/Limit");
        assert_eq!(doc["components"]["parameters"]["Limit"]["schema"]["type"], "integer");
    }

    #[test]
    fn test_other_versions_rejected() {
        let mut doc = json!({ "swagger": "1.2", "info": { "title": "Old", "version": "1" } });
        assert!(matches!(
            upgrade(&mut doc),
            Err(ParseError::UnsupportedVersion(v)) if v == "1.2"
        ));
    }
}
