use apigen_core::config::TargetConfig;
use apigen_core::ir::{BodySerialization, OperationRecord, ParamRecord, PropKind};
use apigen_core::transform::name_normalizer::normalize_name;
use apigen_core::typescript::{escape_jsdoc, ir_type_to_ts, property_key};
use serde::Serialize;

/// Template-facing view of one operation, shared by the fetch and axios emitters.
#[derive(Debug, Clone, Serialize)]
pub struct OperationView {
    pub name: String,
    pub pascal: String,
    pub method: &'static str,
    pub jsdoc: Option<String>,
    /// Signature arguments without the trailing `options` argument.
    pub args: Vec<String>,
    /// Route as a template literal, base URL included.
    pub url: String,
    pub url_with_query: String,
    pub path_args: Vec<String>,
    pub path_names: Vec<String>,
    pub params: Option<ArgView>,
    pub headers: Option<ArgView>,
    pub body: Option<BodyView>,
    /// Quoted names of the query parameters written as repeated pairs.
    pub explode_list: Option<String>,
    pub params_serializer: Option<String>,
    pub mutator: Option<String>,
    pub success_type: String,
    /// `XParams` / `XHeaders` type declarations.
    pub declarations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArgView {
    pub type_name: String,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BodyView {
    pub content_type: String,
    pub serialization: &'static str,
    pub required: bool,
    /// Statements that build the payload before the request.
    pub prelude: Option<&'static str>,
    /// Expression sent as the payload.
    pub expr: &'static str,
}

const FORM_DATA_PRELUDE: &str = "  const formData = new FormData();
  Object.entries(body ?? {}).forEach(([key, value]) => {
    if (value !== undefined) {
      formData.append(key, value instanceof Blob ? value : String(value));
    }
  });";

const URL_ENCODED_PRELUDE: &str = "  const formUrlEncoded = new URLSearchParams();
  Object.entries(body ?? {}).forEach(([key, value]) => {
    if (value !== undefined) {
      formUrlEncoded.append(key, String(value));
    }
  });";

impl OperationView {
    pub fn new(record: &OperationRecord, config: &TargetConfig) -> Self {
        let name = record.name.camel_case.clone();
        let pascal = record.name.pascal_case.clone();
        let params = (!record.query_params.is_empty()).then(|| ArgView {
            type_name: format!("{pascal}Params"),
            required: record.query_params.iter().any(|p| p.required),
        });
        let headers = (!record.headers.is_empty()).then(|| ArgView {
            type_name: format!("{pascal}Headers"),
            required: record.headers.iter().any(|p| p.required),
        });

        let args = record
            .props
            .iter()
            .map(|prop| {
                let ty = match prop.kind {
                    PropKind::Params => format!("{pascal}Params"),
                    PropKind::Headers => format!("{pascal}Headers"),
                    PropKind::PathParam | PropKind::Body => ir_type_to_ts(&prop.ty),
                };
                let optional = if prop.required { "" } else { "?" };
                format!("{}{optional}: {ty}", prop.name)
            })
            .collect();

        let mut declarations = Vec::new();
        if let Some(p) = &params {
            declarations.push(object_declaration(&p.type_name, &record.query_params));
        }
        if let Some(h) = &headers {
            declarations.push(object_declaration(&h.type_name, &record.headers));
        }

        let explode: Vec<String> = record
            .query_params
            .iter()
            .filter(|p| p.explode)
            .map(|p| format!("'{}'", p.original_name))
            .collect();

        let url = url_literal(record, config.base_url.as_deref());
        let url_with_query = format!(
            "{}?${{stringifiedParams}}`",
            url.strip_suffix('`').unwrap_or(&url)
        );

        Self {
            jsdoc: jsdoc(record),
            args,
            url,
            url_with_query,
            path_args: record
                .path_params
                .iter()
                .map(|p| format!("{}: {}", p.name.camel_case, ir_type_to_ts(&p.ty)))
                .collect(),
            path_names: record
                .path_params
                .iter()
                .map(|p| p.name.camel_case.clone())
                .collect(),
            params,
            headers,
            body: record.body.as_ref().map(|b| {
                let (serialization, prelude, expr) = match b.serialization {
                    BodySerialization::Json => ("json", None, "body"),
                    BodySerialization::FormData => {
                        ("form-data", Some(FORM_DATA_PRELUDE), "formData")
                    }
                    BodySerialization::UrlEncoded => {
                        ("url-encoded", Some(URL_ENCODED_PRELUDE), "formUrlEncoded")
                    }
                    BodySerialization::Text => ("text", None, "body"),
                    BodySerialization::Binary => ("binary", None, "body"),
                };
                BodyView {
                    content_type: b.content_type.clone(),
                    serialization,
                    required: b.required,
                    prelude,
                    expr,
                }
            }),
            explode_list: (!explode.is_empty()).then(|| explode.join(", ")),
            params_serializer: config.params_serializer.as_ref().map(|s| s.name.clone()),
            mutator: record.mutator.as_ref().map(|m| m.name.clone()),
            success_type: ir_type_to_ts(&record.response.success_type()),
            method: record.method.as_str(),
            declarations,
            name,
            pascal,
        }
    }

    /// Signature arguments followed by `options?: <options_type>`.
    pub fn signature(&self, options_type: &str) -> String {
        let mut args = self.args.clone();
        args.push(format!("options?: {options_type}"));
        args.join(", ")
    }

    /// Object literal merging the operation's headers with the caller's, if any apply.
    ///
    /// `json_content_type` adds an explicit JSON content type, which fetch needs and axios
    /// infers on its own.
    pub fn headers_expr(&self, json_content_type: bool) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(body) = &self.body {
            let explicit = match body.serialization {
                "form-data" => false,
                "json" => json_content_type,
                _ => true,
            };
            if explicit {
                parts.push(format!("'Content-Type': '{}'", body.content_type));
            }
        }
        if self.headers.is_some() {
            parts.push("...headers".to_string());
        }
        if parts.is_empty() {
            return None;
        }
        parts.push("...options?.headers".to_string());
        Some(format!("{{ {} }}", parts.join(", ")))
    }
}

fn object_declaration(name: &str, params: &[ParamRecord]) -> String {
    let mut out = format!("export type {name} = {{\n");
    for p in params {
        let mut notes: Vec<String> = p
            .description
            .iter()
            .map(|d| escape_jsdoc(d.replace('\n', " ")))
            .collect();
        if p.deprecated {
            notes.push("@deprecated".to_string());
        }
        if !notes.is_empty() {
            out.push_str(&format!("  /** {} */\n", notes.join(" ")));
        }
        let optional = if p.required { "" } else { "?" };
        out.push_str(&format!(
            "  {}{optional}: {};\n",
            property_key(&p.original_name),
            ir_type_to_ts(&p.ty)
        ));
    }
    out.push_str("};");
    out
}

/// The route with `{placeholders}` replaced by `${arg}` interpolations.
fn url_literal(record: &OperationRecord, base_url: Option<&str>) -> String {
    let mut out = String::from("`");
    if let Some(base) = base_url {
        out.push_str(base.trim_end_matches('/'));
    }
    let mut rest = record.route.as_str();
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let raw = &after[..end];
        let ident = record
            .path_params
            .iter()
            .find(|p| p.original_name == raw)
            .map(|p| p.name.camel_case.clone())
            .unwrap_or_else(|| normalize_name(raw).camel_case);
        out.push_str(&format!("${{{ident}}}"));
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out.push('`');
    out
}

fn jsdoc(record: &OperationRecord) -> Option<String> {
    let mut lines: Vec<String> = Vec::new();
    for text in record.summary.iter().chain(&record.description) {
        lines.extend(text.lines().map(|l| escape_jsdoc(l.trim_end().to_string())));
    }
    if record.deprecated {
        lines.push("@deprecated".to_string());
    }
    if lines.is_empty() {
        return None;
    }
    let body: Vec<String> = lines
        .iter()
        .map(|l| if l.is_empty() { " *".to_string() } else { format!(" * {l}") })
        .collect();
    Some(format!("/**\n{}\n */", body.join("\n")))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use apigen_core::parse;
    use apigen_core::resolve::resolve_spec;
    use apigen_core::transform::build_operations;

    pub(crate) const SPEC: &str = r#"
openapi: 3.0.3
info: { title: Petstore, version: 1.0.0 }
paths:
  /stores/{storeId}/pets/{petId}:
    put:
      operationId: updatePet
      summary: Replace a pet
      deprecated: true
      parameters:
        - { name: storeId, in: path, required: true, schema: { type: string } }
        - { name: petId, in: path, required: true, schema: { type: integer } }
        - { name: tags, in: query, explode: true, schema: { type: array, items: { type: string } } }
        - { name: X-Trace, in: header, description: Trace */ id, schema: { type: string } }
      requestBody:
        required: true
        content:
          application/x-www-form-urlencoded:
            schema: { $ref: '#/components/schemas/Pet' }
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema: { $ref: '#/components/schemas/Pet' }
        '404': { description: missing }
components:
  schemas:
    Pet: { type: object, properties: { name: { type: string } } }
"#;

    pub(crate) fn record(yaml: &str, config: &TargetConfig) -> OperationRecord {
        let spec = parse::from_yaml(yaml).unwrap();
        let resolved = resolve_spec(&spec).unwrap();
        build_operations(&resolved, config).unwrap().remove(0)
    }

    #[test]
    fn test_signature_and_url() {
        let config = TargetConfig {
            base_url: Some("https://api.example.com/".to_string()),
            ..TargetConfig::default()
        };
        let view = OperationView::new(&record(SPEC, &config), &config);
        assert_eq!(
            view.signature("RequestInit"),
            "storeId: string, petId: number, body: Pet, params?: UpdatePetParams, \
             headers?: UpdatePetHeaders, options?: RequestInit"
        );
        assert_eq!(
            view.url,
            "`https://api.example.com/stores/${storeId}/pets/${petId}`"
        );
        assert_eq!(
            view.url_with_query,
            "`https://api.example.com/stores/${storeId}/pets/${petId}?${stringifiedParams}`"
        );
        assert_eq!(view.explode_list.as_deref(), Some("'tags'"));
        assert_eq!(view.method, "PUT");
    }

    #[test]
    fn test_declarations() {
        let config = TargetConfig::default();
        let view = OperationView::new(&record(SPEC, &config), &config);
        assert_eq!(
            view.declarations,
            vec![
                "export type UpdatePetParams = {\n  tags?: string[];\n};".to_string(),
                "export type UpdatePetHeaders = {\n  /** Trace *\\/ id */\n  'X-Trace'?: string;\n};"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_headers_and_body() {
        let config = TargetConfig::default();
        let view = OperationView::new(&record(SPEC, &config), &config);
        let body = view.body.as_ref().unwrap();
        assert_eq!(body.expr, "formUrlEncoded");
        assert_eq!(
            view.headers_expr(false).as_deref(),
            Some(
                "{ 'Content-Type': 'application/x-www-form-urlencoded', ...headers, ...options?.headers }"
            )
        );
    }

    #[test]
    fn test_jsdoc() {
        let config = TargetConfig::default();
        let view = OperationView::new(&record(SPEC, &config), &config);
        insta::assert_snapshot!(view.jsdoc.unwrap(), @r"
        /**
         * Replace a pet
         * @deprecated
         */
        ");
    }
}
