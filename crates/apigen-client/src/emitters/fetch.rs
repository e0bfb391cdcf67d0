use apigen_core::config::TargetConfig;
use apigen_core::error::GeneratorError;
use apigen_core::ir::{OperationRecord, ResponseVariant};
use apigen_core::typescript::ir_type_to_ts;
use minijinja::context;
use serde::Serialize;

use super::render;
use super::view::OperationView;

#[derive(Debug, Serialize)]
struct ResponseTypeView {
    name: String,
    data: String,
    status: String,
}

/// Render the response types, URL builder and request function of one operation.
pub fn render_operation(
    record: &OperationRecord,
    config: &TargetConfig,
) -> Result<String, GeneratorError> {
    let op = OperationView::new(record, config);
    let response = format!("{}Response", op.name);

    let type_view = |v: &ResponseVariant| ResponseTypeView {
        name: response_type_name(record, v),
        data: ir_type_to_ts(&v.ty),
        status: status_type(&v.status_key),
    };
    let responses: Vec<ResponseTypeView> = record.response.variants().map(type_view).collect();
    let names = |variants: &[ResponseVariant]| -> Option<String> {
        let names: Vec<String> = variants
            .iter()
            .map(|v| response_type_name(record, v))
            .collect();
        match names.len() {
            0 => None,
            1 => names.into_iter().next(),
            _ => Some(format!("({})", names.join(" | "))),
        }
    };

    let mut url_params = op.path_args.clone();
    let mut url_call = op.path_names.clone();
    if let Some(params) = &op.params {
        let optional = if params.required { "" } else { "?" };
        url_params.push(format!("params{optional}: {}", params.type_name));
        url_call.push("params".to_string());
    }

    let parse_json = record
        .response
        .success_content_type()
        .is_none_or(|ct| ct.contains("json"));

    render(
        "fetch.ts.j2",
        context! {
            response => response,
            responses => responses,
            success_union => names(&record.response.success),
            error_union => names(&record.response.errors),
            url_fn => format!("get{}Url", op.pascal),
            url_params => url_params.join(", "),
            url_call => url_call.join(", "),
            signature => op.signature("RequestInit"),
            headers_expr => op.headers_expr(true),
            parse_json => parse_json,
            op => op,
        },
    )
}

/// `listPetsResponse200` for the variant named `ListPets200`.
pub fn response_type_name(record: &OperationRecord, variant: &ResponseVariant) -> String {
    let suffix = variant
        .type_name
        .strip_prefix(record.name.pascal_case.as_str())
        .unwrap_or(&variant.type_name);
    format!("{}Response{suffix}", record.name.camel_case)
}

fn status_type(status_key: &str) -> String {
    match status_key.parse::<u16>() {
        Ok(code) => code.to_string(),
        Err(_) => "number".to_string(),
    }
}
