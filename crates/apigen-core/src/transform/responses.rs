use indexmap::IndexMap;
use log::debug;

use crate::ir::{IrType, ResponseRecord, ResponseVariant};
use crate::parse::document::{Referenced, ResponseOrRef};

use super::name_normalizer::{content_type_suffix, response_type_name};
use super::schema_types::schema_or_ref_to_ir_type;

/// `2XX`, `2xx` and `200`–`299`.
pub fn is_success_status(status: &str) -> bool {
    if status.eq_ignore_ascii_case("2xx") {
        return true;
    }
    status
        .parse::<u16>()
        .is_ok_and(|code| (200..300).contains(&code))
}

/// Split an operation's responses into success and error variants.
///
/// `default` counts as success only when no 2xx status is declared. When nothing
/// qualifies as success, a single `unknown` variant keyed `default` is synthesized.
pub fn build_responses(
    operation: &str,
    responses: &IndexMap<String, ResponseOrRef>,
) -> ResponseRecord {
    let has_2xx = responses.keys().any(|k| is_success_status(k));
    let mut record = ResponseRecord::default();

    for (status, resp) in responses {
        let Referenced::Item(resp) = resp else {
            debug!("{operation}: unresolved response reference for {status}");
            continue;
        };
        let success = is_success_status(status) || (status == "default" && !has_2xx);
        let target = if success {
            &mut record.success
        } else {
            &mut record.errors
        };

        if resp.content.is_empty() {
            target.push(ResponseVariant {
                status_key: status.clone(),
                content_type: String::new(),
                ty: IrType::Void,
                type_name: response_type_name(operation, status, None),
                schema: None,
                description: Some(resp.description.clone()).filter(|d| !d.is_empty()),
            });
            continue;
        }

        let shared = resp.content.len() > 1;
        for (content_type, media) in &resp.content {
            let suffix = shared.then(|| content_type_suffix(content_type));
            let ty = media
                .schema
                .as_ref()
                .map(schema_or_ref_to_ir_type)
                .unwrap_or(IrType::Any);
            target.push(ResponseVariant {
                status_key: status.clone(),
                content_type: content_type.clone(),
                ty,
                type_name: response_type_name(operation, status, suffix.as_deref()),
                schema: media.schema.clone(),
                description: Some(resp.description.clone()).filter(|d| !d.is_empty()),
            });
        }
    }

    if record.success.is_empty() {
        debug!("{operation}: no success response declared, falling back to unknown");
        record.success.push(ResponseVariant {
            status_key: "default".to_string(),
            content_type: String::new(),
            ty: IrType::Any,
            type_name: response_type_name(operation, "default", None),
            schema: None,
            description: None,
        });
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responses(yaml: &str) -> IndexMap<String, ResponseOrRef> {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn test_success_status_detection() {
        assert!(is_success_status("200"));
        assert!(is_success_status("204"));
        assert!(is_success_status("2XX"));
        assert!(is_success_status("2xx"));
        assert!(!is_success_status("301"));
        assert!(!is_success_status("default"));
    }

    #[test]
    fn test_default_is_error_when_2xx_declared() {
        let record = build_responses(
            "listPets",
            &responses(
                r#"
'200':
  description: ok
  content:
    application/json:
      schema: { $ref: '#/components/schemas/Pets' }
default:
  description: error
  content:
    application/json:
      schema: { $ref: '#/components/schemas/Error' }
"#,
            ),
        );
        assert_eq!(record.success.len(), 1);
        assert_eq!(record.success[0].type_name, "ListPets200");
        assert_eq!(record.errors.len(), 1);
        assert_eq!(record.errors[0].status_key, "default");
    }

    #[test]
    fn test_default_is_success_without_2xx() {
        let record = build_responses(
            "ping",
            &responses("default:\n  description: anything\n"),
        );
        assert_eq!(record.success.len(), 1);
        assert_eq!(record.success[0].ty, IrType::Void);
        assert!(record.errors.is_empty());
    }

    #[test]
    fn test_fallback_when_no_success() {
        let record = build_responses("remove", &responses("'404':\n  description: missing\n"));
        assert_eq!(record.success.len(), 1);
        let fallback = &record.success[0];
        assert_eq!(fallback.status_key, "default");
        assert_eq!(fallback.content_type, "");
        assert_eq!(fallback.ty, IrType::Any);
        assert_eq!(record.errors.len(), 1);
    }

    #[test]
    fn test_empty_responses_fall_back() {
        let record = build_responses("noop", &IndexMap::new());
        assert_eq!(record.success.len(), 1);
        assert_eq!(record.success[0].type_name, "NoopDefault");
    }

    #[test]
    fn test_shared_status_gets_content_type_suffix() {
        let record = build_responses(
            "getReport",
            &responses(
                r#"
'200':
  description: ok
  content:
    application/json:
      schema: { type: object }
    text/csv:
      schema: { type: string }
"#,
            ),
        );
        let names: Vec<&str> = record.success.iter().map(|v| v.type_name.as_str()).collect();
        assert_eq!(names, vec!["GetReport200ApplicationJson", "GetReport200TextCsv"]);
    }
}
