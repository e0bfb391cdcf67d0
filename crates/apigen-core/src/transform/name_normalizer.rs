use heck::{ToLowerCamelCase, ToPascalCase};

use crate::ir::NormalizedName;

/// Case-convert an arbitrary document name into identifier form.
///
/// Every run of characters that cannot appear in an identifier acts as a word break.
/// A name that would start with a digit gets a leading `_`.
pub fn normalize_name(raw: &str) -> NormalizedName {
    let words = identifier_words(raw);
    if words.is_empty() {
        return NormalizedName {
            original: raw.to_string(),
            pascal_case: "Unnamed".to_string(),
            camel_case: "unnamed".to_string(),
        };
    }
    NormalizedName {
        original: raw.to_string(),
        pascal_case: guard_digit(words.to_pascal_case()),
        camel_case: guard_digit(words.to_lower_camel_case()),
    }
}

fn identifier_words(raw: &str) -> String {
    raw.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn guard_digit(ident: String) -> String {
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{ident}")
    } else {
        ident
    }
}

/// Operation name for a route without an `operationId`: the verb followed by every
/// path segment, placeholders included, e.g. `GET /pets/{petId}` → `getPetsPetId`.
pub fn route_to_name(method: &str, path: &str) -> String {
    let segments = path
        .split('/')
        .map(|seg| seg.trim_start_matches('{').trim_end_matches('}'))
        .filter(|seg| !seg.is_empty());
    let words: Vec<&str> = std::iter::once(method).chain(segments).collect();
    normalize_name(&words.join("-")).camel_case
}

/// PascalCase suffix distinguishing response variants that share a status key.
///
/// `application/json` → `ApplicationJson`, `text/plain; charset=utf-8` → `TextPlain`.
pub fn content_type_suffix(content_type: &str) -> String {
    let essence = content_type.split(';').next().unwrap_or(content_type).trim();
    normalize_name(essence).pascal_case
}

/// Name of the type emitted for one response variant, e.g. `ListPets200`.
pub fn response_type_name(operation: &str, status_key: &str, suffix: Option<&str>) -> String {
    let status = normalize_name(status_key).pascal_case;
    format!(
        "{}{}{}",
        normalize_name(operation).pascal_case,
        status.trim_start_matches('_'),
        suffix.unwrap_or_default()
    )
}
