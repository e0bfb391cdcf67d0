use std::collections::HashSet;

use indexmap::IndexMap;
use log::debug;

use super::walk::{escape_pointer, subschemas_mut, unescape_pointer};
use crate::error::ResolveError;
use crate::parse::OpenApiSpec;
use crate::parse::document::{Components, ParameterOrRef, Referenced};
use crate::parse::operation::{MediaType, Operation, Parameter, PathItem, RequestBody, Response};
use crate::parse::schema::SchemaOrRef;

const SCHEMA_PREFIX: &str = "#/components/schemas/";
const LEGACY_PREFIX: &str = "#/definitions/";

/// Extract the schema name from a `$ref`, accepting both component and legacy forms.
pub fn schema_ref_name(ref_path: &str) -> Option<String> {
    let raw = ref_path
        .strip_prefix(SCHEMA_PREFIX)
        .or_else(|| ref_path.strip_prefix(LEGACY_PREFIX))?;
    if raw.is_empty() || raw.contains('/') {
        return None;
    }
    Some(unescape_pointer(raw))
}

/// Inlines parameter, request-body and response references and checks every schema
/// reference against the component arena, rewriting legacy forms to `#/components/schemas/`.
pub struct RefResolver<'a> {
    components: Option<&'a Components>,
    schema_names: HashSet<String>,
}

impl<'a> RefResolver<'a> {
    pub fn new(spec: &'a OpenApiSpec) -> Self {
        let mut schema_names: HashSet<String> = spec.definitions.keys().cloned().collect();
        if let Some(components) = &spec.components {
            schema_names.extend(components.schemas.keys().cloned());
        }
        Self {
            components: spec.components.as_ref(),
            schema_names,
        }
    }

    /// Produce the dereferenced document and the schema arena.
    pub fn resolve_spec(
        &self,
        spec: &OpenApiSpec,
    ) -> Result<(OpenApiSpec, IndexMap<String, SchemaOrRef>), ResolveError> {
        let mut resolved = spec.clone();

        for (path, item) in &mut resolved.paths {
            let location = format!("#/paths/{}", escape_pointer(path));
            self.resolve_path_item(item, &location)?;
        }

        let mut arena: IndexMap<String, SchemaOrRef> = IndexMap::new();
        for (name, schema) in &spec.definitions {
            arena.insert(name.clone(), schema.clone());
        }
        if let Some(components) = &spec.components {
            for (name, schema) in &components.schemas {
                if arena.insert(name.clone(), schema.clone()).is_some() {
                    debug!("component schema {name} shadows a legacy definition");
                }
            }
        }
        for (name, schema) in arena.iter_mut() {
            let location = format!("{SCHEMA_PREFIX}{}", escape_pointer(name));
            self.check_schema(schema, &location)?;
        }

        // The arena owns the schemas from here on; the document keeps only the paths.
        resolved.definitions.clear();
        if let Some(components) = resolved.components.as_mut() {
            components.clear();
        }

        Ok((resolved, arena))
    }

    fn resolve_path_item(&self, item: &mut PathItem, location: &str) -> Result<(), ResolveError> {
        let params = std::mem::take(&mut item.parameters);
        item.parameters = self.resolve_parameters(&params, &format!("{location}/parameters"))?;

        for (method, op) in item.operations_mut() {
            self.resolve_operation(op, &format!("{location}/{method}"))?;
        }
        Ok(())
    }

    fn resolve_operation(&self, op: &mut Operation, location: &str) -> Result<(), ResolveError> {
        let params = std::mem::take(&mut op.parameters);
        op.parameters = self.resolve_parameters(&params, &format!("{location}/parameters"))?;

        if let Some(body) = op.request_body.take() {
            let body_location = format!("{location}/requestBody");
            let mut rb = self.lookup(&body, REQUEST_BODIES, &body_location)?;
            self.resolve_media_types(&mut rb.content, &body_location)?;
            op.request_body = Some(Referenced::Item(rb));
        }

        let mut resolved_responses = IndexMap::new();
        for (status, resp) in &op.responses {
            let resp_location = format!("{location}/responses/{}", escape_pointer(status));
            let mut r = self.lookup(resp, RESPONSES, &resp_location)?;
            self.resolve_media_types(&mut r.content, &resp_location)?;
            resolved_responses.insert(status.clone(), Referenced::Item(r));
        }
        op.responses = resolved_responses;

        Ok(())
    }

    fn resolve_parameters(
        &self,
        params: &[ParameterOrRef],
        location: &str,
    ) -> Result<Vec<ParameterOrRef>, ResolveError> {
        params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let param_location = format!("{location}/{i}");
                let mut param = self.lookup(p, PARAMETERS, &param_location)?;
                if let Some(schema) = param.schema.as_mut() {
                    self.check_schema(schema, &format!("{param_location}/schema"))?;
                }
                Ok(Referenced::Item(param))
            })
            .collect()
    }

    fn resolve_media_types(
        &self,
        content: &mut IndexMap<String, MediaType>,
        location: &str,
    ) -> Result<(), ResolveError> {
        for (content_type, mt) in content.iter_mut() {
            let mt_location = format!("{location}/content/{}", escape_pointer(content_type));
            if let Some(schema) = mt.schema.as_mut() {
                self.check_schema(schema, &format!("{mt_location}/schema"))?;
            }
        }
        Ok(())
    }

    /// Validate every reference below `schema_or_ref` and normalize it to the component form.
    pub fn check_schema(
        &self,
        schema_or_ref: &mut SchemaOrRef,
        location: &str,
    ) -> Result<(), ResolveError> {
        match schema_or_ref {
            SchemaOrRef::Ref { ref_path } => {
                let name = schema_ref_name(ref_path).ok_or_else(|| {
                    ResolveError::InvalidRefFormat {
                        reference: ref_path.clone(),
                        location: location.to_string(),
                    }
                })?;
                if !self.schema_names.contains(&name) {
                    return Err(ResolveError::RefTargetNotFound {
                        reference: ref_path.clone(),
                        location: location.to_string(),
                    });
                }
                *ref_path = format!("{SCHEMA_PREFIX}{}", escape_pointer(&name));
                Ok(())
            }
            SchemaOrRef::Schema(schema) => {
                for (segment, child) in subschemas_mut(schema) {
                    self.check_schema(child, &format!("{location}/{segment}"))?;
                }
                Ok(())
            }
        }
    }

    /// Follow a component reference chain to the object it names.
    fn lookup<T>(
        &self,
        item: &Referenced<T>,
        section: Section<T>,
        location: &str,
    ) -> Result<T, ResolveError>
    where
        T: Clone,
    {
        let mut seen = HashSet::new();
        let mut current = item;
        loop {
            let ref_path = match current {
                Referenced::Item(found) => return Ok(found.clone()),
                Referenced::Ref { ref_path } => ref_path,
            };
            if !seen.insert(ref_path.as_str()) {
                return Err(ResolveError::CircularAlias(ref_path.clone()));
            }
            let name = parse_ref_name(ref_path, section.name, location)?;
            current = self
                .components
                .and_then(|c| (section.table)(c).get(&name))
                .ok_or_else(|| not_found(ref_path, location))?;
        }
    }
}

/// A `#/components/<name>` table holding referencable `T`s.
struct Section<T> {
    name: &'static str,
    table: fn(&Components) -> &IndexMap<String, Referenced<T>>,
}

const PARAMETERS: Section<Parameter> = Section {
    name: "parameters",
    table: parameters,
};

const REQUEST_BODIES: Section<RequestBody> = Section {
    name: "requestBodies",
    table: request_bodies,
};

const RESPONSES: Section<Response> = Section {
    name: "responses",
    table: responses,
};

fn parameters(c: &Components) -> &IndexMap<String, ParameterOrRef> {
    &c.parameters
}

fn request_bodies(c: &Components) -> &IndexMap<String, Referenced<RequestBody>> {
    &c.request_bodies
}

fn responses(c: &Components) -> &IndexMap<String, Referenced<Response>> {
    &c.responses
}

fn not_found(ref_path: &str, location: &str) -> ResolveError {
    ResolveError::RefTargetNotFound {
        reference: ref_path.to_string(),
        location: location.to_string(),
    }
}

/// Parse a `$ref` path like `#/components/parameters/Foo` and extract the name.
fn parse_ref_name(
    ref_path: &str,
    expected_section: &str,
    location: &str,
) -> Result<String, ResolveError> {
    let invalid = || ResolveError::InvalidRefFormat {
        reference: ref_path.to_string(),
        location: location.to_string(),
    };
    let stripped = ref_path.strip_prefix("#/components/").ok_or_else(invalid)?;
    let (section, name) = stripped.split_once('/').ok_or_else(invalid)?;
    if section != expected_section {
        return Err(invalid());
    }
    Ok(unescape_pointer(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_ref_name() {
        assert_eq!(
            schema_ref_name("#/components/schemas/Pet").as_deref(),
            Some("Pet")
        );
        assert_eq!(schema_ref_name("#/definitions/Pet").as_deref(), Some("Pet"));
        assert_eq!(
            schema_ref_name("#/components/schemas/a~1b").as_deref(),
            Some("a/b")
        );
        assert_eq!(schema_ref_name("other.yaml#/components/schemas/Pet"), None);
        assert_eq!(schema_ref_name("#/components/schemas/Pet/properties/id"), None);
    }

    #[test]
    fn test_parse_ref_name_rejects_wrong_section() {
        let err = parse_ref_name("#/components/schemas/Foo", "parameters", "#/paths").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidRefFormat { .. }));
        assert_eq!(
            parse_ref_name("#/components/parameters/Limit", "parameters", "#/paths").unwrap(),
            "Limit"
        );
    }
}
