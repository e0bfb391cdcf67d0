use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::config::{NamingStrategy, TargetConfig};
use crate::error::TransformError;
use crate::ir::{
    BodySerialization, HttpMethod, IrType, OperationRecord, ParamRecord, Prop, PropKind,
    RequestBodyRecord,
};
use crate::parse::document::{ParameterOrRef, Referenced};
use crate::parse::operation::{Operation, Parameter, ParameterLocation};
use crate::parse::schema::SchemaOrRef;
use crate::resolve::{Deref, ResolvedSpec, SchemaArena};

use super::name_normalizer::{normalize_name, route_to_name};
use super::responses::build_responses;
use super::schema_types::schema_or_ref_to_ir_type;

/// Build one `OperationRecord` per selected (path, verb) pair, in document order.
///
/// Operations excluded by the target's tag filters are skipped. Names are final once
/// this returns; nothing downstream renames an operation.
pub fn build_operations(
    resolved: &ResolvedSpec,
    target: &TargetConfig,
) -> Result<Vec<OperationRecord>, TransformError> {
    let mut records = Vec::new();

    for (path, item) in &resolved.spec.paths {
        for (verb, op) in item.operations() {
            if !target.filters.selects(&op.tags) {
                debug!("skipping {} {path}: filtered by tags", verb.to_uppercase());
                continue;
            }
            let record = build_operation(&resolved.arena, target, verb, path, &item.parameters, op)?;
            debug!("modeled {} as {}", record.location, record.name.camel_case);
            records.push(record);
        }
    }

    Ok(records)
}

fn build_operation(
    arena: &SchemaArena,
    target: &TargetConfig,
    verb: &str,
    path: &str,
    path_level: &[ParameterOrRef],
    op: &Operation,
) -> Result<OperationRecord, TransformError> {
    let location = format!("{} {path}", verb.to_uppercase());
    let method = HttpMethod::from_verb(verb).ok_or_else(|| TransformError::InvalidOperation {
        location: location.clone(),
        message: format!("unknown HTTP verb `{verb}`"),
    })?;

    let raw_name = match target.naming.strategy {
        NamingStrategy::UseOperationId => op
            .operation_id
            .clone()
            .unwrap_or_else(|| route_to_name(method.as_str(), path)),
        NamingStrategy::UseRouteBased => route_to_name(method.as_str(), path),
    };
    let override_key = op.operation_id.clone().unwrap_or_else(|| raw_name.clone());
    let name = target
        .naming
        .aliases
        .get(&raw_name)
        .cloned()
        .unwrap_or(raw_name);
    let name = normalize_name(&name);

    let overrides = target.overrides.resolve(&override_key, &op.tags);
    let explode_arrays = overrides.explode_arrays.unwrap_or(target.explode_arrays);
    let mutator = overrides.mutator.or_else(|| target.mutator.clone());

    let params = merge_parameters(path_level, &op.parameters);
    let mut path_params = Vec::new();
    let mut query_params = Vec::new();
    let mut headers = Vec::new();
    for param in params {
        match param.location {
            ParameterLocation::Path => path_params.push(param_record(arena, &param, false)),
            ParameterLocation::Query => {
                query_params.push(param_record(arena, &param, param.explodes(explode_arrays)));
            }
            ParameterLocation::Header => headers.push(param_record(arena, &param, false)),
            ParameterLocation::Cookie => {
                debug!("{location}: dropping cookie parameter `{}`", param.name);
            }
        }
    }
    order_path_params(&location, path, &mut path_params);

    let body = match &op.request_body {
        Some(Referenced::Item(rb)) => {
            rb.preferred_content().map(|(content_type, media)| RequestBodyRecord {
                ty: media
                    .schema
                    .as_ref()
                    .map(schema_or_ref_to_ir_type)
                    .unwrap_or(IrType::Any),
                schema: media.schema.clone(),
                required: rb.required,
                content_type: content_type.to_string(),
                serialization: BodySerialization::from_content_type(content_type),
                description: rb.description.clone(),
            })
        }
        Some(Referenced::Ref { ref_path }) => {
            return Err(TransformError::InvalidOperation {
                location,
                message: format!("unresolved request body reference {ref_path}"),
            });
        }
        None => None,
    };
    if body.is_none() && !method.is_bodyless() {
        debug!("{location}: no request body declared");
    }

    let props = build_props(&path_params, body.as_ref(), &query_params, &headers);
    let response = build_responses(&name.camel_case, &op.responses);

    Ok(OperationRecord {
        name,
        operation_id: op.operation_id.clone(),
        method,
        route: path.to_string(),
        summary: op.summary.clone(),
        description: op.description.clone(),
        tags: op.tags.clone(),
        deprecated: op.deprecated,
        props,
        path_params,
        query_params,
        headers,
        body,
        response,
        mutator,
        location,
    })
}

/// Path-level parameters first; an operation parameter replaces the path-level one with
/// the same name and location.
fn merge_parameters(path_level: &[ParameterOrRef], op_level: &[ParameterOrRef]) -> Vec<Parameter> {
    let mut merged: IndexMap<(&str, ParameterLocation), &Parameter> = IndexMap::new();
    for param in path_level.iter().chain(op_level).filter_map(Referenced::item) {
        merged.insert(param.key(), param);
    }
    merged.into_values().cloned().collect()
}

fn param_record(arena: &SchemaArena, param: &Parameter, explode_flag: bool) -> ParamRecord {
    let is_array = param
        .schema
        .as_ref()
        .is_some_and(|schema| is_array_schema(arena, schema));
    ParamRecord {
        name: normalize_name(&param.name),
        original_name: param.name.clone(),
        ty: param
            .schema
            .as_ref()
            .map(schema_or_ref_to_ir_type)
            .unwrap_or(IrType::Any),
        schema: param.schema.clone(),
        required: param.is_required(),
        description: param.description.clone(),
        deprecated: param.deprecated,
        explode: is_array && explode_flag,
    }
}

fn is_array_schema(arena: &SchemaArena, schema: &SchemaOrRef) -> bool {
    match arena.deref(schema, &HashSet::new()) {
        Ok(Deref::Schema { schema, .. }) => schema.is_array(),
        _ => false,
    }
}

/// Sort path parameters by their position in the route. Placeholders with no declared
/// parameter get a required string parameter.
fn order_path_params(location: &str, route: &str, params: &mut Vec<ParamRecord>) {
    let placeholders: Vec<&str> = route
        .split('/')
        .filter_map(|seg| seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .collect();

    for placeholder in &placeholders {
        if !params.iter().any(|p| p.original_name == *placeholder) {
            warn!("{location}: path placeholder `{placeholder}` has no parameter, assuming string");
            params.push(ParamRecord {
                name: normalize_name(placeholder),
                original_name: placeholder.to_string(),
                ty: IrType::String,
                schema: None,
                required: true,
                description: None,
                deprecated: false,
                explode: false,
            });
        }
    }

    params.sort_by_key(|p| {
        placeholders
            .iter()
            .position(|ph| *ph == p.original_name)
            .unwrap_or(usize::MAX)
    });
}

fn build_props(
    path_params: &[ParamRecord],
    body: Option<&RequestBodyRecord>,
    query_params: &[ParamRecord],
    headers: &[ParamRecord],
) -> Vec<Prop> {
    let mut props: Vec<Prop> = path_params
        .iter()
        .map(|p| Prop {
            name: p.name.camel_case.clone(),
            kind: PropKind::PathParam,
            ty: p.ty.clone(),
            required: true,
        })
        .collect();

    if let Some(body) = body {
        props.push(Prop {
            name: "body".to_string(),
            kind: PropKind::Body,
            ty: body.ty.clone(),
            required: body.required,
        });
    }
    if !query_params.is_empty() {
        props.push(Prop {
            name: "params".to_string(),
            kind: PropKind::Params,
            ty: params_object(query_params),
            required: query_params.iter().any(|p| p.required),
        });
    }
    if !headers.is_empty() {
        props.push(Prop {
            name: "headers".to_string(),
            kind: PropKind::Headers,
            ty: params_object(headers),
            required: headers.iter().any(|p| p.required),
        });
    }

    // Optional arguments must trail required ones.
    props.sort_by_key(|p| !p.required);
    props
}

fn params_object(params: &[ParamRecord]) -> IrType {
    IrType::Object(
        params
            .iter()
            .map(|p| (p.original_name.clone(), p.ty.clone(), p.required))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OperationOverride, TargetConfig};
    use crate::parse;
    use crate::resolve::resolve_spec;

    const SPEC: &str = r#"
openapi: 3.0.3
info: { title: Petstore, version: 1.0.0 }
paths:
  /stores/{storeId}/pets/{petId}:
    parameters:
      - { name: petId, in: path, required: true, schema: { type: integer } }
      - { name: storeId, in: path, required: true, schema: { type: string } }
      - { name: verbose, in: query, schema: { type: boolean } }
    put:
      operationId: updatePet
      tags: [pets]
      parameters:
        - { name: verbose, in: query, required: true, schema: { type: string } }
        - { name: session, in: cookie, schema: { type: string } }
        - { name: X-Trace, in: header, schema: { type: string } }
      requestBody:
        content:
          text/plain: { schema: { type: string } }
          application/vnd.pet+json: { schema: { $ref: '#/components/schemas/Pet' } }
      responses:
        '200': { description: ok }
  /pets:
    get:
      tags: [pets]
      parameters:
        - name: tags
          in: query
          schema: { type: array, items: { type: string } }
        - name: ids
          in: query
          explode: true
          schema: { $ref: '#/components/schemas/Ids' }
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema: { type: array, items: { $ref: '#/components/schemas/Pet' } }
components:
  schemas:
    Pet: { type: object, properties: { id: { type: integer } } }
    Ids: { type: array, items: { type: integer } }
"#;

    fn build(target: &TargetConfig) -> Vec<OperationRecord> {
        let spec = parse::from_yaml(SPEC).unwrap();
        let resolved = resolve_spec(&spec).unwrap();
        build_operations(&resolved, target).unwrap()
    }

    #[test]
    fn test_parameter_merge_and_partition() {
        let records = build(&TargetConfig::default());
        let update = &records[0];
        assert_eq!(update.name.camel_case, "updatePet");
        assert_eq!(update.location, "PUT /stores/{storeId}/pets/{petId}");

        let path: Vec<&str> = update
            .path_params
            .iter()
            .map(|p| p.original_name.as_str())
            .collect();
        assert_eq!(path, vec!["storeId", "petId"]);

        assert_eq!(update.query_params.len(), 1);
        assert_eq!(update.query_params[0].ty, IrType::String);
        assert!(update.query_params[0].required);
        assert_eq!(update.headers.len(), 1);
    }

    #[test]
    fn test_body_content_preference() {
        let records = build(&TargetConfig::default());
        let body = records[0].body.as_ref().unwrap();
        assert_eq!(body.content_type, "application/vnd.pet+json");
        assert_eq!(body.serialization, BodySerialization::Json);
        assert_eq!(body.ty, IrType::Ref("Pet".to_string()));
    }

    #[test]
    fn test_props_order_required_first() {
        let records = build(&TargetConfig::default());
        let props: Vec<&str> = records[0].props.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(props, vec!["storeId", "petId", "params", "body", "headers"]);
    }

    #[test]
    fn test_route_based_name_and_explode() {
        let records = build(&TargetConfig::default());
        let list = &records[1];
        assert_eq!(list.name.camel_case, "getPets");
        let explode: Vec<(&str, bool)> = list
            .query_params
            .iter()
            .map(|p| (p.original_name.as_str(), p.explode))
            .collect();
        assert_eq!(explode, vec![("tags", false), ("ids", true)]);
    }

    #[test]
    fn test_explode_override_by_tag() {
        let mut target = TargetConfig::default();
        target.overrides.tags.insert(
            "pets".to_string(),
            OperationOverride {
                mutator: None,
                explode_arrays: Some(true),
            },
        );
        let records = build(&target);
        assert!(records[1].query_params.iter().all(|p| p.explode));
    }

    #[test]
    fn test_tag_filter_and_alias() {
        let mut target = TargetConfig::default();
        target
            .naming
            .aliases
            .insert("getPets".to_string(), "findPets".to_string());
        target.filters.exclude_tags.push("nothing".to_string());
        let records = build(&target);
        assert_eq!(records[1].name.camel_case, "findPets");

        target.filters.tags.push("other".to_string());
        assert!(build(&target).is_empty());
    }
}
