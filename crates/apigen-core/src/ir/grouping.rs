use std::collections::HashMap;

use indexmap::IndexMap;

use super::operations::OperationRecord;
use crate::config::OutputMode;
use crate::error::NamingCollisionError;
use crate::transform::name_normalizer::normalize_name;

/// One output unit: the operations that land in a single client file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    /// Raw unit name handed to the backend's `title` (API title, tag or operation name).
    pub name: String,
    /// Client file path relative to the target output directory.
    pub path: String,
    /// Indices into the record list, in declaration order.
    pub operations: Vec<usize>,
}

/// Group operations into output units according to the layout mode.
///
/// `file_stem` is the camelCase base name used by the single-file layouts. Tag modes use
/// each operation's first tag (`default` when untagged) and are ordered by tag name.
pub fn plan_units(
    records: &[OperationRecord],
    mode: OutputMode,
    title: &str,
    file_stem: &str,
) -> Vec<OutputUnit> {
    match mode {
        OutputMode::Single | OutputMode::Split => vec![OutputUnit {
            name: title.to_string(),
            path: format!("{file_stem}.ts"),
            operations: (0..records.len()).collect(),
        }],
        OutputMode::Tags | OutputMode::TagsSplit => {
            // Tags whose file names differ only by case share one unit.
            let mut groups: IndexMap<String, (String, Vec<usize>)> = IndexMap::new();
            for (i, record) in records.iter().enumerate() {
                let tag = record
                    .tags
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "default".to_string());
                let stem = normalize_name(&tag).camel_case;
                groups
                    .entry(stem.to_lowercase())
                    .or_insert_with(|| (tag, Vec::new()))
                    .1
                    .push(i);
            }
            groups.sort_keys();
            groups
                .into_values()
                .map(|(tag, operations)| {
                    let stem = normalize_name(&tag).camel_case;
                    let path = if mode == OutputMode::TagsSplit {
                        format!("{stem}/{stem}.ts")
                    } else {
                        format!("{stem}.ts")
                    };
                    OutputUnit {
                        name: tag,
                        path,
                        operations,
                    }
                })
                .collect()
        }
        OutputMode::Operations => {
            let mut groups: IndexMap<String, OutputUnit> = IndexMap::new();
            for (i, record) in records.iter().enumerate() {
                let name = &record.name.camel_case;
                groups
                    .entry(name.to_lowercase())
                    .or_insert_with(|| OutputUnit {
                        name: name.clone(),
                        path: format!("endpoints/{name}.ts"),
                        operations: Vec::new(),
                    })
                    .operations
                    .push(i);
            }
            groups.into_values().collect()
        }
    }
}

/// Path of the file a model schema is written to.
pub fn model_path(mode: OutputMode, file_stem: &str, schema_name: &str) -> String {
    match mode {
        OutputMode::Single => format!("{file_stem}.ts"),
        OutputMode::Split | OutputMode::Tags => format!("{file_stem}.schemas.ts"),
        OutputMode::TagsSplit | OutputMode::Operations => {
            format!("model/{}.ts", normalize_name(schema_name).camel_case)
        }
    }
}

/// Fail when two operations in `unit` share a generated name, ignoring case.
pub fn check_collisions(
    records: &[OperationRecord],
    unit: &OutputUnit,
) -> Result<(), NamingCollisionError> {
    let mut seen: HashMap<String, &OperationRecord> = HashMap::new();
    for &i in &unit.operations {
        let record = &records[i];
        if let Some(first) = seen.insert(record.name.camel_case.to_lowercase(), record) {
            return Err(NamingCollisionError {
                name: record.name.camel_case.clone(),
                unit: unit.name.clone(),
                first: first.location.clone(),
                second: record.location.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{HttpMethod, ResponseRecord};

    fn record(name: &str, route: &str, tags: &[&str]) -> OperationRecord {
        OperationRecord {
            name: normalize_name(name),
            operation_id: Some(name.to_string()),
            method: HttpMethod::Get,
            route: route.to_string(),
            summary: None,
            description: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            deprecated: false,
            props: vec![],
            path_params: vec![],
            query_params: vec![],
            headers: vec![],
            body: None,
            response: ResponseRecord::default(),
            mutator: None,
            location: format!("GET {route}"),
        }
    }

    #[test]
    fn test_tags_group_by_first_tag_sorted() {
        let records = vec![
            record("listPets", "/pets", &["pets", "store"]),
            record("getOrder", "/orders/{id}", &["store"]),
            record("health", "/health", &[]),
        ];
        let units = plan_units(&records, OutputMode::TagsSplit, "Petstore", "petstore");
        let summary: Vec<(&str, &str, Vec<usize>)> = units
            .iter()
            .map(|u| (u.name.as_str(), u.path.as_str(), u.operations.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("default", "default/default.ts", vec![2]),
                ("pets", "pets/pets.ts", vec![0]),
                ("store", "store/store.ts", vec![1]),
            ]
        );
    }

    #[test]
    fn test_single_and_operations_layouts() {
        let records = vec![
            record("listPets", "/pets", &[]),
            record("getPet", "/pets/{id}", &[]),
        ];
        let single = plan_units(&records, OutputMode::Single, "Petstore", "petstore");
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].path, "petstore.ts");

        let ops = plan_units(&records, OutputMode::Operations, "Petstore", "petstore");
        assert_eq!(ops[1].path, "endpoints/getPet.ts");
    }

    #[test]
    fn test_model_paths() {
        assert_eq!(model_path(OutputMode::Single, "api", "Pet"), "api.ts");
        assert_eq!(model_path(OutputMode::Split, "api", "Pet"), "api.schemas.ts");
        assert_eq!(
            model_path(OutputMode::Operations, "api", "FooBar"),
            "model/fooBar.ts"
        );
    }

    #[test]
    fn test_collision_reports_both_locations() {
        let records = vec![
            record("listPets", "/pets", &[]),
            record("listPets", "/v2/pets", &[]),
        ];
        let units = plan_units(&records, OutputMode::Single, "Petstore", "petstore");
        let err = check_collisions(&records, &units[0]).unwrap_err();
        assert_eq!(err.first, "GET /pets");
        assert_eq!(err.second, "GET /v2/pets");
    }

    #[test]
    fn test_tags_differing_by_case_share_a_unit() {
        let records = vec![
            record("getPet", "/a", &["Pets"]),
            record("listPets", "/b", &["pets"]),
        ];
        let units = plan_units(&records, OutputMode::Tags, "Petstore", "petstore");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].path, "pets.ts");
        assert_eq!(units[0].operations, vec![0, 1]);
        assert!(check_collisions(&records, &units[0]).is_ok());
    }

    #[test]
    fn test_operations_with_same_file_collide() {
        let records = vec![
            record("get_pet", "/a", &[]),
            record("getPet", "/b", &[]),
        ];
        let units = plan_units(&records, OutputMode::Operations, "Petstore", "petstore");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].path, "endpoints/getPet.ts");
        let err = check_collisions(&records, &units[0]).unwrap_err();
        assert_eq!(err.name, "getPet");
        assert_eq!(err.first, "GET /a");
        assert_eq!(err.second, "GET /b");
    }
}
