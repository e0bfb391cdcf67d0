use apigen_core::config::{
    MutatorConfig, NamingStrategy, OperationOverride, OutputMode, TargetConfig,
};
use apigen_core::error::NamingCollisionError;
use apigen_core::ir::{IrType, OperationRecord, OutputUnit, check_collisions, plan_units};
use apigen_core::parse;
use apigen_core::resolve::resolve_spec;
use apigen_core::transform::build_operations;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const COLLISION: &str = include_str!("fixtures/collision.yaml");

fn records(yaml: &str, target: &TargetConfig) -> Vec<OperationRecord> {
    let spec = parse::from_yaml(yaml).unwrap();
    let resolved = resolve_spec(&spec).unwrap();
    build_operations(&resolved, target).unwrap()
}

fn find<'a>(records: &'a [OperationRecord], name: &str) -> &'a OperationRecord {
    records
        .iter()
        .find(|r| r.name.camel_case == name)
        .unwrap_or_else(|| panic!("missing operation {name}"))
}

fn prop_names(record: &OperationRecord) -> Vec<&str> {
    record.props.iter().map(|p| p.name.as_str()).collect()
}

#[test]
fn petstore_operations_in_document_order() {
    let records = records(PETSTORE, &TargetConfig::default());
    let names: Vec<&str> = records.iter().map(|r| r.name.camel_case.as_str()).collect();
    assert_eq!(
        names,
        vec!["listPets", "createPet", "showPetById", "deletePet", "placeOrder"]
    );
}

#[test]
fn required_props_come_first() {
    let records = records(PETSTORE, &TargetConfig::default());
    assert_eq!(prop_names(find(&records, "listPets")), vec!["headers", "params"]);
    assert_eq!(prop_names(find(&records, "showPetById")), vec!["storeId", "petId"]);
    assert_eq!(prop_names(find(&records, "placeOrder")), vec!["body"]);
}

#[test]
fn cookie_parameters_are_dropped() {
    let records = records(PETSTORE, &TargetConfig::default());
    let show = find(&records, "showPetById");
    assert_eq!(show.path_params.len(), 2);
    assert!(show.query_params.is_empty());
    assert!(show.headers.is_empty());
}

#[test]
fn responses_are_classified() {
    let records = records(PETSTORE, &TargetConfig::default());

    let list = find(&records, "listPets");
    assert_eq!(list.response.success_type(), IrType::Ref("Pets".to_string()));
    assert_eq!(list.response.errors[0].status_key, "default");

    let delete = find(&records, "deletePet");
    assert_eq!(delete.response.success_type(), IrType::Void);

    let order = find(&records, "placeOrder");
    let names: Vec<&str> = order
        .response
        .success
        .iter()
        .map(|v| v.type_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["PlaceOrder200ApplicationJson", "PlaceOrder200ApplicationXml"]
    );
    assert_eq!(order.response.success_type(), IrType::Ref("Order".to_string()));
}

#[test]
fn explode_requires_array_and_flag() {
    let default = records(PETSTORE, &TargetConfig::default());
    assert!(find(&default, "listPets").query_params.iter().all(|p| !p.explode));

    let target = TargetConfig {
        explode_arrays: true,
        ..TargetConfig::default()
    };
    let exploded = records(PETSTORE, &target);
    let list = find(&exploded, "listPets");
    let flags: Vec<(&str, bool)> = list
        .query_params
        .iter()
        .map(|p| (p.original_name.as_str(), p.explode))
        .collect();
    assert_eq!(flags, vec![("limit", false), ("tags", true)]);
}

#[test]
fn tag_filters_and_overrides() {
    let mut target = TargetConfig::default();
    target.filters.tags = vec!["store".to_string()];
    target.overrides.operations.insert(
        "placeOrder".to_string(),
        OperationOverride {
            mutator: Some(MutatorConfig {
                path: "./instance".to_string(),
                name: "customInstance".to_string(),
                default: false,
            }),
            explode_arrays: None,
        },
    );
    let records = records(PETSTORE, &target);
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].mutator.as_ref().map(|m| m.name.as_str()),
        Some("customInstance")
    );
}

#[test]
fn route_based_naming_with_alias() {
    let mut target = TargetConfig::default();
    target.naming.strategy = NamingStrategy::UseRouteBased;
    let records = records(PETSTORE, &target);
    let first = &records[0].name.camel_case;
    target.naming.aliases.insert(
        apigen_core::transform::name_normalizer::route_to_name("GET", "/pets"),
        "fetchAllPets".to_string(),
    );
    let aliased = self::records(PETSTORE, &target);
    assert_eq!(first, "getPets");
    assert_eq!(aliased[0].name.camel_case, "fetchAllPets");
}

#[test]
fn colliding_names_in_one_unit_are_rejected() {
    let records = records(COLLISION, &TargetConfig::default());
    let units: Vec<OutputUnit> = plan_units(&records, OutputMode::Tags, "Collisions", "collisions");
    let err: NamingCollisionError = check_collisions(&records, &units[0]).unwrap_err();
    assert_eq!(err.name, "listPets");
    assert_eq!(err.first, "GET /pets");
    assert_eq!(err.second, "GET /v2/pets");
}
