use apigen_core::parse;
use apigen_core::parse::document::Referenced;

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const POLYMORPHIC: &str = include_str!("fixtures/petstore-polymorphic.yaml");

#[test]
fn parse_petstore_yaml() {
    let spec = parse::from_yaml(PETSTORE).expect("should parse petstore");
    assert_eq!(spec.openapi, "3.0.3");
    assert_eq!(spec.info.title, "Petstore");
    assert_eq!(spec.paths.len(), 3);

    let components = spec.components.as_ref().expect("should have components");
    assert_eq!(components.schemas.len(), 7);
    assert_eq!(components.parameters.len(), 1);
    assert_eq!(components.responses.len(), 1);

    let pets = spec.paths.get("/pets").expect("should have /pets");
    let get = pets.get.as_ref().expect("should have GET");
    assert_eq!(get.operation_id.as_deref(), Some("listPets"));
    assert!(matches!(
        get.responses.get("default"),
        Some(Referenced::Ref { .. })
    ));
}

#[test]
fn parse_31_type_arrays() {
    let spec = parse::from_yaml(POLYMORPHIC).expect("should parse 3.1 spec");
    assert_eq!(spec.openapi, "3.1.0");
    let schemas = &spec.components.as_ref().unwrap().schemas;
    let cat = schemas.get("Cat").unwrap().as_schema().unwrap();
    assert!(cat.properties["huntingSkill"].as_schema().unwrap().is_nullable());
}

#[test]
fn parse_json_matches_yaml() {
    let value: serde_json::Value = serde_yaml_ng::from_str(PETSTORE).unwrap();
    let json = serde_json::to_string(&value).unwrap();
    let spec = parse::from_json(&json).expect("should parse JSON");
    assert_eq!(spec.paths.len(), 3);
}

#[test]
fn parse_invalid_version() {
    let yaml = r#"
openapi: "2.0.0"
info:
  title: Test
  version: "1.0"
paths: {}
"#;
    let err = parse::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("unsupported OpenAPI version"));
}
