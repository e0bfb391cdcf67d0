use apigen_core::error::ResolveError;
use apigen_core::parse;
use apigen_core::parse::document::Referenced;
use apigen_core::resolve::{ReachabilitySet, resolve_spec};

const PETSTORE: &str = include_str!("fixtures/petstore.yaml");
const POLYMORPHIC: &str = include_str!("fixtures/petstore-polymorphic.yaml");

#[test]
fn component_references_are_inlined() {
    let spec = parse::from_yaml(PETSTORE).unwrap();
    let resolved = resolve_spec(&spec).unwrap();

    let get = resolved.spec.paths["/pets"].get.as_ref().unwrap();
    match &get.parameters[0] {
        Referenced::Item(p) => assert_eq!(p.name, "limit"),
        Referenced::Ref { .. } => panic!("parameter reference should be inlined"),
    }

    let components = resolved.spec.components.as_ref().unwrap();
    assert!(components.schemas.is_empty());
    assert!(components.parameters.is_empty());
    assert_eq!(resolved.arena.len(), 7);
}

#[test]
fn reachability_skips_unused_schemas() {
    let spec = parse::from_yaml(PETSTORE).unwrap();
    let resolved = resolve_spec(&spec).unwrap();
    let from_pets = ReachabilitySet::from_name(&resolved.arena, "Pets");
    assert_eq!(from_pets.iter().collect::<Vec<_>>(), vec!["Pet", "PetStatus"]);
    assert!(!from_pets.contains("Unused"));
}

#[test]
fn discriminator_values_are_injected_into_subtypes() {
    let spec = parse::from_yaml(POLYMORPHIC).unwrap();
    let resolved = resolve_spec(&spec).unwrap();

    let values = |name: &str| -> Vec<String> {
        let (_, schema) = resolved.arena.concrete(name).unwrap();
        let prop = schema.properties["petType"].as_schema().unwrap();
        assert!(schema.required.iter().filter(|r| *r == "petType").count() == 1);
        prop.enum_values
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect()
    };
    assert_eq!(values("Cat"), vec!["cat"]);
    assert_eq!(values("Dog"), vec!["dog", "hound"]);

    let lizard = resolved.arena.concrete("Lizard").unwrap().1;
    assert!(!lizard.properties.contains_key("petType"));
}

#[test]
fn resolution_is_stable_across_runs() {
    let spec = parse::from_yaml(POLYMORPHIC).unwrap();
    let first = resolve_spec(&spec).unwrap();
    let second = resolve_spec(&spec).unwrap();
    let names = |r: &apigen_core::resolve::ResolvedSpec| {
        r.arena.names().map(String::from).collect::<Vec<_>>()
    };
    assert_eq!(names(&first), names(&second));
    assert_eq!(
        first.arena.get("Dog").unwrap(),
        second.arena.get("Dog").unwrap()
    );
}

#[test]
fn dangling_reference_reports_location() {
    let yaml = r#"
openapi: 3.0.3
info: { title: Broken, version: 1.0.0 }
paths:
  /pets:
    get:
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema: { $ref: '#/components/schemas/Missing' }
"#;
    let spec = parse::from_yaml(yaml).unwrap();
    let err = resolve_spec(&spec).unwrap_err();
    match err {
        ResolveError::RefTargetNotFound {
            reference,
            location,
        } => {
            assert_eq!(reference, "#/components/schemas/Missing");
            assert_eq!(
                location,
                "#/paths/~1pets/get/responses/200/content/application~1json/schema"
            );
        }
        other => panic!("unexpected error: {other}"),
    }
}
