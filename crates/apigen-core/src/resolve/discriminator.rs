use std::collections::HashSet;

use log::debug;

use super::SchemaArena;
use super::refs::schema_ref_name;
use super::walk::for_each_inline;
use crate::error::ResolveError;
use crate::parse::schema::{Schema, SchemaOrRef, SchemaType, TypeSet};

/// One `mapping` entry of a discriminator found somewhere in the arena.
#[derive(Debug, Clone)]
struct MappingEntry {
    owner: String,
    property: String,
    key: String,
    target: String,
}

/// Merge every discriminator mapping into its subtype schema.
///
/// Each target gains a required string property named after the discriminator whose
/// enum holds the mapping key. When several keys (or several discriminators) land on
/// the same target property, their keys are unioned in first-seen order.
/// Returns the number of (target, property) pairs written.
pub fn inject_discriminators(arena: &mut SchemaArena) -> Result<usize, ResolveError> {
    let entries = collect_mappings(arena);
    let mut written: HashSet<(String, String)> = HashSet::new();

    for entry in entries {
        let target = resolve_target(arena, &entry)?;
        let Some(SchemaOrRef::Schema(schema)) = arena.get_mut(&target) else {
            return Err(ResolveError::InvalidDiscriminatorTarget {
                schema: entry.owner,
                key: entry.key,
                target: entry.target,
            });
        };

        let first = written.insert((target.clone(), entry.property.clone()));
        inject_property(schema, &entry.property, &entry.key, first);
        debug!(
            "discriminator {}.{} = {} injected into {target}",
            entry.owner, entry.property, entry.key
        );
    }

    Ok(written.len())
}

fn collect_mappings(arena: &SchemaArena) -> Vec<MappingEntry> {
    let mut entries = Vec::new();
    for (name, schema) in arena.iter() {
        for_each_inline(schema, &mut |s: &Schema| {
            if let Some(discriminator) = &s.discriminator {
                for (key, target) in &discriminator.mapping {
                    entries.push(MappingEntry {
                        owner: name.clone(),
                        property: discriminator.property_name.clone(),
                        key: key.clone(),
                        target: target.clone(),
                    });
                }
            }
        });
    }
    entries
}

/// Name of the concrete arena schema a mapping target designates.
///
/// Targets may be full references or bare schema names. Aliases are followed.
fn resolve_target(arena: &SchemaArena, entry: &MappingEntry) -> Result<String, ResolveError> {
    let name = schema_ref_name(&entry.target)
        .or_else(|| {
            (!entry.target.contains('/') && arena.contains(&entry.target))
                .then(|| entry.target.clone())
        })
        .filter(|name| arena.contains(name))
        .ok_or_else(|| ResolveError::InvalidDiscriminatorTarget {
            schema: entry.owner.clone(),
            key: entry.key.clone(),
            target: entry.target.clone(),
        })?;
    let (concrete, _) = arena.concrete(&name)?;
    Ok(concrete.to_string())
}

fn inject_property(schema: &mut Schema, property: &str, key: &str, first: bool) {
    let value = serde_json::Value::String(key.to_string());
    let existing = schema.properties.get_mut(property);

    match existing {
        Some(SchemaOrRef::Schema(prop)) if !first => {
            if !prop.enum_values.contains(&value) {
                prop.enum_values.push(value);
            }
        }
        _ => {
            schema.properties.insert(
                property.to_string(),
                SchemaOrRef::inline(Schema {
                    schema_type: Some(TypeSet::Single(SchemaType::String)),
                    enum_values: vec![value],
                    ..Schema::default()
                }),
            );
        }
    }

    if !schema.required.iter().any(|r| r == property) {
        schema.required.push(property.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::schema::Discriminator;
    use indexmap::IndexMap;

    fn object() -> Schema {
        Schema {
            schema_type: Some(TypeSet::Single(SchemaType::Object)),
            ..Schema::default()
        }
    }

    fn pet_arena(mapping: &[(&str, &str)]) -> SchemaArena {
        let pet = Schema {
            one_of: vec![SchemaOrRef::reference("Cat"), SchemaOrRef::reference("Dog")],
            discriminator: Some(Discriminator {
                property_name: "petType".to_string(),
                mapping: mapping
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            }),
            ..Schema::default()
        };
        let mut dog = object();
        dog.required.push("petType".to_string());
        dog.properties.insert(
            "petType".to_string(),
            SchemaOrRef::inline(Schema {
                schema_type: Some(TypeSet::Single(SchemaType::String)),
                ..Schema::default()
            }),
        );
        let mut schemas = IndexMap::new();
        schemas.insert("Pet".to_string(), SchemaOrRef::inline(pet));
        schemas.insert("Cat".to_string(), SchemaOrRef::inline(object()));
        schemas.insert("Dog".to_string(), SchemaOrRef::inline(dog));
        SchemaArena::new(schemas)
    }

    fn enum_of<'a>(arena: &'a SchemaArena, name: &str) -> (&'a Schema, Vec<String>) {
        let (_, schema) = arena.concrete(name).unwrap();
        let SchemaOrRef::Schema(prop) = &schema.properties["petType"] else {
            panic!("expected inline property");
        };
        let values = prop
            .enum_values
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
        (schema, values)
    }

    #[test]
    fn test_injects_enum_and_required() {
        let mut arena = pet_arena(&[
            ("cat", "#/components/schemas/Cat"),
            ("dog", "#/components/schemas/Dog"),
        ]);
        assert_eq!(inject_discriminators(&mut arena).unwrap(), 2);

        let (cat, values) = enum_of(&arena, "Cat");
        assert_eq!(values, vec!["cat"]);
        assert_eq!(cat.required, vec!["petType"]);

        let (dog, values) = enum_of(&arena, "Dog");
        assert_eq!(values, vec!["dog"]);
        assert_eq!(dog.required.iter().filter(|r| *r == "petType").count(), 1);
    }

    #[test]
    fn test_several_keys_for_one_target_are_unioned() {
        let mut arena = pet_arena(&[
            ("dog", "#/components/schemas/Dog"),
            ("hound", "Dog"),
            ("cat", "Cat"),
        ]);
        inject_discriminators(&mut arena).unwrap();
        let (_, values) = enum_of(&arena, "Dog");
        assert_eq!(values, vec!["dog", "hound"]);
    }

    #[test]
    fn test_injection_is_idempotent() {
        let mut arena = pet_arena(&[("cat", "Cat"), ("dog", "Dog")]);
        inject_discriminators(&mut arena).unwrap();
        let before = format!("{:?}", arena.get("Dog"));
        inject_discriminators(&mut arena).unwrap();
        assert_eq!(format!("{:?}", arena.get("Dog")), before);
    }

    #[test]
    fn test_unknown_target_is_rejected() {
        let mut arena = pet_arena(&[("bird", "#/components/schemas/Bird")]);
        let err = inject_discriminators(&mut arena).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::InvalidDiscriminatorTarget { ref key, .. } if key == "bird"
        ));
    }
}
