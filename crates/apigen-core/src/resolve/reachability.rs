use std::collections::{BTreeSet, VecDeque};

use super::SchemaArena;
use super::refs::schema_ref_name;
use super::walk::{for_each_inline, subschemas};
use crate::parse::schema::{Schema, SchemaOrRef};

/// Names of arena schemas transitively referenced from a set of root schemas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachabilitySet {
    names: BTreeSet<String>,
}

impl ReachabilitySet {
    /// Walk every composition surface below `roots`, following references into the arena.
    /// Each name is expanded at most once, so cycles terminate.
    pub fn from_roots<'a>(
        arena: &SchemaArena,
        roots: impl IntoIterator<Item = &'a SchemaOrRef>,
    ) -> Self {
        let mut queue: VecDeque<String> = VecDeque::new();
        for root in roots {
            collect_refs(root, &mut queue);
        }

        let mut names = BTreeSet::new();
        while let Some(name) = queue.pop_front() {
            if names.contains(&name) {
                continue;
            }
            let Some(schema) = arena.get(&name) else {
                continue;
            };
            names.insert(name);
            collect_refs(schema, &mut queue);
        }

        Self { names }
    }

    /// Schemas reachable from the named schema, excluding itself unless it is cyclic.
    pub fn from_name(arena: &SchemaArena, name: &str) -> Self {
        match arena.get(name) {
            Some(schema) => Self::from_roots(arena, [schema]),
            None => Self::default(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Push every schema name referenced by `root` or its inline descendants.
fn collect_refs(root: &SchemaOrRef, queue: &mut VecDeque<String>) {
    if let SchemaOrRef::Ref { ref_path } = root {
        queue.extend(schema_ref_name(ref_path));
        return;
    }
    for_each_inline(root, &mut |schema: &Schema| {
        for child in subschemas(schema) {
            if let SchemaOrRef::Ref { ref_path } = child {
                queue.extend(schema_ref_name(ref_path));
            }
        }
        if let Some(discriminator) = &schema.discriminator {
            for target in discriminator.mapping.values() {
                match schema_ref_name(target) {
                    Some(name) => queue.push_back(name),
                    None if !target.contains('/') => queue.push_back(target.clone()),
                    None => {}
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::schema::{AdditionalProperties, Discriminator, SchemaType, TypeSet};
    use indexmap::IndexMap;

    fn object_with(props: &[(&str, SchemaOrRef)]) -> SchemaOrRef {
        let mut schema = Schema {
            schema_type: Some(TypeSet::Single(SchemaType::Object)),
            ..Schema::default()
        };
        for (name, prop) in props {
            schema.properties.insert(name.to_string(), prop.clone());
        }
        SchemaOrRef::inline(schema)
    }

    fn arena(entries: Vec<(&str, SchemaOrRef)>) -> SchemaArena {
        SchemaArena::new(
            entries
                .into_iter()
                .map(|(n, s)| (n.to_string(), s))
                .collect::<IndexMap<_, _>>(),
        )
    }

    #[test]
    fn test_follows_nested_surfaces() {
        let arena = arena(vec![
            (
                "Order",
                object_with(&[(
                    "lines",
                    SchemaOrRef::inline(Schema {
                        items: Some(Box::new(SchemaOrRef::reference("Line"))),
                        ..Schema::default()
                    }),
                )]),
            ),
            (
                "Line",
                SchemaOrRef::inline(Schema {
                    additional_properties: Some(AdditionalProperties::Schema(Box::new(
                        SchemaOrRef::reference("Meta"),
                    ))),
                    not: Some(Box::new(SchemaOrRef::reference("Forbidden"))),
                    ..Schema::default()
                }),
            ),
            ("Meta", object_with(&[])),
            ("Forbidden", object_with(&[])),
            ("Unused", object_with(&[])),
        ]);
        let reach = ReachabilitySet::from_roots(&arena, [&SchemaOrRef::reference("Order")]);
        let names: Vec<&str> = reach.iter().collect();
        assert_eq!(names, vec!["Forbidden", "Line", "Meta", "Order"]);
        assert!(!reach.contains("Unused"));
    }

    #[test]
    fn test_cycles_terminate() {
        let arena = arena(vec![
            ("Node", object_with(&[("next", SchemaOrRef::reference("Node"))])),
            ("Tree", object_with(&[("root", SchemaOrRef::reference("Node"))])),
        ]);
        let reach = ReachabilitySet::from_name(&arena, "Node");
        assert_eq!(reach.len(), 1);
        assert!(reach.contains("Node"));
        assert!(!ReachabilitySet::from_name(&arena, "Tree").contains("Tree"));
    }

    #[test]
    fn test_discriminator_targets_are_reachable() {
        let pet = Schema {
            discriminator: Some(Discriminator {
                property_name: "kind".to_string(),
                mapping: [("cat".to_string(), "Cat".to_string())]
                    .into_iter()
                    .collect(),
            }),
            ..Schema::default()
        };
        let arena = arena(vec![
            ("Pet", SchemaOrRef::inline(pet)),
            ("Cat", object_with(&[])),
        ]);
        let reach = ReachabilitySet::from_roots(&arena, [&SchemaOrRef::reference("Pet")]);
        assert!(reach.contains("Cat"));
    }
}
