use crate::parse::schema::{AdditionalProperties, Schema, SchemaOrRef};

/// Every direct sub-schema of `schema`, across all composition surfaces, in a stable order.
pub fn subschemas(schema: &Schema) -> Vec<&SchemaOrRef> {
    let mut out: Vec<&SchemaOrRef> = Vec::new();
    out.extend(schema.properties.values());
    if let Some(items) = &schema.items {
        out.push(items);
    }
    if let Some(AdditionalProperties::Schema(s)) = &schema.additional_properties {
        out.push(s);
    }
    out.extend(schema.all_of.iter());
    out.extend(schema.any_of.iter());
    out.extend(schema.one_of.iter());
    for boxed in [
        &schema.not,
        &schema.if_schema,
        &schema.then_schema,
        &schema.else_schema,
    ]
    .into_iter()
    .flatten()
    {
        out.push(boxed);
    }
    out.extend(schema.dependent_schemas.values());
    out.extend(schema.pattern_properties.values());
    out.extend(schema.definitions.values());
    out
}

/// Mutable counterpart of [`subschemas`], paired with the JSON pointer segment(s) of each child.
pub fn subschemas_mut(schema: &mut Schema) -> Vec<(String, &mut SchemaOrRef)> {
    let mut out: Vec<(String, &mut SchemaOrRef)> = Vec::new();
    for (name, s) in schema.properties.iter_mut() {
        out.push((format!("properties/{}", escape_pointer(name)), s));
    }
    if let Some(items) = schema.items.as_deref_mut() {
        out.push(("items".to_string(), items));
    }
    if let Some(AdditionalProperties::Schema(s)) = schema.additional_properties.as_mut() {
        out.push(("additionalProperties".to_string(), s.as_mut()));
    }
    for (i, s) in schema.all_of.iter_mut().enumerate() {
        out.push((format!("allOf/{i}"), s));
    }
    for (i, s) in schema.any_of.iter_mut().enumerate() {
        out.push((format!("anyOf/{i}"), s));
    }
    for (i, s) in schema.one_of.iter_mut().enumerate() {
        out.push((format!("oneOf/{i}"), s));
    }
    if let Some(s) = schema.not.as_deref_mut() {
        out.push(("not".to_string(), s));
    }
    if let Some(s) = schema.if_schema.as_deref_mut() {
        out.push(("if".to_string(), s));
    }
    if let Some(s) = schema.then_schema.as_deref_mut() {
        out.push(("then".to_string(), s));
    }
    if let Some(s) = schema.else_schema.as_deref_mut() {
        out.push(("else".to_string(), s));
    }
    for (name, s) in schema.dependent_schemas.iter_mut() {
        out.push((format!("dependentSchemas/{}", escape_pointer(name)), s));
    }
    for (name, s) in schema.pattern_properties.iter_mut() {
        out.push((format!("patternProperties/{}", escape_pointer(name)), s));
    }
    for (name, s) in schema.definitions.iter_mut() {
        out.push((format!("definitions/{}", escape_pointer(name)), s));
    }
    out
}

/// Visit `root` and every inline schema nested below it. References are not followed.
pub fn for_each_inline<'a>(root: &'a SchemaOrRef, f: &mut impl FnMut(&'a Schema)) {
    if let SchemaOrRef::Schema(schema) = root {
        f(schema);
        for child in subschemas(schema) {
            for_each_inline(child, f);
        }
    }
}

/// Escape a JSON pointer segment (`~` → `~0`, `/` → `~1`).
pub fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Reverse of [`escape_pointer`].
pub fn unescape_pointer(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::schema::SchemaType;
    use crate::parse::schema::TypeSet;

    #[test]
    fn test_subschemas_cover_all_surfaces() {
        let leaf = || SchemaOrRef::inline(Schema::default());
        let mut schema = Schema {
            items: Some(Box::new(leaf())),
            additional_properties: Some(AdditionalProperties::Schema(Box::new(leaf()))),
            all_of: vec![leaf()],
            any_of: vec![leaf()],
            one_of: vec![leaf()],
            not: Some(Box::new(leaf())),
            if_schema: Some(Box::new(leaf())),
            then_schema: Some(Box::new(leaf())),
            else_schema: Some(Box::new(leaf())),
            ..Schema::default()
        };
        schema.properties.insert("a".to_string(), leaf());
        schema.dependent_schemas.insert("b".to_string(), leaf());
        schema.pattern_properties.insert("^x-".to_string(), leaf());
        schema.definitions.insert("c".to_string(), leaf());
        assert_eq!(subschemas(&schema).len(), 13);
        assert_eq!(subschemas_mut(&mut schema).len(), 13);
    }

    #[test]
    fn test_for_each_inline_stops_at_refs() {
        let mut root = Schema {
            schema_type: Some(TypeSet::Single(SchemaType::Object)),
            ..Schema::default()
        };
        root.properties
            .insert("pet".to_string(), SchemaOrRef::reference("Pet"));
        root.properties.insert(
            "tags".to_string(),
            SchemaOrRef::inline(Schema {
                items: Some(Box::new(SchemaOrRef::inline(Schema::default()))),
                ..Schema::default()
            }),
        );
        let mut count = 0;
        for_each_inline(&SchemaOrRef::inline(root), &mut |_| count += 1);
        assert_eq!(count, 3);
    }

    #[test]
    fn test_pointer_escaping() {
        assert_eq!(escape_pointer("/pets/{id}"), "~1pets~1{id}");
        assert_eq!(unescape_pointer("~1pets~1{id}"), "/pets/{id}");
        assert_eq!(unescape_pointer(&escape_pointer("a~b/c")), "a~b/c");
    }
}
