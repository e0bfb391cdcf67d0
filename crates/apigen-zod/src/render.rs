use apigen_core::typescript::property_key;

use crate::ast::{ZodArg, ZodValidator};

/// Render the call chain of `validator` as a TypeScript expression.
pub fn render_expression(validator: &ZodValidator) -> String {
    chain(validator, 0)
}

/// `export const <name> = <expr>;`, preceded by every hoisted constant it references.
pub fn render_declaration(name: &str, validator: &ZodValidator) -> String {
    let assignment = format!("export const {name} = {};", render_expression(validator));
    if validator.consts.is_empty() {
        return assignment;
    }
    format!("{}\n\n{assignment}", validator.consts.join("\n"))
}

fn chain(validator: &ZodValidator, depth: usize) -> String {
    let mut out = String::new();
    for (i, (name, arg)) in validator.functions.iter().enumerate() {
        if let ZodArg::Identifier = arg {
            if i > 0 {
                out.push('.');
            }
            out.push_str(name);
            continue;
        }
        out.push_str(if i == 0 { "zod." } else { "." });
        out.push_str(name);
        out.push('(');
        out.push_str(&argument(arg, depth));
        out.push(')');
    }
    out
}

fn argument(arg: &ZodArg, depth: usize) -> String {
    match arg {
        ZodArg::None | ZodArg::Identifier => String::new(),
        ZodArg::Raw(text) => text.clone(),
        ZodArg::Validator(v) => chain(v, depth),
        ZodArg::Args(items) => items
            .iter()
            .map(|v| chain(v, depth))
            .collect::<Vec<_>>()
            .join(", "),
        ZodArg::Array(items) => format!(
            "[{}]",
            items
                .iter()
                .map(|v| chain(v, depth))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        ZodArg::Object(fields) if fields.is_empty() => "{}".to_string(),
        ZodArg::Object(fields) => {
            let indent = "  ".repeat(depth + 1);
            let mut out = String::from("{\n");
            for (key, v) in fields {
                out.push_str(&format!(
                    "{indent}{}: {},\n",
                    property_key(key),
                    chain(v, depth + 1)
                ));
            }
            out.push_str(&"  ".repeat(depth));
            out.push('}');
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consts_precede_assignment() {
        let mut v = ZodValidator::call("number")
            .then("min", ZodArg::Raw("RangeSchemaMin".into()))
            .then("max", ZodArg::Raw("RangeSchemaMax".into()));
        v.add_const("RangeSchemaMin", 2);
        v.add_const("RangeSchemaMax", 10);
        insta::assert_snapshot!(render_declaration("RangeSchema", &v), @r"
        export const RangeSchemaMin = 2;
        export const RangeSchemaMax = 10;

        export const RangeSchema = zod.number().min(RangeSchemaMin).max(RangeSchemaMax);
        ");
    }

    #[test]
    fn test_nested_objects_indent() {
        let inner = ZodValidator::with(
            "object",
            ZodArg::Object(vec![("x-id".into(), ZodValidator::call("string"))]),
        );
        let v = ZodValidator::with(
            "object",
            ZodArg::Object(vec![
                ("inner".into(), inner.then("optional", ZodArg::None)),
                (
                    "tags".into(),
                    ZodValidator::with("array", ZodArg::Validator(Box::new(ZodValidator::call("string")))),
                ),
            ]),
        )
        .then("strict", ZodArg::None);
        insta::assert_snapshot!(render_expression(&v), @r"
        zod.object({
          inner: zod.object({
            'x-id': zod.string(),
          }).optional(),
          tags: zod.array(zod.string()),
        }).strict()
        ");
    }

    #[test]
    fn test_identifiers_and_lists() {
        let v = ZodValidator::with(
            "union",
            ZodArg::Array(vec![
                ZodValidator::identifier("Cat"),
                ZodValidator::with("lazy", ZodArg::Raw("() => Dog".into())),
            ]),
        );
        assert_eq!(render_expression(&v), "zod.union([Cat, zod.lazy(() => Dog)])");
        let record = ZodValidator::with(
            "record",
            ZodArg::Args(vec![ZodValidator::call("string"), ZodValidator::call("any")]),
        );
        assert_eq!(render_expression(&record), "zod.record(zod.string(), zod.any())");
    }
}
