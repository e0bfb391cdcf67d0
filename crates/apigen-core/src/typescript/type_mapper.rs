use std::fmt::{self, Write};

use crate::ir::IrType;

/// Render an `IrType` as a TypeScript type expression.
pub fn ir_type_to_ts(ir_type: &IrType) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_type(&mut out, ir_type);
    out
}

fn write_type(out: &mut String, ty: &IrType) -> fmt::Result {
    match ty {
        IrType::String | IrType::DateTime => out.write_str("string"),
        IrType::Number | IrType::Integer => out.write_str("number"),
        IrType::Boolean => out.write_str("boolean"),
        IrType::Null => out.write_str("null"),
        IrType::Binary => out.write_str("Blob"),
        IrType::Any => out.write_str("unknown"),
        IrType::Void => out.write_str("void"),
        IrType::Ref(name) => out.write_str(name),
        IrType::StringLiteral(s) => {
            write!(out, "'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
        }
        IrType::Array(inner) => {
            write_grouped(out, inner)?;
            out.write_str("[]")
        }
        IrType::Map(value) => {
            out.write_str("Record<string, ")?;
            write_type(out, value)?;
            out.write_char('>')
        }
        IrType::Object(fields) if fields.is_empty() => out.write_str("Record<string, unknown>"),
        IrType::Object(fields) => {
            out.write_str("{ ")?;
            for (i, (name, field_ty, required)) in fields.iter().enumerate() {
                if i > 0 {
                    out.write_str("; ")?;
                }
                let mark = if *required { "" } else { "?" };
                write!(out, "{}{mark}: ", property_key(name))?;
                write_type(out, field_ty)?;
            }
            out.write_str(" }")
        }
        IrType::Union(members) => write_joined(out, members, " | ", false),
        IrType::Intersection(members) => write_joined(out, members, " & ", true),
    }
}

fn write_joined(out: &mut String, members: &[IrType], sep: &str, group: bool) -> fmt::Result {
    for (i, member) in members.iter().enumerate() {
        if i > 0 {
            out.write_str(sep)?;
        }
        if group {
            write_grouped(out, member)?;
        } else {
            write_type(out, member)?;
        }
    }
    Ok(())
}

/// Parenthesize compound types where precedence would otherwise change the meaning.
fn write_grouped(out: &mut String, ty: &IrType) -> fmt::Result {
    match ty {
        IrType::Union(v) | IrType::Intersection(v) if v.len() > 1 => {
            out.write_char('(')?;
            write_type(out, ty)?;
            out.write_char(')')
        }
        _ => write_type(out, ty),
    }
}

/// Object key as written in a type literal: bare when it is a valid identifier.
pub fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if valid {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "\\'"))
    }
}
