//! Translation of OpenAPI schemas into [`ZodValidator`] chains.

use std::collections::{BTreeSet, HashSet};

use apigen_core::config::{CoerceSetting, CoerceType, ZodConfig};
use apigen_core::error::GeneratorError;
use apigen_core::parse::schema::{
    AdditionalProperties, ExclusiveBound, Schema, SchemaOrRef, SchemaType, TypeSet,
};
use apigen_core::resolve::{Deref, ReachabilitySet, SchemaArena, schema_ref_name};
use apigen_core::transform::name_normalizer::normalize_name;
use log::warn;
use serde_json::Value;

use crate::ast::{ZodArg, ZodValidator};
use crate::version::ZodMajor;

/// Where a validator runs. Strictness and coercion are configured per site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    Param,
    Query,
    Header,
    Body,
    Response,
    /// Named component models. Never strict, never coerced.
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZodOptions {
    pub major: ZodMajor,
    pub strict: bool,
    pub coerce: CoerceSetting,
}

impl ZodOptions {
    pub fn for_site(config: &ZodConfig, site: Site) -> Self {
        let (strict, coerce) = match site {
            Site::Param => (config.strict.param, config.coerce.param.clone()),
            Site::Query => (config.strict.query, config.coerce.query.clone()),
            Site::Header => (config.strict.header, config.coerce.header.clone()),
            Site::Body => (config.strict.body, config.coerce.body.clone()),
            Site::Response => (config.strict.response, config.coerce.response.clone()),
            Site::Model => (false, CoerceSetting::default()),
        };
        Self {
            major: ZodMajor::detect(config.version.as_deref()),
            strict,
            coerce,
        }
    }
}

/// How `$ref`s are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefStyle {
    /// Expand the referenced schema in place. Cycles degrade to `zod.any()`.
    Inline,
    /// Refer to the exported model of that name.
    ///
    /// `current` is the model being declared, if any. References that would be read
    /// before initialization (self, cycles, later entries of a shared file) go through
    /// `zod.lazy`.
    Named {
        current: Option<String>,
        shared_file: bool,
    },
}

pub struct ZodGenerator<'a> {
    arena: &'a SchemaArena,
    options: ZodOptions,
    refs: RefStyle,
    in_progress: HashSet<String>,
    imports: BTreeSet<String>,
    recursive: bool,
}

impl<'a> ZodGenerator<'a> {
    pub fn new(arena: &'a SchemaArena, options: ZodOptions, refs: RefStyle) -> Self {
        Self {
            arena,
            options,
            refs,
            in_progress: HashSet::new(),
            imports: BTreeSet::new(),
            recursive: false,
        }
    }

    /// Model identifiers referenced so far.
    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    /// Whether a reference leads back to the model being declared.
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Validator for `schema`. `name` prefixes every hoisted constant.
    pub fn generate(
        &mut self,
        schema: &SchemaOrRef,
        name: &str,
        required: bool,
    ) -> Result<ZodValidator, GeneratorError> {
        match schema {
            SchemaOrRef::Schema(s) => self.schema(s, name, required),
            SchemaOrRef::Ref { ref_path } => match self.refs {
                RefStyle::Named { .. } => Ok(optional(self.named(ref_path)?, required)),
                RefStyle::Inline => self.inline(schema, name, required),
            },
        }
    }

    /// Object validator built from loose fields, e.g. an operation's query parameters.
    pub fn object_of(
        &mut self,
        fields: &[(String, Option<&SchemaOrRef>, bool)],
        name: &str,
    ) -> Result<ZodValidator, GeneratorError> {
        let mut v = ZodValidator::default();
        let mut props = Vec::with_capacity(fields.len());
        for (key, schema, required) in fields {
            let prop_name = format!("{name}{}", normalize_name(key).pascal_case);
            let prop = match schema {
                Some(schema) => self.generate(schema, &prop_name, *required)?,
                None => optional(ZodValidator::call("any"), *required),
            };
            props.push((key.clone(), v.adopt(prop)));
        }
        match (self.options.strict, self.options.major) {
            (true, ZodMajor::V3) => {
                v.push("object", ZodArg::Object(props));
                v.push("strict", ZodArg::None);
            }
            (true, ZodMajor::V4) => v.push("strictObject", ZodArg::Object(props)),
            (false, _) => v.push("object", ZodArg::Object(props)),
        }
        Ok(v)
    }

    fn named(&mut self, ref_path: &str) -> Result<ZodValidator, GeneratorError> {
        let target = schema_ref_name(ref_path)
            .ok_or_else(|| GeneratorError::Unsupported(format!("reference {ref_path}")))?;
        let ident = normalize_name(&target).pascal_case;
        self.imports.insert(ident.clone());
        if self.is_lazy(&target) {
            Ok(ZodValidator::with(
                "lazy",
                ZodArg::Raw(format!("() => {ident}")),
            ))
        } else {
            Ok(ZodValidator::identifier(ident))
        }
    }

    fn is_lazy(&mut self, target: &str) -> bool {
        let RefStyle::Named {
            current: Some(current),
            shared_file,
        } = &self.refs
        else {
            return false;
        };
        if target == current || ReachabilitySet::from_name(self.arena, target).contains(current) {
            self.recursive = true;
            return true;
        }
        *shared_file && normalize_name(target).pascal_case > normalize_name(current).pascal_case
    }

    fn inline(
        &mut self,
        schema: &SchemaOrRef,
        name: &str,
        required: bool,
    ) -> Result<ZodValidator, GeneratorError> {
        let arena = self.arena;
        match arena.deref(schema, &self.in_progress)? {
            Deref::Cycle(target) => {
                warn!("cyclic reference to {target} cannot be expanded inline, validating as any");
                Ok(optional(ZodValidator::call("any"), required))
            }
            Deref::Schema {
                name: entry,
                schema: concrete,
            } => {
                let entered = entry.is_some_and(|e| self.in_progress.insert(e.to_string()));
                let result = self.schema(concrete, name, required);
                if entered && let Some(e) = entry {
                    self.in_progress.remove(e);
                }
                result
            }
        }
    }

    fn schema(
        &mut self,
        s: &Schema,
        name: &str,
        required: bool,
    ) -> Result<ZodValidator, GeneratorError> {
        let mut v = self.base(s, name)?;
        let nullable = s.is_nullable() || s.enum_values.iter().any(Value::is_null);
        match (nullable, required) {
            (true, false) => v.push("nullish", ZodArg::None),
            (true, true) => v.push("nullable", ZodArg::None),
            (false, false) if s.default_value.is_none() => v.push("optional", ZodArg::None),
            _ => {}
        }
        if let Some(default) = &s.default_value {
            let const_name = format!("{name}Default");
            v.add_const(&const_name, default);
            v.push("default", ZodArg::Raw(const_name));
        }
        Ok(v)
    }

    fn base(&mut self, s: &Schema, name: &str) -> Result<ZodValidator, GeneratorError> {
        if !s.one_of.is_empty() {
            return self.union(&s.one_of, name);
        }
        if !s.any_of.is_empty() {
            return self.union(&s.any_of, name);
        }
        if !s.all_of.is_empty() {
            return self.intersection(s, name);
        }
        if !s.enum_values.is_empty() {
            return Ok(enumeration(&s.enum_values));
        }
        if let Some(value) = &s.const_value {
            return Ok(literal(value));
        }

        match &s.schema_type {
            Some(TypeSet::Single(t)) => self.typed(s, t, name),
            Some(TypeSet::Multiple(types)) => {
                let non_null: Vec<&SchemaType> =
                    types.iter().filter(|t| **t != SchemaType::Null).collect();
                match non_null.as_slice() {
                    [] => Ok(ZodValidator::call("null")),
                    [t] => self.typed(s, t, name),
                    many => {
                        let members = many
                            .iter()
                            .map(|t| self.typed(s, t, name))
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(union_of(members))
                    }
                }
            }
            None if !s.properties.is_empty() || s.additional_properties.is_some() => {
                self.object(s, name)
            }
            None if s.items.is_some() => self.array(s, name),
            None => Ok(ZodValidator::call("any")),
        }
    }

    fn typed(
        &mut self,
        s: &Schema,
        t: &SchemaType,
        name: &str,
    ) -> Result<ZodValidator, GeneratorError> {
        match t {
            SchemaType::String => Ok(self.string(s, name)),
            SchemaType::Number | SchemaType::Integer => Ok(self.number(s, name)),
            SchemaType::Boolean => Ok(ZodValidator::call(
                self.coerced("boolean", CoerceType::Boolean),
            )),
            SchemaType::Null => Ok(ZodValidator::call("null")),
            SchemaType::Array => self.array(s, name),
            SchemaType::Object => self.object(s, name),
        }
    }

    fn coerced(&self, base: &str, ty: CoerceType) -> String {
        if self.options.coerce.applies_to(ty) {
            format!("coerce.{base}")
        } else {
            base.to_string()
        }
    }

    fn string(&self, s: &Schema, name: &str) -> ZodValidator {
        let v3 = self.options.major == ZodMajor::V3;
        let string = || ZodValidator::call(self.coerced("string", CoerceType::String));
        let mut v = match s.format.as_deref() {
            Some("binary") => return ZodValidator::with("instanceof", ZodArg::Raw("File".into())),
            Some("date-time" | "date") if self.options.coerce.applies_to(CoerceType::Date) => {
                return ZodValidator::call("coerce.date");
            }
            Some(f @ ("date-time" | "date" | "time")) => {
                let check = if f == "date-time" { "datetime" } else { f };
                if v3 {
                    string().then(check, ZodArg::None)
                } else {
                    ZodValidator::call(format!("iso.{check}"))
                }
            }
            Some(f @ ("email" | "uuid" | "uri" | "url")) => {
                let check = if f == "uri" { "url" } else { f };
                if v3 {
                    string().then(check, ZodArg::None)
                } else {
                    ZodValidator::call(check)
                }
            }
            _ => string(),
        };

        if let Some(min) = s.min_length {
            bound(&mut v, name, "MinLength", "min", min);
        }
        if let Some(max) = s.max_length {
            bound(&mut v, name, "MaxLength", "max", max);
        }
        if let Some(pattern) = &s.pattern {
            let const_name = format!("{name}RegExp");
            v.add_const(&const_name, format!("new RegExp({})", js_string(pattern)));
            v.push("regex", ZodArg::Raw(const_name));
        }
        v
    }

    fn number(&self, s: &Schema, name: &str) -> ZodValidator {
        if s.format.as_deref() == Some("int64")
            && self.options.coerce.applies_to(CoerceType::Bigint)
        {
            return ZodValidator::call("coerce.bigint");
        }
        let mut v = ZodValidator::call(self.coerced("number", CoerceType::Number));
        match (s.minimum, s.exclusive_minimum) {
            (_, Some(ExclusiveBound::Value(min))) => {
                bound(&mut v, name, "ExclusiveMin", "gt", number_literal(min));
            }
            (Some(min), Some(ExclusiveBound::Flag(true))) => {
                bound(&mut v, name, "Min", "gt", number_literal(min));
            }
            (Some(min), _) => bound(&mut v, name, "Min", "min", number_literal(min)),
            (None, _) => {}
        }
        match (s.maximum, s.exclusive_maximum) {
            (_, Some(ExclusiveBound::Value(max))) => {
                bound(&mut v, name, "ExclusiveMax", "lt", number_literal(max));
            }
            (Some(max), Some(ExclusiveBound::Flag(true))) => {
                bound(&mut v, name, "Max", "lt", number_literal(max));
            }
            (Some(max), _) => bound(&mut v, name, "Max", "max", number_literal(max)),
            (None, _) => {}
        }
        if let Some(step) = s.multiple_of {
            bound(&mut v, name, "MultipleOf", "multipleOf", number_literal(step));
        }
        v
    }

    fn array(&mut self, s: &Schema, name: &str) -> Result<ZodValidator, GeneratorError> {
        let items = match &s.items {
            Some(items) => self.generate(items, &format!("{name}Item"), true)?,
            None => ZodValidator::call("any"),
        };
        let mut v = ZodValidator::default();
        let items = v.adopt(items);
        v.push("array", ZodArg::Validator(Box::new(items)));
        if let Some(min) = s.min_items {
            bound(&mut v, name, "MinItems", "min", min);
        }
        if let Some(max) = s.max_items {
            bound(&mut v, name, "MaxItems", "max", max);
        }
        Ok(v)
    }

    fn object(&mut self, s: &Schema, name: &str) -> Result<ZodValidator, GeneratorError> {
        if s.properties.is_empty() {
            let value = match &s.additional_properties {
                Some(AdditionalProperties::Bool(false)) => return self.object_of(&[], name),
                Some(AdditionalProperties::Schema(value)) => {
                    self.generate(value, &format!("{name}Value"), true)?
                }
                Some(AdditionalProperties::Bool(true)) | None => ZodValidator::call("any"),
            };
            let mut v = ZodValidator::default();
            let value = v.adopt(value);
            v.push(
                "record",
                ZodArg::Args(vec![ZodValidator::call("string"), value]),
            );
            return Ok(v);
        }

        let fields: Vec<(String, Option<&SchemaOrRef>, bool)> = s
            .properties
            .iter()
            .map(|(key, prop)| (key.clone(), Some(prop), s.required.contains(key)))
            .collect();
        self.object_of(&fields, name)
    }

    fn union(
        &mut self,
        members: &[SchemaOrRef],
        name: &str,
    ) -> Result<ZodValidator, GeneratorError> {
        let members = members
            .iter()
            .enumerate()
            .map(|(i, m)| self.generate(m, &format!("{name}Option{}", i + 1), true))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(union_of(members))
    }

    /// `allOf` as `.and()` chains. Parts are never strict, they would reject each other's keys.
    fn intersection(&mut self, s: &Schema, name: &str) -> Result<ZodValidator, GeneratorError> {
        let strict = std::mem::replace(&mut self.options.strict, false);
        let parts = self.intersection_parts(s, name);
        self.options.strict = strict;

        let mut v = ZodValidator::default();
        let mut parts = parts?.into_iter();
        if let Some(first) = parts.next() {
            v.functions = v.adopt(first).functions;
        }
        for part in parts {
            let part = v.adopt(part);
            v.push("and", ZodArg::Validator(Box::new(part)));
        }
        Ok(v)
    }

    fn intersection_parts(
        &mut self,
        s: &Schema,
        name: &str,
    ) -> Result<Vec<ZodValidator>, GeneratorError> {
        let mut parts = Vec::with_capacity(s.all_of.len() + 1);
        for (i, member) in s.all_of.iter().enumerate() {
            parts.push(self.generate(member, &format!("{name}Part{}", i + 1), true)?);
        }
        if !s.properties.is_empty() {
            parts.push(self.object(s, name)?);
        }
        Ok(parts)
    }
}

fn optional(v: ZodValidator, required: bool) -> ZodValidator {
    if required {
        v
    } else {
        v.then("optional", ZodArg::None)
    }
}

/// Hoist `value` into `<name><suffix>` and pass it to `call`.
fn bound(
    v: &mut ZodValidator,
    name: &str,
    suffix: &str,
    call: &str,
    value: impl std::fmt::Display,
) {
    let const_name = format!("{name}{suffix}");
    v.add_const(&const_name, value);
    v.push(call, ZodArg::Raw(const_name));
}

fn union_of(mut members: Vec<ZodValidator>) -> ZodValidator {
    if members.len() == 1 {
        return members.remove(0);
    }
    let mut v = ZodValidator::default();
    let members = members.into_iter().map(|m| v.adopt(m)).collect();
    v.push("union", ZodArg::Array(members));
    v
}

fn enumeration(values: &[Value]) -> ZodValidator {
    let non_null: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
    if non_null.is_empty() {
        return ZodValidator::call("null");
    }
    if non_null.iter().all(|v| v.is_string()) {
        let list: Vec<String> = non_null
            .iter()
            .filter_map(|v| v.as_str())
            .map(js_string)
            .collect();
        return ZodValidator::with("enum", ZodArg::Raw(format!("[{}]", list.join(", "))));
    }
    union_of(non_null.into_iter().map(literal).collect())
}

fn literal(value: &Value) -> ZodValidator {
    let text = match value {
        Value::String(s) => js_string(s),
        other => other.to_string(),
    };
    ZodValidator::with("literal", ZodArg::Raw(text))
}

fn js_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// `2.0` renders as `2`.
fn number_literal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
