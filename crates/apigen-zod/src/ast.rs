//! Intermediate form of a Zod expression before rendering.

/// A chain of Zod calls plus the hoisted constants the chain refers to.
///
/// `functions[0]` is called on `zod` (or is a bare identifier), every later entry is a
/// method call on the result of the previous one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZodValidator {
    pub functions: Vec<(String, ZodArg)>,
    /// Complete `export const ...;` lines.
    pub consts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ZodArg {
    /// `()`
    None,
    /// Source text passed through as-is.
    Raw(String),
    /// The function name is an identifier referring to another schema, not a call.
    Identifier,
    Validator(Box<ZodValidator>),
    /// Comma-separated arguments, e.g. `record(key, value)`.
    Args(Vec<ZodValidator>),
    /// An array literal, e.g. `union([a, b])`.
    Array(Vec<ZodValidator>),
    /// An object literal of property validators, in declaration order.
    Object(Vec<(String, ZodValidator)>),
}

impl ZodValidator {
    pub fn call(name: impl Into<String>) -> Self {
        Self::default().then(name, ZodArg::None)
    }

    pub fn with(name: impl Into<String>, arg: ZodArg) -> Self {
        Self::default().then(name, arg)
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::with(name, ZodArg::Identifier)
    }

    /// Append a method call.
    pub fn then(mut self, name: impl Into<String>, arg: ZodArg) -> Self {
        self.functions.push((name.into(), arg));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, arg: ZodArg) {
        self.functions.push((name.into(), arg));
    }

    /// Move the child's constants into `self` and hand the child back without them.
    pub fn adopt(&mut self, mut child: ZodValidator) -> ZodValidator {
        self.consts.append(&mut child.consts);
        child
    }

    pub fn add_const(&mut self, name: &str, value: impl std::fmt::Display) {
        self.consts.push(format!("export const {name} = {value};"));
    }
}
