use std::fmt;

/// Document metadata shown in generated file banners.
#[derive(Debug, Clone)]
pub struct IrInfo {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
}

/// A document name together with the TypeScript identifiers derived from it.
/// Both casings are valid identifiers; `original` keeps the wire spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedName {
    pub original: String,
    pub pascal_case: String,
    pub camel_case: String,
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}
