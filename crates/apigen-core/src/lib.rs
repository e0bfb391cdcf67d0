//! OpenAPI parsing, resolution and the backend-agnostic generation pipeline for apigen.

pub mod config;
pub mod emit;
pub mod error;
pub mod generator;
pub mod ir;
pub mod parse;
pub mod pipeline;
pub mod resolve;
pub mod transform;
pub mod typescript;

pub use pipeline::{GenerationReport, Pipeline};

/// A generated file with path and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}
