//! TypeScript rendering shared by every backend: type expressions and model declarations.

pub mod models;
pub mod type_mapper;

pub use models::{TypeScriptModels, escape_jsdoc};
pub use type_mapper::{ir_type_to_ts, property_key};
