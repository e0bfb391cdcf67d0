pub mod name_normalizer;
pub mod operation_builder;
pub mod responses;
pub mod schema_types;

pub use operation_builder::build_operations;
pub use schema_types::{schema_or_ref_to_ir_schema, schema_or_ref_to_ir_type};
