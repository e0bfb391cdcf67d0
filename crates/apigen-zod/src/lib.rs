//! Zod validation schemas: the `zod` backend, the `zod` model emitter and the
//! version detection that picks between Zod 3 and Zod 4 call names.

pub mod ast;
pub mod backend;
pub mod generate;
pub mod models;
pub mod render;
pub mod version;

use apigen_core::generator::GeneratorRegistry;

pub use backend::ZodBackend;
pub use models::ZodModels;
pub use version::ZodMajor;

/// Register the `zod` backend and the `zod` model emitter.
pub fn register(registry: &mut GeneratorRegistry) {
    registry.register(Box::new(ZodBackend));
    registry.register_models(Box::new(ZodModels));
}
