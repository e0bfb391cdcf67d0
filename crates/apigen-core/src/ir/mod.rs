pub mod grouping;
pub mod operations;
pub mod schemas;
pub mod types;

pub use grouping::{OutputUnit, check_collisions, model_path, plan_units};
pub use operations::*;
pub use schemas::*;
pub use types::{IrInfo, NormalizedName};
