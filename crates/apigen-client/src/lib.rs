pub mod emitters;
pub mod generator;

pub use generator::{AxiosBackend, AxiosStyle, FetchBackend, register};
