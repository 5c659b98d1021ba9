pub mod api;
pub mod app;
pub mod codegen;
pub mod config;
pub mod models;
pub mod redirect;
pub mod registry;
pub mod storage;
pub mod validate;

pub use app::create_app;
pub use registry::{LinkRegistry, RegistryError};
