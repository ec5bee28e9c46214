//! Built-in checks

mod build_info;
mod config;
mod graphics_backend;
mod scripts;

pub use build_info::BuildInfoCheck;
pub use config::ConfigCheck;
pub use graphics_backend::GraphicsBackendCheck;
pub use scripts::ScriptsCheck;
