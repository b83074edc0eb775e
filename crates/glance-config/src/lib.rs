mod env;
mod error;
mod manager;
mod model;

pub use env::apply_env;
pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::*;
