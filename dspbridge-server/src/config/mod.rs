//! Configuration management for the bridge server
//!
//! The configuration is read once at startup and never changes afterwards.

mod defaults;
mod loader;
mod schema;

pub use defaults::DEFAULT_CONFIG_TOML;
pub use loader::{parse_listen, ConfigLoader};
pub use schema::*;
