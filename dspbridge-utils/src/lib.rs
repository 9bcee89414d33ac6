//! Shared plumbing for the dspbridge crates: process errors, logging setup
//! and XDG paths.

pub mod error;
pub mod logging;
pub mod paths;

pub use error::{BridgeError, Result};
pub use logging::{init_logging_with_config, LogConfig, LogOutput};
pub use paths::{config_file, fixture_dir};
