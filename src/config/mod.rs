//! Configuration
//!
//! Layered configuration for the command line tool: built-in defaults, the
//! global config file, an optional explicit file, then `POOLNODE_*`
//! environment variables.

mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
mod store_paths;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use store_paths::StoreConfig;

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}
