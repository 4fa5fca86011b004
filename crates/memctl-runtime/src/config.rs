//! # Runtime Configuration
//!
//! Where the tool finds its kernel trees. Values resolve in order:
//! built-in defaults, then an optional JSON config file, then
//! `MEMCTL_*` environment variables, then command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mem_core::adapters::sysfs::DEFAULT_MEMORY_ROOT;

use crate::topology::{DEFAULT_CXL_BUS, DEFAULT_DAX_BUS};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config file {path} is not valid JSON: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Kernel memory-block tree.
    pub memory_root: PathBuf,
    /// CXL bus root.
    pub cxl_bus: PathBuf,
    /// DAX bus root.
    pub dax_bus: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            memory_root: PathBuf::from(DEFAULT_MEMORY_ROOT),
            cxl_bus: PathBuf::from(DEFAULT_CXL_BUS),
            dax_bus: PathBuf::from(DEFAULT_DAX_BUS),
        }
    }
}

impl RuntimeConfig {
    /// Defaults, the optional file, then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("MEMCTL_MEMORY_ROOT") {
            self.memory_root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MEMCTL_CXL_BUS") {
            self.cxl_bus = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("MEMCTL_DAX_BUS") {
            self.dax_bus = PathBuf::from(v);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
