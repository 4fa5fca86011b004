//! # Memctl Runtime
//!
//! The runtime layer of the memctl tool.
//!
//! ## Modular Structure
//!
//! - `cli/` - Command tree and argument parsing
//! - `config` - Runtime configuration (file + environment)
//! - `topology` - Sysfs-backed `CxlTopology` adapter
//! - `format` - Human-readable rendering of service results

pub mod cli;
pub mod config;
pub mod format;
pub mod topology;

pub use config::RuntimeConfig;
pub use topology::CxlSysfsTopology;
