//! # Adapters
//!
//! - `sysfs` — filesystem-backed `AttrStore` over the kernel attribute tree.
//! - `mock` — in-memory `AttrStore` and `CxlTopology` with failure
//!   injection, for tests.

pub mod mock;
pub mod sysfs;

pub use sysfs::SysfsAttrStore;
