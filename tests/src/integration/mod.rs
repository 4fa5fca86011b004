//! Cross-crate integration flows.

pub mod lifecycle;
pub mod provisioning;
pub mod sysfs_scan;
