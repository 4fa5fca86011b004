//! # memctl Test Suite
//!
//! Unified test crate for flows spanning more than one crate.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── lifecycle.rs     # Block and policy flows over the mock trees
//!     ├── provisioning.rs  # Region create / delete / mode flows
//!     └── sysfs_scan.rs    # Real-filesystem adapters against tempdir trees
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p mem-tests
//!
//! # By category
//! cargo test -p mem-tests integration::lifecycle
//! cargo test -p mem-tests integration::provisioning
//! ```

pub mod integration;
