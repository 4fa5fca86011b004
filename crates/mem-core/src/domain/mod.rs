//! # Domain Layer
//!
//! Pure logic over the block snapshot: classification, transition planning,
//! address math, and the registry itself. Nothing in this layer performs
//! I/O except `BlockRegistry::enumerate`, which reads through the outbound
//! attribute port exactly once per snapshot.

pub mod layout;
pub mod registry;
pub mod state;

pub use layout::*;
pub use registry::*;
pub use state::*;
