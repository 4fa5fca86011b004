//! # mem-core
//!
//! Memory block and region lifecycle management core.
//!
//! ## Role in System
//!
//! - **Block registry**: one enumeration pass over the kernel's memory
//!   block directory, producing a sorted immutable snapshot.
//! - **Address mapping**: block/region containment over a byte-range
//!   address space.
//! - **State machine**: offline / online / online-kernel / online-movable
//!   classification and the transition rules the kernel enforces.
//! - **Provisioning**: multi-step region creation across backing devices
//!   with rollback, plus delete / enable / disable / dax-ram mode flows.
//!
//! ## Structure
//!
//! ```text
//! mem-core/src/
//! ├── domain/     # Pure logic: registry, classification, address math
//! ├── ports/      # inbound API traits, outbound collaborator traits
//! ├── adapters/   # sysfs attribute store, in-memory mocks
//! └── service/    # MemoryService composing the above
//! ```
//!
//! ## Concurrency
//!
//! Single-threaded and fully synchronous. Every observation and mutation is
//! a blocking attribute read or write; the registry and region-name caches
//! are built lazily once per session and never invalidated implicitly.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::*;
pub use service::*;
