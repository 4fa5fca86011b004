//! # mem-types
//!
//! Shared type definitions for the memctl workspace.
//!
//! ## Clusters
//!
//! - **Blocks**: `MemoryBlock`, `RawState`, `BlockState`, `ZoneSet`
//! - **Topology**: `RegionName`, `MemdevName`, `DecoderName`
//! - **Errors**: `MemError`
//!
//! All kernel-boundary string encodings (zone tokens, policy strings, raw
//! state strings) are parsed into typed values here. Internal logic across
//! the workspace never matches on raw attribute text.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
