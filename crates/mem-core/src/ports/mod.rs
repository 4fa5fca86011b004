//! # Ports
//!
//! - `inbound` — the API surface the runtime layer calls.
//! - `outbound` — the collaborator surfaces the core depends on: the
//!   attribute tree and the CXL topology.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
