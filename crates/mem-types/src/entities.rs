//! # Core Domain Entities
//!
//! Defines the kernel-facing entities for memory block and region
//! management.
//!
//! ## Clusters
//!
//! - **Blocks**: `MemoryBlock`, `RawState`, `BlockState`, `ZoneSet`
//! - **Topology handles**: `RegionName`, `MemdevName`, `DecoderName`
//!
//! The kernel encodes block state, online policy, and zone membership as
//! short attribute strings. The conversions between those strings and the
//! typed values live here and nowhere else.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// =============================================================================
// CLUSTER A: MEMORY BLOCKS
// =============================================================================

/// Kernel index of a memory block (the `<id>` in `memory<id>`).
pub type BlockId = u32;

/// Raw block state as reported by the kernel `state` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RawState {
    #[default]
    Offline,
    Online,
    GoingOffline,
}

impl RawState {
    /// The exact string the kernel reports for this state.
    pub fn kernel_name(self) -> &'static str {
        match self {
            RawState::Offline => "offline",
            RawState::Online => "online",
            RawState::GoingOffline => "going-offline",
        }
    }

    /// Parse a kernel `state` attribute value. `None` for unknown text.
    pub fn from_kernel_name(s: &str) -> Option<Self> {
        match s {
            "offline" => Some(RawState::Offline),
            "online" => Some(RawState::Online),
            "going-offline" => Some(RawState::GoingOffline),
            _ => None,
        }
    }
}

impl fmt::Display for RawState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kernel_name())
    }
}

/// Classified block state, which doubles as the auto-online policy value
/// space: the kernel accepts the same strings for the per-block `state`
/// attribute and the system-wide `auto_online_blocks` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    /// Block is offline; its pages back no allocations.
    Offline,
    /// Online in the Normal zone.
    Online,
    /// Online with pages usable by kernel allocations (DMA/DMA32 zones).
    Kernel,
    /// Online with pages restricted to movable allocations.
    Movable,
}

/// Alias used where the value is the system-wide default-online policy
/// rather than a single block's classified state.
pub type OnlinePolicy = BlockState;

impl BlockState {
    /// All states, in kernel enumeration order.
    pub const ALL: [BlockState; 4] = [
        BlockState::Offline,
        BlockState::Online,
        BlockState::Kernel,
        BlockState::Movable,
    ];

    /// The policy string the kernel accepts for this state.
    pub fn kernel_name(self) -> &'static str {
        match self {
            BlockState::Offline => "offline",
            BlockState::Online => "online",
            BlockState::Kernel => "online_kernel",
            BlockState::Movable => "online_movable",
        }
    }

    /// Parse a policy string. `None` for unknown text.
    pub fn from_kernel_name(s: &str) -> Option<Self> {
        match s {
            "offline" => Some(BlockState::Offline),
            "online" => Some(BlockState::Online),
            "online_kernel" => Some(BlockState::Kernel),
            "online_movable" => Some(BlockState::Movable),
            _ => None,
        }
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kernel_name())
    }
}

bitflags! {
    /// Zones a block's pages may be onlined into, from the kernel
    /// `valid_zones` attribute (space-separated tokens).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
    pub struct ZoneSet: u8 {
        const DMA     = 0x01;
        const DMA32   = 0x02;
        const NORMAL  = 0x04;
        const MOVABLE = 0x08;
        const NONE    = 0x10;
    }
}

impl ZoneSet {
    /// Parse a single zone token. `None` for unknown text.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "DMA" => Some(ZoneSet::DMA),
            "DMA32" => Some(ZoneSet::DMA32),
            "Normal" => Some(ZoneSet::NORMAL),
            "Movable" => Some(ZoneSet::MOVABLE),
            "none" => Some(ZoneSet::NONE),
            _ => None,
        }
    }

    /// Parse the whole `valid_zones` attribute value. Unknown tokens are
    /// ignored, matching the kernel's forward-compatible token list.
    pub fn from_tokens(s: &str) -> Self {
        s.split_whitespace()
            .filter_map(ZoneSet::from_token)
            .fold(ZoneSet::empty(), |acc, z| acc | z)
    }

    /// The kernel token for a single-flag set.
    pub fn token(self) -> Option<&'static str> {
        match self {
            ZoneSet::DMA => Some("DMA"),
            ZoneSet::DMA32 => Some("DMA32"),
            ZoneSet::NORMAL => Some("Normal"),
            ZoneSet::MOVABLE => Some("Movable"),
            ZoneSet::NONE => Some("none"),
            _ => None,
        }
    }
}

impl fmt::Display for ZoneSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for flag in self.iter() {
            if let Some(token) = flag.token() {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(token)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A kernel memory block as captured by one enumeration pass.
///
/// Snapshots are immutable after the registry builds them; a follow-up
/// enumeration replaces the whole set rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryBlock {
    /// Kernel block index (`memory<id>`).
    pub id: BlockId,
    /// NUMA node the block belongs to; -1 when no node link exists.
    pub node: i32,
    /// Value of the `online` attribute at scan time.
    pub online: bool,
    /// Value of the `phys_device` attribute.
    pub phys_device: i32,
    /// Value of the `removable` attribute.
    pub removable: bool,
    /// Raw kernel state at scan time.
    pub raw_state: RawState,
    /// Zones the block's pages may occupy.
    pub valid_zones: ZoneSet,
}

impl MemoryBlock {
    /// A block with kernel defaults, useful as a test fixture base.
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            node: -1,
            online: false,
            phys_device: 0,
            removable: false,
            raw_state: RawState::Offline,
            valid_zones: ZoneSet::empty(),
        }
    }
}

// =============================================================================
// CLUSTER B: TOPOLOGY HANDLES
// =============================================================================

/// How a region's backing memory is exposed to the system.
///
/// Device-dax and system-RAM use of the same backing memory are mutually
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionMode {
    /// Exposed as a direct-access character device.
    DevDax,
    /// Hotplugged as ordinary system RAM.
    SystemRam,
}

impl fmt::Display for RegionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionMode::DevDax => f.write_str("devdax"),
            RegionMode::SystemRam => f.write_str("system-ram"),
        }
    }
}

/// Device name of a CXL region (e.g. `region0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionName(pub String);

/// Device name of a CXL memory device (e.g. `mem0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MemdevName(pub String);

/// Device name of a CXL decoder (e.g. `decoder0.0`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DecoderName(pub String);

macro_rules! impl_name {
    ($ty:ident) => {
        impl $ty {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

impl_name!(RegionName);
impl_name!(MemdevName);
impl_name!(DecoderName);

// =============================================================================
// TESTS
// =============================================================================
