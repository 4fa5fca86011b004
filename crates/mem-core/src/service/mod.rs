//! # Memory Service
//!
//! `MemoryService` composes the attribute store and the CXL topology behind
//! the inbound API traits. It owns the session caches: the block registry
//! snapshot and the region-name list, each built lazily on first use and
//! never invalidated implicitly. `refresh` is the explicit escape hatch.
//!
//! Implementations of the inbound traits are split by area:
//!
//! - `blocks.rs` — `BlockApi`
//! - `policy.rs` — `PolicyApi`
//! - `regions.rs` — `RegionApi`

mod blocks;
mod policy;
mod regions;

use mem_types::{MemError, RegionName};

use crate::domain::{layout, BlockRegistry, ByteRange};
use crate::ports::outbound::{AttrStore, CxlTopology};

/// Global block-size attribute, hex bytes.
pub(crate) const BLOCK_SIZE_ATTR: &str = "block_size_bytes";
/// System-wide auto-online policy attribute.
pub(crate) const POLICY_ATTR: &str = "auto_online_blocks";

/// One session over the kernel memory tree and the CXL topology.
///
/// Single-threaded and synchronous; every mutation is a blocking attribute
/// write serialized by the environment itself. Callers must not run
/// concurrent mutating sessions against the same kernel resources.
pub struct MemoryService<A: AttrStore, T: CxlTopology> {
    attrs: A,
    topology: T,
    registry: Option<BlockRegistry>,
    region_names: Option<Vec<RegionName>>,
}

impl<A: AttrStore, T: CxlTopology> MemoryService<A, T> {
    pub fn new(attrs: A, topology: T) -> Self {
        Self {
            attrs,
            topology,
            registry: None,
            region_names: None,
        }
    }

    pub fn attrs(&self) -> &A {
        &self.attrs
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    /// Drop the session caches so the next query re-enumerates. Nothing
    /// calls this implicitly; stale snapshots after out-of-band changes are
    /// a documented property of a session.
    pub fn refresh(&mut self) {
        self.registry = None;
        self.region_names = None;
    }

    /// The block snapshot, enumerated on first use. A call when the
    /// registry is already built is a no-op returning the existing
    /// snapshot.
    pub(crate) fn ensure_registry(&mut self) -> Result<&BlockRegistry, MemError> {
        if self.registry.is_none() {
            self.registry = Some(BlockRegistry::enumerate(&self.attrs)?);
        }
        Ok(self.registry.as_ref().expect("registry just built"))
    }

    /// Sorted region names, listed from the topology on first use.
    pub(crate) fn cached_region_names(&mut self) -> Result<&[RegionName], MemError> {
        if self.region_names.is_none() {
            self.region_names = Some(self.topology.regions()?);
        }
        Ok(self.region_names.as_deref().expect("region list just built"))
    }

    /// Fresh read of the global block size. Never cached; zero is a
    /// configuration error because no address math is possible without it.
    pub(crate) fn read_block_size(&self) -> Result<u64, MemError> {
        let text = self.attrs.read(BLOCK_SIZE_ATTR)?;
        let trimmed = text.trim().trim_start_matches("0x");
        let size = u64::from_str_radix(trimmed, 16).map_err(|_| MemError::Unparseable {
            path: BLOCK_SIZE_ATTR.to_string(),
            value: text.clone(),
        })?;
        if size == 0 {
            return Err(MemError::ConfigurationInconsistency(
                "system memory block size is zero".to_string(),
            ));
        }
        Ok(size)
    }

    /// Byte range of a region, or `None` while it is not sized yet.
    pub(crate) fn bounds_of(&self, region: &RegionName) -> Result<Option<ByteRange>, MemError> {
        let base = self.topology.region_base(region)?;
        let size = self.topology.region_size(region)?;
        layout::region_bounds(base, size)
    }
}
