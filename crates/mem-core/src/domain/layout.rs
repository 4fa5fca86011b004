//! # Address Layout
//!
//! Byte-address math between memory blocks and regions. A block occupies
//! the range `[block_size * id, block_size * (id + 1))`; a block belongs to
//! a region when its start address falls inside the region's byte range.
//!
//! All addresses are unsigned 64-bit. Interleave granularity values are
//! restricted to [`INTERLEAVE_GRANULARITIES`]; callers validate once at the
//! provisioning entry point, the math here does not re-check.

use mem_types::{BlockId, MemError, MemoryBlock};

/// Interleave granularities the kernel accepts, in bytes.
pub const INTERLEAVE_GRANULARITIES: [u64; 6] = [256, 512, 1024, 2048, 4096, 8192];

/// Sentinel base address meaning "resource unavailable".
pub const BASE_UNAVAILABLE: u64 = u64::MAX;

/// Whether a granularity value is in the accepted set.
pub fn granularity_is_valid(granularity: u64) -> bool {
    INTERLEAVE_GRANULARITIES.contains(&granularity)
}

/// A half-open byte range `[base, base + size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub base: u64,
    pub size: u64,
}

impl ByteRange {
    pub fn end(&self) -> u64 {
        self.base.saturating_add(self.size)
    }

    pub fn contains(&self, addr: u64) -> bool {
        self.base <= addr && addr < self.end()
    }
}

/// Start address of a block.
pub fn block_address(block_size: u64, id: BlockId) -> u64 {
    block_size * u64::from(id)
}

/// Interpret a region's reported base and size.
///
/// Base 0 and all-ones are the collaborator's "unavailable" sentinels and
/// surface as `ConfigurationInconsistency`. A zero size means the region is
/// not sized yet: `Ok(None)`, which counting callers treat as empty rather
/// than as an error.
pub fn region_bounds(base: u64, size: u64) -> Result<Option<ByteRange>, MemError> {
    if base == 0 || base == BASE_UNAVAILABLE {
        return Err(MemError::ConfigurationInconsistency(format!(
            "region base address unavailable (0x{base:x})"
        )));
    }
    if size == 0 {
        return Ok(None);
    }
    Ok(Some(ByteRange { base, size }))
}

/// Address of the block at `offset` blocks into a region.
///
/// Fails when the offset lands at or beyond the region's end. Overflowing
/// the address space counts as beyond the end.
pub fn offset_address(range: &ByteRange, block_size: u64, offset: u32) -> Result<u64, MemError> {
    let addr = block_size
        .checked_mul(u64::from(offset))
        .and_then(|delta| range.base.checked_add(delta));
    match addr {
        Some(addr) if addr < range.end() => Ok(addr),
        _ => Err(MemError::InvalidInput(format!(
            "block offset {offset} exceeds region range"
        ))),
    }
}

/// Filter blocks whose start address falls inside `range`.
///
/// Input order is preserved, so a registry snapshot (ascending by id,
/// unique) yields an ascending, duplicate-free result.
pub fn blocks_in_range<'a>(
    blocks: &'a [MemoryBlock],
    block_size: u64,
    range: &ByteRange,
) -> Vec<&'a MemoryBlock> {
    blocks
        .iter()
        .filter(|blk| range.contains(block_address(block_size, blk.id)))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
