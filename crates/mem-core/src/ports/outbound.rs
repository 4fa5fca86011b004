//! # Outbound Ports
//!
//! Collaborator abstractions the core reads and writes through.
//!
//! `AttrStore` is the single-text-attribute contract over the kernel's
//! memory block tree. `CxlTopology` is the region/decoder/memdev/dax
//! surface; it is deliberately abstract — handle names in, plain values
//! out — so the core never touches that wire format directly.

use mem_types::{DecoderName, MemError, MemdevName, RegionMode, RegionName};

// =============================================================================
// ATTRIBUTE TREE
// =============================================================================

/// A directory entry under the attribute root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrEntry {
    pub name: String,
    pub is_dir: bool,
    pub is_symlink: bool,
}

/// Reads and writes single text attributes at paths relative to a fixed
/// attribute root.
pub trait AttrStore {
    /// Read an attribute, trimmed of trailing whitespace.
    fn read(&self, path: &str) -> Result<String, MemError>;

    /// Write `value` plus the terminating newline; returns the byte count
    /// the store accepted.
    fn write(&self, path: &str, value: &str) -> Result<usize, MemError>;

    /// List the entries of a directory. `""` lists the root itself.
    fn list(&self, path: &str) -> Result<Vec<AttrEntry>, MemError>;

    /// Whether the path exists at all.
    fn exists(&self, path: &str) -> bool;

    /// Write and require the exact expected byte count
    /// (`value.len() + 1` for the terminator).
    fn write_verified(&self, path: &str, value: &str) -> Result<(), MemError> {
        let expected = value.len() + 1;
        let written = self.write(path, value)?;
        if written != expected {
            return Err(MemError::WriteVerification {
                path: path.to_string(),
                expected,
                written,
            });
        }
        Ok(())
    }
}

// =============================================================================
// CXL TOPOLOGY
// =============================================================================

/// The region / decoder / memdev / dax-device surface consumed by the core.
///
/// All collections come back sorted by device id. Mutations are blocking
/// and synchronous like everything else in this system.
pub trait CxlTopology {
    // --- enumeration ---
    fn regions(&self) -> Result<Vec<RegionName>, MemError>;
    fn memdevs(&self) -> Result<Vec<MemdevName>, MemError>;
    fn root_decoder(&self) -> Result<Option<DecoderName>, MemError>;

    // --- region accessors ---
    /// Base address; 0 and all-ones are "unavailable" sentinels that the
    /// caller interprets, not this port.
    fn region_base(&self, region: &RegionName) -> Result<u64, MemError>;
    fn region_size(&self, region: &RegionName) -> Result<u64, MemError>;
    fn region_is_enabled(&self, region: &RegionName) -> Result<bool, MemError>;
    fn region_is_committed(&self, region: &RegionName) -> Result<bool, MemError>;
    fn region_interleave_ways(&self, region: &RegionName) -> Result<u32, MemError>;
    fn region_interleave_granularity(&self, region: &RegionName) -> Result<u64, MemError>;

    // --- region mutators ---
    /// Create a new, empty, RAM-capable region under the root decoder.
    fn create_ram_region(&self, root: &DecoderName) -> Result<RegionName, MemError>;
    fn set_interleave_ways(&self, region: &RegionName, ways: u32) -> Result<(), MemError>;
    fn set_interleave_granularity(
        &self,
        region: &RegionName,
        granularity: u64,
    ) -> Result<(), MemError>;
    fn set_region_size(&self, region: &RegionName, size: u64) -> Result<(), MemError>;
    fn set_region_target(
        &self,
        region: &RegionName,
        slot: u32,
        decoder: &DecoderName,
    ) -> Result<(), MemError>;
    fn commit_decode(&self, region: &RegionName) -> Result<(), MemError>;
    fn enable_region(&self, region: &RegionName) -> Result<(), MemError>;
    fn disable_region(&self, region: &RegionName) -> Result<(), MemError>;
    fn delete_region(&self, region: &RegionName) -> Result<(), MemError>;

    // --- memdevs ---
    fn memdev_ram_size(&self, memdev: &MemdevName) -> Result<u64, MemError>;
    fn memdev_is_enabled(&self, memdev: &MemdevName) -> Result<bool, MemError>;
    /// Whether the memdev's endpoint port has a driver bound.
    fn memdev_endpoint_is_enabled(&self, memdev: &MemdevName) -> Result<bool, MemError>;
    /// Whether the port above the memdev's endpoint has a driver bound.
    fn memdev_port_is_enabled(&self, memdev: &MemdevName) -> Result<bool, MemError>;
    /// First decoder of the memdev's endpoint port.
    fn memdev_first_decoder(&self, memdev: &MemdevName) -> Result<DecoderName, MemError>;
    /// Interleave granularity presented by the first port above the memdev.
    fn memdev_interleave_granularity(&self, memdev: &MemdevName) -> Result<u64, MemError>;

    // --- decoders ---
    fn set_decoder_ram_mode(&self, decoder: &DecoderName) -> Result<(), MemError>;
    fn set_decoder_dpa_size(&self, decoder: &DecoderName, size: u64) -> Result<(), MemError>;
    /// Region the decoder is bound to, if any.
    fn decoder_region(&self, decoder: &DecoderName) -> Result<Option<RegionName>, MemError>;

    // --- dax device backing a region ---
    fn region_mode(&self, region: &RegionName) -> Result<RegionMode, MemError>;
    fn dax_is_enabled(&self, region: &RegionName) -> Result<bool, MemError>;
    fn dax_disable(&self, region: &RegionName) -> Result<(), MemError>;
    fn dax_enable_devdax(&self, region: &RegionName) -> Result<(), MemError>;
    fn dax_enable_ram(&self, region: &RegionName) -> Result<(), MemError>;
}
