//! # Region API Implementation
//!
//! Region membership is address arithmetic over the block snapshot:
//! a block belongs to a region when its start address falls inside the
//! region's byte range. Lifecycle operations drive the topology port;
//! provisioning is transactional, deletion is retryable.

use tracing::{error, info};

use mem_types::{BlockState, MemError, MemdevName, MemoryBlock, RegionMode, RegionName};

use crate::domain::{layout, ByteRange};
use crate::ports::inbound::{BlockApi, RegionApi};
use crate::ports::outbound::{AttrStore, CxlTopology};

use super::MemoryService;

impl<A: AttrStore, T: CxlTopology> MemoryService<A, T> {
    /// Member blocks of a sized region; an unsized region has none.
    fn members_of(&mut self, region: &RegionName) -> Result<Vec<MemoryBlock>, MemError> {
        let Some(range) = self.bounds_of(region)? else {
            return Ok(Vec::new());
        };
        let block_size = self.read_block_size()?;
        let registry = self.ensure_registry()?;
        Ok(layout::blocks_in_range(registry.as_slice(), block_size, &range)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Resolve the block at `offset` blocks into the region.
    fn member_at_offset(
        &mut self,
        region: &RegionName,
        offset: u32,
    ) -> Result<MemoryBlock, MemError> {
        let range = self.bounds_of(region)?.ok_or_else(|| {
            MemError::InvalidInput(format!("region {region} has no usable address range"))
        })?;
        let block_size = self.read_block_size()?;
        let addr = layout::offset_address(&range, block_size, offset)?;

        self.ensure_registry()?
            .iter()
            .find(|blk| layout::block_address(block_size, blk.id) == addr)
            .cloned()
            .ok_or_else(|| {
                MemError::NotFound(format!(
                    "no memory block at offset {offset} of region {region}"
                ))
            })
    }

    /// Apply `op` to every member block, continuing past failures.
    fn for_each_member(
        &mut self,
        region: &RegionName,
        verb: &str,
        op: impl Fn(&mut Self, &MemoryBlock) -> Result<(), MemError>,
    ) -> Result<(), MemError> {
        let members = self.members_of(region)?;
        let total = members.len();
        let mut failed = 0usize;

        for blk in &members {
            if let Err(err) = op(self, blk) {
                error!("Failed to {verb} memory block {}: {err}", blk.id);
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(MemError::PartialFailure { failed, total });
        }
        info!("{verb} complete for all {total} blocks of region {region}");
        Ok(())
    }

    /// Configure a freshly created region end to end. On any failure the
    /// caller tears the region down.
    fn provision(
        &mut self,
        region: &RegionName,
        granularity: u64,
        devices: &[MemdevName],
    ) -> Result<(), MemError> {
        self.topology
            .set_interleave_ways(region, devices.len() as u32)?;
        self.topology.set_interleave_granularity(region, granularity)?;

        let mut total = 0u64;
        let mut decoders = Vec::with_capacity(devices.len());
        for memdev in devices {
            let size = self.topology.memdev_ram_size(memdev)?;
            let decoder = self.topology.memdev_first_decoder(memdev)?;
            self.topology.set_decoder_ram_mode(&decoder)?;
            self.topology.set_decoder_dpa_size(&decoder, size)?;
            info!("Configured decoder {decoder} of {memdev} for {size} RAM bytes");
            total += size;
            decoders.push(decoder);
        }

        self.topology.set_region_size(region, total)?;
        info!("Sized region {region} to {total} bytes");

        for (slot, decoder) in decoders.iter().enumerate() {
            self.topology
                .set_region_target(region, slot as u32, decoder)?;
        }

        self.topology.commit_decode(region)?;
        self.topology.enable_region(region)?;
        info!("Committed and enabled region {region}");
        Ok(())
    }
}

impl<A: AttrStore, T: CxlTopology> RegionApi for MemoryService<A, T> {
    fn regions(&mut self) -> Result<Vec<RegionName>, MemError> {
        Ok(self.cached_region_names()?.to_vec())
    }

    fn region_by_name(&mut self, name: &str) -> Result<RegionName, MemError> {
        self.cached_region_names()?
            .iter()
            .find(|r| r.as_str() == name)
            .cloned()
            .ok_or_else(|| MemError::NotFound(format!("region {name}")))
    }

    fn region_bounds(&mut self, region: &RegionName) -> Result<Option<ByteRange>, MemError> {
        self.bounds_of(region)
    }

    fn blocks_of(&mut self, region: &RegionName) -> Result<Vec<MemoryBlock>, MemError> {
        self.members_of(region)
    }

    fn num_blocks_of(&mut self, region: &RegionName) -> Result<usize, MemError> {
        Ok(self.members_of(region)?.len())
    }

    fn num_online_of(&mut self, region: &RegionName) -> Result<usize, MemError> {
        Ok(self.members_of(region)?.iter().filter(|b| b.online).count())
    }

    fn num_offline_of(&mut self, region: &RegionName) -> Result<usize, MemError> {
        Ok(self.members_of(region)?.iter().filter(|b| !b.online).count())
    }

    fn capacity_of(&mut self, region: &RegionName) -> Result<u64, MemError> {
        let block_size = self.read_block_size()?;
        Ok(block_size * self.num_blocks_of(region)? as u64)
    }

    fn capacity_online_of(&mut self, region: &RegionName) -> Result<u64, MemError> {
        let block_size = self.read_block_size()?;
        Ok(block_size * self.num_online_of(region)? as u64)
    }

    fn capacity_offline_of(&mut self, region: &RegionName) -> Result<u64, MemError> {
        let block_size = self.read_block_size()?;
        Ok(block_size * self.num_offline_of(region)? as u64)
    }

    fn offset_to_block(
        &mut self,
        region: &RegionName,
        offset: u32,
    ) -> Result<MemoryBlock, MemError> {
        self.member_at_offset(region, offset)
    }

    fn region_block_state(
        &mut self,
        region: &RegionName,
        offset: u32,
    ) -> Result<BlockState, MemError> {
        let blk = self.member_at_offset(region, offset)?;
        self.block_state(blk.id)
    }

    fn set_region_block_state(
        &mut self,
        region: &RegionName,
        offset: u32,
        target: BlockState,
    ) -> Result<(), MemError> {
        let blk = self.member_at_offset(region, offset)?;
        self.set_block_state(blk.id, target)
    }

    fn offline_blocks(&mut self, region: &RegionName) -> Result<(), MemError> {
        self.for_each_member(region, "offline", |svc, blk| svc.offline_block(blk.id))
    }

    fn online_blocks(&mut self, region: &RegionName) -> Result<(), MemError> {
        self.for_each_member(region, "online", |svc, blk| svc.online_block(blk.id))
    }

    fn create_region(
        &mut self,
        granularity: u64,
        devices: &[MemdevName],
    ) -> Result<RegionName, MemError> {
        if !layout::granularity_is_valid(granularity) {
            return Err(MemError::InvalidInput(format!(
                "unsupported interleave granularity {granularity}"
            )));
        }
        if devices.is_empty() {
            return Err(MemError::InvalidInput(
                "region creation needs at least one memdev".to_string(),
            ));
        }

        let root = self
            .topology
            .root_decoder()?
            .ok_or_else(|| MemError::NotFound("CXL root decoder".to_string()))?;

        let region = self.topology.create_ram_region(&root)?;
        info!("Created region {region} under {root}");

        if let Err(err) = self.provision(&region, granularity, devices) {
            error!("Provisioning region {region} failed, deleting it: {err}");
            if let Err(cleanup) = self.topology.delete_region(&region) {
                error!("Could not delete partial region {region}: {cleanup}");
            }
            return Err(err);
        }

        // Region membership and the region list both changed.
        self.refresh();
        Ok(region)
    }

    fn delete_region(&mut self, region: &RegionName) -> Result<(), MemError> {
        if self.num_online_of(region)? > 0 {
            self.offline_blocks(region)?;
        }

        if self.topology.region_is_enabled(region)? {
            self.topology.disable_region(region)?;
            info!("Disabled region {region}");
        }
        self.topology.delete_region(region)?;
        info!("Deleted region {region}");

        self.refresh();
        Ok(())
    }

    fn enable_region(&mut self, region: &RegionName) -> Result<(), MemError> {
        if self.topology.region_is_enabled(region)? {
            return Err(MemError::InvalidInput(format!(
                "region {region} is already enabled"
            )));
        }
        self.topology.enable_region(region)?;
        info!("Enabled region {region}");
        self.refresh();
        Ok(())
    }

    fn disable_region(&mut self, region: &RegionName) -> Result<(), MemError> {
        if !self.topology.region_is_enabled(region)? {
            return Err(MemError::InvalidInput(format!(
                "region {region} is already disabled"
            )));
        }
        self.topology.disable_region(region)?;
        info!("Disabled region {region}");
        self.refresh();
        Ok(())
    }

    fn dax_mode(&mut self, region: &RegionName) -> Result<(), MemError> {
        if self.topology.region_mode(region)? == RegionMode::DevDax {
            info!("Region {region} already in device-dax mode, skipping");
            return Ok(());
        }

        // Memory handed to the page allocator has to come back first.
        if self.topology.region_is_enabled(region)? {
            self.offline_blocks(region)?;
        }
        if self.topology.dax_is_enabled(region)? {
            self.topology.dax_disable(region)?;
        }
        self.topology.dax_enable_devdax(region)?;
        info!("Region {region} switched to device-dax mode");

        self.refresh();
        Ok(())
    }

    fn ram_mode(&mut self, region: &RegionName) -> Result<(), MemError> {
        if self.topology.region_mode(region)? == RegionMode::SystemRam {
            info!("Region {region} already in system-ram mode, skipping");
            return Ok(());
        }

        if self.topology.dax_is_enabled(region)? {
            self.topology.dax_disable(region)?;
        }
        self.topology.dax_enable_ram(region)?;
        info!("Region {region} switched to system-ram mode");

        self.refresh();
        Ok(())
    }

    fn memdevs(&mut self) -> Result<Vec<MemdevName>, MemError> {
        self.topology.memdevs()
    }

    fn memdev_is_available(&mut self, memdev: &MemdevName) -> Result<bool, MemError> {
        // Usable for provisioning only when the whole chain is up: the
        // memdev itself, its endpoint port, and the port above it, with
        // the first decoder not already claimed by a region.
        if !self.topology.memdev_is_enabled(memdev)? {
            return Ok(false);
        }
        if !self.topology.memdev_endpoint_is_enabled(memdev)? {
            return Ok(false);
        }
        if !self.topology.memdev_port_is_enabled(memdev)? {
            return Ok(false);
        }
        let decoder = self.topology.memdev_first_decoder(memdev)?;
        Ok(self.topology.decoder_region(&decoder)?.is_none())
    }

    fn memdev_granularity(&mut self, memdev: &MemdevName) -> Result<u64, MemError> {
        self.topology.memdev_interleave_granularity(memdev)
    }
}

// =============================================================================
// TESTS
// =============================================================================
