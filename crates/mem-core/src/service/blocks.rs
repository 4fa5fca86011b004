//! # Block API Implementation
//!
//! Queries over the registry snapshot plus single-block state transitions.
//! Transitions resolve the block's attribute path directly from its id;
//! the path is checked for existence so a block that vanished since the
//! scan surfaces as `ResourceUnavailable`.

use tracing::info;

use mem_types::{BlockId, BlockState, MemError, MemoryBlock, RegionName};

use crate::domain::{classify, layout, plan_transition};
use crate::ports::inbound::BlockApi;
use crate::ports::outbound::{AttrStore, CxlTopology};

use super::MemoryService;

impl<A: AttrStore, T: CxlTopology> MemoryService<A, T> {
    /// Attribute directory for a block, checked for existence.
    fn block_dir(&self, id: BlockId) -> Result<String, MemError> {
        let dir = format!("memory{id}");
        if !self.attrs.exists(&dir) {
            return Err(MemError::unavailable(&dir, "no such memory block"));
        }
        Ok(dir)
    }
}

impl<A: AttrStore, T: CxlTopology> BlockApi for MemoryService<A, T> {
    fn block_size(&self) -> Result<u64, MemError> {
        self.read_block_size()
    }

    fn blocks(&mut self) -> Result<Vec<MemoryBlock>, MemError> {
        Ok(self.ensure_registry()?.as_slice().to_vec())
    }

    fn block(&mut self, id: BlockId) -> Result<MemoryBlock, MemError> {
        self.ensure_registry()?
            .find_by_id(id)
            .cloned()
            .ok_or_else(|| MemError::NotFound(format!("memory block {id}")))
    }

    fn block_state(&mut self, id: BlockId) -> Result<BlockState, MemError> {
        Ok(classify(&self.block(id)?))
    }

    fn region_of(&mut self, id: BlockId) -> Result<Option<RegionName>, MemError> {
        let blk = self.block(id)?;
        let block_size = self.read_block_size()?;
        let addr = layout::block_address(block_size, blk.id);

        let names = self.cached_region_names()?.to_vec();
        for region in names {
            match self.bounds_of(&region)? {
                Some(range) if range.contains(addr) => return Ok(Some(region)),
                _ => {}
            }
        }
        Ok(None)
    }

    fn num_blocks(&mut self) -> Result<usize, MemError> {
        Ok(self.ensure_registry()?.len())
    }

    fn num_online(&mut self) -> Result<usize, MemError> {
        Ok(self.ensure_registry()?.num_online())
    }

    fn num_offline(&mut self) -> Result<usize, MemError> {
        Ok(self.ensure_registry()?.num_offline())
    }

    fn capacity(&mut self) -> Result<u64, MemError> {
        let block_size = self.read_block_size()?;
        Ok(block_size * self.num_blocks()? as u64)
    }

    fn capacity_online(&mut self) -> Result<u64, MemError> {
        let block_size = self.read_block_size()?;
        Ok(block_size * self.num_online()? as u64)
    }

    fn capacity_offline(&mut self) -> Result<u64, MemError> {
        let block_size = self.read_block_size()?;
        Ok(block_size * self.num_offline()? as u64)
    }

    fn offline_block(&mut self, id: BlockId) -> Result<(), MemError> {
        let blk = self.block(id)?;
        if classify(&blk) == BlockState::Offline {
            info!("Memory block {id} already offline, skipping");
            return Ok(());
        }

        let dir = self.block_dir(id)?;
        self.attrs.write_verified(&format!("{dir}/online"), "0")?;
        info!("Offlined memory block {id}");
        Ok(())
    }

    fn online_block(&mut self, id: BlockId) -> Result<(), MemError> {
        self.set_block_state(id, BlockState::Movable)
    }

    fn set_block_state(&mut self, id: BlockId, target: BlockState) -> Result<(), MemError> {
        let blk = self.block(id)?;
        let current = classify(&blk);

        let Some(next) = plan_transition(id, current, target)? else {
            info!("Memory block {id} already in state {target}, skipping");
            return Ok(());
        };

        let dir = self.block_dir(id)?;
        self.attrs
            .write_verified(&format!("{dir}/state"), next.kernel_name())?;
        info!("Set state to {next} on memory block {id}");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
