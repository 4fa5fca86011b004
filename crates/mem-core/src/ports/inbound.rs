//! # Inbound Ports
//!
//! The API traits the runtime layer drives. `MemoryService` implements all
//! three. Methods take `&mut self` because the first query of a session
//! lazily builds the block registry and region-name caches.

use mem_types::{BlockId, BlockState, MemError, MemdevName, MemoryBlock, OnlinePolicy, RegionName};

use crate::domain::ByteRange;

/// Memory block queries and single-block state transitions.
pub trait BlockApi {
    /// Size of one memory block in bytes. Freshly read every call, never
    /// cached; constant for the lifetime of a session.
    fn block_size(&self) -> Result<u64, MemError>;

    /// The sorted block snapshot.
    fn blocks(&mut self) -> Result<Vec<MemoryBlock>, MemError>;

    /// A single block by kernel id.
    fn block(&mut self, id: BlockId) -> Result<MemoryBlock, MemError>;

    /// Classified state of a block.
    fn block_state(&mut self, id: BlockId) -> Result<BlockState, MemError>;

    /// Region the block's address falls into, if any.
    fn region_of(&mut self, id: BlockId) -> Result<Option<RegionName>, MemError>;

    fn num_blocks(&mut self) -> Result<usize, MemError>;
    fn num_online(&mut self) -> Result<usize, MemError>;
    fn num_offline(&mut self) -> Result<usize, MemError>;

    /// Total / online / offline capacity, `block_size * count`.
    fn capacity(&mut self) -> Result<u64, MemError>;
    fn capacity_online(&mut self) -> Result<u64, MemError>;
    fn capacity_offline(&mut self) -> Result<u64, MemError>;

    /// Offline a block. No-op success when already offline.
    fn offline_block(&mut self, id: BlockId) -> Result<(), MemError>;

    /// Online a block into the movable zone. No-op success when already
    /// movable; `InvalidTransition` unless the block is offline.
    fn online_block(&mut self, id: BlockId) -> Result<(), MemError>;

    /// Transition a block to `target` under the state machine rules.
    fn set_block_state(&mut self, id: BlockId, target: BlockState) -> Result<(), MemError>;
}

/// The system-wide default-online policy for newly appearing blocks.
pub trait PolicyApi {
    fn policy(&self) -> Result<OnlinePolicy, MemError>;

    /// Set the policy. No-op success when already set; the write is
    /// verified by exact byte count.
    fn set_policy(&mut self, policy: OnlinePolicy) -> Result<(), MemError>;
}

/// Region queries, bulk block operations, and lifecycle management.
pub trait RegionApi {
    /// Sorted region names. Cached after the first call for the session.
    fn regions(&mut self) -> Result<Vec<RegionName>, MemError>;

    /// Look a region up by its device name.
    fn region_by_name(&mut self, name: &str) -> Result<RegionName, MemError>;

    /// Byte range of a region; `None` when the region is not sized yet.
    fn region_bounds(&mut self, region: &RegionName) -> Result<Option<ByteRange>, MemError>;

    /// Member blocks, ascending by id, duplicate-free.
    fn blocks_of(&mut self, region: &RegionName) -> Result<Vec<MemoryBlock>, MemError>;

    fn num_blocks_of(&mut self, region: &RegionName) -> Result<usize, MemError>;
    fn num_online_of(&mut self, region: &RegionName) -> Result<usize, MemError>;
    fn num_offline_of(&mut self, region: &RegionName) -> Result<usize, MemError>;

    fn capacity_of(&mut self, region: &RegionName) -> Result<u64, MemError>;
    fn capacity_online_of(&mut self, region: &RegionName) -> Result<u64, MemError>;
    fn capacity_offline_of(&mut self, region: &RegionName) -> Result<u64, MemError>;

    /// The block at `offset` blocks into the region.
    fn offset_to_block(&mut self, region: &RegionName, offset: u32)
        -> Result<MemoryBlock, MemError>;

    /// Classified state of the block at `offset`.
    fn region_block_state(
        &mut self,
        region: &RegionName,
        offset: u32,
    ) -> Result<BlockState, MemError>;

    /// Transition the block at `offset` to `target`.
    fn set_region_block_state(
        &mut self,
        region: &RegionName,
        offset: u32,
        target: BlockState,
    ) -> Result<(), MemError>;

    /// Offline every member block. Continues past individual failures and
    /// reports the aggregate as `PartialFailure`.
    fn offline_blocks(&mut self, region: &RegionName) -> Result<(), MemError>;

    /// Online every member block into the movable zone; aggregate failure
    /// reporting as for `offline_blocks`.
    fn online_blocks(&mut self, region: &RegionName) -> Result<(), MemError>;

    /// Provision a new interleaved RAM region across `devices`.
    /// Transactional: any step failure deletes the partial region.
    fn create_region(
        &mut self,
        granularity: u64,
        devices: &[MemdevName],
    ) -> Result<RegionName, MemError>;

    /// Offline member blocks, disable, then delete. Non-transactional;
    /// a failure mid-way leaves the region offline-but-present, retryable.
    fn delete_region(&mut self, region: &RegionName) -> Result<(), MemError>;

    /// Enable a region. Enabling an already-enabled region is a failure.
    fn enable_region(&mut self, region: &RegionName) -> Result<(), MemError>;

    /// Disable a region. Disabling an already-disabled region is a failure.
    fn disable_region(&mut self, region: &RegionName) -> Result<(), MemError>;

    /// Switch the region's dax device to device-dax mode, draining online
    /// blocks first when the region is enabled.
    fn dax_mode(&mut self, region: &RegionName) -> Result<(), MemError>;

    /// Switch the region's dax device to system-ram mode. Does not require
    /// draining, unlike `dax_mode`.
    fn ram_mode(&mut self, region: &RegionName) -> Result<(), MemError>;

    /// Sorted memdev names.
    fn memdevs(&mut self) -> Result<Vec<MemdevName>, MemError>;

    /// Whether a memdev is free to join a new region: memdev, endpoint
    /// and upstream port all enabled, first decoder not bound to any
    /// region.
    fn memdev_is_available(&mut self, memdev: &MemdevName) -> Result<bool, MemError>;

    /// Interleave granularity presented by the port above the memdev,
    /// in bytes.
    fn memdev_granularity(&mut self, memdev: &MemdevName) -> Result<u64, MemError>;
}
