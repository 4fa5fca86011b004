//! # Block Registry
//!
//! One enumeration pass over the kernel's memory block directory produces a
//! sorted, immutable snapshot of `MemoryBlock`s. The snapshot is never
//! mutated in place; a follow-up enumeration (explicit, never automatic)
//! replaces it wholesale.

use mem_types::{BlockId, MemError, MemoryBlock, RawState, ZoneSet};
use tracing::info;

use crate::ports::outbound::AttrStore;

/// Directory entry prefix for memory blocks (`memory<id>`).
const BLOCK_PREFIX: &str = "memory";
/// Link prefix encoding the NUMA node (`node<N>`).
const NODE_PREFIX: &str = "node";

/// Sorted snapshot of the system's memory blocks.
///
/// Invariants: ascending by id, ids unique.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: Vec<MemoryBlock>,
}

impl BlockRegistry {
    /// Build a snapshot by scanning the block directory once.
    ///
    /// Per-block attribute reads are best-effort: a block whose attributes
    /// cannot be read keeps kernel defaults for those fields. Only the root
    /// directory scan itself is fatal.
    pub fn enumerate<A: AttrStore>(attrs: &A) -> Result<Self, MemError> {
        let entries = attrs.list("")?;

        let mut blocks = Vec::new();
        for entry in entries {
            if !entry.is_dir {
                continue;
            }
            let Some(id) = parse_block_id(&entry.name) else {
                continue;
            };
            blocks.push(read_block(attrs, id, &entry.name));
        }

        blocks.sort_unstable_by_key(|blk| blk.id);
        info!("Found {} memory blocks", blocks.len());

        Ok(Self { blocks })
    }

    /// Build from a prepared block list; sorts to uphold the ordering
    /// invariant. Test fixture entry point.
    pub fn from_blocks(mut blocks: Vec<MemoryBlock>) -> Self {
        blocks.sort_unstable_by_key(|blk| blk.id);
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// First block in id order.
    pub fn first(&self) -> Option<&MemoryBlock> {
        self.blocks.first()
    }

    /// Successor of the block with the given id. Forward-only; there is no
    /// reverse cursor.
    pub fn next_after(&self, id: BlockId) -> Option<&MemoryBlock> {
        let pos = self.blocks.iter().position(|blk| blk.id == id)?;
        self.blocks.get(pos + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryBlock> {
        self.blocks.iter()
    }

    pub fn as_slice(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    /// Linear scan by id.
    pub fn find_by_id(&self, id: BlockId) -> Option<&MemoryBlock> {
        self.blocks.iter().find(|blk| blk.id == id)
    }

    /// Sorted list of block ids.
    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|blk| blk.id).collect()
    }

    pub fn num_online(&self) -> usize {
        self.blocks.iter().filter(|blk| blk.online).count()
    }

    pub fn num_offline(&self) -> usize {
        self.blocks.iter().filter(|blk| !blk.online).count()
    }
}

/// Parse `memory<id>` into the id; anything else is not a block entry.
fn parse_block_id(name: &str) -> Option<BlockId> {
    name.strip_prefix(BLOCK_PREFIX)?.parse().ok()
}

/// Read one block's attributes, tolerating individual read failures.
fn read_block<A: AttrStore>(attrs: &A, id: BlockId, dir: &str) -> MemoryBlock {
    let mut blk = MemoryBlock::new(id);

    // NUMA node comes from a node<N> link inside the block directory
    if let Ok(entries) = attrs.list(dir) {
        for entry in entries {
            if entry.is_symlink {
                if let Some(node) = entry.name.strip_prefix(NODE_PREFIX) {
                    if let Ok(node) = node.parse() {
                        blk.node = node;
                    }
                }
            }
        }
    }

    if let Ok(v) = attrs.read(&format!("{dir}/online")) {
        blk.online = v.trim() == "1";
    }
    if let Ok(v) = attrs.read(&format!("{dir}/phys_device")) {
        if let Ok(dev) = v.trim().parse() {
            blk.phys_device = dev;
        }
    }
    if let Ok(v) = attrs.read(&format!("{dir}/removable")) {
        blk.removable = v.trim() == "1";
    }
    if let Ok(v) = attrs.read(&format!("{dir}/state")) {
        if let Some(state) = RawState::from_kernel_name(v.trim()) {
            blk.raw_state = state;
        }
    }
    if let Ok(v) = attrs.read(&format!("{dir}/valid_zones")) {
        blk.valid_zones = ZoneSet::from_tokens(&v);
    }

    blk
}

// =============================================================================
// TESTS
// =============================================================================
