//! # Block State Machine
//!
//! Classification of a block's effective state from its cached snapshot
//! fields, and planning of state transitions under the kernel's rules.
//!
//! ## Transition rules
//!
//! - Any state may go to `Offline`.
//! - Only `Offline` may go to an online state. Direct online-to-online
//!   transitions are forbidden; they must pass through `Offline`.
//! - A transition to the current state is a no-op.

use mem_types::{BlockId, BlockState, MemError, MemoryBlock, RawState, ZoneSet};

/// Classify a block's effective state from its snapshot fields.
///
/// Pure function of (raw_state, valid_zones); performs no I/O and is stable
/// across repeated calls on the same snapshot.
pub fn classify(blk: &MemoryBlock) -> BlockState {
    if blk.raw_state == RawState::Offline {
        BlockState::Offline
    } else if blk.valid_zones.intersects(ZoneSet::DMA | ZoneSet::DMA32) {
        BlockState::Kernel
    } else if blk.valid_zones.contains(ZoneSet::NORMAL) {
        BlockState::Online
    } else if blk.valid_zones.contains(ZoneSet::MOVABLE) {
        BlockState::Movable
    } else {
        BlockState::Online
    }
}

/// Decide what a transition request requires.
///
/// Returns `Ok(None)` when the block is already in `target` (no write must
/// be issued), `Ok(Some(target))` when a single state-attribute write
/// performs the transition, and `InvalidTransition` when the kernel would
/// reject the request.
pub fn plan_transition(
    id: BlockId,
    current: BlockState,
    target: BlockState,
) -> Result<Option<BlockState>, MemError> {
    if current == target {
        return Ok(None);
    }
    if target != BlockState::Offline && current != BlockState::Offline {
        return Err(MemError::InvalidTransition {
            id,
            from: current,
            to: target,
        });
    }
    Ok(Some(target))
}

// =============================================================================
// TESTS
// =============================================================================
