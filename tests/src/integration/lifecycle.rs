//! # Block Lifecycle Flows
//!
//! Drives the full inbound API over the mock kernel tree: enumeration,
//! classification, transitions, capacity accounting, and the auto-online
//! policy, including the stale-snapshot behavior around `refresh`.

#[cfg(test)]
mod tests {
    use mem_core::adapters::mock::{MockAttrStore, MockTopology};
    use mem_core::ports::inbound::{BlockApi, PolicyApi};
    use mem_core::service::MemoryService;
    use mem_types::{BlockState, MemError};

    const BLOCK_SIZE: u64 = 0x1000_0000; // 256 MiB

    /// 8 blocks: 0-3 movable, 4-5 kernel, 6-7 offline.
    fn populated_service() -> MemoryService<MockAttrStore, MockTopology> {
        let attrs = MockAttrStore::new();
        attrs.set_block_size(BLOCK_SIZE);
        attrs.set_policy(BlockState::Offline);
        for id in 0..4u32 {
            attrs.add_block(id, 0, BlockState::Movable);
        }
        for id in 4..6u32 {
            attrs.add_block(id, 0, BlockState::Kernel);
        }
        for id in 6..8u32 {
            attrs.add_block(id, 1, BlockState::Offline);
        }
        MemoryService::new(attrs, MockTopology::new())
    }

    #[test]
    fn test_enumeration_and_capacity_accounting() {
        let mut svc = populated_service();

        assert_eq!(svc.num_blocks().unwrap(), 8);
        assert_eq!(svc.num_online().unwrap(), 6);
        assert_eq!(svc.num_offline().unwrap(), 2);
        assert_eq!(svc.capacity().unwrap(), 8 * BLOCK_SIZE);
        assert_eq!(svc.capacity_online().unwrap(), 6 * BLOCK_SIZE);
        assert_eq!(svc.capacity_offline().unwrap(), 2 * BLOCK_SIZE);

        let blocks = svc.blocks().unwrap();
        let ids: Vec<u32> = blocks.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(blocks[6].node, 1);
    }

    #[test]
    fn test_offline_then_online_cycle() {
        let mut svc = populated_service();

        svc.offline_block(1).unwrap();
        svc.refresh();
        assert_eq!(svc.block_state(1).unwrap(), BlockState::Offline);

        svc.online_block(1).unwrap();
        svc.refresh();
        assert_eq!(svc.block_state(1).unwrap(), BlockState::Movable);
    }

    #[test]
    fn test_online_requires_passing_through_offline() {
        let mut svc = populated_service();

        // Block 4 classifies kernel; direct online-to-online is rejected.
        let err = svc.set_block_state(4, BlockState::Movable).unwrap_err();
        assert!(matches!(
            err,
            MemError::InvalidTransition {
                from: BlockState::Kernel,
                to: BlockState::Movable,
                ..
            }
        ));

        svc.offline_block(4).unwrap();
        svc.refresh();
        svc.set_block_state(4, BlockState::Movable).unwrap();
        svc.refresh();
        assert_eq!(svc.block_state(4).unwrap(), BlockState::Movable);
    }

    #[test]
    fn test_snapshot_is_stable_until_refresh() {
        let mut svc = populated_service();

        assert_eq!(svc.num_offline().unwrap(), 2);
        svc.offline_block(0).unwrap();

        // The session still answers from the old snapshot.
        assert_eq!(svc.num_offline().unwrap(), 2);
        svc.refresh();
        assert_eq!(svc.num_offline().unwrap(), 3);
    }

    #[test]
    fn test_policy_flow() {
        let mut svc = populated_service();
        assert_eq!(svc.policy().unwrap(), BlockState::Offline);

        svc.set_policy(BlockState::Movable).unwrap();
        assert_eq!(svc.policy().unwrap(), BlockState::Movable);

        // Setting the same policy again is write-free.
        svc.attrs().clear_writes();
        svc.set_policy(BlockState::Movable).unwrap();
        assert!(svc.attrs().writes().is_empty());
    }

    #[test]
    fn test_write_verification_failure_propagates() {
        let mut svc = populated_service();
        svc.attrs().short_write("memory2/online");

        let err = svc.offline_block(2).unwrap_err();
        assert!(matches!(err, MemError::WriteVerification { .. }));
    }
}
