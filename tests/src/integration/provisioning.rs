//! # Region Provisioning Flows
//!
//! End-to-end region lifecycle over the mock topology: create across
//! memdevs, drain and delete, mode switches, and the interaction between
//! region membership and block transitions.

#[cfg(test)]
mod tests {
    use mem_core::adapters::mock::{FailPoint, MockAttrStore, MockTopology};
    use mem_core::ports::inbound::{BlockApi, RegionApi};
    use mem_core::CxlTopology;
    use mem_core::service::MemoryService;
    use mem_types::{BlockState, MemError, RegionName};

    const BLOCK_SIZE: u64 = 0x1000_0000; // 256 MiB
    const GIB: u64 = 1 << 30;

    fn service() -> MemoryService<MockAttrStore, MockTopology> {
        let attrs = MockAttrStore::new();
        attrs.set_block_size(BLOCK_SIZE);
        MemoryService::new(attrs, MockTopology::new())
    }

    /// Populate kernel blocks covering `[base, base + size)`.
    fn add_blocks(svc: &MemoryService<MockAttrStore, MockTopology>, base: u64, size: u64) {
        let first = (base / BLOCK_SIZE) as u32;
        let count = (size / BLOCK_SIZE) as u32;
        for id in first..first + count {
            svc.attrs().add_block(id, 0, BlockState::Movable);
        }
    }

    #[test]
    fn test_create_then_map_then_delete() {
        let mut svc = service();
        let mem0 = svc.topology().add_memdev("mem0", GIB);
        let mem1 = svc.topology().add_memdev("mem1", GIB);

        let region = svc.create_region(256, &[mem0.clone(), mem1]).unwrap();
        let range = svc.region_bounds(&region).unwrap().unwrap();
        assert_eq!(range.size, 2 * GIB);

        // Hotplug made blocks appear inside the region's range.
        add_blocks(&svc, range.base, range.size);
        svc.refresh();
        assert_eq!(svc.num_blocks_of(&region).unwrap(), 8);
        assert_eq!(svc.capacity_of(&region).unwrap(), 2 * GIB);

        // The memdev is now consumed.
        assert!(!svc.memdev_is_available(&mem0).unwrap());

        svc.delete_region(&region).unwrap();
        assert!(svc.regions().unwrap().is_empty());
        assert!(svc.memdev_is_available(&mem0).unwrap());
    }

    #[test]
    fn test_failed_creation_leaves_no_region_behind() {
        let mut svc = service();
        let mem0 = svc.topology().add_memdev("mem0", GIB);
        svc.topology().fail_at(FailPoint::CommitDecode);

        assert!(svc.create_region(256, &[mem0.clone()]).is_err());
        assert!(svc.regions().unwrap().is_empty());

        // Clearing the fault makes the same request succeed.
        svc.topology().clear_failures();
        let region = svc.create_region(256, &[mem0]).unwrap();
        assert!(svc.topology().region_is_enabled(&region).unwrap());
    }

    #[test]
    fn test_delete_is_retryable_after_drain_failure() {
        let mut svc = service();
        let region = svc.topology().add_region("region0", 4 * GIB, GIB);
        add_blocks(&svc, 4 * GIB, GIB);
        svc.attrs().fail_write("memory17/online");

        assert!(matches!(
            svc.delete_region(&region),
            Err(MemError::PartialFailure { failed: 1, total: 4 })
        ));
        assert!(svc.topology().region_exists(&region));

        // The fault clears; the retry drains the remaining block and
        // finishes the teardown.
        svc.attrs().clear_failures();
        svc.refresh();
        svc.delete_region(&region).unwrap();
        assert!(!svc.topology().region_exists(&region));
    }

    #[test]
    fn test_region_scoped_transitions() {
        let mut svc = service();
        let region = svc.topology().add_region("region0", 4 * GIB, GIB);
        add_blocks(&svc, 4 * GIB, GIB);

        svc.offline_blocks(&region).unwrap();
        svc.refresh();
        assert_eq!(svc.num_offline_of(&region).unwrap(), 4);

        svc.online_blocks(&region).unwrap();
        svc.refresh();
        assert_eq!(svc.num_online_of(&region).unwrap(), 4);
        assert_eq!(
            svc.region_block_state(&region, 0).unwrap(),
            BlockState::Movable
        );
    }

    #[test]
    fn test_block_region_mapping_round_trip() {
        let mut svc = service();
        let region = svc.topology().add_region("region0", 4 * GIB, GIB);
        add_blocks(&svc, 4 * GIB, GIB);
        // A block outside any region.
        svc.attrs().add_block(64, 0, BlockState::Movable);

        let member = svc.offset_to_block(&region, 1).unwrap();
        assert_eq!(svc.region_of(member.id).unwrap(), Some(region.clone()));
        assert_eq!(svc.region_of(64).unwrap(), None);
    }

    #[test]
    fn test_mode_switch_cycle() {
        let mut svc = service();
        let region = svc.topology().add_region("region0", 4 * GIB, GIB);
        add_blocks(&svc, 4 * GIB, GIB);

        svc.dax_mode(&region).unwrap();
        assert_eq!(svc.num_online_of(&region).unwrap(), 0);

        svc.ram_mode(&region).unwrap();
        assert_eq!(
            svc.topology().region_mode(&region).unwrap(),
            mem_types::RegionMode::SystemRam
        );
    }

    #[test]
    fn test_region_lookup_by_name() {
        let mut svc = service();
        svc.topology().add_region("region3", 4 * GIB, GIB);

        assert_eq!(
            svc.region_by_name("region3").unwrap(),
            RegionName::new("region3")
        );
        assert!(matches!(
            svc.region_by_name("region9"),
            Err(MemError::NotFound(_))
        ));
    }
}
