//! # Sysfs Adapter Flows
//!
//! The same service flows, but over real directory trees: a fake kernel
//! memory tree for the attribute store and fake CXL/DAX buses for the
//! topology, both under tempdirs.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::os::unix::fs::symlink;
    use std::path::{Path, PathBuf};

    use tempfile::TempDir;

    use mem_core::adapters::SysfsAttrStore;
    use mem_core::ports::inbound::{BlockApi, RegionApi};
    use mem_core::service::MemoryService;
    use mem_types::BlockState;
    use memctl_runtime::CxlSysfsTopology;

    const BLOCK_SIZE: u64 = 0x8000000; // 128 MiB

    /// A fake memory tree plus fake CXL/DAX buses.
    struct FakeSystem {
        _tmp: TempDir,
        memory: PathBuf,
        cxl: PathBuf,
        dax: PathBuf,
    }

    impl FakeSystem {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let memory = tmp.path().join("memory");
            let cxl = tmp.path().join("cxl");
            let dax = tmp.path().join("dax");
            fs::create_dir_all(&memory).unwrap();
            fs::create_dir_all(cxl.join("devices")).unwrap();
            fs::create_dir_all(dax.join("drivers")).unwrap();
            fs::write(
                memory.join("block_size_bytes"),
                format!("{BLOCK_SIZE:x}\n"),
            )
            .unwrap();
            fs::write(memory.join("auto_online_blocks"), "offline\n").unwrap();
            Self {
                _tmp: tmp,
                memory,
                cxl,
                dax,
            }
        }

        fn add_block(&self, id: u32, node: u32, online: bool) {
            let dir = self.memory.join(format!("memory{id}"));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("online"), if online { "1\n" } else { "0\n" }).unwrap();
            fs::write(dir.join("state"), if online { "online\n" } else { "offline\n" }).unwrap();
            fs::write(dir.join("phys_device"), "0\n").unwrap();
            fs::write(dir.join("removable"), "1\n").unwrap();
            fs::write(dir.join("valid_zones"), "Movable\n").unwrap();
            let node_dir = self.memory.join(format!("node_target{node}"));
            fs::create_dir_all(&node_dir).unwrap();
            symlink(&node_dir, dir.join(format!("node{node}"))).unwrap();
        }

        fn add_region(&self, name: &str, base: u64, size: u64) {
            let real = self.cxl.join("real").join("decoder0.0").join(name);
            fs::create_dir_all(&real).unwrap();
            fs::write(real.join("resource"), format!("{base:#x}\n")).unwrap();
            fs::write(real.join("size"), format!("{size:#x}\n")).unwrap();
            symlink(&real, self.cxl.join("devices").join(name)).unwrap();
        }

        fn service(&self) -> MemoryService<SysfsAttrStore, CxlSysfsTopology> {
            MemoryService::new(
                SysfsAttrStore::new(&self.memory),
                CxlSysfsTopology::new(&self.cxl, &self.dax),
            )
        }
    }

    fn read_trimmed(path: &Path) -> String {
        fs::read_to_string(path).unwrap().trim_end().to_string()
    }

    #[test]
    fn test_scan_over_real_directories() {
        let sys = FakeSystem::new();
        for id in 0..6u32 {
            sys.add_block(id, if id < 3 { 0 } else { 1 }, id != 5);
        }
        let mut svc = sys.service();

        assert_eq!(svc.block_size().unwrap(), BLOCK_SIZE);
        assert_eq!(svc.num_blocks().unwrap(), 6);
        assert_eq!(svc.num_offline().unwrap(), 1);

        let blk = svc.block(4).unwrap();
        assert_eq!(blk.node, 1);
        assert!(blk.removable);
        assert_eq!(svc.block_state(5).unwrap(), BlockState::Offline);
    }

    #[test]
    fn test_offline_writes_the_real_file() {
        let sys = FakeSystem::new();
        sys.add_block(0, 0, true);
        let mut svc = sys.service();

        svc.offline_block(0).unwrap();
        assert_eq!(read_trimmed(&sys.memory.join("memory0/online")), "0");
    }

    #[test]
    fn test_region_membership_across_both_trees() {
        let sys = FakeSystem::new();
        // Region spans blocks 32..40 at 4 GiB.
        let base = 4u64 << 30;
        sys.add_region("region0", base, 8 * BLOCK_SIZE);
        for id in 30..42u32 {
            sys.add_block(id, 0, true);
        }
        let mut svc = sys.service();

        let region = svc.region_by_name("region0").unwrap();
        assert_eq!(svc.num_blocks_of(&region).unwrap(), 8);
        assert_eq!(svc.offset_to_block(&region, 0).unwrap().id, 32);
        assert_eq!(svc.region_of(35).unwrap(), Some(region.clone()));
        assert_eq!(svc.region_of(30).unwrap(), None);
    }

    #[test]
    fn test_set_state_round_trips_through_files() {
        let sys = FakeSystem::new();
        sys.add_block(3, 0, false);
        let mut svc = sys.service();

        svc.online_block(3).unwrap();
        assert_eq!(
            read_trimmed(&sys.memory.join("memory3/state")),
            BlockState::Movable.kernel_name()
        );
    }
}
