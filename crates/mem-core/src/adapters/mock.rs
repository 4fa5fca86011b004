//! # In-Memory Mock Adapters
//!
//! Test doubles for the outbound ports. `MockAttrStore` models the kernel
//! memory attribute tree (including the kernel's reaction to `online` and
//! `state` writes) and records every write for assertion. `MockTopology`
//! models regions, memdevs, decoders, and dax devices with per-operation
//! failure injection.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use mem_types::{BlockId, BlockState, DecoderName, MemError, MemdevName, RegionMode, RegionName};

use crate::ports::outbound::{AttrEntry, AttrStore, CxlTopology};

// =============================================================================
// MOCK ATTRIBUTE STORE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Attr(String),
    Dir,
    Link,
}

/// In-memory implementation of `AttrStore` for testing.
pub struct MockAttrStore {
    nodes: RwLock<BTreeMap<String, Node>>,
    has_root: bool,
    writes: RwLock<Vec<(String, String)>>,
    fail_writes: RwLock<HashSet<String>>,
    short_writes: RwLock<HashSet<String>>,
}

impl MockAttrStore {
    /// A store with an existing (empty) block root directory.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(BTreeMap::new()),
            has_root: true,
            writes: RwLock::new(Vec::new()),
            fail_writes: RwLock::new(HashSet::new()),
            short_writes: RwLock::new(HashSet::new()),
        }
    }

    /// A store whose root directory does not exist at all.
    pub fn empty() -> Self {
        Self {
            has_root: false,
            ..Self::new()
        }
    }

    /// Publish the global block size attribute (kernel hex format).
    pub fn set_block_size(&self, size: u64) {
        self.put_attr("block_size_bytes", &format!("{size:x}"));
    }

    /// Publish the auto-online policy attribute.
    pub fn set_policy(&self, policy: BlockState) {
        self.put_attr("auto_online_blocks", policy.kernel_name());
    }

    /// Add a block directory with attributes matching `state`, including a
    /// `node<N>` link.
    pub fn add_block(&self, id: BlockId, node: i32, state: BlockState) {
        self.add_block_without_node(id, state);
        let mut nodes = self.nodes.write().unwrap();
        nodes.insert(format!("memory{id}/node{node}"), Node::Link);
    }

    /// Add a block directory without a NUMA node link.
    pub fn add_block_without_node(&self, id: BlockId, state: BlockState) {
        let dir = format!("memory{id}");
        {
            let mut nodes = self.nodes.write().unwrap();
            nodes.insert(dir.clone(), Node::Dir);
        }
        let (online, raw, zones) = kernel_view(state);
        self.put_attr(&format!("{dir}/online"), online);
        self.put_attr(&format!("{dir}/state"), raw);
        self.put_attr(&format!("{dir}/valid_zones"), zones);
        self.put_attr(&format!("{dir}/phys_device"), "0");
        self.put_attr(&format!("{dir}/removable"), "1");
    }

    /// Remove a block directory and everything under it, simulating a
    /// block that vanished after the registry scan.
    pub fn remove_block(&self, id: BlockId) {
        let dir = format!("memory{id}");
        let prefix = format!("{dir}/");
        let mut nodes = self.nodes.write().unwrap();
        nodes.retain(|k, _| k != &dir && !k.starts_with(&prefix));
    }

    /// Make writes to `path` fail as unavailable.
    pub fn fail_write(&self, path: &str) {
        self.fail_writes.write().unwrap().insert(path.to_string());
    }

    /// Make writes to `path` report one byte fewer than expected.
    pub fn short_write(&self, path: &str) {
        self.short_writes.write().unwrap().insert(path.to_string());
    }

    /// Forget all injected write faults.
    pub fn clear_failures(&self) {
        self.fail_writes.write().unwrap().clear();
        self.short_writes.write().unwrap().clear();
    }

    /// Every write issued so far, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.read().unwrap().clone()
    }

    /// Number of writes issued to `path`.
    pub fn write_count(&self, path: &str) -> usize {
        self.writes
            .read()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }

    pub fn clear_writes(&self) {
        self.writes.write().unwrap().clear();
    }

    pub(crate) fn put_attr(&self, path: &str, value: &str) {
        let mut nodes = self.nodes.write().unwrap();
        nodes.insert(path.to_string(), Node::Attr(value.to_string()));
    }

    /// Mirror the kernel's reaction to state-changing writes so that a
    /// re-enumeration after a transition sees the new state.
    fn apply_kernel_effect(&self, path: &str, value: &str) {
        if let Some(dir) = path.strip_suffix("/online") {
            if value == "0" {
                let (online, raw, zones) = kernel_view(BlockState::Offline);
                self.put_attr(&format!("{dir}/online"), online);
                self.put_attr(&format!("{dir}/state"), raw);
                self.put_attr(&format!("{dir}/valid_zones"), zones);
            }
        } else if let Some(dir) = path.strip_suffix("/state") {
            if let Some(state) = BlockState::from_kernel_name(value) {
                let (online, raw, zones) = kernel_view(state);
                self.put_attr(&format!("{dir}/online"), online);
                self.put_attr(&format!("{dir}/state"), raw);
                self.put_attr(&format!("{dir}/valid_zones"), zones);
            }
        } else {
            self.put_attr(path, value);
        }
    }
}

impl Default for MockAttrStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Kernel attribute values (`online`, `state`, `valid_zones`) for a block
/// in the given classified state.
fn kernel_view(state: BlockState) -> (&'static str, &'static str, &'static str) {
    match state {
        BlockState::Offline => ("0", "offline", "Movable"),
        BlockState::Online => ("1", "online", "Normal"),
        BlockState::Kernel => ("1", "online", "DMA32 Normal"),
        BlockState::Movable => ("1", "online", "Movable"),
    }
}

impl AttrStore for MockAttrStore {
    fn read(&self, path: &str) -> Result<String, MemError> {
        let nodes = self.nodes.read().unwrap();
        match nodes.get(path) {
            Some(Node::Attr(value)) => Ok(value.clone()),
            _ => Err(MemError::unavailable(path, "no such attribute")),
        }
    }

    fn write(&self, path: &str, value: &str) -> Result<usize, MemError> {
        if self.fail_writes.read().unwrap().contains(path) {
            return Err(MemError::unavailable(path, "injected write failure"));
        }
        {
            let nodes = self.nodes.read().unwrap();
            if !matches!(nodes.get(path), Some(Node::Attr(_))) {
                return Err(MemError::unavailable(path, "no such attribute"));
            }
        }

        self.writes
            .write()
            .unwrap()
            .push((path.to_string(), value.to_string()));

        if self.short_writes.read().unwrap().contains(path) {
            return Ok(value.len());
        }

        self.apply_kernel_effect(path, value);
        Ok(value.len() + 1)
    }

    fn list(&self, path: &str) -> Result<Vec<AttrEntry>, MemError> {
        let nodes = self.nodes.read().unwrap();
        if path.is_empty() {
            if !self.has_root {
                return Err(MemError::unavailable("", "no such directory"));
            }
        } else if !matches!(nodes.get(path), Some(Node::Dir)) {
            return Err(MemError::unavailable(path, "no such directory"));
        }

        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };

        let mut entries = Vec::new();
        for (key, node) in nodes.iter() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            if rest.is_empty() || rest.contains('/') {
                continue;
            }
            entries.push(AttrEntry {
                name: rest.to_string(),
                is_dir: *node == Node::Dir,
                is_symlink: *node == Node::Link,
            });
        }
        Ok(entries)
    }

    fn exists(&self, path: &str) -> bool {
        if path.is_empty() {
            return self.has_root;
        }
        self.nodes.read().unwrap().contains_key(path)
    }
}

// =============================================================================
// MOCK CXL TOPOLOGY
// =============================================================================

/// Operations the mock topology can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    CreateRegion,
    SetDecoderMode,
    SetDpaSize,
    SetRegionSize,
    SetTarget,
    CommitDecode,
    EnableRegion,
    DisableRegion,
    DeleteRegion,
    DaxDisable,
    DaxEnableDevdax,
    DaxEnableRam,
}

#[derive(Debug, Clone)]
struct MockRegion {
    base: u64,
    size: u64,
    ways: u32,
    granularity: u64,
    enabled: bool,
    committed: bool,
    targets: BTreeMap<u32, DecoderName>,
    mode: RegionMode,
    dax_enabled: bool,
}

#[derive(Debug, Clone)]
struct MockMemdev {
    ram_size: u64,
    enabled: bool,
    endpoint_enabled: bool,
    port_enabled: bool,
    decoder: DecoderName,
    bound_region: Option<RegionName>,
}

#[derive(Debug, Default)]
struct TopoState {
    root_decoder: Option<DecoderName>,
    regions: BTreeMap<RegionName, MockRegion>,
    memdevs: BTreeMap<MemdevName, MockMemdev>,
    next_region: u32,
    next_base: u64,
    ops: Vec<String>,
}

/// In-memory implementation of `CxlTopology` for testing.
pub struct MockTopology {
    state: RwLock<TopoState>,
    fail: RwLock<HashSet<FailPoint>>,
}

impl MockTopology {
    pub fn new() -> Self {
        let state = TopoState {
            root_decoder: Some(DecoderName::new("decoder0.0")),
            next_base: 0x1_0000_0000,
            ..TopoState::default()
        };
        Self {
            state: RwLock::new(state),
            fail: RwLock::new(HashSet::new()),
        }
    }

    /// A topology with no root decoder at all.
    pub fn without_root_decoder() -> Self {
        let topo = Self::new();
        topo.state.write().unwrap().root_decoder = None;
        topo
    }

    /// Register a memdev with the given RAM capacity; its endpoint decoder
    /// is derived from the name.
    pub fn add_memdev(&self, name: &str, ram_size: u64) -> MemdevName {
        let memdev = MemdevName::new(name);
        let decoder = DecoderName::new(format!("decoder-{name}"));
        self.state.write().unwrap().memdevs.insert(
            memdev.clone(),
            MockMemdev {
                ram_size,
                enabled: true,
                endpoint_enabled: true,
                port_enabled: true,
                decoder,
                bound_region: None,
            },
        );
        memdev
    }

    /// Mark the memdev's endpoint port as having no driver bound.
    pub fn disable_endpoint(&self, memdev: &MemdevName) {
        if let Some(m) = self.state.write().unwrap().memdevs.get_mut(memdev) {
            m.endpoint_enabled = false;
        }
    }

    /// Mark the port above the memdev's endpoint as having no driver bound.
    pub fn disable_port(&self, memdev: &MemdevName) {
        if let Some(m) = self.state.write().unwrap().memdevs.get_mut(memdev) {
            m.port_enabled = false;
        }
    }

    /// Register a pre-existing enabled region spanning `[base, base+size)`.
    pub fn add_region(&self, name: &str, base: u64, size: u64) -> RegionName {
        let region = RegionName::new(name);
        self.state.write().unwrap().regions.insert(
            region.clone(),
            MockRegion {
                base,
                size,
                ways: 1,
                granularity: 256,
                enabled: true,
                committed: true,
                targets: BTreeMap::new(),
                mode: RegionMode::SystemRam,
                dax_enabled: true,
            },
        );
        region
    }

    pub fn fail_at(&self, point: FailPoint) {
        self.fail.write().unwrap().insert(point);
    }

    pub fn clear_failures(&self) {
        self.fail.write().unwrap().clear();
    }

    /// Recorded topology operations, in order.
    pub fn ops(&self) -> Vec<String> {
        self.state.read().unwrap().ops.clone()
    }

    pub fn region_exists(&self, region: &RegionName) -> bool {
        self.state.read().unwrap().regions.contains_key(region)
    }

    fn check(&self, point: FailPoint, what: &str) -> Result<(), MemError> {
        if self.fail.read().unwrap().contains(&point) {
            return Err(MemError::unavailable(what, "injected failure"));
        }
        Ok(())
    }

    fn with_region<R>(
        &self,
        region: &RegionName,
        f: impl FnOnce(&mut MockRegion) -> R,
    ) -> Result<R, MemError> {
        let mut state = self.state.write().unwrap();
        let r = state
            .regions
            .get_mut(region)
            .ok_or_else(|| MemError::NotFound(format!("region {region}")))?;
        Ok(f(r))
    }

    fn log(&self, op: String) {
        self.state.write().unwrap().ops.push(op);
    }
}

impl Default for MockTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl CxlTopology for MockTopology {
    fn regions(&self) -> Result<Vec<RegionName>, MemError> {
        Ok(self.state.read().unwrap().regions.keys().cloned().collect())
    }

    fn memdevs(&self) -> Result<Vec<MemdevName>, MemError> {
        Ok(self.state.read().unwrap().memdevs.keys().cloned().collect())
    }

    fn root_decoder(&self) -> Result<Option<DecoderName>, MemError> {
        Ok(self.state.read().unwrap().root_decoder.clone())
    }

    fn region_base(&self, region: &RegionName) -> Result<u64, MemError> {
        self.with_region(region, |r| r.base)
    }

    fn region_size(&self, region: &RegionName) -> Result<u64, MemError> {
        self.with_region(region, |r| r.size)
    }

    fn region_is_enabled(&self, region: &RegionName) -> Result<bool, MemError> {
        self.with_region(region, |r| r.enabled)
    }

    fn region_is_committed(&self, region: &RegionName) -> Result<bool, MemError> {
        self.with_region(region, |r| r.committed)
    }

    fn region_interleave_ways(&self, region: &RegionName) -> Result<u32, MemError> {
        self.with_region(region, |r| r.ways)
    }

    fn region_interleave_granularity(&self, region: &RegionName) -> Result<u64, MemError> {
        self.with_region(region, |r| r.granularity)
    }

    fn create_ram_region(&self, root: &DecoderName) -> Result<RegionName, MemError> {
        self.check(FailPoint::CreateRegion, root.as_str())?;
        let mut state = self.state.write().unwrap();
        let name = RegionName::new(format!("region{}", state.next_region));
        state.next_region += 1;
        let base = state.next_base;
        state.next_base += 0x10_0000_0000;
        state.regions.insert(
            name.clone(),
            MockRegion {
                base,
                size: 0,
                ways: 0,
                granularity: 0,
                enabled: false,
                committed: false,
                targets: BTreeMap::new(),
                mode: RegionMode::SystemRam,
                dax_enabled: false,
            },
        );
        state.ops.push(format!("create {name}"));
        Ok(name)
    }

    fn set_interleave_ways(&self, region: &RegionName, ways: u32) -> Result<(), MemError> {
        self.with_region(region, |r| r.ways = ways)
    }

    fn set_interleave_granularity(
        &self,
        region: &RegionName,
        granularity: u64,
    ) -> Result<(), MemError> {
        self.with_region(region, |r| r.granularity = granularity)
    }

    fn set_region_size(&self, region: &RegionName, size: u64) -> Result<(), MemError> {
        self.check(FailPoint::SetRegionSize, region.as_str())?;
        self.with_region(region, |r| r.size = size)
    }

    fn set_region_target(
        &self,
        region: &RegionName,
        slot: u32,
        decoder: &DecoderName,
    ) -> Result<(), MemError> {
        self.check(FailPoint::SetTarget, region.as_str())?;
        self.with_region(region, |r| {
            r.targets.insert(slot, decoder.clone());
        })?;
        let mut state = self.state.write().unwrap();
        for memdev in state.memdevs.values_mut() {
            if memdev.decoder == *decoder {
                memdev.bound_region = Some(region.clone());
            }
        }
        Ok(())
    }

    fn commit_decode(&self, region: &RegionName) -> Result<(), MemError> {
        self.check(FailPoint::CommitDecode, region.as_str())?;
        self.log(format!("commit {region}"));
        self.with_region(region, |r| r.committed = true)
    }

    fn enable_region(&self, region: &RegionName) -> Result<(), MemError> {
        self.check(FailPoint::EnableRegion, region.as_str())?;
        self.log(format!("enable {region}"));
        self.with_region(region, |r| {
            r.enabled = true;
            r.dax_enabled = true;
        })
    }

    fn disable_region(&self, region: &RegionName) -> Result<(), MemError> {
        self.check(FailPoint::DisableRegion, region.as_str())?;
        self.log(format!("disable {region}"));
        self.with_region(region, |r| r.enabled = false)
    }

    fn delete_region(&self, region: &RegionName) -> Result<(), MemError> {
        self.check(FailPoint::DeleteRegion, region.as_str())?;
        let mut state = self.state.write().unwrap();
        if state.regions.remove(region).is_none() {
            return Err(MemError::NotFound(format!("region {region}")));
        }
        for memdev in state.memdevs.values_mut() {
            if memdev.bound_region.as_ref() == Some(region) {
                memdev.bound_region = None;
            }
        }
        state.ops.push(format!("delete {region}"));
        Ok(())
    }

    fn memdev_ram_size(&self, memdev: &MemdevName) -> Result<u64, MemError> {
        let state = self.state.read().unwrap();
        state
            .memdevs
            .get(memdev)
            .map(|m| m.ram_size)
            .ok_or_else(|| MemError::NotFound(format!("memdev {memdev}")))
    }

    fn memdev_is_enabled(&self, memdev: &MemdevName) -> Result<bool, MemError> {
        let state = self.state.read().unwrap();
        state
            .memdevs
            .get(memdev)
            .map(|m| m.enabled)
            .ok_or_else(|| MemError::NotFound(format!("memdev {memdev}")))
    }

    fn memdev_endpoint_is_enabled(&self, memdev: &MemdevName) -> Result<bool, MemError> {
        let state = self.state.read().unwrap();
        state
            .memdevs
            .get(memdev)
            .map(|m| m.endpoint_enabled)
            .ok_or_else(|| MemError::NotFound(format!("memdev {memdev}")))
    }

    fn memdev_port_is_enabled(&self, memdev: &MemdevName) -> Result<bool, MemError> {
        let state = self.state.read().unwrap();
        state
            .memdevs
            .get(memdev)
            .map(|m| m.port_enabled)
            .ok_or_else(|| MemError::NotFound(format!("memdev {memdev}")))
    }

    fn memdev_first_decoder(&self, memdev: &MemdevName) -> Result<DecoderName, MemError> {
        let state = self.state.read().unwrap();
        state
            .memdevs
            .get(memdev)
            .map(|m| m.decoder.clone())
            .ok_or_else(|| MemError::NotFound(format!("memdev {memdev}")))
    }

    fn memdev_interleave_granularity(&self, memdev: &MemdevName) -> Result<u64, MemError> {
        let state = self.state.read().unwrap();
        state
            .memdevs
            .get(memdev)
            .map(|_| 256)
            .ok_or_else(|| MemError::NotFound(format!("memdev {memdev}")))
    }

    fn set_decoder_ram_mode(&self, decoder: &DecoderName) -> Result<(), MemError> {
        self.check(FailPoint::SetDecoderMode, decoder.as_str())?;
        self.log(format!("decoder-mode ram {decoder}"));
        Ok(())
    }

    fn set_decoder_dpa_size(&self, decoder: &DecoderName, size: u64) -> Result<(), MemError> {
        self.check(FailPoint::SetDpaSize, decoder.as_str())?;
        self.log(format!("decoder-dpa {decoder} {size}"));
        Ok(())
    }

    fn decoder_region(&self, decoder: &DecoderName) -> Result<Option<RegionName>, MemError> {
        let state = self.state.read().unwrap();
        for memdev in state.memdevs.values() {
            if memdev.decoder == *decoder {
                return Ok(memdev.bound_region.clone());
            }
        }
        Ok(None)
    }

    fn region_mode(&self, region: &RegionName) -> Result<RegionMode, MemError> {
        self.with_region(region, |r| r.mode)
    }

    fn dax_is_enabled(&self, region: &RegionName) -> Result<bool, MemError> {
        self.with_region(region, |r| r.dax_enabled)
    }

    fn dax_disable(&self, region: &RegionName) -> Result<(), MemError> {
        self.check(FailPoint::DaxDisable, region.as_str())?;
        self.log(format!("dax-disable {region}"));
        self.with_region(region, |r| r.dax_enabled = false)
    }

    fn dax_enable_devdax(&self, region: &RegionName) -> Result<(), MemError> {
        self.check(FailPoint::DaxEnableDevdax, region.as_str())?;
        self.log(format!("dax-devdax {region}"));
        self.with_region(region, |r| {
            r.mode = RegionMode::DevDax;
            r.dax_enabled = true;
        })
    }

    fn dax_enable_ram(&self, region: &RegionName) -> Result<(), MemError> {
        self.check(FailPoint::DaxEnableRam, region.as_str())?;
        self.log(format!("dax-ram {region}"));
        self.with_region(region, |r| {
            r.mode = RegionMode::SystemRam;
            r.dax_enabled = true;
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_attr_store_kernel_effect() {
        let attrs = MockAttrStore::new();
        attrs.add_block(0, 0, BlockState::Movable);

        attrs.write("memory0/online", "0").unwrap();
        assert_eq!(attrs.read("memory0/state").unwrap(), "offline");
        assert_eq!(attrs.read("memory0/online").unwrap(), "0");

        attrs.write("memory0/state", "online_kernel").unwrap();
        assert_eq!(attrs.read("memory0/online").unwrap(), "1");
        assert_eq!(attrs.read("memory0/valid_zones").unwrap(), "DMA32 Normal");
    }

    #[test]
    fn test_mock_attr_store_short_write() {
        let attrs = MockAttrStore::new();
        attrs.add_block(0, 0, BlockState::Movable);
        attrs.short_write("memory0/online");

        let n = attrs.write("memory0/online", "0").unwrap();
        assert_eq!(n, 1);
        assert!(attrs.write_verified("memory0/online", "0").is_err());
    }

    #[test]
    fn test_mock_topology_create_and_delete() {
        let topo = MockTopology::new();
        let root = topo.root_decoder().unwrap().unwrap();
        let region = topo.create_ram_region(&root).unwrap();
        assert!(topo.region_exists(&region));
        assert_eq!(topo.region_size(&region).unwrap(), 0);

        topo.delete_region(&region).unwrap();
        assert!(!topo.region_exists(&region));
        assert!(topo.regions().unwrap().is_empty());
    }

    #[test]
    fn test_mock_topology_target_binding_tracks_availability() {
        let topo = MockTopology::new();
        let memdev = topo.add_memdev("mem0", 0x1_0000_0000);
        let decoder = topo.memdev_first_decoder(&memdev).unwrap();
        assert_eq!(topo.decoder_region(&decoder).unwrap(), None);

        let root = topo.root_decoder().unwrap().unwrap();
        let region = topo.create_ram_region(&root).unwrap();
        topo.set_region_target(&region, 0, &decoder).unwrap();
        assert_eq!(topo.decoder_region(&decoder).unwrap(), Some(region.clone()));

        topo.delete_region(&region).unwrap();
        assert_eq!(topo.decoder_region(&decoder).unwrap(), None);
    }

    #[test]
    fn test_mock_topology_fail_injection() {
        let topo = MockTopology::new();
        topo.fail_at(FailPoint::CommitDecode);
        let root = topo.root_decoder().unwrap().unwrap();
        let region = topo.create_ram_region(&root).unwrap();
        assert!(topo.commit_decode(&region).is_err());
        topo.clear_failures();
        assert!(topo.commit_decode(&region).is_ok());
    }
}
