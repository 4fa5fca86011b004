//! # Sysfs CXL Topology Adapter
//!
//! Implements `CxlTopology` directly over the kernel's CXL and DAX bus
//! trees. Device handles are sysfs names (`region0`, `mem1`,
//! `decoder3.0`); every value crossing the port is already parsed.
//!
//! Layout assumptions, all from the upstream ABI:
//!
//! - `<cxl>/devices/` holds `regionN`, `memN`, `decoderN.M` and
//!   `endpointN` entries, each a symlink into the device hierarchy
//! - a region's device symlink resolves under its parent root decoder,
//!   which carries `create_ram_region` and `delete_region`
//! - an endpoint's `uport_dev` symlink resolves to its memdev
//! - a region's dax device lives at `<region>/dax_regionN/daxN.M` and is
//!   driven by either `kmem` (system-ram) or `device_dax`

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tracing::debug;

use mem_core::ports::outbound::CxlTopology;
use mem_types::{DecoderName, MemError, MemdevName, RegionMode, RegionName};

/// Default CXL bus root.
pub const DEFAULT_CXL_BUS: &str = "/sys/bus/cxl";
/// Default DAX bus root.
pub const DEFAULT_DAX_BUS: &str = "/sys/bus/dax";

/// `CxlTopology` over the live sysfs trees.
pub struct CxlSysfsTopology {
    cxl_bus: PathBuf,
    dax_bus: PathBuf,
}

impl CxlSysfsTopology {
    /// The system buses.
    pub fn system() -> Self {
        Self::new(DEFAULT_CXL_BUS, DEFAULT_DAX_BUS)
    }

    pub fn new(cxl_bus: impl Into<PathBuf>, dax_bus: impl Into<PathBuf>) -> Self {
        Self {
            cxl_bus: cxl_bus.into(),
            dax_bus: dax_bus.into(),
        }
    }

    fn devices(&self) -> PathBuf {
        self.cxl_bus.join("devices")
    }

    fn device(&self, name: &str) -> PathBuf {
        self.devices().join(name)
    }

    /// Device names with the given prefix followed by a numeric id,
    /// ascending by id.
    fn devices_with_prefix(&self, prefix: &str) -> Result<Vec<String>, MemError> {
        let dir = self.devices();
        let entries = fs::read_dir(&dir)
            .map_err(|e| MemError::unavailable(dir.display().to_string(), e))?;

        let mut found: Vec<(u32, String)> = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| MemError::unavailable(dir.display().to_string(), e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(id) = name
                .strip_prefix(prefix)
                .and_then(|rest| rest.parse::<u32>().ok())
            {
                found.push((id, name));
            }
        }
        found.sort_unstable_by_key(|(id, _)| *id);
        Ok(found.into_iter().map(|(_, name)| name).collect())
    }

    /// Resolved filesystem path of a device, following the bus symlink.
    fn resolved(&self, name: &str) -> Result<PathBuf, MemError> {
        let link = self.device(name);
        fs::canonicalize(&link)
            .map_err(|e| MemError::unavailable(link.display().to_string(), e))
    }

    /// The region's dax device directory, e.g. `region0/dax_region0/dax0.0`.
    fn dax_device(&self, region: &RegionName) -> Result<PathBuf, MemError> {
        let region_dir = self.device(region.as_str());
        let dax_region = first_child_with_prefix(&region_dir, "dax_region")?.ok_or_else(|| {
            MemError::unavailable(region.as_str(), "region has no dax region")
        })?;
        first_child_with_prefix(&dax_region, "dax")?
            .ok_or_else(|| MemError::unavailable(region.as_str(), "dax region has no dax device"))
    }

    /// Name of the driver currently bound to a device directory, if any.
    fn bound_driver(dir: &Path) -> Option<String> {
        let target = fs::read_link(dir.join("driver")).ok()?;
        target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// The endpoint port directory serving a memdev.
    fn endpoint_of(&self, memdev: &MemdevName) -> Result<PathBuf, MemError> {
        for endpoint in self.devices_with_prefix("endpoint")? {
            let uport = self.device(&endpoint).join("uport_dev");
            let Ok(target) = fs::read_link(&uport) else {
                continue;
            };
            if target.file_name().and_then(|n| n.to_str()) == Some(memdev.as_str()) {
                return self.resolved(&endpoint);
            }
        }
        Err(MemError::unavailable(
            memdev.as_str(),
            "no endpoint port serves this memdev",
        ))
    }

    /// Lowest-numbered decoder entry under a port directory.
    fn first_decoder_in(dir: &Path) -> Result<DecoderName, MemError> {
        let entries = fs::read_dir(dir)
            .map_err(|e| MemError::unavailable(dir.display().to_string(), e))?;

        let mut best: Option<((u32, u32), String)> = None;
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(key) = parse_decoder_id(&name) else {
                continue;
            };
            if best.as_ref().is_none_or(|(k, _)| key < *k) {
                best = Some((key, name));
            }
        }
        best.map(|(_, name)| DecoderName::new(name)).ok_or_else(|| {
            MemError::unavailable(dir.display().to_string(), "port has no decoders")
        })
    }

    fn read_attr(&self, device: &str, attr: &str) -> Result<String, MemError> {
        let path = self.device(device).join(attr);
        let text = fs::read_to_string(&path)
            .map_err(|e| MemError::unavailable(path.display().to_string(), e))?;
        Ok(text.trim_end().to_string())
    }

    fn read_hex(&self, device: &str, attr: &str) -> Result<u64, MemError> {
        let text = self.read_attr(device, attr)?;
        parse_hex(&text).ok_or_else(|| MemError::Unparseable {
            path: format!("{device}/{attr}"),
            value: text,
        })
    }

    fn read_dec<N: std::str::FromStr>(&self, device: &str, attr: &str) -> Result<N, MemError> {
        let text = self.read_attr(device, attr)?;
        text.trim().parse().map_err(|_| MemError::Unparseable {
            path: format!("{device}/{attr}"),
            value: text,
        })
    }

    fn write_path(path: &Path, value: &str) -> Result<(), MemError> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| MemError::unavailable(path.display().to_string(), e))?;
        file.write_all(format!("{value}\n").as_bytes())
            .map_err(|e| MemError::unavailable(path.display().to_string(), e))?;
        debug!("Wrote '{value}' to {}", path.display());
        Ok(())
    }

    fn write_attr(&self, device: &str, attr: &str, value: &str) -> Result<(), MemError> {
        Self::write_path(&self.device(device).join(attr), value)
    }

    /// `bind` / `unbind` on a bus driver.
    fn driver_ctl(bus: &Path, driver: &str, op: &str, device: &str) -> Result<(), MemError> {
        Self::write_path(&bus.join("drivers").join(driver).join(op), device)
    }

    /// The root decoder a region hangs off, from its resolved device path.
    fn parent_decoder(&self, region: &RegionName) -> Result<PathBuf, MemError> {
        let real = self.resolved(region.as_str())?;
        let parent = real.parent().ok_or_else(|| {
            MemError::unavailable(region.as_str(), "region has no parent decoder")
        })?;
        Ok(parent.to_path_buf())
    }
}

fn parse_hex(text: &str) -> Option<u64> {
    let trimmed = text.trim().trim_start_matches("0x");
    u64::from_str_radix(trimmed, 16).ok()
}

/// `decoderN.M` to a sortable `(N, M)`.
fn parse_decoder_id(name: &str) -> Option<(u32, u32)> {
    let rest = name.strip_prefix("decoder")?;
    let (port, idx) = rest.split_once('.')?;
    Some((port.parse().ok()?, idx.parse().ok()?))
}

fn first_child_with_prefix(dir: &Path, prefix: &str) -> Result<Option<PathBuf>, MemError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| MemError::unavailable(dir.display().to_string(), e))?;
    let mut names: Vec<String> = entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with(prefix) && n.len() > prefix.len())
        .collect();
    names.sort_unstable();
    Ok(names.first().map(|n| dir.join(n)))
}

impl CxlTopology for CxlSysfsTopology {
    fn regions(&self) -> Result<Vec<RegionName>, MemError> {
        Ok(self
            .devices_with_prefix("region")?
            .into_iter()
            .map(RegionName::new)
            .collect())
    }

    fn memdevs(&self) -> Result<Vec<MemdevName>, MemError> {
        Ok(self
            .devices_with_prefix("mem")?
            .into_iter()
            .map(MemdevName::new)
            .collect())
    }

    fn root_decoder(&self) -> Result<Option<DecoderName>, MemError> {
        // Root decoders are the ones that can create regions.
        let dir = self.devices();
        let entries = fs::read_dir(&dir)
            .map_err(|e| MemError::unavailable(dir.display().to_string(), e))?;

        let mut candidates: Vec<((u32, u32), String)> = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(key) = parse_decoder_id(&name) else {
                continue;
            };
            if self.device(&name).join("create_ram_region").exists() {
                candidates.push((key, name));
            }
        }
        candidates.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Ok(candidates.into_iter().next().map(|(_, n)| DecoderName::new(n)))
    }

    fn region_base(&self, region: &RegionName) -> Result<u64, MemError> {
        self.read_hex(region.as_str(), "resource")
    }

    fn region_size(&self, region: &RegionName) -> Result<u64, MemError> {
        self.read_hex(region.as_str(), "size")
    }

    fn region_is_enabled(&self, region: &RegionName) -> Result<bool, MemError> {
        Ok(Self::bound_driver(&self.device(region.as_str())).is_some())
    }

    fn region_is_committed(&self, region: &RegionName) -> Result<bool, MemError> {
        Ok(self.read_dec::<u32>(region.as_str(), "commit")? != 0)
    }

    fn region_interleave_ways(&self, region: &RegionName) -> Result<u32, MemError> {
        self.read_dec(region.as_str(), "interleave_ways")
    }

    fn region_interleave_granularity(&self, region: &RegionName) -> Result<u64, MemError> {
        self.read_dec(region.as_str(), "interleave_granularity")
    }

    fn create_ram_region(&self, root: &DecoderName) -> Result<RegionName, MemError> {
        // The decoder names the next region; writing that name back
        // instantiates it.
        let next = self.read_attr(root.as_str(), "create_ram_region")?;
        self.write_attr(root.as_str(), "create_ram_region", &next)?;
        Ok(RegionName::new(next))
    }

    fn set_interleave_ways(&self, region: &RegionName, ways: u32) -> Result<(), MemError> {
        self.write_attr(region.as_str(), "interleave_ways", &ways.to_string())
    }

    fn set_interleave_granularity(
        &self,
        region: &RegionName,
        granularity: u64,
    ) -> Result<(), MemError> {
        self.write_attr(
            region.as_str(),
            "interleave_granularity",
            &granularity.to_string(),
        )
    }

    fn set_region_size(&self, region: &RegionName, size: u64) -> Result<(), MemError> {
        self.write_attr(region.as_str(), "size", &format!("{size:#x}"))
    }

    fn set_region_target(
        &self,
        region: &RegionName,
        slot: u32,
        decoder: &DecoderName,
    ) -> Result<(), MemError> {
        self.write_attr(region.as_str(), &format!("target{slot}"), decoder.as_str())
    }

    fn commit_decode(&self, region: &RegionName) -> Result<(), MemError> {
        self.write_attr(region.as_str(), "commit", "1")
    }

    fn enable_region(&self, region: &RegionName) -> Result<(), MemError> {
        Self::driver_ctl(&self.cxl_bus, "cxl_region", "bind", region.as_str())
    }

    fn disable_region(&self, region: &RegionName) -> Result<(), MemError> {
        Self::driver_ctl(&self.cxl_bus, "cxl_region", "unbind", region.as_str())
    }

    fn delete_region(&self, region: &RegionName) -> Result<(), MemError> {
        let decoder = self.parent_decoder(region)?;
        Self::write_path(&decoder.join("delete_region"), region.as_str())
    }

    fn memdev_ram_size(&self, memdev: &MemdevName) -> Result<u64, MemError> {
        self.read_hex(&format!("{memdev}/ram"), "size")
    }

    fn memdev_is_enabled(&self, memdev: &MemdevName) -> Result<bool, MemError> {
        Ok(Self::bound_driver(&self.device(memdev.as_str())).is_some())
    }

    fn memdev_endpoint_is_enabled(&self, memdev: &MemdevName) -> Result<bool, MemError> {
        let endpoint = self.endpoint_of(memdev)?;
        Ok(Self::bound_driver(&endpoint).is_some())
    }

    fn memdev_port_is_enabled(&self, memdev: &MemdevName) -> Result<bool, MemError> {
        let endpoint = self.endpoint_of(memdev)?;
        let port = endpoint.parent().ok_or_else(|| {
            MemError::unavailable(memdev.as_str(), "endpoint has no parent port")
        })?;
        Ok(Self::bound_driver(port).is_some())
    }

    fn memdev_first_decoder(&self, memdev: &MemdevName) -> Result<DecoderName, MemError> {
        let endpoint = self.endpoint_of(memdev)?;
        Self::first_decoder_in(&endpoint)
    }

    fn memdev_interleave_granularity(&self, memdev: &MemdevName) -> Result<u64, MemError> {
        // Granularity presented by the port feeding the endpoint.
        let endpoint = self.endpoint_of(memdev)?;
        let port = endpoint.parent().ok_or_else(|| {
            MemError::unavailable(memdev.as_str(), "endpoint has no parent port")
        })?;
        let decoder = Self::first_decoder_in(port)?;
        self.read_dec(decoder.as_str(), "interleave_granularity")
    }

    fn set_decoder_ram_mode(&self, decoder: &DecoderName) -> Result<(), MemError> {
        self.write_attr(decoder.as_str(), "mode", "ram")
    }

    fn set_decoder_dpa_size(&self, decoder: &DecoderName, size: u64) -> Result<(), MemError> {
        self.write_attr(decoder.as_str(), "dpa_size", &format!("{size:#x}"))
    }

    fn decoder_region(&self, decoder: &DecoderName) -> Result<Option<RegionName>, MemError> {
        let text = self.read_attr(decoder.as_str(), "region")?;
        match text.as_str() {
            "" | "none" => Ok(None),
            name => Ok(Some(RegionName::new(name))),
        }
    }

    fn region_mode(&self, region: &RegionName) -> Result<RegionMode, MemError> {
        let dax_dev = self.dax_device(region)?;
        // kmem hands the capacity to the page allocator; anything else
        // leaves it a raw dax character device.
        match Self::bound_driver(&dax_dev).as_deref() {
            Some("kmem") => Ok(RegionMode::SystemRam),
            _ => Ok(RegionMode::DevDax),
        }
    }

    fn dax_is_enabled(&self, region: &RegionName) -> Result<bool, MemError> {
        let dax_dev = self.dax_device(region)?;
        Ok(Self::bound_driver(&dax_dev).is_some())
    }

    fn dax_disable(&self, region: &RegionName) -> Result<(), MemError> {
        let dax_dev = self.dax_device(region)?;
        let name = device_name(&dax_dev)?;
        let Some(driver) = Self::bound_driver(&dax_dev) else {
            return Ok(());
        };
        Self::driver_ctl(&self.dax_bus, &driver, "unbind", &name)
    }

    fn dax_enable_devdax(&self, region: &RegionName) -> Result<(), MemError> {
        let dax_dev = self.dax_device(region)?;
        let name = device_name(&dax_dev)?;
        Self::driver_ctl(&self.dax_bus, "device_dax", "bind", &name)
    }

    fn dax_enable_ram(&self, region: &RegionName) -> Result<(), MemError> {
        let dax_dev = self.dax_device(region)?;
        let name = device_name(&dax_dev)?;
        Self::driver_ctl(&self.dax_bus, "kmem", "bind", &name)
    }
}

fn device_name(dir: &Path) -> Result<String, MemError> {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MemError::unavailable(dir.display().to_string(), "nameless device"))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    /// Fake CXL and DAX bus trees under one tempdir.
    struct FakeBuses {
        _tmp: TempDir,
        cxl: PathBuf,
        dax: PathBuf,
    }

    impl FakeBuses {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let cxl = tmp.path().join("cxl");
            let dax = tmp.path().join("dax");
            for driver in ["cxl_region"] {
                let d = cxl.join("drivers").join(driver);
                fs::create_dir_all(&d).unwrap();
                fs::write(d.join("bind"), "").unwrap();
                fs::write(d.join("unbind"), "").unwrap();
            }
            for driver in ["kmem", "device_dax"] {
                let d = dax.join("drivers").join(driver);
                fs::create_dir_all(&d).unwrap();
                fs::write(d.join("bind"), "").unwrap();
                fs::write(d.join("unbind"), "").unwrap();
            }
            fs::create_dir_all(cxl.join("devices")).unwrap();
            Self { _tmp: tmp, cxl, dax }
        }

        fn topology(&self) -> CxlSysfsTopology {
            CxlSysfsTopology::new(&self.cxl, &self.dax)
        }

        /// Register a device as a real directory plus the bus symlink.
        fn add_device(&self, real: &Path, name: &str) {
            fs::create_dir_all(real).unwrap();
            symlink(real, self.cxl.join("devices").join(name)).unwrap();
        }

        fn real_root(&self) -> PathBuf {
            self.cxl.join("real")
        }
    }

    fn attr(dir: &Path, name: &str, value: &str) {
        fs::write(dir.join(name), format!("{value}\n")).unwrap();
    }

    #[test]
    fn test_enumeration_sorted_numerically() {
        let buses = FakeBuses::new();
        for name in ["region10", "region2", "mem0", "mem12", "mem3"] {
            buses.add_device(&buses.real_root().join(name), name);
        }
        let topo = buses.topology();

        let regions: Vec<String> = topo
            .regions()
            .unwrap()
            .iter()
            .map(|r| r.as_str().to_string())
            .collect();
        assert_eq!(regions, vec!["region2", "region10"]);

        let memdevs: Vec<String> = topo
            .memdevs()
            .unwrap()
            .iter()
            .map(|m| m.as_str().to_string())
            .collect();
        assert_eq!(memdevs, vec!["mem0", "mem3", "mem12"]);
    }

    #[test]
    fn test_region_attributes() {
        let buses = FakeBuses::new();
        let real = buses.real_root().join("decoder0.0/region0");
        buses.add_device(&real, "region0");
        attr(&real, "resource", "0x100000000");
        attr(&real, "size", "0x80000000");
        attr(&real, "interleave_ways", "2");
        attr(&real, "interleave_granularity", "256");
        attr(&real, "commit", "1");

        let topo = buses.topology();
        let region = RegionName::new("region0");
        assert_eq!(topo.region_base(&region).unwrap(), 0x1_0000_0000);
        assert_eq!(topo.region_size(&region).unwrap(), 0x8000_0000);
        assert_eq!(topo.region_interleave_ways(&region).unwrap(), 2);
        assert_eq!(topo.region_interleave_granularity(&region).unwrap(), 256);
        assert!(topo.region_is_committed(&region).unwrap());
        assert!(!topo.region_is_enabled(&region).unwrap());
    }

    #[test]
    fn test_root_decoder_needs_create_attribute() {
        let buses = FakeBuses::new();
        let plain = buses.real_root().join("decoder3.0");
        buses.add_device(&plain, "decoder3.0");
        let root = buses.real_root().join("decoder0.0");
        buses.add_device(&root, "decoder0.0");
        attr(&root, "create_ram_region", "region0");

        let topo = buses.topology();
        assert_eq!(
            topo.root_decoder().unwrap().unwrap().as_str(),
            "decoder0.0"
        );
    }

    #[test]
    fn test_create_region_reads_then_writes_name() {
        let buses = FakeBuses::new();
        let root = buses.real_root().join("decoder0.0");
        buses.add_device(&root, "decoder0.0");
        attr(&root, "create_ram_region", "region4");

        let topo = buses.topology();
        let region = topo
            .create_ram_region(&DecoderName::new("decoder0.0"))
            .unwrap();
        assert_eq!(region.as_str(), "region4");
        assert_eq!(
            fs::read_to_string(root.join("create_ram_region")).unwrap(),
            "region4\n"
        );
    }

    #[test]
    fn test_delete_region_targets_parent_decoder() {
        let buses = FakeBuses::new();
        let decoder = buses.real_root().join("decoder0.0");
        let real = decoder.join("region1");
        buses.add_device(&real, "region1");
        fs::write(decoder.join("delete_region"), "").unwrap();

        let topo = buses.topology();
        topo.delete_region(&RegionName::new("region1")).unwrap();
        assert_eq!(
            fs::read_to_string(decoder.join("delete_region")).unwrap(),
            "region1\n"
        );
    }

    #[test]
    fn test_enable_disable_via_driver_bind() {
        let buses = FakeBuses::new();
        let real = buses.real_root().join("decoder0.0/region0");
        buses.add_device(&real, "region0");

        let topo = buses.topology();
        let region = RegionName::new("region0");
        topo.enable_region(&region).unwrap();
        topo.disable_region(&region).unwrap();

        let driver = buses.cxl.join("drivers/cxl_region");
        assert_eq!(fs::read_to_string(driver.join("bind")).unwrap(), "region0\n");
        assert_eq!(
            fs::read_to_string(driver.join("unbind")).unwrap(),
            "region0\n"
        );
    }

    #[test]
    fn test_memdev_decoder_via_endpoint() {
        let buses = FakeBuses::new();
        let mem_real = buses.real_root().join("mem0");
        buses.add_device(&mem_real, "mem0");

        let endpoint = buses.real_root().join("port1/endpoint2");
        buses.add_device(&endpoint, "endpoint2");
        symlink(&mem_real, endpoint.join("uport_dev")).unwrap();
        fs::create_dir_all(endpoint.join("decoder2.1")).unwrap();
        fs::create_dir_all(endpoint.join("decoder2.0")).unwrap();

        let topo = buses.topology();
        let decoder = topo
            .memdev_first_decoder(&MemdevName::new("mem0"))
            .unwrap();
        assert_eq!(decoder.as_str(), "decoder2.0");
    }

    #[test]
    fn test_endpoint_and_port_enablement() {
        let buses = FakeBuses::new();
        let mem_real = buses.real_root().join("mem0");
        buses.add_device(&mem_real, "mem0");

        let port = buses.real_root().join("port1");
        let endpoint = port.join("endpoint2");
        buses.add_device(&endpoint, "endpoint2");
        symlink(&mem_real, endpoint.join("uport_dev")).unwrap();

        let topo = buses.topology();
        let mem0 = MemdevName::new("mem0");
        assert!(!topo.memdev_endpoint_is_enabled(&mem0).unwrap());
        assert!(!topo.memdev_port_is_enabled(&mem0).unwrap());

        let driver = buses.cxl.join("drivers/cxl_port");
        fs::create_dir_all(&driver).unwrap();
        symlink(&driver, endpoint.join("driver")).unwrap();
        assert!(topo.memdev_endpoint_is_enabled(&mem0).unwrap());
        assert!(!topo.memdev_port_is_enabled(&mem0).unwrap());

        symlink(&driver, port.join("driver")).unwrap();
        assert!(topo.memdev_port_is_enabled(&mem0).unwrap());
    }

    #[test]
    fn test_memdev_granularity_from_parent_port() {
        let buses = FakeBuses::new();
        let mem_real = buses.real_root().join("mem0");
        buses.add_device(&mem_real, "mem0");

        // The endpoint hangs under port1; the port's own first decoder
        // carries the granularity the memdev is fed at.
        let port = buses.real_root().join("port1");
        let endpoint = port.join("endpoint2");
        buses.add_device(&endpoint, "endpoint2");
        symlink(&mem_real, endpoint.join("uport_dev")).unwrap();

        let decoder = port.join("decoder1.0");
        buses.add_device(&decoder, "decoder1.0");
        attr(&decoder, "interleave_granularity", "512");

        let topo = buses.topology();
        assert_eq!(
            topo.memdev_interleave_granularity(&MemdevName::new("mem0"))
                .unwrap(),
            512
        );
    }

    #[test]
    fn test_memdev_ram_size_and_enablement() {
        let buses = FakeBuses::new();
        let real = buses.real_root().join("mem0");
        buses.add_device(&real, "mem0");
        fs::create_dir_all(real.join("ram")).unwrap();
        attr(&real.join("ram"), "size", "0x40000000");

        let topo = buses.topology();
        let mem0 = MemdevName::new("mem0");
        assert_eq!(topo.memdev_ram_size(&mem0).unwrap(), 0x4000_0000);
        assert!(!topo.memdev_is_enabled(&mem0).unwrap());

        let driver = buses.cxl.join("drivers/cxl_mem");
        fs::create_dir_all(&driver).unwrap();
        symlink(&driver, real.join("driver")).unwrap();
        assert!(topo.memdev_is_enabled(&mem0).unwrap());
    }

    #[test]
    fn test_dax_mode_follows_bound_driver() {
        let buses = FakeBuses::new();
        let real = buses.real_root().join("decoder0.0/region0");
        let dax_dev = real.join("dax_region0/dax0.0");
        buses.add_device(&real, "region0");
        fs::create_dir_all(&dax_dev).unwrap();

        let topo = buses.topology();
        let region = RegionName::new("region0");

        // Unbound counts as devdax, matching daxctl's view.
        assert_eq!(topo.region_mode(&region).unwrap(), RegionMode::DevDax);
        assert!(!topo.dax_is_enabled(&region).unwrap());

        symlink(buses.dax.join("drivers/kmem"), dax_dev.join("driver")).unwrap();
        assert_eq!(topo.region_mode(&region).unwrap(), RegionMode::SystemRam);
        assert!(topo.dax_is_enabled(&region).unwrap());

        topo.dax_disable(&region).unwrap();
        assert_eq!(
            fs::read_to_string(buses.dax.join("drivers/kmem/unbind")).unwrap(),
            "dax0.0\n"
        );

        topo.dax_enable_devdax(&region).unwrap();
        assert_eq!(
            fs::read_to_string(buses.dax.join("drivers/device_dax/bind")).unwrap(),
            "dax0.0\n"
        );
    }

    #[test]
    fn test_decoder_region_binding() {
        let buses = FakeBuses::new();
        let real = buses.real_root().join("port1/endpoint2/decoder2.0");
        buses.add_device(&real, "decoder2.0");
        attr(&real, "region", "region0");

        let topo = buses.topology();
        let decoder = DecoderName::new("decoder2.0");
        assert_eq!(
            topo.decoder_region(&decoder).unwrap().unwrap().as_str(),
            "region0"
        );

        attr(&real, "region", "none");
        assert_eq!(topo.decoder_region(&decoder).unwrap(), None);
    }
}
