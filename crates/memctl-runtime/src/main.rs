//! # memctl
//!
//! Command-line control of kernel memory blocks and CXL interleaved
//! regions: inspect the block registry, drive single-block and per-region
//! state transitions, set the auto-online policy, and provision or retire
//! RAM regions across CXL memdevs.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mem_core::adapters::SysfsAttrStore;
use mem_core::ports::inbound::{BlockApi, PolicyApi, RegionApi};
use mem_core::ports::outbound::CxlTopology;
use mem_core::service::MemoryService;
use mem_types::{BlockState, MemdevName};

use memctl_runtime::cli::{
    BlockCommand, Cli, Command, PolicyCommand, RegionCommand, ShowCommand,
};
use memctl_runtime::{format, CxlSysfsTopology, RuntimeConfig};

type Service = MemoryService<SysfsAttrStore, CxlSysfsTopology>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("MEMCTL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config =
        RuntimeConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(root) = cli.memory_root {
        config.memory_root = root;
    }

    let attrs = SysfsAttrStore::new(&config.memory_root);
    let topology = CxlSysfsTopology::new(&config.cxl_bus, &config.dax_bus);
    let mut service = MemoryService::new(attrs, topology);

    match cli.command {
        Command::Show(cmd) => show(&mut service, cmd),
        Command::Block(cmd) => block(&mut service, cmd),
        Command::Policy(cmd) => policy(&mut service, cmd),
        Command::Region(cmd) => region(&mut service, cmd),
    }
}

fn show(service: &mut Service, cmd: ShowCommand) -> Result<()> {
    match cmd {
        ShowCommand::Blocks => {
            let blocks = service.blocks()?;
            print!("{}", format::block_table(&blocks));
        }
        ShowCommand::Block { id } => {
            let blk = service.block(id)?;
            println!("{}", format::block_row(&blk));
            if let Some(region) = service.region_of(id)? {
                println!("region: {region}");
            }
        }
        ShowCommand::Regions => {
            for region in service.regions()? {
                let blocks = service.num_blocks_of(&region)?;
                let capacity = service.capacity_of(&region)?;
                match service.region_bounds(&region)? {
                    Some(range) => println!(
                        "{region}  {:#x}-{:#x}  {} in {blocks} blocks",
                        range.base,
                        range.end(),
                        format::bytes(capacity),
                    ),
                    None => println!("{region}  (not sized)"),
                }
            }
        }
        ShowCommand::Memdevs => {
            for memdev in service.memdevs()? {
                let size = service.topology().memdev_ram_size(&memdev)?;
                let available = service.memdev_is_available(&memdev)?;
                let status = if available { "available" } else { "in use" };
                match service.memdev_granularity(&memdev) {
                    Ok(granularity) => println!(
                        "{memdev}  {} RAM  granularity {granularity}  {status}",
                        format::bytes(size),
                    ),
                    // A memdev with no configured port above it still lists.
                    Err(_) => println!("{memdev}  {} RAM  {status}", format::bytes(size)),
                }
            }
        }
        ShowCommand::Capacity => {
            println!("total:   {}", format::bytes(service.capacity()?));
            println!("online:  {}", format::bytes(service.capacity_online()?));
            println!("offline: {}", format::bytes(service.capacity_offline()?));
        }
        ShowCommand::Policy => println!("{}", service.policy()?),
    }
    Ok(())
}

fn block(service: &mut Service, cmd: BlockCommand) -> Result<()> {
    match cmd {
        BlockCommand::Offline { id } => service.offline_block(id)?,
        BlockCommand::Online { id } => service.online_block(id)?,
        BlockCommand::SetState { id, state } => service.set_block_state(id, state)?,
    }
    Ok(())
}

fn policy(service: &mut Service, cmd: PolicyCommand) -> Result<()> {
    match cmd {
        PolicyCommand::Set { state } => service.set_policy(state)?,
    }
    Ok(())
}

fn region(service: &mut Service, cmd: RegionCommand) -> Result<()> {
    match cmd {
        RegionCommand::Create(args) => {
            let memdevs: Vec<MemdevName> =
                args.memdevs.iter().map(MemdevName::new).collect();
            let region = service.create_region(args.granularity, &memdevs)?;
            println!("{region}");
        }
        RegionCommand::Delete { region } => {
            let region = service.region_by_name(&region)?;
            service.delete_region(&region)?;
        }
        RegionCommand::Enable { region } => {
            let region = service.region_by_name(&region)?;
            service.enable_region(&region)?;
        }
        RegionCommand::Disable { region } => {
            let region = service.region_by_name(&region)?;
            service.disable_region(&region)?;
        }
        RegionCommand::Daxmode { region } => {
            let region = service.region_by_name(&region)?;
            service.dax_mode(&region)?;
        }
        RegionCommand::Rammode { region } => {
            let region = service.region_by_name(&region)?;
            service.ram_mode(&region)?;
        }
        RegionCommand::Blocks { region } => {
            let region = service.region_by_name(&region)?;
            let blocks = service.blocks_of(&region)?;
            print!("{}", format::block_table(&blocks));
        }
        RegionCommand::Offline { region } => {
            let region = service.region_by_name(&region)?;
            service.offline_blocks(&region)?;
        }
        RegionCommand::Online { region } => {
            let region = service.region_by_name(&region)?;
            service.online_blocks(&region)?;
        }
        RegionCommand::BlockState { region, offset } => {
            let region = service.region_by_name(&region)?;
            let state: BlockState = service.region_block_state(&region, offset)?;
            println!("{state}");
        }
        RegionCommand::SetBlockState {
            region,
            offset,
            state,
        } => {
            let region = service.region_by_name(&region)?;
            service.set_region_block_state(&region, offset, state)?;
        }
    }
    Ok(())
}
