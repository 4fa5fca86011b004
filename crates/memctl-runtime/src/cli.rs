//! # Command Tree
//!
//! `memctl <area> <action>`, mirroring the service's three API surfaces:
//! `show` for queries, `block` and `policy` for the kernel tree, `region`
//! for the CXL lifecycle.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use mem_types::BlockState;

/// memctl: kernel memory block and CXL region control
#[derive(Parser, Debug)]
#[command(name = "memctl")]
#[command(about = "Manage kernel memory blocks and CXL interleaved regions")]
#[command(version)]
pub struct Cli {
    /// JSON config file with tree locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the kernel memory-block tree
    #[arg(long, global = true)]
    pub memory_root: Option<PathBuf>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect blocks, regions, memdevs and capacities
    #[command(subcommand)]
    Show(ShowCommand),

    /// Operate on a single memory block
    #[command(subcommand)]
    Block(BlockCommand),

    /// The system auto-online policy
    #[command(subcommand)]
    Policy(PolicyCommand),

    /// Region lifecycle and bulk block operations
    #[command(subcommand)]
    Region(RegionCommand),
}

#[derive(Subcommand, Debug)]
pub enum ShowCommand {
    /// All memory blocks with node, state and zones
    Blocks,
    /// One memory block
    Block { id: u32 },
    /// All CXL regions with their ranges and member counts
    Regions,
    /// All CXL memdevs with capacity and availability
    Memdevs,
    /// System-wide capacity totals
    Capacity,
    /// The auto-online policy
    Policy,
}

#[derive(Subcommand, Debug)]
pub enum BlockCommand {
    /// Offline a block
    Offline { id: u32 },
    /// Online a block into the movable zone
    Online { id: u32 },
    /// Move a block to an explicit state
    SetState {
        id: u32,
        #[arg(value_parser = parse_state)]
        state: BlockState,
    },
}

#[derive(Subcommand, Debug)]
pub enum PolicyCommand {
    /// Set the auto-online policy
    Set {
        #[arg(value_parser = parse_state)]
        state: BlockState,
    },
}

#[derive(Subcommand, Debug)]
pub enum RegionCommand {
    /// Create an interleaved RAM region across memdevs
    Create(CreateArgs),
    /// Offline members, disable, then delete a region
    Delete { region: String },
    /// Bind the region driver
    Enable { region: String },
    /// Unbind the region driver
    Disable { region: String },
    /// Switch the region's capacity to device-dax
    Daxmode { region: String },
    /// Switch the region's capacity to system-ram
    Rammode { region: String },
    /// Member blocks of a region
    Blocks { region: String },
    /// Offline every member block
    Offline { region: String },
    /// Online every member block into the movable zone
    Online { region: String },
    /// State of the block at a block offset into the region
    BlockState { region: String, offset: u32 },
    /// Transition the block at a block offset into the region
    SetBlockState {
        region: String,
        offset: u32,
        #[arg(value_parser = parse_state)]
        state: BlockState,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Interleave granularity in bytes
    #[arg(long, short, default_value_t = 256)]
    pub granularity: u64,

    /// Memdevs to interleave, in target order
    #[arg(required = true)]
    pub memdevs: Vec<String>,
}

/// Accepts both the short and the kernel spelling of each state.
fn parse_state(s: &str) -> Result<BlockState, String> {
    match s {
        "kernel" => return Ok(BlockState::Kernel),
        "movable" => return Ok(BlockState::Movable),
        _ => {}
    }
    BlockState::from_kernel_name(s).ok_or_else(|| {
        format!("unknown state '{s}' (expected offline, online, kernel or movable)")
    })
}

// =============================================================================
// TESTS
// =============================================================================
