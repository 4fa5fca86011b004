//! # Output Rendering
//!
//! Plain fixed-width tables and IEC byte units. Everything returns a
//! `String` so the command layer owns the actual printing.

use mem_types::{MemoryBlock, ZoneSet};

const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// `1073741824` to `"1.0 GiB"`; exact multiples drop to one decimal too.
pub fn bytes(n: u64) -> String {
    if n < 1024 {
        return format!("{n} B");
    }
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// One line per block: id, node, state, zones.
pub fn block_table(blocks: &[MemoryBlock]) -> String {
    let mut out = String::from("BLOCK  NODE  STATE           ZONES\n");
    for blk in blocks {
        out.push_str(&block_row(blk));
        out.push('\n');
    }
    out
}

pub fn block_row(blk: &MemoryBlock) -> String {
    let state = mem_core::classify(blk);
    format!(
        "{:<5}  {:<4}  {:<14}  {}",
        blk.id,
        blk.node,
        state.kernel_name(),
        zones(blk.valid_zones)
    )
}

fn zones(set: ZoneSet) -> String {
    if set.is_empty() {
        "-".to_string()
    } else {
        set.to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use mem_types::BlockState;

    #[test]
    fn test_bytes_units() {
        assert_eq!(bytes(0), "0 B");
        assert_eq!(bytes(512), "512 B");
        assert_eq!(bytes(1024), "1.0 KiB");
        assert_eq!(bytes(0x1000_0000), "256.0 MiB");
        assert_eq!(bytes(3 * (1 << 30) / 2), "1.5 GiB");
    }

    #[test]
    fn test_block_row_shows_classified_state() {
        let mut blk = MemoryBlock::new(7);
        blk.node = 1;
        blk.online = true;
        blk.valid_zones = ZoneSet::MOVABLE;
        let row = block_row(&blk);
        assert!(row.contains(BlockState::Movable.kernel_name()));
        assert!(row.starts_with('7'));
    }
}
