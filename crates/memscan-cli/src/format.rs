//! List and dump formatting (spec §6 "List/Dump format strings").

use memscan_region::{Region, RegionList};
use memscan_store::MatchLocation;
use memscan_types::{Aggregate, MatchFlags, ScalarWidths, ScanValue};

/// One `list` row: `[ordinal] address, region-type + offset, width, value`.
#[must_use]
pub fn list_row(ordinal: usize, location: &MatchLocation, regions: &RegionList, bytes: &[u8]) -> String {
    let region = regions.containing(location.addr);
    let (kind, offset) = match region {
        Some(r) => (format!("{:?}", r.region_type), location.addr - r.start),
        None => ("?".to_string(), 0),
    };
    format!(
        "[{ordinal:>3}] {:#018x}, {kind:>5} + {offset:#06x}, {:>5}, {}",
        location.addr,
        width_label(location.flags),
        value_label(location.flags, bytes),
    )
}

/// Header line printed once before a `list` run.
#[must_use]
pub fn list_header(count: usize) -> String {
    format!("{count} matches")
}

fn width_label(flags: MatchFlags) -> String {
    match flags.aggregate() {
        Aggregate::ByteArray(n) => format!("ba{n}"),
        Aggregate::String(n) => format!("s{n}"),
        Aggregate::None => {
            let bytes = flags.max_width_in_bytes();
            format!("{bytes}B")
        }
    }
}

/// The widest still-viable scalar reading of `bytes`, or the raw bytes
/// for an aggregate match.
fn value_label(flags: MatchFlags, bytes: &[u8]) -> String {
    match flags.aggregate() {
        Aggregate::ByteArray(_) => hex_bytes(bytes),
        Aggregate::String(_) => String::from_utf8_lossy(bytes).into_owned(),
        Aggregate::None => widest_scalar(flags.scalars())
            .and_then(|bit| ScanValue::read(bit, bytes))
            .map_or_else(|| "?".to_string(), |v| v.to_string()),
    }
}

fn widest_scalar(scalars: ScalarWidths) -> Option<ScalarWidths> {
    ScalarWidths::all()
        .iter()
        .filter(|bit| scalars.contains(*bit))
        .max_by_key(|bit| ScalarWidths::width_bytes(*bit))
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}

/// One `lregions` row.
#[must_use]
pub fn region_row(region: &Region) -> String {
    format!(
        "{:#018x}-{:#018x} {:>7} {:?} {}",
        region.start,
        region.end(),
        region.size,
        region.region_type,
        region.filename.as_deref().unwrap_or("")
    )
}

/// Hex-dump formatting: 16 bytes per line, optional leading address,
/// optional trailing ASCII panel (spec §6 `dump_with_ascii`).
#[must_use]
pub fn dump(addr: u64, bytes: &[u8], with_ascii: bool) -> String {
    let mut out = String::new();
    for (line_index, chunk) in bytes.chunks(16).enumerate() {
        let line_addr = addr + (line_index * 16) as u64;
        out.push_str(&format!("{line_addr:#018x}: "));
        for byte in chunk {
            out.push_str(&format!("{byte:02x} "));
        }
        for _ in chunk.len()..16 {
            out.push_str("   ");
        }
        if with_ascii {
            out.push_str(" |");
            for byte in chunk {
                let c = if byte.is_ascii_graphic() || *byte == b' ' {
                    *byte as char
                } else {
                    '.'
                };
                out.push(c);
            }
            out.push('|');
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_pads_a_short_final_line() {
        let text = dump(0, &[1, 2, 3], true);
        assert!(text.contains("01 02 03"));
        assert!(text.contains('|'));
    }

    #[test]
    fn dump_without_ascii_omits_the_panel() {
        let text = dump(0, &[1, 2, 3], false);
        assert!(!text.contains('|'));
    }

    #[test]
    fn width_label_reports_aggregate_length() {
        let flags = MatchFlags::from_byte_array(3);
        assert_eq!(width_label(flags), "ba3");
    }
}
