//! The five recognised options (spec §6 "Options") plus the cosmetic ones
//! the CLI alone cares about.

use anyhow::{bail, Result};
use memscan_region::RegionScanLevel;
use memscan_scan::{Endianness, ScanDataType};

/// Session-wide option state. Defaults match `scanmem`'s historical
/// defaults (expanded spec, "Configuration / options").
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub scan_data_type: ScanDataType,
    pub region_scan_level: RegionScanLevel,
    pub detect_reverse_change: bool,
    pub dump_with_ascii: bool,
    pub endianness: Endianness,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            scan_data_type: ScanDataType::AnyNumber,
            region_scan_level: RegionScanLevel::HeapStackExecutable,
            detect_reverse_change: false,
            dump_with_ascii: false,
            endianness: Endianness::Host,
        }
    }
}

impl Options {
    /// `option key=value` (spec §6); unrecognised keys/values are
    /// user-input errors (spec §7 kind 1).
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "scan_data_type" => self.scan_data_type = parse_scan_data_type(value)?,
            "region_scan_level" => {
                let level: u32 = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("region_scan_level must be 1, 2, or 3"))?;
                self.region_scan_level = RegionScanLevel::from_option_value(level)
                    .ok_or_else(|| anyhow::anyhow!("region_scan_level must be 1, 2, or 3"))?;
            }
            "detect_reverse_change" => self.detect_reverse_change = parse_bool(value)?,
            "dump_with_ascii" => self.dump_with_ascii = parse_bool(value)?,
            "endianness" => {
                self.endianness = match value {
                    "0" => Endianness::Host,
                    "1" => Endianness::Little,
                    "2" => Endianness::Big,
                    _ => bail!("endianness must be 0 (host), 1 (little), or 2 (big)"),
                };
            }
            other => bail!("unknown option {other:?}"),
        }
        Ok(())
    }

    #[must_use]
    pub fn show(&self) -> String {
        format!(
            "scan_data_type={:?}\nregion_scan_level={:?}\ndetect_reverse_change={}\ndump_with_ascii={}\nendianness={:?}",
            self.scan_data_type,
            self.region_scan_level,
            self.detect_reverse_change,
            self.dump_with_ascii,
            self.endianness,
        )
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => bail!("expected 0 or 1, got {value:?}"),
    }
}

fn parse_scan_data_type(value: &str) -> Result<ScanDataType> {
    Ok(match value {
        "number" => ScanDataType::AnyNumber,
        "int" => ScanDataType::AnyInteger,
        "float" => ScanDataType::AnyFloat,
        "int8" => ScanDataType::Int8,
        "int16" => ScanDataType::Int16,
        "int32" => ScanDataType::Int32,
        "int64" => ScanDataType::Int64,
        "float32" => ScanDataType::Float32,
        "float64" => ScanDataType::Float64,
        "bytearray" => ScanDataType::ByteArray,
        "string" => ScanDataType::String,
        other => bail!(
            "unknown scan_data_type {other:?} (expected number, int, int8..int64, float, \
             float32, float64, bytearray, string)"
        ),
    })
}
