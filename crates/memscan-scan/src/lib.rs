//! Scan routine family (spec §4.2): resolving a `(scan_data_type,
//! match_type)` pair against an entry's old/new bytes.
//!
//! This crate is deliberately independent of `memscan-store` — it only
//! knows about flags and raw byte slices. Reconstructing a multi-byte old
//! value out of a swath's one-byte-per-entry history is the scan driver's
//! job (`memscan-session`), not this crate's.

mod error;
mod options;
mod routine;
mod types;

pub use error::ScanError;
pub use options::{Endianness, ScanOptions};
pub use routine::{evaluate, ScanContext};
pub use types::{MatchType, ScanDataType};
