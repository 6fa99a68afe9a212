//! Session-level error kinds (spec §7).

use memscan_scan::ScanError;
use memscan_store::StoreError;

use crate::target_io::TargetIoError;

/// Errors surfaced by the session layer. Each variant maps onto one of
/// spec §7's kinds; cancellation is deliberately not a variant here — it
/// is reported through [`crate::driver::ScanOutcome::cancelled`] instead,
/// per spec §7 kind 4 ("not an error").
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no target process is attached")]
    NotAttached,

    #[error("no matches to operate on")]
    NoMatches,

    #[error("match id {0} is out of range")]
    UnknownMatchId(usize),

    #[error("region id {0} is unknown")]
    UnknownRegionId(u32),

    #[error("{0}")]
    Scan(#[from] ScanError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    TargetIo(#[from] TargetIoError),
}
