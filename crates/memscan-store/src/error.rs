//! Resource-error kind for the swath store (spec §7 kind 3).

/// Resource error raised by the store. Per spec §7 kind 3, a caller that
/// receives this must abort the current scan pass and leave the store as
/// it was before the failed operation — it is never left inconsistent.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(
        "swath store would exceed its capacity bound (max_needed_bytes={max}, \
         requested={requested})"
    )]
    CapacityExceeded { max: u64, requested: u64 },
}
