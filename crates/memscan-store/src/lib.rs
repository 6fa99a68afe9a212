//! The swath store: compact per-byte match state for the scan engine
//! (spec §3, §4.1).

mod error;
mod store;
mod swath;

pub use error::StoreError;
pub use store::{
    BuildCursor, MatchLocation, SwathStore, ENTRY_BYTES, SWATH_HEADER_BYTES, THRESHOLD_ENTRIES,
};
pub use swath::{OldValueAndMatchInfo, Swath};
