//! Match navigator and region-deletion bulk operation (spec §4.4).

use memscan_region::RegionList;
use memscan_store::{MatchLocation, SwathStore};

use crate::error::SessionError;

/// Translates a user-visible match ordinal into its location (spec §4.4
/// "match navigator"), or `UnknownMatchId` if it's out of range.
pub fn resolve(store: &SwathStore, ordinal: usize) -> Result<MatchLocation, SessionError> {
    store
        .nth_match(ordinal)
        .ok_or(SessionError::UnknownMatchId(ordinal))
}

/// `delete` (spec §4.4): clears the resolved entry's flags.
pub fn delete(store: &mut SwathStore, ordinal: usize) -> Result<(), SessionError> {
    let location = resolve(store, ordinal)?;
    store.clear_at(location);
    Ok(())
}

/// `dregion` (spec §4.4): drops the named regions (or, with `invert`,
/// keeps only them) and sweeps the store so only entries inside a
/// surviving region keep non-zero flags.
pub fn dregion(
    store: &mut SwathStore,
    regions: &mut RegionList,
    ids: &[u32],
    invert: bool,
) -> Result<(), SessionError> {
    for &id in ids {
        if regions.by_id(id).is_none() {
            return Err(SessionError::UnknownRegionId(id));
        }
    }
    regions.drop_by_ids(ids, invert);
    store.retain_only_regions(regions);
    Ok(())
}
