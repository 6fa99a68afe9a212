//! The swath store (spec §4.1): the compact container of match state.

use memscan_region::{Region, RegionList};
use memscan_types::MatchFlags;

use crate::error::StoreError;
use crate::swath::{OldValueAndMatchInfo, Swath};

/// Size, in bytes, of one swath's header (`first_byte_in_child` +
/// `number_of_bytes`, both `u64`, per spec §3).
pub const SWATH_HEADER_BYTES: u64 = 16;

/// Size, in bytes, of one `old_value_and_match_info` entry: one byte of
/// old value plus a packed match-flag word.
pub const ENTRY_BYTES: u64 = 3;

/// `sizeof(swath header) + sizeof(entry)`, expressed in entry-units
/// (floor division — spec §4.1). This is the "threshold" spec §8's
/// boundary test refers to: at `gap == THRESHOLD_ENTRIES` padding is still
/// cheaper; at `gap == THRESHOLD_ENTRIES + 1` a new swath is cheaper.
pub const THRESHOLD_ENTRIES: u64 = (SWATH_HEADER_BYTES + ENTRY_BYTES) / ENTRY_BYTES;

fn new_swath_is_cheaper(gap: u64) -> bool {
    gap.saturating_mul(ENTRY_BYTES) >= SWATH_HEADER_BYTES + ENTRY_BYTES
}

/// An opaque handle to the swath currently being appended to by
/// [`SwathStore::add_element`]. Unlike the C original's raw pointer into a
/// reallocatable buffer, this is a plain index into `SwathStore::swaths` —
/// pushing to that `Vec` never invalidates previously issued indices, so
/// there is nothing to re-seat on growth (spec §4.1 "Reallocation
/// discipline").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildCursor(Option<usize>);

impl BuildCursor {
    #[must_use]
    pub const fn empty() -> Self {
        Self(None)
    }
}

impl Default for BuildCursor {
    fn default() -> Self {
        Self::empty()
    }
}

/// The location of one match: which swath and which entry within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLocation {
    pub addr: u64,
    pub flags: MatchFlags,
    pub(crate) swath_index: usize,
    pub(crate) entry_index: usize,
}

/// The compact container of per-byte match state (spec §3 "swath store",
/// §4.1).
#[derive(Debug, Clone)]
pub struct SwathStore {
    swaths: Vec<Swath>,
    max_needed_bytes: u64,
}

impl SwathStore {
    /// Reserves capacity and starts empty (spec §4.1 `allocate`).
    #[must_use]
    pub fn allocate(max_needed_bytes: u64) -> Self {
        Self {
            swaths: Vec::new(),
            max_needed_bytes,
        }
    }

    #[must_use]
    pub fn max_needed_bytes(&self) -> u64 {
        self.max_needed_bytes
    }

    /// Current footprint, in bytes: one header per swath plus one entry
    /// slot per recorded byte. Exposed for the same reason the C source
    /// tracked `bytes_allocated` — so growth can be observed and bounded.
    #[must_use]
    pub fn bytes_allocated(&self) -> u64 {
        self.swaths
            .iter()
            .map(|s| SWATH_HEADER_BYTES + s.number_of_bytes() as u64 * ENTRY_BYTES)
            .sum()
    }

    #[must_use]
    pub fn swaths(&self) -> &[Swath] {
        &self.swaths
    }

    /// Count of entries with `max_width_in_bytes() > 0` (spec §8:
    /// `num_matches` equals this after every scan).
    #[must_use]
    pub fn num_matches(&self) -> usize {
        self.swaths
            .iter()
            .flat_map(Swath::entries)
            .filter(|e| e.is_match())
            .count()
    }

    fn projected_bytes(&self, extra_header: bool, extra_entries: u64) -> u64 {
        self.bytes_allocated()
            + u64::from(extra_header) * SWATH_HEADER_BYTES
            + extra_entries * ENTRY_BYTES
    }

    /// Appends an entry covering the single target address `remote_addr`
    /// to the store, either extending `cursor`'s swath, zero-padding it, or
    /// beginning a new one (spec §4.1 `add_element`).
    ///
    /// Invariant: `remote_addr` must be strictly greater than the address
    /// of the last entry in `cursor`'s swath (or `cursor` must be empty).
    /// Violating it is a programmer error (spec §7 kind 5).
    pub fn add_element(
        &mut self,
        cursor: BuildCursor,
        remote_addr: u64,
        entry: OldValueAndMatchInfo,
    ) -> Result<BuildCursor, StoreError> {
        match cursor.0 {
            None => {
                let projected = self.projected_bytes(true, 1);
                if projected > self.max_needed_bytes {
                    return Err(StoreError::CapacityExceeded {
                        max: self.max_needed_bytes,
                        requested: projected,
                    });
                }
                let mut swath = Swath::new(remote_addr);
                swath.push(entry);
                self.swaths.push(swath);
                Ok(BuildCursor(Some(self.swaths.len() - 1)))
            }
            Some(idx) => {
                let swath = &self.swaths[idx];
                if swath.number_of_bytes() == 0 {
                    let projected = self.projected_bytes(false, 1);
                    if projected > self.max_needed_bytes {
                        return Err(StoreError::CapacityExceeded {
                            max: self.max_needed_bytes,
                            requested: projected,
                        });
                    }
                    let swath = &mut self.swaths[idx];
                    swath.set_first_byte(remote_addr);
                    swath.push(entry);
                    return Ok(cursor);
                }

                let last_addr = swath.last_addr().expect("checked non-empty above");
                assert!(
                    remote_addr > last_addr,
                    "add_element requires strictly increasing addresses \
                     (last={last_addr:#x}, new={remote_addr:#x})"
                );
                let gap = remote_addr - swath.end_addr();

                if gap > 0 && new_swath_is_cheaper(gap) {
                    let projected = self.projected_bytes(true, 1);
                    if projected > self.max_needed_bytes {
                        return Err(StoreError::CapacityExceeded {
                            max: self.max_needed_bytes,
                            requested: projected,
                        });
                    }
                    tracing::trace!(gap, "add_element: starting new swath");
                    let mut swath = Swath::new(remote_addr);
                    swath.push(entry);
                    self.swaths.push(swath);
                    Ok(BuildCursor(Some(self.swaths.len() - 1)))
                } else {
                    let projected = self.projected_bytes(false, gap + 1);
                    if projected > self.max_needed_bytes {
                        return Err(StoreError::CapacityExceeded {
                            max: self.max_needed_bytes,
                            requested: projected,
                        });
                    }
                    if gap > 0 {
                        tracing::trace!(gap, "add_element: padding current swath");
                    }
                    let swath = &mut self.swaths[idx];
                    swath.pad(gap);
                    swath.push(entry);
                    Ok(cursor)
                }
            }
        }
    }

    /// Finalises the store after a scan pass: drops any swath past
    /// `cursor` (left over from a previous, longer pass) and discards a
    /// trailing swath that never received an entry (spec §4.1
    /// `null_terminate`).
    pub fn null_terminate(&mut self, cursor: BuildCursor) {
        let keep = match cursor.0 {
            Some(idx) if self.swaths[idx].number_of_bytes() > 0 => idx + 1,
            Some(idx) => idx,
            None => 0,
        };
        self.swaths.truncate(keep);
    }

    /// Returns the location of the n-th entry (0-indexed) whose
    /// `max_width_in_bytes() > 0` (spec §4.1 `nth_match`).
    #[must_use]
    pub fn nth_match(&self, n: usize) -> Option<MatchLocation> {
        let mut seen = 0usize;
        for (swath_index, swath) in self.swaths.iter().enumerate() {
            for (entry_index, entry) in swath.entries().iter().enumerate() {
                if !entry.is_match() {
                    continue;
                }
                if seen == n {
                    return Some(MatchLocation {
                        addr: swath.addr_of(entry_index),
                        flags: entry.match_info,
                        swath_index,
                        entry_index,
                    });
                }
                seen += 1;
            }
        }
        None
    }

    /// Reads back up to `width` old-value bytes starting at `location`,
    /// pulled from the starting entry plus its continuation entries (spec
    /// §3: "subsequent entries cover the continuation bytes and must be
    /// readable by scan routines of width W"). Continuation entries are
    /// always contiguous with their starting entry in the same swath,
    /// since they were appended immediately after it with `gap == 0`.
    #[must_use]
    pub fn old_bytes_at(&self, location: MatchLocation, width: usize) -> Vec<u8> {
        let swath = &self.swaths[location.swath_index];
        swath.entries()[location.entry_index..]
            .iter()
            .take(width)
            .map(|e| e.old_value)
            .collect()
    }

    /// Iterates every current match in ascending address order.
    pub fn iter_matches(&self) -> impl Iterator<Item = MatchLocation> + '_ {
        self.swaths.iter().enumerate().flat_map(|(si, swath)| {
            swath
                .entries()
                .iter()
                .enumerate()
                .filter(|(_, e)| e.is_match())
                .map(move |(ei, e)| MatchLocation {
                    addr: swath.addr_of(ei),
                    flags: e.match_info,
                    swath_index: si,
                    entry_index: ei,
                })
        })
    }

    /// Clears the flags at `location`, deleting that match (spec §4.4
    /// `delete`).
    pub fn clear_at(&mut self, location: MatchLocation) {
        if let Some(swath) = self.swaths.get_mut(location.swath_index) {
            if let Some(entry) = swath.entries_mut().get_mut(location.entry_index) {
                entry.match_info.clear();
            }
        }
    }

    /// Clears the flags of all entries whose remote address falls inside
    /// (`keep_inside = false`) or outside (`keep_inside = true`) `region`
    /// (spec §4.1 `delete_by_region`).
    pub fn delete_by_region(&mut self, region: &Region, keep_inside: bool) {
        for swath in &mut self.swaths {
            let first = swath.first_byte_in_child();
            for (i, entry) in swath.entries_mut().iter_mut().enumerate() {
                if !entry.is_match() {
                    continue;
                }
                let addr = first + i as u64;
                let inside = region.contains(addr);
                if inside == keep_inside {
                    continue;
                }
                entry.match_info.clear();
            }
        }
    }

    /// Sweeps the store so only entries inside a surviving region of
    /// `regions` keep non-zero flags (the swath-store half of spec §4.4
    /// `dregion`; the region-list half is [`memscan_region::RegionList::drop_by_ids`]).
    pub fn retain_only_regions(&mut self, regions: &RegionList) {
        for swath in &mut self.swaths {
            let first = swath.first_byte_in_child();
            for (i, entry) in swath.entries_mut().iter_mut().enumerate() {
                if !entry.is_match() {
                    continue;
                }
                let addr = first + i as u64;
                if regions.containing(addr).is_none() {
                    entry.match_info.clear();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memscan_region::{Permissions, RegionType};
    use memscan_types::ScalarWidths;

    fn entry(flags: MatchFlags) -> OldValueAndMatchInfo {
        OldValueAndMatchInfo {
            old_value: 0,
            match_info: flags,
        }
    }

    fn u8_entry() -> OldValueAndMatchInfo {
        entry(MatchFlags::from_scalars(ScalarWidths::U8))
    }

    #[test]
    fn add_element_on_empty_store_starts_a_swath() {
        let mut store = SwathStore::allocate(1 << 20);
        let cursor = store
            .add_element(BuildCursor::empty(), 0x1000, u8_entry())
            .unwrap();
        store.null_terminate(cursor);
        assert_eq!(store.num_matches(), 1);
        assert_eq!(store.swaths().len(), 1);
        assert_eq!(store.swaths()[0].first_byte_in_child(), 0x1000);
    }

    #[test]
    fn contiguous_addresses_stay_in_one_swath() {
        let mut store = SwathStore::allocate(1 << 20);
        let mut cursor = BuildCursor::empty();
        for addr in 0x1000..0x1005 {
            cursor = store.add_element(cursor, addr, u8_entry()).unwrap();
        }
        store.null_terminate(cursor);
        assert_eq!(store.swaths().len(), 1);
        assert_eq!(store.swaths()[0].number_of_bytes(), 5);
    }

    #[test]
    fn small_gap_pads_rather_than_splitting() {
        let mut store = SwathStore::allocate(1 << 20);
        let mut cursor = store
            .add_element(BuildCursor::empty(), 0x1000, u8_entry())
            .unwrap();
        // gap == THRESHOLD_ENTRIES: padding must still be chosen.
        let next_addr = 0x1000 + 1 + THRESHOLD_ENTRIES;
        cursor = store.add_element(cursor, next_addr, u8_entry()).unwrap();
        store.null_terminate(cursor);
        assert_eq!(store.swaths().len(), 1, "expected padding, not a new swath");
        assert_eq!(store.num_matches(), 2);
    }

    #[test]
    fn gap_past_threshold_starts_a_new_swath() {
        let mut store = SwathStore::allocate(1 << 20);
        let mut cursor = store
            .add_element(BuildCursor::empty(), 0x1000, u8_entry())
            .unwrap();
        let next_addr = 0x1000 + 1 + THRESHOLD_ENTRIES + 1;
        cursor = store.add_element(cursor, next_addr, u8_entry()).unwrap();
        store.null_terminate(cursor);
        assert_eq!(store.swaths().len(), 2, "expected a new swath, not padding");
        assert_eq!(store.num_matches(), 2);
    }

    #[test]
    fn nth_match_walks_swaths_in_address_order() {
        let mut store = SwathStore::allocate(1 << 20);
        let mut cursor = store
            .add_element(BuildCursor::empty(), 0x1000, u8_entry())
            .unwrap();
        let far = 0x1000 + THRESHOLD_ENTRIES + 50;
        cursor = store.add_element(cursor, far, u8_entry()).unwrap();
        store.null_terminate(cursor);

        assert_eq!(store.nth_match(0).unwrap().addr, 0x1000);
        assert_eq!(store.nth_match(1).unwrap().addr, far);
        assert!(store.nth_match(2).is_none());
    }

    #[test]
    fn delete_by_region_clears_only_the_requested_side() {
        let mut store = SwathStore::allocate(1 << 20);
        let mut cursor = store
            .add_element(BuildCursor::empty(), 0x1000, u8_entry())
            .unwrap();
        let far = 0x1000 + THRESHOLD_ENTRIES + 50;
        cursor = store.add_element(cursor, far, u8_entry()).unwrap();
        store.null_terminate(cursor);

        let region = Region {
            id: 1,
            start: 0x1000,
            size: 0x10,
            load_addr: 0x1000,
            permissions: Permissions {
                read: true,
                write: true,
                exec: false,
            },
            region_type: RegionType::Heap,
            filename: None,
        };
        store.delete_by_region(&region, false);
        assert_eq!(store.num_matches(), 1);
        assert_eq!(store.nth_match(0).unwrap().addr, far);
    }

    #[test]
    fn capacity_exceeded_leaves_store_untouched() {
        let mut store = SwathStore::allocate(SWATH_HEADER_BYTES + ENTRY_BYTES);
        let cursor = store
            .add_element(BuildCursor::empty(), 0x1000, u8_entry())
            .unwrap();
        let err = store.add_element(cursor, 0x2000, u8_entry());
        assert!(err.is_err());
        // The one successful element is still there.
        assert_eq!(store.num_matches(), 1);
    }

    #[test]
    fn clearing_is_equivalent_to_deleting() {
        let mut store = SwathStore::allocate(1 << 20);
        let cursor = store
            .add_element(BuildCursor::empty(), 0x1000, u8_entry())
            .unwrap();
        store.null_terminate(cursor);
        let loc = store.nth_match(0).unwrap();
        store.clear_at(loc);
        assert_eq!(store.num_matches(), 0);
    }
}
