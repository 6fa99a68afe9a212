//! The scan driver (spec §4.3): first-scan (region walk) and next-scan
//! (match walk, narrowing into a freshly built store).

use memscan_region::{Region, RegionList, RegionScanLevel};
use memscan_scan::{evaluate, MatchType, ScanContext, ScanDataType, ScanOptions};
use memscan_store::{BuildCursor, OldValueAndMatchInfo, SwathStore};
use memscan_types::{MatchFlags, UserValue};

use crate::error::SessionError;
use crate::target_io::{CancellationFlag, Pid, TargetIo};

/// Result of one scan pass (spec §4.3 step 4 / §5 cancellation semantics).
#[derive(Debug, Clone, Copy)]
pub struct ScanOutcome {
    pub num_matches: usize,
    pub cancelled: bool,
}

/// Rough upper bound for the store backing a scan over `regions`: one entry
/// per byte plus a header per region (a region can split into at most a
/// handful of swaths in practice, so this headroom is generous, not exact).
fn max_needed_bytes(regions: &[&Region]) -> u64 {
    let total_bytes: u64 = regions.iter().map(|r| r.size).sum();
    let headers: u64 = regions.len() as u64 * memscan_store::SWATH_HEADER_BYTES * 4;
    total_bytes * memscan_store::ENTRY_BYTES + headers
}

/// First scan (spec §4.3 "First scan"): walks `regions` filtered by
/// `level`, evaluating every byte offset against `(scan_data_type,
/// match_type)` and building a fresh store.
pub fn first_scan(
    target: &mut dyn TargetIo,
    pid: Pid,
    regions: &RegionList,
    level: RegionScanLevel,
    scan_data_type: ScanDataType,
    match_type: MatchType,
    user_value: &UserValue,
    scan_options: &ScanOptions,
    cancel: &CancellationFlag,
) -> Result<(SwathStore, ScanOutcome), SessionError> {
    let filtered: Vec<&Region> = regions.filtered(level).collect();
    let mut store = SwathStore::allocate(max_needed_bytes(&filtered));
    let mut cursor = BuildCursor::empty();
    let mut cancelled = false;

    let ctx = ScanContext {
        scan_data_type,
        match_type,
        user_value,
        options: scan_options,
    };

    'regions: for region in &filtered {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let mut buf = vec![0u8; region.size as usize];
        let n = match target.read_bytes(pid, region.start, &mut buf) {
            Ok(n) => n,
            Err(err) => {
                tracing::warn!(region = region.id, %err, "region became unreadable mid-scan");
                continue;
            }
        };

        let mut continuation_remaining: usize = 0;
        for i in 0..n {
            if i % 4096 == 0 && cancel.is_cancelled() {
                cancelled = true;
                break 'regions;
            }

            let addr = region.start + i as u64;
            let flags = evaluate(&ctx, None, None, &buf[i..n])?;

            let entry = match flags {
                Some(flags) => {
                    let width = flags.max_width_in_bytes() as usize;
                    continuation_remaining = continuation_remaining.max(width.saturating_sub(1));
                    Some(OldValueAndMatchInfo {
                        old_value: buf[i],
                        match_info: flags,
                    })
                }
                None if continuation_remaining > 0 => {
                    continuation_remaining -= 1;
                    Some(OldValueAndMatchInfo {
                        old_value: buf[i],
                        match_info: MatchFlags::NONE,
                    })
                }
                None => None,
            };

            if let Some(entry) = entry {
                cursor = store.add_element(cursor, addr, entry)?;
            }
        }

        store.null_terminate(cursor);
        tracing::debug!(region = region.id, matches = store.num_matches(), "region scanned");
    }

    store.null_terminate(cursor);
    let num_matches = store.num_matches();
    tracing::info!(num_matches, cancelled, "first scan complete");
    Ok((store, ScanOutcome { num_matches, cancelled }))
}

/// Next scan (spec §4.3 "Next scan"): narrows `old_store` into a freshly
/// built store rather than rewriting in place. This sidesteps the aliasing
/// the C original manages with a lagging write cursor into the same
/// buffer — a fresh `Vec`-backed store with stable indices has no such
/// hazard, and the old store stays valid to read from for as long as the
/// pass runs (useful on cancellation: the caller can simply keep it).
pub fn next_scan(
    target: &mut dyn TargetIo,
    pid: Pid,
    old_store: &SwathStore,
    scan_data_type: ScanDataType,
    match_type: MatchType,
    user_value: &UserValue,
    scan_options: &ScanOptions,
    cancel: &CancellationFlag,
) -> Result<(SwathStore, ScanOutcome), SessionError> {
    let mut new_store = SwathStore::allocate(old_store.max_needed_bytes());
    let mut cursor = BuildCursor::empty();
    let mut cancelled = false;

    let ctx = ScanContext {
        scan_data_type,
        match_type,
        user_value,
        options: scan_options,
    };

    for (i, location) in old_store.iter_matches().enumerate() {
        if i % 256 == 0 && cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let width = location.flags.max_width_in_bytes() as usize;
        let old_bytes = old_store.old_bytes_at(location, width);

        let mut buf = vec![0u8; width];
        let n = match target.read_bytes(pid, location.addr, &mut buf) {
            Ok(n) => n,
            Err(err) => {
                tracing::warn!(addr = location.addr, %err, "match became unreadable mid-scan");
                continue;
            }
        };

        let new_flags = evaluate(&ctx, Some(location.flags), Some(&old_bytes), &buf[..n])?;
        let Some(new_flags) = new_flags else {
            continue;
        };

        let starting = OldValueAndMatchInfo {
            old_value: buf[0],
            match_info: new_flags,
        };
        cursor = new_store.add_element(cursor, location.addr, starting)?;
        for (offset, &byte) in buf.iter().enumerate().skip(1).take(width - 1) {
            let continuation = OldValueAndMatchInfo {
                old_value: byte,
                match_info: MatchFlags::NONE,
            };
            cursor = new_store.add_element(cursor, location.addr + offset as u64, continuation)?;
        }
    }

    new_store.null_terminate(cursor);
    let num_matches = new_store.num_matches();
    tracing::info!(num_matches, cancelled, "next scan complete");
    debug_assert!(
        num_matches <= old_store.num_matches(),
        "next scan must never increase num_matches (spec invariant)"
    );
    Ok((new_store, ScanOutcome { num_matches, cancelled }))
}
