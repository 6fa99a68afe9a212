//! `set` and `watch` (spec §4.4): writing through the navigator and
//! polling a single match at 1-second granularity.

use std::thread::sleep;
use std::time::Duration;

use memscan_store::SwathStore;
use memscan_types::{MatchFlags, ScalarWidths, ScanValue};

use crate::error::SessionError;
use crate::navigator::resolve;
use crate::target_io::{CancellationFlag, Pid, TargetIo};

/// Which matches a `set`/`delete` command targets (spec §4.4 "comma
/// separated match ordinals and/or `all`").
#[derive(Debug, Clone)]
pub enum Selection {
    All,
    Ids(Vec<usize>),
}

impl Selection {
    fn ordinals(&self, store: &SwathStore) -> Vec<usize> {
        match self {
            Selection::All => (0..store.num_matches()).collect(),
            Selection::Ids(ids) => ids.clone(),
        }
    }
}

/// The widest scalar width still viable for a match, i.e. the width `set`
/// writes under (spec §4.4 "uses the entry's `match_info` to choose the
/// write width").
fn widest_bit(flags: MatchFlags) -> Option<ScalarWidths> {
    ScalarWidths::all()
        .iter()
        .filter(|bit| flags.scalars().contains(*bit))
        .max_by_key(|bit| ScalarWidths::width_bytes(*bit))
}

/// Re-tags `value` under a match's widest still-viable width (truncating
/// or reinterpreting its bit pattern), applying the endianness fix-up
/// spec §4.4 requires before the write.
fn prepare_write_bytes(flags: MatchFlags, value: ScanValue, needs_swap: bool) -> Vec<u8> {
    let bytes = value.to_ne_bytes();
    let width = widest_bit(flags)
        .map(|bit| ScalarWidths::width_bytes(bit) as usize)
        .unwrap_or(bytes.len());
    let mut out = bytes;
    out.truncate(width);
    out.resize(width, 0);
    if needs_swap {
        out.reverse();
    }
    out
}

/// `set` (spec §4.4): writes `value` to every match in `selection`, each
/// under its own recorded width.
pub fn set_many(
    store: &SwathStore,
    target: &mut dyn TargetIo,
    pid: Pid,
    selection: &Selection,
    value: ScanValue,
    needs_swap: bool,
) -> Result<(), SessionError> {
    let ordinals = selection.ordinals(store);
    if ordinals.is_empty() {
        return Err(SessionError::NoMatches);
    }
    for ordinal in ordinals {
        let location = resolve(store, ordinal)?;
        let bytes = prepare_write_bytes(location.flags, value, needs_swap);
        target.write_bytes(pid, location.addr, &bytes)?;
        tracing::info!(ordinal, addr = location.addr, "set wrote match");
    }
    Ok(())
}

/// `set .../seconds` continuous mode (spec §4.4, §5): re-applies the write
/// once per `interval`, polling `cancel` once per period, until cancelled.
pub fn set_continuous(
    store: &SwathStore,
    target: &mut dyn TargetIo,
    pid: Pid,
    selection: &Selection,
    value: ScanValue,
    needs_swap: bool,
    interval: Duration,
    cancel: &CancellationFlag,
) -> Result<(), SessionError> {
    while !cancel.is_cancelled() {
        set_many(store, target, pid, selection, value, needs_swap)?;
        sleep(interval);
    }
    Ok(())
}

/// `watch` (spec §4.4): resolves one ordinal, then reports every change in
/// its value at 1-second granularity until cancelled.
pub fn watch(
    store: &SwathStore,
    target: &mut dyn TargetIo,
    pid: Pid,
    ordinal: usize,
    needs_swap: bool,
    cancel: &CancellationFlag,
    mut on_change: impl FnMut(ScanValue, ScanValue),
) -> Result<(), SessionError> {
    let location = resolve(store, ordinal)?;
    let Some(bit) = widest_bit(location.flags) else {
        return Err(SessionError::NoMatches);
    };
    let width = ScalarWidths::width_bytes(bit) as usize;

    let read_current = |target: &mut dyn TargetIo| -> Result<ScanValue, SessionError> {
        let mut buf = vec![0u8; width];
        target.read_bytes(pid, location.addr, &mut buf)?;
        let mut value = ScanValue::read(bit, &buf).expect("buffer sized to the requested width");
        if needs_swap {
            value = value.byte_swapped();
        }
        Ok(value)
    };

    let mut last = read_current(target)?;
    while !cancel.is_cancelled() {
        sleep(Duration::from_secs(1));
        if cancel.is_cancelled() {
            break;
        }
        let current = read_current(target)?;
        if current != last {
            on_change(last, current);
            last = current;
        }
    }
    Ok(())
}
