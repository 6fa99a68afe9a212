//! A contiguous run of per-byte match state (spec §3 "swath").

use memscan_types::MatchFlags;

/// One target byte's recorded state: the last-observed value and which
/// width interpretations are still viable (spec §3
/// "old_value_and_match_info").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OldValueAndMatchInfo {
    pub old_value: u8,
    pub match_info: MatchFlags,
}

impl OldValueAndMatchInfo {
    pub const NULL: Self = Self {
        old_value: 0,
        match_info: MatchFlags::NONE,
    };

    #[must_use]
    pub fn is_match(self) -> bool {
        self.match_info.is_match()
    }
}

/// A contiguous run of [`OldValueAndMatchInfo`] covering a contiguous range
/// of target addresses, starting at `first_byte_in_child` (spec §3
/// "swath").
///
/// Unlike the C original, this is an owning `Vec` rather than a trailing
/// flexible array; there is no in-band null terminator entry (spec §9's
/// design note licenses replacing that sentinel with "an explicit length on
/// the store plus an iterator that knows when to stop" — here, the
/// store's `Vec<Swath>` length *is* that explicit length).
#[derive(Debug, Clone, Default)]
pub struct Swath {
    first_byte_in_child: u64,
    entries: Vec<OldValueAndMatchInfo>,
}

impl Swath {
    pub(crate) fn new(first_byte_in_child: u64) -> Self {
        Self {
            first_byte_in_child,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn first_byte_in_child(&self) -> u64 {
        self.first_byte_in_child
    }

    #[must_use]
    pub fn number_of_bytes(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[OldValueAndMatchInfo] {
        &self.entries
    }

    pub fn entries_mut(&mut self) -> &mut [OldValueAndMatchInfo] {
        &mut self.entries
    }

    /// Address immediately past this swath's last covered byte.
    #[must_use]
    pub fn end_addr(&self) -> u64 {
        self.first_byte_in_child + self.entries.len() as u64
    }

    /// Address of this swath's last entry, if any.
    #[must_use]
    pub fn last_addr(&self) -> Option<u64> {
        (!self.entries.is_empty()).then(|| self.end_addr() - 1)
    }

    #[must_use]
    pub fn addr_of(&self, index: usize) -> u64 {
        self.first_byte_in_child + index as u64
    }

    pub(crate) fn set_first_byte(&mut self, addr: u64) {
        self.first_byte_in_child = addr;
    }

    pub(crate) fn push(&mut self, entry: OldValueAndMatchInfo) {
        self.entries.push(entry);
    }

    pub(crate) fn pad(&mut self, count: u64) {
        self.entries
            .extend(std::iter::repeat(OldValueAndMatchInfo::NULL).take(count as usize));
    }

    pub(crate) fn truncate_entries(&mut self, len: usize) {
        self.entries.truncate(len);
    }
}
