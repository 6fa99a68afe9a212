//! The session state machine (spec §4.4):
//!
//! ```text
//! INIT ─pid─▶ ATTACHED ─snapshot/first-scan─▶ NARROWING ─next-scan*─▶ NARROWING
//!                                            ─set/write/watch/delete/dregion
//!                                            ─reset─▶ ATTACHED
//!                                            ─pid─▶ ATTACHED
//! ```

use memscan_region::{RegionList, RegionScanLevel};
use memscan_scan::{MatchType, ScanDataType, ScanOptions};
use memscan_store::SwathStore;
use memscan_types::UserValue;

use crate::driver::{first_scan, next_scan, ScanOutcome};
use crate::error::SessionError;
use crate::target_io::{CancellationFlag, Pid, TargetIo};

/// The session's current place in the state diagram above, derived from
/// whether a target is attached and whether a match set exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Attached,
    Narrowing,
}

/// Owns the per-target session: the attached pid, the region list, and
/// (once a scan has run) the swath store (spec §3 "Lifecycles").
#[derive(Debug, Default)]
pub struct Session {
    pid: Option<Pid>,
    regions: RegionList,
    store: Option<SwathStore>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        match (self.pid, &self.store) {
            (None, _) => SessionState::Init,
            (Some(_), None) => SessionState::Attached,
            (Some(_), Some(_)) => SessionState::Narrowing,
        }
    }

    #[must_use]
    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    #[must_use]
    pub fn regions(&self) -> &RegionList {
        &self.regions
    }

    #[must_use]
    pub fn store(&self) -> Option<&SwathStore> {
        self.store.as_ref()
    }

    /// Mutable access for `delete` (spec §4.4), which clears entries in
    /// place rather than rebuilding the store.
    pub fn store_mut(&mut self) -> Option<&mut SwathStore> {
        self.store.as_mut()
    }

    /// Mutable access to both the store and region list at once, for
    /// `dregion` (spec §4.4), which must update them together.
    pub fn store_and_regions_mut(
        &mut self,
    ) -> Result<(&mut SwathStore, &mut RegionList), SessionError> {
        let store = self.store.as_mut().ok_or(SessionError::NoMatches)?;
        Ok((store, &mut self.regions))
    }

    #[must_use]
    pub fn num_matches(&self) -> usize {
        self.store.as_ref().map_or(0, SwathStore::num_matches)
    }

    /// `pid` command (spec §4.4): (re-)targets the session, implying
    /// `reset`. Detaches the previous target first, if any.
    pub fn attach(&mut self, target: &mut dyn TargetIo, new_pid: Pid) -> Result<(), SessionError> {
        if let Some(old_pid) = self.pid.take() {
            target.detach(old_pid)?;
        }
        target.attach(new_pid)?;
        self.pid = Some(new_pid);
        self.reset();
        Ok(())
    }

    /// `reset` command: clears the match set and region list without
    /// detaching (spec §4.4 state diagram, spec §3 "Lifecycles").
    pub fn reset(&mut self) {
        self.store = None;
        self.regions = RegionList::default();
    }

    /// `snapshot` / any scan command (spec §4.3): runs a first scan if no
    /// store exists yet, otherwise narrows the existing one. Re-reads the
    /// region list from the target when it is empty (first call after
    /// `attach` or `reset`).
    pub fn scan(
        &mut self,
        target: &mut dyn TargetIo,
        level: RegionScanLevel,
        scan_data_type: ScanDataType,
        match_type: MatchType,
        user_value: &UserValue,
        scan_options: &ScanOptions,
        cancel: &CancellationFlag,
    ) -> Result<ScanOutcome, SessionError> {
        let pid = self.pid.ok_or(SessionError::NotAttached)?;

        if self.store.is_none() && self.regions.regions().is_empty() {
            let regions = target.read_maps(pid)?;
            self.regions = RegionList::new(regions);
        }

        let (new_store, outcome) = match &self.store {
            None => first_scan(
                target,
                pid,
                &self.regions,
                level,
                scan_data_type,
                match_type,
                user_value,
                scan_options,
                cancel,
            )?,
            Some(old_store) => next_scan(
                target,
                pid,
                old_store,
                scan_data_type,
                match_type,
                user_value,
                scan_options,
                cancel,
            )?,
        };

        self.store = Some(new_store);
        Ok(outcome)
    }
}
