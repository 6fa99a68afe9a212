//! The concrete [`TargetIo`] implementation for Linux: `ptrace(2)` for
//! attach/detach, `process_vm_readv`/`process_vm_writev` for bulk memory
//! access, `/proc/<pid>/maps` for the region list.

use std::io::{IoSlice, IoSliceMut};

use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::sys::uio::{process_vm_readv, process_vm_writev, RemoteIoVec};
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::Pid as NixPid;

use memscan_region::Region;
use memscan_session::{Pid, TargetIo, TargetIoError};

use crate::maps;

/// A Linux ptrace-backed target. One instance tracks whether *this*
/// process currently holds a ptrace attachment, so `detach` stays
/// idempotent (spec §6) even if called twice or without a prior attach.
#[derive(Debug, Default)]
pub struct LinuxTarget {
    attached_pid: Option<Pid>,
}

impl LinuxTarget {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TargetIo for LinuxTarget {
    fn attach(&mut self, pid: Pid) -> Result<(), TargetIoError> {
        let nix_pid = NixPid::from_raw(pid);
        ptrace::attach(nix_pid).map_err(|errno| TargetIoError::AttachFailed {
            pid,
            reason: errno.to_string(),
        })?;
        waitpid(nix_pid, Some(WaitPidFlag::WUNTRACED)).map_err(|errno| TargetIoError::AttachFailed {
            pid,
            reason: format!("waitpid after attach failed: {errno}"),
        })?;
        self.attached_pid = Some(pid);
        tracing::info!(pid, "attached");
        Ok(())
    }

    fn detach(&mut self, pid: Pid) -> Result<(), TargetIoError> {
        if self.attached_pid != Some(pid) {
            return Ok(());
        }
        let nix_pid = NixPid::from_raw(pid);
        ptrace::detach(nix_pid, None::<Signal>).map_err(|errno| TargetIoError::DetachFailed {
            pid,
            reason: errno.to_string(),
        })?;
        self.attached_pid = None;
        tracing::info!(pid, "detached");
        Ok(())
    }

    fn read_bytes(&mut self, pid: Pid, addr: u64, buf: &mut [u8]) -> Result<usize, TargetIoError> {
        let nix_pid = NixPid::from_raw(pid);
        let remote = [RemoteIoVec {
            base: addr as usize,
            len: buf.len(),
        }];
        let mut local = [IoSliceMut::new(buf)];
        process_vm_readv(nix_pid, &mut local, &remote).map_err(|errno| TargetIoError::ReadFailed {
            pid,
            addr,
            len: remote[0].len,
            reason: errno.to_string(),
        })
    }

    fn write_bytes(&mut self, pid: Pid, addr: u64, buf: &[u8]) -> Result<(), TargetIoError> {
        let nix_pid = NixPid::from_raw(pid);
        let remote = [RemoteIoVec {
            base: addr as usize,
            len: buf.len(),
        }];
        let local = [IoSlice::new(buf)];
        let written = process_vm_writev(nix_pid, &local, &remote).map_err(|errno| TargetIoError::WriteFailed {
            pid,
            addr,
            len: buf.len(),
            reason: errno.to_string(),
        })?;
        if written != buf.len() {
            return Err(TargetIoError::WriteFailed {
                pid,
                addr,
                len: buf.len(),
                reason: format!("short write: wrote {written} of {} bytes", buf.len()),
            });
        }
        Ok(())
    }

    fn read_maps(&mut self, pid: Pid) -> Result<Vec<Region>, TargetIoError> {
        maps::read_maps(pid).map_err(|err| TargetIoError::MapsFailed {
            pid,
            reason: err.to_string(),
        })
    }
}
