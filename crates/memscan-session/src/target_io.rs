//! The target I/O boundary (spec §6 "Target I/O interface").
//!
//! This is the one "external collaborator" spec §1 excludes from the core
//! contract; the core only ever talks to this trait, never to ptrace or
//! `/proc` directly. `memscan-target-linux` provides the real
//! implementation; tests use an in-memory fake.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use memscan_region::Region;

/// A target process id. A thin alias rather than a newtype, matching the
/// rest of the workspace's preference for plain integers at I/O boundaries.
pub type Pid = i32;

/// Failure of a target I/O operation (spec §7 kind 3: resource errors).
#[derive(Debug, thiserror::Error)]
pub enum TargetIoError {
    #[error("failed to attach to pid {pid}: {reason}")]
    AttachFailed { pid: Pid, reason: String },
    #[error("failed to detach from pid {pid}: {reason}")]
    DetachFailed { pid: Pid, reason: String },
    #[error("failed to read {len} bytes at {addr:#x} in pid {pid}: {reason}")]
    ReadFailed {
        pid: Pid,
        addr: u64,
        len: usize,
        reason: String,
    },
    #[error("failed to write {len} bytes at {addr:#x} in pid {pid}: {reason}")]
    WriteFailed {
        pid: Pid,
        addr: u64,
        len: usize,
        reason: String,
    },
    #[error("failed to read memory maps for pid {pid}: {reason}")]
    MapsFailed { pid: Pid, reason: String },
}

/// The boundary the core scan engine reads and writes target memory
/// through (spec §6). Implementors own whatever attach/detach discipline
/// the backend needs (ptrace, a debug API, ...); the core only calls
/// `attach` once per session and a matching `detach` on every exit path.
pub trait TargetIo {
    fn attach(&mut self, pid: Pid) -> Result<(), TargetIoError>;

    /// Idempotent: detaching an already-detached target is not an error.
    fn detach(&mut self, pid: Pid) -> Result<(), TargetIoError>;

    /// Reads up to `buf.len()` bytes starting at `addr`, returning the
    /// number actually read. A short read (end of mapping, partial page)
    /// is not itself an error — the caller treats the unread tail as
    /// "insufficiently buffered" rather than failing the whole scan.
    fn read_bytes(&mut self, pid: Pid, addr: u64, buf: &mut [u8]) -> Result<usize, TargetIoError>;

    fn write_bytes(&mut self, pid: Pid, addr: u64, buf: &[u8]) -> Result<(), TargetIoError>;

    fn read_maps(&mut self, pid: Pid) -> Result<Vec<Region>, TargetIoError>;
}

/// The cooperative cancellation flag (spec §5): set asynchronously by a
/// signal handler (or, in tests, directly), polled at swath boundaries by
/// the scan driver and once per period by continuous `set`/`watch`.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the flag, e.g. before starting a new long-running command.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
