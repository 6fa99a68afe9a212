//! Errors local to the Linux backend, converted into
//! [`memscan_session::TargetIoError`] at the `TargetIo` boundary.

#[derive(Debug, thiserror::Error)]
pub enum LinuxTargetError {
    #[error("ptrace attach on pid {pid} failed: {reason}")]
    Attach { pid: i32, reason: String },
    #[error("ptrace detach on pid {pid} failed: {reason}")]
    Detach { pid: i32, reason: String },
    #[error("process_vm_readv on pid {pid} at {addr:#x} failed: {reason}")]
    Read {
        pid: i32,
        addr: u64,
        reason: String,
    },
    #[error("process_vm_writev on pid {pid} at {addr:#x} failed: {reason}")]
    Write {
        pid: i32,
        addr: u64,
        reason: String,
    },
    #[error("reading /proc/{pid}/maps failed: {reason}")]
    Maps { pid: i32, reason: String },
}
