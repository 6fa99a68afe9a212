//! Linux `TargetIo` backend (spec §1's "process-attach / ptrace / proc-maps
//! backend" external collaborator): `ptrace(2)` attach/detach,
//! `process_vm_readv`/`process_vm_writev` for bulk memory access, and
//! `/proc/<pid>/maps` parsing. None of this crate's internals are part of
//! the core engine contract spec §8 tests against.

mod error;
mod maps;
mod ptrace_target;

pub use error::LinuxTargetError;
pub use ptrace_target::LinuxTarget;
