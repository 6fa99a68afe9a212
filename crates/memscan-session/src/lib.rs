//! Target I/O boundary, scan driver, match navigator, bulk operations, and
//! session state machine (spec §4.3, §4.4, §5).

mod bulk;
mod driver;
mod error;
mod navigator;
mod session;
mod target_io;

pub use bulk::{set_continuous, set_many, watch, Selection};
pub use driver::{first_scan, next_scan, ScanOutcome};
pub use error::SessionError;
pub use navigator::{delete, dregion, resolve};
pub use session::{Session, SessionState};
pub use target_io::{CancellationFlag, Pid, TargetIo, TargetIoError};
