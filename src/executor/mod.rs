//! Target delegation
//!
//! Runs discovered targets through mage or `go run` with:
//! - Deadline enforcement
//! - Live stderr mirroring with full capture
//! - Conflict handling between `magefiles/` and `magefile.go`

pub mod delegate;
pub mod set_aside;
pub mod stderr;

pub use delegate::{DelegateResult, Delegator, Invocation, RunnerType};
pub use set_aside::SetAside;
pub use stderr::drain_stderr;

/// Exit code reported when a target runs past its deadline
pub const TIMEOUT_EXIT_CODE: i32 = 124;
