//! Structured logging for tree operations
//!
//! - [`init`] installs a subscriber for a [`Profile`] once per process
//! - `log_op_start!`, `log_op_end!` and `log_op_error!` mark operation boundaries
//! - [`test_capture`] records events in memory for assertions
//!
//! ```rust
//! use treeops_core::logging_facility::{init, Profile};
//!
//! init(Profile::from_env());
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile, PROFILE_ENV};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
