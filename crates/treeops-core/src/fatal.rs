//! Fatal error termination
//!
//! Every error that reaches the host call surface ends the process: the
//! host cannot resume a half-applied operation.

use crate::errors::{ExError, TreeOpsError};

/// Exit status used for fatal errors
pub const EXIT_STATUS: i32 = 1;

/// Render the line printed to stderr before exiting
///
/// ```
/// use treeops_core::errors::TreeOpsError;
/// use treeops_core::fatal;
///
/// let err = TreeOpsError::InvalidMode { op: "uniq".to_string(), mode: "both".to_string() };
/// assert!(fatal::message(err).starts_with("Error: [ERR_INVALID_INPUT] in operation 'uniq'"));
/// ```
pub fn message(err: TreeOpsError) -> String {
    format!("Error: {}", ExError::from(err))
}

/// Log, report on stderr, and exit with [`EXIT_STATUS`]
pub fn terminate(err: TreeOpsError) -> ! {
    let op = err.op().unwrap_or("unknown").to_string();
    let kind = err.kind();
    tracing::error!(op = %op, err.kind = ?kind, err.code = kind.code(), "fatal error, terminating");

    eprintln!("{}", message(err));
    std::process::exit(EXIT_STATUS)
}
