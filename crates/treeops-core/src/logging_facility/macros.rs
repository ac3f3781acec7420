//! Operation boundary macros
//!
//! Every public operation logs exactly one `start` event and then exactly
//! one `end` or `end_error` event. All three share the `component`, `op`
//! and `event` fields; extra fields are passed through to `tracing`
//! unchanged, so `%value` and `?value` work as usual.

#[doc(hidden)]
#[macro_export]
macro_rules! __treeops_op_event {
    ($level:ident, $op:expr, $event:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)*)?
        )
    };
}

/// Log the start of an operation
///
/// ```
/// # use treeops_core::log_op_start;
/// log_op_start!("copy");
/// log_op_start!("copy", source = "c1", dest = "c2");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        $crate::__treeops_op_event!(info, $op, $crate::schema::EVENT_START $(, $($field)*)?)
    };
}

/// Log the successful end of an operation
///
/// ```
/// # use treeops_core::log_op_end;
/// log_op_end!("equals", duration_ms = 3, result = ?true);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        $crate::__treeops_op_event!(
            info,
            $op,
            $crate::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)*)?
        )
    };
}

/// Log the failed end of an operation
///
/// The error is converted to [`ExError`](crate::errors::ExError) so the
/// event carries its stable kind and code.
///
/// ```
/// # use treeops_core::{log_op_error, errors::TreeOpsError};
/// let err = TreeOpsError::WorklistAllocation { op: "copy".to_string(), requested: 100 };
/// log_op_error!("copy", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        $crate::__treeops_op_event!(
            error,
            $op,
            $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code()
            $(, $($field)*)?
        )
    }};
}
