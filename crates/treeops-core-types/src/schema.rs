//! Log field and event names
//!
//! `tracing` field names are written as identifiers at the call site, so
//! these constants are what readers of the captured or JSON output match
//! against. Each one must equal the identifier the engine logs under.

/// Module path of the emitting code
pub const FIELD_COMPONENT: &str = "component";
/// Public operation name: `copy`, `deep_flatten`, `deep_flatten_keys`, `equals`, `uniq`
pub const FIELD_OP: &str = "op";
/// One of the `EVENT_*` names below
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
/// Per-call correlation id, see [`crate::RequestId`]
pub const FIELD_REQUEST_ID: &str = "request_id";

/// Source (or left-hand) root container of a call
pub const FIELD_SOURCE: &str = "source";
/// Debug rendering of a successful call's return value
pub const FIELD_RESULT: &str = "result";

pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
