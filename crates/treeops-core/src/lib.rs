//! treeops core - breadth-first operations on host-owned container trees
//!
//! This crate provides:
//! - Deep copy, flatten (by value or by key), structural equality and
//!   dedup over nested containers
//! - An explicit worklist in place of recursion, so tree depth never
//!   reaches the call stack
//! - The [`ContainerStore`] host boundary and an in-memory reference host
//! - Structured logging, a stable error taxonomy and fatal termination at
//!   the call surface

pub mod config;
pub mod engine;
pub mod errors;
pub mod fatal;
pub mod logging_facility;
pub mod model;
pub mod store;
pub mod surface;

pub use treeops_core_types::{schema, RequestId};

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::{Engine, FlattenMode};
pub use errors::{ExError, ExErrorKind, Result, TreeOpsError};
pub use model::{ContainerId, EntryValue, HostValue, Scalar, ScalarKind, ValueTag};
pub use store::{ContainerStore, MemoryStore, Snapshot, SnapshotEntry};
pub use surface::{invoke, Function};
