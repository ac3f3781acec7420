//! Traversal engines
//!
//! Each engine seeds a [`Worklist`] with its root container(s), drains it
//! breadth-first, and releases every snapshot it took before returning,
//! whether the traversal succeeded or not.

pub mod copy;
pub mod equality;
pub mod flatten;
pub mod scratch;
pub mod uniq;
pub mod worklist;

pub use worklist::{WorkItem, Worklist};

use std::fmt::Debug;
use std::str::FromStr;
use std::time::Instant;

use treeops_core_types::RequestId;

use crate::config::EngineConfig;
use crate::errors::{Result, TreeOpsError};
use crate::model::{ContainerId, EntryValue, Scalar, ValueTag};
use crate::store::{ContainerStore, Snapshot, SnapshotEntry};
use crate::{log_op_end, log_op_error, log_op_start};

/// What flatten writes for each scalar leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlattenMode {
    /// The leaf's value
    Values,
    /// The leaf's key
    Keys,
}

impl FlattenMode {
    /// Operation name used in logs and errors
    pub fn op_name(&self) -> &'static str {
        match self {
            FlattenMode::Values => flatten::OP_VALUES,
            FlattenMode::Keys => flatten::OP_KEYS,
        }
    }
}

impl FromStr for FlattenMode {
    type Err = TreeOpsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "values" => Ok(FlattenMode::Values),
            "keys" => Ok(FlattenMode::Keys),
            other => Err(TreeOpsError::InvalidMode {
                op: uniq::OP.to_string(),
                mode: other.to_string(),
            }),
        }
    }
}

/// Entry point for the tree operations
///
/// Holds the configuration; every call is self-contained and emits one
/// start and one end (or end_error) event.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use treeops_core::engine::Engine;
/// use treeops_core::store::{fixtures, MemoryStore};
///
/// let mut store = MemoryStore::new();
/// let src = fixtures::load_json(&mut store, "src", &json!({"x": 1, "y": {"a": "s"}})).unwrap();
/// let dst = store.new_root("dst").unwrap();
///
/// let engine = Engine::default();
/// engine.copy(&mut store, src, dst).unwrap();
/// assert!(engine.equals(&mut store, src, dst).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration is out of range.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Deep-copy `source` into `dest`, preserving keys
    ///
    /// # Errors
    ///
    /// Returns `SelfAliasing` when `source == dest`, and any fatal traversal
    /// or store error.
    pub fn copy<S: ContainerStore + ?Sized>(
        &self,
        store: &mut S,
        source: ContainerId,
        dest: ContainerId,
    ) -> Result<()> {
        instrumented(copy::OP, source, dest, || {
            copy::copy(store, &self.config, source, dest)
        })
    }

    /// Flatten every scalar leaf value of `source` into `dest[0..n]`
    ///
    /// # Errors
    ///
    /// See [`Engine::flatten`].
    pub fn deep_flatten<S: ContainerStore + ?Sized>(
        &self,
        store: &mut S,
        source: ContainerId,
        dest: ContainerId,
    ) -> Result<usize> {
        self.flatten(store, source, dest, FlattenMode::Values)
    }

    /// Flatten every scalar leaf key of `source` into `dest[0..n]`
    ///
    /// # Errors
    ///
    /// See [`Engine::flatten`].
    pub fn deep_flatten_keys<S: ContainerStore + ?Sized>(
        &self,
        store: &mut S,
        source: ContainerId,
        dest: ContainerId,
    ) -> Result<usize> {
        self.flatten(store, source, dest, FlattenMode::Keys)
    }

    /// Flatten in the given mode and return the number of items written
    ///
    /// # Errors
    ///
    /// Returns `SelfAliasing` when `source == dest`, `UnsupportedValue` for
    /// entries that are neither scalars nor containers, and store errors.
    pub fn flatten<S: ContainerStore + ?Sized>(
        &self,
        store: &mut S,
        source: ContainerId,
        dest: ContainerId,
        mode: FlattenMode,
    ) -> Result<usize> {
        instrumented(mode.op_name(), source, dest, || {
            flatten::flatten(store, &self.config, source, dest, mode)
        })
    }

    /// Compare two trees position by position
    ///
    /// # Errors
    ///
    /// Mismatches are `Ok(false)`; only traversal and store failures are
    /// errors.
    pub fn equals<S: ContainerStore + ?Sized>(
        &self,
        store: &mut S,
        left: ContainerId,
        right: ContainerId,
    ) -> Result<bool> {
        instrumented(equality::OP, left, right, || {
            equality::equals(store, &self.config, left, right)
        })
    }

    /// Write one `dest[item] = undefined` entry per distinct flattened item
    ///
    /// # Errors
    ///
    /// Returns `SelfAliasing` when `source == dest`, and any flatten or
    /// store error.
    pub fn uniq<S: ContainerStore + ?Sized>(
        &self,
        store: &mut S,
        source: ContainerId,
        dest: ContainerId,
        mode: FlattenMode,
    ) -> Result<usize> {
        instrumented(uniq::OP, source, dest, || {
            uniq::uniq(store, &self.config, source, dest, mode)
        })
    }
}

fn instrumented<T, F>(op: &'static str, source: ContainerId, dest: ContainerId, body: F) -> Result<T>
where
    T: Debug,
    F: FnOnce() -> Result<T>,
{
    let request_id = RequestId::new();
    let start = Instant::now();
    log_op_start!(
        op,
        request_id = request_id.as_str(),
        source = %source,
        dest = %dest
    );

    let outcome = body();
    let duration_ms = start.elapsed().as_millis() as u64;
    match &outcome {
        Ok(value) => {
            log_op_end!(
                op,
                duration_ms = duration_ms,
                request_id = request_id.as_str(),
                result = ?value
            );
        }
        Err(err) => {
            log_op_error!(
                op,
                err.clone(),
                duration_ms = duration_ms,
                request_id = request_id.as_str()
            );
        }
    }
    outcome
}

/// Reject an operation whose destination is its own source
pub(crate) fn reject_self_alias(op: &str, source: ContainerId, dest: ContainerId) -> Result<()> {
    if source == dest {
        return Err(TreeOpsError::SelfAliasing {
            op: op.to_string(),
            container: source,
        });
    }
    Ok(())
}

/// Snapshot a container; `Ok(None)` means skip it
pub(crate) fn take_snapshot<S: ContainerStore + ?Sized>(
    store: &mut S,
    op: &str,
    container: ContainerId,
) -> Result<Option<Snapshot>> {
    let snapshot = store
        .snapshot(container)
        .map_err(|source| TreeOpsError::SnapshotFailed {
            op: op.to_string(),
            container,
            source: Box::new(source),
        })?;
    if snapshot.is_none() {
        tracing::trace!(op, container = %container, "empty or unmaterialized container skipped");
    }
    Ok(snapshot)
}

/// Hand the current item's snapshots to the worklist for later release
pub(crate) fn park<S: ContainerStore + ?Sized>(
    worklist: &mut Worklist,
    store: &mut S,
    item: (ContainerId, Option<Snapshot>),
    peer: (ContainerId, Option<Snapshot>),
) {
    if let Err((source_snapshot, peer_snapshot)) = worklist.park(item.1, peer.1) {
        // cursor ran off the list; release here so nothing leaks
        for (container, snapshot) in [(item.0, source_snapshot), (peer.0, peer_snapshot)] {
            if let Some(snapshot) = snapshot {
                if let Err(err) = store.release_snapshot(container, snapshot) {
                    tracing::error!(container = %container, error = %err, "snapshot release failed");
                }
            }
        }
    }
}

/// Decode one snapshot entry into a scalar key and an entry value
pub(crate) fn decode_entry(
    op: &str,
    container: ContainerId,
    index: usize,
    entry: &SnapshotEntry,
) -> Result<(Scalar, EntryValue)> {
    let unsupported = |tag: ValueTag| TreeOpsError::UnsupportedValue {
        op: op.to_string(),
        container,
        index,
        tag,
    };
    let key = Scalar::from_host(&entry.key).ok_or_else(|| unsupported(entry.key.tag()))?;
    let value = EntryValue::decode(&entry.value).map_err(unsupported)?;
    Ok((key, value))
}
