//! Flatten engine
//!
//! Writes every scalar leaf reachable from `source` (or the key it sits
//! under) into `dest` at dense integer keys `0..n`. Subcontainers are queued
//! and drained later, so a container's direct leaves come out before any of
//! its grandchildren. `dest` is not cleared first.

use super::{decode_entry, park, reject_self_alias, take_snapshot, FlattenMode, WorkItem, Worklist};
use crate::config::EngineConfig;
use crate::errors::{Result, TreeOpsError};
use crate::model::{ContainerId, EntryValue, Scalar};
use crate::store::{ContainerStore, Snapshot};

pub const OP_VALUES: &str = "deep_flatten";
pub const OP_KEYS: &str = "deep_flatten_keys";

/// Flatten `source` into `dest`, returning the number of items written
///
/// # Errors
///
/// Returns `SelfAliasing`, `WorklistAllocation`, `UnsupportedValue`,
/// `SnapshotFailed` or `WriteFailed`. Snapshots are released either way.
pub fn flatten<S: ContainerStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    source: ContainerId,
    dest: ContainerId,
    mode: FlattenMode,
) -> Result<usize> {
    let op = mode.op_name();
    reject_self_alias(op, source, dest)?;

    let mut worklist = Worklist::new(op, config)?;
    worklist.push(WorkItem::single(source))?;

    let mut written = 0;
    let outcome = drain(store, &mut worklist, dest, mode, &mut written);
    worklist.release_snapshots(store);

    tracing::debug!(op, work_items = worklist.len(), items_written = written, "flatten drained");
    outcome.map(|()| written)
}

fn drain<S: ContainerStore + ?Sized>(
    store: &mut S,
    worklist: &mut Worklist,
    dest: ContainerId,
    mode: FlattenMode,
    written: &mut usize,
) -> Result<()> {
    let op = mode.op_name();
    while let Some(item) = worklist.current() {
        let source = item.source;
        let Some(snapshot) = take_snapshot(store, op, source)? else {
            worklist.advance();
            continue;
        };

        let outcome = emit_level(store, worklist, &snapshot, source, dest, mode, written);
        park(worklist, store, (source, Some(snapshot)), (source, None));
        outcome?;
        worklist.advance();
    }
    Ok(())
}

fn emit_level<S: ContainerStore + ?Sized>(
    store: &mut S,
    worklist: &mut Worklist,
    snapshot: &Snapshot,
    source: ContainerId,
    dest: ContainerId,
    mode: FlattenMode,
    written: &mut usize,
) -> Result<()> {
    let op = mode.op_name();
    for (index, entry) in snapshot.entries().iter().enumerate() {
        let (key, value) = decode_entry(op, source, index, entry)?;
        let item = match (value, mode) {
            (EntryValue::Container(child), _) => {
                worklist.push(WorkItem::single(child))?;
                continue;
            }
            (EntryValue::Scalar(value), FlattenMode::Values) => value,
            (EntryValue::Scalar(_), FlattenMode::Keys) => key,
        };

        let position = Scalar::from(*written);
        store
            .set_entry(dest, position.clone(), item.into_host())
            .map_err(|err| TreeOpsError::WriteFailed {
                op: op.to_string(),
                container: dest,
                key: position.subscript(),
                source: Box::new(err),
            })?;
        *written += 1;
    }
    Ok(())
}
