//! Dedup engine
//!
//! Flattens `source` into a scratch container, then writes
//! `dest[item] = undefined` for every flattened item. Container keys are
//! unique, so duplicates collapse on their own.

use std::collections::HashSet;

use super::flatten::flatten;
use super::scratch::Scratch;
use super::{decode_entry, reject_self_alias, take_snapshot, FlattenMode};
use crate::config::EngineConfig;
use crate::errors::{Result, TreeOpsError};
use crate::model::{ContainerId, EntryValue, HostValue};
use crate::store::{ContainerStore, Snapshot};

pub const OP: &str = "uniq";

/// Re-key the flattened items of `source` into `dest`
///
/// Returns the number of distinct items written.
///
/// # Errors
///
/// Returns `SelfAliasing` when `source == dest`, anything flatten can
/// return, and `WriteFailed` for rejected writes to `dest`. The scratch
/// container is released on every path.
pub fn uniq<S: ContainerStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    source: ContainerId,
    dest: ContainerId,
    mode: FlattenMode,
) -> Result<usize> {
    reject_self_alias(OP, source, dest)?;

    let scratch = Scratch::acquire(store, config, OP)?;
    let outcome = flatten(store, config, source, scratch.id(), mode)
        .and_then(|_| extract(store, scratch.id(), dest));
    scratch.release(store);
    outcome
}

fn extract<S: ContainerStore + ?Sized>(
    store: &mut S,
    scratch: ContainerId,
    dest: ContainerId,
) -> Result<usize> {
    let Some(snapshot) = take_snapshot(store, OP, scratch)? else {
        return Ok(0);
    };

    let outcome = write_keys(store, &snapshot, scratch, dest);
    if let Err(err) = store.release_snapshot(scratch, snapshot) {
        tracing::error!(op = OP, container = %scratch, error = %err, "snapshot release failed");
    }
    outcome
}

fn write_keys<S: ContainerStore + ?Sized>(
    store: &mut S,
    snapshot: &Snapshot,
    scratch: ContainerId,
    dest: ContainerId,
) -> Result<usize> {
    let mut seen = HashSet::new();
    for (index, entry) in snapshot.entries().iter().enumerate() {
        let item = match decode_entry(OP, scratch, index, entry)? {
            (_, EntryValue::Scalar(item)) => item,
            (_, EntryValue::Container(_)) => {
                return Err(TreeOpsError::UnsupportedValue {
                    op: OP.to_string(),
                    container: scratch,
                    index,
                    tag: entry.value.tag(),
                })
            }
        };

        let subscript = item.subscript();
        store
            .set_entry(dest, item, HostValue::Undefined)
            .map_err(|err| TreeOpsError::WriteFailed {
                op: OP.to_string(),
                container: dest,
                key: subscript.clone(),
                source: Box::new(err),
            })?;
        seen.insert(subscript);
    }
    Ok(seen.len())
}
