//! Structural equality
//!
//! Two trees are equal when every container pair has the same number of
//! entries and the entries match position by position. Key variants and
//! value variants must agree everywhere. Scalar entries must also agree on
//! key and value content; subcontainer entries only queue their pair for a
//! later comparison, so their keys may differ. Entries are not matched by
//! key, so the same mapping built in a different order compares unequal.

use super::{decode_entry, park, take_snapshot, WorkItem, Worklist};
use crate::config::EngineConfig;
use crate::errors::{Result, TreeOpsError};
use crate::model::{ContainerId, EntryValue};
use crate::store::{ContainerStore, Snapshot};

pub const OP: &str = "equals";

/// Compare `left` and `right`
///
/// Comparing a tree with itself is allowed and yields `true`.
///
/// # Errors
///
/// Returns `WorklistAllocation`, `UnsupportedValue` or `SnapshotFailed`.
/// A mismatch is `Ok(false)`, never an error.
pub fn equals<S: ContainerStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    left: ContainerId,
    right: ContainerId,
) -> Result<bool> {
    let mut worklist = Worklist::new(OP, config)?;
    worklist.push(WorkItem::paired(left, right))?;

    let outcome = drain(store, &mut worklist);
    worklist.release_snapshots(store);

    tracing::debug!(op = OP, work_items = worklist.len(), equal = ?outcome.as_ref().ok(), "equality drained");
    outcome
}

fn drain<S: ContainerStore + ?Sized>(store: &mut S, worklist: &mut Worklist) -> Result<bool> {
    while let Some(item) = worklist.current() {
        let left = item.source;
        let right = item.peer.ok_or_else(|| TreeOpsError::Internal {
            message: format!("equality work item for {} has no peer", left),
        })?;

        let left_snapshot = take_snapshot(store, OP, left)?;
        let right_snapshot = match take_snapshot(store, OP, right) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                park(worklist, store, (left, left_snapshot), (right, None));
                return Err(err);
            }
        };

        let verdict = match (&left_snapshot, &right_snapshot) {
            (None, None) => Ok(true),
            (Some(l), Some(r)) => compare_level(worklist, l, r, left, right),
            _ => Ok(false),
        };
        park(worklist, store, (left, left_snapshot), (right, right_snapshot));
        if !verdict? {
            return Ok(false);
        }
        worklist.advance();
    }
    Ok(true)
}

fn compare_level(
    worklist: &mut Worklist,
    left_snapshot: &Snapshot,
    right_snapshot: &Snapshot,
    left: ContainerId,
    right: ContainerId,
) -> Result<bool> {
    if left_snapshot.len() != right_snapshot.len() {
        return Ok(false);
    }

    let pairs = left_snapshot
        .entries()
        .iter()
        .zip(right_snapshot.entries())
        .enumerate();
    for (index, (l, r)) in pairs {
        let (left_key, left_value) = decode_entry(OP, left, index, l)?;
        let (right_key, right_value) = decode_entry(OP, right, index, r)?;

        if left_key.kind() != right_key.kind() || !left_value.same_variant(&right_value) {
            return Ok(false);
        }
        match (left_value, right_value) {
            (EntryValue::Container(l), EntryValue::Container(r)) => {
                worklist.push(WorkItem::paired(l, r))?;
            }
            (EntryValue::Scalar(l), EntryValue::Scalar(r))
                if !left_key.equals(&right_key) || !l.equals(&r) =>
            {
                return Ok(false)
            }
            _ => {}
        }
    }
    Ok(true)
}
