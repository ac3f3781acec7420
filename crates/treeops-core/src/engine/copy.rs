//! Copy engine
//!
//! Mirrors the tree under `source` into `dest`, keeping every key. A new
//! subcontainer is attached to its destination parent before anything is
//! written into it, and only the handle returned by the attach is used
//! afterwards.

use super::{decode_entry, park, reject_self_alias, take_snapshot, WorkItem, Worklist};
use crate::config::EngineConfig;
use crate::errors::{Result, TreeOpsError};
use crate::model::{ContainerId, EntryValue, HostValue, Scalar};
use crate::store::{ContainerStore, Snapshot};

pub const OP: &str = "copy";

/// Deep-copy `source` into `dest`
///
/// Entries of `dest` that `source` does not have are left alone.
///
/// # Errors
///
/// Returns `SelfAliasing`, `WorklistAllocation`, `UnsupportedValue`,
/// `SnapshotFailed`, `WriteFailed` or `AttachFailed`. Snapshots are released
/// either way.
pub fn copy<S: ContainerStore + ?Sized>(
    store: &mut S,
    config: &EngineConfig,
    source: ContainerId,
    dest: ContainerId,
) -> Result<()> {
    reject_self_alias(OP, source, dest)?;

    let mut worklist = Worklist::new(OP, config)?;
    worklist.push(WorkItem::paired(source, dest))?;

    let outcome = drain(store, &mut worklist);
    worklist.release_snapshots(store);

    tracing::debug!(op = OP, work_items = worklist.len(), "copy drained");
    outcome
}

fn drain<S: ContainerStore + ?Sized>(store: &mut S, worklist: &mut Worklist) -> Result<()> {
    while let Some(item) = worklist.current() {
        let source = item.source;
        let dest = item.peer.ok_or_else(|| TreeOpsError::Internal {
            message: format!("copy work item for {} has no destination", source),
        })?;
        let Some(snapshot) = take_snapshot(store, OP, source)? else {
            worklist.advance();
            continue;
        };

        let outcome = mirror_level(store, worklist, &snapshot, source, dest);
        park(worklist, store, (source, Some(snapshot)), (dest, None));
        outcome?;
        worklist.advance();
    }
    Ok(())
}

fn mirror_level<S: ContainerStore + ?Sized>(
    store: &mut S,
    worklist: &mut Worklist,
    snapshot: &Snapshot,
    source: ContainerId,
    dest: ContainerId,
) -> Result<()> {
    for (index, entry) in snapshot.entries().iter().enumerate() {
        let (key, value) = decode_entry(OP, source, index, entry)?;
        match value {
            EntryValue::Scalar(value) => {
                store
                    .set_entry(dest, key.clone(), value.into_host())
                    .map_err(|err| TreeOpsError::WriteFailed {
                        op: OP.to_string(),
                        container: dest,
                        key: key.subscript(),
                        source: Box::new(err),
                    })?;
            }
            EntryValue::Container(child_source) => {
                let child_dest = attach_child(store, dest, key)?;
                worklist.push(WorkItem::paired(child_source, child_dest))?;
            }
        }
    }
    Ok(())
}

/// Create an empty container under `parent[key]` and return its canonical handle
fn attach_child<S: ContainerStore + ?Sized>(
    store: &mut S,
    parent: ContainerId,
    key: Scalar,
) -> Result<ContainerId> {
    let attach_failed = |key: &Scalar, err: TreeOpsError| TreeOpsError::AttachFailed {
        op: OP.to_string(),
        container: parent,
        key: key.subscript(),
        source: Box::new(err),
    };

    let created = store
        .create_container()
        .map_err(|err| attach_failed(&key, err))?;
    let stored = store
        .set_entry(parent, key.clone(), HostValue::Array(created))
        .map_err(|err| attach_failed(&key, err))?;

    // the pre-attach handle is dead from here on
    stored.as_container().ok_or_else(|| {
        attach_failed(
            &key,
            TreeOpsError::Internal {
                message: format!("attach returned a {} value", stored.tag()),
            },
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{fixtures, MemoryStore};
    use serde_json::json;

    #[test]
    fn test_copy_mirrors_nested_tree() {
        let tree = json!({"x": 1, "y": {"a": "s", "b": [true, null, {"deep": 2.5}]}});
        let mut store = MemoryStore::new();
        let src = fixtures::load_json(&mut store, "src", &tree).unwrap();
        let dst = store.new_root("dst").unwrap();

        copy(&mut store, &EngineConfig::default(), src, dst).unwrap();

        assert_eq!(
            fixtures::to_json(&mut store, dst).unwrap(),
            fixtures::to_json(&mut store, src).unwrap()
        );
        assert_eq!(store.outstanding_snapshots(), 0);
    }

    #[test]
    fn test_copy_uses_post_attach_handles() {
        let mut store = MemoryStore::new();
        let src = fixtures::load_json(&mut store, "src", &json!({"a": {"b": {"c": 1}}})).unwrap();
        let dst = store.new_root("dst").unwrap();

        copy(&mut store, &EngineConfig::default(), src, dst).unwrap();

        let a = store.get_entry(dst, &"a".into()).unwrap().unwrap();
        let a = a.as_container().unwrap();
        assert!(!store.is_retired(a));
        let b = store.get_entry(a, &"b".into()).unwrap().unwrap();
        let b = b.as_container().unwrap();
        assert_eq!(
            store.get_entry(b, &"c".into()).unwrap(),
            Some(HostValue::Number(1.0))
        );
    }

    #[test]
    fn test_copy_keeps_existing_dest_entries() {
        let mut store = MemoryStore::new();
        let src = fixtures::load_json(&mut store, "src", &json!({"a": 1})).unwrap();
        let dst = fixtures::load_json(&mut store, "dst", &json!({"z": 0})).unwrap();

        copy(&mut store, &EngineConfig::default(), src, dst).unwrap();

        assert_eq!(
            fixtures::to_json(&mut store, dst).unwrap(),
            json!({"z": 0, "a": 1})
        );
    }

    #[test]
    fn test_copy_rejects_self_alias() {
        let mut store = MemoryStore::new();
        let src = fixtures::load_json(&mut store, "src", &json!({"a": 1})).unwrap();

        let err = copy(&mut store, &EngineConfig::default(), src, src).unwrap_err();

        assert!(matches!(err, TreeOpsError::SelfAliasing { .. }));
    }

    #[test]
    fn test_copy_into_unrooted_dest_fails_and_releases() {
        let mut store = MemoryStore::new();
        let src = fixtures::load_json(&mut store, "src", &json!({"a": 1})).unwrap();
        let floating = store.create_container().unwrap();

        let err = copy(&mut store, &EngineConfig::default(), src, floating).unwrap_err();

        assert_eq!(
            err.root_cause(),
            &TreeOpsError::UnrootedContainer {
                container: floating
            }
        );
        assert_eq!(store.outstanding_snapshots(), 0);
    }
}
