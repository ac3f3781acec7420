#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Snapshot accounting on success and failure paths, against a host that
//! can be told to fail specific calls.

mod common;

use common::bounded_engine;
use serde_json::json;
use treeops_core::store::fixtures;
use treeops_core::{
    ContainerId, ContainerStore, Engine, ExErrorKind, FlattenMode, HostValue, MemoryStore, Result,
    Scalar, Snapshot, TreeOpsError,
};

/// Reference host with injectable failures
struct FlakyStore {
    inner: MemoryStore,
    writes_before_failure: Option<usize>,
    snapshot_failure: Option<ContainerId>,
    reject_releases: bool,
}

impl FlakyStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            writes_before_failure: None,
            snapshot_failure: None,
            reject_releases: false,
        }
    }
}

impl ContainerStore for FlakyStore {
    fn create_container(&mut self) -> Result<ContainerId> {
        self.inner.create_container()
    }

    fn get_entry(&self, container: ContainerId, key: &Scalar) -> Result<Option<HostValue>> {
        self.inner.get_entry(container, key)
    }

    fn set_entry(&mut self, container: ContainerId, key: Scalar, value: HostValue) -> Result<HostValue> {
        if let Some(remaining) = self.writes_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(TreeOpsError::Internal {
                    message: "injected write failure".to_string(),
                });
            }
            *remaining -= 1;
        }
        self.inner.set_entry(container, key, value)
    }

    fn snapshot(&mut self, container: ContainerId) -> Result<Option<Snapshot>> {
        if self.snapshot_failure == Some(container) {
            return Err(TreeOpsError::Internal {
                message: "injected snapshot failure".to_string(),
            });
        }
        self.inner.snapshot(container)
    }

    fn release_snapshot(&mut self, container: ContainerId, snapshot: Snapshot) -> Result<()> {
        if self.reject_releases {
            // consume the token anyway so the count stays honest
            self.inner.release_snapshot(container, snapshot)?;
            return Err(TreeOpsError::Internal {
                message: "injected release failure".to_string(),
            });
        }
        self.inner.release_snapshot(container, snapshot)
    }

    fn bind_name(&mut self, name: &str, value: HostValue) -> Result<HostValue> {
        self.inner.bind_name(name, value)
    }

    fn unbind_name(&mut self, name: &str) -> Result<bool> {
        self.inner.unbind_name(name)
    }

    fn lookup_name(&self, name: &str) -> Option<HostValue> {
        self.inner.lookup_name(name)
    }
}

fn flaky_with(json: serde_json::Value) -> (FlakyStore, ContainerId, ContainerId) {
    let mut inner = MemoryStore::new();
    let src = fixtures::load_json(&mut inner, "src", &json).unwrap();
    let dst = inner.new_root("dst").unwrap();
    (FlakyStore::new(inner), src, dst)
}

fn wide_tree() -> serde_json::Value {
    json!({"a": {"x": 1, "y": {"z": 2}}, "b": [1, 2, [3, [4]]], "c": "leaf"})
}

#[test]
fn test_all_snapshots_released_after_success() {
    let engine = Engine::default();
    let (mut store, src, dst) = flaky_with(wide_tree());

    engine.copy(&mut store, src, dst).unwrap();
    assert_eq!(store.inner.outstanding_snapshots(), 0);

    engine.equals(&mut store, src, dst).unwrap();
    assert_eq!(store.inner.outstanding_snapshots(), 0);

    let flat = store.inner.new_root("flat").unwrap();
    engine.deep_flatten(&mut store, src, flat).unwrap();
    assert_eq!(store.inner.outstanding_snapshots(), 0);
}

#[test]
fn test_snapshots_released_after_write_failure() {
    let (mut store, src, dst) = flaky_with(wide_tree());
    store.writes_before_failure = Some(4);

    let err = Engine::default().copy(&mut store, src, dst).unwrap_err();

    assert!(matches!(
        err,
        TreeOpsError::WriteFailed { .. } | TreeOpsError::AttachFailed { .. }
    ));
    assert_eq!(store.inner.outstanding_snapshots(), 0);
}

#[test]
fn test_snapshots_released_after_flatten_write_failure() {
    let (mut store, src, dst) = flaky_with(wide_tree());
    store.writes_before_failure = Some(2);

    let err = Engine::default()
        .flatten(&mut store, src, dst, FlattenMode::Keys)
        .unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::StoreWrite);
    assert_eq!(store.inner.outstanding_snapshots(), 0);
}

#[test]
fn test_snapshots_released_after_peer_snapshot_failure() {
    let (mut store, src, dst) = flaky_with(json!({"a": 1}));
    Engine::default().copy(&mut store, src, dst).unwrap();
    store.snapshot_failure = Some(dst);

    let err = Engine::default().equals(&mut store, src, dst).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::StoreSnapshot);
    assert_eq!(store.inner.outstanding_snapshots(), 0);
}

#[test]
fn test_snapshots_released_after_allocation_failure() {
    let mut store = MemoryStore::new();
    let src = fixtures::load_json(&mut store, "src", &wide_tree()).unwrap();
    let dst = store.new_root("dst").unwrap();

    let err = bounded_engine(3).copy(&mut store, src, dst).unwrap_err();

    assert_eq!(err.kind(), ExErrorKind::Allocation);
    assert_eq!(store.outstanding_snapshots(), 0);
}

#[test]
fn test_uniq_releases_scratch_after_write_failure() {
    let (mut store, src, dst) = flaky_with(json!([1, 2, 3]));
    let before = store.inner.container_count();
    // three flatten writes into scratch succeed, the first dest write fails
    store.writes_before_failure = Some(3);

    let err = Engine::default()
        .uniq(&mut store, src, dst, FlattenMode::Values)
        .unwrap_err();

    assert_eq!(err.op(), Some("uniq"));
    assert_eq!(store.inner.container_count(), before);
    assert_eq!(store.inner.outstanding_snapshots(), 0);
}

#[test]
fn test_rejected_release_does_not_mask_result() {
    let (mut store, src, dst) = flaky_with(wide_tree());
    store.reject_releases = true;

    let result = Engine::default().copy(&mut store, src, dst);

    assert!(result.is_ok());
    assert_eq!(store.inner.outstanding_snapshots(), 0);
}
