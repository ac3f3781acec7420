use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use super::{ContainerStore, Snapshot, SnapshotEntry};
use crate::errors::{Result, TreeOpsError};
use crate::model::{ContainerId, HostValue, Scalar};

#[derive(Debug, Clone, Default)]
struct Slot {
    rooted: bool,
    /// Keyed by canonical subscript; keeps the key as last written
    entries: IndexMap<String, (Scalar, HostValue)>,
}

/// In-memory reference host
///
/// Enforces the same construction rules as a real host so that engine
/// bugs surface as errors instead of silently lost writes:
/// - containers start out floating and reject writes until attached;
/// - attaching moves the container to a fresh canonical handle and retires
///   the old one;
/// - snapshots are counted until released.
///
/// Entries iterate in insertion order. Not thread-safe, designed for
/// single-threaded use.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    next_id: u64,
    next_token: u64,
    containers: HashMap<ContainerId, Slot>,
    retired: HashSet<ContainerId>,
    names: HashMap<String, ContainerId>,
    outstanding: HashMap<u64, ContainerId>,
    allow_destroy: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty store that permits container destruction
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_token: 1,
            containers: HashMap::new(),
            retired: HashSet::new(),
            names: HashMap::new(),
            outstanding: HashMap::new(),
            allow_destroy: true,
        }
    }

    /// Create a store whose `unbind_name` only drops the name
    pub fn without_destroy() -> Self {
        Self {
            allow_destroy: false,
            ..Self::new()
        }
    }

    /// Create a container and bind it under `name` in one step
    ///
    /// # Errors
    ///
    /// Propagates errors from `bind_name`.
    pub fn new_root(&mut self, name: &str) -> Result<ContainerId> {
        let id = self.create_container()?;
        let bound = self.bind_name(name, HostValue::Array(id))?;
        bound.as_container().ok_or_else(|| TreeOpsError::Internal {
            message: format!("name {} did not bind to a container", name),
        })
    }

    /// Number of snapshots issued and not yet released
    pub fn outstanding_snapshots(&self) -> usize {
        self.outstanding.len()
    }

    /// Number of live containers, rooted or floating
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    /// Number of entries in a container
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` or `ContainerNotFound` for unusable handles.
    pub fn len(&self, container: ContainerId) -> Result<usize> {
        Ok(self.slot(container)?.entries.len())
    }

    /// Whether a handle was retired by an attach
    pub fn is_retired(&self, container: ContainerId) -> bool {
        self.retired.contains(&container)
    }

    /// Keys of a container in iteration order
    ///
    /// # Errors
    ///
    /// Returns `StaleHandle` or `ContainerNotFound` for unusable handles.
    pub fn keys(&self, container: ContainerId) -> Result<Vec<Scalar>> {
        Ok(self
            .slot(container)?
            .entries
            .values()
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn slot(&self, container: ContainerId) -> Result<&Slot> {
        if self.retired.contains(&container) {
            return Err(TreeOpsError::StaleHandle { container });
        }
        self.containers
            .get(&container)
            .ok_or(TreeOpsError::ContainerNotFound { container })
    }

    fn slot_mut(&mut self, container: ContainerId) -> Result<&mut Slot> {
        if self.retired.contains(&container) {
            return Err(TreeOpsError::StaleHandle { container });
        }
        self.containers
            .get_mut(&container)
            .ok_or(TreeOpsError::ContainerNotFound { container })
    }

    fn allocate_id(&mut self) -> ContainerId {
        let id = ContainerId::from_raw(self.next_id);
        self.next_id += 1;
        id
    }

    /// Root a floating container under a fresh handle, retiring the old one
    fn materialize(&mut self, container: ContainerId) -> Result<ContainerId> {
        if self.slot(container)?.rooted {
            return Err(TreeOpsError::AlreadyAttached { container });
        }
        let mut slot = self
            .containers
            .remove(&container)
            .ok_or(TreeOpsError::ContainerNotFound { container })?;
        slot.rooted = true;

        let canonical = self.allocate_id();
        self.containers.insert(canonical, slot);
        self.retired.insert(container);
        tracing::trace!(
            from = %container,
            to = %canonical,
            "container materialized"
        );
        Ok(canonical)
    }

    /// Destroy a container and every container below it
    fn destroy_subtree(&mut self, root: ContainerId) {
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            if let Some(slot) = self.containers.remove(&id) {
                pending.extend(slot.entries.values().filter_map(|(_, v)| v.as_container()));
            }
        }
    }
}

impl ContainerStore for MemoryStore {
    fn create_container(&mut self) -> Result<ContainerId> {
        let id = self.allocate_id();
        self.containers.insert(id, Slot::default());
        Ok(id)
    }

    fn get_entry(&self, container: ContainerId, key: &Scalar) -> Result<Option<HostValue>> {
        Ok(self
            .slot(container)?
            .entries
            .get(&key.subscript())
            .map(|(_, value)| value.clone()))
    }

    fn set_entry(
        &mut self,
        container: ContainerId,
        key: Scalar,
        value: HostValue,
    ) -> Result<HostValue> {
        if !self.slot(container)?.rooted {
            return Err(TreeOpsError::UnrootedContainer { container });
        }

        let tag = value.tag();
        let stored = match value {
            HostValue::Array(child) => HostValue::Array(self.materialize(child)?),
            HostValue::ScalarCookie(_) | HostValue::ValueCookie(_) => {
                return Err(TreeOpsError::Internal {
                    message: format!("cannot store a {} value", tag),
                })
            }
            scalar => scalar,
        };

        let replaced = self
            .slot_mut(container)?
            .entries
            .insert(key.subscript(), (key, stored.clone()));
        if let Some((_, HostValue::Array(old))) = replaced {
            self.destroy_subtree(old);
        }
        Ok(stored)
    }

    fn snapshot(&mut self, container: ContainerId) -> Result<Option<Snapshot>> {
        let slot = self.slot(container)?;
        if !slot.rooted || slot.entries.is_empty() {
            return Ok(None);
        }

        let entries = slot
            .entries
            .values()
            .map(|(key, value)| SnapshotEntry {
                key: key.clone().into_host(),
                value: value.clone(),
            })
            .collect();

        let token = self.next_token;
        self.next_token += 1;
        self.outstanding.insert(token, container);
        Ok(Some(Snapshot::new(token, entries)))
    }

    fn release_snapshot(&mut self, container: ContainerId, snapshot: Snapshot) -> Result<()> {
        let token = snapshot.token();
        match self.outstanding.get(&token) {
            Some(owner) if *owner == container => {
                self.outstanding.remove(&token);
                Ok(())
            }
            _ => Err(TreeOpsError::UnknownSnapshot {
                container,
                token,
            }),
        }
    }

    fn bind_name(&mut self, name: &str, value: HostValue) -> Result<HostValue> {
        let container = value.as_container().ok_or_else(|| TreeOpsError::Internal {
            message: format!("only containers can be bound to names, got {}", value.tag()),
        })?;
        let canonical = self.materialize(container)?;
        if let Some(previous) = self.names.insert(name.to_string(), canonical) {
            self.destroy_subtree(previous);
        }
        Ok(HostValue::Array(canonical))
    }

    fn unbind_name(&mut self, name: &str) -> Result<bool> {
        let container = self
            .names
            .remove(name)
            .ok_or_else(|| TreeOpsError::NameNotBound {
                name: name.to_string(),
            })?;
        if self.allow_destroy {
            self.destroy_subtree(container);
        }
        Ok(self.allow_destroy)
    }

    fn lookup_name(&self, name: &str) -> Option<HostValue> {
        self.names.get(name).map(|id| HostValue::Array(*id))
    }
}
