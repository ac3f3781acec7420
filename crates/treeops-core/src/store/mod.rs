//! Host container store boundary
//!
//! Engines never own containers. They talk to the host through
//! [`ContainerStore`], whose contract mirrors a host that builds trees
//! top-down:
//!
//! - a freshly created container must be attached (to a parent entry or a
//!   bound name) before anything is written into it;
//! - the handle returned by the attach call is the canonical one, the
//!   pre-attach handle must not be used again;
//! - every snapshot must be handed back through
//!   [`ContainerStore::release_snapshot`].

pub mod fixtures;
pub mod memory;

pub use memory::MemoryStore;

use crate::errors::Result;
use crate::model::{ContainerId, HostValue, Scalar};

/// One (key, value) pair captured by a snapshot, in host representation
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub key: HostValue,
    pub value: HostValue,
}

/// Point-in-time list of a container's entries
///
/// Not `Clone`. A snapshot is released by moving it back into the store
/// that issued it, exactly once.
#[derive(Debug, PartialEq)]
pub struct Snapshot {
    token: u64,
    entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn new(token: u64, entries: Vec<SnapshotEntry>) -> Self {
        Self { token, entries }
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Host-owned container store
///
/// All calls are fallible and non-blocking. Implementations are used from a
/// single thread for the duration of an operation.
pub trait ContainerStore {
    /// Create a new, unattached container
    fn create_container(&mut self) -> Result<ContainerId>;

    /// Read one entry
    fn get_entry(&self, container: ContainerId, key: &Scalar) -> Result<Option<HostValue>>;

    /// Write one entry and return the value as stored
    ///
    /// When `value` is a container this attaches it; the returned value
    /// carries the canonical post-attach handle.
    fn set_entry(
        &mut self,
        container: ContainerId,
        key: Scalar,
        value: HostValue,
    ) -> Result<HostValue>;

    /// Snapshot a container's entries
    ///
    /// Returns `Ok(None)` when the container is empty or not materialized;
    /// callers skip it.
    fn snapshot(&mut self, container: ContainerId) -> Result<Option<Snapshot>>;

    /// Hand a snapshot back to the store
    fn release_snapshot(&mut self, container: ContainerId, snapshot: Snapshot) -> Result<()>;

    /// Install a container under a root name and return its canonical value
    fn bind_name(&mut self, name: &str, value: HostValue) -> Result<HostValue>;

    /// Remove a root name
    ///
    /// Returns `true` when the container was destroyed, `false` when the
    /// host does not permit destruction and only dropped the name.
    fn unbind_name(&mut self, name: &str) -> Result<bool>;

    /// Look up a root name
    fn lookup_name(&self, name: &str) -> Option<HostValue>;
}
