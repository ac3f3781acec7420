//! Container worklist
//!
//! A FIFO over a flat buffer. Subcontainers are appended at the tail as
//! they are discovered and a cursor walks from head to tail, so traversal
//! depth never touches the call stack. Processed items keep the snapshots
//! taken for them until [`Worklist::release_snapshots`] hands them back.

use crate::config::EngineConfig;
use crate::errors::{Result, TreeOpsError};
use crate::model::ContainerId;
use crate::store::{ContainerStore, Snapshot};

/// One pending traversal unit
#[derive(Debug)]
pub struct WorkItem {
    /// Container whose entries drive the traversal
    pub source: ContainerId,
    /// Destination (copy) or right-hand side (equality)
    pub peer: Option<ContainerId>,
    pub source_snapshot: Option<Snapshot>,
    pub peer_snapshot: Option<Snapshot>,
}

impl WorkItem {
    pub fn single(source: ContainerId) -> Self {
        Self {
            source,
            peer: None,
            source_snapshot: None,
            peer_snapshot: None,
        }
    }

    pub fn paired(source: ContainerId, peer: ContainerId) -> Self {
        Self {
            peer: Some(peer),
            ..Self::single(source)
        }
    }
}

#[derive(Debug)]
pub struct Worklist {
    op: &'static str,
    items: Vec<WorkItem>,
    capacity: usize,
    growth_factor: usize,
    max_items: Option<usize>,
    cursor: usize,
}

impl Worklist {
    /// Create an empty worklist with the configured initial capacity
    ///
    /// # Errors
    ///
    /// Returns `WorklistAllocation` if the initial buffer cannot be reserved.
    pub fn new(op: &'static str, config: &EngineConfig) -> Result<Self> {
        let mut worklist = Self {
            op,
            items: Vec::new(),
            capacity: 0,
            growth_factor: config.growth_factor.max(2),
            max_items: config.max_work_items,
            cursor: 0,
        };
        let initial = config.initial_capacity.max(1);
        worklist.reserve(config.max_work_items.map_or(initial, |max| initial.min(max)))?;
        Ok(worklist)
    }

    /// Append an item at the tail, growing the buffer if it is full
    ///
    /// # Errors
    ///
    /// Returns `WorklistAllocation` when the buffer cannot grow.
    pub fn push(&mut self, item: WorkItem) -> Result<usize> {
        let index = self.items.len();
        self.ensure_capacity(index + 1)?;
        self.items.push(item);
        Ok(index)
    }

    /// Make room for `needed` items, multiplying the capacity by the growth
    /// factor until it fits. Stored items are preserved.
    ///
    /// # Errors
    ///
    /// Returns `WorklistAllocation` past `max_work_items`, on capacity
    /// overflow, or when the allocator refuses the request.
    pub fn ensure_capacity(&mut self, needed: usize) -> Result<()> {
        if self.max_items.is_some_and(|max| needed > max) {
            return Err(self.allocation_error(needed));
        }
        if needed <= self.capacity {
            return Ok(());
        }

        let mut target = self.capacity.max(1);
        while target < needed {
            target = target
                .checked_mul(self.growth_factor)
                .ok_or_else(|| self.allocation_error(needed))?;
        }
        if let Some(max) = self.max_items {
            target = target.min(max);
        }

        tracing::debug!(
            op = self.op,
            from = self.capacity,
            to = target,
            "worklist grown"
        );
        self.reserve(target)
    }

    fn reserve(&mut self, target: usize) -> Result<()> {
        self.items
            .try_reserve_exact(target - self.items.len())
            .map_err(|_| self.allocation_error(target))?;
        self.capacity = target;
        Ok(())
    }

    fn allocation_error(&self, requested: usize) -> TreeOpsError {
        TreeOpsError::WorklistAllocation {
            op: self.op.to_string(),
            requested,
        }
    }

    /// Item at `index`, for in-place mutation
    pub fn at(&mut self, index: usize) -> Option<&mut WorkItem> {
        self.items.get_mut(index)
    }

    /// Item under the cursor, or `None` once the list is drained
    pub fn current(&self) -> Option<&WorkItem> {
        self.items.get(self.cursor)
    }

    /// Store the snapshots taken for the item under the cursor
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the list is drained; the snapshots are handed
    /// back so the caller can still release them.
    pub fn park(
        &mut self,
        source_snapshot: Option<Snapshot>,
        peer_snapshot: Option<Snapshot>,
    ) -> std::result::Result<(), (Option<Snapshot>, Option<Snapshot>)> {
        match self.items.get_mut(self.cursor) {
            Some(item) => {
                item.source_snapshot = source_snapshot;
                item.peer_snapshot = peer_snapshot;
                Ok(())
            }
            None => Err((source_snapshot, peer_snapshot)),
        }
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Release every snapshot held by the list
    ///
    /// Runs on success and failure paths alike. A release the host rejects
    /// is logged and does not stop the remaining releases. Returns the
    /// number of rejected releases.
    pub fn release_snapshots<S: ContainerStore + ?Sized>(&mut self, store: &mut S) -> usize {
        let mut failures = 0;
        for (index, item) in self.items.iter_mut().enumerate() {
            let held = [
                (item.source, item.source_snapshot.take()),
                (item.peer.unwrap_or(item.source), item.peer_snapshot.take()),
            ];
            for (container, snapshot) in held {
                let Some(snapshot) = snapshot else { continue };
                if let Err(err) = store.release_snapshot(container, snapshot) {
                    failures += 1;
                    tracing::error!(
                        op = self.op,
                        index,
                        container = %container,
                        error = %err,
                        "snapshot release failed"
                    );
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HostValue;
    use crate::store::MemoryStore;

    fn id(raw: u64) -> ContainerId {
        ContainerId::from_raw(raw)
    }

    #[test]
    fn test_starts_with_configured_capacity() {
        let worklist = Worklist::new("test", &EngineConfig::default()).unwrap();
        assert_eq!(worklist.capacity(), 10);
        assert!(worklist.is_empty());
    }

    #[test]
    fn test_grows_by_factor_preserving_items() {
        let mut worklist = Worklist::new("test", &EngineConfig::default()).unwrap();
        for raw in 0..11 {
            assert_eq!(worklist.push(WorkItem::single(id(raw))).unwrap(), raw as usize);
        }

        assert_eq!(worklist.capacity(), 100);
        assert_eq!(worklist.len(), 11);
        for raw in 0..11 {
            assert_eq!(worklist.at(raw as usize).unwrap().source, id(raw));
        }
    }

    #[test]
    fn test_ensure_capacity_jumps_several_factors() {
        let mut worklist = Worklist::new("test", &EngineConfig::default()).unwrap();
        worklist.ensure_capacity(1001).unwrap();
        assert_eq!(worklist.capacity(), 10_000);
    }

    #[test]
    fn test_max_work_items_is_an_allocation_failure() {
        let config = EngineConfig {
            max_work_items: Some(3),
            ..EngineConfig::default()
        };
        let mut worklist = Worklist::new("deep_flatten", &config).unwrap();
        for raw in 0..3 {
            worklist.push(WorkItem::single(id(raw))).unwrap();
        }

        let err = worklist.push(WorkItem::single(id(9))).unwrap_err();

        assert_eq!(
            err,
            TreeOpsError::WorklistAllocation {
                op: "deep_flatten".to_string(),
                requested: 4
            }
        );
        assert_eq!(worklist.len(), 3);
    }

    #[test]
    fn test_cursor_walks_fifo() {
        let mut worklist = Worklist::new("test", &EngineConfig::default()).unwrap();
        worklist.push(WorkItem::single(id(1))).unwrap();
        worklist.push(WorkItem::paired(id(2), id(3))).unwrap();

        assert_eq!(worklist.current().map(|i| i.source), Some(id(1)));
        worklist.advance();
        assert_eq!(worklist.current().map(|i| i.peer), Some(Some(id(3))));
        worklist.advance();
        assert!(worklist.current().is_none());
        assert_eq!(worklist.cursor(), 2);
    }

    #[test]
    fn test_release_snapshots_returns_everything() {
        let mut store = MemoryStore::new();
        let a = store.new_root("a").unwrap();
        let b = store.new_root("b").unwrap();
        store.set_entry(a, "k".into(), HostValue::Number(1.0)).unwrap();
        store.set_entry(b, "k".into(), HostValue::Number(2.0)).unwrap();

        let mut worklist = Worklist::new("test", &EngineConfig::default()).unwrap();
        worklist.push(WorkItem::paired(a, b)).unwrap();
        let left = store.snapshot(a).unwrap();
        let right = store.snapshot(b).unwrap();
        worklist.park(left, right).unwrap();
        assert_eq!(store.outstanding_snapshots(), 2);

        assert_eq!(worklist.release_snapshots(&mut store), 0);
        assert_eq!(store.outstanding_snapshots(), 0);
        // second pass finds nothing left to release
        assert_eq!(worklist.release_snapshots(&mut store), 0);
    }
}
