//! Scratch containers
//!
//! uniq needs an intermediate container that outlives nothing but the call.
//! It is bound under a generated root name so the host keeps it alive, and
//! unbound again before the call returns.

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::errors::{Result, TreeOpsError};
use crate::model::{ContainerId, HostValue};
use crate::store::ContainerStore;

/// A container bound under a unique name for the span of one call
///
/// Must be handed back with [`Scratch::release`]; the store is not reachable
/// from `Drop`.
#[derive(Debug)]
#[must_use = "a scratch container stays bound until released"]
pub struct Scratch {
    name: String,
    id: ContainerId,
}

impl Scratch {
    /// Create a container and bind it under `<scratch_prefix>_<uuid>`
    ///
    /// # Errors
    ///
    /// Returns `AttachFailed` if the store refuses the container or the
    /// binding.
    pub fn acquire<S: ContainerStore + ?Sized>(
        store: &mut S,
        config: &EngineConfig,
        op: &str,
    ) -> Result<Self> {
        let name = format!("{}_{}", config.scratch_prefix, Uuid::now_v7().simple());
        let attach_failed = |err: TreeOpsError, container: ContainerId| TreeOpsError::AttachFailed {
            op: op.to_string(),
            container,
            key: name.clone(),
            source: Box::new(err),
        };

        let created = store
            .create_container()
            .map_err(|err| attach_failed(err, ContainerId::from_raw(0)))?;
        let bound = store
            .bind_name(&name, HostValue::Array(created))
            .map_err(|err| attach_failed(err, created))?;
        let id = bound.as_container().ok_or_else(|| {
            attach_failed(
                TreeOpsError::Internal {
                    message: format!("scratch bound to a {} value", bound.tag()),
                },
                created,
            )
        })?;

        tracing::trace!(op, scratch = %name, container = %id, "scratch acquired");
        Ok(Self { name, id })
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unbind the name, destroying the container where the host allows it
    ///
    /// Failures are logged, not returned: the result of the call is already
    /// decided by the time the scratch goes away.
    pub fn release<S: ContainerStore + ?Sized>(self, store: &mut S) {
        match store.unbind_name(&self.name) {
            Ok(true) => tracing::trace!(scratch = %self.name, "scratch destroyed"),
            Ok(false) => tracing::debug!(
                scratch = %self.name,
                container = %self.id,
                "host kept scratch container alive after unbind"
            ),
            Err(err) => tracing::error!(
                scratch = %self.name,
                error = %err,
                "scratch release failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_acquire_binds_unique_names() {
        let mut store = MemoryStore::new();
        let config = EngineConfig::default();

        let first = Scratch::acquire(&mut store, &config, "uniq").unwrap();
        let second = Scratch::acquire(&mut store, &config, "uniq").unwrap();

        assert_ne!(first.name(), second.name());
        assert!(first.name().starts_with("__treeops_scratch_"));
        assert_eq!(
            store.lookup_name(first.name()),
            Some(HostValue::Array(first.id()))
        );

        first.release(&mut store);
        second.release(&mut store);
    }

    #[test]
    fn test_release_destroys_container() {
        let mut store = MemoryStore::new();
        let scratch = Scratch::acquire(&mut store, &EngineConfig::default(), "uniq").unwrap();
        let name = scratch.name().to_string();
        assert_eq!(store.container_count(), 1);

        scratch.release(&mut store);

        assert_eq!(store.lookup_name(&name), None);
        assert_eq!(store.container_count(), 0);
    }

    #[test]
    fn test_release_on_host_without_destroy_drops_name_only() {
        let mut store = MemoryStore::without_destroy();
        let scratch = Scratch::acquire(&mut store, &EngineConfig::default(), "uniq").unwrap();
        let name = scratch.name().to_string();

        scratch.release(&mut store);

        assert_eq!(store.lookup_name(&name), None);
        assert_eq!(store.container_count(), 1);
    }

    #[test]
    fn test_prefix_comes_from_config() {
        let mut store = MemoryStore::new();
        let config = EngineConfig {
            scratch_prefix: "tmp".to_string(),
            ..EngineConfig::default()
        };

        let scratch = Scratch::acquire(&mut store, &config, "uniq").unwrap();

        assert!(scratch.name().starts_with("tmp_"));
        scratch.release(&mut store);
    }
}
