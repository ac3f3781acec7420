//! Engine configuration
//!
//! ```
//! use treeops_core::config::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str("initial_capacity = 32").unwrap();
//! assert_eq!(config.initial_capacity, 32);
//! assert_eq!(config.growth_factor, 10);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TreeOpsError};

pub const DEFAULT_INITIAL_CAPACITY: usize = 10;
pub const DEFAULT_GROWTH_FACTOR: usize = 10;
pub const DEFAULT_SCRATCH_PREFIX: &str = "__treeops_scratch";

/// Tunables for the traversal engines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Work items reserved before the first growth
    pub initial_capacity: usize,
    /// Multiplier applied to the capacity whenever the worklist is full
    pub growth_factor: usize,
    /// Hard ceiling on queued work items; exceeding it is an allocation failure
    pub max_work_items: Option<usize>,
    /// Prefix for the names uniq binds its scratch containers under
    pub scratch_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            max_work_items: None,
            scratch_prefix: DEFAULT_SCRATCH_PREFIX.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(TreeOpsError::InvalidConfig {
                reason: "initial_capacity must be at least 1".to_string(),
            });
        }
        if self.growth_factor < 2 {
            return Err(TreeOpsError::InvalidConfig {
                reason: "growth_factor must be at least 2".to_string(),
            });
        }
        if self.max_work_items == Some(0) {
            return Err(TreeOpsError::InvalidConfig {
                reason: "max_work_items must be at least 1".to_string(),
            });
        }
        if self.scratch_prefix.is_empty() {
            return Err(TreeOpsError::InvalidConfig {
                reason: "scratch_prefix must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
