//! Dispatcher configuration types
//!
//! The dispatcher needs very little configuration: how many slots to
//! reserve up front, and whether a full table may be compacted instead of
//! grown.

use serde::{Deserialize, Serialize};

/// Configuration for a dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Slots reserved when the dispatcher is created (0 = allocate lazily)
    #[serde(default)]
    pub initial_capacity: usize,

    /// Reclaim tombstones instead of growing when at least half of a full
    /// table is dead
    #[serde(default = "default_true")]
    pub compact_before_grow: bool,
}

fn default_true() -> bool {
    true
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            compact_before_grow: true,
        }
    }
}

impl DispatcherConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: reserve slots on creation
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Builder method: enable or disable compaction before growth
    pub fn with_compact_before_grow(mut self, enabled: bool) -> Self {
        self.compact_before_grow = enabled;
        self
    }
}
