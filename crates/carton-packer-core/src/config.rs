use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Packing configuration.
///
/// Key notes:
///   - `max_cartons_to_balance_weight` caps the post-pack weight
///     redistribution; above this count the extra repacking is deemed not
///     worth the computation time
///   - `strict_item_ordering` forces placement in the order given and
///     disables skip-and-retry, layer stabilisation and redistribution
///   - `timeout` is a wall-clock budget, checked at iteration boundaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackerConfig {
    /// Number of cartons at which weight balancing is skipped.
    pub max_cartons_to_balance_weight: usize,
    /// Raise on the first unpackable item instead of returning a partial result.
    pub throw_on_unpackable_item: bool,
    /// Place items strictly in the order given.
    pub strict_item_ordering: bool,
    /// Optional wall-clock budget for a single `pack()` call.
    #[serde(default)]
    pub timeout: Option<Duration>,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            max_cartons_to_balance_weight: 12,
            throw_on_unpackable_item: true,
            strict_item_ordering: false,
            timeout: None,
        }
    }
}

impl PackerConfig {
    /// Create a fluent builder for `PackerConfig`.
    pub fn builder() -> PackerConfigBuilder {
        PackerConfigBuilder::new()
    }
}

/// Builder for `PackerConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct PackerConfigBuilder {
    cfg: PackerConfig,
}

impl PackerConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: PackerConfig::default(),
        }
    }
    pub fn max_cartons_to_balance_weight(mut self, v: usize) -> Self {
        self.cfg.max_cartons_to_balance_weight = v;
        self
    }
    pub fn throw_on_unpackable_item(mut self, v: bool) -> Self {
        self.cfg.throw_on_unpackable_item = v;
        self
    }
    pub fn strict_item_ordering(mut self, v: bool) -> Self {
        self.cfg.strict_item_ordering = v;
        self
    }
    pub fn timeout(mut self, v: Option<Duration>) -> Self {
        self.cfg.timeout = v;
        self
    }
    pub fn build(self) -> PackerConfig {
        self.cfg
    }
}
