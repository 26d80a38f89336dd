//! Configuration types for the combinator controller.

use std::time::Duration;

use layer_query::PivotOrder;

/// Default delay before a requested tree rebuild runs.
pub const DEFAULT_REBUILD_DELAY: Duration = Duration::from_millis(50);

/// Default delay before tree edits are applied in apply-immediately mode.
pub const DEFAULT_APPLY_DELAY: Duration = Duration::from_millis(100);

/// Configuration for the combinator controller.
///
/// # Example
///
/// ```rust
/// use layer_query_combinator::CombinatorConfig;
///
/// let config = CombinatorConfig::builder()
///     .with_pivot_order("area,layer,filter".parse().unwrap())
///     .with_apply_immediately(true)
///     .build();
/// assert!(config.apply_immediately);
/// assert_eq!(config.pivot_order.to_string(), "area,layer,filter");
/// ```
#[derive(Debug, Clone)]
pub struct CombinatorConfig {
    /// Coalescing window for rebuild requests.
    pub rebuild_delay: Duration,
    /// Coalescing window for automatic applies.
    pub apply_delay: Duration,
    /// Commit tree edits to the query manager without an explicit apply.
    pub apply_immediately: bool,
    /// Forces the advanced (true) or simple (false) view. `None` picks the
    /// advanced view when explicit entries exist.
    pub advanced: Option<bool>,
    /// Pivot order of the advanced view.
    pub pivot_order: PivotOrder,
    /// Restricts the tree to one layer.
    pub layer_filter: Option<String>,
}

impl Default for CombinatorConfig {
    fn default() -> Self {
        Self {
            rebuild_delay: DEFAULT_REBUILD_DELAY,
            apply_delay: DEFAULT_APPLY_DELAY,
            apply_immediately: false,
            advanced: None,
            pivot_order: PivotOrder::default(),
            layer_filter: None,
        }
    }
}

impl CombinatorConfig {
    /// Creates a new builder for CombinatorConfig.
    pub fn builder() -> CombinatorConfigBuilder {
        CombinatorConfigBuilder::default()
    }
}

/// Builder for CombinatorConfig.
#[derive(Debug, Clone, Default)]
pub struct CombinatorConfigBuilder {
    rebuild_delay: Option<Duration>,
    apply_delay: Option<Duration>,
    apply_immediately: Option<bool>,
    advanced: Option<bool>,
    pivot_order: Option<PivotOrder>,
    layer_filter: Option<String>,
}

impl CombinatorConfigBuilder {
    /// Sets the rebuild coalescing window.
    pub fn with_rebuild_delay(mut self, delay: Duration) -> Self {
        self.rebuild_delay = Some(delay);
        self
    }

    /// Sets the automatic apply window.
    pub fn with_apply_delay(mut self, delay: Duration) -> Self {
        self.apply_delay = Some(delay);
        self
    }

    /// Enables or disables automatic applies.
    pub fn with_apply_immediately(mut self, enabled: bool) -> Self {
        self.apply_immediately = Some(enabled);
        self
    }

    /// Forces the advanced or simple view.
    pub fn with_advanced(mut self, advanced: bool) -> Self {
        self.advanced = Some(advanced);
        self
    }

    /// Sets the pivot order.
    pub fn with_pivot_order(mut self, order: PivotOrder) -> Self {
        self.pivot_order = Some(order);
        self
    }

    /// Restricts the tree to one layer.
    pub fn with_layer_filter(mut self, layer_id: impl Into<String>) -> Self {
        self.layer_filter = Some(layer_id.into());
        self
    }

    /// Builds the CombinatorConfig.
    pub fn build(self) -> CombinatorConfig {
        CombinatorConfig {
            rebuild_delay: self.rebuild_delay.unwrap_or(DEFAULT_REBUILD_DELAY),
            apply_delay: self.apply_delay.unwrap_or(DEFAULT_APPLY_DELAY),
            apply_immediately: self.apply_immediately.unwrap_or(false),
            advanced: self.advanced,
            pivot_order: self.pivot_order.unwrap_or_default(),
            layer_filter: self.layer_filter,
        }
    }
}
