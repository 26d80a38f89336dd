//! Configuration types for the query manager.

use std::time::Duration;

/// Default coalescing window for expansion and change notification.
pub const DEFAULT_UPDATE_DELAY: Duration = Duration::from_millis(20);

/// Configuration for the query manager.
///
/// # Example
///
/// ```rust
/// use layer_query_engine::QueryManagerConfig;
/// use std::time::Duration;
///
/// let config = QueryManagerConfig::builder()
///     .with_update_delay(Duration::from_millis(50))
///     .build();
/// assert_eq!(config.update_delay, Duration::from_millis(50));
/// ```
#[derive(Debug, Clone)]
pub struct QueryManagerConfig {
    /// How long mutations are coalesced before one update runs.
    pub update_delay: Duration,
}

impl Default for QueryManagerConfig {
    fn default() -> Self {
        Self {
            update_delay: DEFAULT_UPDATE_DELAY,
        }
    }
}

impl QueryManagerConfig {
    /// Creates a new builder for QueryManagerConfig.
    pub fn builder() -> QueryManagerConfigBuilder {
        QueryManagerConfigBuilder::default()
    }
}

/// Builder for QueryManagerConfig.
#[derive(Debug, Clone, Default)]
pub struct QueryManagerConfigBuilder {
    update_delay: Option<Duration>,
}

impl QueryManagerConfigBuilder {
    /// Sets the update coalescing window.
    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = Some(delay);
        self
    }

    /// Builds the QueryManagerConfig.
    pub fn build(self) -> QueryManagerConfig {
        QueryManagerConfig {
            update_delay: self.update_delay.unwrap_or(DEFAULT_UPDATE_DELAY),
        }
    }
}
