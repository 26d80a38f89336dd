//! Collaborator traits for the query manager.
//!
//! The manager does not own areas, filters or layers. It asks the host
//! application about them through the traits in this module:
//!
//! - [`LayerHandler`] - a query-capable layer; registered handlers define the
//!   layer universe used by wildcard expansion
//! - [`AreaProvider`] - the known areas and whether each is shown
//! - [`FilterProvider`] - the known filters, their layer type and whether each
//!   is enabled
//! - [`EntryPersistence`] - save/load hooks for the entry list
//!
//! # Example: Implementing AreaProvider
//!
//! ```rust
//! use layer_query_engine::{AreaInfo, AreaProvider};
//!
//! struct Areas(Vec<AreaInfo>);
//!
//! impl AreaProvider for Areas {
//!     fn area(&self, area_id: &str) -> Option<AreaInfo> {
//!         self.0.iter().find(|a| a.id == area_id).cloned()
//!     }
//!
//!     fn areas(&self) -> Vec<AreaInfo> {
//!         self.0.clone()
//!     }
//! }
//! ```

use layer_query::Entry;

use crate::error::EngineResult;

/// Snapshot of an area known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaInfo {
    /// Area id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Whether the area is currently shown.
    pub shown: bool,
}

impl AreaInfo {
    /// Creates a shown area.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            shown: true,
        }
    }

    /// Sets whether the area is shown.
    pub fn with_shown(mut self, shown: bool) -> Self {
        self.shown = shown;
        self
    }
}

/// Snapshot of a filter known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterInfo {
    /// Filter id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Layer id the filter applies to.
    pub layer_type: String,
    /// Whether the filter is currently enabled.
    pub enabled: bool,
}

impl FilterInfo {
    /// Creates an enabled filter for a layer.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        layer_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            layer_type: layer_type.into(),
            enabled: true,
        }
    }

    /// Sets whether the filter is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// A registered consumer of queries for one layer.
pub trait LayerHandler {
    /// Id of the layer this handler builds queries for.
    fn layer_id(&self) -> &str;

    /// Display name of the layer.
    fn layer_name(&self) -> &str;
}

/// Source of the areas known to the host application.
pub trait AreaProvider {
    /// Looks up one area.
    fn area(&self, area_id: &str) -> Option<AreaInfo>;

    /// Returns every known area, shown or not.
    fn areas(&self) -> Vec<AreaInfo>;

    /// Returns true if the area exists and is shown.
    fn is_shown(&self, area_id: &str) -> bool {
        self.area(area_id).is_some_and(|a| a.shown)
    }
}

/// Source of the filters known to the host application.
pub trait FilterProvider {
    /// Looks up one filter.
    fn filter(&self, filter_id: &str) -> Option<FilterInfo>;

    /// Returns filters for a layer, or every filter when `layer_id` is `None`.
    fn filters(&self, layer_id: Option<&str>) -> Vec<FilterInfo>;

    /// Returns true if the filter exists and is enabled.
    fn is_enabled(&self, filter_id: &str) -> bool {
        self.filter(filter_id).is_some_and(|f| f.enabled)
    }
}

/// Save/load hooks for the entry list, supplied by the host.
pub trait EntryPersistence {
    /// Stores the committed entries.
    fn save(&self, entries: &[Entry]) -> EngineResult<()>;

    /// Returns previously stored entries.
    fn load(&self) -> EngineResult<Vec<Entry>>;
}

/// Persistence hook that stores nothing and loads nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPersistence;

impl EntryPersistence for NoopPersistence {
    fn save(&self, _entries: &[Entry]) -> EngineResult<()> {
        Ok(())
    }

    fn load(&self) -> EngineResult<Vec<Entry>> {
        Ok(Vec::new())
    }
}

/// Area provider with no areas.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAreas;

impl AreaProvider for NoAreas {
    fn area(&self, _area_id: &str) -> Option<AreaInfo> {
        None
    }

    fn areas(&self) -> Vec<AreaInfo> {
        Vec::new()
    }
}

/// Filter provider with no filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilters;

impl FilterProvider for NoFilters {
    fn filter(&self, _filter_id: &str) -> Option<FilterInfo> {
        None
    }

    fn filters(&self, _layer_id: Option<&str>) -> Vec<FilterInfo> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockAreas(Vec<AreaInfo>);

    impl AreaProvider for MockAreas {
        fn area(&self, area_id: &str) -> Option<AreaInfo> {
            self.0.iter().find(|a| a.id == area_id).cloned()
        }

        fn areas(&self) -> Vec<AreaInfo> {
            self.0.clone()
        }
    }

    struct MockFilters(Vec<FilterInfo>);

    impl FilterProvider for MockFilters {
        fn filter(&self, filter_id: &str) -> Option<FilterInfo> {
            self.0.iter().find(|f| f.id == filter_id).cloned()
        }

        fn filters(&self, layer_id: Option<&str>) -> Vec<FilterInfo> {
            self.0
                .iter()
                .filter(|f| layer_id.map_or(true, |l| f.layer_type == l))
                .cloned()
                .collect()
        }
    }

    #[test]
    fn test_area_is_shown_default() {
        let areas = MockAreas(vec![
            AreaInfo::new("a1", "Harbor"),
            AreaInfo::new("a2", "Airfield").with_shown(false),
        ]);
        assert!(areas.is_shown("a1"));
        assert!(!areas.is_shown("a2"));
        assert!(!areas.is_shown("missing"));
    }

    #[test]
    fn test_filter_is_enabled_default() {
        let filters = MockFilters(vec![
            FilterInfo::new("f1", "Speed > 10", "ships"),
            FilterInfo::new("f2", "Altitude", "planes").with_enabled(false),
        ]);
        assert!(filters.is_enabled("f1"));
        assert!(!filters.is_enabled("f2"));
        assert_eq!(filters.filters(Some("ships")).len(), 1);
        assert_eq!(filters.filters(None).len(), 2);
    }

    #[test]
    fn test_noop_persistence() {
        let hook = NoopPersistence;
        assert!(hook.save(&[Entry::new("l1", "a1", "f1")]).is_ok());
        assert!(hook.load().unwrap().is_empty());
    }
}
