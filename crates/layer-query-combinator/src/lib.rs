//! # layer-query-combinator
//!
//! Pivot trees over [`layer-query-engine`](layer_query_engine) entries: a
//! checkbox tree grouped by layer, area and filter, synced both ways with the
//! query manager.
//!
//! ## Key Features
//!
//! - **Pivot tree builder** - one level per pivot in any order, candidates
//!   narrowed by the values fixed above them, sorted labels and "No ..."
//!   placeholders; a flattened simple view
//! - **Tri-state nodes** - leaves are checked directly, branches aggregate
//!   to on, off or indeterminate
//! - **Reconciliation** - [`apply_entries`] derives states from live entries,
//!   [`parse_entries`] flattens the tree back, turning unchecked areas of
//!   global rules into negations
//! - **Controller** - debounced rebuilds and automatic applies, collapse
//!   state kept across rebuilds
//!
//! ## Quick Start
//!
//! ```rust
//! use layer_query::Entry;
//! use layer_query_combinator::{CombinatorConfig, CombinatorController};
//! use layer_query_engine::{FilterInfo, FilterProvider, NamedLayer, NoAreas, QueryManager};
//!
//! struct Filters;
//!
//! impl FilterProvider for Filters {
//!     fn filter(&self, id: &str) -> Option<FilterInfo> {
//!         (id == "fast").then(|| FilterInfo::new("fast", "Fast", "ships"))
//!     }
//!     fn filters(&self, _layer: Option<&str>) -> Vec<FilterInfo> {
//!         vec![FilterInfo::new("fast", "Fast", "ships")]
//!     }
//! }
//!
//! let (areas, filters) = (NoAreas, Filters);
//! let mut manager = QueryManager::new(&areas, &filters);
//! manager.register_handler(Box::new(NamedLayer::new("ships", "Ships")));
//!
//! let mut controller = CombinatorController::new(CombinatorConfig::default());
//! controller.rebuild(&manager);
//! controller.toggle("root/ships/filter:fast").unwrap();
//! controller.apply(&mut manager).unwrap();
//!
//! assert_eq!(manager.entries(), &[Entry::new("ships", "*", "fast")]);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   layer-query-combinator                      │
//! │                                                               │
//! │  CombinatorController                                         │
//! │  ├── rebuild (delayed)                                        │
//! │  │   ├── PivotTreeBuilder   registries → PivotNode tree       │
//! │  │   └── apply_entries      live entries → node states        │
//! │  ├── toggle / set_state     tri-state edits                   │
//! │  └── apply (explicit or delayed)                              │
//! │      └── parse_entries      tree → entries → QueryManager     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod builder;
pub mod config;
pub mod controller;
pub mod error;
pub mod node;
pub mod reconcile;

// Public re-exports
pub use builder::{PivotTreeBuilder, NO_FILTER_LABEL};
pub use config::{
    CombinatorConfig, CombinatorConfigBuilder, DEFAULT_APPLY_DELAY, DEFAULT_REBUILD_DELAY,
};
pub use controller::{CombinatorController, CombinatorEvent};
pub use error::{CombinatorError, CombinatorResult};
pub use node::{PivotNode, TriState, ROOT_ID};
pub use reconcile::{apply_entries, parse_entries, MatchMode};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let _: Option<CombinatorConfig> = None;
        let _: Option<CombinatorController> = None;
        let _: Option<PivotNode> = None;
        let _: Option<CombinatorResult<()>> = None;
        assert_eq!(TriState::default(), TriState::Off);
    }
}
