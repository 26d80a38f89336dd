//! # layer-query-engine
//!
//! Entry store, wildcard expansion and the debounced query manager for
//! [`layer-query`](layer_query) rule sets.
//!
//! ## Key Features
//!
//! - **Entry store** - ordered entries with partial-key lookups and
//!   idempotent, replace-on-conflict adds
//! - **Wildcard expansion** - rewrites `*` entries into concrete per-layer
//!   entries, honoring negations and layer-specific areas
//! - **Coalesced updates** - bursts of mutations produce one expansion and one
//!   "queries changed" event carrying the union of touched layers
//! - **Injected collaborators** - areas, filters, handlers, persistence and the
//!   clock are supplied by the host; nothing is global
//!
//! ## Quick Start
//!
//! ```rust
//! use layer_query::Entry;
//! use layer_query_engine::{NamedLayer, NoAreas, NoFilters, QueryManager};
//!
//! let (areas, filters) = (NoAreas, NoFilters);
//! let mut manager = QueryManager::new(&areas, &filters);
//! manager.register_handler(Box::new(NamedLayer::new("ships", "Ships")));
//! manager.register_handler(Box::new(NamedLayer::new("planes", "Planes")));
//!
//! // Filter "fast" applies to every layer
//! manager.add_entry(Entry::new("*", "", "fast"), true);
//! assert_eq!(manager.expanded_entries().len(), 2);
//! ```
//!
//! ## Driving updates
//!
//! ```rust
//! use layer_query::Entry;
//! use layer_query_engine::{ManualClock, NamedLayer, NoAreas, NoFilters, QueryManager};
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let (areas, filters) = (NoAreas, NoFilters);
//! let mut manager = QueryManager::new(&areas, &filters).with_clock(clock.clone());
//! manager.register_handler(Box::new(NamedLayer::new("ships", "Ships")));
//! manager.flush();
//!
//! manager.add_entry(Entry::new("ships", "harbor", "*"), false);
//! manager.add_entry(Entry::new("ships", "airfield", "*"), false);
//! assert!(manager.poll().is_none());
//!
//! clock.advance(Duration::from_millis(20));
//! let event = manager.poll().expect("one coalesced update");
//! assert!(event.layers.contains("ships"));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     layer-query-engine                        │
//! │                                                               │
//! │  QueryManager                                                 │
//! │  ├── EntryStore        raw entries (source of truth)          │
//! │  ├── HandlerRegistry   layer universe                         │
//! │  ├── Delay + Clock     coalescing update timer                │
//! │  └── on update:                                               │
//! │      ├── WildcardExpander → expanded entries                  │
//! │      └── QueriesChanged { dirty layers } → listeners          │
//! │                                                               │
//! │  Host-supplied: AreaProvider, FilterProvider, LayerHandler,   │
//! │                 EntryPersistence                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod config;
mod error;
mod event;
mod expander;
mod manager;
mod registry;
mod store;
mod timer;
mod traits;

// Public re-exports
pub use config::{QueryManagerConfig, QueryManagerConfigBuilder, DEFAULT_UPDATE_DELAY};
pub use error::{EngineError, EngineResult};
pub use event::{DirtyLayers, ListenerId, QueriesChanged};
pub use expander::WildcardExpander;
pub use manager::QueryManager;
pub use registry::{HandlerRegistry, NamedLayer};
pub use store::{select, EntryFilter, EntryStore};
pub use timer::{Clock, Delay, ManualClock, SystemClock};
pub use traits::{
    AreaInfo, AreaProvider, EntryPersistence, FilterInfo, FilterProvider, LayerHandler, NoAreas,
    NoFilters, NoopPersistence,
};

// Re-export commonly used types from dependencies for convenience
pub use layer_query::{AreaState, Entry, EntryFragment, Selector};
