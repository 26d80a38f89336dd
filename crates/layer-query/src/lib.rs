//! # layer-query
//!
//! Rule model for layer/area/filter query sets.
//!
//! A query set is a list of [`Entry`] records. Each entry ties a layer to an
//! area and a filter, with an inclusion flag for the area and an AND/OR
//! grouping flag for the filter. Any of the three ids may be the wildcard
//! `*`, meaning "all", which the engine crate expands into concrete entries.
//!
//! This crate provides:
//! - **[`Selector`]**: a key position (unspecified, wildcard or concrete id)
//! - **[`Entry`]** and **[`EntryKey`]**: the rule record and its dedup identity
//! - **[`EntryFragment`]** and [`merge`]: partial entries used by pivot trees
//! - **[`Pivot`]** and **[`PivotOrder`]**: key positions and tree level orders
//! - **[`AreaState`]**: inclusion/exclusion usage summary of an area
//!
//! ## Usage
//!
//! ```rust
//! use layer_query::{Entry, EntryFragment, merge};
//!
//! // Include area "a1" for every layer, all filters
//! let global = Entry::new("*", "a1", "*");
//! assert!(global.has_wildcard());
//!
//! // Carve layer "l1" out of it
//! let carve_out = Entry::new("l1", "a1", "*").negated();
//! assert!(carve_out.is_negated());
//!
//! // Tree nodes contribute fragments that merge over their ancestors
//! let layer = EntryFragment::new().layer("l1");
//! let area = EntryFragment::new().area("a1").include_area(false);
//! let effective = merge(&layer, &area).to_entry();
//! assert_eq!(effective, Entry::new("l1", "a1", "").with_include_area(false));
//! ```
//!
//! ## Key positions
//!
//! | String | Selector | Meaning |
//! |--------|----------|---------|
//! | `""` | `Unspecified` | No value; never matches anything specific |
//! | `"*"` | `Wildcard` | Every registered layer / known area / known filter |
//! | other | `Id` | One concrete layer, area or filter |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod area;
mod entry;
mod error;
mod fragment;
mod pivot;
mod selector;

pub use area::AreaState;
pub use entry::{Entry, EntryKey};
pub use error::{QueryError, QueryResult};
pub use fragment::{merge, EntryFragment};
pub use pivot::{Pivot, PivotOrder};
pub use selector::{Selector, WILDCARD};
