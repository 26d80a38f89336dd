//! Change notification payloads.

use std::collections::BTreeSet;
use std::fmt;

use layer_query::{Selector, WILDCARD};

/// Layers whose queries must be rebuilt.
///
/// A mutation touching a wildcard layer marks [`DirtyLayers::All`], which
/// absorbs every later id until the set is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirtyLayers {
    /// Every layer must re-check its queries.
    All,
    /// Only the named layers changed.
    Layers(BTreeSet<String>),
}

impl Default for DirtyLayers {
    fn default() -> Self {
        DirtyLayers::Layers(BTreeSet::new())
    }
}

impl DirtyLayers {
    /// Marks one layer selector dirty. Unspecified selectors are ignored.
    pub fn mark(&mut self, layer_id: &Selector) {
        match layer_id {
            Selector::Wildcard => *self = DirtyLayers::All,
            Selector::Id(id) => self.mark_id(id),
            Selector::Unspecified => {}
        }
    }

    /// Marks one concrete layer id dirty.
    pub fn mark_id(&mut self, layer_id: &str) {
        if let DirtyLayers::Layers(ids) = self {
            ids.insert(layer_id.to_string());
        }
    }

    /// Marks every layer dirty.
    pub fn mark_all(&mut self) {
        *self = DirtyLayers::All;
    }

    /// Returns true if nothing is dirty.
    pub fn is_empty(&self) -> bool {
        matches!(self, DirtyLayers::Layers(ids) if ids.is_empty())
    }

    /// Returns true if the layer must be refreshed.
    pub fn contains(&self, layer_id: &str) -> bool {
        match self {
            DirtyLayers::All => true,
            DirtyLayers::Layers(ids) => ids.contains(layer_id),
        }
    }

    /// Returns the current set and leaves an empty one behind.
    pub fn take(&mut self) -> DirtyLayers {
        std::mem::take(self)
    }
}

impl fmt::Display for DirtyLayers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirtyLayers::All => f.write_str(WILDCARD),
            DirtyLayers::Layers(ids) => {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                f.write_str(&ids.join(","))
            }
        }
    }
}

/// The "queries changed" event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueriesChanged {
    /// Layers whose queries changed since the previous event.
    pub layers: DirtyLayers,
}

/// Handle returned by [`QueryManager::subscribe`](crate::QueryManager::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
