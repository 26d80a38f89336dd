//! The ordered entry list and partial-key lookups over it.

use layer_query::{Entry, Selector};

/// Partial key used to select entries.
///
/// Unset positions match every entry. A set position matches entries whose
/// selector is equal, so filtering on `*` finds wildcard entries only.
///
/// # Example
///
/// ```rust
/// use layer_query_engine::EntryFilter;
///
/// let filter = EntryFilter::new().layer("ships").area("harbor");
/// assert!(filter.area_id.is_some());
/// assert!(filter.filter_id.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Layer to match.
    pub layer_id: Option<Selector>,
    /// Area to match.
    pub area_id: Option<Selector>,
    /// Filter to match.
    pub filter_id: Option<Selector>,
}

impl EntryFilter {
    /// Creates a filter matching every entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to a layer.
    pub fn layer(mut self, layer_id: impl Into<Selector>) -> Self {
        self.layer_id = Some(layer_id.into());
        self
    }

    /// Restricts to an area.
    pub fn area(mut self, area_id: impl Into<Selector>) -> Self {
        self.area_id = Some(area_id.into());
        self
    }

    /// Restricts to a filter.
    pub fn filter(mut self, filter_id: impl Into<Selector>) -> Self {
        self.filter_id = Some(filter_id.into());
        self
    }

    /// Returns true when no position is restricted.
    pub fn is_unrestricted(&self) -> bool {
        self.layer_id.is_none() && self.area_id.is_none() && self.filter_id.is_none()
    }

    /// Returns true if the entry matches every restricted position.
    pub fn matches(&self, entry: &Entry) -> bool {
        fn position(wanted: &Option<Selector>, actual: &Selector) -> bool {
            wanted.as_ref().map_or(true, |w| w == actual)
        }

        position(&self.layer_id, &entry.layer_id)
            && position(&self.area_id, &entry.area_id)
            && position(&self.filter_id, &entry.filter_id)
    }
}

/// Ordered list of raw entries.
#[derive(Debug, Clone, Default)]
pub struct EntryStore {
    entries: Vec<Entry>,
}

impl EntryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given entries.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Returns every entry in insertion order.
    pub fn as_slice(&self) -> &[Entry] {
        &self.entries
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies matching entries, skipping negations unless asked for.
    pub fn select(&self, filter: &EntryFilter, include_negations: bool) -> Vec<Entry> {
        select(&self.entries, filter, include_negations)
    }

    /// Returns true if an entry exists for the exact triple with the same
    /// flags and negation.
    pub fn contains_exact(&self, entry: &Entry) -> bool {
        self.entries.iter().any(|e| {
            e.matches_triple(&entry.layer_id, &entry.area_id, &entry.filter_id)
                && e.include_area == entry.include_area
                && e.filter_group == entry.filter_group
                && e.is_negated() == entry.is_negated()
        })
    }

    /// Appends an entry.
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Removes and returns entries for the exact triple.
    pub fn remove_triple(
        &mut self,
        layer_id: &Selector,
        area_id: &Selector,
        filter_id: &Selector,
    ) -> Vec<Entry> {
        self.remove_where(|e| e.matches_triple(layer_id, area_id, filter_id))
    }

    /// Removes and returns entries matching the filter.
    pub fn remove_matching(&mut self, filter: &EntryFilter) -> Vec<Entry> {
        self.remove_where(|e| filter.matches(e))
    }

    /// Removes and returns entries for which the predicate holds.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&Entry) -> bool) -> Vec<Entry> {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if predicate(&entry) {
                removed.push(entry);
            } else {
                kept.push(entry);
            }
        }
        self.entries = kept;
        removed
    }

    /// Removes and returns every entry.
    pub fn clear(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.entries)
    }

    /// Replaces the contents and returns the previous entries.
    pub fn replace(&mut self, entries: Vec<Entry>) -> Vec<Entry> {
        std::mem::replace(&mut self.entries, entries)
    }

    /// Mutable access for in-place flag updates.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entry> {
        self.entries.iter_mut()
    }
}

/// Copies entries matching the filter from any entry list.
pub fn select(entries: &[Entry], filter: &EntryFilter, include_negations: bool) -> Vec<Entry> {
    entries
        .iter()
        .filter(|e| include_negations || !e.is_negated())
        .filter(|e| filter.matches(e))
        .cloned()
        .collect()
}
