//! Partial entries contributed by tree nodes and expansion candidates.
//!
//! Tree reconciliation builds the effective entry at a node by merging each
//! node's fragment over its ancestors'. Both directions of reconciliation go
//! through [`merge`], so a fragment round-tripped through the tree keeps its
//! meaning.

use crate::entry::Entry;
use crate::pivot::Pivot;
use crate::selector::Selector;

/// A partial [`Entry`]: every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct EntryFragment {
    /// Layer selector.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub layer_id: Option<Selector>,
    /// Area selector.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub area_id: Option<Selector>,
    /// Filter selector.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub filter_id: Option<Selector>,
    /// Inclusion flag.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub include_area: Option<bool>,
    /// Filter grouping flag.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub filter_group: Option<bool>,
    /// Provisional flag.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub temp: Option<bool>,
    /// Negation flag.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub negate: Option<bool>,
    /// Disabled flag.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub disabled: Option<bool>,
}

impl EntryFragment {
    /// Creates an empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the layer selector.
    pub fn layer(mut self, layer_id: impl Into<Selector>) -> Self {
        self.layer_id = Some(layer_id.into());
        self
    }

    /// Sets the area selector.
    pub fn area(mut self, area_id: impl Into<Selector>) -> Self {
        self.area_id = Some(area_id.into());
        self
    }

    /// Sets the filter selector.
    pub fn filter(mut self, filter_id: impl Into<Selector>) -> Self {
        self.filter_id = Some(filter_id.into());
        self
    }

    /// Sets the inclusion flag.
    pub fn include_area(mut self, include_area: bool) -> Self {
        self.include_area = Some(include_area);
        self
    }

    /// Sets the filter grouping flag.
    pub fn filter_group(mut self, filter_group: bool) -> Self {
        self.filter_group = Some(filter_group);
        self
    }

    /// Returns the selector set for a pivot, if any.
    pub fn selector(&self, pivot: Pivot) -> Option<&Selector> {
        match pivot {
            Pivot::Layer => self.layer_id.as_ref(),
            Pivot::Area => self.area_id.as_ref(),
            Pivot::Filter => self.filter_id.as_ref(),
        }
    }

    /// Sets the selector for a pivot.
    pub fn set_selector(&mut self, pivot: Pivot, selector: Selector) {
        let slot = match pivot {
            Pivot::Layer => &mut self.layer_id,
            Pivot::Area => &mut self.area_id,
            Pivot::Filter => &mut self.filter_id,
        };
        *slot = Some(selector);
    }

    /// Returns true once all three key positions have been set.
    pub fn is_complete(&self) -> bool {
        self.layer_id.is_some() && self.area_id.is_some() && self.filter_id.is_some()
    }

    /// Returns true if the fragment sets the given concrete value at a pivot.
    pub fn fixes(&self, pivot: Pivot, id: &str) -> bool {
        self.selector(pivot).and_then(Selector::as_id) == Some(id)
    }

    /// Writes every field this fragment sets into `entry`.
    pub fn apply_to(&self, entry: &mut Entry) {
        if let Some(ref layer_id) = self.layer_id {
            entry.layer_id = layer_id.clone();
        }
        if let Some(ref area_id) = self.area_id {
            entry.area_id = area_id.clone();
        }
        if let Some(ref filter_id) = self.filter_id {
            entry.filter_id = filter_id.clone();
        }
        if let Some(include_area) = self.include_area {
            entry.include_area = include_area;
        }
        if let Some(filter_group) = self.filter_group {
            entry.filter_group = filter_group;
        }
        if self.temp.is_some() {
            entry.temp = self.temp;
        }
        if self.negate.is_some() {
            entry.negate = self.negate;
        }
        if self.disabled.is_some() {
            entry.disabled = self.disabled;
        }
    }

    /// Converts to a full entry, filling unset fields with entry defaults.
    pub fn to_entry(&self) -> Entry {
        Entry::default().merged(self)
    }
}

impl From<&Entry> for EntryFragment {
    fn from(entry: &Entry) -> Self {
        Self {
            layer_id: Some(entry.layer_id.clone()),
            area_id: Some(entry.area_id.clone()),
            filter_id: Some(entry.filter_id.clone()),
            include_area: Some(entry.include_area),
            filter_group: Some(entry.filter_group),
            temp: entry.temp,
            negate: entry.negate,
            disabled: entry.disabled,
        }
    }
}

/// Merges a child fragment over a parent fragment.
///
/// Every field the child sets replaces the parent's value; fields the child
/// leaves unset keep the parent's value.
///
/// # Example
///
/// ```rust
/// use layer_query::{merge, EntryFragment, Selector};
///
/// let parent = EntryFragment::new().layer("l1").area("a1").include_area(false);
/// let child = EntryFragment::new().area("a2").filter("f1");
/// let merged = merge(&parent, &child);
///
/// assert_eq!(merged.layer_id, Some(Selector::from("l1")));
/// assert_eq!(merged.area_id, Some(Selector::from("a2")));
/// assert_eq!(merged.include_area, Some(false));
/// ```
pub fn merge(parent: &EntryFragment, child: &EntryFragment) -> EntryFragment {
    fn pick<T: Clone>(parent: &Option<T>, child: &Option<T>) -> Option<T> {
        child.clone().or_else(|| parent.clone())
    }

    EntryFragment {
        layer_id: pick(&parent.layer_id, &child.layer_id),
        area_id: pick(&parent.area_id, &child.area_id),
        filter_id: pick(&parent.filter_id, &child.filter_id),
        include_area: pick(&parent.include_area, &child.include_area),
        filter_group: pick(&parent.filter_group, &child.filter_group),
        temp: pick(&parent.temp, &child.temp),
        negate: pick(&parent.negate, &child.negate),
        disabled: pick(&parent.disabled, &child.disabled),
    }
}
