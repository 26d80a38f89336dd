//! The query entry record and its dedup key.

use std::fmt;

use crate::fragment::EntryFragment;
use crate::pivot::Pivot;
use crate::selector::Selector;

#[cfg(feature = "serde")]
fn default_true() -> bool {
    true
}

/// One rule: a layer, area and filter combination plus its flags.
///
/// # Example
///
/// ```rust
/// use layer_query::{Entry, Selector};
///
/// // Exclude area "a1" from every layer
/// let entry = Entry::new("*", "a1", "*").with_include_area(false);
/// assert!(entry.has_wildcard());
/// assert_eq!(entry.layer_id, Selector::Wildcard);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Entry {
    /// Layer the rule applies to.
    #[cfg_attr(feature = "serde", serde(default))]
    pub layer_id: Selector,
    /// Area used by the rule.
    #[cfg_attr(feature = "serde", serde(default))]
    pub area_id: Selector,
    /// Filter used by the rule.
    #[cfg_attr(feature = "serde", serde(default))]
    pub filter_id: Selector,
    /// Inclusion area when true, exclusion area when false.
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub include_area: bool,
    /// AND semantics among sibling filters when true, OR when false.
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub filter_group: bool,
    /// Provisional entry that has not been committed yet.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub temp: Option<bool>,
    /// Explicit carve-out of a wildcard area grant for one layer.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub negate: Option<bool>,
    /// Set while flattening an unchecked tree node. Never persisted.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub disabled: Option<bool>,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            layer_id: Selector::Unspecified,
            area_id: Selector::Unspecified,
            filter_id: Selector::Unspecified,
            include_area: true,
            filter_group: true,
            temp: None,
            negate: None,
            disabled: None,
        }
    }
}

impl Entry {
    /// Creates an inclusion entry with AND filter grouping.
    pub fn new(
        layer_id: impl Into<Selector>,
        area_id: impl Into<Selector>,
        filter_id: impl Into<Selector>,
    ) -> Self {
        Self {
            layer_id: layer_id.into(),
            area_id: area_id.into(),
            filter_id: filter_id.into(),
            ..Self::default()
        }
    }

    /// Sets the inclusion flag.
    pub fn with_include_area(mut self, include_area: bool) -> Self {
        self.include_area = include_area;
        self
    }

    /// Sets the filter grouping flag.
    pub fn with_filter_group(mut self, filter_group: bool) -> Self {
        self.filter_group = filter_group;
        self
    }

    /// Marks the entry provisional.
    pub fn temporary(mut self) -> Self {
        self.temp = Some(true);
        self
    }

    /// Marks the entry as a negation.
    pub fn negated(mut self) -> Self {
        self.negate = Some(true);
        self
    }

    /// Returns true if the entry is provisional.
    pub fn is_temp(&self) -> bool {
        self.temp.unwrap_or(false)
    }

    /// Returns true if the entry is a negation.
    pub fn is_negated(&self) -> bool {
        self.negate.unwrap_or(false)
    }

    /// Returns true if the entry was produced by an unchecked tree node.
    pub fn is_disabled(&self) -> bool {
        self.disabled.unwrap_or(false)
    }

    /// Returns the selector at a pivot.
    pub fn selector(&self, pivot: Pivot) -> &Selector {
        match pivot {
            Pivot::Layer => &self.layer_id,
            Pivot::Area => &self.area_id,
            Pivot::Filter => &self.filter_id,
        }
    }

    /// Returns a mutable selector at a pivot.
    pub fn selector_mut(&mut self, pivot: Pivot) -> &mut Selector {
        match pivot {
            Pivot::Layer => &mut self.layer_id,
            Pivot::Area => &mut self.area_id,
            Pivot::Filter => &mut self.filter_id,
        }
    }

    /// Returns true if any key position is `*`.
    pub fn has_wildcard(&self) -> bool {
        Pivot::RESOLUTION_ORDER
            .iter()
            .any(|p| self.selector(*p).is_wildcard())
    }

    /// Returns true if layer, area and filter are all concrete ids.
    pub fn is_explicit(&self) -> bool {
        Pivot::RESOLUTION_ORDER
            .iter()
            .all(|p| self.selector(*p).is_concrete())
    }

    /// Returns true if layer, area and filter equal the given triple.
    pub fn matches_triple(&self, layer_id: &Selector, area_id: &Selector, filter_id: &Selector) -> bool {
        self.layer_id == *layer_id && self.area_id == *area_id && self.filter_id == *filter_id
    }

    /// Returns the dedup key.
    pub fn key(&self) -> EntryKey {
        EntryKey {
            layer_id: self.layer_id.clone(),
            area_id: self.area_id.clone(),
            filter_id: self.filter_id.clone(),
            include_area: self.include_area,
            filter_group: self.filter_group,
            negate: self.negate,
        }
    }

    /// Returns a copy with every field the fragment sets overwritten.
    pub fn merged(&self, fragment: &EntryFragment) -> Entry {
        let mut entry = self.clone();
        fragment.apply_to(&mut entry);
        entry
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Identity of an entry for deduplication.
///
/// Two entries with equal keys are the same rule; later ones overwrite
/// earlier ones during expansion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
    /// Layer selector.
    pub layer_id: Selector,
    /// Area selector.
    pub area_id: Selector,
    /// Filter selector.
    pub filter_id: Selector,
    /// Inclusion flag.
    pub include_area: bool,
    /// Filter grouping flag.
    pub filter_group: bool,
    /// Negation flag, including whether it was set at all.
    pub negate: Option<bool>,
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}#{}#{}#{}",
            self.layer_id, self.area_id, self.filter_id, self.include_area, self.filter_group
        )?;
        if let Some(negate) = self.negate {
            write!(f, "#{}", negate)?;
        }
        Ok(())
    }
}
