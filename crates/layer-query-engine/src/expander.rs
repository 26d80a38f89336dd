//! Wildcard expansion.
//!
//! Query handlers build one query per concrete layer and cannot interpret
//! `*`. [`WildcardExpander`] rewrites an entry list containing wildcards into
//! the most specific equivalent list it can.
//!
//! # Resolution rules
//!
//! Wildcards resolve one pivot at a time, always layer, then area, then
//! filter. Area and filter candidates are looked up per layer, so the layer
//! must be concrete first.
//!
//! | Pivot | Candidates |
//! |-------|------------|
//! | layer | every registered layer, minus layers negated for the entry's area |
//! | area | areas given for this layer with any filter, then global areas not already listed and not negated for this layer |
//! | filter | filters given for this layer, including filters given for every layer |
//!
//! Specificity: an explicit negation beats a layer-specific area, which beats
//! a global area. A layer-specific area adds to the global list; it only
//! replaces a global area with the same id.
//!
//! An entry with both a wildcard layer and a wildcard filter is expanded on a
//! best-effort basis. Entries that cannot be fully resolved are returned in
//! their partially resolved form after the resolved ones.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use layer_query::{Entry, EntryFragment, EntryKey, Pivot, Selector};
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
struct AreaCandidate {
    area_id: Selector,
    include_area: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FilterCandidate {
    filter_id: Selector,
    filter_group: bool,
}

/// Lookup tables built from the wildcard entries.
#[derive(Debug, Default)]
struct Indices {
    /// `(layer, filter)` to the areas seen with that pair.
    areas: HashMap<(Selector, Selector), Vec<AreaCandidate>>,
    /// Area id to the layers that must not inherit a global grant of it.
    negations: HashMap<Selector, HashSet<Selector>>,
    /// Layer to the filters seen for it.
    filter_set: HashMap<Selector, Vec<FilterCandidate>>,
}

impl Indices {
    /// Indexes the wildcard entries in reverse order and returns the entries
    /// that still need resolving. Negations are consumed here.
    fn build(wildcards: Vec<Entry>) -> (Self, Vec<Entry>) {
        let mut indices = Indices::default();
        let mut remaining = Vec::with_capacity(wildcards.len());

        for entry in wildcards.into_iter().rev() {
            let negated = entry.is_negated();

            if entry.area_id.is_concrete() {
                if !negated {
                    indices
                        .areas
                        .entry((entry.layer_id.clone(), entry.filter_id.clone()))
                        .or_default()
                        .push(AreaCandidate {
                            area_id: entry.area_id.clone(),
                            include_area: entry.include_area,
                        });
                }

                // A layer with its own rule for an area, on all of its
                // filters, does not inherit the global rule for that area.
                let layer_specific =
                    entry.layer_id.is_concrete() && entry.filter_id.is_wildcard();
                if negated || layer_specific {
                    trace!(area = %entry.area_id, layer = %entry.layer_id, negated, "area carved out of global grant");
                    indices
                        .negations
                        .entry(entry.area_id.clone())
                        .or_default()
                        .insert(entry.layer_id.clone());
                }
            }

            if !negated && entry.filter_id.is_concrete() {
                indices
                    .filter_set
                    .entry(entry.layer_id.clone())
                    .or_default()
                    .push(FilterCandidate {
                        filter_id: entry.filter_id.clone(),
                        filter_group: entry.filter_group,
                    });
            }

            if !negated {
                remaining.push(entry);
            }
        }

        remaining.reverse();
        (indices, remaining)
    }

    /// Copies filters given for every layer into each concrete layer's list.
    fn collapse_layer_wildcard_filters(&mut self, layer_ids: &[String]) {
        let Some(shared) = self.filter_set.remove(&Selector::Wildcard) else {
            return;
        };

        let mut targets: Vec<Selector> = layer_ids.iter().map(Selector::from).collect();
        for layer in self.filter_set.keys() {
            if layer.is_concrete() && !targets.contains(layer) {
                targets.push(layer.clone());
            }
        }

        for layer in targets {
            self.filter_set
                .entry(layer)
                .or_default()
                .extend(shared.iter().cloned());
        }
    }

    fn is_negated(&self, area_id: &Selector, layer_id: &Selector) -> bool {
        self.negations
            .get(area_id)
            .is_some_and(|layers| layers.contains(layer_id))
    }

    fn layer_candidates(&self, entry: &Entry, layer_ids: &[String]) -> Vec<EntryFragment> {
        layer_ids
            .iter()
            .map(Selector::from)
            .filter(|layer| !(entry.area_id.is_concrete() && self.is_negated(&entry.area_id, layer)))
            .map(|layer| EntryFragment::new().layer(layer))
            .collect()
    }

    fn area_candidates(&self, entry: &Entry) -> Vec<EntryFragment> {
        let layer = &entry.layer_id;
        let specific: &[AreaCandidate] = self
            .areas
            .get(&(layer.clone(), Selector::Wildcard))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let global: &[AreaCandidate] = self
            .areas
            .get(&(Selector::Wildcard, Selector::Wildcard))
            .map(Vec::as_slice)
            .unwrap_or_default();

        let global = global.iter().filter(|g| {
            !specific.iter().any(|s| s.area_id == g.area_id) && !self.is_negated(&g.area_id, layer)
        });

        specific
            .iter()
            .chain(global)
            .map(|c| {
                EntryFragment::new()
                    .area(c.area_id.clone())
                    .include_area(c.include_area)
            })
            .collect()
    }

    fn filter_candidates(&self, entry: &Entry) -> Vec<EntryFragment> {
        self.filter_set
            .get(&entry.layer_id)
            .map(|filters| {
                filters
                    .iter()
                    .map(|c| {
                        EntryFragment::new()
                            .filter(c.filter_id.clone())
                            .filter_group(c.filter_group)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Expands wildcard entries against a layer universe.
///
/// # Example
///
/// ```rust
/// use layer_query::Entry;
/// use layer_query_engine::WildcardExpander;
///
/// let expander = WildcardExpander::new(vec!["ships".into(), "planes".into()]);
/// let entries = vec![
///     Entry::new("*", "harbor", "*"),
///     Entry::new("ships", "harbor", "*").negated(),
/// ];
///
/// let expanded = expander.expand(&entries);
/// assert_eq!(expanded.as_ref(), &[Entry::new("planes", "harbor", "*")]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WildcardExpander {
    layer_ids: Vec<String>,
}

impl WildcardExpander {
    /// Creates an expander for the given registered layer ids.
    ///
    /// Duplicate ids are dropped, keeping the first occurrence.
    pub fn new(layer_ids: Vec<String>) -> Self {
        let mut seen = HashSet::new();
        let layer_ids = layer_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .collect();
        Self { layer_ids }
    }

    /// Returns the layer universe.
    pub fn layer_ids(&self) -> &[String] {
        &self.layer_ids
    }

    /// Expands `entries`.
    ///
    /// When no entry has a wildcard the input slice itself is returned, so
    /// callers can detect "nothing to expand" without comparing contents.
    pub fn expand<'e>(&self, entries: &'e [Entry]) -> Cow<'e, [Entry]> {
        let mut resolved: IndexMap<EntryKey, Entry> = IndexMap::with_capacity(entries.len());
        let mut wildcards = Vec::new();

        for entry in entries {
            if entry.has_wildcard() {
                wildcards.push(entry.clone());
            } else {
                resolved.insert(entry.key(), entry.clone());
            }
        }

        if wildcards.is_empty() {
            return Cow::Borrowed(entries);
        }

        let wildcard_count = wildcards.len();
        let (mut indices, mut pending) = Indices::build(wildcards);
        indices.collapse_layer_wildcard_filters(&self.layer_ids);

        for pivot in Pivot::RESOLUTION_ORDER {
            let mut deferred = Vec::new();

            for entry in pending {
                if !entry.selector(pivot).is_wildcard() {
                    deferred.push(entry);
                    continue;
                }

                let candidates = match pivot {
                    Pivot::Layer => indices.layer_candidates(&entry, &self.layer_ids),
                    Pivot::Area => indices.area_candidates(&entry),
                    Pivot::Filter => indices.filter_candidates(&entry),
                };

                if candidates.is_empty() {
                    if Self::keep_unexpanded(pivot, &entry, &indices) {
                        trace!(%pivot, entry = %entry, "no candidates, keeping partial wildcard");
                        deferred.push(entry);
                    } else {
                        trace!(%pivot, entry = %entry, "no candidates, dropping wildcard");
                    }
                    continue;
                }

                for fragment in &candidates {
                    let expanded = entry.merged(fragment);
                    if expanded.has_wildcard() {
                        deferred.push(expanded);
                    } else {
                        resolved.insert(expanded.key(), expanded);
                    }
                }
            }

            pending = deferred;
        }

        debug!(
            input = entries.len(),
            wildcards = wildcard_count,
            resolved = resolved.len(),
            unresolved = pending.len(),
            "expanded query entries"
        );

        let mut out: Vec<Entry> = resolved.into_values().collect();
        out.extend(pending);
        Cow::Owned(out)
    }

    /// Whether a wildcard with no expansion candidates survives as-is.
    ///
    /// Area wildcards survive only when they are exclusions or their layer
    /// has no filters, and only once the layer is concrete. Layer and filter
    /// wildcards always survive.
    fn keep_unexpanded(pivot: Pivot, entry: &Entry, indices: &Indices) -> bool {
        match pivot {
            Pivot::Area => {
                (!entry.include_area || !indices.filter_set.contains_key(&entry.layer_id))
                    && !entry.layer_id.is_wildcard()
            }
            Pivot::Layer | Pivot::Filter => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expander(layers: &[&str]) -> WildcardExpander {
        WildcardExpander::new(layers.iter().map(|l| l.to_string()).collect())
    }

    fn keys(entries: &[Entry]) -> Vec<String> {
        let mut keys: Vec<String> = entries.iter().map(|e| e.key().to_string()).collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_no_wildcards_borrows_input() {
        let entries = vec![
            Entry::new("l1", "a1", "f1"),
            Entry::new("l1", "a1", "f1"),
        ];
        let expanded = expander(&["l1"]).expand(&entries);
        assert!(matches!(expanded, Cow::Borrowed(_)));
        assert_eq!(expanded.len(), 2);
    }

    #[test]
    fn test_duplicate_concrete_entries_collapse_when_expanding() {
        let entries = vec![
            Entry::new("l1", "a1", "f1"),
            Entry::new("l1", "a1", "f1").temporary(),
            Entry::new("*", "", "f2"),
        ];
        let expanded = expander(&["l1"]).expand(&entries);
        assert_eq!(keys(&expanded), vec!["l1##f2#true#true", "l1#a1#f1#true#true"]);
        // Last write wins for the shared key
        assert!(expanded[0].is_temp());
    }

    #[test]
    fn test_layer_wildcard_fans_out() {
        let entries = vec![Entry::new("*", "a1", "f1")];
        let expanded = expander(&["l1", "l2"]).expand(&entries);
        assert_eq!(
            expanded.as_ref(),
            &[Entry::new("l1", "a1", "f1"), Entry::new("l2", "a1", "f1")]
        );
    }

    #[test]
    fn test_duplicate_layer_ids_are_ignored() {
        let expander = expander(&["l1", "l1", "l2"]);
        assert_eq!(expander.layer_ids(), &["l1".to_string(), "l2".to_string()]);
    }

    #[test]
    fn test_global_area_without_filters_is_kept_per_layer() {
        let entries = vec![Entry::new("*", "a1", "*")];
        let expanded = expander(&["l1", "l2"]).expand(&entries);
        assert_eq!(
            expanded.as_ref(),
            &[Entry::new("l1", "a1", "*"), Entry::new("l2", "a1", "*")]
        );
    }

    #[test]
    fn test_area_wildcard_uses_layer_specific_and_global_areas() {
        let entries = vec![
            Entry::new("*", "a1", "*"),
            Entry::new("l1", "a2", "*").with_include_area(false),
            Entry::new("l1", "*", "f1"),
        ];
        let expanded = expander(&["l1"]).expand(&entries);
        assert_eq!(
            keys(&expanded),
            vec![
                "l1#a1#f1#true#true",
                "l1#a2#f1#false#true",
            ]
        );
    }

    #[test]
    fn test_layer_specific_area_overrides_global_same_area() {
        let entries = vec![
            Entry::new("*", "a1", "*"),
            Entry::new("l1", "a1", "*").with_include_area(false),
            Entry::new("l1", "*", "f1"),
        ];
        let expanded = expander(&["l1", "l2"]).expand(&entries);
        assert_eq!(
            keys(&expanded),
            vec![
                "l1#a1#f1#false#true",
                // l2 has no filters, so the global area stays filter-wildcarded
                "l2#a1#*#true#true",
            ]
        );
    }

    #[test]
    fn test_area_wildcard_without_areas_is_dropped_for_filtered_inclusion() {
        let entries = vec![Entry::new("l1", "*", "f1")];
        let expanded = expander(&["l1"]).expand(&entries);
        assert!(expanded.is_empty());
    }

    #[test]
    fn test_area_wildcard_without_areas_is_kept_for_exclusion() {
        let entries = vec![Entry::new("l1", "*", "f1").with_include_area(false)];
        let expanded = expander(&["l1"]).expand(&entries);
        assert_eq!(expanded.as_ref(), entries.as_slice());
    }

    #[test]
    fn test_no_registered_layers_keeps_layer_wildcard() {
        let entries = vec![Entry::new("*", "a1", "*")];
        let expanded = expander(&[]).expand(&entries);
        assert_eq!(expanded.as_ref(), entries.as_slice());
    }

    #[test]
    fn test_filter_group_carried_from_candidate() {
        let entries = vec![
            Entry::new("l1", "*", "f1").with_filter_group(false),
            Entry::new("l1", "a1", "*"),
        ];
        let expanded = expander(&["l1"]).expand(&entries);
        assert_eq!(keys(&expanded), vec!["l1#a1#f1#true#false"]);
    }

    #[test]
    fn test_double_wildcard_does_not_panic() {
        let entries = vec![Entry::new("*", "*", "*"), Entry::new("*", "*", "f1")];
        let expanded = expander(&["l1", "l2"]).expand(&entries);
        assert!(expanded.iter().all(|e| e.layer_id.is_concrete()));
    }

    #[test]
    fn test_negation_is_not_emitted() {
        let entries = vec![
            Entry::new("*", "a1", "*"),
            Entry::new("l1", "a1", "*").negated(),
        ];
        let expanded = expander(&["l1", "l2"]).expand(&entries);
        assert!(expanded.iter().all(|e| !e.is_negated()));
        assert_eq!(expanded.as_ref(), &[Entry::new("l2", "a1", "*")]);
    }
}
