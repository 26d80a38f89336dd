//! Two-way sync between a pivot tree and an entry list.
//!
//! - [`apply_entries`] derives node states (and include/group flags) from
//!   live entries.
//! - [`parse_entries`] flattens a checked tree back into entries.
//!
//! Both walk the tree depth-first and build the effective entry at each node
//! with [`merge`], so a tree built from entries parses back into the same
//! entries.

use layer_query::{merge, Entry, EntryFragment, Pivot, Selector};
use tracing::trace;

use crate::node::{PivotNode, TriState};

/// How accumulated node keys are compared with live entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Live entries are expanded; positions must be equal.
    Advanced,
    /// Live entries are raw; a wildcard in a live entry matches any node
    /// value, and a negation for the node's layer and area unchecks it.
    Simple,
}

/// Sets every node's state from the live entries.
///
/// A leaf is on when its effective entry is complete and some non-negated,
/// non-disabled live entry matches it. Branches aggregate their children.
/// Nodes whose fragment carries an include or group flag take the majority
/// value of the matching entries when more than half disagree.
pub fn apply_entries(root: &mut PivotNode, live: &[Entry], mode: MatchMode) {
    let state = apply_node(root, &EntryFragment::new(), live, mode);
    trace!(state = %state, live = live.len(), ?mode, "applied entries to pivot tree");
}

fn apply_node(
    node: &mut PivotNode,
    parent: &EntryFragment,
    live: &[Entry],
    mode: MatchMode,
) -> TriState {
    let acc = match node.entry.as_mut() {
        Some(fragment) => {
            let before = merge(parent, fragment);
            smooth_flags(fragment, &before, live, mode);
            merge(parent, fragment)
        }
        None => parent.clone(),
    };

    if node.is_leaf() {
        let on = !node.is_placeholder() && acc.is_complete() && is_matched(&acc, live, mode);
        node.state = TriState::from_bool(on);
        return node.state;
    }

    let mut states = Vec::with_capacity(node.children.len());
    for child in &mut node.children {
        let state = apply_node(child, &acc, live, mode);
        if !child.is_placeholder() {
            states.push(state);
        }
    }
    node.state = TriState::aggregate(states).unwrap_or(TriState::Off);
    node.state
}

/// Flips the node's own include/group flags to the majority of the
/// matching entries. Ties keep the current value.
fn smooth_flags(
    fragment: &mut EntryFragment,
    acc: &EntryFragment,
    live: &[Entry],
    mode: MatchMode,
) {
    if fragment.include_area.is_none() && fragment.filter_group.is_none() {
        return;
    }

    let matching: Vec<&Entry> = candidates(live)
        .filter(|entry| matches_key(acc, entry, mode))
        .collect();
    if matching.is_empty() {
        return;
    }

    let outvoted = |disagree: usize| disagree * 2 > matching.len();
    if let Some(include) = fragment.include_area {
        if outvoted(matching.iter().filter(|e| e.include_area != include).count()) {
            fragment.include_area = Some(!include);
        }
    }
    if let Some(group) = fragment.filter_group {
        if outvoted(matching.iter().filter(|e| e.filter_group != group).count()) {
            fragment.filter_group = Some(!group);
        }
    }
}

fn candidates(live: &[Entry]) -> impl Iterator<Item = &Entry> {
    live.iter().filter(|e| !e.is_negated() && !e.is_disabled())
}

fn is_matched(acc: &EntryFragment, live: &[Entry], mode: MatchMode) -> bool {
    if mode == MatchMode::Simple && is_vetoed(acc, live) {
        return false;
    }
    candidates(live).any(|entry| matches_key(acc, entry, mode))
}

/// A negated live entry for the node's layer and area.
fn is_vetoed(acc: &EntryFragment, live: &[Entry]) -> bool {
    let (Some(layer), Some(area)) = (concrete(acc, Pivot::Layer), concrete(acc, Pivot::Area)) else {
        return false;
    };
    live.iter()
        .any(|e| e.is_negated() && e.layer_id == *layer && e.area_id == *area)
}

fn concrete(fragment: &EntryFragment, pivot: Pivot) -> Option<&str> {
    fragment.selector(pivot).and_then(Selector::as_id)
}

/// Compares the positions an accumulated key has fixed so far.
fn matches_key(acc: &EntryFragment, entry: &Entry, mode: MatchMode) -> bool {
    Pivot::RESOLUTION_ORDER.iter().all(|&pivot| {
        let live = entry.selector(pivot);
        match acc.selector(pivot) {
            None | Some(Selector::Unspecified) => true,
            Some(fixed) => fixed == live || (mode == MatchMode::Simple && live.is_wildcard()),
        }
    })
}

/// Flattens a tree into entries, one per complete leaf.
///
/// Unchecked nodes produce disabled entries. When the unchecked node's area
/// is granted to every layer by a `{*, area, *}` entry in `raw`, the entry
/// becomes a negation instead, so the carve-out survives expansion.
pub fn parse_entries(root: &PivotNode, raw: &[Entry]) -> Vec<Entry> {
    let global_areas: Vec<&str> = raw
        .iter()
        .filter(|e| !e.is_negated() && e.layer_id.is_wildcard() && e.filter_id.is_wildcard())
        .filter_map(|e| e.area_id.as_id())
        .collect();
    parse_node(root, &EntryFragment::new(), &global_areas)
}

fn parse_node(node: &PivotNode, parent: &EntryFragment, global_areas: &[&str]) -> Vec<Entry> {
    let mut acc = match &node.entry {
        Some(fragment) => merge(parent, fragment),
        None => parent.clone(),
    };

    if node.state == TriState::Off {
        let globally_granted =
            concrete(&acc, Pivot::Area).is_some_and(|area| global_areas.contains(&area));
        if globally_granted {
            acc.negate = Some(true);
            acc.disabled = None;
        } else {
            acc.disabled = Some(true);
        }
    }

    if node.is_leaf() {
        return if node.entry.is_some() && acc.is_complete() {
            vec![acc.to_entry()]
        } else {
            Vec::new()
        };
    }

    node.children
        .iter()
        .flat_map(|child| parse_node(child, &acc, global_areas))
        .collect()
}
