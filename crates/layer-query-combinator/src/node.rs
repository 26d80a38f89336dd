//! Pivot tree nodes and the tri-state check machine.
//!
//! A leaf is checked or unchecked directly. Setting a branch pushes the new
//! state down to every descendant, and [`PivotNode::refresh`] recomputes each
//! branch from its children: all on, all off, or indeterminate when they
//! disagree. Placeholder leaves never take part.

use std::fmt;

use layer_query::{EntryFragment, Pivot};

/// Id of the tree root.
pub const ROOT_ID: &str = "root";

/// Check state of a tree node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TriState {
    /// Checked.
    On,
    /// Unchecked.
    #[default]
    Off,
    /// Some descendants checked, some not.
    Indeterminate,
}

impl TriState {
    /// On for true, off for false.
    pub fn from_bool(on: bool) -> Self {
        if on {
            TriState::On
        } else {
            TriState::Off
        }
    }

    /// Returns true if checked.
    pub fn is_on(self) -> bool {
        self == TriState::On
    }

    /// State after a user click: on becomes off, anything else becomes on.
    pub fn toggled(self) -> Self {
        match self {
            TriState::On => TriState::Off,
            TriState::Off | TriState::Indeterminate => TriState::On,
        }
    }

    /// Combines child states. Returns `None` for no children.
    pub fn aggregate(states: impl IntoIterator<Item = TriState>) -> Option<TriState> {
        states.into_iter().try_fold(None, |acc, state| match (acc, state) {
            (_, TriState::Indeterminate) => Err(TriState::Indeterminate),
            (None, state) => Ok(Some(state)),
            (Some(prev), state) if prev == state => Ok(Some(prev)),
            (Some(_), _) => Err(TriState::Indeterminate),
        })
        .unwrap_or_else(Some)
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TriState::On => "on",
            TriState::Off => "off",
            TriState::Indeterminate => "indeterminate",
        };
        f.write_str(s)
    }
}

/// One node of a pivot tree.
///
/// `entry` is the fragment this node contributes; the effective entry at a
/// node is the merge of every fragment from the root down. The root and
/// placeholder leaves carry no fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PivotNode {
    /// Path-unique id, `parent/child`.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Pivot level this node belongs to. `None` for the root.
    pub pivot: Option<Pivot>,
    /// Fragment contributed by this node.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub entry: Option<EntryFragment>,
    /// Ordered children.
    #[cfg_attr(feature = "serde", serde(default))]
    pub children: Vec<PivotNode>,
    /// Check state.
    #[cfg_attr(feature = "serde", serde(default))]
    pub state: TriState,
    /// Whether the node is collapsed in the UI.
    #[cfg_attr(feature = "serde", serde(default))]
    pub collapsed: bool,
}

impl PivotNode {
    /// Creates an empty root.
    pub fn root() -> Self {
        Self {
            id: ROOT_ID.to_string(),
            label: String::new(),
            pivot: None,
            entry: None,
            children: Vec::new(),
            state: TriState::Off,
            collapsed: false,
        }
    }

    /// Creates a child of `parent_id` at a pivot level.
    pub fn child(
        parent_id: &str,
        key: &str,
        label: impl Into<String>,
        pivot: Pivot,
        entry: EntryFragment,
    ) -> Self {
        Self {
            id: format!("{parent_id}/{key}"),
            label: label.into(),
            pivot: Some(pivot),
            entry: Some(entry),
            children: Vec::new(),
            state: TriState::Off,
            collapsed: false,
        }
    }

    /// Creates the "No ..." leaf shown for an empty level.
    pub fn placeholder(parent_id: &str, pivot: Pivot) -> Self {
        Self {
            id: format!("{parent_id}/none"),
            label: pivot.empty_label().to_string(),
            pivot: Some(pivot),
            entry: None,
            children: Vec::new(),
            state: TriState::Off,
            collapsed: false,
        }
    }

    /// Returns true if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns true for the "No ..." leaf of an empty level.
    pub fn is_placeholder(&self) -> bool {
        self.pivot.is_some() && self.entry.is_none()
    }

    /// Finds a node by id.
    pub fn find(&self, id: &str) -> Option<&PivotNode> {
        self.iter().find(|node| node.id == id)
    }

    /// Finds a node by id for mutation.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut PivotNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    /// Depth-first, pre-order iterator over this node and its descendants.
    pub fn iter(&self) -> Iter<'_> {
        Iter { stack: vec![self] }
    }

    /// Number of leaves below (or at) this node, placeholders excluded.
    pub fn leaf_count(&self) -> usize {
        self.iter()
            .filter(|node| node.is_leaf() && !node.is_placeholder())
            .count()
    }

    /// Sets this node and every descendant, placeholders excepted.
    pub fn set_state(&mut self, state: TriState) {
        if self.is_placeholder() {
            return;
        }
        self.state = state;
        for child in &mut self.children {
            child.set_state(state);
        }
    }

    /// Recomputes branch states from the leaves up and returns this node's
    /// state.
    pub fn refresh(&mut self) -> TriState {
        if self.is_leaf() {
            if self.is_placeholder() {
                self.state = TriState::Off;
            }
            return self.state;
        }

        let mut states = Vec::with_capacity(self.children.len());
        for child in &mut self.children {
            let state = child.refresh();
            if !child.is_placeholder() {
                states.push(state);
            }
        }
        self.state = TriState::aggregate(states).unwrap_or(TriState::Off);
        self.state
    }

    /// Sets the state of the node with `id`, then refreshes the tree.
    /// Returns `None` if no such node exists.
    pub fn set_state_of(&mut self, id: &str, state: TriState) -> Option<TriState> {
        self.find_mut(id)?.set_state(state);
        self.refresh();
        self.find(id).map(|node| node.state)
    }

    /// Flips the node with `id` as a click would, then refreshes the tree.
    pub fn toggle(&mut self, id: &str) -> Option<TriState> {
        let next = self.find(id)?.state.toggled();
        self.set_state_of(id, next)
    }
}

/// Pre-order iterator returned by [`PivotNode::iter`].
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a PivotNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a PivotNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
