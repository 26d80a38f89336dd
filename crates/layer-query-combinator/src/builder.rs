//! Pivot tree construction.
//!
//! Each tree level is one pivot. Candidates for a level come from the live
//! registries behind the query manager: registered layers, shown areas and
//! enabled filters. A level only offers what is compatible with the values
//! already fixed by its ancestors.

use layer_query::{EntryFragment, Pivot, PivotOrder, Selector, WILDCARD};
use layer_query_engine::QueryManager;
use tracing::debug;

use crate::node::PivotNode;

/// Label of the synthetic "no filter" choice in the advanced view.
pub const NO_FILTER_LABEL: &str = "No filter";

/// One child to create at a level.
struct Candidate {
    key: String,
    label: String,
    fragment: EntryFragment,
}

/// Builds pivot trees from a query manager's registries.
///
/// # Example
///
/// ```rust
/// use layer_query_combinator::PivotTreeBuilder;
/// use layer_query_engine::{NamedLayer, NoAreas, NoFilters, QueryManager};
///
/// let (areas, filters) = (NoAreas, NoFilters);
/// let mut manager = QueryManager::new(&areas, &filters);
/// manager.register_handler(Box::new(NamedLayer::new("ships", "Ships")));
///
/// let tree = PivotTreeBuilder::new(&manager).build();
/// let ships = tree.find("root/ships").unwrap();
/// // No shown areas: the area level gets a placeholder
/// assert_eq!(ships.children[0].label, "No areas");
/// ```
pub struct PivotTreeBuilder<'q, 'a> {
    manager: &'q QueryManager<'a>,
    order: PivotOrder,
    flatten: bool,
    layer_override: Option<String>,
}

impl<'q, 'a> PivotTreeBuilder<'q, 'a> {
    /// Creates a builder with the default pivot order.
    pub fn new(manager: &'q QueryManager<'a>) -> Self {
        Self {
            manager,
            order: PivotOrder::default(),
            flatten: false,
            layer_override: None,
        }
    }

    /// Sets the pivot order.
    pub fn with_order(mut self, order: PivotOrder) -> Self {
        self.order = order;
        self
    }

    /// Builds the simple view: layers, then area and filter leaves.
    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Restricts the layer level to one layer.
    pub fn layer_override(mut self, layer_id: Option<String>) -> Self {
        self.layer_override = layer_id;
        self
    }

    /// Builds a full tree under a fresh root.
    pub fn build(&self) -> PivotNode {
        let root = self.pivot_data(0, PivotNode::root());
        debug!(
            nodes = root.iter().count(),
            leaves = root.leaf_count(),
            flatten = self.flatten,
            order = %self.order,
            "built pivot tree"
        );
        root
    }

    /// Populates `node` with the levels from `index` on.
    ///
    /// The node's own fragment is the only fixed context, so a detached
    /// subtree should be passed with its ancestors' values merged in.
    pub fn pivot_data(&self, index: usize, mut node: PivotNode) -> PivotNode {
        let mut path: Vec<EntryFragment> = node.entry.iter().cloned().collect();
        if self.flatten {
            self.populate_flat(&mut node, &mut path);
        } else {
            self.populate(&mut node, index, &mut path);
        }
        node
    }

    fn populate(&self, node: &mut PivotNode, index: usize, path: &mut Vec<EntryFragment>) {
        let Some(pivot) = self.order.get(index) else {
            return;
        };

        let mut candidates = self.candidates(pivot, path);
        if pivot == Pivot::Filter {
            candidates.push(Candidate {
                key: WILDCARD.to_string(),
                label: NO_FILTER_LABEL.to_string(),
                fragment: EntryFragment::new().filter(Selector::Wildcard),
            });
        }

        for candidate in candidates {
            let mut child = PivotNode::child(
                &node.id,
                &candidate.key,
                candidate.label,
                pivot,
                candidate.fragment.clone(),
            );
            path.push(candidate.fragment);
            self.populate(&mut child, index + 1, path);
            path.pop();
            node.children.push(child);
        }

        if node.children.is_empty() {
            node.children.push(PivotNode::placeholder(&node.id, pivot));
        }
        node.children.sort_by_cached_key(|child| child.label.to_lowercase());
    }

    fn populate_flat(&self, node: &mut PivotNode, path: &mut Vec<EntryFragment>) {
        if fixed(path, Pivot::Layer).is_none() {
            for candidate in self.layer_candidates(path) {
                let mut child = PivotNode::child(
                    &node.id,
                    &candidate.key,
                    candidate.label,
                    Pivot::Layer,
                    candidate.fragment.clone(),
                );
                path.push(candidate.fragment);
                self.populate_flat(&mut child, path);
                path.pop();
                node.children.push(child);
            }
            return;
        }

        for area in self.area_candidates() {
            let key = format!("{}:{}", Pivot::Area, area.key);
            let fragment = area.fragment.filter(Selector::Wildcard);
            node.children
                .push(PivotNode::child(&node.id, &key, area.label, Pivot::Area, fragment));
        }
        for filter in self.filter_candidates(path) {
            let key = format!("{}:{}", Pivot::Filter, filter.key);
            let fragment = filter.fragment.area(Selector::Wildcard);
            node.children
                .push(PivotNode::child(&node.id, &key, filter.label, Pivot::Filter, fragment));
        }
    }

    fn candidates(&self, pivot: Pivot, path: &[EntryFragment]) -> Vec<Candidate> {
        match pivot {
            Pivot::Layer => self.layer_candidates(path),
            Pivot::Area => self.area_candidates(),
            Pivot::Filter => self.filter_candidates(path),
        }
    }

    fn layer_candidates(&self, path: &[EntryFragment]) -> Vec<Candidate> {
        // A fixed filter narrows the level to the layer it applies to
        let filter_layer = fixed(path, Pivot::Filter).map(|filter_id| {
            self.manager
                .filters()
                .filter(filter_id)
                .map(|filter| filter.layer_type)
        });

        self.manager
            .handlers()
            .layer_set()
            .into_iter()
            .filter(|(id, _)| self.layer_override.as_ref().map_or(true, |only| only == id))
            .filter(|(id, _)| match &filter_layer {
                None => true,
                Some(layer_type) => layer_type.as_ref() == Some(id),
            })
            .map(|(id, name)| Candidate {
                fragment: EntryFragment::new().layer(id.as_str()),
                key: id,
                label: name,
            })
            .collect()
    }

    fn area_candidates(&self) -> Vec<Candidate> {
        self.manager
            .areas()
            .areas()
            .into_iter()
            .filter(|area| area.shown)
            .map(|area| Candidate {
                fragment: EntryFragment::new().area(area.id.as_str()).include_area(true),
                key: area.id,
                label: area.title,
            })
            .collect()
    }

    fn filter_candidates(&self, path: &[EntryFragment]) -> Vec<Candidate> {
        let layer_id = fixed(path, Pivot::Layer).or(self.layer_override.as_deref());
        self.manager
            .filters()
            .filters(layer_id)
            .into_iter()
            .filter(|filter| filter.enabled)
            .map(|filter| Candidate {
                fragment: EntryFragment::new().filter(filter.id.as_str()).filter_group(true),
                key: filter.id,
                label: filter.title,
            })
            .collect()
    }
}

/// First concrete value for a pivot, walking from the nearest ancestor up.
fn fixed(path: &[EntryFragment], pivot: Pivot) -> Option<&str> {
    path.iter()
        .rev()
        .find_map(|fragment| fragment.selector(pivot).and_then(Selector::as_id))
}
