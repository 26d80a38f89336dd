//! Combinator controller: owns the current pivot tree and its two delays.
//!
//! Rebuild requests (upstream area, filter or query changes) are coalesced by
//! the rebuild delay. In apply-immediately mode, tree edits are committed to
//! the query manager after the apply delay. Both are driven by
//! [`CombinatorController::poll`].

use std::collections::BTreeSet;
use std::fmt;

use layer_query::{Entry, PivotOrder};
use layer_query_engine::{Clock, Delay, EntryFilter, QueryManager, SystemClock};
use tracing::{debug, trace};

use crate::builder::PivotTreeBuilder;
use crate::config::CombinatorConfig;
use crate::error::{CombinatorError, CombinatorResult};
use crate::node::{PivotNode, TriState};
use crate::reconcile::{apply_entries, parse_entries, MatchMode};

/// Work done by one [`CombinatorController::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinatorEvent {
    /// Tree edits were committed to the query manager.
    Applied {
        /// Number of entries added.
        entries: usize,
    },
    /// The tree was rebuilt from the query manager.
    Rebuilt {
        /// Number of leaves in the new tree.
        leaves: usize,
    },
}

/// Keeps a pivot tree in sync with a query manager.
///
/// The tree is a disposable view: the query manager's entries stay the
/// source of truth, and every rebuild re-derives node states from them.
///
/// # Example
///
/// ```rust
/// use layer_query::Entry;
/// use layer_query_combinator::{CombinatorConfig, CombinatorController, TriState};
/// use layer_query_engine::{AreaInfo, AreaProvider, NamedLayer, NoFilters, QueryManager};
///
/// struct Areas;
///
/// impl AreaProvider for Areas {
///     fn area(&self, id: &str) -> Option<AreaInfo> {
///         (id == "harbor").then(|| AreaInfo::new("harbor", "Harbor"))
///     }
///     fn areas(&self) -> Vec<AreaInfo> {
///         vec![AreaInfo::new("harbor", "Harbor")]
///     }
/// }
///
/// let (areas, filters) = (Areas, NoFilters);
/// let mut manager = QueryManager::new(&areas, &filters);
/// manager.register_handler(Box::new(NamedLayer::new("ships", "Ships")));
/// manager.add_entry(Entry::new("ships", "harbor", "*"), true);
///
/// let mut controller = CombinatorController::new(CombinatorConfig::default());
/// controller.rebuild(&manager);
/// assert!(!controller.is_advanced());
///
/// let tree = controller.tree().unwrap();
/// assert_eq!(tree.find("root/ships/area:harbor").unwrap().state, TriState::On);
/// ```
pub struct CombinatorController {
    config: CombinatorConfig,
    clock: Box<dyn Clock>,
    rebuild_timer: Delay,
    apply_timer: Delay,
    tree: Option<PivotNode>,
    advanced: bool,
    collapsed: BTreeSet<String>,
    disposed: bool,
}

impl CombinatorController {
    /// Creates a controller with no tree.
    pub fn new(config: CombinatorConfig) -> Self {
        let rebuild_timer = Delay::new(config.rebuild_delay);
        let apply_timer = Delay::new(config.apply_delay);
        Self {
            config,
            clock: Box::new(SystemClock),
            rebuild_timer,
            apply_timer,
            tree: None,
            advanced: false,
            collapsed: BTreeSet::new(),
            disposed: false,
        }
    }

    /// Replaces the clock driving both delays.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CombinatorConfig {
        &self.config
    }

    /// Returns the current tree.
    pub fn tree(&self) -> Option<&PivotNode> {
        self.tree.as_ref()
    }

    /// Returns true if the current tree is the advanced view.
    pub fn is_advanced(&self) -> bool {
        self.advanced
    }

    /// Returns true if a rebuild is waiting for its delay.
    pub fn is_rebuild_pending(&self) -> bool {
        self.rebuild_timer.is_active()
    }

    /// Returns true if an automatic apply is waiting for its delay.
    pub fn is_apply_pending(&self) -> bool {
        self.apply_timer.is_active()
    }

    // =========================================================================
    // Tree lifecycle
    // =========================================================================

    /// Requests a rebuild after the rebuild delay. Call this on upstream
    /// area, filter and query changes.
    pub fn schedule_rebuild(&mut self) {
        if !self.disposed {
            self.rebuild_timer.start(self.clock.now());
        }
    }

    /// Rebuilds the tree now and returns its leaf count.
    ///
    /// Unless the view is forced by configuration, the advanced view is used
    /// when the manager holds explicit entries. States are read from the
    /// manager's current entries, even while its update is still pending.
    /// Collapsed nodes stay collapsed when their id survives the rebuild.
    pub fn rebuild(&mut self, manager: &QueryManager<'_>) -> usize {
        self.rebuild_timer.stop();
        let advanced = self
            .config
            .advanced
            .unwrap_or_else(|| manager.has_active_explicit_entries());

        let mut tree = PivotTreeBuilder::new(manager)
            .with_order(self.config.pivot_order.clone())
            .flatten(!advanced)
            .layer_override(self.config.layer_filter.clone())
            .build();

        if advanced {
            // Expanded from the store now; the manager's own expansion may lag
            let live: Vec<Entry> = manager
                .get_expanded(manager.entries())
                .into_iter()
                .filter(|e| !e.is_negated() && manager.is_active(e))
                .collect();
            apply_entries(&mut tree, &live, MatchMode::Advanced);
        } else {
            let live: Vec<Entry> = manager
                .get_entries(&EntryFilter::new(), false, true)
                .into_iter()
                .filter(|e| manager.is_active(e))
                .collect();
            apply_entries(&mut tree, &live, MatchMode::Simple);
        }
        restore_collapsed(&mut tree, &self.collapsed);

        let leaves = tree.leaf_count();
        debug!(advanced, leaves, state = %tree.state, "rebuilt combinator tree");
        self.advanced = advanced;
        self.tree = Some(tree);
        leaves
    }

    /// Entries the current tree flattens to, disabled ones included.
    pub fn entries(&self, manager: &QueryManager<'_>) -> CombinatorResult<Vec<Entry>> {
        let tree = self.tree.as_ref().ok_or(CombinatorError::NotBuilt)?;
        Ok(parse_entries(tree, manager.entries()))
    }

    /// Commits the tree to the manager and returns the number of entries
    /// added.
    ///
    /// Entries of every concrete layer the tree shows are replaced by the
    /// tree's enabled entries. Entries of other layers and wildcard-layer
    /// entries are kept.
    pub fn apply(&mut self, manager: &mut QueryManager<'_>) -> CombinatorResult<usize> {
        let tree = self.tree.as_ref().ok_or(CombinatorError::NotBuilt)?;
        self.apply_timer.stop();

        let additions: Vec<Entry> = parse_entries(tree, manager.entries())
            .into_iter()
            .filter(|e| !e.is_disabled())
            .collect();
        let layers: BTreeSet<&str> = tree
            .iter()
            .filter_map(|node| node.entry.as_ref()?.layer_id.as_ref()?.as_id())
            .collect();

        // Removal only schedules the update when nothing is added after it
        let skip_update = !additions.is_empty();
        for layer in &layers {
            manager.remove_entries(&EntryFilter::new().layer(*layer), skip_update);
        }

        let added = additions.len();
        debug!(layers = layers.len(), entries = added, "applied combinator tree");
        manager.add_entries(additions, false, None);
        self.schedule_rebuild();
        Ok(added)
    }

    /// Runs the delays that have expired: apply first, then rebuild.
    pub fn poll(&mut self, manager: &mut QueryManager<'_>) -> Vec<CombinatorEvent> {
        let mut events = Vec::new();
        if self.disposed {
            return events;
        }

        if self.apply_timer.fire(self.clock.now()) {
            if let Ok(entries) = self.apply(manager) {
                events.push(CombinatorEvent::Applied { entries });
            }
        }
        if self.rebuild_timer.fire(self.clock.now()) {
            let leaves = self.rebuild(manager);
            events.push(CombinatorEvent::Rebuilt { leaves });
        }
        events
    }

    /// Stops both delays and drops the tree. Later calls are no-ops or
    /// report [`CombinatorError::NotBuilt`].
    pub fn dispose(&mut self) {
        self.rebuild_timer.stop();
        self.apply_timer.stop();
        self.tree = None;
        self.disposed = true;
    }

    // =========================================================================
    // Tree edits
    // =========================================================================

    /// Flips a node as a click would and returns its new state.
    pub fn toggle(&mut self, id: &str) -> CombinatorResult<TriState> {
        let tree = self.tree.as_mut().ok_or(CombinatorError::NotBuilt)?;
        let state = tree
            .toggle(id)
            .ok_or_else(|| CombinatorError::UnknownNode(id.to_string()))?;
        trace!(node = %id, state = %state, "toggled combinator node");
        self.edited();
        Ok(state)
    }

    /// Sets a node and its descendants, and returns the node's state after
    /// ancestors are recomputed.
    pub fn set_state(&mut self, id: &str, state: TriState) -> CombinatorResult<TriState> {
        let tree = self.tree.as_mut().ok_or(CombinatorError::NotBuilt)?;
        let state = tree
            .set_state_of(id, state)
            .ok_or_else(|| CombinatorError::UnknownNode(id.to_string()))?;
        self.edited();
        Ok(state)
    }

    /// Collapses or expands a node. Remembered across rebuilds.
    pub fn set_collapsed(&mut self, id: &str, collapsed: bool) -> CombinatorResult<()> {
        let tree = self.tree.as_mut().ok_or(CombinatorError::NotBuilt)?;
        let node = tree
            .find_mut(id)
            .ok_or_else(|| CombinatorError::UnknownNode(id.to_string()))?;
        node.collapsed = collapsed;
        if collapsed {
            self.collapsed.insert(id.to_string());
        } else {
            self.collapsed.remove(id);
        }
        Ok(())
    }

    fn edited(&mut self) {
        if self.config.apply_immediately {
            self.apply_timer.start(self.clock.now());
        }
    }

    // =========================================================================
    // View settings
    // =========================================================================

    /// Forces the advanced or simple view, or restores auto-detection.
    pub fn set_advanced(&mut self, advanced: Option<bool>) {
        self.config.advanced = advanced;
        self.schedule_rebuild();
    }

    /// Changes the pivot order of the advanced view.
    pub fn set_pivot_order(&mut self, order: PivotOrder) {
        self.config.pivot_order = order;
        self.schedule_rebuild();
    }

    /// Restricts the tree to one layer, or lifts the restriction.
    pub fn set_layer_filter(&mut self, layer_id: Option<String>) {
        self.config.layer_filter = layer_id;
        self.schedule_rebuild();
    }

    /// Turns automatic applies on or off. Turning them off drops a pending
    /// apply.
    pub fn set_apply_immediately(&mut self, enabled: bool) {
        self.config.apply_immediately = enabled;
        if !enabled {
            self.apply_timer.stop();
        }
    }
}

fn restore_collapsed(node: &mut PivotNode, collapsed: &BTreeSet<String>) {
    node.collapsed = collapsed.contains(&node.id);
    for child in &mut node.children {
        restore_collapsed(child, collapsed);
    }
}

impl fmt::Debug for CombinatorController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinatorController")
            .field("config", &self.config)
            .field("rebuild_timer", &self.rebuild_timer)
            .field("apply_timer", &self.apply_timer)
            .field("advanced", &self.advanced)
            .field("nodes", &self.tree.as_ref().map(|t| t.iter().count()))
            .field("collapsed", &self.collapsed)
            .field("disposed", &self.disposed)
            .finish()
    }
}
