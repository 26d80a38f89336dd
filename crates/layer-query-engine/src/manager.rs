//! Query manager facade.

use std::fmt;

use layer_query::{AreaState, Entry, Selector};
use tracing::{debug, trace, warn};

use crate::config::QueryManagerConfig;
use crate::error::EngineResult;
use crate::event::{DirtyLayers, ListenerId, QueriesChanged};
use crate::expander::WildcardExpander;
use crate::registry::HandlerRegistry;
use crate::store::{self, EntryFilter, EntryStore};
use crate::timer::{Clock, Delay, SystemClock};
use crate::traits::{AreaProvider, EntryPersistence, FilterProvider, LayerHandler, NoopPersistence};

type Listener<'a> = Box<dyn FnMut(&QueriesChanged) + 'a>;

/// Owns the entry list and the handler registry, and tells listeners which
/// layers' queries changed.
///
/// Mutations apply to the entry list immediately. Expansion and notification
/// are coalesced: each mutation re-arms an update delay, and the next
/// [`poll`](Self::poll) after the delay runs one expansion and emits one
/// [`QueriesChanged`] carrying every layer touched in between.
///
/// # Example
///
/// ```rust
/// use layer_query::Entry;
/// use layer_query_engine::{
///     AreaInfo, AreaProvider, EntryFilter, NamedLayer, NoFilters, QueryManager,
/// };
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
///
/// manager.add_entry(Entry::new("*", "harbor", "*"), true);
/// let expanded = manager.get_entries(&EntryFilter::new(), true, false);
/// assert_eq!(expanded, vec![Entry::new("ships", "harbor", "*")]);
/// ```
pub struct QueryManager<'a> {
    config: QueryManagerConfig,
    store: EntryStore,
    expanded: Vec<Entry>,
    handlers: HandlerRegistry,
    areas: &'a dyn AreaProvider,
    filters: &'a dyn FilterProvider,
    persistence: Box<dyn EntryPersistence + 'a>,
    clock: Box<dyn Clock + 'a>,
    update: Delay,
    dirty: DirtyLayers,
    listeners: Vec<(ListenerId, Listener<'a>)>,
    next_listener: u64,
}

impl<'a> QueryManager<'a> {
    /// Creates a manager with default configuration.
    pub fn new(areas: &'a dyn AreaProvider, filters: &'a dyn FilterProvider) -> Self {
        Self::with_config(areas, filters, QueryManagerConfig::default())
    }

    /// Creates a manager with custom configuration.
    pub fn with_config(
        areas: &'a dyn AreaProvider,
        filters: &'a dyn FilterProvider,
        config: QueryManagerConfig,
    ) -> Self {
        let update = Delay::new(config.update_delay);
        Self {
            config,
            store: EntryStore::new(),
            expanded: Vec::new(),
            handlers: HandlerRegistry::new(),
            areas,
            filters,
            persistence: Box::new(NoopPersistence),
            clock: Box::new(SystemClock),
            update,
            dirty: DirtyLayers::default(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Replaces the clock driving the update delay.
    pub fn with_clock(mut self, clock: impl Clock + 'a) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replaces the save/load hooks.
    pub fn with_persistence(mut self, persistence: impl EntryPersistence + 'a) -> Self {
        self.persistence = Box::new(persistence);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &QueryManagerConfig {
        &self.config
    }

    /// Returns the area provider.
    pub fn areas(&self) -> &'a dyn AreaProvider {
        self.areas
    }

    /// Returns the filter provider.
    pub fn filters(&self) -> &'a dyn FilterProvider {
        self.filters
    }

    /// Returns the handler registry.
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Returns the current time of the manager's clock.
    pub fn now(&self) -> std::time::Instant {
        self.clock.now()
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    /// Registers a handler and schedules an update for its layer.
    pub fn register_handler(&mut self, handler: Box<dyn LayerHandler>) {
        let layer_id = self.handlers.register(handler);
        debug!(layer = %layer_id, "registered query handler");
        self.dirty.mark_id(&layer_id);
        self.schedule(false);
    }

    /// Removes every handler for a layer and schedules an update for it.
    pub fn unregister_handler(&mut self, layer_id: &str) -> EngineResult<()> {
        let removed = self.handlers.unregister(layer_id)?;
        debug!(layer = %layer_id, removed, "unregistered query handlers");
        self.dirty.mark_id(layer_id);
        self.schedule(false);
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the raw entries.
    pub fn entries(&self) -> &[Entry] {
        self.store.as_slice()
    }

    /// Returns the expanded entries as of the last update.
    pub fn expanded_entries(&self) -> &[Entry] {
        &self.expanded
    }

    /// Copies entries matching a partial key.
    ///
    /// Reads the expanded list when `expanded` is true. Negations are skipped
    /// unless `include_negations` is true.
    pub fn get_entries(
        &self,
        filter: &EntryFilter,
        expanded: bool,
        include_negations: bool,
    ) -> Vec<Entry> {
        if expanded {
            store::select(&self.expanded, filter, include_negations)
        } else {
            self.store.select(filter, include_negations)
        }
    }

    /// Expands an entry list against the registered layers.
    pub fn get_expanded(&self, entries: &[Entry]) -> Vec<Entry> {
        self.expander().expand(entries).into_owned()
    }

    /// Returns true if the entry's layer is registered (or `*`), its area is
    /// shown and its filter is enabled. Unspecified and wildcard areas and
    /// filters always pass.
    pub fn is_active(&self, entry: &Entry) -> bool {
        let layer_ok = match &entry.layer_id {
            Selector::Id(id) => self.handlers.contains(id),
            Selector::Wildcard => true,
            Selector::Unspecified => false,
        };
        let area_ok = entry.area_id.as_id().map_or(true, |id| self.areas.is_shown(id));
        let filter_ok = entry
            .filter_id
            .as_id()
            .map_or(true, |id| self.filters.is_enabled(id));
        layer_ok && area_ok && filter_ok
    }

    /// Returns the active, non-negated entries.
    pub fn get_active_entries(&self, expanded: bool) -> Vec<Entry> {
        self.get_entries(&EntryFilter::new(), expanded, false)
            .into_iter()
            .filter(|e| self.is_active(e))
            .collect()
    }

    /// Reports whether a shown area is used as inclusion, exclusion or both
    /// by entries of registered layers.
    pub fn has_area(&self, area_id: &str) -> AreaState {
        if !self.areas.is_shown(area_id) {
            return AreaState::None;
        }

        self.store
            .iter()
            .filter(|e| !e.is_negated() && e.area_id == *area_id)
            .filter(|e| match &e.layer_id {
                Selector::Id(id) => self.handlers.contains(id),
                Selector::Wildcard => true,
                Selector::Unspecified => false,
            })
            .fold(AreaState::None, |state, e| state.with_usage(e.include_area))
    }

    /// Returns true if a non-negated entry references the filter.
    pub fn has_filter(&self, filter_id: &str) -> bool {
        self.store
            .iter()
            .any(|e| !e.is_negated() && e.filter_id == *filter_id)
    }

    /// Concrete area ids referenced by non-negated entries, optionally for
    /// one layer, in first-use order.
    pub fn get_area_ids(&self, layer_id: Option<&str>) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for entry in self.store.iter().filter(|e| !e.is_negated()) {
            if layer_id.is_some_and(|l| entry.layer_id != *l) {
                continue;
            }
            if let Some(area) = entry.area_id.as_id() {
                if !ids.iter().any(|id| id == area) {
                    ids.push(area.to_string());
                }
            }
        }
        ids
    }

    /// Returns true if an entry names a registered layer, an area and a
    /// filter explicitly. UIs use this to default to the advanced view.
    pub fn has_active_explicit_entries(&self) -> bool {
        self.store.iter().any(|e| {
            e.is_explicit() && e.layer_id.as_id().is_some_and(|id| self.handlers.contains(id))
        })
    }

    /// Returns the layers touched since the last update.
    pub fn dirty_layers(&self) -> &DirtyLayers {
        &self.dirty
    }

    /// Returns true if an update is waiting for its delay.
    pub fn is_update_pending(&self) -> bool {
        self.update.is_active()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds an entry, replacing other entries for the same triple.
    ///
    /// Adding an entry that already exists with the same flags does nothing.
    /// The update runs now when `immediate` is true, otherwise after the
    /// coalescing delay.
    pub fn add_entry(&mut self, entry: Entry, immediate: bool) {
        let layer_id = entry.layer_id.clone();
        if self.insert(entry) {
            self.dirty.mark(&layer_id);
            self.schedule(immediate);
        }
    }

    /// Adds several entries with one update.
    ///
    /// With a `layer_hint` only that layer is marked dirty.
    pub fn add_entries(&mut self, entries: Vec<Entry>, immediate: bool, layer_hint: Option<&str>) {
        let mut changed = false;
        for entry in entries {
            let layer_id = entry.layer_id.clone();
            if self.insert(entry) {
                changed = true;
                if layer_hint.is_none() {
                    self.dirty.mark(&layer_id);
                }
            }
        }

        if changed {
            if let Some(layer_id) = layer_hint {
                self.dirty.mark(&Selector::from(layer_id));
            }
            self.schedule(immediate);
        }
    }

    /// Removes entries matching a partial key; an unrestricted filter clears
    /// the store. Returns the removed entries.
    ///
    /// Removed non-negated entries mark their layer dirty. With
    /// `skip_update` no update is scheduled.
    pub fn remove_entries(&mut self, filter: &EntryFilter, skip_update: bool) -> Vec<Entry> {
        let removed = if filter.is_unrestricted() {
            self.store.clear()
        } else {
            self.store.remove_matching(filter)
        };

        for entry in removed.iter().filter(|e| !e.is_negated()) {
            self.dirty.mark(&entry.layer_id);
        }

        if !removed.is_empty() {
            trace!(removed = removed.len(), "removed query entries");
            if !skip_update {
                self.schedule(false);
            }
        }
        removed
    }

    /// Clears the provisional flag on every entry.
    pub fn commit_temp(&mut self) {
        for entry in self.store.iter_mut().filter(|e| e.is_temp()) {
            entry.temp = None;
        }
    }

    /// Removes provisional entries.
    pub fn remove_temp(&mut self) -> Vec<Entry> {
        let removed = self.store.remove_where(Entry::is_temp);
        if !removed.is_empty() {
            for entry in &removed {
                self.dirty.mark(&entry.layer_id);
            }
            self.schedule(false);
        }
        removed
    }

    fn insert(&mut self, entry: Entry) -> bool {
        if self.store.contains_exact(&entry) {
            return false;
        }
        self.store
            .remove_triple(&entry.layer_id, &entry.area_id, &entry.filter_id);
        self.store.push(entry);
        true
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Hands the committed (non-provisional) entries to the persistence hook.
    pub fn save(&self) -> EngineResult<()> {
        let entries: Vec<Entry> = self
            .store
            .iter()
            .filter(|e| !e.is_temp())
            .cloned()
            .map(|mut e| {
                e.disabled = None;
                e
            })
            .collect();

        let result = self.persistence.save(&entries);
        if let Err(ref err) = result {
            warn!(error = %err, "failed to save query entries");
        }
        result
    }

    /// Replaces the entries with those from the persistence hook.
    pub fn load(&mut self) -> EngineResult<()> {
        let entries = self.persistence.load()?;
        debug!(entries = entries.len(), "loaded query entries");
        self.store.replace(entries);
        self.dirty.mark_all();
        self.schedule(false);
        Ok(())
    }

    // =========================================================================
    // Updates
    // =========================================================================

    /// Subscribes to "queries changed" events.
    pub fn subscribe(&mut self, listener: impl FnMut(&QueriesChanged) + 'a) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Runs the pending update if its delay has passed.
    pub fn poll(&mut self) -> Option<QueriesChanged> {
        if self.update.fire(self.clock.now()) {
            self.run_update()
        } else {
            None
        }
    }

    /// Runs any pending update now.
    pub fn flush(&mut self) -> Option<QueriesChanged> {
        self.update.stop();
        self.run_update()
    }

    /// Cancels the pending update and drops every listener.
    pub fn dispose(&mut self) {
        self.update.stop();
        self.listeners.clear();
        self.dirty.take();
    }

    fn schedule(&mut self, immediate: bool) {
        if immediate {
            self.flush();
        } else {
            self.update.start(self.clock.now());
        }
    }

    fn expander(&self) -> WildcardExpander {
        WildcardExpander::new(self.handlers.layer_ids())
    }

    fn run_update(&mut self) -> Option<QueriesChanged> {
        self.expanded = self.expander().expand(self.store.as_slice()).into_owned();

        if self.dirty.is_empty() {
            return None;
        }

        let event = QueriesChanged {
            layers: self.dirty.take(),
        };
        debug!(
            layers = %event.layers,
            entries = self.store.len(),
            expanded = self.expanded.len(),
            "queries changed"
        );
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
        Some(event)
    }
}

impl fmt::Debug for QueryManager<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryManager")
            .field("config", &self.config)
            .field("entries", &self.store.len())
            .field("expanded", &self.expanded.len())
            .field("handlers", &self.handlers)
            .field("dirty", &self.dirty)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NamedLayer;
    use crate::timer::ManualClock;
    use crate::traits::{NoAreas, NoFilters};
    use std::time::Duration;

    fn manager<'a>(areas: &'a NoAreas, filters: &'a NoFilters, clock: &ManualClock) -> QueryManager<'a> {
        let mut qm = QueryManager::new(areas, filters).with_clock(clock.clone());
        qm.register_handler(Box::new(NamedLayer::new("l1", "Layer 1")));
        qm.flush();
        qm
    }

    #[test]
    fn test_add_entry_is_idempotent() {
        let (areas, filters, clock) = (NoAreas, NoFilters, ManualClock::new());
        let mut qm = manager(&areas, &filters, &clock);

        qm.add_entry(Entry::new("l1", "a1", "f1"), false);
        qm.flush();
        qm.add_entry(Entry::new("l1", "a1", "f1"), false);

        assert_eq!(qm.entries().len(), 1);
        assert!(!qm.is_update_pending());
    }

    #[test]
    fn test_add_entry_replaces_flags() {
        let (areas, filters, clock) = (NoAreas, NoFilters, ManualClock::new());
        let mut qm = manager(&areas, &filters, &clock);

        qm.add_entry(Entry::new("l1", "a1", "f1"), true);
        qm.add_entry(Entry::new("l1", "a1", "f1").with_include_area(false), true);

        assert_eq!(
            qm.entries(),
            &[Entry::new("l1", "a1", "f1").with_include_area(false)]
        );
    }

    #[test]
    fn test_add_entry_lifts_negation() {
        let (areas, filters, clock) = (NoAreas, NoFilters, ManualClock::new());
        let mut qm = manager(&areas, &filters, &clock);

        qm.add_entry(Entry::new("l1", "a1", "*").negated(), true);
        qm.add_entry(Entry::new("l1", "a1", "*"), false);

        assert_eq!(qm.entries(), &[Entry::new("l1", "a1", "*")]);
        assert!(qm.is_update_pending());
    }

    #[test]
    fn test_poll_waits_for_delay() {
        let (areas, filters, clock) = (NoAreas, NoFilters, ManualClock::new());
        let mut qm = manager(&areas, &filters, &clock);

        qm.add_entry(Entry::new("l1", "a1", "f1"), false);
        assert!(qm.poll().is_none());

        clock.advance(Duration::from_millis(20));
        let event = qm.poll().unwrap();
        assert!(event.layers.contains("l1"));
        assert!(qm.poll().is_none());
    }

    #[test]
    fn test_remove_all_clears() {
        let (areas, filters, clock) = (NoAreas, NoFilters, ManualClock::new());
        let mut qm = manager(&areas, &filters, &clock);
        qm.add_entry(Entry::new("l1", "a1", "f1"), true);
        qm.add_entry(Entry::new("*", "a2", "*"), true);

        let removed = qm.remove_entries(&EntryFilter::new(), false);
        assert_eq!(removed.len(), 2);
        assert!(qm.entries().is_empty());
        assert_eq!(qm.dirty_layers(), &DirtyLayers::All);
    }

    #[test]
    fn test_removed_negation_does_not_mark_dirty() {
        let (areas, filters, clock) = (NoAreas, NoFilters, ManualClock::new());
        let mut qm = manager(&areas, &filters, &clock);
        qm.add_entry(Entry::new("l1", "a1", "*").negated(), true);

        qm.remove_entries(&EntryFilter::new().layer("l1"), true);
        assert!(qm.dirty_layers().is_empty());
        assert!(!qm.is_update_pending());
    }

    #[test]
    fn test_temp_entries() {
        let (areas, filters, clock) = (NoAreas, NoFilters, ManualClock::new());
        let mut qm = manager(&areas, &filters, &clock);
        qm.add_entry(Entry::new("l1", "a1", "*").temporary(), true);
        qm.add_entry(Entry::new("l1", "a2", "*"), true);

        assert_eq!(qm.remove_temp().len(), 1);
        assert_eq!(qm.entries(), &[Entry::new("l1", "a2", "*")]);

        qm.add_entry(Entry::new("l1", "a3", "*").temporary(), true);
        qm.commit_temp();
        assert!(qm.entries().iter().all(|e| !e.is_temp()));
    }

    #[test]
    fn test_unsubscribe() {
        let (areas, filters, clock) = (NoAreas, NoFilters, ManualClock::new());
        let mut qm = manager(&areas, &filters, &clock);
        let id = qm.subscribe(|_| {});
        assert!(qm.unsubscribe(id));
        assert!(!qm.unsubscribe(id));
    }

    #[test]
    fn test_dispose_cancels_pending_update() {
        let (areas, filters, clock) = (NoAreas, NoFilters, ManualClock::new());
        let mut qm = manager(&areas, &filters, &clock);
        qm.add_entry(Entry::new("l1", "a1", "f1"), false);
        qm.dispose();

        clock.advance(Duration::from_secs(1));
        assert!(qm.poll().is_none());
    }

    #[test]
    fn test_get_area_ids() {
        let (areas, filters, clock) = (NoAreas, NoFilters, ManualClock::new());
        let mut qm = manager(&areas, &filters, &clock);
        qm.add_entries(
            vec![
                Entry::new("l1", "a1", "*"),
                Entry::new("l2", "a2", "*"),
                Entry::new("*", "a1", "*"),
                Entry::new("l1", "a3", "*").negated(),
                Entry::new("l1", "*", "f1"),
            ],
            true,
            None,
        );

        assert_eq!(qm.get_area_ids(None), vec!["a1", "a2"]);
        assert_eq!(qm.get_area_ids(Some("l1")), vec!["a1"]);
        assert!(qm.has_filter("f1"));
        assert!(!qm.has_filter("f2"));
    }
}
