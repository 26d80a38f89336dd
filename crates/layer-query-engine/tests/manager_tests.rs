//! Integration tests for the query manager facade.
//!
//! These tests drive the manager through mock area/filter providers and a
//! manual clock.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

use layer_query::{AreaState, Entry};
use layer_query_engine::{
    AreaInfo, AreaProvider, DirtyLayers, EngineError, EngineResult, EntryFilter,
    EntryPersistence, FilterInfo, FilterProvider, ManualClock, NamedLayer, QueriesChanged,
    QueryManager, QueryManagerConfig,
};
use pretty_assertions::assert_eq;

/// Mock area source; visibility can change while a manager borrows it.
struct MockAreas {
    areas: RefCell<Vec<AreaInfo>>,
}

impl MockAreas {
    fn new(ids: &[&str]) -> Self {
        Self {
            areas: RefCell::new(ids.iter().map(|id| AreaInfo::new(*id, id.to_uppercase())).collect()),
        }
    }

    fn set_shown(&self, id: &str, shown: bool) {
        for area in self.areas.borrow_mut().iter_mut().filter(|a| a.id == id) {
            area.shown = shown;
        }
    }
}

impl AreaProvider for MockAreas {
    fn area(&self, area_id: &str) -> Option<AreaInfo> {
        self.areas.borrow().iter().find(|a| a.id == area_id).cloned()
    }

    fn areas(&self) -> Vec<AreaInfo> {
        self.areas.borrow().clone()
    }
}

/// Mock filter source.
struct MockFilters {
    filters: RefCell<Vec<FilterInfo>>,
}

impl MockFilters {
    fn new(filters: Vec<FilterInfo>) -> Self {
        Self {
            filters: RefCell::new(filters),
        }
    }

    fn set_enabled(&self, id: &str, enabled: bool) {
        for filter in self.filters.borrow_mut().iter_mut().filter(|f| f.id == id) {
            filter.enabled = enabled;
        }
    }
}

impl FilterProvider for MockFilters {
    fn filter(&self, filter_id: &str) -> Option<FilterInfo> {
        self.filters.borrow().iter().find(|f| f.id == filter_id).cloned()
    }

    fn filters(&self, layer_id: Option<&str>) -> Vec<FilterInfo> {
        self.filters
            .borrow()
            .iter()
            .filter(|f| layer_id.map_or(true, |l| f.layer_type == l))
            .cloned()
            .collect()
    }
}

/// Persistence hook backed by memory.
#[derive(Clone, Default)]
struct MemoryPersistence {
    saved: Rc<RefCell<Vec<Entry>>>,
    fail: bool,
}

impl EntryPersistence for MemoryPersistence {
    fn save(&self, entries: &[Entry]) -> EngineResult<()> {
        if self.fail {
            return Err(EngineError::Persistence("storage unavailable".to_string()));
        }
        *self.saved.borrow_mut() = entries.to_vec();
        Ok(())
    }

    fn load(&self) -> EngineResult<Vec<Entry>> {
        Ok(self.saved.borrow().clone())
    }
}

struct Fixture {
    areas: MockAreas,
    filters: MockFilters,
    clock: ManualClock,
}

impl Fixture {
    fn new() -> Self {
        Self {
            areas: MockAreas::new(&["harbor", "canal", "airfield"]),
            filters: MockFilters::new(vec![
                FilterInfo::new("fast", "Fast", "ships"),
                FilterInfo::new("high", "High", "planes"),
            ]),
            clock: ManualClock::new(),
        }
    }

    fn manager(&self) -> QueryManager<'_> {
        let mut manager =
            QueryManager::new(&self.areas, &self.filters).with_clock(self.clock.clone());
        manager.register_handler(Box::new(NamedLayer::new("ships", "Ships")));
        manager.register_handler(Box::new(NamedLayer::new("planes", "Planes")));
        manager.flush();
        manager
    }
}

fn record(manager: &mut QueryManager<'_>) -> Rc<RefCell<Vec<QueriesChanged>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    manager.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    events
}

fn layers(ids: &[&str]) -> DirtyLayers {
    DirtyLayers::Layers(ids.iter().map(|id| id.to_string()).collect::<BTreeSet<_>>())
}

#[test]
fn test_add_entry_twice_keeps_one() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();

    manager.add_entry(Entry::new("ships", "harbor", "fast"), false);
    manager.add_entry(Entry::new("ships", "harbor", "fast"), false);

    let found = manager.get_entries(
        &EntryFilter::new().layer("ships").area("harbor").filter("fast"),
        false,
        false,
    );
    assert_eq!(found.len(), 1);
}

#[test]
fn test_rapid_adds_coalesce_into_one_event() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();
    let events = record(&mut manager);

    manager.add_entry(Entry::new("ships", "harbor", "*"), false);
    fixture.clock.advance(Duration::from_millis(5));
    manager.add_entry(Entry::new("planes", "harbor", "*"), false);
    fixture.clock.advance(Duration::from_millis(5));
    manager.add_entry(Entry::new("trains", "canal", "*"), false);

    fixture.clock.advance(Duration::from_millis(15));
    assert!(manager.poll().is_none());
    assert!(events.borrow().is_empty());

    fixture.clock.advance(Duration::from_millis(5));
    let event = manager.poll().expect("update after delay");
    assert_eq!(event.layers, layers(&["planes", "ships", "trains"]));
    assert_eq!(events.borrow().len(), 1);

    fixture.clock.advance(Duration::from_millis(100));
    assert!(manager.poll().is_none());
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn test_wildcard_mutation_marks_all() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();

    manager.add_entry(Entry::new("ships", "harbor", "*"), false);
    manager.add_entry(Entry::new("*", "canal", "*"), false);

    let event = manager.flush().unwrap();
    assert_eq!(event.layers, DirtyLayers::All);
}

#[test]
fn test_immediate_add_notifies_synchronously() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();
    let events = record(&mut manager);

    manager.add_entry(Entry::new("*", "harbor", "*"), true);

    assert_eq!(events.borrow().len(), 1);
    assert!(!manager.is_update_pending());
    assert_eq!(
        manager.expanded_entries(),
        &[
            Entry::new("ships", "harbor", "*"),
            Entry::new("planes", "harbor", "*"),
        ]
    );
}

#[test]
fn test_add_entries_with_layer_hint() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();

    manager.add_entries(
        vec![
            Entry::new("ships", "harbor", "fast"),
            Entry::new("ships", "canal", "fast"),
        ],
        false,
        Some("ships"),
    );
    assert_eq!(manager.dirty_layers(), &layers(&["ships"]));

    manager.add_entries(vec![Entry::new("planes", "airfield", "high")], false, None);
    assert_eq!(manager.dirty_layers(), &layers(&["planes", "ships"]));
    assert_eq!(manager.entries().len(), 3);
}

#[test]
fn test_remove_entries_by_partial_key() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();
    manager.add_entries(
        vec![
            Entry::new("ships", "harbor", "fast"),
            Entry::new("planes", "harbor", "high"),
            Entry::new("planes", "canal", "high"),
        ],
        true,
        None,
    );

    let removed = manager.remove_entries(&EntryFilter::new().area("harbor"), false);
    assert_eq!(removed.len(), 2);
    assert_eq!(manager.entries(), &[Entry::new("planes", "canal", "high")]);

    let event = manager.flush().unwrap();
    assert_eq!(event.layers, layers(&["planes", "ships"]));
}

#[test]
fn test_active_entries() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();
    manager.add_entries(
        vec![
            Entry::new("ships", "harbor", "fast"),
            Entry::new("ships", "airfield", "*"),
            Entry::new("planes", "canal", "high"),
            Entry::new("trains", "harbor", "*"),
            Entry::new("*", "harbor", "*"),
            Entry::new("ships", "canal", "*").negated(),
        ],
        true,
        None,
    );

    fixture.areas.set_shown("airfield", false);
    fixture.filters.set_enabled("high", false);

    let active = manager.get_active_entries(false);
    assert_eq!(
        active,
        vec![
            Entry::new("ships", "harbor", "fast"),
            Entry::new("*", "harbor", "*"),
        ]
    );
}

#[test]
fn test_has_area_states() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();

    assert_eq!(manager.has_area("harbor"), AreaState::None);

    manager.add_entry(Entry::new("ships", "harbor", "*"), true);
    assert_eq!(manager.has_area("harbor"), AreaState::Inclusion);

    manager.add_entry(
        Entry::new("planes", "harbor", "*").with_include_area(false),
        true,
    );
    assert_eq!(manager.has_area("harbor"), AreaState::Both);

    manager.remove_entries(&EntryFilter::new().layer("ships"), false);
    assert_eq!(manager.has_area("harbor"), AreaState::Exclusion);

    fixture.areas.set_shown("harbor", false);
    assert_eq!(manager.has_area("harbor"), AreaState::None);
}

#[test]
fn test_has_area_ignores_unregistered_layers() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();
    manager.add_entry(Entry::new("trains", "canal", "*"), true);
    assert_eq!(manager.has_area("canal"), AreaState::None);
}

#[test]
fn test_has_active_explicit_entries() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();

    manager.add_entry(Entry::new("*", "harbor", "*"), true);
    manager.add_entry(Entry::new("trains", "harbor", "fast"), true);
    assert!(!manager.has_active_explicit_entries());

    manager.add_entry(Entry::new("ships", "harbor", "fast"), true);
    assert!(manager.has_active_explicit_entries());
}

#[test]
fn test_unregister_handler_changes_expansion() {
    let fixture = Fixture::new();
    let mut manager = fixture.manager();
    manager.add_entry(Entry::new("*", "harbor", "*"), true);
    assert_eq!(manager.expanded_entries().len(), 2);

    manager.unregister_handler("planes").unwrap();
    let event = manager.flush().unwrap();
    assert_eq!(event.layers, layers(&["planes"]));
    assert_eq!(manager.expanded_entries(), &[Entry::new("ships", "harbor", "*")]);

    let err = manager.unregister_handler("planes").unwrap_err();
    assert!(matches!(err, EngineError::HandlerNotRegistered(_)));
}

#[test]
fn test_layer_set() {
    let fixture = Fixture::new();
    let manager = fixture.manager();
    let set = manager.handlers().layer_set();
    assert_eq!(
        set.into_iter().collect::<Vec<_>>(),
        vec![
            ("ships".to_string(), "Ships".to_string()),
            ("planes".to_string(), "Planes".to_string()),
        ]
    );
}

#[test]
fn test_save_and_load_skip_temp_entries() {
    let fixture = Fixture::new();
    let store = MemoryPersistence::default();

    let mut manager = QueryManager::new(&fixture.areas, &fixture.filters)
        .with_clock(fixture.clock.clone())
        .with_persistence(store.clone());
    manager.add_entry(Entry::new("ships", "harbor", "*"), true);
    manager.add_entry(Entry::new("ships", "canal", "*").temporary(), true);
    manager.save().unwrap();
    assert_eq!(store.saved.borrow().len(), 1);

    let mut restored = QueryManager::new(&fixture.areas, &fixture.filters)
        .with_clock(fixture.clock.clone())
        .with_persistence(store.clone());
    restored.load().unwrap();
    assert_eq!(restored.entries(), &[Entry::new("ships", "harbor", "*")]);
    assert_eq!(restored.dirty_layers(), &DirtyLayers::All);
    assert!(restored.is_update_pending());
}

#[test]
fn test_save_failure_is_reported() {
    let fixture = Fixture::new();
    let hook = MemoryPersistence {
        fail: true,
        ..MemoryPersistence::default()
    };
    let manager = QueryManager::new(&fixture.areas, &fixture.filters).with_persistence(hook);
    assert!(matches!(manager.save(), Err(EngineError::Persistence(_))));
}

#[test]
fn test_custom_update_delay() {
    let fixture = Fixture::new();
    let config = QueryManagerConfig::builder()
        .with_update_delay(Duration::from_millis(100))
        .build();
    let mut manager = QueryManager::with_config(&fixture.areas, &fixture.filters, config)
        .with_clock(fixture.clock.clone());

    manager.add_entry(Entry::new("ships", "harbor", "*"), false);
    fixture.clock.advance(Duration::from_millis(50));
    assert!(manager.poll().is_none());
    fixture.clock.advance(Duration::from_millis(50));
    assert!(manager.poll().is_some());
}
