//! Registry of query-capable layer handlers.
//!
//! The set of registered layer ids is the layer universe: a wildcard layer
//! expands to exactly these ids, and entries for any other concrete layer are
//! inactive.

use indexmap::IndexMap;

use crate::error::{EngineError, EngineResult};
use crate::traits::LayerHandler;

/// Minimal [`LayerHandler`] holding an id and a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedLayer {
    id: String,
    name: String,
}

impl NamedLayer {
    /// Creates a handler for a layer.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl LayerHandler for NamedLayer {
    fn layer_id(&self) -> &str {
        &self.id
    }

    fn layer_name(&self) -> &str {
        &self.name
    }
}

/// Ordered collection of registered handlers.
///
/// Several handlers may share a layer id; the layer stays registered until
/// all of them are removed.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn LayerHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler and returns its layer id.
    pub fn register(&mut self, handler: Box<dyn LayerHandler>) -> String {
        let layer_id = handler.layer_id().to_string();
        self.handlers.push(handler);
        layer_id
    }

    /// Removes every handler for a layer and returns how many were removed.
    pub fn unregister(&mut self, layer_id: &str) -> EngineResult<usize> {
        let before = self.handlers.len();
        self.handlers.retain(|h| h.layer_id() != layer_id);
        match before - self.handlers.len() {
            0 => Err(EngineError::HandlerNotRegistered(layer_id.to_string())),
            removed => Ok(removed),
        }
    }

    /// Returns true if any handler is registered for the layer.
    pub fn contains(&self, layer_id: &str) -> bool {
        self.handlers.iter().any(|h| h.layer_id() == layer_id)
    }

    /// Returns the display name of a registered layer.
    pub fn layer_name(&self, layer_id: &str) -> Option<&str> {
        self.handlers
            .iter()
            .find(|h| h.layer_id() == layer_id)
            .map(|h| h.layer_name())
    }

    /// De-duplicated layer ids in registration order.
    pub fn layer_ids(&self) -> Vec<String> {
        self.layer_set().into_keys().collect()
    }

    /// Layer id to display name, in registration order.
    pub fn layer_set(&self) -> IndexMap<String, String> {
        let mut set = IndexMap::new();
        for handler in &self.handlers {
            set.entry(handler.layer_id().to_string())
                .or_insert_with(|| handler.layer_name().to_string());
        }
        set
    }

    /// Iterates the registered handlers.
    pub fn handlers(&self) -> impl Iterator<Item = &dyn LayerHandler> {
        self.handlers.iter().map(|h| h.as_ref())
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("layers", &self.layer_ids())
            .finish()
    }
}
