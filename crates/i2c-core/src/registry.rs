//! Name registration for external lookup tooling.
//!
//! Registration is purely observational; no socket behavior depends on it.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::warn;

/// What a registered name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum EndpointKind {
    /// An initiator socket.
    Initiator,
    /// A target socket.
    Target,
    /// A stub standing in for an unpopulated position.
    Stub,
}

/// Sink for hierarchical object names.
pub trait ObjectRegistry {
    /// Registers `name`; returns `false` when the name was already taken.
    fn register(&mut self, name: &str, kind: EndpointKind) -> bool;
}

/// Shared handle to a registry used by several collections.
pub type RegistryHandle = Rc<RefCell<dyn ObjectRegistry>>;

/// In-memory name table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registry {
    objects: BTreeMap<String, EndpointKind>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a registered name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<EndpointKind> {
        self.objects.get(name).copied()
    }

    /// Returns `true` when `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Registered names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectRegistry for Registry {
    fn register(&mut self, name: &str, kind: EndpointKind) -> bool {
        if let Some(existing) = self.objects.get(name) {
            warn!(name, ?existing, ?kind, "object name already registered");
            return false;
        }
        self.objects.insert(name.to_owned(), kind);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{EndpointKind, ObjectRegistry, Registry};

    #[test]
    fn first_registration_wins() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        assert!(registry.register("bench.i2c_in", EndpointKind::Target));
        assert!(!registry.register("bench.i2c_in", EndpointKind::Stub));

        assert_eq!(registry.find("bench.i2c_in"), Some(EndpointKind::Target));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn names_are_listed_in_lexical_order() {
        let mut registry = Registry::new();
        registry.register("b", EndpointKind::Initiator);
        registry.register("a", EndpointKind::Target);

        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(registry.contains("a"));
        assert!(!registry.contains("c"));
    }
}
