//! Sparse, lazily populated socket collections.
//!
//! Slots are created on first access and live as long as the collection. Any
//! slot can be stubbed, after which it permanently yields a socket that
//! refuses every operation.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use crate::{EndpointKind, InitiatorSocket, RegistryHandle, TargetSocket};

/// Socket types that can populate a [`SocketArray`].
pub trait Socket {
    /// Kind registered for a regular element.
    const KIND: EndpointKind;

    /// Creates a regular socket named `name`.
    fn create(name: String) -> Self;

    /// Creates (or fetches) the refusing stand-in for a stubbed slot.
    fn create_stub(name: String) -> Self;
}

impl Socket for InitiatorSocket {
    const KIND: EndpointKind = EndpointKind::Initiator;

    fn create(name: String) -> Self {
        Self::new(name)
    }

    fn create_stub(name: String) -> Self {
        Self::stubbed(name)
    }
}

impl Socket for TargetSocket {
    const KIND: EndpointKind = EndpointKind::Target;

    fn create(name: String) -> Self {
        Self::new(name)
    }

    /// Every stubbed target slot shares the one stub target.
    fn create_stub(_name: String) -> Self {
        Self::stub()
    }
}

#[derive(Debug)]
enum Slot<S> {
    Live(S),
    Stubbed(S),
}

impl<S> Slot<S> {
    const fn socket(&self) -> &S {
        match self {
            Self::Live(socket) | Self::Stubbed(socket) => socket,
        }
    }

    fn socket_mut(&mut self) -> &mut S {
        match self {
            Self::Live(socket) | Self::Stubbed(socket) => socket,
        }
    }
}

/// Index-keyed collection of sockets of one kind.
pub struct SocketArray<S> {
    name: String,
    slots: BTreeMap<usize, Slot<S>>,
    registry: Option<RegistryHandle>,
}

/// Collection of initiator sockets.
pub type InitiatorArray = SocketArray<InitiatorSocket>;

/// Collection of target sockets.
pub type TargetArray = SocketArray<TargetSocket>;

impl<S: Socket> SocketArray<S> {
    /// Creates an empty collection that registers nothing.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: BTreeMap::new(),
            registry: None,
        }
    }

    /// Creates an empty collection that registers element names in `registry`.
    #[must_use]
    pub fn with_registry(name: impl Into<String>, registry: RegistryHandle) -> Self {
        Self {
            registry: Some(registry),
            ..Self::new(name)
        }
    }

    /// Collection name; elements are named `<name>[<index>]`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the element at `index`.
    #[must_use]
    pub fn element_name(&self, index: usize) -> String {
        element_name(&self.name, index)
    }

    /// Name registered for the stub of the element at `index`.
    #[must_use]
    pub fn stub_name(&self, index: usize) -> String {
        stub_name(&self.name, index)
    }

    /// Returns the socket at `index`, creating it on first access.
    pub fn at(&mut self, index: usize) -> &mut S {
        let Self {
            name,
            slots,
            registry,
        } = self;
        slots
            .entry(index)
            .or_insert_with(|| Slot::Live(create_element(name, registry.as_ref(), index)))
            .socket_mut()
    }

    /// Returns the socket at `index` if it has been created or stubbed.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&S> {
        self.slots.get(&index).map(Slot::socket)
    }

    /// Replaces the slot at `index` with a stub and returns it.
    ///
    /// Stubbing an already stubbed slot changes nothing.
    pub fn stub(&mut self, index: usize) -> &mut S {
        let Self {
            name,
            slots,
            registry,
        } = self;
        let registry = registry.as_ref();
        match slots.entry(index) {
            Entry::Occupied(entry) => {
                let slot = entry.into_mut();
                if matches!(slot, Slot::Live(_)) {
                    *slot = Slot::Stubbed(create_stub(name, registry, index));
                }
                slot.socket_mut()
            }
            Entry::Vacant(entry) => {
                register(registry, &element_name(name, index), S::KIND);
                entry
                    .insert(Slot::Stubbed(create_stub(name, registry, index)))
                    .socket_mut()
            }
        }
    }

    /// Returns `true` when the slot at `index` is stubbed.
    #[must_use]
    pub fn is_stubbed(&self, index: usize) -> bool {
        matches!(self.slots.get(&index), Some(Slot::Stubbed(_)))
    }

    /// Returns `true` when the slot at `index` exists.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.slots.contains_key(&index)
    }

    /// Number of populated slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when no slot has been populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Populated indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.keys().copied()
    }

    /// Populated slots in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &S)> + '_ {
        self.slots
            .iter()
            .map(|(index, slot)| (*index, slot.socket()))
    }
}

fn element_name(array: &str, index: usize) -> String {
    format!("{array}[{index}]")
}

fn stub_name(array: &str, index: usize) -> String {
    format!("{array}[{index}]_stub")
}

fn register(registry: Option<&RegistryHandle>, name: &str, kind: EndpointKind) {
    if let Some(registry) = registry {
        registry.borrow_mut().register(name, kind);
    }
}

fn create_element<S: Socket>(array: &str, registry: Option<&RegistryHandle>, index: usize) -> S {
    let name = element_name(array, index);
    register(registry, &name, S::KIND);
    trace!(array, index, "socket created");
    S::create(name)
}

fn create_stub<S: Socket>(array: &str, registry: Option<&RegistryHandle>, index: usize) -> S {
    let name = stub_name(array, index);
    register(registry, &name, EndpointKind::Stub);
    trace!(array, index, "slot stubbed");
    S::create_stub(name)
}

impl<S: fmt::Debug> fmt::Debug for SocketArray<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketArray")
            .field("name", &self.name)
            .field("slots", &self.slots)
            .field("registered", &self.registry.is_some())
            .finish()
    }
}
