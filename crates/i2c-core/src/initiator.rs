//! Address-routing initiator sockets.
//!
//! An initiator is bound to any number of targets. A start condition decodes
//! the address against the bound targets in binding order; an acknowledged
//! start leaves the initiator addressed to that target until the next stop,
//! the next start, or a refused start. Data transfers are only forwarded while
//! addressed.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::target::TargetRef;
use crate::{
    Command, Direction, LogTrace, Payload, Response, SimClock, SimTime, TargetSocket,
    TopologyError, TraceDirection, TraceRecord, TraceSink,
};

/// Response returned by [`InitiatorSocket::stop`] when no target is addressed.
///
/// Nothing on the bus could acknowledge the stop condition.
pub const IDLE_STOP_RESPONSE: Response = Response::Nack;

/// Per-initiator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct InitiatorConfig {
    /// Emits a [`TraceRecord`] for both legs of every transaction.
    pub tracing_enabled: bool,
}

/// Observable protocol state of an initiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum BusState {
    /// No target is addressed.
    #[default]
    Idle,
    /// A start was acknowledged; transfers go to the addressed target.
    Addressed {
        /// Address that was acknowledged.
        address: u16,
        /// Transfer intent announced by the start condition.
        direction: Direction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveTarget {
    binding: usize,
    address: u16,
    direction: Direction,
}

/// Initiator endpoint routing transactions to bound targets by address.
pub struct InitiatorSocket {
    name: String,
    config: InitiatorConfig,
    stub: bool,
    bound: Vec<TargetRef>,
    active: Option<ActiveTarget>,
    trace: Option<Rc<RefCell<dyn TraceSink>>>,
    clock: Option<Rc<dyn SimClock>>,
}

impl InitiatorSocket {
    /// Creates an idle, unbound initiator with default configuration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, InitiatorConfig::default())
    }

    /// Creates an idle, unbound initiator.
    #[must_use]
    pub fn with_config(name: impl Into<String>, config: InitiatorConfig) -> Self {
        Self {
            name: name.into(),
            config,
            stub: false,
            bound: Vec::new(),
            active: None,
            trace: None,
            clock: None,
        }
    }

    /// Creates an initiator that refuses every operation and every binding.
    #[must_use]
    pub fn stubbed(name: impl Into<String>) -> Self {
        Self {
            stub: true,
            ..Self::new(name)
        }
    }

    /// Socket name used for lookup, logging and tracing.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &InitiatorConfig {
        &self.config
    }

    /// Returns `true` for a stubbed initiator.
    #[must_use]
    pub const fn is_stub(&self) -> bool {
        self.stub
    }

    /// Routes trace records to `sink` instead of the log.
    pub fn set_trace_sink(&mut self, sink: Rc<RefCell<dyn TraceSink>>) {
        self.trace = Some(sink);
    }

    /// Stamps trace records with `clock`.
    pub fn set_clock(&mut self, clock: Rc<dyn SimClock>) {
        self.clock = Some(clock);
    }

    /// Binds `target`, checking the routing list for conflicts.
    ///
    /// The address check only covers targets whose addresses are already
    /// assigned; [`validate_topology`](Self::validate_topology) repeats it
    /// once elaboration is complete.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::StubBinding`] for a stubbed initiator,
    /// [`TopologyError::DuplicateTarget`] when `target` is already bound, and
    /// [`TopologyError::DuplicateAddress`] when another bound target already
    /// answers to the same address.
    pub fn try_bind(&mut self, target: &TargetSocket) -> Result<(), TopologyError> {
        if self.stub {
            return Err(TopologyError::StubBinding {
                initiator: self.name.clone(),
            });
        }

        if self.bound.iter().any(|bound| bound.refers_to(target)) {
            return Err(TopologyError::DuplicateTarget {
                initiator: self.name.clone(),
                target: target.name().to_owned(),
            });
        }

        if let Some(address) = target.address() {
            if let Some(existing) = self
                .bound_targets()
                .into_iter()
                .find(|bound| bound.address() == Some(address))
            {
                return Err(TopologyError::DuplicateAddress {
                    initiator: self.name.clone(),
                    address,
                    first: existing.name().to_owned(),
                    second: target.name().to_owned(),
                });
            }
        }

        self.prune_dropped_targets();
        self.bound.push(target.downgrade());
        Ok(())
    }

    /// Removes routing entries whose targets no longer exist, keeping the
    /// active binding index in step.
    fn prune_dropped_targets(&mut self) {
        let active = self.active.map(|active| active.binding);
        let mut index = 0;
        let mut kept = 0;
        let mut remapped = None;
        self.bound.retain(|target| {
            let live = target.is_live();
            if live {
                if active == Some(index) {
                    remapped = Some(kept);
                }
                kept += 1;
            }
            index += 1;
            live
        });

        if let Some(active) = self.active.as_mut() {
            match remapped {
                Some(binding) => active.binding = binding,
                None => {
                    warn!(
                        socket = %self.name,
                        address = active.address,
                        "addressed target no longer exists"
                    );
                    self.active = None;
                }
            }
        }
    }

    /// Binds `target`.
    ///
    /// # Panics
    ///
    /// Panics on any [`TopologyError`] reported by [`try_bind`](Self::try_bind).
    pub fn bind(&mut self, target: &TargetSocket) {
        if let Err(err) = self.try_bind(target) {
            panic!("{err}");
        }
    }

    /// Bound targets that are still alive, in binding order.
    #[must_use]
    pub fn bound_targets(&self) -> Vec<TargetSocket> {
        self.bound.iter().filter_map(TargetRef::upgrade).collect()
    }

    /// Checks that no two live bound targets share an address.
    ///
    /// # Errors
    ///
    /// Returns the first [`TopologyError::DuplicateAddress`] found.
    pub fn validate_topology(&self) -> Result<(), TopologyError> {
        let targets = self.bound_targets();
        for (index, first) in targets.iter().enumerate() {
            let Some(address) = first.address() else {
                continue;
            };
            if let Some(second) = targets[index + 1..]
                .iter()
                .find(|other| other.address() == Some(address))
            {
                return Err(TopologyError::DuplicateAddress {
                    initiator: self.name.clone(),
                    address,
                    first: first.name().to_owned(),
                    second: second.name().to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Current protocol state.
    #[must_use]
    pub fn state(&self) -> BusState {
        self.active.map_or(BusState::Idle, |active| BusState::Addressed {
            address: active.address,
            direction: active.direction,
        })
    }

    /// Target addressed by the last acknowledged start, if still addressed.
    #[must_use]
    pub fn active_target(&self) -> Option<TargetSocket> {
        self.active
            .and_then(|active| self.bound.get(active.binding))
            .and_then(TargetRef::upgrade)
    }

    /// Issues a start condition to `address`.
    ///
    /// Returns NACK without touching any device when no bound target answers
    /// to `address`. Otherwise returns the addressed target's response; only
    /// an acknowledged start leaves the initiator addressed.
    ///
    /// # Panics
    ///
    /// Panics when two live bound targets answer to `address`.
    #[must_use]
    pub fn start(&mut self, address: u16, direction: Direction) -> Response {
        let mut tx = Payload::new(Command::Start(direction), 0);
        self.trace_leg(TraceDirection::Forward, &tx);

        self.active = None;
        if !self.stub {
            match self.decode(address) {
                Some((binding, target)) => {
                    tx.response = target.start(direction);
                    if tx.is_success() {
                        self.active = Some(ActiveTarget {
                            binding,
                            address,
                            direction,
                        });
                    }
                }
                None => {
                    debug!(socket = %self.name, address, "no target bound at address");
                }
            }
        }

        self.trace_leg(TraceDirection::Backward, &tx);
        tx.response
    }

    /// Transfers one data byte with the addressed target.
    ///
    /// In a write transaction `*data` is handed to the target. In a read
    /// transaction `*data` is replaced with the target's byte when it
    /// acknowledges. Returns NACK without touching any device when idle. A
    /// refused transfer keeps the initiator addressed.
    #[must_use]
    pub fn transport(&mut self, data: &mut u8) -> Response {
        self.transfer(None, data)
    }

    /// Writes one byte to the addressed target.
    ///
    /// Returns NACK without touching any device unless the acknowledged
    /// start announced a write.
    #[must_use]
    pub fn write(&mut self, data: u8) -> Response {
        let mut byte = data;
        self.transfer(Some(Direction::Write), &mut byte)
    }

    /// Reads one byte from the addressed target.
    ///
    /// Returns NACK without touching any device unless the acknowledged
    /// start announced a read. The byte is zero unless the response is
    /// [`Response::Ack`].
    #[must_use]
    pub fn read(&mut self) -> (Response, u8) {
        let mut byte = 0;
        let response = self.transfer(Some(Direction::Read), &mut byte);
        (response, byte)
    }

    /// Issues a stop condition and returns to idle.
    ///
    /// The addressed target, if any, receives the stop and its response is
    /// returned. Without an addressed target the result is
    /// [`IDLE_STOP_RESPONSE`]. The initiator is idle afterwards either way.
    #[must_use]
    pub fn stop(&mut self) -> Response {
        let mut tx = Payload::new(Command::Stop, 0);
        self.trace_leg(TraceDirection::Forward, &tx);

        tx.response = match self.active {
            Some(active) => self
                .live_active_target(active)
                .map_or(Response::Nack, |target| target.stop()),
            None => IDLE_STOP_RESPONSE,
        };
        self.active = None;

        self.trace_leg(TraceDirection::Backward, &tx);
        tx.response
    }

    fn transfer(&mut self, requested: Option<Direction>, data: &mut u8) -> Response {
        let mut tx = Payload::new(Command::Data, *data);
        self.trace_leg(TraceDirection::Forward, &tx);

        match self.active {
            None => {
                debug!(socket = %self.name, "data transfer outside an addressed transaction");
            }
            Some(active) if requested.is_some_and(|requested| requested != active.direction) => {
                debug!(
                    socket = %self.name,
                    address = active.address,
                    started = %active.direction,
                    "data transfer against the direction of the transaction"
                );
            }
            Some(active) => {
                if let Some(target) = self.live_active_target(active) {
                    match active.direction {
                        Direction::Write => tx.response = target.write(*data),
                        Direction::Read => {
                            let (response, byte) = target.read();
                            tx.response = response;
                            if response.is_ack() {
                                tx.data = byte;
                                *data = byte;
                            }
                        }
                    }
                }
            }
        }

        self.trace_leg(TraceDirection::Backward, &tx);
        tx.response
    }

    fn decode(&self, address: u16) -> Option<(usize, TargetSocket)> {
        let mut matches = self
            .bound
            .iter()
            .enumerate()
            .filter_map(|(binding, target)| target.upgrade().map(|target| (binding, target)))
            .filter(|(_, target)| target.address() == Some(address));

        let first = matches.next()?;
        if let Some((_, second)) = matches.next() {
            panic!(
                "{}",
                TopologyError::DuplicateAddress {
                    initiator: self.name.clone(),
                    address,
                    first: first.1.name().to_owned(),
                    second: second.name().to_owned(),
                }
            );
        }
        Some(first)
    }

    fn live_active_target(&mut self, active: ActiveTarget) -> Option<TargetSocket> {
        let target = self.bound.get(active.binding).and_then(TargetRef::upgrade);
        if target.is_none() {
            warn!(
                socket = %self.name,
                address = active.address,
                "addressed target no longer exists"
            );
            self.active = None;
        }
        target
    }

    fn trace_leg(&self, direction: TraceDirection, payload: &Payload) {
        if !self.config.tracing_enabled {
            return;
        }

        let record = TraceRecord {
            time: self.clock.as_ref().map_or(SimTime::ZERO, |clock| clock.now()),
            socket: self.name.clone(),
            direction,
            payload: *payload,
        };
        match &self.trace {
            Some(sink) => sink.borrow_mut().on_record(&record),
            None => LogTrace.on_record(&record),
        }
    }
}

impl fmt::Debug for InitiatorSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound: Vec<_> = self
            .bound_targets()
            .iter()
            .map(|target| target.name().to_owned())
            .collect();
        f.debug_struct("InitiatorSocket")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("stub", &self.stub)
            .field("bound", &bound)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
