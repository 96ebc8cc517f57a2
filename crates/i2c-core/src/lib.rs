//! Address-routed I2C transaction sockets for bus-level device simulation.
//!
//! An [`InitiatorSocket`] decodes start conditions against the
//! [`TargetSocket`]s bound to it and forwards the rest of the transaction to
//! the acknowledged target, whose attached [`I2cHost`] device answers with
//! [`Response::Ack`] or [`Response::Nack`]. Every call completes synchronously;
//! timing is left to the surrounding scheduler.

/// Command/response vocabulary and payload rendering.
pub mod payload;
pub use payload::{
    failed, success, Command, CommandToken, Direction, Payload, Response, TokenError,
};

/// Device capability interface.
pub mod host;
pub use host::{host_handle, HostHandle, I2cHost};

/// Addressable target sockets and the shared stub target.
pub mod target;
pub use target::{TargetSocket, STUB_TARGET_NAME};

/// Address-routing initiator sockets.
pub mod initiator;
pub use initiator::{BusState, InitiatorConfig, InitiatorSocket, IDLE_STOP_RESPONSE};

/// Lazily populated socket collections.
pub mod array;
pub use array::{InitiatorArray, Socket, SocketArray, TargetArray};

/// Topology errors raised during elaboration.
pub mod error;
pub use error::TopologyError;

/// Object-name registration for external lookup.
pub mod registry;
pub use registry::{EndpointKind, ObjectRegistry, Registry, RegistryHandle};

/// Simulation time source.
pub mod clock;
pub use clock::{ManualClock, SimClock, SimTime};

/// Transaction trace hooks.
pub mod trace;
pub use trace::{LogTrace, RecordingTrace, TraceDirection, TraceRecord, TraceSink};

#[cfg(test)]
use proptest as _;
