//! Device capability interface implemented by whatever owns target sockets.

use std::cell::RefCell;
use std::rc::Rc;

use crate::{Direction, Response, TargetSocket};

/// Shared handle to a device attached to one or more target sockets.
///
/// The model is single-threaded and cooperative, so devices are shared through
/// `Rc<RefCell<_>>`. A device must not issue bus traffic back into a socket
/// routed to itself while one of its own capability calls is running.
pub type HostHandle = Rc<RefCell<dyn I2cHost>>;

/// Bus-facing behavior of a device.
///
/// Every call receives the target socket that was addressed, so a device
/// listening on several addresses can tell its sockets apart.
pub trait I2cHost {
    /// Handles a start condition addressed to `socket`.
    fn i2c_start(&mut self, socket: &TargetSocket, direction: Direction) -> Response;

    /// Handles a stop condition for a transaction on `socket`.
    fn i2c_stop(&mut self, socket: &TargetSocket) -> Response;

    /// Supplies one data byte during a read transfer.
    ///
    /// The byte is only meaningful when the response is [`Response::Ack`].
    fn i2c_read(&mut self, socket: &TargetSocket) -> (Response, u8);

    /// Accepts one data byte during a write transfer.
    fn i2c_write(&mut self, socket: &TargetSocket, data: u8) -> Response;
}

/// Wraps a device into a [`HostHandle`] while keeping a typed handle to it,
/// so callers can still inspect the concrete device after attaching it.
pub fn host_handle<H: I2cHost + 'static>(host: H) -> (Rc<RefCell<H>>, HostHandle) {
    let typed = Rc::new(RefCell::new(host));
    let erased: HostHandle = typed.clone();
    (typed, erased)
}
