//! Addressable target sockets.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::warn;

use crate::{Direction, HostHandle, I2cHost, Response};

/// Name carried by the shared stub target.
pub const STUB_TARGET_NAME: &str = "i2c_stub";

thread_local! {
    static STUB_TARGET: TargetSocket = TargetSocket::from_inner(TargetInner {
        name: STUB_TARGET_NAME.to_owned(),
        address: Cell::new(None),
        host: RefCell::new(None),
        stub: true,
    });
}

struct TargetInner {
    name: String,
    address: Cell<Option<u16>>,
    host: RefCell<Option<HostHandle>>,
    stub: bool,
}

/// One device position on the bus.
///
/// A `TargetSocket` is a cheap handle: clones refer to the same socket. The
/// owner (usually a [`TargetArray`](crate::TargetArray) or a device model)
/// keeps it alive; initiators only hold non-owning references to it.
#[derive(Clone)]
pub struct TargetSocket {
    inner: Rc<TargetInner>,
}

impl TargetSocket {
    /// Creates an unaddressed target socket with no attached device.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_inner(TargetInner {
            name: name.into(),
            address: Cell::new(None),
            host: RefCell::new(None),
            stub: false,
        })
    }

    /// Creates a target socket listening on `address`.
    #[must_use]
    pub fn with_address(name: impl Into<String>, address: u16) -> Self {
        let socket = Self::new(name);
        socket.set_address(address);
        socket
    }

    /// Returns the shared stub target.
    ///
    /// The stub has no address and no device and answers NACK to everything.
    /// All calls on one thread return the same instance.
    #[must_use]
    pub fn stub() -> Self {
        STUB_TARGET.with(Clone::clone)
    }

    fn from_inner(inner: TargetInner) -> Self {
        Self {
            inner: Rc::new(inner),
        }
    }

    /// Socket name used for lookup and logging.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Address this socket answers to, if one has been assigned.
    #[must_use]
    pub fn address(&self) -> Option<u16> {
        self.inner.address.get()
    }

    /// Assigns the bus address of this socket.
    ///
    /// # Panics
    ///
    /// Panics when called on the stub target, which is immutable.
    pub fn set_address(&self, address: u16) {
        assert!(
            !self.inner.stub,
            "stub target cannot be given address {address}"
        );
        self.inner.address.set(Some(address));
    }

    /// Attaches the device whose capabilities answer for this socket.
    ///
    /// # Panics
    ///
    /// Panics when called on the stub target, which never has a device.
    pub fn attach(&self, host: HostHandle) {
        assert!(!self.inner.stub, "stub target cannot have a device attached");
        *self.inner.host.borrow_mut() = Some(host);
    }

    /// Returns `true` when a device is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.host.borrow().is_some()
    }

    /// Returns `true` for the shared stub target.
    #[must_use]
    pub fn is_stub(&self) -> bool {
        self.inner.stub
    }

    /// Returns `true` when both handles refer to the same socket.
    #[must_use]
    pub fn same_socket(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Forwards a start condition to the attached device.
    #[must_use]
    pub fn start(&self, direction: Direction) -> Response {
        self.with_host("start", |host, socket| host.i2c_start(socket, direction))
            .unwrap_or(Response::Nack)
    }

    /// Forwards a stop condition to the attached device.
    #[must_use]
    pub fn stop(&self) -> Response {
        self.with_host("stop", |host, socket| host.i2c_stop(socket))
            .unwrap_or(Response::Nack)
    }

    /// Asks the attached device for one data byte.
    #[must_use]
    pub fn read(&self) -> (Response, u8) {
        self.with_host("read", |host, socket| host.i2c_read(socket))
            .unwrap_or((Response::Nack, 0))
    }

    /// Hands one data byte to the attached device.
    #[must_use]
    pub fn write(&self, data: u8) -> Response {
        self.with_host("write", |host, socket| host.i2c_write(socket, data))
            .unwrap_or(Response::Nack)
    }

    fn with_host<R>(
        &self,
        operation: &'static str,
        call: impl FnOnce(&mut dyn I2cHost, &Self) -> R,
    ) -> Option<R> {
        if self.inner.stub {
            return None;
        }

        // Release the slot borrow before entering the device.
        let host = self.inner.host.borrow().clone();
        let Some(host) = host else {
            warn!(socket = %self.name(), operation, "target socket has no device attached");
            return None;
        };

        let mut device = host.borrow_mut();
        Some(call(&mut *device, self))
    }

    pub(crate) fn downgrade(&self) -> TargetRef {
        TargetRef(Rc::downgrade(&self.inner))
    }
}

impl fmt::Debug for TargetSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetSocket")
            .field("name", &self.inner.name)
            .field("address", &self.inner.address.get())
            .field("attached", &self.is_attached())
            .field("stub", &self.inner.stub)
            .finish()
    }
}

/// Non-owning reference from an initiator's routing list to a target.
#[derive(Clone)]
pub(crate) struct TargetRef(Weak<TargetInner>);

impl TargetRef {
    pub(crate) fn upgrade(&self) -> Option<TargetSocket> {
        self.0.upgrade().map(|inner| TargetSocket { inner })
    }

    pub(crate) fn is_live(&self) -> bool {
        self.0.strong_count() > 0
    }

    pub(crate) fn refers_to(&self, socket: &TargetSocket) -> bool {
        Weak::ptr_eq(&self.0, &Rc::downgrade(&socket.inner))
    }
}
