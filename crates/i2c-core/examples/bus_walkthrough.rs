//! Walks one initiator through a shared bus with two scratchpad devices and an
//! unpopulated position, printing the transaction trace.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use i2c_core::{
    host_handle, Direction, I2cHost, InitiatorConfig, InitiatorSocket, RecordingTrace, Registry,
    Response, TargetArray, TargetSocket,
};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

/// Byte FIFO per address: writes queue bytes, reads drain them.
#[derive(Default)]
struct Scratchpad {
    queues: HashMap<u16, VecDeque<u8>>,
}

impl I2cHost for Scratchpad {
    fn i2c_start(&mut self, socket: &TargetSocket, _direction: Direction) -> Response {
        Response::from_ack(socket.address().is_some())
    }

    fn i2c_stop(&mut self, _socket: &TargetSocket) -> Response {
        Response::Ack
    }

    fn i2c_read(&mut self, socket: &TargetSocket) -> (Response, u8) {
        socket
            .address()
            .and_then(|address| self.queues.get_mut(&address))
            .and_then(VecDeque::pop_front)
            .map_or((Response::Nack, 0), |byte| (Response::Ack, byte))
    }

    fn i2c_write(&mut self, socket: &TargetSocket, data: u8) -> Response {
        let Some(address) = socket.address() else {
            return Response::Nack;
        };
        self.queues.entry(address).or_default().push_back(data);
        Response::Ack
    }
}

fn main() {
    let registry = Rc::new(RefCell::new(Registry::new()));
    let (_pad, handle) = host_handle(Scratchpad::default());

    let mut slots = TargetArray::with_registry("board.i2c_slots", registry.clone());
    let mut bus = InitiatorSocket::with_config(
        "board.i2c_bus",
        InitiatorConfig {
            tracing_enabled: true,
        },
    );
    let trace = Rc::new(RefCell::new(RecordingTrace::default()));
    bus.set_trace_sink(trace.clone());

    for (index, address) in [(0_usize, 0x50_u16), (1, 0x51)] {
        let slot = slots.at(index);
        slot.set_address(address);
        slot.attach(handle.clone());
        bus.bind(slot);
    }
    slots.stub(2);

    println!("start 0x50 for write: {}", bus.start(0x50, Direction::Write));
    for byte in b"hi" {
        println!("write {byte:#04x}: {}", bus.write(*byte));
    }
    println!("stop: {}", bus.stop());

    println!("start 0x50 for read: {}", bus.start(0x50, Direction::Read));
    let (_, first) = bus.read();
    let (_, second) = bus.read();
    let (exhausted, _) = bus.read();
    println!("stop: {}", bus.stop());

    // Position 2 is stubbed, so nothing answers at 0x52.
    match bus.start(0x52, Direction::Read) {
        Response::Ack => println!("start 0x52: unexpected ACK"),
        Response::Nack => println!("start 0x52: NACK, no device at this address"),
    }
    println!("stop while idle: {}", bus.stop());

    for record in &trace.borrow().records {
        println!("{record}");
    }
    println!(
        "read back {:?}, then {exhausted}",
        String::from_utf8_lossy(&[first, second])
    );
    for name in registry.borrow().names() {
        println!("registered {name}");
    }
}
