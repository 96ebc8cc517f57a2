//! Property coverage for payload rendering and the initiator state machine.

#![allow(clippy::pedantic, clippy::nursery)]

use std::cell::RefCell;
use std::rc::Rc;

use i2c_core::{
    failed, host_handle, success, BusState, Command, CommandToken, Direction, I2cHost,
    InitiatorSocket, Payload, Response, TargetArray, TargetSocket,
};
use proptest::prelude::*;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

/// Device double answering from a fixed response and counting calls.
#[derive(Default)]
struct Counter {
    starts: usize,
    stops: usize,
    transfers: Vec<u8>,
    response: Option<Response>,
}

impl Counter {
    fn total(&self) -> usize {
        self.starts + self.stops + self.transfers.len()
    }

    fn respond(&self) -> Response {
        self.response.unwrap_or(Response::Ack)
    }
}

impl I2cHost for Counter {
    fn i2c_start(&mut self, _socket: &TargetSocket, _direction: Direction) -> Response {
        self.starts += 1;
        self.respond()
    }

    fn i2c_stop(&mut self, _socket: &TargetSocket) -> Response {
        self.stops += 1;
        self.respond()
    }

    fn i2c_read(&mut self, _socket: &TargetSocket) -> (Response, u8) {
        self.transfers.push(0);
        (self.respond(), 0)
    }

    fn i2c_write(&mut self, _socket: &TargetSocket, data: u8) -> Response {
        self.transfers.push(data);
        self.respond()
    }
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Start(Direction::Read)),
        Just(Command::Start(Direction::Write)),
        Just(Command::Data),
        Just(Command::Stop),
    ]
}

fn response() -> impl Strategy<Value = Response> {
    prop_oneof![Just(Response::Ack), Just(Response::Nack)]
}

fn addressed(address: u16, response: Option<Response>) -> (Rc<RefCell<Counter>>, TargetSocket) {
    let (device, handle) = host_handle(Counter {
        response,
        ..Counter::default()
    });
    let target = TargetSocket::with_address(format!("dev@{address}"), address);
    target.attach(handle);
    (device, target)
}

proptest! {
    #[test]
    fn rendering_matches_format_and_tokens_round_trip(
        command in command(),
        response in response(),
        data in any::<u8>(),
    ) {
        let tx = Payload { command, response, data };
        let rendered = tx.to_string();

        let (token, rest) = rendered.split_once(" [").expect("token separator");
        let (hex, rest) = rest.split_once("] (").expect("data separator");
        let resp = rest.strip_suffix(')').expect("closing paren");

        prop_assert_eq!(token.parse::<CommandToken>(), Ok(command.token()));
        prop_assert_eq!(resp.parse::<Response>(), Ok(response));
        prop_assert_eq!(hex.len(), 2);
        prop_assert_eq!(hex, hex.to_lowercase());
        prop_assert_eq!(u8::from_str_radix(hex, 16), Ok(data));
    }

    #[test]
    fn success_and_failed_are_complements_decided_by_response(
        command in command(),
        response in response(),
        data in any::<u8>(),
    ) {
        let tx = Payload { command, response, data };
        prop_assert_ne!(success(&tx), failed(&tx));
        prop_assert_eq!(success(&tx), response == Response::Ack);
    }

    #[test]
    fn unbound_address_never_reaches_a_device(
        bound in prop::collection::btree_set(0_u16..128, 1..6),
        probe in 0_u16..128,
    ) {
        prop_assume!(!bound.contains(&probe));
        let sockets: Vec<_> = bound.iter().map(|a| addressed(*a, None)).collect();
        let mut out = InitiatorSocket::new("out");
        for (_, target) in &sockets {
            out.bind(target);
        }

        prop_assert_eq!(out.start(probe, Direction::Read), Response::Nack);
        prop_assert_eq!(out.write(0xff), Response::Nack);
        prop_assert!(sockets.iter().all(|(dev, _)| dev.borrow().total() == 0));
    }

    #[test]
    fn start_result_is_the_device_result(response in response(), direction in prop_oneof![Just(Direction::Read), Just(Direction::Write)]) {
        let (dev, target) = addressed(9, Some(response));
        let mut out = InitiatorSocket::new("out");
        out.bind(&target);

        prop_assert_eq!(out.start(9, direction), response);
        prop_assert_eq!(dev.borrow().starts, 1);
        prop_assert_eq!(out.state() == BusState::Idle, response == Response::Nack);
    }

    #[test]
    fn transfers_are_forwarded_in_order_and_stop_closes(
        bytes in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let (dev, target) = addressed(0x21, None);
        let mut out = InitiatorSocket::new("out");
        out.bind(&target);

        prop_assert_eq!(out.start(0x21, Direction::Write), Response::Ack);
        for byte in &bytes {
            prop_assert_eq!(out.write(*byte), Response::Ack);
        }
        prop_assert_eq!(&dev.borrow().transfers, &bytes);

        prop_assert_eq!(out.stop(), Response::Ack);
        prop_assert_eq!(out.write(0), Response::Nack);
        prop_assert_eq!(out.stop(), Response::Nack);
        prop_assert_eq!(dev.borrow().stops, 1);
        prop_assert_eq!(dev.borrow().transfers.len(), bytes.len());
    }

    #[test]
    fn multi_bind_routes_by_address(
        bound in prop::collection::btree_set(0_u16..1024, 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let sockets: Vec<_> = bound.iter().map(|a| addressed(*a, None)).collect();
        let mut out = InitiatorSocket::new("out");
        for (_, target) in &sockets {
            out.bind(target);
        }
        let chosen = pick.index(sockets.len());
        let address = sockets[chosen].1.address().expect("assigned");

        prop_assert_eq!(out.start(address, Direction::Write), Response::Ack);
        prop_assert_eq!(out.write(0x42), Response::Ack);
        for (index, (dev, _)) in sockets.iter().enumerate() {
            let expected = if index == chosen { 2 } else { 0 };
            prop_assert_eq!(dev.borrow().total(), expected);
        }
    }

    #[test]
    fn collection_creates_once_and_stub_refuses(
        indices in prop::collection::vec(0_usize..64, 1..12),
        stubbed in 0_usize..64,
    ) {
        let mut array = TargetArray::new("ins");
        for index in &indices {
            let first = array.at(*index).clone();
            let again = array.at(*index).clone();
            prop_assert!(first.same_socket(&again));
            prop_assert_eq!(first.name(), format!("ins[{index}]"));
        }

        array.stub(stubbed);
        let stub = array.at(stubbed).clone();
        prop_assert!(stub.is_stub());
        prop_assert_eq!(stub.start(Direction::Write), Response::Nack);
        prop_assert_eq!(stub.stop(), Response::Nack);
        prop_assert_eq!(stub.read(), (Response::Nack, 0));
        prop_assert_eq!(stub.write(1), Response::Nack);
    }
}
