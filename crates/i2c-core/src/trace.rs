//! Transaction trace hooks.
//!
//! Initiators with tracing enabled emit one record when a payload goes out and
//! one when its response comes back.

use std::fmt;

use tracing::debug;

use crate::{Payload, SimTime};

/// Which leg of a transaction a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TraceDirection {
    /// Payload leaving the initiator, response not yet known.
    Forward,
    /// Payload returning with its final response.
    Backward,
}

impl TraceDirection {
    const fn arrow(self) -> &'static str {
        match self {
            Self::Forward => ">>",
            Self::Backward => "<<",
        }
    }
}

/// One traced transaction leg.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct TraceRecord {
    /// Simulation time when the leg was observed.
    pub time: SimTime,
    /// Name of the initiator socket that issued the payload.
    pub socket: String,
    /// Transaction leg.
    pub direction: TraceDirection,
    /// Payload snapshot.
    pub payload: Payload,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {}",
            self.time,
            self.socket,
            self.direction.arrow(),
            self.payload
        )
    }
}

/// Receiver for trace records in issue order.
pub trait TraceSink {
    /// Records one transaction leg.
    fn on_record(&mut self, record: &TraceRecord);
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct RecordingTrace {
    /// Records in the order they were emitted.
    pub records: Vec<TraceRecord>,
}

impl TraceSink for RecordingTrace {
    fn on_record(&mut self, record: &TraceRecord) {
        self.records.push(record.clone());
    }
}

/// Forwards records to the `tracing` subscriber at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTrace;

impl TraceSink for LogTrace {
    fn on_record(&mut self, record: &TraceRecord) {
        debug!(
            socket = %record.socket,
            time = record.time.as_picos(),
            direction = ?record.direction,
            "{}",
            record.payload
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordingTrace, TraceDirection, TraceRecord, TraceSink};
    use crate::{Command, Payload, Response, SimTime};

    #[test]
    fn record_renders_time_socket_arrow_and_payload() {
        let record = TraceRecord {
            time: SimTime(10),
            socket: "bench.i2c_out".to_owned(),
            direction: TraceDirection::Backward,
            payload: Payload {
                command: Command::Data,
                response: Response::Ack,
                data: 0xab,
            },
        };
        assert_eq!(
            record.to_string(),
            "[10ps] bench.i2c_out << DATA [ab] (ACK)"
        );
    }

    #[test]
    fn recording_trace_keeps_issue_order() {
        let mut sink = RecordingTrace::default();
        for direction in [TraceDirection::Forward, TraceDirection::Backward] {
            sink.on_record(&TraceRecord {
                time: SimTime::ZERO,
                socket: "out".to_owned(),
                direction,
                payload: Payload::new(Command::Stop, 0),
            });
        }

        let directions: Vec<_> = sink.records.iter().map(|r| r.direction).collect();
        assert_eq!(
            directions,
            vec![TraceDirection::Forward, TraceDirection::Backward]
        );
    }
}
