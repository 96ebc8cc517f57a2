//! Transaction vocabulary: commands, responses and the per-call payload.
//!
//! Payloads are built fresh for every socket call and only live long enough to
//! be traced and answered. Success is decided by the response alone.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Transfer intent announced by a start condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Direction {
    /// Target will drive data bytes back to the initiator.
    Read,
    /// Initiator will drive data bytes to the target.
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
        })
    }
}

/// Bus command carried by a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Command {
    /// Start condition plus address phase with the given transfer intent.
    Start(Direction),
    /// One data byte transfer.
    Data,
    /// Stop condition releasing the bus.
    Stop,
}

impl Command {
    /// Returns the textual token class of this command.
    ///
    /// Both start intents collapse onto [`CommandToken::Start`].
    #[must_use]
    pub const fn token(self) -> CommandToken {
        match self {
            Self::Start(_) => CommandToken::Start,
            Self::Data => CommandToken::Data,
            Self::Stop => CommandToken::Stop,
        }
    }

    /// Returns the start intent, if this is a start command.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Start(direction) => Some(direction),
            Self::Data | Self::Stop => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token().fmt(f)
    }
}

/// Rendered form of a [`Command`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandToken {
    /// `START`
    Start,
    /// `DATA`
    Data,
    /// `STOP`
    Stop,
}

impl CommandToken {
    /// Returns the fixed textual token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Data => "DATA",
            Self::Stop => "STOP",
        }
    }
}

impl fmt::Display for CommandToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "START" => Ok(Self::Start),
            "DATA" => Ok(Self::Data),
            "STOP" => Ok(Self::Stop),
            _ => Err(TokenError::UnknownCommand(s.to_owned())),
        }
    }
}

/// Binary transaction outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Response {
    /// Acknowledged.
    Ack = 0x00,
    /// Not acknowledged.
    Nack = 0x01,
}

impl Response {
    /// Returns `true` for [`Response::Ack`].
    #[must_use]
    pub const fn is_ack(self) -> bool {
        matches!(self, Self::Ack)
    }

    /// Returns `true` for [`Response::Nack`].
    #[must_use]
    pub const fn is_nack(self) -> bool {
        !self.is_ack()
    }

    /// Maps a boolean acknowledge line to a response.
    #[must_use]
    pub const fn from_ack(ack: bool) -> Self {
        if ack {
            Self::Ack
        } else {
            Self::Nack
        }
    }

    /// Stable raw code.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a raw code back into a response; unknown codes are rejected.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x00 => Some(Self::Ack),
            0x01 => Some(Self::Nack),
            _ => None,
        }
    }

    /// Returns the fixed textual token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ack => "ACK",
            Self::Nack => "NACK",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Response {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACK" => Ok(Self::Ack),
            "NACK" => Ok(Self::Nack),
            _ => Err(TokenError::UnknownResponse(s.to_owned())),
        }
    }
}

/// Error returned when parsing a rendered token fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Text is not one of `START`, `DATA` or `STOP`.
    #[error("unknown command token '{0}'")]
    UnknownCommand(String),
    /// Text is not one of `ACK` or `NACK`.
    #[error("unknown response token '{0}'")]
    UnknownResponse(String),
}

/// One bus transaction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Payload {
    /// Command being issued.
    pub command: Command,
    /// Outcome reported by the addressed target.
    pub response: Response,
    /// Data byte; only meaningful for [`Command::Data`].
    pub data: u8,
}

impl Payload {
    /// Creates a payload that nobody has acknowledged yet.
    #[must_use]
    pub const fn new(command: Command, data: u8) -> Self {
        Self {
            command,
            response: Response::Nack,
            data,
        }
    }

    /// Returns `true` when the response is [`Response::Ack`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.response.is_ack()
    }

    /// Returns `true` when the response is not [`Response::Ack`].
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:02x}] ({})", self.command, self.data, self.response)
    }
}

/// Returns `true` when `payload` was acknowledged.
#[must_use]
pub const fn success(payload: &Payload) -> bool {
    payload.is_success()
}

/// Returns `true` when `payload` was not acknowledged.
#[must_use]
pub const fn failed(payload: &Payload) -> bool {
    payload.is_failed()
}
