pub mod command;
pub mod del;
pub mod echo;
pub mod executable;
pub mod expire;
pub mod get;
pub mod keys;
pub mod ping;
pub mod set;
pub mod ttl;
pub mod zadd;
pub mod zrange;

use std::{str, vec};

use bytes::Bytes;
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

use command::CommandInfo;
use del::Del;
use echo::Echo;
use expire::Expire;
use get::Get;
use keys::Keys;
use ping::Ping;
use set::Set;
use ttl::Ttl;
use zadd::ZAdd;
use zrange::ZRange;

#[derive(Debug, PartialEq)]
pub enum Command {
    Ping(Ping),
    Echo(Echo),
    Set(Set),
    Get(Get),
    Del(Del),
    Expire(Expire),
    Ttl(Ttl),
    Keys(Keys),
    ZAdd(ZAdd),
    ZRange(ZRange),
    Command(CommandInfo),
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Ping(cmd) => cmd.exec(store),
            Command::Echo(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::Del(cmd) => cmd.exec(store),
            Command::Expire(cmd) => cmd.exec(store),
            Command::Ttl(cmd) => cmd.exec(store),
            Command::Keys(cmd) => cmd.exec(store),
            Command::ZAdd(cmd) => cmd.exec(store),
            Command::ZRange(cmd) => cmd.exec(store),
            Command::Command(cmd) => cmd.exec(store),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = Error;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the server as non-empty arrays of bulk
        // strings. Anything else desynchronizes the stream and is treated as
        // invalid request framing by the connection handler.
        let frames = match frame {
            Frame::Array(frames) if !frames.is_empty() => frames,
            frame => {
                return Err(CommandParserError::InvalidRequestFrame { actual: frame }.into());
            }
        };

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;

        match &command_name[..] {
            "PING" => Ping::try_from(parser).map(Command::Ping),
            "ECHO" => Echo::try_from(parser).map(Command::Echo),
            "SET" => Set::try_from(parser).map(Command::Set),
            "GET" => Get::try_from(parser).map(Command::Get),
            "DEL" => Del::try_from(parser).map(Command::Del),
            "EXPIRE" => Expire::try_from(parser).map(Command::Expire),
            "TTL" => Ttl::try_from(parser).map(Command::Ttl),
            "KEYS" => Keys::try_from(parser).map(Command::Keys),
            "ZADD" => ZAdd::try_from(parser).map(Command::ZAdd),
            "ZRANGE" => ZRange::try_from(parser).map(Command::ZRange),
            "COMMAND" => CommandInfo::try_from(parser).map(Command::Command),
            name => Err(CommandParserError::UnknownCommand {
                command: name.to_string(),
            }
            .into()),
        }
    }
}

pub struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    /// Command names are case-insensitive on input; canonicalize to upper
    /// case before dispatch.
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        self.next_string().map(|name| name.to_uppercase())
    }

    fn next_string(&mut self) -> Result<String, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            // Both `Simple` and `Bulk` representations may be strings.
            Frame::Simple(s) => Ok(s),
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_string())
                .map_err(CommandParserError::InvalidUTF8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Simple(s) => Ok(Bytes::from(s)),
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "simple or bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn next_integer(&mut self) -> Result<i64, CommandParserError> {
        self.next_string()?
            .parse::<i64>()
            .map_err(|_| CommandParserError::InvalidInteger)
    }
}

/// Parses a sorted-set score. NaN is not a valid score.
pub(crate) fn parse_score(input: &str) -> Result<f64, CommandParserError> {
    match input.parse::<f64>() {
        Ok(score) if !score.is_nan() => Ok(score),
        _ => Err(CommandParserError::InvalidFloat),
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("protocol error; expected array of bulk strings, got {actual}")]
    InvalidRequestFrame { actual: Frame },
    #[error("protocol error; invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("protocol error; invalid UTF-8 string")]
    InvalidUTF8String(#[from] str::Utf8Error),
    #[error("protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
    #[error("value is not an integer or out of range")]
    InvalidInteger,
    #[error("value is not a valid float")]
    InvalidFloat,
    #[error("syntax error")]
    SyntaxError,
    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("invalid argument '{argument}' for '{command}' command")]
    InvalidCommandArgument { command: String, argument: String },
}
