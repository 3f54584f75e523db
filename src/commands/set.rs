use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{SetCond, SetExpiry, SetOptions, Store};
use crate::Error;

/// Stores a string value under a key.
///
/// `NX`/`XX` gate the write on key absence/presence, `GET` returns the prior
/// value, and `EX`/`PX`/`EXAT`/`PXAT`/`KEEPTTL` control the deadline. When
/// several expiry options appear the last one wins.
///
/// Ref: <https://redis.io/docs/latest/commands/set>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: Bytes,
    pub opts: SetOptions,
}

impl Executable for Set {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let Set { key, value, opts } = self;

        match store.set(key, value, &opts) {
            Ok(prior) => {
                if opts.get {
                    Ok(prior.map(Frame::Bulk).unwrap_or(Frame::Null))
                } else {
                    Ok(Frame::Simple("OK".to_string()))
                }
            }
            Err(err) => Ok(Frame::Error(err.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let value = parser.next_bytes()?;

        let mut opts = SetOptions::default();

        loop {
            let option = match parser.next_string() {
                Ok(option) => option,
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            };

            match option.to_uppercase().as_str() {
                "NX" => match opts.cond {
                    Some(SetCond::Xx) => return Err(CommandParserError::SyntaxError.into()),
                    _ => opts.cond = Some(SetCond::Nx),
                },
                "XX" => match opts.cond {
                    Some(SetCond::Nx) => return Err(CommandParserError::SyntaxError.into()),
                    _ => opts.cond = Some(SetCond::Xx),
                },
                "GET" => opts.get = true,

                "EX" => opts.expiry = Some(SetExpiry::Ex(parser.next_integer()?)),
                "PX" => opts.expiry = Some(SetExpiry::Px(parser.next_integer()?)),
                "EXAT" => opts.expiry = Some(SetExpiry::ExAt(parser.next_integer()?)),
                "PXAT" => opts.expiry = Some(SetExpiry::PxAt(parser.next_integer()?)),
                "KEEPTTL" => opts.expiry = Some(SetExpiry::KeepTtl),

                _ => {
                    return Err(CommandParserError::InvalidCommandArgument {
                        command: "SET".to_string(),
                        argument: option,
                    }
                    .into())
                }
            }
        }

        Ok(Self { key, value, opts })
    }
}
