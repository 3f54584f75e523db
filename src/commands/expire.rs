use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{ExpireOptions, Store};
use crate::Error;

/// Sets a deadline on an existing key, `seconds` from now. A non-positive
/// value deletes the key immediately. `NX` requires the key to carry no
/// deadline, `XX` requires one, `GT`/`LT` only replace the deadline when the
/// new one is further out / sooner.
///
/// Ref: <https://redis.io/docs/latest/commands/expire>
#[derive(Debug, PartialEq)]
pub struct Expire {
    pub key: String,
    pub seconds: i64,
    pub opts: ExpireOptions,
}

impl Executable for Expire {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match store.expire(&self.key, self.seconds, &self.opts) {
            Ok(()) => Ok(Frame::Integer(1)),
            Err(err) => Ok(Frame::Error(err.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for Expire {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        let seconds = parser.next_integer()?;

        let mut opts = ExpireOptions::default();

        loop {
            let option = match parser.next_string() {
                Ok(option) => option,
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            };

            match option.to_uppercase().as_str() {
                "NX" => opts.nx = true,
                "XX" => opts.xx = true,
                "GT" => opts.gt = true,
                "LT" => opts.lt = true,
                _ => {
                    return Err(CommandParserError::InvalidCommandArgument {
                        command: "EXPIRE".to_string(),
                        argument: option,
                    }
                    .into())
                }
            }
        }

        // NX stands alone; GT and LT contradict each other.
        if (opts.nx && (opts.xx || opts.gt || opts.lt)) || (opts.gt && opts.lt) {
            return Err(CommandParserError::SyntaxError.into());
        }

        Ok(Self { key, seconds, opts })
    }
}
