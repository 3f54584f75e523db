use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Introspection stub: always replies with an empty array, which is enough
/// for clients that probe the command table on connect. Subcommand arguments
/// are accepted and ignored.
///
/// Ref: <https://redis.io/docs/latest/commands/command>
#[derive(Debug, PartialEq)]
pub struct CommandInfo;

impl Executable for CommandInfo {
    fn exec(self, _store: Store) -> Result<Frame, Error> {
        Ok(Frame::Array(vec![]))
    }
}

impl TryFrom<&mut CommandParser> for CommandInfo {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        loop {
            match parser.next_string() {
                Ok(_) => continue,
                Err(CommandParserError::EndOfStream) => return Ok(Self),
                Err(err) => return Err(err.into()),
            }
        }
    }
}
