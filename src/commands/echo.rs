use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Returns the message untouched. Binary-safe: the payload is carried as raw
/// bytes end to end.
///
/// Ref: <https://redis.io/docs/latest/commands/echo>
#[derive(Debug, PartialEq)]
pub struct Echo {
    pub msg: Bytes,
}

impl Executable for Echo {
    fn exec(self, _store: Store) -> Result<Frame, Error> {
        Ok(Frame::Bulk(self.msg))
    }
}

impl TryFrom<&mut CommandParser> for Echo {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let msg = parser.next_bytes()?;
        Ok(Self { msg })
    }
}
