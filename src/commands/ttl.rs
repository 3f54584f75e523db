use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// TTL returns the remaining time to live of a key that has a timeout, in
/// whole seconds: −2 when the key does not exist, −1 when it carries no
/// deadline.
///
/// Ref: <https://redis.io/docs/latest/commands/ttl>
#[derive(Debug, PartialEq)]
pub struct Ttl {
    pub key: String,
}

impl Executable for Ttl {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        Ok(Frame::Integer(store.ttl(&self.key)))
    }
}

impl TryFrom<&mut CommandParser> for Ttl {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        Ok(Self { key })
    }
}
