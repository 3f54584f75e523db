use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::CommandParser;
use crate::frame::Frame;
use crate::pattern::Pattern;
use crate::store::Store;
use crate::Error;

// https://redis.io/docs/latest/commands/keys
#[derive(Debug, PartialEq)]
pub struct Keys {
    pub pattern: String,
}

impl Executable for Keys {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let pattern = Pattern::new(&self.pattern);

        let keys = store
            .keys(&pattern)
            .into_iter()
            .map(|key| Frame::Bulk(Bytes::from(key)))
            .collect();

        Ok(Frame::Array(keys))
    }
}

impl TryFrom<&mut CommandParser> for Keys {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let pattern = parser.next_string()?;
        Ok(Self { pattern })
    }
}
