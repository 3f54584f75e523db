use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{parse_score, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{Store, ZAddOptions, ZAddReply};
use crate::zset::format_score;
use crate::Error;

/// Adds score/member pairs to a sorted set.
///
/// Options are consumed from the front of the argument list; the pairs begin
/// at the first argument that is not a recognized option. `NX`/`XX` gate on
/// member presence, `GT`/`LT` on score comparison, `CH` switches the reply
/// to the changed count, and `INCR` turns the single pair into an increment
/// whose new score is returned (null when gated by `NX`/`XX`).
///
/// Ref: <https://redis.io/docs/latest/commands/zadd>
#[derive(Debug, PartialEq)]
pub struct ZAdd {
    pub key: String,
    pub pairs: Vec<(f64, String)>,
    pub opts: ZAddOptions,
}

impl Executable for ZAdd {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match store.zadd(&self.key, &self.pairs, &self.opts) {
            Ok(ZAddReply::Count(count)) => Ok(Frame::Integer(count)),
            Ok(ZAddReply::Incr(Some(score))) => Ok(Frame::Bulk(Bytes::from(format_score(score)))),
            Ok(ZAddReply::Incr(None)) => Ok(Frame::Null),
            Err(err) => Ok(Frame::Error(err.to_string())),
        }
    }
}

impl TryFrom<&mut CommandParser> for ZAdd {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;

        let mut args = Vec::new();
        loop {
            match parser.next_string() {
                Ok(arg) => args.push(arg),
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            }
        }

        let mut opts = ZAddOptions::default();
        let mut index = 0;
        while index < args.len() {
            match args[index].to_uppercase().as_str() {
                "NX" => opts.nx = true,
                "XX" => opts.xx = true,
                "GT" => opts.gt = true,
                "LT" => opts.lt = true,
                "CH" => opts.ch = true,
                "INCR" => opts.incr = true,
                _ => break,
            }
            index += 1;
        }

        if (opts.nx && opts.xx)
            || (opts.gt && opts.lt)
            || (opts.nx && (opts.gt || opts.lt))
            || (opts.incr && (opts.gt || opts.lt))
        {
            return Err(CommandParserError::SyntaxError.into());
        }

        let rest = &args[index..];
        if rest.is_empty() || rest.len() % 2 != 0 {
            return Err(CommandParserError::SyntaxError.into());
        }

        let mut pairs = Vec::with_capacity(rest.len() / 2);
        for pair in rest.chunks(2) {
            let score = parse_score(&pair[0])?;
            pairs.push((score, pair[1].clone()));
        }

        Ok(Self { key, pairs, opts })
    }
}
