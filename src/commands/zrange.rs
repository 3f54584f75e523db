use bytes::Bytes;

use crate::commands::executable::Executable;
use crate::commands::{parse_score, CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::{Limit, RangeBy, RangeQuery, Store};
use crate::zset::format_score;
use crate::Error;

/// Range query over a sorted set: by rank (the default), by score with
/// `BYSCORE`, or by lexicographic member bounds with `BYLEX`. `REV` reverses
/// score and lex ranges, `LIMIT offset count` trims the materialized output,
/// `WITHSCORES` interleaves each member with its score.
///
/// Ref: <https://redis.io/docs/latest/commands/zrange>
#[derive(Debug, PartialEq)]
pub struct ZRange {
    pub key: String,
    pub query: RangeQuery,
    pub with_scores: bool,
}

impl Executable for ZRange {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        let entries = match store.zrange(&self.key, &self.query) {
            Ok(entries) => entries,
            Err(err) => return Ok(Frame::Error(err.to_string())),
        };

        let capacity = if self.with_scores {
            entries.len() * 2
        } else {
            entries.len()
        };
        let mut frames = Vec::with_capacity(capacity);
        for (member, score) in entries {
            frames.push(Frame::Bulk(Bytes::from(member)));
            if self.with_scores {
                frames.push(Frame::Bulk(Bytes::from(format_score(score))));
            }
        }

        Ok(Frame::Array(frames))
    }
}

impl TryFrom<&mut CommandParser> for ZRange {
    type Error = Error;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_string()?;
        // Start and stop are interpreted once the range type is known.
        let start = parser.next_string()?;
        let stop = parser.next_string()?;

        let mut by_score = false;
        let mut by_lex = false;
        let mut rev = false;
        let mut with_scores = false;
        let mut limit = None;

        loop {
            let option = match parser.next_string() {
                Ok(option) => option,
                Err(CommandParserError::EndOfStream) => break,
                Err(err) => return Err(err.into()),
            };

            match option.to_uppercase().as_str() {
                "BYSCORE" => by_score = true,
                "BYLEX" => by_lex = true,
                "REV" => rev = true,
                "WITHSCORES" => with_scores = true,
                "LIMIT" => {
                    let offset = parser.next_integer()?;
                    let count = parser.next_integer()?;
                    limit = Some(Limit { offset, count });
                }
                _ => {
                    return Err(CommandParserError::InvalidCommandArgument {
                        command: "ZRANGE".to_string(),
                        argument: option,
                    }
                    .into())
                }
            }
        }

        if (by_score && by_lex) || (by_lex && with_scores) {
            return Err(CommandParserError::SyntaxError.into());
        }

        let by = if by_score {
            RangeBy::Score {
                min: parse_score(&start)?,
                max: parse_score(&stop)?,
            }
        } else if by_lex {
            RangeBy::Lex {
                min: start,
                max: stop,
            }
        } else {
            let start = start
                .parse::<i64>()
                .map_err(|_| CommandParserError::InvalidInteger)?;
            let stop = stop
                .parse::<i64>()
                .map_err(|_| CommandParserError::InvalidInteger)?;
            RangeBy::Rank { start, stop }
        };

        Ok(Self {
            key,
            query: RangeQuery { by, rev, limit },
            with_scores,
        })
    }
}
