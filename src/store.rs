use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use thiserror::Error as ThisError;

use crate::pattern::Pattern;
use crate::zset::SortedSet;

/// A stored value: an opaque byte string or a sorted set.
pub enum Value {
    String(Bytes),
    SortedSet(SortedSet),
}

/// Errors surfaced by store operations. The first word of the rendered
/// message is the wire error kind (`ERR`, `WRONGTYPE`, `NOKEY`).
#[derive(Debug, ThisError, PartialEq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("NOKEY no such key")]
    NoSuchKey,
    #[error("ERR key already exists")]
    KeyExists,
    #[error("ERR key does not exist")]
    KeyMissing,
    #[error("ERR key already has an expiry")]
    ExpiryExists,
    #[error("ERR key has no expiry")]
    NoExpiry,
    #[error("ERR new expiry is not greater than current one")]
    ExpiryNotGreater,
    #[error("ERR new expiry is not less than current one")]
    ExpiryNotLess,
    #[error("ERR {0}")]
    Invalid(&'static str),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SetCond {
    /// Only set when the key does not exist.
    Nx,
    /// Only set when the key already exists.
    Xx,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SetExpiry {
    /// Relative, in seconds.
    Ex(i64),
    /// Relative, in milliseconds.
    Px(i64),
    /// Absolute unix timestamp, in seconds.
    ExAt(i64),
    /// Absolute unix timestamp, in milliseconds.
    PxAt(i64),
    /// Keep whatever deadline the key already carries.
    KeepTtl,
}

#[derive(Debug, PartialEq, Eq, Default)]
pub struct SetOptions {
    pub cond: Option<SetCond>,
    pub get: bool,
    pub expiry: Option<SetExpiry>,
}

#[derive(Debug, PartialEq, Eq, Default)]
pub struct ExpireOptions {
    pub nx: bool,
    pub xx: bool,
    pub gt: bool,
    pub lt: bool,
}

#[derive(Debug, PartialEq, Eq, Default)]
pub struct ZAddOptions {
    pub nx: bool,
    pub xx: bool,
    pub gt: bool,
    pub lt: bool,
    pub ch: bool,
    pub incr: bool,
}

#[derive(Debug, PartialEq)]
pub enum ZAddReply {
    /// Number of added pairs, or of changed pairs under `CH`.
    Count(i64),
    /// New score under `INCR`; `None` when `NX`/`XX` gating suppressed the
    /// write.
    Incr(Option<f64>),
}

#[derive(Debug, PartialEq)]
pub enum RangeBy {
    Rank { start: i64, stop: i64 },
    Score { min: f64, max: f64 },
    Lex { min: String, max: String },
}

#[derive(Debug, PartialEq, Eq)]
pub struct Limit {
    pub offset: i64,
    pub count: i64,
}

#[derive(Debug, PartialEq)]
pub struct RangeQuery {
    pub by: RangeBy,
    pub rev: bool,
    pub limit: Option<Limit>,
}

/// Shared, typed key-value store.
///
/// Cloning the handle shares the underlying state. Read-only operations
/// (`ttl`, `keys`, `zrange`) take the read lock and treat expired keys as
/// absent without touching the maps; everything else takes the write lock
/// and reclaims expired entries on the way, so lazy expiration never races
/// a concurrent reader. Each public operation holds the lock for its whole
/// duration and is therefore atomic with respect to other commands.
#[derive(Clone)]
pub struct Store {
    state: Arc<RwLock<State>>,
}

struct State {
    data: HashMap<String, Value>,
    expirations: HashMap<String, SystemTime>,
}

impl Store {
    pub fn new() -> Store {
        Store {
            state: Arc::new(RwLock::new(State {
                data: HashMap::new(),
                expirations: HashMap::new(),
            })),
        }
    }

    /// Value of `key`, or `None` when absent or expired.
    pub fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let mut state = self.state.write().unwrap();
        state.reclaim_if_expired(key);

        match state.data.get(key) {
            None => Ok(None),
            Some(Value::String(bytes)) => Ok(Some(bytes.clone())),
            Some(Value::SortedSet(_)) => Err(StoreError::WrongType),
        }
    }

    /// Stores `key → value`, subject to `NX`/`XX` gating.
    ///
    /// Returns the prior string value, which the SET command surfaces when
    /// its `GET` sub-option is present. Without an expiry option any
    /// existing deadline is cleared; `KEEPTTL` preserves it.
    pub fn set(
        &self,
        key: String,
        value: Bytes,
        opts: &SetOptions,
    ) -> Result<Option<Bytes>, StoreError> {
        match opts.expiry {
            Some(SetExpiry::Ex(n)) | Some(SetExpiry::Px(n)) if n <= 0 => {
                return Err(StoreError::Invalid("invalid expire time"));
            }
            _ => {}
        }

        let mut state = self.state.write().unwrap();
        let now = SystemTime::now();
        state.reclaim_if_expired(&key);

        let exists = state.data.contains_key(&key);
        match opts.cond {
            Some(SetCond::Nx) if exists => return Err(StoreError::KeyExists),
            Some(SetCond::Xx) if !exists => return Err(StoreError::KeyMissing),
            _ => {}
        }

        let prior = if opts.get {
            match state.data.get(&key) {
                Some(Value::String(bytes)) => Some(bytes.clone()),
                Some(Value::SortedSet(_)) => return Err(StoreError::WrongType),
                None => None,
            }
        } else {
            None
        };

        match opts.expiry {
            None => {
                state.expirations.remove(&key);
            }
            Some(SetExpiry::KeepTtl) => {}
            Some(SetExpiry::Ex(secs)) => {
                state
                    .expirations
                    .insert(key.clone(), now + Duration::from_secs(secs as u64));
            }
            Some(SetExpiry::Px(millis)) => {
                state
                    .expirations
                    .insert(key.clone(), now + Duration::from_millis(millis as u64));
            }
            Some(SetExpiry::ExAt(timestamp)) => {
                let deadline = UNIX_EPOCH + Duration::from_secs(timestamp.max(0) as u64);
                state.expirations.insert(key.clone(), deadline);
            }
            Some(SetExpiry::PxAt(timestamp)) => {
                let deadline = UNIX_EPOCH + Duration::from_millis(timestamp.max(0) as u64);
                state.expirations.insert(key.clone(), deadline);
            }
        }

        state.data.insert(key, Value::String(value));

        Ok(prior)
    }

    /// Removes keys, returning how many were live and actually deleted.
    pub fn del(&self, keys: &[String]) -> i64 {
        let mut state = self.state.write().unwrap();

        let mut removed = 0;
        for key in keys {
            state.reclaim_if_expired(key);
            if state.data.remove(key).is_some() {
                state.expirations.remove(key);
                removed += 1;
            }
        }

        removed
    }

    /// Sets the deadline of `key` to now + `seconds`, subject to option
    /// gating. A non-positive `seconds` deletes the key outright.
    pub fn expire(
        &self,
        key: &str,
        seconds: i64,
        opts: &ExpireOptions,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap();
        let now = SystemTime::now();
        state.reclaim_if_expired(key);

        if !state.data.contains_key(key) {
            return Err(StoreError::NoSuchKey);
        }

        let current = state
            .expirations
            .get(key)
            .copied()
            .filter(|deadline| *deadline > now);

        if opts.nx && current.is_some() {
            return Err(StoreError::ExpiryExists);
        }
        if opts.xx && current.is_none() {
            return Err(StoreError::NoExpiry);
        }

        let new_deadline = deadline_after(now, seconds);
        if opts.gt {
            if let Some(current) = current {
                if new_deadline <= current {
                    return Err(StoreError::ExpiryNotGreater);
                }
            }
        }
        if opts.lt {
            if let Some(current) = current {
                if new_deadline >= current {
                    return Err(StoreError::ExpiryNotLess);
                }
            }
        }

        if seconds <= 0 {
            state.data.remove(key);
            state.expirations.remove(key);
            return Ok(());
        }

        state.expirations.insert(key.to_owned(), new_deadline);
        Ok(())
    }

    /// Remaining time to live in whole seconds: −2 when the key is absent
    /// (including lazily expired), −1 when it carries no deadline.
    pub fn ttl(&self, key: &str) -> i64 {
        let state = self.state.read().unwrap();
        let now = SystemTime::now();

        if !state.live_at(key, now) {
            return -2;
        }

        match state.expirations.get(key) {
            None => -1,
            Some(deadline) => match deadline.duration_since(now) {
                Ok(remaining) => remaining.as_secs() as i64,
                Err(_) => -2,
            },
        }
    }

    /// Live keys matching `pattern`, in no particular order.
    pub fn keys(&self, pattern: &Pattern) -> Vec<String> {
        let state = self.state.read().unwrap();
        let now = SystemTime::now();

        state
            .data
            .keys()
            .filter(|key| !state.expired_at(key, now) && pattern.matches(key))
            .cloned()
            .collect()
    }

    /// Applies score/member pairs to the sorted set at `key`, creating it
    /// when absent. Option gating is per pair; under `INCR` the single
    /// pair's score is added to the member's current score.
    pub fn zadd(
        &self,
        key: &str,
        pairs: &[(f64, String)],
        opts: &ZAddOptions,
    ) -> Result<ZAddReply, StoreError> {
        if opts.incr && pairs.len() != 1 {
            return Err(StoreError::Invalid(
                "INCR option requires exactly one score-member pair",
            ));
        }

        let mut state = self.state.write().unwrap();
        state.reclaim_if_expired(key);

        let value = state
            .data
            .entry(key.to_owned())
            .or_insert_with(|| Value::SortedSet(SortedSet::new()));
        let set = match value {
            Value::SortedSet(set) => set,
            Value::String(_) => return Err(StoreError::WrongType),
        };

        if opts.incr {
            let (delta, member) = &pairs[0];
            let old_score = set.score(member);

            if (opts.nx && old_score.is_some()) || (opts.xx && old_score.is_none()) {
                return Ok(ZAddReply::Incr(None));
            }

            let new_score = old_score.unwrap_or(0.0) + delta;
            if new_score.is_nan() {
                return Err(StoreError::Invalid("resulting score is not a number (NaN)"));
            }

            set.upsert(member, new_score);
            return Ok(ZAddReply::Incr(Some(new_score)));
        }

        let mut added = 0;
        let mut changed = 0;
        for (score, member) in pairs {
            let old_score = set.score(member);

            if opts.nx && old_score.is_some() {
                continue;
            }
            if opts.xx && old_score.is_none() {
                continue;
            }
            if opts.gt && old_score.is_some_and(|old| *score <= old) {
                continue;
            }
            if opts.lt && old_score.is_some_and(|old| *score >= old) {
                continue;
            }

            let outcome = set.upsert(member, *score);
            if outcome.added {
                added += 1;
            }
            if outcome.changed {
                changed += 1;
            }
        }

        Ok(ZAddReply::Count(if opts.ch { changed } else { added }))
    }

    /// Range query over the sorted set at `key`. An absent (or expired) key
    /// yields an empty result rather than an error.
    pub fn zrange(&self, key: &str, query: &RangeQuery) -> Result<Vec<(String, f64)>, StoreError> {
        let state = self.state.read().unwrap();
        let now = SystemTime::now();

        if !state.live_at(key, now) {
            return Ok(Vec::new());
        }

        let set = match state.data.get(key) {
            Some(Value::SortedSet(set)) => set,
            Some(Value::String(_)) => return Err(StoreError::WrongType),
            None => return Ok(Vec::new()),
        };

        let mut entries = match &query.by {
            RangeBy::Rank { start, stop } => set.range_by_rank(*start, *stop),
            RangeBy::Score { min, max } => set.range_by_score(*min, *max, query.rev),
            RangeBy::Lex { min, max } => set.range_by_lex(min, max, query.rev),
        };

        if let Some(limit) = &query.limit {
            if limit.count > 0 {
                let offset = usize::try_from(limit.offset).unwrap_or(0);
                entries = entries
                    .into_iter()
                    .skip(offset)
                    .take(limit.count as usize)
                    .collect();
            }
        }

        Ok(entries)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    fn expired_at(&self, key: &str, now: SystemTime) -> bool {
        self.expirations
            .get(key)
            .is_some_and(|deadline| *deadline <= now)
    }

    fn live_at(&self, key: &str, now: SystemTime) -> bool {
        self.data.contains_key(key) && !self.expired_at(key, now)
    }

    /// Drops both the value and the deadline of `key` once the deadline is
    /// past. Only callable on the exclusive path.
    fn reclaim_if_expired(&mut self, key: &str) {
        if self.expired_at(key, SystemTime::now()) {
            self.data.remove(key);
            self.expirations.remove(key);
        }
    }
}

fn deadline_after(now: SystemTime, seconds: i64) -> SystemTime {
    if seconds >= 0 {
        now + Duration::from_secs(seconds as u64)
    } else {
        now.checked_sub(Duration::from_secs(seconds.unsigned_abs()))
            .unwrap_or(UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expired_set_options() -> SetOptions {
        SetOptions {
            // A deadline one millisecond into 1970 is always in the past.
            expiry: Some(SetExpiry::PxAt(1)),
            ..SetOptions::default()
        }
    }

    #[test]
    fn get_missing_key() {
        let store = Store::new();
        assert_eq!(store.get("missing"), Ok(None));
    }

    #[test]
    fn set_then_get_round_trips() {
        let store = Store::new();

        store
            .set("key1".into(), Bytes::from("value1"), &SetOptions::default())
            .unwrap();

        assert_eq!(store.get("key1"), Ok(Some(Bytes::from("value1"))));
    }

    #[test]
    fn get_against_sorted_set_is_wrong_type() {
        let store = Store::new();
        store
            .zadd("zset", &[(1.0, "one".into())], &ZAddOptions::default())
            .unwrap();

        assert_eq!(store.get("zset"), Err(StoreError::WrongType));
    }

    #[test]
    fn set_nx_and_xx_gating() {
        let store = Store::new();
        let nx = SetOptions {
            cond: Some(SetCond::Nx),
            ..SetOptions::default()
        };
        let xx = SetOptions {
            cond: Some(SetCond::Xx),
            ..SetOptions::default()
        };

        assert_eq!(
            store.set("key1".into(), Bytes::from("first"), &xx),
            Err(StoreError::KeyMissing)
        );
        assert_eq!(store.set("key1".into(), Bytes::from("first"), &nx), Ok(None));
        assert_eq!(
            store.set("key1".into(), Bytes::from("second"), &nx),
            Err(StoreError::KeyExists)
        );
        assert_eq!(
            store.set("key1".into(), Bytes::from("second"), &xx),
            Ok(None)
        );
        assert_eq!(store.get("key1"), Ok(Some(Bytes::from("second"))));
    }

    #[test]
    fn set_get_returns_prior_value() {
        let store = Store::new();
        let with_get = SetOptions {
            get: true,
            ..SetOptions::default()
        };

        assert_eq!(
            store.set("key1".into(), Bytes::from("new"), &with_get),
            Ok(None)
        );
        assert_eq!(
            store.set("key1".into(), Bytes::from("newer"), &with_get),
            Ok(Some(Bytes::from("new")))
        );
    }

    #[test]
    fn set_get_against_sorted_set_is_wrong_type() {
        let store = Store::new();
        store
            .zadd("zset", &[(1.0, "one".into())], &ZAddOptions::default())
            .unwrap();

        let with_get = SetOptions {
            get: true,
            ..SetOptions::default()
        };
        assert_eq!(
            store.set("zset".into(), Bytes::from("v"), &with_get),
            Err(StoreError::WrongType)
        );
        // The failed SET must not have replaced the sorted set.
        assert_eq!(store.get("zset"), Err(StoreError::WrongType));
    }

    #[test]
    fn plain_set_clears_an_existing_deadline() {
        let store = Store::new();
        let with_ttl = SetOptions {
            expiry: Some(SetExpiry::Ex(100)),
            ..SetOptions::default()
        };

        store
            .set("key1".into(), Bytes::from("v"), &with_ttl)
            .unwrap();
        assert!(store.ttl("key1") > 0);

        store
            .set("key1".into(), Bytes::from("v"), &SetOptions::default())
            .unwrap();
        assert_eq!(store.ttl("key1"), -1);
    }

    #[test]
    fn set_keepttl_preserves_the_deadline() {
        let store = Store::new();
        let with_ttl = SetOptions {
            expiry: Some(SetExpiry::Ex(100)),
            ..SetOptions::default()
        };
        let keepttl = SetOptions {
            expiry: Some(SetExpiry::KeepTtl),
            ..SetOptions::default()
        };

        store
            .set("key1".into(), Bytes::from("v"), &with_ttl)
            .unwrap();
        store
            .set("key1".into(), Bytes::from("w"), &keepttl)
            .unwrap();

        assert!(store.ttl("key1") > 0);
        assert_eq!(store.get("key1"), Ok(Some(Bytes::from("w"))));
    }

    #[test]
    fn set_rejects_non_positive_relative_expiry() {
        let store = Store::new();
        let zero = SetOptions {
            expiry: Some(SetExpiry::Ex(0)),
            ..SetOptions::default()
        };

        assert_eq!(
            store.set("key1".into(), Bytes::from("v"), &zero),
            Err(StoreError::Invalid("invalid expire time"))
        );
        assert_eq!(store.get("key1"), Ok(None));
    }

    #[test]
    fn lazy_expiry_coherence() {
        let store = Store::new();
        store
            .set("gone".into(), Bytes::from("v"), &expired_set_options())
            .unwrap();

        // TTL is −2 exactly when GET observes the key as absent.
        assert_eq!(store.ttl("gone"), -2);
        assert_eq!(store.get("gone"), Ok(None));
        assert!(store.keys(&Pattern::new("*")).is_empty());
    }

    #[test]
    fn expired_key_can_be_recreated() {
        let store = Store::new();
        store
            .set("key1".into(), Bytes::from("old"), &expired_set_options())
            .unwrap();

        store
            .set("key1".into(), Bytes::from("new"), &SetOptions::default())
            .unwrap();

        assert_eq!(store.get("key1"), Ok(Some(Bytes::from("new"))));
        assert_eq!(store.ttl("key1"), -1);
    }

    #[test]
    fn del_counts_only_live_keys() {
        let store = Store::new();
        store
            .set("live".into(), Bytes::from("v"), &SetOptions::default())
            .unwrap();
        store
            .set("dead".into(), Bytes::from("v"), &expired_set_options())
            .unwrap();

        let removed = store.del(&["live".into(), "dead".into(), "missing".into()]);
        assert_eq!(removed, 1);
        assert_eq!(store.get("live"), Ok(None));
    }

    #[test]
    fn expire_missing_key_is_nokey() {
        let store = Store::new();
        assert_eq!(
            store.expire("missing", 1, &ExpireOptions::default()),
            Err(StoreError::NoSuchKey)
        );
    }

    #[test]
    fn expire_with_non_positive_ttl_deletes_the_key() {
        let store = Store::new();
        store
            .set("key1".into(), Bytes::from("v"), &SetOptions::default())
            .unwrap();

        store.expire("key1", -1, &ExpireOptions::default()).unwrap();

        assert_eq!(store.get("key1"), Ok(None));
        assert_eq!(store.ttl("key1"), -2);
    }

    #[test]
    fn expire_option_gating() {
        let store = Store::new();
        store
            .set("key1".into(), Bytes::from("v"), &SetOptions::default())
            .unwrap();

        let nx = ExpireOptions {
            nx: true,
            ..ExpireOptions::default()
        };
        let xx = ExpireOptions {
            xx: true,
            ..ExpireOptions::default()
        };
        let gt = ExpireOptions {
            gt: true,
            ..ExpireOptions::default()
        };
        let lt = ExpireOptions {
            lt: true,
            ..ExpireOptions::default()
        };

        assert_eq!(store.expire("key1", 10, &xx), Err(StoreError::NoExpiry));
        assert_eq!(store.expire("key1", 100, &nx), Ok(()));
        assert_eq!(store.expire("key1", 10, &nx), Err(StoreError::ExpiryExists));

        assert_eq!(
            store.expire("key1", 50, &gt),
            Err(StoreError::ExpiryNotGreater)
        );
        assert_eq!(store.expire("key1", 200, &gt), Ok(()));
        assert_eq!(
            store.expire("key1", 300, &lt),
            Err(StoreError::ExpiryNotLess)
        );
        assert_eq!(store.expire("key1", 50, &lt), Ok(()));

        let ttl = store.ttl("key1");
        assert!(ttl > 0 && ttl <= 50);
    }

    #[test]
    fn ttl_reports_remaining_seconds() {
        let store = Store::new();
        store
            .set("key1".into(), Bytes::from("v"), &SetOptions::default())
            .unwrap();

        assert_eq!(store.ttl("key1"), -1);
        store.expire("key1", 100, &ExpireOptions::default()).unwrap();

        let ttl = store.ttl("key1");
        assert!(ttl > 90 && ttl <= 100);
    }

    #[test]
    fn keys_filters_by_pattern() {
        let store = Store::new();
        for key in ["key1", "key2", "test1", "test2"] {
            store
                .set(key.into(), Bytes::from("v"), &SetOptions::default())
                .unwrap();
        }

        let mut all = store.keys(&Pattern::new("*"));
        all.sort();
        assert_eq!(all, vec!["key1", "key2", "test1", "test2"]);

        let mut prefixed = store.keys(&Pattern::new("key*"));
        prefixed.sort();
        assert_eq!(prefixed, vec!["key1", "key2"]);

        let mut probed = store.keys(&Pattern::new("test?"));
        probed.sort();
        assert_eq!(probed, vec!["test1", "test2"]);

        assert!(store.keys(&Pattern::new("nomatch*")).is_empty());
    }

    #[test]
    fn zadd_counts_added_by_default_and_changed_with_ch() {
        let store = Store::new();

        let reply = store
            .zadd(
                "zset",
                &[(1.0, "one".into()), (2.0, "two".into())],
                &ZAddOptions::default(),
            )
            .unwrap();
        assert_eq!(reply, ZAddReply::Count(2));

        // Same pairs again: nothing added, nothing changed.
        let reply = store
            .zadd(
                "zset",
                &[(1.0, "one".into()), (2.0, "two".into())],
                &ZAddOptions::default(),
            )
            .unwrap();
        assert_eq!(reply, ZAddReply::Count(0));

        let ch = ZAddOptions {
            ch: true,
            ..ZAddOptions::default()
        };
        let reply = store
            .zadd("zset", &[(9.0, "one".into()), (3.0, "three".into())], &ch)
            .unwrap();
        assert_eq!(reply, ZAddReply::Count(2));
    }

    #[test]
    fn zadd_nx_xx_gt_lt_gating() {
        let store = Store::new();
        store
            .zadd("zset", &[(5.0, "m".into())], &ZAddOptions::default())
            .unwrap();

        let nx = ZAddOptions {
            nx: true,
            ..ZAddOptions::default()
        };
        store.zadd("zset", &[(9.0, "m".into())], &nx).unwrap();
        assert_eq!(
            store
                .zrange(
                    "zset",
                    &RangeQuery {
                        by: RangeBy::Rank { start: 0, stop: -1 },
                        rev: false,
                        limit: None,
                    },
                )
                .unwrap(),
            vec![("m".to_string(), 5.0)]
        );

        let xx = ZAddOptions {
            xx: true,
            ..ZAddOptions::default()
        };
        store.zadd("zset", &[(1.0, "absent".into())], &xx).unwrap();
        assert_eq!(
            store.zadd("zset", &[(7.0, "m".into())], &xx).unwrap(),
            ZAddReply::Count(0)
        );

        let gt = ZAddOptions {
            gt: true,
            ..ZAddOptions::default()
        };
        store.zadd("zset", &[(3.0, "m".into())], &gt).unwrap();
        store.zadd("zset", &[(8.0, "m".into())], &gt).unwrap();

        let lt = ZAddOptions {
            lt: true,
            ..ZAddOptions::default()
        };
        store.zadd("zset", &[(9.0, "m".into())], &lt).unwrap();
        store.zadd("zset", &[(2.0, "m".into())], &lt).unwrap();

        let entries = store
            .zrange(
                "zset",
                &RangeQuery {
                    by: RangeBy::Rank { start: 0, stop: -1 },
                    rev: false,
                    limit: None,
                },
            )
            .unwrap();
        assert_eq!(entries, vec![("m".to_string(), 2.0)]);
    }

    #[test]
    fn zadd_incr_returns_the_new_score() {
        let store = Store::new();
        let incr = ZAddOptions {
            incr: true,
            ..ZAddOptions::default()
        };

        let reply = store.zadd("zset", &[(2.5, "m".into())], &incr).unwrap();
        assert_eq!(reply, ZAddReply::Incr(Some(2.5)));

        let reply = store.zadd("zset", &[(1.5, "m".into())], &incr).unwrap();
        assert_eq!(reply, ZAddReply::Incr(Some(4.0)));
    }

    #[test]
    fn zadd_incr_gated_by_nx_or_xx_is_null() {
        let store = Store::new();
        let incr_xx = ZAddOptions {
            incr: true,
            xx: true,
            ..ZAddOptions::default()
        };
        assert_eq!(
            store.zadd("zset", &[(1.0, "m".into())], &incr_xx).unwrap(),
            ZAddReply::Incr(None)
        );

        store
            .zadd("zset", &[(1.0, "m".into())], &ZAddOptions::default())
            .unwrap();
        let incr_nx = ZAddOptions {
            incr: true,
            nx: true,
            ..ZAddOptions::default()
        };
        assert_eq!(
            store.zadd("zset", &[(1.0, "m".into())], &incr_nx).unwrap(),
            ZAddReply::Incr(None)
        );
    }

    #[test]
    fn zadd_incr_requires_exactly_one_pair() {
        let store = Store::new();
        let incr = ZAddOptions {
            incr: true,
            ..ZAddOptions::default()
        };

        let err = store
            .zadd("zset", &[(1.0, "a".into()), (2.0, "b".into())], &incr)
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::Invalid("INCR option requires exactly one score-member pair")
        );
    }

    #[test]
    fn zadd_on_string_key_is_wrong_type() {
        let store = Store::new();
        store
            .set("str".into(), Bytes::from("v"), &SetOptions::default())
            .unwrap();

        assert_eq!(
            store.zadd("str", &[(1.0, "m".into())], &ZAddOptions::default()),
            Err(StoreError::WrongType)
        );
    }

    #[test]
    fn zrange_on_missing_key_is_empty() {
        let store = Store::new();
        let entries = store
            .zrange(
                "missing",
                &RangeQuery {
                    by: RangeBy::Rank { start: 0, stop: -1 },
                    rev: false,
                    limit: None,
                },
            )
            .unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn zrange_limit_trims_member_slots() {
        let store = Store::new();
        store
            .zadd(
                "zset",
                &[
                    (1.0, "a".into()),
                    (2.0, "b".into()),
                    (3.0, "c".into()),
                    (4.0, "d".into()),
                ],
                &ZAddOptions::default(),
            )
            .unwrap();

        let entries = store
            .zrange(
                "zset",
                &RangeQuery {
                    by: RangeBy::Score {
                        min: 1.0,
                        max: 4.0,
                    },
                    rev: false,
                    limit: Some(Limit {
                        offset: 1,
                        count: 2,
                    }),
                },
            )
            .unwrap();

        assert_eq!(
            entries,
            vec![("b".to_string(), 2.0), ("c".to_string(), 3.0)]
        );
    }

    #[test]
    fn zrange_by_lex_inclusive_bounds() {
        let store = Store::new();
        store
            .zadd(
                "zset",
                &[(1.0, "one".into()), (2.0, "two".into()), (3.0, "three".into())],
                &ZAddOptions::default(),
            )
            .unwrap();

        let entries = store
            .zrange(
                "zset",
                &RangeQuery {
                    by: RangeBy::Lex {
                        min: "one".into(),
                        max: "three".into(),
                    },
                    rev: false,
                    limit: None,
                },
            )
            .unwrap();

        let members: Vec<String> = entries.into_iter().map(|(m, _)| m).collect();
        assert_eq!(members, vec!["one", "three"]);
    }
}
