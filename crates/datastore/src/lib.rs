//! Datastore abstraction
//!
//! A thin capability surface over a networked in-memory datastore: hashes,
//! sets, sorted sets, geo sets, scripted transactions, pub/sub, key scan,
//! and server info. [`memory::InMemoryDatastore`] is the reference
//! implementation used by the rest of this workspace and by tests; a real
//! deployment would swap in a client for an actual networked store behind
//! the same trait.

#![warn(missing_docs)]

pub mod error;
pub mod geo;
pub mod memory;
pub mod sortedset;
pub mod types;

use async_trait::async_trait;
use propdex_core::Result;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use types::{Command, ScriptOutput, ServerInfo, SlowLogEntry};

/// A geo search result: member id and distance in kilometers from the query point.
pub type GeoHit = (String, f64);

/// The datastore capability surface consumed by the rest of the engine.
#[async_trait]
pub trait Datastore: Send + Sync {
    // -- Hashes --------------------------------------------------------

    /// Set a single field on a hash.
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()>;

    /// Set multiple fields on a hash in one call.
    async fn hset_many(&self, key: &str, fields: HashMap<String, String>) -> Result<()>;

    /// Read all fields of a hash. Returns an empty map if the hash does not exist.
    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Increment a numeric hash field by `by`, creating it at `by` if absent.
    async fn hincr(&self, key: &str, field: &str, by: i64) -> Result<i64>;

    // -- Sets ------------------------------------------------------------

    /// Add members to a set; returns the number newly added.
    async fn sadd(&self, key: &str, members: &[String]) -> Result<usize>;

    /// Remove members from a set; returns the number actually removed.
    async fn srem(&self, key: &str, members: &[String]) -> Result<usize>;

    /// Read all members of a set.
    async fn smembers(&self, key: &str) -> Result<HashSet<String>>;

    /// Whether `member` belongs to the set at `key`.
    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;

    /// Intersect `sources` and store the result at `dest`; returns the
    /// resulting set's cardinality.
    async fn sinterstore(&self, dest: &str, sources: &[String]) -> Result<usize>;

    // -- Sorted sets -------------------------------------------------------

    /// Set `member`'s score in the sorted set at `key`.
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()>;

    /// Remove `member` from the sorted set at `key`.
    async fn zrem(&self, key: &str, member: &str) -> Result<()>;

    /// `member`'s current score, if present.
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>>;

    /// Cardinality of the sorted set at `key`.
    async fn zcard(&self, key: &str) -> Result<usize>;

    /// Members in ascending score order within rank range `[start, stop]`.
    async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;

    /// Members in descending score order within rank range `[start, stop]`.
    async fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>>;

    /// Members (with scores) whose score lies in `[min, max]`, ascending.
    async fn zrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<Vec<(String, f64)>>;

    /// Remove all members whose score lies in `[min, max]`; returns the count removed.
    async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<usize>;

    /// Intersect `sources` (each with a weight applied to its score) into
    /// `dest`, summing weighted scores for members present in all sources.
    /// Returns the resulting cardinality.
    async fn zinterstore(&self, dest: &str, sources: &[(String, f64)]) -> Result<usize>;

    // -- Geo -----------------------------------------------------------

    /// Add `member` to the geo set at `key` at the given coordinates.
    async fn geoadd(&self, key: &str, member: &str, lon: f64, lat: f64) -> Result<()>;

    /// Members within `radius_km` of `(lon, lat)`, ascending by distance,
    /// capped at `limit` results.
    async fn georadius(
        &self,
        key: &str,
        lon: f64,
        lat: f64,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<GeoHit>>;

    /// Alias for `georadius` using a named search shape; this engine only
    /// ever issues radius searches, so `geosearch` delegates to `georadius`.
    async fn geosearch(
        &self,
        key: &str,
        lon: f64,
        lat: f64,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<GeoHit>> {
        self.georadius(key, lon, lat, radius_km, limit).await
    }

    // -- Strings / counters ----------------------------------------------

    /// Set a string value with an optional TTL.
    async fn stringset(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Read a string value.
    async fn stringget(&self, key: &str) -> Result<Option<String>>;

    /// Atomically increment an integer counter.
    async fn incr(&self, key: &str) -> Result<i64>;

    // -- Lifecycle / maintenance ------------------------------------------

    /// Set or refresh a key's TTL.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<()>;

    /// Delete a key outright, regardless of its type.
    async fn del(&self, key: &str) -> Result<bool>;

    /// List keys matching a `*`-glob pattern.
    async fn scan(&self, pattern: &str) -> Result<Vec<String>>;

    /// Current health/memory snapshot.
    async fn server_info(&self) -> Result<ServerInfo>;

    /// Request a background snapshot.
    async fn bgsave(&self) -> Result<()>;

    /// Request a background append-only-log rewrite.
    async fn bgrewriteaof(&self) -> Result<()>;

    /// Read the slowlog, most recent first, capped at `limit`.
    async fn slowlog(&self, limit: usize) -> Result<Vec<SlowLogEntry>>;

    // -- Scripting / transactions / pub-sub --------------------------------

    /// Evaluate a named server-side script atomically.
    async fn scripteval(
        &self,
        script: &str,
        keys: &[String],
        args: &[String],
    ) -> Result<ScriptOutput>;

    /// Apply a batch of write [`Command`]s atomically.
    async fn commit_transaction(&self, commands: Vec<Command>) -> Result<()>;

    /// Publish a payload on a channel.
    async fn publish(&self, channel: &str, payload: &str) -> Result<()>;

    /// Subscribe to a channel, receiving a broadcast receiver of payloads.
    fn subscribe(&self, channel: &str) -> tokio::sync::broadcast::Receiver<String>;
}

/// Match a scan pattern containing `*` wildcards against a key.
pub fn glob_match(pattern: &str, key: &str) -> bool {
    fn helper(p: &[u8], s: &[u8]) -> bool {
        match p.first() {
            None => s.is_empty(),
            Some(b'*') => helper(&p[1..], s) || (!s.is_empty() && helper(p, &s[1..])),
            Some(c) => !s.is_empty() && s[0] == *c && helper(&p[1..], &s[1..]),
        }
    }
    helper(pattern.as_bytes(), key.as_bytes())
}
