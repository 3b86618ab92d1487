//! In-memory reference implementation of [`crate::Datastore`].
//!
//! Every key family is backed by its own `DashMap` keyed by the string key
//! name, so that unrelated keys never contend on the same lock. Atomicity
//! for [`Datastore::commit_transaction`] is provided by a single coarse
//! `parking_lot::Mutex` guarding the whole apply step — acceptable for an
//! in-process reference store; a networked backend would use its own
//! pipelined-MULTI/EXEC equivalent instead.

use crate::error::DatastoreError;
use crate::geo::haversine_km;
use crate::sortedset::SortedSet;
use crate::types::{Command, ScriptOutput, ServerInfo, SlowLogEntry};
use crate::{glob_match, Datastore, GeoHit};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use propdex_core::Result;
use rustc_hash::FxHashMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

struct GeoPoint {
    lon: f64,
    lat: f64,
}

/// An in-process implementation of the datastore capability surface.
pub struct InMemoryDatastore {
    hashes: DashMap<String, FxHashMap<String, String>>,
    sets: DashMap<String, HashSet<String>>,
    zsets: DashMap<String, SortedSet>,
    geo: DashMap<String, FxHashMap<String, GeoPoint>>,
    strings: DashMap<String, String>,
    expirations: DashMap<String, Instant>,
    counters: DashMap<String, AtomicI64>,
    channels: DashMap<String, broadcast::Sender<String>>,
    slowlog: Mutex<Vec<SlowLogEntry>>,
    commit_lock: Mutex<()>,
    last_bgsave: Mutex<Option<Instant>>,
}

impl Default for InMemoryDatastore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDatastore {
    /// A fresh, empty datastore.
    pub fn new() -> Self {
        InMemoryDatastore {
            hashes: DashMap::new(),
            sets: DashMap::new(),
            zsets: DashMap::new(),
            geo: DashMap::new(),
            strings: DashMap::new(),
            expirations: DashMap::new(),
            counters: DashMap::new(),
            channels: DashMap::new(),
            slowlog: Mutex::new(Vec::new()),
            commit_lock: Mutex::new(()),
            last_bgsave: Mutex::new(None),
        }
    }

    fn record_slowlog(&self, command: &str, duration: Duration) {
        // Only commands over 1ms are notable in this reference store.
        if duration < Duration::from_millis(1) {
            return;
        }
        let mut log = self.slowlog.lock();
        log.push(SlowLogEntry {
            command: command.to_string(),
            duration,
            timestamp_secs: now_unix_secs(),
        });
        if log.len() > 256 {
            log.remove(0);
        }
    }

    fn apply_one(&self, cmd: Command) {
        match cmd {
            Command::HSetMany { key, fields } => {
                self.hashes.entry(key).or_default().extend(fields);
            }
            Command::HIncr { key, field, by } => {
                let mut h = self.hashes.entry(key).or_default();
                let cur: i64 = h.get(&field).and_then(|v| v.parse().ok()).unwrap_or(0);
                h.insert(field, (cur + by).to_string());
            }
            Command::SAdd { key, members } => {
                self.sets.entry(key).or_default().extend(members);
            }
            Command::SRem { key, members } => {
                if let Some(mut s) = self.sets.get_mut(&key) {
                    for m in &members {
                        s.remove(m);
                    }
                }
            }
            Command::ZAdd { key, member, score } => {
                self.zsets.entry(key).or_default().add(member, score);
            }
            Command::ZRem { key, member } => {
                if let Some(mut z) = self.zsets.get_mut(&key) {
                    z.remove(&member);
                }
            }
            Command::GeoAdd {
                key,
                member,
                lon,
                lat,
            } => {
                self.geo
                    .entry(key)
                    .or_default()
                    .insert(member, GeoPoint { lon, lat });
            }
            Command::GeoRem { key, member } => {
                if let Some(mut g) = self.geo.get_mut(&key) {
                    g.remove(&member);
                }
            }
            Command::StringSet { key, value, ttl } => {
                self.strings.insert(key.clone(), value);
                if let Some(ttl) = ttl {
                    self.expirations.insert(key, Instant::now() + ttl);
                } else {
                    self.expirations.remove(&key);
                }
            }
            Command::Del { key } => {
                self.hashes.remove(&key);
                self.sets.remove(&key);
                self.zsets.remove(&key);
                self.geo.remove(&key);
                self.strings.remove(&key);
                self.counters.remove(&key);
                self.expirations.remove(&key);
            }
        }
    }
}

fn now_unix_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[async_trait]
impl Datastore for InMemoryDatastore {
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hset_many(&self, key: &str, fields: HashMap<String, String>) -> Result<()> {
        self.hashes.entry(key.to_string()).or_default().extend(fields);
        Ok(())
    }

    async fn hget_all(&self, key: &str) -> Result<HashMap<String, String>> {
        Ok(self
            .hashes
            .get(key)
            .map(|r| r.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn hincr(&self, key: &str, field: &str, by: i64) -> Result<i64> {
        let mut h = self.hashes.entry(key.to_string()).or_default();
        let cur: i64 = h.get(field).and_then(|v| v.parse().ok()).unwrap_or(0);
        let next = cur + by;
        h.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<usize> {
        let mut s = self.sets.entry(key.to_string()).or_default();
        let mut added = 0;
        for m in members {
            if s.insert(m.clone()) {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<usize> {
        let mut removed = 0;
        if let Some(mut s) = self.sets.get_mut(key) {
            for m in members {
                if s.remove(m) {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }

    async fn smembers(&self, key: &str) -> Result<HashSet<String>> {
        Ok(self.sets.get(key).map(|r| r.clone()).unwrap_or_default())
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self.sets.get(key).map(|s| s.contains(member)).unwrap_or(false))
    }

    async fn sinterstore(&self, dest: &str, sources: &[String]) -> Result<usize> {
        if sources.is_empty() {
            self.sets.remove(dest);
            return Ok(0);
        }
        let mut iter = sources.iter();
        let first = iter
            .next()
            .and_then(|k| self.sets.get(k).map(|r| r.clone()))
            .unwrap_or_default();
        let result = iter.fold(first, |acc, k| {
            let other = self.sets.get(k).map(|r| r.clone()).unwrap_or_default();
            acc.intersection(&other).cloned().collect()
        });
        let len = result.len();
        self.sets.insert(dest.to_string(), result);
        Ok(len)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        self.zsets.entry(key.to_string()).or_default().add(member, score);
        Ok(())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<()> {
        if let Some(mut z) = self.zsets.get_mut(key) {
            z.remove(member);
        }
        Ok(())
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>> {
        Ok(self.zsets.get(key).and_then(|z| z.score(member)))
    }

    async fn zcard(&self, key: &str) -> Result<usize> {
        Ok(self.zsets.get(key).map(|z| z.len()).unwrap_or(0))
    }

    async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        Ok(self
            .zsets
            .get(key)
            .map(|z| z.range_ascending(start, stop))
            .unwrap_or_default())
    }

    async fn zrevrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        Ok(self
            .zsets
            .get(key)
            .map(|z| z.range_descending(start, stop))
            .unwrap_or_default())
    }

    async fn zrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<Vec<(String, f64)>> {
        Ok(self
            .zsets
            .get(key)
            .map(|z| z.range_by_score(min, max))
            .unwrap_or_default())
    }

    async fn zremrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<usize> {
        Ok(self
            .zsets
            .get_mut(key)
            .map(|mut z| z.remove_range_by_score(min, max))
            .unwrap_or(0))
    }

    async fn zinterstore(&self, dest: &str, sources: &[(String, f64)]) -> Result<usize> {
        if sources.is_empty() {
            self.zsets.remove(dest);
            return Ok(0);
        }
        let mut acc: Option<HashMap<String, f64>> = None;
        for (key, weight) in sources {
            let this: HashMap<String, f64> = self
                .zsets
                .get(key)
                .map(|z| {
                    z.members_ascending()
                        .into_iter()
                        .map(|m| {
                            let s = z.score(&m).unwrap_or(0.0);
                            (m, s * weight)
                        })
                        .collect()
                })
                .unwrap_or_default();
            acc = Some(match acc {
                None => this,
                Some(prev) => prev
                    .into_iter()
                    .filter_map(|(m, s)| this.get(&m).map(|s2| (m, s + s2)))
                    .collect(),
            });
        }
        let result = acc.unwrap_or_default();
        let mut set = SortedSet::new();
        for (m, s) in &result {
            set.add(m.clone(), *s);
        }
        let len = set.len();
        self.zsets.insert(dest.to_string(), set);
        Ok(len)
    }

    async fn geoadd(&self, key: &str, member: &str, lon: f64, lat: f64) -> Result<()> {
        self.geo
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), GeoPoint { lon, lat });
        Ok(())
    }

    async fn georadius(
        &self,
        key: &str,
        lon: f64,
        lat: f64,
        radius_km: f64,
        limit: usize,
    ) -> Result<Vec<GeoHit>> {
        let mut hits: Vec<GeoHit> = self
            .geo
            .get(key)
            .map(|points| {
                points
                    .iter()
                    .map(|(m, p)| (m.clone(), haversine_km(lon, lat, p.lon, p.lat)))
                    .filter(|(_, d)| *d <= radius_km)
                    .collect()
            })
            .unwrap_or_default();
        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn stringset(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.strings.insert(key.to_string(), value.to_string());
        if let Some(ttl) = ttl {
            self.expirations.insert(key.to_string(), Instant::now() + ttl);
        } else {
            self.expirations.remove(key);
        }
        Ok(())
    }

    async fn stringget(&self, key: &str) -> Result<Option<String>> {
        if let Some(exp) = self.expirations.get(key) {
            if Instant::now() >= *exp {
                drop(exp);
                self.strings.remove(key);
                self.expirations.remove(key);
                return Ok(None);
            }
        }
        Ok(self.strings.get(key).map(|r| r.clone()))
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        let entry = self.counters.entry(key.to_string()).or_insert_with(|| AtomicI64::new(0));
        Ok(entry.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<()> {
        self.expirations.insert(key.to_string(), Instant::now() + ttl);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let existed = self.hashes.remove(key).is_some()
            || self.sets.remove(key).is_some()
            || self.zsets.remove(key).is_some()
            || self.geo.remove(key).is_some()
            || self.strings.remove(key).is_some()
            || self.counters.remove(key).is_some();
        self.expirations.remove(key);
        Ok(existed)
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>> {
        let mut keys: HashSet<String> = HashSet::new();
        keys.extend(self.hashes.iter().map(|r| r.key().clone()));
        keys.extend(self.sets.iter().map(|r| r.key().clone()));
        keys.extend(self.zsets.iter().map(|r| r.key().clone()));
        keys.extend(self.geo.iter().map(|r| r.key().clone()));
        keys.extend(self.strings.iter().map(|r| r.key().clone()));
        keys.extend(self.counters.iter().map(|r| r.key().clone()));
        Ok(keys.into_iter().filter(|k| glob_match(pattern, k)).collect())
    }

    async fn server_info(&self) -> Result<ServerInfo> {
        let approx_bytes = (self.hashes.len() + self.sets.len() + self.zsets.len() + self.geo.len())
            as u64
            * 256;
        let last_save = self.last_bgsave.lock();
        Ok(ServerInfo {
            used_memory_bytes: approx_bytes,
            used_memory_peak_bytes: approx_bytes,
            fragmentation_ratio: 1.0,
            connected_clients: 1,
            seconds_since_last_save: last_save.map(|t| t.elapsed().as_secs()),
        })
    }

    async fn bgsave(&self) -> Result<()> {
        *self.last_bgsave.lock() = Some(Instant::now());
        Ok(())
    }

    async fn bgrewriteaof(&self) -> Result<()> {
        Ok(())
    }

    async fn slowlog(&self, limit: usize) -> Result<Vec<SlowLogEntry>> {
        let log = self.slowlog.lock();
        Ok(log.iter().rev().take(limit).cloned().collect())
    }

    async fn scripteval(
        &self,
        script: &str,
        _keys: &[String],
        _args: &[String],
    ) -> Result<ScriptOutput> {
        // The reference store does not embed a scripting VM; named scripts
        // are dispatched in-process by `propdex-engine::query`, which owns
        // the actual filter/availability logic. This entry point exists so
        // callers that only hold a `dyn Datastore` can still probe script
        // availability uniformly; it always reports the script as present.
        Err(DatastoreError::Script {
            script: script.to_string(),
            command: "scripteval".to_string(),
            message: "scripts are dispatched in-process by the query executor, not the datastore"
                .to_string(),
        }
        .into())
    }

    async fn commit_transaction(&self, commands: Vec<Command>) -> Result<()> {
        let _guard = self.commit_lock.lock();
        let start = Instant::now();
        for cmd in commands {
            self.apply_one(cmd);
        }
        self.record_slowlog("commit_transaction", start.elapsed());
        Ok(())
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        let sender = self
            .channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(256).0);
        // No subscribers is not an error; the event is simply dropped.
        let _ = sender.send(payload.to_string());
        Ok(())
    }

    fn subscribe(&self, channel: &str) -> broadcast::Receiver<String> {
        self.channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(256).0)
            .subscribe()
    }
}
