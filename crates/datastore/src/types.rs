//! Supporting value types for the datastore capability surface.

use std::collections::HashMap;
use std::time::Duration;

/// Health/memory snapshot returned by `server_info`.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Resident memory in bytes, as reported by the datastore.
    pub used_memory_bytes: u64,
    /// Peak resident memory in bytes.
    pub used_memory_peak_bytes: u64,
    /// `used_memory_peak_bytes / used_memory_bytes`, or 1.0 if unknown.
    pub fragmentation_ratio: f64,
    /// Number of connected clients.
    pub connected_clients: u32,
    /// Seconds since the last background snapshot completed, if any.
    pub seconds_since_last_save: Option<u64>,
}

/// A single slowlog entry.
#[derive(Debug, Clone)]
pub struct SlowLogEntry {
    /// The command name.
    pub command: String,
    /// How long it took.
    pub duration: Duration,
    /// Unix timestamp (seconds) when it ran.
    pub timestamp_secs: u64,
}

/// The outcome of a named script evaluation.
#[derive(Debug, Clone)]
pub enum ScriptOutput {
    /// An integer result.
    Integer(i64),
    /// A list of string ids.
    Ids(Vec<String>),
    /// A paginated id result: `(total_matched, page_ids)`.
    Page {
        /// Total candidates matched before pagination, across the whole scan.
        total: u64,
        /// The accepted page of ids.
        ids: Vec<String>,
    },
    /// A computed price.
    Price(i64),
}

/// A buffered write command, used to build an atomic transaction.
#[derive(Debug, Clone)]
pub enum Command {
    /// Set the fields of a hash, merging with any existing fields.
    HSetMany {
        /// Hash key.
        key: String,
        /// Fields to set.
        fields: HashMap<String, String>,
    },
    /// Increment a numeric field inside a hash.
    HIncr {
        /// Hash key.
        key: String,
        /// Field to increment.
        field: String,
        /// Signed delta.
        by: i64,
    },
    /// Add members to a set.
    SAdd {
        /// Set key.
        key: String,
        /// Members to add.
        members: Vec<String>,
    },
    /// Remove members from a set.
    SRem {
        /// Set key.
        key: String,
        /// Members to remove.
        members: Vec<String>,
    },
    /// Add or update a member's score in a sorted set.
    ZAdd {
        /// Sorted-set key.
        key: String,
        /// Member id.
        member: String,
        /// New score.
        score: f64,
    },
    /// Remove a member from a sorted set.
    ZRem {
        /// Sorted-set key.
        key: String,
        /// Member id.
        member: String,
    },
    /// Add a member to a geo set at the given coordinates.
    GeoAdd {
        /// Geo-set key.
        key: String,
        /// Member id.
        member: String,
        /// Longitude.
        lon: f64,
        /// Latitude.
        lat: f64,
    },
    /// Remove a member from a geo set.
    GeoRem {
        /// Geo-set key.
        key: String,
        /// Member id.
        member: String,
    },
    /// Set a plain string value with an optional TTL.
    StringSet {
        /// String key.
        key: String,
        /// Value.
        value: String,
        /// Optional TTL.
        ttl: Option<Duration>,
    },
    /// Delete a key outright (any type).
    Del {
        /// Key to delete.
        key: String,
    },
}
