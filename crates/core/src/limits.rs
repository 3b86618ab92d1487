//! Named constants for the numeric tunables used across the engine, kept here
//! rather than inline so every crate references the same values.

/// Minimum valid `page_number`.
pub const MIN_PAGE_NUMBER: u32 = 1;

/// Minimum valid `page_size`.
pub const MIN_PAGE_SIZE: u32 = 1;

/// Maximum valid `page_size`.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Hard cap on geo-search candidate count.
pub const GEO_SEARCH_CAP: usize = 100;

/// Default bounded write-gate concurrency.
pub const DEFAULT_WRITE_GATE_CONCURRENCY: usize = 5;

/// Default bounded search-gate concurrency.
pub const DEFAULT_SEARCH_GATE_CONCURRENCY: usize = 50;

/// Per-datastore-command timeout budget.
pub const DATASTORE_COMMAND_BUDGET_SECS: u64 = 5;

/// Script execution timeout budget.
pub const SCRIPT_BUDGET_SECS: u64 = 30;

/// Circuit breaker: failure count within the window that opens the breaker.
pub const CIRCUIT_BREAKER_FAILURE_THRESHOLD: u32 = 5;

/// Circuit breaker: window over which failures are counted, in seconds.
pub const CIRCUIT_BREAKER_WINDOW_SECS: u64 = 10;

/// Circuit breaker: half-open probe delay, in seconds.
pub const CIRCUIT_BREAKER_HALF_OPEN_SECS: u64 = 10;

/// Transient datastore error retry attempts.
pub const RETRY_ATTEMPTS: u32 = 3;

/// Base backoff delay in milliseconds, doubled per attempt with jitter.
pub const RETRY_BASE_BACKOFF_MS: u64 = 50;

/// Connection manager reconnect backoff cap.
pub const RECONNECT_BACKOFF_CAP_SECS: u64 = 30;

/// L1 cache per-entry TTL, in seconds.
pub const L1_CACHE_TTL_SECS: u64 = 60;

/// L2 cache per-entry TTL, in seconds.
pub const L2_CACHE_TTL_SECS: u64 = 600;

/// L1 cache maximum entry count (a proxy for the ~64MiB budget).
pub const L1_CACHE_MAX_ENTRIES: usize = 4096;

/// Health check interval, in seconds.
pub const MAINTENANCE_HEALTH_INTERVAL_SECS: u64 = 60;

/// Deep maintenance interval, in seconds (6 hours).
pub const MAINTENANCE_DEEP_INTERVAL_SECS: u64 = 6 * 60 * 60;

/// Expired-key sweep interval, in seconds (1 hour).
pub const MAINTENANCE_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

/// Retention window for availability ranges and pricing rules, in days.
pub const TEMPORAL_RETENTION_DAYS: i64 = 90;

/// Sorted-set cardinality drift tolerance before a rebuild is triggered.
pub const SORT_INDEX_DRIFT_TOLERANCE: usize = 3;

/// Chunk size used when the background rebuilder iterates the authoritative
/// store.
pub const REBUILD_CHUNK_SIZE: usize = 50;

/// Minimum chunk size multiplier for the complex-filter script's candidate
/// iteration (`chunk size >= page_size * 2`).
pub const COMPLEX_FILTER_CHUNK_MULTIPLIER: usize = 2;
