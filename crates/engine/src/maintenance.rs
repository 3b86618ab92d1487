//! Maintenance scheduler: three independently-paced loops —
//! a health check, an hourly expired-key sweep, and a six-hourly deep pass —
//! run as tokio tasks against the shared [`Datastore`] handle.

use propdex_core::key;
use propdex_core::Result;
use propdex_datastore::Datastore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const HEALTH_PERIOD: Duration = Duration::from_secs(60);
const SWEEP_PERIOD: Duration = Duration::from_secs(60 * 60);
const DEEP_PERIOD: Duration = Duration::from_secs(6 * 60 * 60);
const STALE_SNAPSHOT_THRESHOLD: Duration = Duration::from_secs(60 * 60);
const SORT_INDEX_DRIFT_TOLERANCE: usize = 0;

/// Counters surfaced for operational visibility; cheap to read, updated by
/// whichever loop last ran.
#[derive(Default)]
pub struct MaintenanceStats {
    health_runs: AtomicU64,
    sweep_runs: AtomicU64,
    deep_runs: AtomicU64,
    orphan_keys_purged: AtomicU64,
    drift_repairs: AtomicU64,
}

impl MaintenanceStats {
    /// Snapshot of the current counters.
    pub fn snapshot(&self) -> (u64, u64, u64, u64, u64) {
        (
            self.health_runs.load(Ordering::Relaxed),
            self.sweep_runs.load(Ordering::Relaxed),
            self.deep_runs.load(Ordering::Relaxed),
            self.orphan_keys_purged.load(Ordering::Relaxed),
            self.drift_repairs.load(Ordering::Relaxed),
        )
    }
}

/// Owns the three maintenance loops. Constructing one does not start any
/// work; call [`MaintenanceScheduler::spawn`] once the datastore is ready.
pub struct MaintenanceScheduler {
    datastore: Arc<dyn Datastore>,
    stats: Arc<MaintenanceStats>,
}

impl MaintenanceScheduler {
    /// Wrap a datastore handle; loops are spawned lazily via `spawn`.
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        MaintenanceScheduler { datastore, stats: Arc::new(MaintenanceStats::default()) }
    }

    /// Shared stats handle, readable independently of the spawned tasks.
    pub fn stats(&self) -> Arc<MaintenanceStats> {
        self.stats.clone()
    }

    /// Spawn the health, sweep, and deep loops as detached tokio tasks.
    /// Returns their join handles so a caller can await or abort them.
    pub fn spawn(&self) -> Vec<tokio::task::JoinHandle<()>> {
        vec![
            {
                let datastore = self.datastore.clone();
                let stats = self.stats.clone();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(HEALTH_PERIOD);
                    loop {
                        ticker.tick().await;
                        if let Err(e) = health_check(datastore.as_ref(), &stats).await {
                            warn!(error = %e, "health check failed");
                        }
                    }
                })
            },
            {
                let datastore = self.datastore.clone();
                let stats = self.stats.clone();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(SWEEP_PERIOD);
                    loop {
                        ticker.tick().await;
                        if let Err(e) = expired_key_sweep(datastore.as_ref(), &stats).await {
                            warn!(error = %e, "expired-key sweep failed");
                        }
                    }
                })
            },
            {
                let datastore = self.datastore.clone();
                let stats = self.stats.clone();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(DEEP_PERIOD);
                    loop {
                        ticker.tick().await;
                        if let Err(e) = deep_maintenance(datastore.as_ref(), &stats).await {
                            warn!(error = %e, "deep maintenance pass failed");
                        }
                    }
                })
            },
        ]
    }
}

async fn health_check(datastore: &dyn Datastore, stats: &MaintenanceStats) -> Result<()> {
    let info = datastore.server_info().await?;
    debug!(
        used_memory_bytes = info.used_memory_bytes,
        fragmentation_ratio = info.fragmentation_ratio,
        connected_clients = info.connected_clients,
        "maintenance health check"
    );
    stats.health_runs.fetch_add(1, Ordering::Relaxed);
    Ok(())
}

async fn expired_key_sweep(datastore: &dyn Datastore, stats: &MaintenanceStats) -> Result<()> {
    let purged = sweep_orphan_temp_keys(datastore).await?;
    if purged > 0 {
        info!(purged, "expired-key sweep purged orphan temp keys");
    }
    stats.orphan_keys_purged.fetch_add(purged as u64, Ordering::Relaxed);
    stats.sweep_runs.fetch_add(1, Ordering::Relaxed);
    Ok(())
}

/// Run one deep-maintenance pass immediately, outside the scheduler's own
/// six-hourly period. Used by the `optimize_database` operator command.
pub async fn run_deep_maintenance_once(datastore: &dyn Datastore, stats: &MaintenanceStats) -> Result<()> {
    deep_maintenance(datastore, stats).await
}

async fn deep_maintenance(datastore: &dyn Datastore, stats: &MaintenanceStats) -> Result<()> {
    sweep_orphan_temp_keys(datastore).await?;

    let drift = repair_sort_index_drift(datastore).await?;
    if drift > 0 {
        warn!(repaired = drift, "deep maintenance repaired sort-index membership drift");
    }
    stats.drift_repairs.fetch_add(drift as u64, Ordering::Relaxed);

    let info = datastore.server_info().await?;
    let stale = info
        .seconds_since_last_save
        .map(|s| Duration::from_secs(s) > STALE_SNAPSHOT_THRESHOLD)
        .unwrap_or(true);
    if stale {
        datastore.bgrewriteaof().await?;
        datastore.bgsave().await?;
        info!("deep maintenance triggered background rewrite and snapshot");
    }

    let slow = datastore.slowlog(20).await?;
    if !slow.is_empty() {
        debug!(count = slow.len(), "deep maintenance collected slowlog entries");
    }

    stats.deep_runs.fetch_add(1, Ordering::Relaxed);
    Ok(())
}

/// Delete any `temp:*` key left behind by a query that never reached its
/// cleanup step. Every temp key here
/// is scoped to a single query execution, so any that still exist by the
/// time this loop runs are already orphaned — no age check is needed.
async fn sweep_orphan_temp_keys(datastore: &dyn Datastore) -> Result<usize> {
    let keys = datastore.scan("temp:*").await?;
    let mut purged = 0;
    for k in keys {
        if datastore.del(&k).await? {
            purged += 1;
        }
    }
    Ok(purged)
}

/// Check each property sort index's cardinality against `properties:all`'s
/// and repair the trivial case — a member whose property no longer exists
/// in `properties:all` — by evicting it.
async fn repair_sort_index_drift(datastore: &dyn Datastore) -> Result<usize> {
    let all = datastore.smembers(&key::all_properties()).await?;
    let mut repaired = 0;
    for index_name in key::SORT_INDEX_NAMES {
        let members = datastore.zrangebyscore(index_name, f64::MIN, f64::MAX).await?;
        let drift = members.len().saturating_sub(all.len());
        if drift <= SORT_INDEX_DRIFT_TOLERANCE {
            continue;
        }
        for (member, _) in members {
            if !all.contains(&member) {
                datastore.zrem(index_name, &member).await?;
                repaired += 1;
            }
        }
    }
    Ok(repaired)
}
