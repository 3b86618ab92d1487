//! Connection manager: owns the single logical multiplexed
//! connection to the datastore, retries transient failures with backoff, and
//! health-checks on an interval.

use crate::backoff::{retry, Backoff};
use crate::cancellation::CancellationToken;
use crate::circuit_breaker::CircuitBreaker;
use dashmap::DashMap;
use propdex_core::key::channel;
use propdex_core::limits::{RECONNECT_BACKOFF_CAP_SECS, RETRY_ATTEMPTS, RETRY_BASE_BACKOFF_MS};
use propdex_core::{Error, Result};
use propdex_datastore::Datastore;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Health-check round-trip budget.
const HEALTH_CHECK_BUDGET: Duration = Duration::from_millis(200);

/// Owns the datastore connection on behalf of the rest of the engine:
/// wraps every call with retry-with-backoff and a per-operation-class
/// circuit breaker, and tracks overall connection health.
pub struct ConnectionManager {
    datastore: Arc<dyn Datastore>,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    healthy: AtomicBool,
}

impl ConnectionManager {
    /// Wrap `datastore` with retry, circuit breaking, and health checks.
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        ConnectionManager {
            datastore,
            breakers: DashMap::new(),
            healthy: AtomicBool::new(true),
        }
    }

    /// The wrapped datastore handle, for callers that want direct access
    /// (e.g. bulk reads that don't warrant retry/breaker overhead).
    pub fn datastore(&self) -> &Arc<dyn Datastore> {
        &self.datastore
    }

    /// Whether the last health check (or call) observed the connection as up.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    fn breaker_for(&self, operation_class: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(operation_class.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(operation_class)))
            .clone()
    }

    /// Run `op` (a closure issuing one or more datastore calls) under
    /// `operation_class`'s circuit breaker, retrying transient errors with
    /// exponential backoff and jitter.
    pub async fn call<T, F, Fut>(&self, operation_class: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let breaker = self.breaker_for(operation_class);
        if !breaker.allow() {
            return Err(breaker.rejection_error());
        }

        let schedule = Backoff::new(
            Duration::from_millis(RETRY_BASE_BACKOFF_MS),
            Duration::from_secs(RECONNECT_BACKOFF_CAP_SECS),
        );
        let result = retry(RETRY_ATTEMPTS, schedule, Error::is_retryable, &op).await;

        match &result {
            Ok(_) => {
                let was_unhealthy = !self.healthy.swap(true, Ordering::SeqCst);
                breaker.record_success();
                if was_unhealthy {
                    self.announce_restored().await;
                }
            }
            Err(e) if e.is_retryable() => {
                breaker.record_failure();
                let was_healthy = self.healthy.swap(false, Ordering::SeqCst);
                if was_healthy {
                    self.announce_failed(e).await;
                }
            }
            Err(_) => {}
        }
        result
    }

    async fn announce_failed(&self, error: &Error) {
        tracing::error!(%error, "datastore connection failed");
        let _ = self
            .datastore
            .publish(channel::CONNECTION_FAILED, &error.to_string())
            .await;
    }

    async fn announce_restored(&self) {
        tracing::info!("datastore connection restored");
        let _ = self.datastore.publish(channel::CONNECTION_RESTORED, "restored").await;
    }

    /// Ping the datastore once and report whether it answered within
    /// [`HEALTH_CHECK_BUDGET`].
    pub async fn health_check(&self) -> Result<Duration> {
        let start = Instant::now();
        self.datastore.server_info().await?;
        let elapsed = start.elapsed();
        if elapsed > HEALTH_CHECK_BUDGET {
            tracing::warn!(?elapsed, "health check exceeded budget");
        }
        Ok(elapsed)
    }

    /// Run `health_check` every `interval` until `token` is cancelled.
    pub async fn run_health_loop(self: Arc<Self>, interval: Duration, token: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = ticker.tick() => {
                    if let Err(error) = self.health_check().await {
                        let was_healthy = self.healthy.swap(false, Ordering::SeqCst);
                        if was_healthy {
                            self.announce_failed(&error).await;
                        }
                    } else {
                        let was_unhealthy = !self.healthy.swap(true, Ordering::SeqCst);
                        if was_unhealthy {
                            self.announce_restored().await;
                        }
                    }
                }
            }
        }
    }
}
