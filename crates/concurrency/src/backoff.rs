//! Exponential backoff with jitter, shared by reconnect and transient-error
//! retry.

use rand::Rng;
use std::time::Duration;

/// Backoff schedule: doubles each attempt from `base`, capped at `cap`, with
/// up to 50% jitter added on top so retrying callers do not thunder-herd.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
}

impl Backoff {
    /// A new backoff schedule.
    pub fn new(base: Duration, cap: Duration) -> Self {
        Backoff { base, cap }
    }

    /// Delay before the `attempt`-th retry (0-indexed).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self.base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let capped = exp.min(self.cap);
        let jitter_frac: f64 = rand::thread_rng().gen_range(0.0..0.5);
        capped + capped.mul_f64(jitter_frac)
    }
}

/// Retry `op` up to `attempts` times total, sleeping per `schedule` between
/// attempts, as long as `is_retryable` returns true for the error. Returns
/// the last error once attempts are exhausted.
pub async fn retry<T, E, F, Fut>(
    attempts: u32,
    schedule: Backoff,
    is_retryable: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut last_err = None;
    for attempt in 0..attempts {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if !is_retryable(&e) {
                    return Err(e);
                }
                tracing::warn!(attempt, "transient failure, retrying");
                last_err = Some(e);
                if attempt + 1 < attempts {
                    tokio::time::sleep(schedule.delay(attempt)).await;
                }
            }
        }
    }
    Err(last_err.expect("attempts >= 1"))
}
