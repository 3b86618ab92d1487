//! Per-operation-class circuit breaker: opens after
//! [`propdex_core::limits::CIRCUIT_BREAKER_FAILURE_THRESHOLD`] failures within
//! [`propdex_core::limits::CIRCUIT_BREAKER_WINDOW_SECS`], half-opens after
//! [`propdex_core::limits::CIRCUIT_BREAKER_HALF_OPEN_SECS`].

use parking_lot::Mutex;
use propdex_core::limits::{
    CIRCUIT_BREAKER_FAILURE_THRESHOLD, CIRCUIT_BREAKER_HALF_OPEN_SECS, CIRCUIT_BREAKER_WINDOW_SECS,
};
use propdex_core::Error;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

struct Inner {
    state: State,
    failures: Vec<Instant>,
    opened_at: Option<Instant>,
}

/// Tracks recent failures for one operation class and decides whether calls
/// should be let through, rejected outright, or allowed through as a
/// half-open probe.
pub struct CircuitBreaker {
    name: String,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// A new, closed breaker for the named operation class.
    pub fn new(name: impl Into<String>) -> Self {
        CircuitBreaker {
            name: name.into(),
            inner: Mutex::new(Inner {
                state: State::Closed,
                failures: Vec::new(),
                opened_at: None,
            }),
        }
    }

    /// Whether a call should be admitted right now.
    pub fn allow(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Closed => true,
            State::Open => {
                let opened_at = inner.opened_at.expect("open state always sets opened_at");
                if opened_at.elapsed() >= Duration::from_secs(CIRCUIT_BREAKER_HALF_OPEN_SECS) {
                    inner.state = State::HalfOpen;
                    tracing::info!(breaker = %self.name, "circuit half-open, admitting probe");
                    true
                } else {
                    false
                }
            }
            State::HalfOpen => true,
        }
    }

    /// Record a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != State::Closed {
            tracing::info!(breaker = %self.name, "circuit closed after successful probe");
        }
        inner.state = State::Closed;
        inner.failures.clear();
        inner.opened_at = None;
    }

    /// Record a failed call, opening the breaker if the failure threshold is
    /// crossed within the window.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        let window = Duration::from_secs(CIRCUIT_BREAKER_WINDOW_SECS);
        inner.failures.retain(|&t| now.duration_since(t) <= window);
        inner.failures.push(now);
        if inner.state == State::HalfOpen || inner.failures.len() as u32 >= CIRCUIT_BREAKER_FAILURE_THRESHOLD {
            inner.state = State::Open;
            inner.opened_at = Some(now);
            tracing::warn!(breaker = %self.name, "circuit open");
        }
    }

    /// Error to surface to a caller rejected by an open breaker.
    pub fn rejection_error(&self) -> Error {
        Error::RateLimited(format!("circuit open for {}", self.name))
    }
}
