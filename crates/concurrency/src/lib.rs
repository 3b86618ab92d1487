//! Connection lifecycle and admission control.
//!
//! Owns the one multiplexed datastore connection, the write/search admission
//! gates, the per-property-id lock table used to serialize mutations, and a
//! minimal cancellation token — the pieces of the concurrency model that sit
//! between the engine and the datastore capability surface.

#![warn(missing_docs)]

pub mod backoff;
pub mod cancellation;
pub mod circuit_breaker;
pub mod connection;
pub mod gates;
pub mod lock_table;

pub use cancellation::CancellationToken;
pub use circuit_breaker::CircuitBreaker;
pub use connection::ConnectionManager;
pub use gates::Gates;
pub use lock_table::PropertyLockTable;
