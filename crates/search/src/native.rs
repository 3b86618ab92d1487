//! The shape of a query sent to a native full-text engine, and the trait the
//! query executor (`propdex-engine::query`) depends on to issue one. No real
//! engine ships in this workspace; `propdex_datastore::memory::InMemoryDatastore`
//! has no native engine, so production callers construct a
//! [`TextEngineCapability`](crate::capability::TextEngineCapability) that
//! always reports unavailable and always falls through to the manual path —
//! test fixtures may supply a capability that returns `true` and a
//! `NativeTextQuery` implementation to exercise that branch.

use propdex_core::PropertyId;
use propdex_core::Result;

/// A native-engine query built by the executor from a search request.
#[derive(Debug, Clone, Default)]
pub struct NativeQuery {
    /// Tokens to match against name/description/dynamic fields, each
    /// intended to be issued as a prefix-wildcard term by the engine.
    pub tokens: Vec<String>,
    /// Optional city tag constraint.
    pub city: Option<String>,
    /// Optional property-type tag constraint (id or name).
    pub property_type: Option<String>,
    /// Inclusive price range, in minor units of the request's currency.
    pub price_range: Option<(i64, i64)>,
    /// Minimum rating.
    pub min_rating: Option<f64>,
    /// Minimum capacity.
    pub min_capacity: Option<u32>,
}

/// Issues a built [`NativeQuery`] against a native engine. Returns `Ok(None)`
/// when the engine is unavailable or returns empty, signalling the caller to
/// fall back to the manual path.
#[async_trait::async_trait]
pub trait NativeTextQuery: Send + Sync {
    /// Execute `query`, returning matching ids in engine-ranked order, or
    /// `None` if the engine could not answer (caller falls back to manual).
    async fn query(&self, query: &NativeQuery) -> Result<Option<Vec<PropertyId>>>;
}
