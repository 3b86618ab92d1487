//! # propdex
//!
//! A denormalized property-search engine: index maintainer, query planner,
//! cache layer, and maintenance loop over an in-memory datastore.
//!
//! Properties and their units live in an authoritative store elsewhere; this
//! engine projects them into a denormalized index (flat hashes, tag sets,
//! sorted sets, a geo set) purpose-built for fast filtered search, and keeps
//! that index in sync as the authoritative data changes.
//!
//! # Quick start
//!
//! ```no_run
//! use propdex::{PropertySearchEngine, SearchRequest};
//! use std::sync::Arc;
//!
//! # async fn run(
//! #     datastore: Arc<dyn propdex::Datastore>,
//! #     properties: Arc<dyn propdex::external::PropertyRepository>,
//! #     units: Arc<dyn propdex::external::UnitRepository>,
//! #     pricing: Arc<dyn propdex::external::PricingService>,
//! #     locks: Arc<propdex::PropertyLockTable>,
//! #     capability: propdex::TextEngineCapability,
//! # ) -> propdex::Result<()> {
//! let engine = PropertySearchEngine::new(
//!     datastore, properties, units, pricing, None, None, locks, capability,
//! );
//!
//! let request = SearchRequest { city: Some("Sanaa".into()), page_number: 1, page_size: 20, ..Default::default() };
//! let page = engine.search(&request).await?;
//! println!("{} properties matched", page.total_count);
//! # Ok(())
//! # }
//! ```
//!
//! Internal crates (datastore, concurrency, engine) are workspace members
//! for testability but are not meant to be depended on directly; the public
//! surface is `propdex-api`'s [`PropertySearchEngine`], re-exported here.

pub use propdex_api::PropertySearchEngine;
pub use propdex_concurrency::PropertyLockTable;
pub use propdex_core::document::{AvailabilityRange, PriceType, PricingRule, PropertyDocument, UnitDocument};
pub use propdex_core::{external, Currency, Error, Money, PropertyId, Result, Ticks, UnitId};
pub use propdex_datastore::Datastore;
pub use propdex_engine::{
    IndexRebuilder, IndexVersion, L1Cache, L2Cache, MaintenanceScheduler, MaintenanceStats, RebuildReport,
    SearchExecutor, SearchRequest, SearchResult, SortBy, Strategy,
};
pub use propdex_search::TextEngineCapability;
