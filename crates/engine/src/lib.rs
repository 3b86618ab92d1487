//! `propdex-engine`: the five index-facing components of the property
//! search engine — document builder, index maintainer, query
//! planner/executor, cache layer, maintenance loop, and background
//! rebuilder — built over `propdex-datastore` and `propdex-concurrency`.

#![warn(missing_docs)]

pub mod builder;
pub mod cache;
pub mod maintainer;
pub mod maintenance;
pub mod query;
pub mod rebuild;

pub use builder::{BuildResult, DocumentBuilder};
pub use cache::{IndexVersion, L1Cache, L2Cache};
pub use maintainer::IndexMaintainer;
pub use maintenance::{MaintenanceScheduler, MaintenanceStats};
pub use query::{SearchExecutor, SearchRequest, SearchResult, SortBy, Strategy};
pub use rebuild::{IndexRebuilder, RebuildReport};
