//! Core types for the property search engine
//!
//! This crate defines the shared vocabulary used by every other crate in the
//! workspace: the denormalized document model, the canonical
//! key schema, the document codec, and the
//! unified error type.
//!
//! Nothing in this crate talks to a datastore or an external oracle — it is
//! pure data and pure functions, so it has no async runtime dependency.

#![warn(missing_docs)]

pub mod codec;
pub mod document;
pub mod error;
pub mod external;
pub mod key;
pub mod limits;
pub mod normalize;
pub mod types;

pub use document::{AvailabilityRange, PriceType, PricingRule, PropertyDocument, UnitDocument};
pub use error::{Error, Result};
pub use types::{Currency, Money, PropertyId, Ticks, UnitId};
