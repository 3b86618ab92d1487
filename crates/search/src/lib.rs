//! Full-text search support for the property index: native-engine capability probing, the native query shape,
//! and the manual-scan fallback matcher.

#![warn(missing_docs)]

pub mod capability;
pub mod matcher;
pub mod native;

pub use capability::TextEngineCapability;
pub use native::{NativeQuery, NativeTextQuery};
