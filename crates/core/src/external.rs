//! Consumed external interfaces: the authoritative systems this
//! engine projects from. Implementations live outside this workspace; tests
//! and `propdex-api` wire up in-memory fakes. These traits are defined here,
//! not in `propdex-api`, so both `propdex-engine` (the document builder and
//! query executor) and `propdex-api` (the facade) can depend on them without
//! a cycle between the two crates.

use crate::document::UnitDocument;
use crate::types::{Currency, Money, PropertyId, Ticks, UnitId};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::HashSet;

/// A property record as read from the authoritative store, before the
/// document builder merges in per-unit pricing and derived fields.
#[derive(Debug, Clone)]
pub struct PropertyRecord {
    /// Stable property id.
    pub id: PropertyId,
    /// Owning account id.
    pub owner_id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Street address.
    pub address: String,
    /// City name.
    pub city: String,
    /// Numeric property type id.
    pub property_type_id: i64,
    /// Declared star rating.
    pub star_rating: u8,
    /// Average guest rating.
    pub average_rating: f64,
    /// Review count.
    pub reviews_count: u64,
    /// Cumulative page views.
    pub view_count: u64,
    /// Cumulative completed bookings.
    pub booking_count: u64,
    /// Precomputed popularity score, when the authoritative store supplies one.
    pub popularity_score: f64,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Whether the property is active (not soft-deleted).
    pub is_active: bool,
    /// Whether the property has passed moderation/approval.
    pub is_approved: bool,
    /// Whether the property is featured.
    pub is_featured: bool,
    /// Image URLs.
    pub image_urls: Vec<String>,
    /// Service ids offered by this property.
    pub service_ids: Vec<i64>,
    /// Schema-defined dynamic attributes.
    pub dynamic_fields: HashMap<String, String>,
    /// Creation time.
    pub created_at: Ticks,
    /// Last update time.
    pub updated_at: Ticks,
}

/// A named amenity, as returned by [`PropertyRepository::get_property_amenities`].
#[derive(Debug, Clone)]
pub struct Amenity {
    /// Numeric amenity id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Whether the amenity is currently offered (vs. historically listed).
    pub is_available: bool,
}

/// A named property type, as returned by [`PropertyRepository::get_property_type_by_id`].
#[derive(Debug, Clone)]
pub struct PropertyType {
    /// Numeric type id.
    pub id: i64,
    /// Display name (e.g. "Apartment").
    pub name: String,
}

/// The authoritative property store.
#[async_trait]
pub trait PropertyRepository: Send + Sync {
    /// Read one property by id.
    async fn get_property_by_id(&self, id: PropertyId) -> Result<Option<PropertyRecord>>;
    /// All properties eligible for indexing (active, approved).
    async fn get_active_properties(&self) -> Result<Vec<PropertyId>>;
    /// Amenities offered by a property.
    async fn get_property_amenities(&self, id: PropertyId) -> Result<Vec<Amenity>>;
    /// Resolve a property type id to its display name.
    async fn get_property_type_by_id(&self, type_id: i64) -> Result<Option<PropertyType>>;
    /// Persist a property record update (used by callers outside this engine;
    /// the engine itself never calls this).
    async fn update_property(&self, id: PropertyId, record: PropertyRecord) -> Result<()>;
}

/// The authoritative unit store.
#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// Read one unit by id.
    async fn get_unit_by_id(&self, id: UnitId) -> Result<Option<UnitDocument>>;
    /// All units belonging to a property.
    async fn get_by_property_id(&self, property_id: PropertyId) -> Result<Vec<UnitDocument>>;
}

/// The pricing oracle: computes a total stay price for a unit
/// over `[check_in, check_out)`.
#[async_trait]
pub trait PricingService: Send + Sync {
    /// Total price for the stay, in the unit's own currency.
    async fn calculate_price(&self, unit_id: UnitId, check_in: Ticks, check_out: Ticks) -> Result<Money>;
}

/// The availability oracle, consumed only by the query executor.
#[async_trait]
pub trait AvailabilityService: Send + Sync {
    /// Unit ids within `property_id` available for `[check_in, check_out)`
    /// with capacity for `guests`.
    async fn get_available_units_in_property(
        &self,
        property_id: PropertyId,
        check_in: Ticks,
        check_out: Ticks,
        guests: u32,
    ) -> Result<HashSet<UnitId>>;
}

/// The currency oracle, consumed only by the query executor.
#[async_trait]
pub trait CurrencyExchangeRepository: Send + Sync {
    /// Spot rate to multiply an amount in `from` to get an amount in `to`.
    async fn get_exchange_rate(&self, from: Currency, to: Currency) -> Result<f64>;
    /// Convert `amount` from one currency to another.
    async fn convert_amount(&self, amount: Money, from: Currency, to: Currency) -> Result<Money>;
    /// Currencies this oracle can quote.
    async fn get_supported_currencies(&self) -> Result<Vec<Currency>>;
}
