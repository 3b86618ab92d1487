//! The denormalized document model: `PropertyDocument`, `UnitDocument`,
//! `AvailabilityRange`, and `PricingRule`.

use crate::types::{Currency, Money, PropertyId, Ticks, UnitId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Denormalized unit of indexing for a single property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDocument {
    // Identity
    /// Stable property id.
    pub id: PropertyId,
    /// Owning user/account id.
    pub owner_id: String,

    // Descriptive
    /// Display name.
    pub name: String,
    /// Lowercased, diacritic-stripped `name`, used for text search.
    pub name_normalized: String,
    /// Free-form description.
    pub description: String,
    /// Street address.
    pub address: String,
    /// City name, used as the `tag:city:{city}` membership value.
    pub city: String,
    /// Human-readable property type (e.g. "Apartment").
    pub property_type_name: String,
    /// Numeric property type id.
    pub property_type_id: i64,

    // Quantitative
    /// Minimum per-night price across units, today's one-night window.
    pub min_price: Money,
    /// Maximum per-night price across units, today's one-night window.
    pub max_price: Money,
    /// Currency of `min_price`/`max_price`.
    pub currency: Currency,
    /// Declared star rating (e.g. hotel class), 0 if unset.
    pub star_rating: u8,
    /// Average guest rating, 0.0 if no reviews.
    pub average_rating: f64,
    /// Number of reviews contributing to `average_rating`.
    pub reviews_count: u64,
    /// Cumulative page views.
    pub view_count: u64,
    /// Cumulative completed bookings.
    pub booking_count: u64,
    /// Maximum capacity across units.
    pub max_capacity: u32,
    /// Number of units (`unit_ids.len()`, kept denormalized for fast reads).
    pub units_count: u32,
    /// Precomputed popularity score, when available, used by `sort_by=popularity`.
    pub popularity_score: f64,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,

    // Flags
    /// Whether the property is active (not soft-deleted).
    pub is_active: bool,
    /// Whether the property has passed moderation/approval.
    pub is_approved: bool,
    /// Whether the property is featured.
    pub is_featured: bool,
    /// Whether the property is currently indexed (controls visibility to search).
    pub is_indexed: bool,

    // Collections
    /// Ids of all units belonging to this property.
    pub unit_ids: Vec<UnitId>,
    /// Distinct unit type ids across `unit_ids`.
    pub unit_type_ids: Vec<i64>,
    /// Amenity ids offered by this property.
    pub amenity_ids: Vec<i64>,
    /// Service ids offered by this property.
    pub service_ids: Vec<i64>,
    /// Image URLs.
    pub image_urls: Vec<String>,
    /// Schema-defined dynamic attributes, name -> scalar string value.
    pub dynamic_fields: HashMap<String, String>,

    // Timestamps
    /// Creation time.
    pub created_at: Ticks,
    /// Last update time.
    pub updated_at: Ticks,
    /// Tick count of the last mutation observed by the maintainer, used to
    /// break ties in drift detection during maintenance.
    pub last_modified_ticks: Ticks,
}

impl PropertyDocument {
    /// Whether this document satisfies the "eligible for search" predicate:
    /// active, approved, and indexed.
    pub fn is_searchable(&self) -> bool {
        self.is_active && self.is_approved && self.is_indexed
    }
}

/// Per-unit document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDocument {
    /// Stable unit id.
    pub id: UnitId,
    /// Owning property id.
    pub property_id: PropertyId,
    /// Numeric unit type id.
    pub unit_type_id: i64,
    /// Display name.
    pub name: String,
    /// Maximum total occupancy.
    pub max_capacity: u32,
    /// Maximum adult occupancy.
    pub max_adults: u32,
    /// Maximum child occupancy.
    pub max_children: u32,
    /// List/base per-night price before pricing-rule overrides.
    pub base_price: Money,
    /// Currency of `base_price`.
    pub currency: Currency,
}

/// A half-open `[start_tick, end_tick)` interval during which a unit is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRange {
    /// Inclusive start tick.
    pub start_tick: Ticks,
    /// Exclusive end tick.
    pub end_tick: Ticks,
}

impl AvailabilityRange {
    /// Whether this interval fully covers `[check_in, check_out)`.
    pub fn covers(&self, check_in: Ticks, check_out: Ticks) -> bool {
        self.start_tick <= check_in && self.end_tick >= check_out
    }
}

/// The kind of price a `PricingRule` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceType {
    /// The nightly base rate.
    Nightly,
    /// A seasonal override.
    Seasonal,
    /// A promotional discount.
    Promotion,
}

/// A priced interval for a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRule {
    /// Inclusive start tick.
    pub start_tick: Ticks,
    /// Exclusive end tick.
    pub end_tick: Ticks,
    /// Price for the interval.
    pub price: Money,
    /// Currency of `price`.
    pub currency: Currency,
    /// Which kind of rule this is.
    pub price_type: PriceType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_covers_exact_boundary() {
        let r = AvailabilityRange {
            start_tick: Ticks(0),
            end_tick: Ticks(100),
        };
        assert!(r.covers(Ticks(0), Ticks(100)));
        assert!(r.covers(Ticks(10), Ticks(90)));
        assert!(!r.covers(Ticks(0), Ticks(101)));
        assert!(!r.covers(Ticks(-1), Ticks(100)));
    }

    #[test]
    fn is_searchable_requires_all_three_flags() {
        let mut doc = sample_doc();
        assert!(doc.is_searchable());
        doc.is_active = false;
        assert!(!doc.is_searchable());
    }

    fn sample_doc() -> PropertyDocument {
        PropertyDocument {
            id: PropertyId::new(),
            owner_id: "owner".into(),
            name: "Test".into(),
            name_normalized: "test".into(),
            description: String::new(),
            address: String::new(),
            city: "Sanaa".into(),
            property_type_name: "Hotel".into(),
            property_type_id: 1,
            min_price: Money::ZERO,
            max_price: Money::ZERO,
            currency: Currency::new("USD"),
            star_rating: 0,
            average_rating: 0.0,
            reviews_count: 0,
            view_count: 0,
            booking_count: 0,
            max_capacity: 0,
            units_count: 0,
            popularity_score: 0.0,
            latitude: 0.0,
            longitude: 0.0,
            is_active: true,
            is_approved: true,
            is_featured: false,
            is_indexed: true,
            unit_ids: vec![],
            unit_type_ids: vec![],
            amenity_ids: vec![],
            service_ids: vec![],
            image_urls: vec![],
            dynamic_fields: HashMap::new(),
            created_at: Ticks(0),
            updated_at: Ticks(0),
            last_modified_ticks: Ticks(0),
        }
    }
}
