//! The search request shape and its sort orders.

use propdex_core::{Currency, Error, Money, Result, Ticks};
use std::collections::HashMap;

/// Named sort orders a request may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Ascending by `min_price`.
    PriceAsc,
    /// Descending by `min_price`.
    PriceDesc,
    /// Descending by `average_rating`, tiebreak `reviews_count` desc.
    #[default]
    Rating,
    /// Descending by `created_at`.
    Newest,
    /// Descending by `booking_count`/`popularity_score`.
    Popularity,
    /// Ascending by haversine distance from the query coordinate.
    Distance,
}

impl SortBy {
    /// The property-level sort index this order reads from, or `None` for
    /// `Distance` (computed, not indexed).
    pub fn index_name(&self) -> Option<&'static str> {
        match self {
            SortBy::PriceAsc | SortBy::PriceDesc => Some("idx:price"),
            SortBy::Rating => Some("idx:rating"),
            SortBy::Newest => Some("idx:created"),
            SortBy::Popularity => Some("idx:popularity"),
            SortBy::Distance => None,
        }
    }

    /// Whether ascending score order should be read in reverse.
    pub fn descending(&self) -> bool {
        !matches!(self, SortBy::PriceAsc | SortBy::Distance)
    }
}

/// A search request.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Free-text query; any value present selects the Text strategy.
    pub search_text: Option<String>,
    /// City-tag filter.
    pub city: Option<String>,
    /// Numeric property-type id filter.
    pub property_type_id: Option<i64>,
    /// Unit-type id filter.
    pub unit_type_id: Option<i64>,
    /// Inclusive per-night price range.
    pub price_range: Option<(Money, Money)>,
    /// Currency the price range and sort should be expressed in.
    pub preferred_currency: Option<Currency>,
    /// Minimum average rating.
    pub min_rating: Option<f64>,
    /// Minimum adult capacity.
    pub min_adults: Option<u32>,
    /// Minimum child capacity.
    pub min_children: Option<u32>,
    /// Minimum total occupancy.
    pub guests_count: Option<u32>,
    /// Stay start, inclusive.
    pub check_in: Option<Ticks>,
    /// Stay end, exclusive.
    pub check_out: Option<Ticks>,
    /// Query coordinate and radius: `(longitude, latitude, radius_km)`.
    pub geo: Option<(f64, f64, f64)>,
    /// Amenities every result must offer.
    pub required_amenity_ids: Vec<i64>,
    /// Services every result must offer.
    pub service_ids: Vec<i64>,
    /// Case-insensitive dynamic-field equality filters.
    pub dynamic_field_filters: HashMap<String, String>,
    /// Requested sort order.
    pub sort_by: SortBy,
    /// 1-based page number.
    pub page_number: u32,
    /// Page size, in `[1, 200]`.
    pub page_size: u32,
}

impl SearchRequest {
    /// Validate request-shape invariants that must fail fast.
    pub fn validate(&self) -> Result<()> {
        if self.page_number < 1 {
            return Err(Error::InvalidInput("page_number must be >= 1".into()));
        }
        if self.page_size < 1 || self.page_size > 200 {
            return Err(Error::InvalidInput("page_size must be in [1, 200]".into()));
        }
        if let Some((min, max)) = self.price_range {
            if min.0 > max.0 {
                return Err(Error::InvalidInput("min_price must be <= max_price".into()));
            }
        }
        if let (Some(check_in), Some(check_out)) = (self.check_in, self.check_out) {
            if check_in >= check_out {
                return Err(Error::InvalidInput("check_in must precede check_out".into()));
            }
        }
        Ok(())
    }

    /// Count of "active filters" among {city, type, price-range, amenities,
    /// dates, dynamic fields}, used by strategy selection rule 4.
    pub fn active_filter_count(&self) -> usize {
        let mut n = 0;
        if self.city.is_some() {
            n += 1;
        }
        if self.property_type_id.is_some() {
            n += 1;
        }
        if self.price_range.is_some() {
            n += 1;
        }
        if !self.required_amenity_ids.is_empty() {
            n += 1;
        }
        if self.check_in.is_some() && self.check_out.is_some() {
            n += 1;
        }
        if !self.dynamic_field_filters.is_empty() {
            n += 1;
        }
        n
    }
}
