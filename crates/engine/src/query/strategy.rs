//! Strategy selection and final
//! in-memory sort pass applied after documents are fetched, since a few sort
//! orders (distance, cross-currency price) cannot be expressed purely as a
//! sorted-set read.

use super::request::{SearchRequest, SortBy};
use propdex_core::external::CurrencyExchangeRepository;
use propdex_core::PropertyDocument;
use propdex_datastore::geo::haversine_km;

/// The four query strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Free-text query, native engine or manual scan.
    Text,
    /// Radius search against a geo set.
    Geo,
    /// Server-side-script-shaped filter, including date/availability checks.
    ComplexFilter,
    /// Tag-intersection filter with no text, dates, or geo.
    Simple,
}

impl Strategy {
    /// Choose a strategy for `request`, evaluating the selection rules in order.
    pub fn select(request: &SearchRequest) -> Strategy {
        if request.search_text.as_deref().is_some_and(|s| !s.trim().is_empty()) {
            return Strategy::Text;
        }
        if request.check_in.is_some() && request.check_out.is_some() {
            return Strategy::ComplexFilter;
        }
        if request.geo.is_some() {
            return Strategy::Geo;
        }
        let price_and_dates = request.price_range.is_some() && request.check_in.is_some() && request.check_out.is_some();
        if request.active_filter_count() >= 3 || price_and_dates {
            return Strategy::ComplexFilter;
        }
        Strategy::Simple
    }
}

/// Apply the requested sort order to an already-fetched page of documents.
/// Most orders are already sorted by the sorted-set read that produced the
/// id list; this pass re-sorts only when the strategy could not guarantee
/// order (Geo/Text/ComplexFilter candidate sets) or when the order needs
/// data outside the sort index (distance, cross-currency price).
pub async fn sort_in_place(
    documents: &mut [PropertyDocument],
    sort_by: SortBy,
    request: &SearchRequest,
    currency: Option<&dyn CurrencyExchangeRepository>,
) {
    match sort_by {
        SortBy::Distance => {
            if let Some((lon, lat, _)) = request.geo {
                documents.sort_by(|a, b| {
                    let da = haversine_km(lon, lat, a.longitude, a.latitude);
                    let db = haversine_km(lon, lat, b.longitude, b.latitude);
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                });
            }
        }
        SortBy::Rating => {
            documents.sort_by(|a, b| {
                b.average_rating
                    .partial_cmp(&a.average_rating)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.reviews_count.cmp(&a.reviews_count))
            });
        }
        SortBy::Popularity => {
            documents.sort_by(|a, b| {
                b.booking_count
                    .cmp(&a.booking_count)
                    .then_with(|| b.view_count.cmp(&a.view_count))
            });
        }
        SortBy::Newest => {
            documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        SortBy::PriceAsc | SortBy::PriceDesc => {
            if let (Some(target), Some(oracle)) = (&request.preferred_currency, currency) {
                let mut normalized: Vec<(f64, usize)> = Vec::with_capacity(documents.len());
                for (i, doc) in documents.iter().enumerate() {
                    let price = if doc.currency == *target {
                        Some(doc.min_price)
                    } else {
                        oracle
                            .convert_amount(doc.min_price, doc.currency.clone(), target.clone())
                            .await
                            .ok()
                    };
                    normalized.push((price.map(|p| p.as_f64()).unwrap_or(f64::MAX), i));
                }
                normalized.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
                if matches!(sort_by, SortBy::PriceDesc) {
                    normalized.reverse();
                }
                let reordered: Vec<PropertyDocument> =
                    normalized.into_iter().map(|(_, i)| documents[i].clone()).collect();
                documents.clone_from_slice(&reordered);
            } else {
                documents.sort_by(|a, b| a.min_price.cmp(&b.min_price));
                if matches!(sort_by, SortBy::PriceDesc) {
                    documents.reverse();
                }
            }
        }
    }
}
