//! Query planner & executor: strategy selection between
//! `Text`, `Geo`, `ComplexFilter`, and `Simple`, candidate assembly via set
//! intersection, range filtering via sorted sets, and pagination.

mod request;
mod strategy;

pub use request::{SearchRequest, SortBy};
pub use strategy::Strategy;

use propdex_core::codec::decode_snapshot_hex;
use propdex_core::external::{AvailabilityService, CurrencyExchangeRepository};
use propdex_core::{key, Currency, Error, Money, PropertyDocument, Result};
use propdex_datastore::Datastore;
use propdex_search::{NativeTextQuery, TextEngineCapability};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// A page of search results.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The materialized documents for this page.
    pub items: Vec<PropertyDocument>,
    /// Total candidates matched before pagination.
    pub total_count: u64,
    /// Requested page number (1-based).
    pub page_number: u32,
    /// Requested page size.
    pub page_size: u32,
    /// `ceil(total_count / page_size)`.
    pub total_pages: u32,
}

/// Executes search requests against the datastore, the text-search
/// capability, and (when needed) the currency and availability oracles.
pub struct SearchExecutor {
    datastore: Arc<dyn Datastore>,
    capability: TextEngineCapability,
    native: Option<Arc<dyn NativeTextQuery>>,
    currency: Option<Arc<dyn CurrencyExchangeRepository>>,
    availability: Option<Arc<dyn AvailabilityService>>,
}

impl SearchExecutor {
    /// Wire the executor to its datastore; the native engine and external
    /// oracles are optional (production deployments without them degrade to
    /// the manual paths the spec names).
    pub fn new(datastore: Arc<dyn Datastore>, capability: TextEngineCapability) -> Self {
        SearchExecutor {
            datastore,
            capability,
            native: None,
            currency: None,
            availability: None,
        }
    }

    /// Attach a native full-text engine query implementation.
    pub fn with_native(mut self, native: Arc<dyn NativeTextQuery>) -> Self {
        self.native = Some(native);
        self
    }

    /// Attach the currency oracle, enabling cross-currency price filtering
    /// and sorting.
    pub fn with_currency(mut self, currency: Arc<dyn CurrencyExchangeRepository>) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Attach the availability oracle, enabling `ComplexFilter` date checks.
    pub fn with_availability(mut self, availability: Arc<dyn AvailabilityService>) -> Self {
        self.availability = Some(availability);
        self
    }

    /// Execute `request`, selecting a strategy and
    /// returning a materialized page of results.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult> {
        request.validate()?;
        let strategy = Strategy::select(request);
        let (ids, total) = match strategy {
            Strategy::Text => self.text_search(request).await?,
            Strategy::Geo => self.geo_search(request).await?,
            Strategy::ComplexFilter => self.complex_filter(request).await?,
            Strategy::Simple => self.simple_search(request).await?,
        };

        let mut documents = Vec::with_capacity(ids.len());
        for id in &ids {
            if let Some(doc) = self.fetch_document(id).await? {
                documents.push(doc);
            }
        }
        strategy::sort_in_place(&mut documents, request.sort_by, request, self.currency.as_deref()).await;

        Ok(SearchResult {
            items: documents,
            total_count: total,
            page_number: request.page_number,
            page_size: request.page_size,
            total_pages: total_pages(total, request.page_size),
        })
    }

    async fn fetch_document(&self, id: &str) -> Result<Option<PropertyDocument>> {
        match self.datastore.stringget(&format!("property:{id}:bin")).await? {
            Some(hex) => Ok(Some(decode_snapshot_hex(&hex)?)),
            None => Ok(None),
        }
    }

    /// Assemble the candidate id set via `sinterstore` over `properties:all`
    /// plus the optional tag filters `request` names.
    async fn tag_candidates(&self, request: &SearchRequest) -> Result<HashSet<String>> {
        let mut sources = vec![key::all_properties()];
        if let Some(city) = &request.city {
            sources.push(key::tag_city(city));
        }
        if let Some(type_id) = request.property_type_id {
            sources.push(key::tag_type_id(type_id));
        }
        for amenity_id in &request.required_amenity_ids {
            sources.push(key::tag_amenity(*amenity_id));
        }
        for service_id in &request.service_ids {
            sources.push(key::tag_service(*service_id));
        }
        for (field, value) in &request.dynamic_field_filters {
            sources.push(key::dynamic_value(field, &value.to_lowercase()));
        }

        let dest = key::temp_key("search:candidates", Uuid::new_v4());
        self.datastore.sinterstore(&dest, &sources).await?;
        let members = self.datastore.smembers(&dest).await?;
        self.datastore.del(&dest).await.ok();
        Ok(members)
    }

    /// Narrow `candidates` to those whose score in `index_name` falls within
    /// `[min, max]`, via a temp-set intersection.
    async fn filter_by_range(
        &self,
        candidates: HashSet<String>,
        index_name: &str,
        min: f64,
        max: f64,
    ) -> Result<HashSet<String>> {
        let in_range = self.datastore.zrangebyscore(index_name, min, max).await?;
        let qualifying: HashSet<String> = in_range.into_iter().map(|(id, _)| id).collect();
        Ok(candidates.intersection(&qualifying).cloned().collect())
    }

    async fn simple_search(&self, request: &SearchRequest) -> Result<(Vec<String>, u64)> {
        let mut candidates = self.tag_candidates(request).await?;

        if let Some((min, max)) = request.price_range {
            candidates = self
                .filter_by_range(candidates, "idx:price", min.as_f64(), max.as_f64())
                .await?;
        }
        if let Some(min_rating) = request.min_rating {
            candidates = self.filter_by_range(candidates, "idx:rating", min_rating, f64::MAX).await?;
        }
        if let Some(min_adults) = request.min_adults {
            candidates = self
                .filter_by_range(candidates, "idx:max_adults", min_adults as f64, f64::MAX)
                .await?;
        }
        if let Some(min_children) = request.min_children {
            candidates = self
                .filter_by_range(candidates, "idx:max_children", min_children as f64, f64::MAX)
                .await?;
        }
        if let Some(guests) = request.guests_count {
            candidates = self
                .filter_by_range(candidates, "idx:max_capacity", guests as f64, f64::MAX)
                .await?;
        }

        if candidates.is_empty() {
            return Ok((vec![], 0));
        }

        let sort_index = request.sort_by.index_name();
        let score_key = key::temp_key("search:scores", Uuid::new_v4());
        for id in &candidates {
            self.datastore.zadd(&score_key, id, 0.0).await?;
        }
        let final_key = key::temp_key("search:final", Uuid::new_v4());
        let sort_index = sort_index.unwrap_or("idx:rating");
        self.datastore
            .zinterstore(&final_key, &[(sort_index.to_string(), 1.0), (score_key.clone(), 0.0)])
            .await?;

        let total = self.datastore.zcard(&final_key).await? as u64;
        let ids = self.page_from_sorted_set(&final_key, request).await?;

        self.datastore.del(&score_key).await.ok();
        self.datastore.del(&final_key).await.ok();
        Ok((ids, total))
    }

    async fn geo_search(&self, request: &SearchRequest) -> Result<(Vec<String>, u64)> {
        let (lon, lat, radius) = request
            .geo
            .ok_or_else(|| Error::InvalidInput("geo search requires latitude/longitude/radius".into()))?;
        let geo_key = match &request.city {
            Some(city) => key::geo_city(city),
            None => key::geo_properties(),
        };
        let hits = self.datastore.georadius(&geo_key, lon, lat, radius, 100).await?;
        let mut ids: Vec<String> = hits.into_iter().map(|(id, _)| id).collect();

        let mut matched = Vec::new();
        for id in &ids {
            if let Some(doc) = self.fetch_document(id).await? {
                if self.matches_remaining_filters(&doc, request).await {
                    matched.push(id.clone());
                }
            }
        }
        ids = matched;
        let total = ids.len() as u64;
        Ok((paginate(ids, request), total))
    }

    async fn complex_filter(&self, request: &SearchRequest) -> Result<(Vec<String>, u64)> {
        use propdex_datastore::types::ScriptOutput;

        match self
            .datastore
            .scripteval(key::scripts::SEARCH_COMPLEX, &[key::all_properties()], &[])
            .await
        {
            Ok(ScriptOutput::Page { total, ids }) => Ok((ids, total)),
            // `ScriptError` degrades to the manual path for the same
            // strategy; this workspace's in-memory datastore
            // has no scripting engine, so this is always the live path.
            _ => self.complex_filter_manual(request).await,
        }
    }

    /// The manual equivalent of the `lua:search:complex` script, run directly since this workspace's
    /// in-memory datastore has no scripting engine of its own.
    async fn complex_filter_manual(&self, request: &SearchRequest) -> Result<(Vec<String>, u64)> {
        let candidates = self.tag_candidates(request).await?;
        let mut matched = Vec::new();
        for id in candidates {
            let Some(doc) = self.fetch_document(&id).await? else { continue };
            if !self.matches_remaining_filters(&doc, request).await {
                continue;
            }
            if let (Some(check_in), Some(check_out)) = (request.check_in, request.check_out) {
                let guests = request.guests_count.unwrap_or(1);
                let available = match &self.availability {
                    Some(service) => service
                        .get_available_units_in_property(doc.id, check_in, check_out, guests)
                        .await
                        .map(|set| !set.is_empty())
                        .unwrap_or(false),
                    None => false,
                };
                if !available {
                    continue;
                }
            }
            matched.push(id);
        }
        let total = matched.len() as u64;
        Ok((paginate(matched, request), total))
    }

    async fn text_search(&self, request: &SearchRequest) -> Result<(Vec<String>, u64)> {
        let tokens = propdex_core::normalize::tokenize(request.search_text.as_deref().unwrap_or(""));

        if self.capability.is_available() {
            if let Some(native) = &self.native {
                let query = propdex_search::NativeQuery {
                    tokens: tokens.clone(),
                    city: request.city.clone(),
                    property_type: request.property_type_id.map(|id| id.to_string()),
                    price_range: request.price_range.map(|(a, b)| (a.0, b.0)),
                    min_rating: request.min_rating,
                    min_capacity: request.guests_count,
                };
                if let Ok(Some(ids)) = native.query(&query).await {
                    if !ids.is_empty() {
                        let ids: Vec<String> = ids.into_iter().map(|id| id.to_string()).collect();
                        let total = ids.len() as u64;
                        return Ok((paginate(ids, request), total));
                    }
                }
            }
        }

        // Manual fallback: scan all properties, keep those whose normalized
        // fields contain any token, then apply the remaining filters.
        let all_ids = self.datastore.smembers(&key::all_properties()).await?;
        let mut matched = Vec::new();
        for id in all_ids {
            let Some(doc) = self.fetch_document(&id).await? else { continue };
            if !propdex_search::matcher::matches(&doc, &tokens) {
                continue;
            }
            if !self.matches_remaining_filters(&doc, request).await {
                continue;
            }
            matched.push(id);
        }
        let total = matched.len() as u64;
        Ok((paginate(matched, request), total))
    }

    /// In-memory predicate check for filters not already enforced by the
    /// candidate set (used by the Geo, ComplexFilter, and Text manual paths).
    async fn matches_remaining_filters(&self, doc: &PropertyDocument, request: &SearchRequest) -> bool {
        if !doc.is_searchable() {
            return false;
        }
        if let Some(city) = &request.city {
            if &doc.city != city {
                return false;
            }
        }
        if let Some(type_id) = request.property_type_id {
            if doc.property_type_id != type_id {
                return false;
            }
        }
        if let Some(min_rating) = request.min_rating {
            if doc.average_rating < min_rating {
                return false;
            }
        }
        for amenity_id in &request.required_amenity_ids {
            if !doc.amenity_ids.contains(amenity_id) {
                return false;
            }
        }
        for service_id in &request.service_ids {
            if !doc.service_ids.contains(service_id) {
                return false;
            }
        }
        for (field, value) in &request.dynamic_field_filters {
            match doc.dynamic_fields.get(field) {
                Some(actual) if actual.eq_ignore_ascii_case(value) => {}
                _ => return false,
            }
        }
        if let Some((min, max)) = request.price_range {
            match self.price_in_range(doc, min, max, request.preferred_currency.as_ref()).await {
                Some(ok) if ok => {}
                _ => return false,
            }
        }
        true
    }

    async fn price_in_range(&self, doc: &PropertyDocument, min: Money, max: Money, preferred: Option<&Currency>) -> Option<bool> {
        match preferred {
            None => Some(doc.min_price.0 >= min.0 && doc.min_price.0 <= max.0),
            Some(target) if *target == doc.currency => {
                Some(doc.min_price.0 >= min.0 && doc.min_price.0 <= max.0)
            }
            Some(target) => {
                let oracle = self.currency.as_ref()?;
                let converted = oracle
                    .convert_amount(doc.min_price, doc.currency.clone(), target.clone())
                    .await
                    .ok()?;
                Some(converted.0 >= min.0 && converted.0 <= max.0)
            }
        }
    }

    async fn page_from_sorted_set(&self, key: &str, request: &SearchRequest) -> Result<Vec<String>> {
        let start = ((request.page_number - 1) * request.page_size) as i64;
        let stop = start + request.page_size as i64 - 1;
        if request.sort_by.descending() {
            self.datastore.zrevrange(key, start, stop).await
        } else {
            self.datastore.zrange(key, start, stop).await
        }
    }
}

fn paginate(mut ids: Vec<String>, request: &SearchRequest) -> Vec<String> {
    let start = ((request.page_number - 1) * request.page_size) as usize;
    if start >= ids.len() {
        return vec![];
    }
    let end = (start + request.page_size as usize).min(ids.len());
    ids.drain(..start);
    ids.truncate(end - start);
    ids
}

fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    ((total as f64) / (page_size as f64)).ceil() as u32
}
