//! Two-tier result cache: an in-process L1 LRU and a
//! datastore-backed L2, both keyed by a canonical request fingerprint plus
//! the current index-version epoch so a write or rebuild invalidates en
//! masse without a scan.

use crate::query::{SearchRequest, SearchResult, SortBy};
use parking_lot::Mutex;
use propdex_core::document::PropertyDocument;
use propdex_core::{key, Result};
use propdex_datastore::Datastore;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic counter advanced by every committed mutation and by rebuild
/// completion; embedded in every cache key.
#[derive(Default)]
pub struct IndexVersion(AtomicU64);

impl IndexVersion {
    /// A fresh epoch counter starting at 0.
    pub fn new() -> Self {
        IndexVersion(AtomicU64::new(0))
    }

    /// Current epoch.
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Advance the epoch by one, returning the new value.
    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Serializable cached result.
#[derive(Serialize, Deserialize)]
struct CachedPage {
    items: Vec<PropertyDocument>,
    total_count: u64,
    page_number: u32,
    page_size: u32,
    total_pages: u32,
}

impl From<&SearchResult> for CachedPage {
    fn from(r: &SearchResult) -> Self {
        CachedPage {
            items: r.items.clone(),
            total_count: r.total_count,
            page_number: r.page_number,
            page_size: r.page_size,
            total_pages: r.total_pages,
        }
    }
}

impl From<CachedPage> for SearchResult {
    fn from(p: CachedPage) -> Self {
        SearchResult {
            items: p.items,
            total_count: p.total_count,
            page_number: p.page_number,
            page_size: p.page_size,
            total_pages: p.total_pages,
        }
    }
}

/// Compute a canonical fingerprint over every normalized request field plus
/// `epoch`, stable across field-order and default-value variance.
pub fn fingerprint(request: &SearchRequest, epoch: u64) -> String {
    let mut hasher = DefaultHasher::new();
    epoch.hash(&mut hasher);
    request.search_text.as_deref().unwrap_or("").hash(&mut hasher);
    request.city.as_deref().unwrap_or("").hash(&mut hasher);
    request.property_type_id.hash(&mut hasher);
    request.unit_type_id.hash(&mut hasher);
    request.price_range.map(|(a, b)| (a.0, b.0)).hash(&mut hasher);
    request.preferred_currency.as_ref().map(|c| c.0.clone()).hash(&mut hasher);
    request
        .min_rating
        .map(|r| (r * 1000.0) as i64)
        .hash(&mut hasher);
    request.min_adults.hash(&mut hasher);
    request.min_children.hash(&mut hasher);
    request.guests_count.hash(&mut hasher);
    request.check_in.map(|t| t.0).hash(&mut hasher);
    request.check_out.map(|t| t.0).hash(&mut hasher);
    if let Some((lon, lat, radius)) = request.geo {
        ((lon * 1e6) as i64, (lat * 1e6) as i64, (radius * 1e3) as i64).hash(&mut hasher);
    }
    let mut amenities = request.required_amenity_ids.clone();
    amenities.sort_unstable();
    amenities.hash(&mut hasher);
    let mut services = request.service_ids.clone();
    services.sort_unstable();
    services.hash(&mut hasher);
    let mut dynamic: Vec<(&String, &String)> = request.dynamic_field_filters.iter().collect();
    dynamic.sort_by_key(|(k, _)| k.as_str());
    dynamic.hash(&mut hasher);
    sort_by_discriminant(request.sort_by).hash(&mut hasher);
    request.page_number.hash(&mut hasher);
    request.page_size.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn sort_by_discriminant(sort_by: SortBy) -> u8 {
    match sort_by {
        SortBy::PriceAsc => 0,
        SortBy::PriceDesc => 1,
        SortBy::Rating => 2,
        SortBy::Newest => 3,
        SortBy::Popularity => 4,
        SortBy::Distance => 5,
    }
}

struct L1Entry {
    result: SearchResult,
    inserted_at: Instant,
}

/// An in-process, bounded, TTL-expiring LRU. Tracked by entry count as a proxy for memory
/// budget, since exact byte accounting would require walking every document.
pub struct L1Cache {
    entries: Mutex<HashMap<String, L1Entry>>,
    order: Mutex<VecDeque<String>>,
    capacity: usize,
    ttl: Duration,
}

const DEFAULT_L1_CAPACITY: usize = 2048;
const DEFAULT_L1_TTL: Duration = Duration::from_secs(60);

impl Default for L1Cache {
    fn default() -> Self {
        Self::new(DEFAULT_L1_CAPACITY, DEFAULT_L1_TTL)
    }
}

impl L1Cache {
    /// A bounded cache with the given entry capacity and per-entry TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        L1Cache {
            entries: Mutex::new(HashMap::new()),
            order: Mutex::new(VecDeque::new()),
            capacity,
            ttl,
        }
    }

    /// Look up `fingerprint`, evicting (and reporting a miss for) an expired entry.
    pub fn get(&self, fingerprint: &str) -> Option<SearchResult> {
        let mut entries = self.entries.lock();
        match entries.get(fingerprint) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.result.clone()),
            Some(_) => {
                entries.remove(fingerprint);
                None
            }
            None => None,
        }
    }

    /// Insert or refresh `fingerprint`, evicting the oldest entry if over capacity.
    pub fn put(&self, fingerprint: String, result: SearchResult) {
        let mut entries = self.entries.lock();
        let mut order = self.order.lock();
        if !entries.contains_key(&fingerprint) {
            order.push_back(fingerprint.clone());
        }
        entries.insert(fingerprint, L1Entry { result, inserted_at: Instant::now() });
        while entries.len() > self.capacity {
            if let Some(victim) = order.pop_front() {
                entries.remove(&victim);
            } else {
                break;
            }
        }
    }
}

/// Datastore-backed L2 cache, shared across instances.
pub struct L2Cache {
    datastore: Arc<dyn Datastore>,
    ttl: Duration,
}

const DEFAULT_L2_TTL: Duration = Duration::from_secs(600);

impl L2Cache {
    /// Wrap a datastore handle with the default 10-minute TTL.
    pub fn new(datastore: Arc<dyn Datastore>) -> Self {
        L2Cache { datastore, ttl: DEFAULT_L2_TTL }
    }

    /// Look up `fingerprint`. A value that fails to decode is treated as a
    /// miss and evicted.
    pub async fn get(&self, fingerprint: &str) -> Result<Option<SearchResult>> {
        let datastore_key = key::cache_search_l2(fingerprint);
        match self.datastore.stringget(&datastore_key).await? {
            Some(raw) => match serde_json::from_str::<CachedPage>(&raw) {
                Ok(page) => Ok(Some(page.into())),
                Err(_) => {
                    self.datastore.del(&datastore_key).await.ok();
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    /// Store `result` under `fingerprint` with this cache's TTL.
    pub async fn put(&self, fingerprint: &str, result: &SearchResult) -> Result<()> {
        let page = CachedPage::from(result);
        let raw = serde_json::to_string(&page).map_err(|e| propdex_core::Error::EncodingError(e.to_string()))?;
        self.datastore
            .stringset(&key::cache_search_l2(fingerprint), &raw, Some(self.ttl))
            .await
    }
}
