//! End-to-end search scenarios covering filtering, cross-currency price
//! ranges, geo radius search, availability-aware complex filters, text
//! search fallback, and concurrent mutation.

use async_trait::async_trait;
use propdex::external::{AvailabilityService, CurrencyExchangeRepository, PricingService, PropertyRepository, UnitRepository};
use propdex::{
    AvailabilityRange, Currency, Datastore, Money, PropertyDocument, PropertyId, PropertyLockTable,
    PropertySearchEngine, Result, SearchRequest, SortBy, TextEngineCapability, Ticks, UnitDocument, UnitId,
};
use propdex_core::external::{Amenity, PropertyRecord, PropertyType};
use propdex_datastore::memory::InMemoryDatastore;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

struct FixtureProperties(Mutex<HashMap<PropertyId, PropertyRecord>>);

#[async_trait]
impl PropertyRepository for FixtureProperties {
    async fn get_property_by_id(&self, id: PropertyId) -> Result<Option<PropertyRecord>> {
        Ok(self.0.lock().unwrap().get(&id).cloned())
    }
    async fn get_active_properties(&self) -> Result<Vec<PropertyId>> {
        Ok(self.0.lock().unwrap().values().filter(|r| r.is_active).map(|r| r.id).collect())
    }
    async fn get_property_amenities(&self, _id: PropertyId) -> Result<Vec<Amenity>> {
        Ok(vec![])
    }
    async fn get_property_type_by_id(&self, type_id: i64) -> Result<Option<PropertyType>> {
        Ok(Some(PropertyType { id: type_id, name: "Hotel".into() }))
    }
    async fn update_property(&self, id: PropertyId, record: PropertyRecord) -> Result<()> {
        self.0.lock().unwrap().insert(id, record);
        Ok(())
    }
}

struct FixtureUnits(Mutex<HashMap<PropertyId, Vec<UnitDocument>>>);

#[async_trait]
impl UnitRepository for FixtureUnits {
    async fn get_unit_by_id(&self, id: UnitId) -> Result<Option<UnitDocument>> {
        Ok(self.0.lock().unwrap().values().flatten().find(|u| u.id == id).cloned())
    }
    async fn get_by_property_id(&self, property_id: PropertyId) -> Result<Vec<UnitDocument>> {
        Ok(self.0.lock().unwrap().get(&property_id).cloned().unwrap_or_default())
    }
}

struct FixturePricing(Mutex<HashMap<UnitId, Money>>);

#[async_trait]
impl PricingService for FixturePricing {
    async fn calculate_price(&self, unit_id: UnitId, _check_in: Ticks, _check_out: Ticks) -> Result<Money> {
        Ok(*self.0.lock().unwrap().get(&unit_id).unwrap_or(&Money::ZERO))
    }
}

/// Keyed by unit id; each entry also records the owning property so the
/// fixture can honor `property_id` scoping the same way a real oracle would.
struct FixtureAvailability(Mutex<HashMap<UnitId, (PropertyId, Vec<AvailabilityRange>)>>);

#[async_trait]
impl AvailabilityService for FixtureAvailability {
    async fn get_available_units_in_property(
        &self,
        property_id: PropertyId,
        check_in: Ticks,
        check_out: Ticks,
        guests: u32,
    ) -> Result<HashSet<UnitId>> {
        let _ = guests;
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, (owner, ranges))| *owner == property_id && ranges.iter().any(|r| r.covers(check_in, check_out)))
            .map(|(id, _)| *id)
            .collect())
    }
}

struct FixtureCurrency {
    rates: HashMap<(String, String), f64>,
}

#[async_trait]
impl CurrencyExchangeRepository for FixtureCurrency {
    async fn get_exchange_rate(&self, from: Currency, to: Currency) -> Result<f64> {
        Ok(*self.rates.get(&(from.0, to.0)).unwrap_or(&1.0))
    }
    async fn convert_amount(&self, amount: Money, from: Currency, to: Currency) -> Result<Money> {
        let rate = self.get_exchange_rate(from, to).await?;
        Ok(Money((amount.0 as f64 * rate).round() as i64))
    }
    async fn get_supported_currencies(&self) -> Result<Vec<Currency>> {
        Ok(vec![Currency::new("USD"), Currency::new("YER")])
    }
}

fn record(id: PropertyId, city: &str, rating: f64, lat: f64, lon: f64) -> PropertyRecord {
    PropertyRecord {
        id,
        owner_id: "owner".into(),
        name: "Hotel".into(),
        description: String::new(),
        address: String::new(),
        city: city.into(),
        property_type_id: 1,
        star_rating: 3,
        average_rating: rating,
        reviews_count: 10,
        view_count: 0,
        booking_count: 0,
        popularity_score: 0.0,
        latitude: lat,
        longitude: lon,
        is_active: true,
        is_approved: true,
        is_featured: false,
        image_urls: vec![],
        service_ids: vec![],
        dynamic_fields: HashMap::new(),
        created_at: Ticks(0),
        updated_at: Ticks(0),
    }
}

struct Harness {
    engine: PropertySearchEngine,
    properties: Arc<FixtureProperties>,
    units: Arc<FixtureUnits>,
    pricing: Arc<FixturePricing>,
}

fn build_harness(availability: Option<Arc<dyn AvailabilityService>>, currency: Option<Arc<dyn CurrencyExchangeRepository>>) -> Harness {
    let datastore: Arc<dyn Datastore> = Arc::new(InMemoryDatastore::new());
    let properties = Arc::new(FixtureProperties(Mutex::new(HashMap::new())));
    let units = Arc::new(FixtureUnits(Mutex::new(HashMap::new())));
    let pricing = Arc::new(FixturePricing(Mutex::new(HashMap::new())));
    let locks = Arc::new(PropertyLockTable::new());

    let engine = PropertySearchEngine::new(
        datastore,
        properties.clone(),
        units.clone(),
        pricing.clone(),
        availability,
        currency,
        locks,
        TextEngineCapability::always(false),
    );

    Harness { engine, properties, units, pricing }
}

fn ids_in(docs: &[PropertyDocument]) -> Vec<PropertyId> {
    docs.iter().map(|d| d.id).collect()
}

#[tokio::test]
async fn scenario_1_simple_filter_plus_city() {
    let h = build_harness(None, None);
    let mut sanaa_ids = Vec::new();

    for i in 0..50 {
        let id = PropertyId::new();
        let in_sanaa = i < 17;
        let city = if in_sanaa { "Sanaa" } else { "Aden" };
        let rating = 1.5 + (i as f64 % 17.0) * (3.4 / 17.0);
        h.properties.0.lock().unwrap().insert(id, record(id, city, rating, 15.0, 44.0));
        if in_sanaa {
            sanaa_ids.push(id);
        }
        h.engine.on_property_created(id).await.unwrap();
    }

    let request = SearchRequest {
        city: Some("Sanaa".into()),
        sort_by: SortBy::Rating,
        page_number: 1,
        page_size: 20,
        ..Default::default()
    };
    let result = h.engine.search(&request).await.unwrap();

    assert_eq!(result.total_count, 17);
    assert!(result.items.iter().all(|d| d.city == "Sanaa"));
    for pair in result.items.windows(2) {
        assert!(pair[0].average_rating >= pair[1].average_rating);
    }
}

#[tokio::test]
async fn scenario_2_price_range_cross_currency() {
    let currency: Arc<dyn CurrencyExchangeRepository> = Arc::new(FixtureCurrency {
        rates: [(("USD".to_string(), "YER".to_string()), 500.0), (("YER".to_string(), "USD".to_string()), 1.0 / 500.0)]
            .into_iter()
            .collect(),
    });
    let h = build_harness(None, Some(currency));

    let cheap = make_property(&h, "Sanaa", Money::from_major_minor(95, 0), Currency::new("USD")).await;
    let mid = make_property(&h, "Sanaa", Money::from_major_minor(450, 0), Currency::new("USD")).await;
    let expensive_yer = make_property(&h, "Sanaa", Money::from_major_minor(2200, 0), Currency::new("YER")).await;

    let request = SearchRequest {
        price_range: Some((Money::from_major_minor(100, 0), Money::from_major_minor(1000, 0))),
        preferred_currency: Some(Currency::new("USD")),
        page_number: 1,
        page_size: 20,
        ..Default::default()
    };
    let result = h.engine.search(&request).await.unwrap();

    let matched = ids_in(&result.items);
    assert!(matched.contains(&mid));
    assert!(!matched.contains(&cheap));
    assert!(!matched.contains(&expensive_yer));
}

async fn make_property(h: &Harness, city: &str, price: Money, currency: Currency) -> PropertyId {
    let property_id = PropertyId::new();
    h.properties.0.lock().unwrap().insert(property_id, record(property_id, city, 4.0, 15.0, 44.0));
    let unit = UnitDocument {
        id: UnitId::new(),
        property_id,
        unit_type_id: 1,
        name: "Room".into(),
        max_capacity: 2,
        max_adults: 2,
        max_children: 0,
        base_price: price,
        currency: currency.clone(),
    };
    h.units.0.lock().unwrap().insert(property_id, vec![unit.clone()]);
    h.pricing.0.lock().unwrap().insert(unit.id, price);
    h.engine.on_property_created(property_id).await.unwrap();
    property_id
}

#[tokio::test]
async fn scenario_3_geo_radius() {
    let h = build_harness(None, None);
    let center = (15.369, 44.191);

    let near = PropertyId::new();
    h.properties.0.lock().unwrap().insert(near, record(near, "Sanaa", 4.0, 15.370, 44.190));
    h.engine.on_property_created(near).await.unwrap();

    let mid = PropertyId::new();
    h.properties.0.lock().unwrap().insert(mid, record(mid, "Sanaa", 4.0, 15.400, 44.200));
    h.engine.on_property_created(mid).await.unwrap();

    let far = PropertyId::new();
    h.properties.0.lock().unwrap().insert(far, record(far, "Sanaa", 4.0, 16.000, 45.000));
    h.engine.on_property_created(far).await.unwrap();

    let request = SearchRequest {
        geo: Some((center.1, center.0, 5.0)),
        page_number: 1,
        page_size: 20,
        ..Default::default()
    };
    let result = h.engine.search(&request).await.unwrap();

    assert_eq!(result.total_count, 2);
    let matched = ids_in(&result.items);
    assert!(matched.contains(&near));
    assert!(matched.contains(&mid));
    assert!(!matched.contains(&far));
}

#[tokio::test]
async fn scenario_4_complex_filter_with_dates() {
    let fixture = Arc::new(FixtureAvailability(Mutex::new(HashMap::new())));
    let availability: Arc<dyn AvailabilityService> = fixture.clone();
    let h = build_harness(Some(availability), None);

    let check_in = Ticks::new(0).plus_days(10);
    let check_out = Ticks::new(0).plus_days(15);

    let matches_property = PropertyId::new();
    h.properties.0.lock().unwrap().insert(matches_property, record(matches_property, "Sanaa", 4.5, 15.0, 44.0));
    let u1 = UnitDocument { id: UnitId::new(), property_id: matches_property, unit_type_id: 1, name: "U1".into(), max_capacity: 1, max_adults: 1, max_children: 0, base_price: Money::ZERO, currency: Currency::new("USD") };
    let u2 = UnitDocument { id: UnitId::new(), property_id: matches_property, unit_type_id: 2, name: "U2".into(), max_capacity: 4, max_adults: 4, max_children: 0, base_price: Money::ZERO, currency: Currency::new("USD") };
    h.units.0.lock().unwrap().insert(matches_property, vec![u1.clone(), u2.clone()]);
    h.engine.on_property_created(matches_property).await.unwrap();

    let no_match_property = PropertyId::new();
    h.properties.0.lock().unwrap().insert(no_match_property, record(no_match_property, "Sanaa", 4.5, 15.0, 44.0));
    let u3 = UnitDocument { id: UnitId::new(), property_id: no_match_property, unit_type_id: 2, name: "U3".into(), max_capacity: 4, max_adults: 4, max_children: 0, base_price: Money::ZERO, currency: Currency::new("USD") };
    h.units.0.lock().unwrap().insert(no_match_property, vec![u3.clone()]);
    h.engine.on_property_created(no_match_property).await.unwrap();

    fixture.0.lock().unwrap().insert(
        u2.id,
        (matches_property, vec![AvailabilityRange { start_tick: Ticks::new(0).plus_days(1), end_tick: Ticks::new(0).plus_days(20) }]),
    );
    fixture.0.lock().unwrap().insert(
        u3.id,
        (no_match_property, vec![AvailabilityRange { start_tick: Ticks::new(0).plus_days(12), end_tick: Ticks::new(0).plus_days(15) }]),
    );

    let request = SearchRequest {
        check_in: Some(check_in),
        check_out: Some(check_out),
        guests_count: Some(2),
        min_rating: Some(4.0),
        page_number: 1,
        page_size: 20,
        ..Default::default()
    };
    let result = h.engine.search(&request).await.unwrap();

    let matched = ids_in(&result.items);
    assert!(matched.contains(&matches_property));
    assert!(!matched.contains(&no_match_property));
}

#[tokio::test]
async fn scenario_5_text_search_fallback() {
    let h = build_harness(None, None);

    let target = PropertyId::new();
    let mut target_record = record(target, "Sanaa", 4.0, 15.0, 44.0);
    target_record.name = "Funduq\u{0640} Al-Salam".into();
    h.properties.0.lock().unwrap().insert(target, target_record);
    h.engine.on_property_created(target).await.unwrap();

    let other = PropertyId::new();
    h.properties.0.lock().unwrap().insert(other, record(other, "Aden", 4.0, 13.0, 45.0));
    h.engine.on_property_created(other).await.unwrap();

    let request = SearchRequest {
        search_text: Some("funduq".into()),
        page_number: 1,
        page_size: 20,
        ..Default::default()
    };
    let result = h.engine.search(&request).await.unwrap();

    assert_eq!(result.total_count, 1);
    assert_eq!(result.items[0].id, target);
}

#[tokio::test]
async fn scenario_6_concurrent_create_and_search() {
    let h = Arc::new(build_harness(None, None));
    let mut ids = Vec::new();
    for _ in 0..20 {
        let id = PropertyId::new();
        h.properties.0.lock().unwrap().insert(id, record(id, "Sanaa", 4.0, 15.0, 44.0));
        ids.push(id);
    }

    let mut handles = Vec::new();
    for &id in &ids {
        let h = h.clone();
        handles.push(tokio::spawn(async move { h.engine.on_property_created(id).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let request = SearchRequest { page_number: 1, page_size: 20, ..Default::default() };
    let result = h.engine.search(&request).await.unwrap();
    assert_eq!(result.total_count, 20);
    let mut seen = HashSet::new();
    for doc in &result.items {
        assert!(seen.insert(doc.id));
    }
}
