//! Property-style and targeted invariant tests for the index maintainer:
//! key-set consistency, sort-index correctness, tag-set membership
//! correctness, cache determinism under a stable epoch, codec round-trips,
//! idempotence of create/delete, and post-rebuild searchability.

use async_trait::async_trait;
use propdex::external::{PricingService, PropertyRepository, UnitRepository};
use propdex::{
    Currency, Datastore, Money, PropertyId, PropertyLockTable, PropertySearchEngine, Result, SearchRequest,
    TextEngineCapability, Ticks, UnitDocument, UnitId,
};
use propdex_core::external::{Amenity, PropertyRecord, PropertyType};
use propdex_core::key;
use propdex_datastore::memory::InMemoryDatastore;
use std::collections::HashMap;
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

fn record(id: PropertyId, city: &str, rating: f64, booking_count: u32) -> PropertyRecord {
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
        reviews_count: 5,
        view_count: 0,
        booking_count,
        popularity_score: 1.0,
        latitude: 15.0,
        longitude: 44.0,
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

fn sample_unit(property_id: PropertyId, max_adults: u32, max_children: u32) -> UnitDocument {
    UnitDocument {
        id: UnitId::new(),
        property_id,
        unit_type_id: 1,
        name: "Room".into(),
        max_capacity: max_adults + max_children,
        max_adults,
        max_children,
        base_price: Money::from_major_minor(100, 0),
        currency: Currency::new("USD"),
    }
}

struct Harness {
    engine: PropertySearchEngine,
    datastore: Arc<dyn Datastore>,
    properties: Arc<FixtureProperties>,
    units: Arc<FixtureUnits>,
    pricing: Arc<FixturePricing>,
}

fn build_harness() -> Harness {
    let datastore: Arc<dyn Datastore> = Arc::new(InMemoryDatastore::new());
    let properties = Arc::new(FixtureProperties(Mutex::new(HashMap::new())));
    let units = Arc::new(FixtureUnits(Mutex::new(HashMap::new())));
    let pricing = Arc::new(FixturePricing(Mutex::new(HashMap::new())));
    let locks = Arc::new(PropertyLockTable::new());

    let engine = PropertySearchEngine::new(
        datastore.clone(),
        properties.clone(),
        units.clone(),
        pricing.clone(),
        None,
        None,
        locks,
        TextEngineCapability::always(false),
    );

    Harness { engine, datastore, properties, units, pricing }
}

/// P1: every indexed property's binary snapshot decodes to the document
/// last committed for it, and appears exactly once in `properties:all`.
#[tokio::test]
async fn p1_indexed_snapshot_matches_last_committed_document_exactly_once() {
    let h = build_harness();
    let mut ids = Vec::new();
    for i in 0..10 {
        let id = PropertyId::new();
        h.properties.0.lock().unwrap().insert(id, record(id, "Sanaa", 3.0 + i as f64 * 0.1, i));
        h.engine.on_property_created(id).await.unwrap();
        ids.push(id);
    }

    let all_members = h.datastore.smembers(&key::all_properties()).await.unwrap();
    assert_eq!(all_members.len(), ids.len());

    for &id in &ids {
        let count = all_members.iter().filter(|m| **m == id.to_string()).count();
        assert_eq!(count, 1);

        let hex = h.datastore.stringget(&key::property_bin(id)).await.unwrap().expect("snapshot present");
        let decoded = propdex_core::codec::decode_snapshot_hex(&hex).unwrap();
        assert_eq!(decoded.id, id);
        assert_eq!(decoded.city, "Sanaa");
    }
}

/// P2: every sort-index score matches the document's corresponding
/// attribute after a mutation changes it.
#[tokio::test]
async fn p2_sort_index_scores_track_document_attributes_after_mutation() {
    let h = build_harness();
    let id = PropertyId::new();
    h.properties.0.lock().unwrap().insert(id, record(id, "Sanaa", 3.5, 2));
    h.engine.on_property_created(id).await.unwrap();

    let score = h.datastore.zscore("idx:rating", &id.to_string()).await.unwrap();
    assert_eq!(score, Some(3.5));
    let bookings = h.datastore.zscore("idx:bookings", &id.to_string()).await.unwrap();
    assert_eq!(bookings, Some(2.0));

    h.properties.0.lock().unwrap().get_mut(&id).unwrap().average_rating = 4.8;
    h.properties.0.lock().unwrap().get_mut(&id).unwrap().booking_count = 9;
    h.engine.on_property_updated(id).await.unwrap();

    let score = h.datastore.zscore("idx:rating", &id.to_string()).await.unwrap();
    assert_eq!(score, Some(4.8));
    let bookings = h.datastore.zscore("idx:bookings", &id.to_string()).await.unwrap();
    assert_eq!(bookings, Some(9.0));

    for name in key::SORT_INDEX_NAMES {
        assert!(h.datastore.zscore(name, &id.to_string()).await.unwrap().is_some(), "missing score in {name}");
    }
}

/// P3: a tag set's membership equals exactly the set of properties
/// satisfying its predicate, including after a property moves out.
#[tokio::test]
async fn p3_tag_set_membership_tracks_predicate_exactly() {
    let h = build_harness();
    let sanaa = PropertyId::new();
    let aden = PropertyId::new();
    h.properties.0.lock().unwrap().insert(sanaa, record(sanaa, "Sanaa", 4.0, 0));
    h.properties.0.lock().unwrap().insert(aden, record(aden, "Aden", 4.0, 0));
    h.engine.on_property_created(sanaa).await.unwrap();
    h.engine.on_property_created(aden).await.unwrap();

    let sanaa_tag = h.datastore.smembers(&key::tag_city("Sanaa")).await.unwrap();
    assert_eq!(sanaa_tag, [sanaa.to_string()].into_iter().collect());

    h.properties.0.lock().unwrap().get_mut(&sanaa).unwrap().city = "Aden".into();
    h.engine.on_property_updated(sanaa).await.unwrap();

    let sanaa_tag = h.datastore.smembers(&key::tag_city("Sanaa")).await.unwrap();
    assert!(sanaa_tag.is_empty());
    let aden_tag = h.datastore.smembers(&key::tag_city("Aden")).await.unwrap();
    assert_eq!(aden_tag, [sanaa.to_string(), aden.to_string()].into_iter().collect());
}

/// P4: repeated searches with no intervening mutation return identical
/// results and are served from cache (same epoch, same fingerprint).
#[tokio::test]
async fn p4_identical_requests_are_deterministic_under_a_stable_epoch() {
    let h = build_harness();
    for i in 0..5 {
        let id = PropertyId::new();
        h.properties.0.lock().unwrap().insert(id, record(id, "Sanaa", 3.0 + i as f64, i));
        h.engine.on_property_created(id).await.unwrap();
    }

    let request = SearchRequest { city: Some("Sanaa".into()), page_number: 1, page_size: 20, ..Default::default() };
    let first = h.engine.search(&request).await.unwrap();
    let second = h.engine.search(&request).await.unwrap();

    assert_eq!(first.total_count, second.total_count);
    let first_ids: Vec<PropertyId> = first.items.iter().map(|d| d.id).collect();
    let second_ids: Vec<PropertyId> = second.items.iter().map(|d| d.id).collect();
    assert_eq!(first_ids, second_ids);
}

/// P5: the document codec round-trips exactly through both its flat-field
/// and binary-snapshot representations (price rounded to two decimals).
#[tokio::test]
async fn p5_codec_round_trips_exactly() {
    use propdex_core::codec::{decode_flat, decode_snapshot_hex, encode_flat, encode_snapshot_hex, PropertyCollections};

    let h = build_harness();
    let id = PropertyId::new();
    h.properties.0.lock().unwrap().insert(id, record(id, "Sanaa", 4.25, 7));
    h.engine.on_property_created(id).await.unwrap();

    let hex = h.datastore.stringget(&key::property_bin(id)).await.unwrap().unwrap();
    let snapshot = decode_snapshot_hex(&hex).unwrap();

    let flat = encode_flat(&snapshot);
    let collections = PropertyCollections {
        unit_ids: snapshot.unit_ids.clone(),
        unit_type_ids: snapshot.unit_type_ids.clone(),
        amenity_ids: snapshot.amenity_ids.clone(),
        service_ids: snapshot.service_ids.clone(),
        image_urls: snapshot.image_urls.clone(),
    };
    let from_flat = decode_flat(&flat, collections).unwrap();
    assert_eq!(from_flat, snapshot);

    let re_hex = encode_snapshot_hex(&snapshot).unwrap();
    assert_eq!(re_hex, hex);
}

/// P6: `on_property_created` applied twice leaves the same final state as
/// once, and `on_property_deleted` on an absent property mutates nothing.
#[tokio::test]
async fn p6_create_and_delete_are_idempotent() {
    let h = build_harness();
    let id = PropertyId::new();
    h.properties.0.lock().unwrap().insert(id, record(id, "Sanaa", 4.0, 3));

    h.engine.on_property_created(id).await.unwrap();
    h.engine.on_property_created(id).await.unwrap();

    let all_members = h.datastore.smembers(&key::all_properties()).await.unwrap();
    assert_eq!(all_members.iter().filter(|m| **m == id.to_string()).count(), 1);
    let city_tag = h.datastore.smembers(&key::tag_city("Sanaa")).await.unwrap();
    assert_eq!(city_tag.iter().filter(|m| **m == id.to_string()).count(), 1);

    let absent = PropertyId::new();
    let keys_before = h.datastore.scan("*").await.unwrap();
    h.engine.on_property_deleted(absent).await.unwrap();
    let keys_after = h.datastore.scan("*").await.unwrap();
    assert_eq!(keys_before.len(), keys_after.len());

    h.engine.on_property_deleted(id).await.unwrap();
    h.engine.on_property_deleted(id).await.unwrap();
    let all_members = h.datastore.smembers(&key::all_properties()).await.unwrap();
    assert!(!all_members.contains(&id.to_string()));
}

/// P7: after `rebuild_index()`, every active property in the authoritative
/// store is surfaced by a search naming its city, even if it was never
/// indexed (or was indexed incorrectly) beforehand.
#[tokio::test]
async fn p7_rebuild_makes_every_active_property_searchable() {
    let h = build_harness();
    let mut ids = Vec::new();
    for i in 0..8 {
        let id = PropertyId::new();
        h.properties.0.lock().unwrap().insert(id, record(id, "Sanaa", 3.0 + i as f64 * 0.2, i));
        let unit = sample_unit(id, 2, 0);
        h.units.0.lock().unwrap().insert(id, vec![unit.clone()]);
        h.pricing.0.lock().unwrap().insert(unit.id, Money::from_major_minor(120, 0));
        ids.push(id);
    }

    // the authoritative store has eight active properties, but none were
    // ever indexed through the normal mutation path.
    let report = h.engine.rebuild_index().await.unwrap();
    assert_eq!(report.attempted, 8);
    assert_eq!(report.succeeded, 8);

    let request = SearchRequest { city: Some("Sanaa".into()), page_number: 1, page_size: 20, ..Default::default() };
    let result = h.engine.search(&request).await.unwrap();
    assert_eq!(result.total_count, 8);
    let found: Vec<PropertyId> = result.items.iter().map(|d| d.id).collect();
    for id in ids {
        assert!(found.contains(&id));
    }
}
