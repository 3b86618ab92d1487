//! Document builder: assembles a [`PropertyDocument`] from
//! the authoritative property/unit repositories and the pricing oracle.
//! Consumes `PropertyRepository`, `UnitRepository`, `PricingService`;
//! `CurrencyExchangeRepository` is consumed only by the query executor.

use propdex_core::external::{PricingService, PropertyRepository, UnitRepository};
use propdex_core::normalize::normalize_name;
use propdex_core::{Error, Money, PropertyDocument, PropertyId, Result, Ticks};
use std::collections::HashSet;
use std::sync::Arc;

/// A freshly built property document together with the unit documents it
/// was derived from; the maintainer needs both to maintain per-unit index
/// keys (`unit:{id}`, `tag:unittype:*`, `idx:unit:*`) alongside the
/// property-level ones.
pub struct BuildResult {
    /// The assembled property document.
    pub document: PropertyDocument,
    /// The property's units, as read from the authoritative store.
    pub units: Vec<propdex_core::document::UnitDocument>,
}

/// Reads a property and its units/amenities/pricing and produces the
/// denormalized document the maintainer indexes.
pub struct DocumentBuilder {
    properties: Arc<dyn PropertyRepository>,
    units: Arc<dyn UnitRepository>,
    pricing: Arc<dyn PricingService>,
}

impl DocumentBuilder {
    /// Wire the builder to its three collaborators.
    pub fn new(
        properties: Arc<dyn PropertyRepository>,
        units: Arc<dyn UnitRepository>,
        pricing: Arc<dyn PricingService>,
    ) -> Self {
        DocumentBuilder { properties, units, pricing }
    }

    /// Build the document for `property_id`, or `Err(NotFound)` if the
    /// property no longer exists in the authoritative store.
    pub async fn build(&self, property_id: PropertyId) -> Result<BuildResult> {
        let record = self
            .properties
            .get_property_by_id(property_id)
            .await?
            .ok_or_else(|| Error::NotFound(property_id.to_string()))?;

        let property_type_name = match self.properties.get_property_type_by_id(record.property_type_id).await {
            Ok(Some(t)) => t.name,
            _ => String::new(),
        };

        let amenities = self.properties.get_property_amenities(property_id).await.unwrap_or_default();
        let amenity_ids: Vec<i64> = amenities.iter().filter(|a| a.is_available).map(|a| a.id).collect();

        let units = self.units.get_by_property_id(property_id).await?;

        let check_in = Ticks::now();
        let check_out = check_in.plus_days(1);

        let mut min_price: Option<Money> = None;
        let mut max_price: Option<Money> = None;
        let mut currency = None;
        let mut max_capacity = 0u32;
        let mut unit_type_ids = HashSet::new();

        for unit in &units {
            max_capacity = max_capacity.max(unit.max_capacity);
            unit_type_ids.insert(unit.unit_type_id);

            match self.pricing.calculate_price(unit.id, check_in, check_out).await {
                Ok(price) => {
                    min_price = Some(min_price.map_or(price, |m| m.min(price)));
                    max_price = Some(max_price.map_or(price, |m| m.max(price)));
                    currency.get_or_insert(unit.currency.clone());
                }
                Err(error) => {
                    tracing::warn!(unit_id = %unit.id, %error, "pricing oracle failed for unit, skipping");
                }
            }
        }

        let unit_ids = units.iter().map(|u| u.id).collect();
        let units_count = units.len() as u32;

        let document = PropertyDocument {
            id: record.id,
            owner_id: record.owner_id,
            name: record.name.clone(),
            name_normalized: normalize_name(&record.name),
            description: record.description,
            address: record.address,
            city: record.city,
            property_type_name,
            property_type_id: record.property_type_id,
            min_price: min_price.unwrap_or(Money::ZERO),
            max_price: max_price.unwrap_or(Money::ZERO),
            currency: currency.unwrap_or_else(|| propdex_core::Currency::new("USD")),
            star_rating: record.star_rating,
            average_rating: record.average_rating,
            reviews_count: record.reviews_count,
            view_count: record.view_count,
            booking_count: record.booking_count,
            max_capacity,
            units_count,
            popularity_score: record.popularity_score,
            latitude: record.latitude,
            longitude: record.longitude,
            is_active: record.is_active,
            is_approved: record.is_approved,
            is_featured: record.is_featured,
            is_indexed: true,
            unit_ids,
            unit_type_ids: unit_type_ids.into_iter().collect(),
            amenity_ids,
            service_ids: record.service_ids,
            image_urls: record.image_urls,
            dynamic_fields: record.dynamic_fields,
            created_at: record.created_at,
            updated_at: record.updated_at,
            last_modified_ticks: record.updated_at,
        };

        Ok(BuildResult { document, units })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use propdex_core::document::UnitDocument;
    use propdex_core::external::{Amenity, PropertyRecord, PropertyType};
    use propdex_core::{Currency, UnitId};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixtureProperties(Mutex<HashMap<PropertyId, PropertyRecord>>);

    #[async_trait]
    impl PropertyRepository for FixtureProperties {
        async fn get_property_by_id(&self, id: PropertyId) -> Result<Option<PropertyRecord>> {
            Ok(self.0.lock().unwrap().get(&id).cloned())
        }
        async fn get_active_properties(&self) -> Result<Vec<PropertyId>> {
            Ok(self.0.lock().unwrap().keys().copied().collect())
        }
        async fn get_property_amenities(&self, _id: PropertyId) -> Result<Vec<Amenity>> {
            Ok(vec![Amenity { id: 1, name: "wifi".into(), is_available: true }])
        }
        async fn get_property_type_by_id(&self, type_id: i64) -> Result<Option<PropertyType>> {
            Ok(Some(PropertyType { id: type_id, name: "Hotel".into() }))
        }
        async fn update_property(&self, _id: PropertyId, _record: PropertyRecord) -> Result<()> {
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

    struct FixturePricing {
        prices: HashMap<UnitId, Money>,
        fail_for: HashSet<UnitId>,
    }

    #[async_trait]
    impl PricingService for FixturePricing {
        async fn calculate_price(&self, unit_id: UnitId, _check_in: Ticks, _check_out: Ticks) -> Result<Money> {
            if self.fail_for.contains(&unit_id) {
                return Err(Error::Unavailable("pricing oracle down".into()));
            }
            Ok(*self.prices.get(&unit_id).unwrap_or(&Money::ZERO))
        }
    }

    fn sample_record(id: PropertyId) -> PropertyRecord {
        PropertyRecord {
            id,
            owner_id: "owner-1".into(),
            name: "Grand\u{0640} Hotel".into(),
            description: "desc".into(),
            address: "addr".into(),
            city: "Sanaa".into(),
            property_type_id: 3,
            star_rating: 4,
            average_rating: 4.2,
            reviews_count: 10,
            view_count: 100,
            booking_count: 5,
            popularity_score: 1.0,
            latitude: 15.0,
            longitude: 44.0,
            is_active: true,
            is_approved: true,
            is_featured: false,
            image_urls: vec![],
            service_ids: vec![7],
            dynamic_fields: HashMap::new(),
            created_at: Ticks(100),
            updated_at: Ticks(200),
        }
    }

    #[tokio::test]
    async fn builds_document_with_min_max_price_across_units() {
        let property_id = PropertyId::new();
        let unit_a = UnitDocument {
            id: UnitId::new(),
            property_id,
            unit_type_id: 1,
            name: "A".into(),
            max_capacity: 2,
            max_adults: 2,
            max_children: 0,
            base_price: Money::from_major_minor(50, 0),
            currency: Currency::new("USD"),
        };
        let unit_b = UnitDocument {
            id: UnitId::new(),
            property_id,
            unit_type_id: 2,
            name: "B".into(),
            max_capacity: 4,
            max_adults: 4,
            max_children: 2,
            base_price: Money::from_major_minor(120, 0),
            currency: Currency::new("USD"),
        };

        let mut prices = HashMap::new();
        prices.insert(unit_a.id, Money::from_major_minor(80, 0));
        prices.insert(unit_b.id, Money::from_major_minor(150, 0));

        let properties = Arc::new(FixtureProperties(Mutex::new(
            [(property_id, sample_record(property_id))].into_iter().collect(),
        )));
        let units = Arc::new(FixtureUnits(Mutex::new(
            [(property_id, vec![unit_a.clone(), unit_b.clone()])].into_iter().collect(),
        )));
        let pricing = Arc::new(FixturePricing { prices, fail_for: HashSet::new() });

        let builder = DocumentBuilder::new(properties, units, pricing);
        let BuildResult { document: doc, .. } = builder.build(property_id).await.unwrap();

        assert_eq!(doc.min_price, Money::from_major_minor(80, 0));
        assert_eq!(doc.max_price, Money::from_major_minor(150, 0));
        assert_eq!(doc.max_capacity, 4);
        assert_eq!(doc.units_count, 2);
        assert_eq!(doc.name_normalized, "grand hotel");
        assert_eq!(doc.amenity_ids, vec![1]);
        assert_eq!(doc.property_type_name, "Hotel");
    }

    #[tokio::test]
    async fn empty_unit_set_yields_zero_price_and_count() {
        let property_id = PropertyId::new();
        let properties = Arc::new(FixtureProperties(Mutex::new(
            [(property_id, sample_record(property_id))].into_iter().collect(),
        )));
        let units = Arc::new(FixtureUnits(Mutex::new(HashMap::new())));
        let pricing = Arc::new(FixturePricing { prices: HashMap::new(), fail_for: HashSet::new() });

        let builder = DocumentBuilder::new(properties, units, pricing);
        let BuildResult { document: doc, .. } = builder.build(property_id).await.unwrap();

        assert_eq!(doc.min_price, Money::ZERO);
        assert_eq!(doc.max_price, Money::ZERO);
        assert_eq!(doc.units_count, 0);
        assert_eq!(doc.max_capacity, 0);
    }

    #[tokio::test]
    async fn unit_with_failing_pricing_is_skipped_for_min_max() {
        let property_id = PropertyId::new();
        let unit_a = UnitDocument {
            id: UnitId::new(),
            property_id,
            unit_type_id: 1,
            name: "A".into(),
            max_capacity: 2,
            max_adults: 2,
            max_children: 0,
            base_price: Money::from_major_minor(50, 0),
            currency: Currency::new("USD"),
        };
        let unit_b_fails = UnitDocument {
            id: UnitId::new(),
            property_id,
            unit_type_id: 2,
            name: "B".into(),
            max_capacity: 9,
            max_adults: 9,
            max_children: 0,
            base_price: Money::from_major_minor(999, 0),
            currency: Currency::new("USD"),
        };

        let mut prices = HashMap::new();
        prices.insert(unit_a.id, Money::from_major_minor(80, 0));
        let properties = Arc::new(FixtureProperties(Mutex::new(
            [(property_id, sample_record(property_id))].into_iter().collect(),
        )));
        let units = Arc::new(FixtureUnits(Mutex::new(
            [(property_id, vec![unit_a.clone(), unit_b_fails.clone()])].into_iter().collect(),
        )));
        let pricing = Arc::new(FixturePricing {
            prices,
            fail_for: [unit_b_fails.id].into_iter().collect(),
        });

        let builder = DocumentBuilder::new(properties, units, pricing);
        let BuildResult { document: doc, .. } = builder.build(property_id).await.unwrap();

        assert_eq!(doc.min_price, Money::from_major_minor(80, 0));
        assert_eq!(doc.max_price, Money::from_major_minor(80, 0));
        // max_capacity still reflects all units, pricing failure only affects price.
        assert_eq!(doc.max_capacity, 9);
    }

    #[tokio::test]
    async fn missing_property_yields_not_found() {
        let properties = Arc::new(FixtureProperties(Mutex::new(HashMap::new())));
        let units = Arc::new(FixtureUnits(Mutex::new(HashMap::new())));
        let pricing = Arc::new(FixturePricing { prices: HashMap::new(), fail_for: HashSet::new() });
        let builder = DocumentBuilder::new(properties, units, pricing);
        let result = builder.build(PropertyId::new()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
