//! Bidirectional mapping between a [`PropertyDocument`] and its flat field
//! representation (for `hset`/`hget_all` against `property:{id}`), and
//! between a document and a compact binary snapshot (for `property:{id}:bin`).
//!
//! Collections (`unit_ids`, `unit_type_ids`, `amenity_ids`,
//! `service_ids`, `image_urls`) live in auxiliary set keys, not in the flat
//! map — only `dynamic_fields` inlines into the flat map, under a `df_`
//! prefix. The caller supplies collections separately when decoding from the
//! flat map (see [`PropertyCollections`]); the binary snapshot, being a
//! complete point-in-time copy, carries everything.

use crate::document::PropertyDocument;
use crate::error::{Error, Result};
use crate::types::{Currency, Money, PropertyId, Ticks, UnitId};
use std::collections::HashMap;
use std::str::FromStr;

const DYNAMIC_PREFIX: &str = "df_";

/// The collection-valued fields of a [`PropertyDocument`], read from their
/// auxiliary set keys and supplied to [`decode_flat`].
#[derive(Debug, Clone, Default)]
pub struct PropertyCollections {
    /// `unit_ids`.
    pub unit_ids: Vec<UnitId>,
    /// `unit_type_ids`.
    pub unit_type_ids: Vec<i64>,
    /// `amenity_ids`.
    pub amenity_ids: Vec<i64>,
    /// `service_ids`.
    pub service_ids: Vec<i64>,
    /// `image_urls`.
    pub image_urls: Vec<String>,
}

fn bool_str(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    match s {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(Error::EncodingError(format!("invalid bool field: {other}"))),
    }
}

fn field<T: FromStr>(map: &HashMap<String, String>, key: &str) -> Result<T> {
    let raw = map
        .get(key)
        .ok_or_else(|| Error::EncodingError(format!("missing field: {key}")))?;
    raw.parse::<T>()
        .map_err(|_| Error::EncodingError(format!("malformed field: {key}")))
}

/// Encode a document into its flat field map. Collections are omitted;
/// `dynamic_fields` is inlined under `df_<name>`.
pub fn encode_flat(doc: &PropertyDocument) -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("id".into(), doc.id.to_string());
    m.insert("owner_id".into(), doc.owner_id.clone());
    m.insert("name".into(), doc.name.clone());
    m.insert("name_normalized".into(), doc.name_normalized.clone());
    m.insert("description".into(), doc.description.clone());
    m.insert("address".into(), doc.address.clone());
    m.insert("city".into(), doc.city.clone());
    m.insert("property_type_name".into(), doc.property_type_name.clone());
    m.insert("property_type_id".into(), doc.property_type_id.to_string());
    m.insert("min_price".into(), doc.min_price.to_decimal_string());
    m.insert("max_price".into(), doc.max_price.to_decimal_string());
    m.insert("currency".into(), doc.currency.0.clone());
    m.insert("star_rating".into(), doc.star_rating.to_string());
    m.insert("average_rating".into(), doc.average_rating.to_string());
    m.insert("reviews_count".into(), doc.reviews_count.to_string());
    m.insert("view_count".into(), doc.view_count.to_string());
    m.insert("booking_count".into(), doc.booking_count.to_string());
    m.insert("max_capacity".into(), doc.max_capacity.to_string());
    m.insert("units_count".into(), doc.units_count.to_string());
    m.insert("popularity_score".into(), doc.popularity_score.to_string());
    m.insert("latitude".into(), doc.latitude.to_string());
    m.insert("longitude".into(), doc.longitude.to_string());
    m.insert("is_active".into(), bool_str(doc.is_active).into());
    m.insert("is_approved".into(), bool_str(doc.is_approved).into());
    m.insert("is_featured".into(), bool_str(doc.is_featured).into());
    m.insert("is_indexed".into(), bool_str(doc.is_indexed).into());
    m.insert("created_at".into(), doc.created_at.0.to_string());
    m.insert("updated_at".into(), doc.updated_at.0.to_string());
    m.insert(
        "last_modified_ticks".into(),
        doc.last_modified_ticks.0.to_string(),
    );
    for (name, value) in &doc.dynamic_fields {
        m.insert(format!("{DYNAMIC_PREFIX}{name}"), value.clone());
    }
    m
}

/// Decode a flat field map (plus externally-supplied collections) back into
/// a document.
pub fn decode_flat(
    map: &HashMap<String, String>,
    collections: PropertyCollections,
) -> Result<PropertyDocument> {
    let id: PropertyId = field::<String>(map, "id")?
        .parse()
        .map_err(|_| Error::EncodingError("malformed id".into()))?;

    let mut dynamic_fields = HashMap::new();
    for (k, v) in map {
        if let Some(name) = k.strip_prefix(DYNAMIC_PREFIX) {
            dynamic_fields.insert(name.to_string(), v.clone());
        }
    }

    Ok(PropertyDocument {
        id,
        owner_id: map.get("owner_id").cloned().unwrap_or_default(),
        name: map.get("name").cloned().unwrap_or_default(),
        name_normalized: map.get("name_normalized").cloned().unwrap_or_default(),
        description: map.get("description").cloned().unwrap_or_default(),
        address: map.get("address").cloned().unwrap_or_default(),
        city: map.get("city").cloned().unwrap_or_default(),
        property_type_name: map.get("property_type_name").cloned().unwrap_or_default(),
        property_type_id: field(map, "property_type_id")?,
        min_price: Money::parse(map.get("min_price").map(|s| s.as_str()).unwrap_or("0"))
            .ok_or_else(|| Error::EncodingError("malformed min_price".into()))?,
        max_price: Money::parse(map.get("max_price").map(|s| s.as_str()).unwrap_or("0"))
            .ok_or_else(|| Error::EncodingError("malformed max_price".into()))?,
        currency: Currency::new(map.get("currency").cloned().unwrap_or_else(|| "USD".into())),
        star_rating: field(map, "star_rating")?,
        average_rating: field(map, "average_rating")?,
        reviews_count: field(map, "reviews_count")?,
        view_count: field(map, "view_count")?,
        booking_count: field(map, "booking_count")?,
        max_capacity: field(map, "max_capacity")?,
        units_count: field(map, "units_count")?,
        popularity_score: field(map, "popularity_score")?,
        latitude: field(map, "latitude")?,
        longitude: field(map, "longitude")?,
        is_active: parse_bool(map.get("is_active").map(|s| s.as_str()).unwrap_or("0"))?,
        is_approved: parse_bool(map.get("is_approved").map(|s| s.as_str()).unwrap_or("0"))?,
        is_featured: parse_bool(map.get("is_featured").map(|s| s.as_str()).unwrap_or("0"))?,
        is_indexed: parse_bool(map.get("is_indexed").map(|s| s.as_str()).unwrap_or("0"))?,
        unit_ids: collections.unit_ids,
        unit_type_ids: collections.unit_type_ids,
        amenity_ids: collections.amenity_ids,
        service_ids: collections.service_ids,
        image_urls: collections.image_urls,
        dynamic_fields,
        created_at: Ticks(field(map, "created_at")?),
        updated_at: Ticks(field(map, "updated_at")?),
        last_modified_ticks: Ticks(field(map, "last_modified_ticks")?),
    })
}

/// Encode a full document (including collections) into a compact binary
/// snapshot, for `property:{id}:bin`.
pub fn encode_snapshot(doc: &PropertyDocument) -> Result<Vec<u8>> {
    bincode::serialize(doc).map_err(|e| Error::EncodingError(e.to_string()))
}

/// Decode a binary snapshot back into a complete document.
pub fn decode_snapshot(bytes: &[u8]) -> Result<PropertyDocument> {
    bincode::deserialize(bytes).map_err(|e| Error::EncodingError(e.to_string()))
}

/// Hex-encode a snapshot for storage in a string-valued datastore key
/// (`property:{id}:bin`), since the datastore's string type has no binary
/// variant.
pub fn encode_snapshot_hex(doc: &PropertyDocument) -> Result<String> {
    let bytes = encode_snapshot(doc)?;
    Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

/// Decode a hex-encoded snapshot produced by [`encode_snapshot_hex`].
pub fn decode_snapshot_hex(hex: &str) -> Result<PropertyDocument> {
    if hex.len() % 2 != 0 {
        return Err(Error::EncodingError("odd-length snapshot hex".into()));
    }
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    let chars: Vec<char> = hex.chars().collect();
    for pair in chars.chunks(2) {
        let byte = u8::from_str_radix(&pair.iter().collect::<String>(), 16)
            .map_err(|_| Error::EncodingError("invalid snapshot hex".into()))?;
        bytes.push(byte);
    }
    decode_snapshot(&bytes)
}

/// Encode a unit into its flat field map, for `unit:{id}`.
pub fn encode_unit_fields(unit: &crate::document::UnitDocument) -> HashMap<String, String> {
    let mut m = HashMap::new();
    m.insert("id".into(), unit.id.to_string());
    m.insert("property_id".into(), unit.property_id.to_string());
    m.insert("unit_type_id".into(), unit.unit_type_id.to_string());
    m.insert("name".into(), unit.name.clone());
    m.insert("max_capacity".into(), unit.max_capacity.to_string());
    m.insert("max_adults".into(), unit.max_adults.to_string());
    m.insert("max_children".into(), unit.max_children.to_string());
    m.insert("base_price".into(), unit.base_price.to_decimal_string());
    m.insert("currency".into(), unit.currency.0.clone());
    m
}

/// Decode a unit's flat field map back into a [`crate::document::UnitDocument`].
pub fn decode_unit_fields(map: &HashMap<String, String>) -> Result<crate::document::UnitDocument> {
    let id: UnitId = field::<String>(map, "id")?
        .parse()
        .map_err(|_| Error::EncodingError("malformed unit id".into()))?;
    let property_id: PropertyId = field::<String>(map, "property_id")?
        .parse()
        .map_err(|_| Error::EncodingError("malformed property id".into()))?;
    Ok(crate::document::UnitDocument {
        id,
        property_id,
        unit_type_id: field(map, "unit_type_id")?,
        name: map.get("name").cloned().unwrap_or_default(),
        max_capacity: field(map, "max_capacity")?,
        max_adults: field(map, "max_adults")?,
        max_children: field(map, "max_children")?,
        base_price: Money::parse(map.get("base_price").map(|s| s.as_str()).unwrap_or("0"))
            .ok_or_else(|| Error::EncodingError("malformed base_price".into()))?,
        currency: Currency::new(map.get("currency").cloned().unwrap_or_else(|| "USD".into())),
    })
}

/// Format a boolean index-tag value using the engine's chosen spelling,
/// `is_active:{1}` / `is_approved:{1}`, never `{True}`. Both the maintainer's write path and the text query's read
/// path must go through this helper so they cannot drift apart.
pub fn bool_tag(field_name: &str, value: bool) -> String {
    format!("{field_name}:{{{}}}", if value { 1 } else { 0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PropertyDocument;

    fn sample() -> PropertyDocument {
        PropertyDocument {
            id: PropertyId::new(),
            owner_id: "owner-1".into(),
            name: "Grand Hotel".into(),
            name_normalized: "grand hotel".into(),
            description: "Nice place".into(),
            address: "1 Main St".into(),
            city: "Sanaa".into(),
            property_type_name: "Hotel".into(),
            property_type_id: 3,
            min_price: Money::parse("99.99").unwrap(),
            max_price: Money::parse("250.00").unwrap(),
            currency: Currency::new("USD"),
            star_rating: 4,
            average_rating: 4.5,
            reviews_count: 120,
            view_count: 9001,
            booking_count: 42,
            max_capacity: 6,
            units_count: 3,
            popularity_score: 12.3,
            latitude: 15.369,
            longitude: 44.191,
            is_active: true,
            is_approved: true,
            is_featured: false,
            is_indexed: true,
            unit_ids: vec![UnitId::new(), UnitId::new()],
            unit_type_ids: vec![1, 2],
            amenity_ids: vec![10, 20],
            service_ids: vec![30],
            image_urls: vec!["https://example.com/a.jpg".into()],
            dynamic_fields: [("wifi".to_string(), "true".to_string())]
                .into_iter()
                .collect(),
            created_at: Ticks(1000),
            updated_at: Ticks(2000),
            last_modified_ticks: Ticks(2000),
        }
    }

    #[test]
    fn flat_round_trip_preserves_core_fields_and_dynamic_fields() {
        let doc = sample();
        let flat = encode_flat(&doc);
        let collections = PropertyCollections {
            unit_ids: doc.unit_ids.clone(),
            unit_type_ids: doc.unit_type_ids.clone(),
            amenity_ids: doc.amenity_ids.clone(),
            service_ids: doc.service_ids.clone(),
            image_urls: doc.image_urls.clone(),
        };
        let back = decode_flat(&flat, collections).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn snapshot_round_trip_is_exact() {
        let doc = sample();
        let bytes = encode_snapshot(&doc).unwrap();
        let back = decode_snapshot(&bytes).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn money_precision_survives_flat_round_trip() {
        let mut doc = sample();
        doc.min_price = Money::parse("0.01").unwrap();
        let flat = encode_flat(&doc);
        assert_eq!(flat.get("min_price").unwrap(), "0.01");
    }

    #[test]
    fn bool_tag_uses_numeric_spelling() {
        assert_eq!(bool_tag("is_active", true), "is_active:{1}");
        assert_eq!(bool_tag("is_approved", false), "is_approved:{0}");
    }

    #[test]
    fn snapshot_hex_round_trip_is_exact() {
        let doc = sample();
        let hex = encode_snapshot_hex(&doc).unwrap();
        let back = decode_snapshot_hex(&hex).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn unit_fields_round_trip_is_exact() {
        use crate::document::UnitDocument;
        let unit = UnitDocument {
            id: UnitId::new(),
            property_id: PropertyId::new(),
            unit_type_id: 2,
            name: "Suite".into(),
            max_capacity: 4,
            max_adults: 2,
            max_children: 1,
            base_price: Money::parse("125.50").unwrap(),
            currency: Currency::new("EUR"),
        };
        let flat = encode_unit_fields(&unit);
        let back = decode_unit_fields(&flat).unwrap();
        assert_eq!(back, unit);
    }
}
