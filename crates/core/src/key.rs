//! Canonical key schema. Every key family used by the index
//! maintainer and query executor is named here exactly once so the two sides
//! can never drift, and so the names are preserved verbatim if the
//! underlying datastore is ever swapped out.

use crate::types::{PropertyId, UnitId};

/// `properties:all` — the canonical set of all indexed property ids.
pub fn all_properties() -> String {
    "properties:all".to_string()
}

/// `property:{id}` — the property hash (flat field map).
pub fn property_hash(id: PropertyId) -> String {
    format!("property:{id}")
}

/// `property:{id}:bin` — the binary snapshot of the property document.
pub fn property_bin(id: PropertyId) -> String {
    format!("property:{id}:bin")
}

/// `property:{id}:meta` — small bookkeeping fields (e.g. last-repair tick).
pub fn property_meta(id: PropertyId) -> String {
    format!("property:{id}:meta")
}

/// `geo:properties` — the global geo set.
pub fn geo_properties() -> String {
    "geo:properties".to_string()
}

/// `geo:cities:{city}` — a per-city geo set.
pub fn geo_city(city: &str) -> String {
    format!("geo:cities:{city}")
}

/// Names of the eight property-level sort indexes, all of which are
/// maintained uniformly on every write.
pub const SORT_INDEX_NAMES: [&str; 8] = [
    "idx:price",
    "idx:rating",
    "idx:created",
    "idx:bookings",
    "idx:popularity",
    "idx:max_adults",
    "idx:max_children",
    "idx:max_capacity",
];

/// `tag:type:{typeId}` — properties of a given numeric property type.
pub fn tag_type_id(type_id: i64) -> String {
    format!("tag:type:{type_id}")
}

/// `tag:city:{city}` — properties in a given city.
pub fn tag_city(city: &str) -> String {
    format!("tag:city:{city}")
}

/// `tag:amenity:{amenityId}` — properties offering a given amenity.
pub fn tag_amenity(amenity_id: i64) -> String {
    format!("tag:amenity:{amenity_id}")
}

/// `tag:service:{serviceId}` — properties offering a given service.
pub fn tag_service(service_id: i64) -> String {
    format!("tag:service:{service_id}")
}

/// `tag:featured` — featured properties.
pub fn tag_featured() -> String {
    "tag:featured".to_string()
}

/// `tag:property:has_adults` — properties with at least one unit accepting adults.
pub fn tag_property_has_adults() -> String {
    "tag:property:has_adults".to_string()
}

/// `tag:property:has_children` — properties with at least one unit accepting children.
pub fn tag_property_has_children() -> String {
    "tag:property:has_children".to_string()
}

/// `dynamic_value:{field}:{value}` — properties whose dynamic field `field`
/// equals `value` (case-insensitive equality is applied by the caller before
/// this key is formatted).
pub fn dynamic_value(field: &str, value: &str) -> String {
    format!("dynamic_value:{field}:{value}")
}

/// `unit:{id}` — the unit hash.
pub fn unit_hash(id: UnitId) -> String {
    format!("unit:{id}")
}

/// `property:units:{propertyId}` — the set of unit ids belonging to a property.
pub fn property_units(id: PropertyId) -> String {
    format!("property:units:{id}")
}

/// `tag:unittype:{typeId}` — units of a given numeric unit type.
pub fn tag_unittype(type_id: i64) -> String {
    format!("tag:unittype:{type_id}")
}

/// `tag:unittype:has_adults`.
pub fn tag_unittype_has_adults() -> String {
    "tag:unittype:has_adults".to_string()
}

/// `tag:unittype:has_children`.
pub fn tag_unittype_has_children() -> String {
    "tag:unittype:has_children".to_string()
}

/// `tag:unit:has_adults`.
pub fn tag_unit_has_adults() -> String {
    "tag:unit:has_adults".to_string()
}

/// `tag:unit:has_children`.
pub fn tag_unit_has_children() -> String {
    "tag:unit:has_children".to_string()
}

/// `idx:unit:max_adults` — sort index over unit max-adult capacity.
pub fn idx_unit_max_adults() -> String {
    "idx:unit:max_adults".to_string()
}

/// `idx:unit:max_children` — sort index over unit max-children capacity.
pub fn idx_unit_max_children() -> String {
    "idx:unit:max_children".to_string()
}

/// `avail:unit:{unitId}` — sorted set of `"startTicks:endTicks"` members
/// scored by `startTicks`.
pub fn avail_unit(id: UnitId) -> String {
    format!("avail:unit:{id}")
}

/// `avail:date:{yyyymmdd}` — secondary calendar index.
pub fn avail_date(yyyymmdd: u32) -> String {
    format!("avail:date:{yyyymmdd}")
}

/// `avail:property:{propertyId}` — aggregate availability marker for a property.
pub fn avail_property(id: PropertyId) -> String {
    format!("avail:property:{id}")
}

/// `pricing:unit:{unitId}` — hash of miscellaneous pricing metadata.
pub fn pricing_unit(id: UnitId) -> String {
    format!("pricing:unit:{id}")
}

/// `price:unit:{unitId}` — sorted set of
/// `"startTicks:endTicks:price:currency"` members scored by `startTicks`.
pub fn price_unit(id: UnitId) -> String {
    format!("price:unit:{id}")
}

/// `price:date:{yyyymmdd}` — secondary calendar index for pricing.
pub fn price_date(yyyymmdd: u32) -> String {
    format!("price:date:{yyyymmdd}")
}

/// `pricing:cache:{unitId}:{checkIn:yyyymmdd}:{checkOut:yyyymmdd}`.
pub fn pricing_cache(unit: UnitId, check_in_yyyymmdd: u32, check_out_yyyymmdd: u32) -> String {
    format!("pricing:cache:{unit}:{check_in_yyyymmdd}:{check_out_yyyymmdd}")
}

/// Key prefix for the native full-text index (`idx:properties`, with document
/// keys prefixed `property:`).
pub fn text_index_name() -> String {
    "idx:properties".to_string()
}

/// Key prefix used for document keys fed to the text index.
pub fn text_index_key_prefix() -> &'static str {
    "property:"
}

/// `cache:search:l1:{hash}`.
pub fn cache_search_l1(hash: &str) -> String {
    format!("cache:search:l1:{hash}")
}

/// `cache:search:l2:{hash}`.
pub fn cache_search_l2(hash: &str) -> String {
    format!("cache:search:l2:{hash}")
}

/// `cache:data:l3:{key}`.
pub fn cache_data_l3(key: &str) -> String {
    format!("cache:data:l3:{key}")
}

/// `cache:fx:{from}:{to}`.
pub fn cache_fx(from: &str, to: &str) -> String {
    format!("cache:fx:{from}:{to}")
}

/// Names of the three named scripts the executor may dispatch.
pub mod scripts {
    /// `lua:search:complex`.
    pub const SEARCH_COMPLEX: &str = "lua:search:complex";
    /// `lua:filter:availability`.
    pub const FILTER_AVAILABILITY: &str = "lua:filter:availability";
    /// `lua:calc:price`.
    pub const CALC_PRICE: &str = "lua:calc:price";
}

/// Names of stats counters.
pub mod stats {
    /// `stats:search:count`.
    pub const SEARCH_COUNT: &str = "stats:search:count";
    /// `stats:search:latency`.
    pub const SEARCH_LATENCY: &str = "stats:search:latency";
    /// `stats:cache:hitrate`.
    pub const CACHE_HITRATE: &str = "stats:cache:hitrate";
    /// `stats:errors:{type}`.
    pub fn errors(kind: &str) -> String {
        format!("stats:errors:{kind}")
    }
}

/// `temp:{operation}:{uuid}` — a scratch key for a single query execution.
pub fn temp_key(operation: &str, uuid: uuid::Uuid) -> String {
    format!("temp:{operation}:{uuid}")
}

/// `lock:{resource}:{id}` — per-id serialization lock name (for diagnostics;
/// the actual lock is an in-process mutex table, not a datastore key).
pub fn lock_name(resource: &str, id: &str) -> String {
    format!("lock:{resource}:{id}")
}

/// Channel names published on mutation.
pub mod channel {
    /// `property:created`.
    pub const PROPERTY_CREATED: &str = "property:created";
    /// `property:updated`.
    pub const PROPERTY_UPDATED: &str = "property:updated";
    /// `property:deleted`.
    pub const PROPERTY_DELETED: &str = "property:deleted";
    /// `unit:created`.
    pub const UNIT_CREATED: &str = "unit:created";
    /// `unit:updated`.
    pub const UNIT_UPDATED: &str = "unit:updated";
    /// `unit:deleted`.
    pub const UNIT_DELETED: &str = "unit:deleted";
    /// `availability:changed`.
    pub const AVAILABILITY_CHANGED: &str = "availability:changed";
    /// `pricing:changed`.
    pub const PRICING_CHANGED: &str = "pricing:changed";
    /// `dynamic:changed`.
    pub const DYNAMIC_CHANGED: &str = "dynamic:changed";
    /// `index:rebuilt`.
    pub const INDEX_REBUILT: &str = "index:rebuilt";
    /// Reserved channel for connection-manager failure telemetry, not part
    /// of the domain event set above.
    pub const CONNECTION_FAILED: &str = "_internal:connection:failed";
    /// Reserved channel for connection-manager recovery telemetry.
    pub const CONNECTION_RESTORED: &str = "_internal:connection:restored";
}
