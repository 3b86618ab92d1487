//! Tag- and score-diffing between the previous and next state of a document.
//! Kept separate from `mod.rs` so the set-math is independently testable
//! without a datastore.

use propdex_core::codec::{encode_flat, encode_snapshot_hex, encode_unit_fields};
use propdex_core::document::UnitDocument;
use propdex_core::{key, PropertyDocument, PropertyId};
use propdex_datastore::types::Command;
use std::collections::HashSet;

/// Aggregate unit-derived facts the property-level tag set depends on but
/// which do not live on [`PropertyDocument`] itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitAggregates {
    /// Whether any unit accepts at least one adult.
    pub has_adults: bool,
    /// Whether any unit accepts at least one child.
    pub has_children: bool,
    /// Maximum `max_adults` across units.
    pub max_adults: u32,
    /// Maximum `max_children` across units.
    pub max_children: u32,
}

impl UnitAggregates {
    /// Derive aggregates from a property's unit list.
    pub fn from_units(units: &[UnitDocument]) -> Self {
        UnitAggregates {
            has_adults: units.iter().any(|u| u.max_adults > 0),
            has_children: units.iter().any(|u| u.max_children > 0),
            max_adults: units.iter().map(|u| u.max_adults).max().unwrap_or(0),
            max_children: units.iter().map(|u| u.max_children).max().unwrap_or(0),
        }
    }
}

/// The set of membership-tag keys `doc` currently belongs to, for use when
/// removing a property outright.
pub fn tag_keys_for_removal(doc: &PropertyDocument, aggregates: UnitAggregates) -> HashSet<String> {
    tag_keys_for(doc, aggregates)
}

/// The set of membership-tag keys `doc` belongs to given `aggregates`.
fn tag_keys_for(doc: &PropertyDocument, aggregates: UnitAggregates) -> HashSet<String> {
    let mut tags = HashSet::new();
    tags.insert(key::tag_type_id(doc.property_type_id));
    tags.insert(key::tag_city(&doc.city));
    for amenity_id in &doc.amenity_ids {
        tags.insert(key::tag_amenity(*amenity_id));
    }
    for service_id in &doc.service_ids {
        tags.insert(key::tag_service(*service_id));
    }
    if doc.is_featured {
        tags.insert(key::tag_featured());
    }
    if aggregates.has_adults {
        tags.insert(key::tag_property_has_adults());
    }
    if aggregates.has_children {
        tags.insert(key::tag_property_has_children());
    }
    tags
}

/// The set of `dynamic_value:{field}:{value}` keys `doc` belongs to.
fn dynamic_keys_for(doc: &PropertyDocument) -> HashSet<String> {
    doc.dynamic_fields
        .iter()
        .map(|(field, value)| key::dynamic_value(field, value))
        .collect()
}

/// The eight property-level sort-index `(name, score)` pairs, derived from
/// `doc` and `aggregates`. Every sort index is maintained uniformly on every
/// write, not lazily on first use of that sort order.
pub fn sort_index_scores(doc: &PropertyDocument, aggregates: UnitAggregates) -> Vec<(&'static str, f64)> {
    vec![
        ("idx:price", doc.min_price.as_f64()),
        ("idx:rating", doc.average_rating),
        ("idx:created", doc.created_at.0 as f64),
        ("idx:bookings", doc.booking_count as f64),
        ("idx:popularity", doc.popularity_score),
        ("idx:max_adults", aggregates.max_adults as f64),
        ("idx:max_children", aggregates.max_children as f64),
        ("idx:max_capacity", doc.max_capacity as f64),
    ]
}

/// Compute the full set of buffered write commands to bring every
/// property-level derived key in sync with `new`, given `previous` (if any)
/// and the unit aggregates computed from `new`'s current unit list.
pub fn property_commands(
    previous: Option<(&PropertyDocument, UnitAggregates)>,
    new: &PropertyDocument,
    new_aggregates: UnitAggregates,
) -> Vec<Command> {
    let mut commands = vec![
        Command::HSetMany {
            key: key::property_hash(new.id),
            fields: encode_flat(new),
        },
        Command::StringSet {
            key: key::property_bin(new.id),
            value: encode_snapshot_hex(new).unwrap_or_default(),
            ttl: None,
        },
    ];

    let old_tags = previous
        .map(|(doc, agg)| tag_keys_for(doc, agg))
        .unwrap_or_default();
    let new_tags = tag_keys_for(new, new_aggregates);
    diff_into(&old_tags, &new_tags, new.id, &mut commands);

    let old_dyn = previous.map(|(doc, _)| dynamic_keys_for(doc)).unwrap_or_default();
    let new_dyn = dynamic_keys_for(new);
    diff_into(&old_dyn, &new_dyn, new.id, &mut commands);

    for (name, score) in sort_index_scores(new, new_aggregates) {
        commands.push(Command::ZAdd {
            key: name.to_string(),
            member: new.id.to_string(),
            score,
        });
    }

    commands.push(Command::GeoAdd {
        key: key::geo_properties(),
        member: new.id.to_string(),
        lon: new.longitude,
        lat: new.latitude,
    });
    commands.push(Command::GeoAdd {
        key: key::geo_city(&new.city),
        member: new.id.to_string(),
        lon: new.longitude,
        lat: new.latitude,
    });

    commands
}

fn diff_into(old: &HashSet<String>, new: &HashSet<String>, id: PropertyId, commands: &mut Vec<Command>) {
    for removed in old.difference(new) {
        commands.push(Command::SRem {
            key: removed.clone(),
            members: vec![id.to_string()],
        });
    }
    for added in new.difference(old) {
        commands.push(Command::SAdd {
            key: added.clone(),
            members: vec![id.to_string()],
        });
    }
}

/// Commands to maintain every unit-level key for `property_id`'s current
/// unit list. Idempotent: overwrites rather than diffs, since units are
/// rebuilt wholesale on every property mutation.
pub fn unit_commands(property_id: PropertyId, units: &[UnitDocument]) -> Vec<Command> {
    let mut commands = Vec::new();
    for unit in units {
        commands.push(Command::HSetMany {
            key: key::unit_hash(unit.id),
            fields: encode_unit_fields(unit),
        });
        commands.push(Command::SAdd {
            key: key::property_units(property_id),
            members: vec![unit.id.to_string()],
        });
        commands.push(Command::SAdd {
            key: key::tag_unittype(unit.unit_type_id),
            members: vec![unit.id.to_string()],
        });
        if unit.max_adults > 0 {
            commands.push(Command::SAdd {
                key: key::tag_unit_has_adults(),
                members: vec![unit.id.to_string()],
            });
        }
        if unit.max_children > 0 {
            commands.push(Command::SAdd {
                key: key::tag_unit_has_children(),
                members: vec![unit.id.to_string()],
            });
        }
        commands.push(Command::ZAdd {
            key: key::idx_unit_max_adults(),
            member: unit.id.to_string(),
            score: unit.max_adults as f64,
        });
        commands.push(Command::ZAdd {
            key: key::idx_unit_max_children(),
            member: unit.id.to_string(),
            score: unit.max_children as f64,
        });
    }
    commands
}
