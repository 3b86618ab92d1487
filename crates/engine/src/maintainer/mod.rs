//! Index maintainer: diff-based tag maintenance. Given the
//! previously-indexed document (if any) and the freshly built one, computes
//! the minimal set of buffered write [`Command`]s needed to bring every
//! derived key in sync, then commits them as one atomic transaction.
//!
//! Property-level and unit-level keys are maintained together since a
//! property mutation routinely rebuilds its units too.

mod diff;

use propdex_concurrency::PropertyLockTable;
use propdex_core::document::UnitDocument;
use propdex_core::{key, PropertyDocument, Result};
use propdex_datastore::types::Command;
use propdex_datastore::Datastore;
use std::sync::Arc;

pub use diff::{sort_index_scores, UnitAggregates};

/// Maintains every derived index key for property and unit documents.
pub struct IndexMaintainer {
    datastore: Arc<dyn Datastore>,
    locks: Arc<PropertyLockTable>,
}

impl IndexMaintainer {
    /// Wire the maintainer to its datastore and per-property lock table.
    pub fn new(datastore: Arc<dyn Datastore>, locks: Arc<PropertyLockTable>) -> Self {
        IndexMaintainer { datastore, locks }
    }

    /// Index (or re-index) a property and its units. `previous` is the
    /// document and unit list as they stood in the index before this
    /// mutation, if any.
    pub async fn upsert(
        &self,
        previous: Option<(&PropertyDocument, &[UnitDocument])>,
        document: &PropertyDocument,
        units: &[UnitDocument],
    ) -> Result<()> {
        let _guard = self.locks.lock(document.id).await;
        let new_aggregates = UnitAggregates::from_units(units);
        let previous_with_aggregates =
            previous.map(|(doc, prev_units)| (doc, UnitAggregates::from_units(prev_units)));

        let mut commands = diff::property_commands(previous_with_aggregates, document, new_aggregates);
        commands.extend(diff::unit_commands(document.id, units));
        self.datastore.commit_transaction(commands).await?;
        self.datastore
            .sadd(&key::all_properties(), &[document.id.to_string()])
            .await?;
        Ok(())
    }

    /// Remove a property and its units from every index they appear in.
    pub async fn remove(&self, document: &PropertyDocument, units: &[UnitDocument]) -> Result<()> {
        let _guard = self.locks.lock(document.id).await;
        let aggregates = UnitAggregates::from_units(units);

        let mut commands = vec![
            Command::Del { key: key::property_hash(document.id) },
            Command::Del { key: key::property_bin(document.id) },
            Command::Del { key: key::property_units(document.id) },
            Command::GeoRem { key: key::geo_properties(), member: document.id.to_string() },
            Command::GeoRem { key: key::geo_city(&document.city), member: document.id.to_string() },
        ];

        for (name, _) in diff::sort_index_scores(document, aggregates) {
            self.datastore.zrem(name, &document.id.to_string()).await?;
        }

        for tag in diff::tag_keys_for_removal(document, aggregates) {
            commands.push(Command::SRem { key: tag, members: vec![document.id.to_string()] });
        }
        for (field, value) in &document.dynamic_fields {
            commands.push(Command::SRem {
                key: key::dynamic_value(field, value),
                members: vec![document.id.to_string()],
            });
        }

        for unit in units {
            commands.push(Command::Del { key: key::unit_hash(unit.id) });
            commands.push(Command::SRem {
                key: key::tag_unittype(unit.unit_type_id),
                members: vec![unit.id.to_string()],
            });
            commands.push(Command::SRem {
                key: key::tag_unit_has_adults(),
                members: vec![unit.id.to_string()],
            });
            commands.push(Command::SRem {
                key: key::tag_unit_has_children(),
                members: vec![unit.id.to_string()],
            });
            self.datastore
                .zrem(&key::idx_unit_max_adults(), &unit.id.to_string())
                .await?;
            self.datastore
                .zrem(&key::idx_unit_max_children(), &unit.id.to_string())
                .await?;
        }

        self.datastore.commit_transaction(commands).await?;
        self.datastore
            .srem(&key::all_properties(), &[document.id.to_string()])
            .await?;
        Ok(())
    }

    /// Re-derive and persist every index key for a property from scratch,
    /// used by the background rebuilder after a detected fault.
    pub async fn reindex(&self, document: &PropertyDocument, units: &[UnitDocument]) -> Result<()> {
        self.upsert(None, document, units).await
    }
}
