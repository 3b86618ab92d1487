//! Background rebuilder: deletes every engine-owned key
//! family, then re-derives the index from the authoritative property store
//! in small batches, advancing the index-version epoch once on completion.

use crate::builder::DocumentBuilder;
use crate::cache::IndexVersion;
use crate::maintainer::IndexMaintainer;
use propdex_core::external::PropertyRepository;
use propdex_core::{key, Result};
use propdex_datastore::Datastore;
use std::sync::Arc;
use tracing::{info, warn};

/// Key-glob prefixes that together cover every key family this engine owns
///; a rebuild deletes all of them before re-deriving from the
/// authoritative store.
const OWNED_KEY_PATTERNS: &[&str] = &[
    "properties:all",
    "property:*",
    "geo:*",
    "idx:*",
    "tag:*",
    "unit:*",
    "dynamic_value:*",
    "cache:*",
];

/// Number of properties rebuilt per batch.
const BATCH_SIZE: usize = 50;

/// Rebuild report, for logging/ops visibility.
#[derive(Debug, Default)]
pub struct RebuildReport {
    /// Properties the authoritative store listed as active.
    pub attempted: usize,
    /// Properties successfully re-indexed.
    pub succeeded: usize,
    /// Properties that failed to build or index; logged but not fatal.
    pub failed: usize,
}

/// Drives a full index rebuild.
pub struct IndexRebuilder {
    datastore: Arc<dyn Datastore>,
    properties: Arc<dyn PropertyRepository>,
    builder: Arc<DocumentBuilder>,
    maintainer: Arc<IndexMaintainer>,
    index_version: Arc<IndexVersion>,
}

impl IndexRebuilder {
    /// Wire the rebuilder to its collaborators.
    pub fn new(
        datastore: Arc<dyn Datastore>,
        properties: Arc<dyn PropertyRepository>,
        builder: Arc<DocumentBuilder>,
        maintainer: Arc<IndexMaintainer>,
        index_version: Arc<IndexVersion>,
    ) -> Self {
        IndexRebuilder { datastore, properties, builder, maintainer, index_version }
    }

    /// Delete every owned key, then re-index every active property in
    /// batches of [`BATCH_SIZE`]. Per-property failures are logged and
    /// counted, not propagated — a rebuild should make best-effort forward
    /// progress rather than abort partway through.
    pub async fn rebuild(&self) -> Result<RebuildReport> {
        self.clear_owned_keys().await?;

        let ids = self.properties.get_active_properties().await?;
        let mut report = RebuildReport { attempted: ids.len(), ..Default::default() };

        for batch in ids.chunks(BATCH_SIZE) {
            for &id in batch {
                match self.builder.build(id).await {
                    Ok(result) => match self.maintainer.upsert(None, &result.document, &result.units).await {
                        Ok(()) => report.succeeded += 1,
                        Err(error) => {
                            warn!(property_id = %id, %error, "rebuild failed to index property");
                            report.failed += 1;
                        }
                    },
                    Err(error) => {
                        warn!(property_id = %id, %error, "rebuild failed to build property document");
                        report.failed += 1;
                    }
                }
            }
        }

        let epoch = self.index_version.advance();
        self.datastore.publish(key::channel::INDEX_REBUILT, &epoch.to_string()).await?;
        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            epoch,
            "index rebuild complete"
        );
        Ok(report)
    }

    async fn clear_owned_keys(&self) -> Result<()> {
        for pattern in OWNED_KEY_PATTERNS {
            for key in self.datastore.scan(pattern).await? {
                self.datastore.del(&key).await?;
            }
        }
        Ok(())
    }
}
