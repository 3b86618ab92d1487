//! `propdex-api`: the public surface — `search` plus the nine
//! mutation event handlers, `rebuild_index`, and `optimize_database` —
//! wired over `propdex-engine`'s document builder, index maintainer, query
//! executor, cache, maintenance loop, and rebuilder.

#![warn(missing_docs)]

use propdex_core::codec::{decode_snapshot_hex, decode_unit_fields};
use propdex_core::external::{
    AvailabilityService, CurrencyExchangeRepository, PricingService, PropertyRepository, UnitRepository,
};
use propdex_core::{key, AvailabilityRange, PricingRule, PropertyDocument, PropertyId, Result, UnitDocument, UnitId};
use propdex_datastore::Datastore;
use propdex_engine::cache::{fingerprint, IndexVersion, L1Cache, L2Cache};
use propdex_engine::{BuildResult, DocumentBuilder, IndexMaintainer, IndexRebuilder, MaintenanceScheduler, SearchExecutor, SearchRequest, SearchResult};
use propdex_search::TextEngineCapability;
use std::sync::Arc;
use tracing::{info, warn};

/// Facade over the five index-facing engine components; one instance per
/// deployment. Constructed once with the external collaborators wired in,
/// then driven by the public operations this facade exposes.
pub struct PropertySearchEngine {
    datastore: Arc<dyn Datastore>,
    properties: Arc<dyn PropertyRepository>,
    units: Arc<dyn UnitRepository>,
    builder: Arc<DocumentBuilder>,
    maintainer: Arc<IndexMaintainer>,
    executor: Arc<SearchExecutor>,
    l1: Arc<L1Cache>,
    l2: Arc<L2Cache>,
    index_version: Arc<IndexVersion>,
}

impl PropertySearchEngine {
    /// Wire the facade to its datastore and external collaborators. The
    /// currency and availability oracles are optional: omitting them
    /// degrades cross-currency price filtering/sorting and
    /// `ComplexFilter`'s date checks to their documented fallbacks.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        datastore: Arc<dyn Datastore>,
        properties: Arc<dyn PropertyRepository>,
        units: Arc<dyn UnitRepository>,
        pricing: Arc<dyn PricingService>,
        availability: Option<Arc<dyn AvailabilityService>>,
        currency: Option<Arc<dyn CurrencyExchangeRepository>>,
        locks: Arc<propdex_concurrency::PropertyLockTable>,
        text_capability: TextEngineCapability,
    ) -> Self {
        let builder = Arc::new(DocumentBuilder::new(properties.clone(), units.clone(), pricing));
        let maintainer = Arc::new(IndexMaintainer::new(datastore.clone(), locks));

        let mut executor = SearchExecutor::new(datastore.clone(), text_capability);
        if let Some(a) = availability.clone() {
            executor = executor.with_availability(a);
        }
        if let Some(c) = currency.clone() {
            executor = executor.with_currency(c);
        }

        PropertySearchEngine {
            datastore: datastore.clone(),
            properties,
            units,
            builder,
            maintainer,
            executor: Arc::new(executor),
            l1: Arc::new(L1Cache::default()),
            l2: Arc::new(L2Cache::new(datastore)),
            index_version: Arc::new(IndexVersion::new()),
        }
    }

    /// `search(request) → result`. Checks the L1 then L2 cache
    /// before executing; a fresh result is written back to both.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult> {
        let epoch = self.index_version.current();
        let fp = fingerprint(request, epoch);

        if let Some(cached) = self.l1.get(&fp) {
            return Ok(cached);
        }
        if let Some(cached) = self.l2.get(&fp).await? {
            self.l1.put(fp.clone(), cached.clone());
            return Ok(cached);
        }

        let result = self.executor.search(request).await?;
        self.l1.put(fp.clone(), result.clone());
        self.l2.put(&fp, &result).await?;
        Ok(result)
    }

    /// Build and index (or re-index) `id`, diffing against whatever is
    /// currently indexed for it. Used by `on_property_created` and
    /// `on_property_updated` — both are the same operation from the
    /// maintainer's point of view.
    async fn reindex_property(&self, id: PropertyId) -> Result<()> {
        let previous = self.current_document_and_units(id).await?;
        let BuildResult { document, units } = self.builder.build(id).await?;
        let previous_ref = previous.as_ref().map(|(doc, units)| (doc, units.as_slice()));
        self.maintainer.upsert(previous_ref, &document, &units).await?;
        self.index_version.advance();
        Ok(())
    }

    /// `on_property_created(id)`.
    pub async fn on_property_created(&self, id: PropertyId) -> Result<()> {
        self.reindex_property(id).await?;
        self.datastore.publish(key::channel::PROPERTY_CREATED, &id.to_string()).await?;
        Ok(())
    }

    /// `on_property_updated(id)`.
    pub async fn on_property_updated(&self, id: PropertyId) -> Result<()> {
        self.reindex_property(id).await?;
        self.datastore.publish(key::channel::PROPERTY_UPDATED, &id.to_string()).await?;
        Ok(())
    }

    /// `on_property_deleted(id)`. A no-op, not an error, for a
    /// property absent from the index.
    pub async fn on_property_deleted(&self, id: PropertyId) -> Result<()> {
        let Some((document, units)) = self.current_document_and_units(id).await? else {
            return Ok(());
        };
        self.maintainer.remove(&document, &units).await?;
        self.index_version.advance();
        self.datastore.publish(key::channel::PROPERTY_DELETED, &id.to_string()).await?;
        Ok(())
    }

    /// `on_unit_created(unit_id, property_id)`. Units are
    /// rebuilt wholesale as part of their owning property's document, so
    /// this re-indexes the property.
    pub async fn on_unit_created(&self, unit_id: UnitId, property_id: PropertyId) -> Result<()> {
        self.reindex_property(property_id).await?;
        self.datastore.publish(key::channel::UNIT_CREATED, &unit_id.to_string()).await?;
        Ok(())
    }

    /// `on_unit_updated(unit_id, property_id)`.
    pub async fn on_unit_updated(&self, unit_id: UnitId, property_id: PropertyId) -> Result<()> {
        self.reindex_property(property_id).await?;
        self.datastore.publish(key::channel::UNIT_UPDATED, &unit_id.to_string()).await?;
        Ok(())
    }

    /// `on_unit_deleted(unit_id, property_id)`.
    pub async fn on_unit_deleted(&self, unit_id: UnitId, property_id: PropertyId) -> Result<()> {
        self.reindex_property(property_id).await?;
        self.datastore.publish(key::channel::UNIT_DELETED, &unit_id.to_string()).await?;
        Ok(())
    }

    /// `on_availability_changed(unit_id, property_id, ranges)`.
    /// Availability is consulted live via the `AvailabilityService` oracle
    /// at query time rather than mirrored into `avail:*` keys by this
    /// engine, so this publishes the change notification and advances the
    /// cache epoch without touching the index itself.
    pub async fn on_availability_changed(
        &self,
        unit_id: UnitId,
        property_id: PropertyId,
        ranges: &[AvailabilityRange],
    ) -> Result<()> {
        let _ = ranges;
        self.index_version.advance();
        self.datastore
            .publish(key::channel::AVAILABILITY_CHANGED, &format!("{unit_id}:{property_id}"))
            .await?;
        Ok(())
    }

    /// `on_pricing_rule_changed(unit_id, property_id, rules)`.
    /// Re-derives the property's document so `min_price`/`max_price` reflect
    /// the new rules, via the same path as a unit mutation.
    pub async fn on_pricing_rule_changed(
        &self,
        unit_id: UnitId,
        property_id: PropertyId,
        rules: &[PricingRule],
    ) -> Result<()> {
        let _ = rules;
        self.reindex_property(property_id).await?;
        self.datastore
            .publish(key::channel::PRICING_CHANGED, &format!("{unit_id}:{property_id}"))
            .await?;
        Ok(())
    }

    /// `on_dynamic_field_changed(property_id, field_name, field_value, is_add)`.
    /// Re-derives the property's document and diffs `dynamic_value:*`
    /// membership through the usual maintainer path.
    pub async fn on_dynamic_field_changed(
        &self,
        property_id: PropertyId,
        field_name: &str,
        field_value: &str,
        is_add: bool,
    ) -> Result<()> {
        let _ = (field_name, field_value, is_add);
        self.reindex_property(property_id).await?;
        self.datastore
            .publish(key::channel::DYNAMIC_CHANGED, &property_id.to_string())
            .await?;
        Ok(())
    }

    /// `rebuild_index()`. Delegates to
    /// [`IndexRebuilder`]; on completion, the index-version epoch has
    /// already advanced and `index:rebuilt` has already been published.
    pub async fn rebuild_index(&self) -> Result<propdex_engine::RebuildReport> {
        let rebuilder = IndexRebuilder::new(
            self.datastore.clone(),
            self.properties.clone(),
            self.builder.clone(),
            self.maintainer.clone(),
            self.index_version.clone(),
        );
        let report = rebuilder.rebuild().await?;
        info!(attempted = report.attempted, succeeded = report.succeeded, "rebuild_index complete");
        Ok(report)
    }

    /// `optimize_database()`. Runs one deep-maintenance pass immediately,
    /// outside the scheduler's own period, for an operator-triggered
    /// optimization request.
    pub async fn optimize_database(&self) -> Result<()> {
        let scheduler = MaintenanceScheduler::new(self.datastore.clone());
        let stats = scheduler.stats();
        propdex_engine::maintenance::run_deep_maintenance_once(self.datastore.as_ref(), &stats).await
    }

    /// Spawn the periodic maintenance loops (health/sweep/deep) as
    /// background tasks tied to this engine's datastore.
    pub fn spawn_maintenance(&self) -> Vec<tokio::task::JoinHandle<()>> {
        MaintenanceScheduler::new(self.datastore.clone()).spawn()
    }

    async fn current_document_and_units(
        &self,
        id: PropertyId,
    ) -> Result<Option<(PropertyDocument, Vec<UnitDocument>)>> {
        let Some(hex) = self.datastore.stringget(&key::property_bin(id)).await? else {
            return Ok(None);
        };
        let document = decode_snapshot_hex(&hex)?;

        let unit_ids = self.datastore.smembers(&key::property_units(id)).await?;
        let mut units = Vec::with_capacity(unit_ids.len());
        for unit_id in unit_ids {
            let Ok(parsed) = unit_id.parse::<UnitId>() else {
                warn!(%unit_id, "skipping malformed unit id from previous state");
                continue;
            };
            let fields = self.datastore.hget_all(&key::unit_hash(parsed)).await?;
            if fields.is_empty() {
                continue;
            }
            match decode_unit_fields(&fields) {
                Ok(unit) => units.push(unit),
                Err(error) => warn!(%unit_id, %error, "failed to decode indexed unit, skipping from previous state"),
            }
        }
        Ok(Some((document, units)))
    }
}
