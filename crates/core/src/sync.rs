//! Sync coordination between the remote record source and the local store.
//!
//! [`SyncCoordinator::ensure_fresh`] is the single entry point the UI layer
//! uses: it resyncs a stale entity table, then answers the filtered query from
//! the store. At most one sync per entity type runs at a time; overlapping
//! callers await the same shared future and observe the same outcome. Sync
//! failures never reach the caller as errors, they surface as a warning on an
//! answer served from whatever snapshot is available.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::config::{AppConfig, ReportNames};
use crate::entity::{Entity, EntityType};
use crate::normalize::{NormalizerConfig, normalize_batch};
use crate::query::{FilterSet, QueryResult};
use crate::source::{FetchError, PaginationOptions, RecordSource, fetch_all_pages};
use crate::store::{CacheDb, ENTITY_SCHEMA_VERSION, SyncMetadata};

/// Everything a sync needs besides the source and the store.
#[derive(Debug, Clone, Default)]
pub struct SyncSettings {
    pub reports: ReportNames,
    pub pagination: PaginationOptions,
    pub normalizer: NormalizerConfig,
    /// Snapshot TTL. `None` keeps a snapshot fresh until invalidated.
    pub max_age: Option<Duration>,
}

impl SyncSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            reports: config.reports.clone(),
            pagination: config.pagination(),
            normalizer: config.normalizer(),
            max_age: config.sync_max_age(),
        }
    }

    /// Whether a table with this metadata must be resynced.
    pub fn is_stale(&self, meta: Option<&SyncMetadata>, now: DateTime<Utc>) -> bool {
        let Some(meta) = meta else { return true };
        if meta.schema_version != ENTITY_SCHEMA_VERSION {
            return true;
        }
        let Some(last_sync) = meta.last_sync_at() else { return true };

        match self.max_age {
            None => false,
            Some(max_age) => {
                let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
                now.signed_duration_since(last_sync) > max_age
            }
        }
    }
}

/// Where an answer was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// The local store.
    Cache,
    /// A fresh remote fetch that could not be stored.
    Remote,
}

/// Answer to a UI query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EntityResult {
    pub entity_type: EntityType,
    pub data: Vec<Entity>,
    /// Snapshot size before filtering.
    pub total: usize,
    pub source: ResultSource,
    /// A refresh was needed but failed; `data` may be out of date.
    pub stale: bool,
    /// Non-blocking notice for the user, e.g. a failed refresh.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl EntityResult {
    fn new(entity_type: EntityType, result: QueryResult, source: ResultSource) -> Self {
        Self { entity_type, data: result.data, total: result.total, source, stale: false, warning: None }
    }
}

/// Outcome of one sync attempt, shared by every caller that awaited it.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Another sync committed before this one needed to fetch.
    Fresh,
    /// The new snapshot was committed.
    Committed(SyncMetadata),
    /// Records were fetched but could not be stored.
    Uncached { entities: Arc<Vec<Entity>>, reason: Option<String> },
    /// The fetch failed; nothing changed.
    Failed(FetchError),
}

type SharedSync = Shared<BoxFuture<'static, SyncOutcome>>;
type InflightMap = Arc<Mutex<HashMap<EntityType, SharedSync>>>;

/// Removes the in-flight entry when the sync future finishes or is dropped.
struct InflightGuard {
    inflight: InflightMap,
    entity_type: EntityType,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.entity_type);
    }
}

/// Keeps entity tables fresh and answers filtered queries.
///
/// Runs without a store when the local database could not be opened; every
/// query then fetches from the remote source directly.
pub struct SyncCoordinator {
    source: Arc<dyn RecordSource>,
    store: Option<CacheDb>,
    settings: Arc<SyncSettings>,
    inflight: InflightMap,
}

impl SyncCoordinator {
    pub fn new(source: Arc<dyn RecordSource>, store: Option<CacheDb>, settings: SyncSettings) -> Self {
        if store.is_none() {
            tracing::warn!("no local store available, queries will fetch remotely without caching");
        }
        Self { source, store, settings: Arc::new(settings), inflight: Arc::new(Mutex::new(HashMap::new())) }
    }

    pub fn store(&self) -> Option<&CacheDb> {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Make sure the entity table is fresh, then answer the query.
    ///
    /// Never fails: sync and store errors degrade to a stale, empty or
    /// uncached answer carrying a `warning`.
    pub async fn ensure_fresh(&self, entity_type: EntityType, filters: &FilterSet) -> EntityResult {
        let needs_sync = match &self.store {
            Some(store) => match store.get_metadata(entity_type).await {
                Ok(meta) => self.settings.is_stale(meta.as_ref(), Utc::now()),
                Err(e) => {
                    tracing::warn!(entity_type = %entity_type, "reading sync metadata failed: {e}");
                    true
                }
            },
            None => true,
        };

        let mut warning = None;
        if needs_sync {
            match self.sync(entity_type).await {
                SyncOutcome::Fresh | SyncOutcome::Committed(_) => {}
                SyncOutcome::Uncached { entities, reason } => {
                    let mut result = EntityResult::new(entity_type, filters.apply(&entities), ResultSource::Remote);
                    result.warning = reason.map(|r| format!("results could not be cached: {r}"));
                    return result;
                }
                SyncOutcome::Failed(e) => warning = Some(format!("refresh failed: {e}")),
            }
        } else {
            tracing::debug!(entity_type = %entity_type, "snapshot fresh, skipping sync");
        }

        let Some(store) = &self.store else {
            let mut result = EntityResult::new(entity_type, QueryResult::default(), ResultSource::Remote);
            result.stale = warning.is_some();
            result.warning = warning;
            return result;
        };

        match store.query_all(entity_type, filters).await {
            Ok(answer) => {
                let mut result = EntityResult::new(entity_type, answer, ResultSource::Cache);
                result.stale = warning.is_some();
                result.warning = warning;
                result
            }
            Err(e) => {
                tracing::warn!(entity_type = %entity_type, "store read failed, fetching directly: {e}");
                self.fetch_direct(entity_type, filters, &e).await
            }
        }
    }

    /// Alias of [`Self::ensure_fresh`] matching the UI contract.
    pub async fn get_entities(&self, entity_type: EntityType, filters: &FilterSet) -> EntityResult {
        self.ensure_fresh(entity_type, filters).await
    }

    /// Drop the sync metadata so the next query resyncs, then resync now.
    ///
    /// The snapshot itself is kept, so a failed refresh still answers from it.
    pub async fn force_refresh(&self, entity_type: EntityType) -> EntityResult {
        if let Some(store) = &self.store
            && let Err(e) = store.invalidate(entity_type).await
        {
            tracing::warn!(entity_type = %entity_type, "invalidating sync metadata failed: {e}");
        }
        self.ensure_fresh(entity_type, &FilterSet::new()).await
    }

    /// Sync metadata for every table that has synced.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoreUnavailable` when running without a store.
    pub async fn sync_status(&self) -> Result<Vec<SyncMetadata>, Error> {
        match &self.store {
            Some(store) => store.all_metadata().await,
            None => Err(Error::StoreUnavailable("running without a local store".into())),
        }
    }

    /// Run a sync for an entity type, or join the one already in flight.
    pub async fn sync(&self, entity_type: EntityType) -> SyncOutcome {
        self.join_or_start(entity_type, self.store.clone()).await
    }

    /// Join the in-flight job for `entity_type`, or start one that commits to
    /// `store`. A store-less job hands its entities back as `Uncached`.
    async fn join_or_start(&self, entity_type: EntityType, store: Option<CacheDb>) -> SyncOutcome {
        let pending = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            match inflight.get(&entity_type) {
                Some(pending) => {
                    tracing::debug!(entity_type = %entity_type, "joining in-flight sync");
                    pending.clone()
                }
                None => {
                    let job = SyncJob {
                        source: Arc::clone(&self.source),
                        store,
                        settings: Arc::clone(&self.settings),
                        entity_type,
                    };
                    let guard = InflightGuard { inflight: Arc::clone(&self.inflight), entity_type };
                    let pending = async move {
                        let _guard = guard;
                        job.run().await
                    }
                    .boxed()
                    .shared();
                    inflight.insert(entity_type, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Answer from a remote walk after the store failed to read. The walk
    /// shares the per-type in-flight slot with regular syncs.
    async fn fetch_direct(&self, entity_type: EntityType, filters: &FilterSet, cause: &Error) -> EntityResult {
        let outcome = self.join_or_start(entity_type, None).await;

        let mut result = match outcome {
            SyncOutcome::Uncached { entities, .. } => {
                EntityResult::new(entity_type, filters.apply(&entities), ResultSource::Remote)
            }
            SyncOutcome::Failed(e) => {
                let mut result = EntityResult::new(entity_type, QueryResult::default(), ResultSource::Remote);
                result.stale = true;
                result.warning = Some(format!("local store unavailable: {cause}; refresh failed: {e}"));
                return result;
            }
            // Joined a regular sync that committed, so the store may read again.
            SyncOutcome::Fresh | SyncOutcome::Committed(_) => {
                let answer = match &self.store {
                    Some(store) => store.query_all(entity_type, filters).await.ok(),
                    None => None,
                };
                match answer {
                    Some(answer) => return EntityResult::new(entity_type, answer, ResultSource::Cache),
                    None => {
                        let mut result = EntityResult::new(entity_type, QueryResult::default(), ResultSource::Remote);
                        result.stale = true;
                        result
                    }
                }
            }
        };
        result.warning = Some(format!("local store unavailable: {cause}"));
        result
    }
}

/// One sync attempt: recheck staleness, fetch every page, normalize, commit.
struct SyncJob {
    source: Arc<dyn RecordSource>,
    store: Option<CacheDb>,
    settings: Arc<SyncSettings>,
    entity_type: EntityType,
}

impl SyncJob {
    async fn run(self) -> SyncOutcome {
        let entity_type = self.entity_type;
        let start = Instant::now();

        if let Some(store) = &self.store {
            match store.get_metadata(entity_type).await {
                Ok(meta) if !self.settings.is_stale(meta.as_ref(), Utc::now()) => return SyncOutcome::Fresh,
                Ok(_) => {}
                Err(e) => tracing::warn!(entity_type = %entity_type, "reading sync metadata failed: {e}"),
            }
        }

        let report = self.settings.reports.for_type(entity_type);
        tracing::info!(entity_type = %entity_type, report, "syncing");

        let raw = match fetch_all_pages(self.source.as_ref(), report, &self.settings.pagination).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(entity_type = %entity_type, report, "sync failed, keeping previous snapshot: {e}");
                return SyncOutcome::Failed(e);
            }
        };

        let batch = normalize_batch(entity_type, raw, &self.settings.normalizer);
        if batch.skipped > 0 || batch.duplicates > 0 {
            tracing::warn!(
                entity_type = %entity_type,
                skipped = batch.skipped,
                duplicates = batch.duplicates,
                "dropped records during normalization"
            );
        }

        let Some(store) = &self.store else {
            return SyncOutcome::Uncached { entities: Arc::new(batch.entities), reason: None };
        };

        match store.replace_all(entity_type, &batch.entities, Utc::now()).await {
            Ok(meta) => {
                tracing::info!(
                    entity_type = %entity_type,
                    count = meta.record_count,
                    "sync complete in {:?}",
                    start.elapsed()
                );
                SyncOutcome::Committed(meta)
            }
            Err(e) => {
                tracing::warn!(entity_type = %entity_type, "committing snapshot failed: {e}");
                SyncOutcome::Uncached { entities: Arc::new(batch.entities), reason: Some(e.to_string()) }
            }
        }
    }
}
