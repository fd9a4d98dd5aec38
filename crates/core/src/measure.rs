//! Partial-cache emissions measurement.
//!
//! A batch is answered from the cache where possible. The remaining rows go to
//! the resolver in a single call, their results are written back to the cache,
//! and everything is merged into one [`BatchResponse`].
//!
//! Response rows are ordered cache hits first (request order), then resolved
//! rows (resolver order).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::Error;
use crate::cache::key::{derive_key, resolve_row_key};
use crate::cache::store::EmissionsCache;
use crate::model::{BatchResponse, RequestRow, ResolveRow, ResponseRow};
use crate::resolver::EmissionsResolver;

/// The measure engine: cache lookups, resolver delegation and aggregation.
#[derive(Clone)]
pub struct MeasureService {
    cache: Arc<dyn EmissionsCache>,
    resolver: Arc<dyn EmissionsResolver>,
}

impl MeasureService {
    pub fn new(cache: Arc<dyn EmissionsCache>, resolver: Arc<dyn EmissionsResolver>) -> Self {
        Self { cache, resolver }
    }

    /// Measure emissions for a batch of rows.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `rows` is empty or any row is invalid; nothing
    ///   is read from or written to the cache in that case.
    /// - [`Error::External`] if the resolver call fails.
    /// - [`Error::Internal`] if the resolver answer cannot be paired with the
    ///   rows that were sent.
    pub async fn process(&self, rows: &[RequestRow]) -> Result<BatchResponse, Error> {
        validate_batch(rows)?;

        let keys: Vec<String> = rows.iter().map(derive_key).collect();

        // Rows sharing a key collapse into one cache write; the write is
        // permanent if any of them asked for priority.
        let mut priority_by_key: HashMap<&str, bool> = HashMap::with_capacity(keys.len());
        for (key, row) in keys.iter().zip(rows) {
            *priority_by_key.entry(key.as_str()).or_default() |= row.is_priority;
        }

        let mut response_rows = Vec::with_capacity(rows.len());
        let mut uncached = Vec::new();

        for (key, row) in keys.iter().zip(rows) {
            match self.cache.get(key) {
                Some(record) => response_rows.push(ResponseRow::from_record(&record, true)),
                None => uncached.push(ResolveRow::from(row)),
            }
        }

        let hits = response_rows.len();
        let request_id = Uuid::new_v4().to_string();

        if uncached.is_empty() {
            tracing::debug!(request_id = %request_id, hits, "all rows served from cache");
            return Ok(BatchResponse::new(request_id, response_rows));
        }

        let start = Instant::now();
        let resolved = self
            .resolver
            .resolve(&uncached)
            .await
            .map_err(Error::into_external)?;

        if resolved.len() != uncached.len() {
            return Err(Error::Internal(format!(
                "resolver returned {} rows for {} requested",
                resolved.len(),
                uncached.len()
            )));
        }

        tracing::debug!(
            request_id = %request_id,
            hits,
            misses = uncached.len(),
            elapsed = ?start.elapsed(),
            "resolved uncached rows"
        );

        for (sent, record) in uncached.iter().zip(resolved) {
            let key = resolve_row_key(sent);
            let priority = priority_by_key.get(key.as_str()).copied().ok_or_else(|| {
                Error::Internal(format!("cache key mismatch: could not find original row for key: {key}"))
            })?;

            response_rows.push(ResponseRow::from_record(&record, false));
            self.cache.set(&key, record, priority);
        }

        Ok(BatchResponse::new(request_id, response_rows))
    }
}

fn validate_batch(rows: &[RequestRow]) -> Result<(), Error> {
    if rows.is_empty() {
        return Err(Error::validation("no rows provided in request"));
    }
    rows.iter().enumerate().try_for_each(|(i, row)| row.validate(i))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::store::{EmissionsStore, Expiry};
    use crate::model::{COVERAGE_MISSING, EmissionsRecord};

    const TTL: Duration = Duration::from_secs(60);

    /// Records every batch and answers from a queue of canned results.
    #[derive(Default)]
    struct FakeResolver {
        calls: Mutex<Vec<Vec<ResolveRow>>>,
        responses: Mutex<Vec<Result<Vec<EmissionsRecord>, Error>>>,
    }

    impl FakeResolver {
        fn returning(records: Vec<EmissionsRecord>) -> Arc<Self> {
            let fake = Self::default();
            fake.responses.lock().unwrap().push(Ok(records));
            Arc::new(fake)
        }

        fn failing(err: Error) -> Arc<Self> {
            let fake = Self::default();
            fake.responses.lock().unwrap().push(Err(err));
            Arc::new(fake)
        }

        fn calls(&self) -> Vec<Vec<ResolveRow>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmissionsResolver for FakeResolver {
        async fn resolve(&self, batch: &[ResolveRow]) -> Result<Vec<EmissionsRecord>, Error> {
            self.calls.lock().unwrap().push(batch.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(Error::External("no canned response".into())))
        }
    }

    /// Counts writes so tests can assert the store was left untouched.
    struct CountingCache {
        inner: EmissionsStore,
        writes: Mutex<Vec<(String, bool)>>,
    }

    impl CountingCache {
        fn new() -> Arc<Self> {
            Arc::new(Self { inner: EmissionsStore::new(TTL), writes: Mutex::new(Vec::new()) })
        }

        fn writes(&self) -> Vec<(String, bool)> {
            self.writes.lock().unwrap().clone()
        }
    }

    impl EmissionsCache for CountingCache {
        fn get(&self, key: &str) -> Option<EmissionsRecord> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, record: EmissionsRecord, priority: bool) {
            self.writes.lock().unwrap().push((key.to_string(), priority));
            self.inner.set(key, record, priority);
        }
    }

    fn row(country: &str, channel: &str, impressions: i64, inventory_id: &str, is_priority: bool) -> RequestRow {
        RequestRow {
            country: country.into(),
            channel: channel.into(),
            impressions,
            inventory_id: inventory_id.into(),
            utc_datetime: "2025-01-01T12:00:00Z".into(),
            is_priority,
        }
    }

    fn record(property_id: i64, total: f64) -> EmissionsRecord {
        EmissionsRecord {
            property_id,
            property_name: format!("Property {property_id}"),
            total_emissions: total,
            inventory_coverage: None,
        }
    }

    fn missing_record() -> EmissionsRecord {
        EmissionsRecord {
            property_id: 0,
            property_name: String::new(),
            total_emissions: 0.0,
            inventory_coverage: Some(COVERAGE_MISSING.into()),
        }
    }

    fn assert_total_matches_rows(resp: &BatchResponse) {
        let sum: f64 = resp.rows.iter().map(|r| r.total_emissions).sum();
        assert_eq!(resp.total_emissions, sum);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_cached_row() {
        let store = Arc::new(EmissionsStore::new(TTL));
        store.set("US-online-1000-inv-001", record(1, 60.0), false);
        let resolver = FakeResolver::returning(vec![]);
        let service = MeasureService::new(store, resolver.clone());

        let resp = service
            .process(&[row("US", "online", 1000, "inv-001", false)])
            .await
            .unwrap();

        assert_eq!(resp.rows.len(), 1);
        assert!(resp.rows[0].cached);
        assert_eq!(resp.total_emissions, 60.0);
        assert!(!resp.request_id.is_empty());
        assert!(resolver.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_cached_never_calls_resolver() {
        let store = Arc::new(EmissionsStore::new(TTL));
        store.set("US-online-1000-inv-001", record(1, 60.0), false);
        store.set("UK-tv-500-inv-002", record(2, 40.0), true);
        let resolver = FakeResolver::returning(vec![]);
        let service = MeasureService::new(store, resolver.clone());

        let resp = service
            .process(&[row("US", "online", 1000, "inv-001", false), row("UK", "tv", 500, "inv-002", true)])
            .await
            .unwrap();

        assert_eq!(resp.rows.len(), 2);
        assert!(resp.rows.iter().all(|r| r.cached));
        assert_eq!(resp.total_emissions, 100.0);
        assert!(resolver.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_cache_writes_permanent_entry() {
        let store = Arc::new(EmissionsStore::new(TTL));
        store.set("US-online-1000-inv-001", record(1, 60.0), false);
        let resolver = FakeResolver::returning(vec![record(2, 40.0)]);
        let service = MeasureService::new(store.clone(), resolver.clone());

        let resp = service
            .process(&[row("US", "online", 1000, "inv-001", false), row("UK", "tv", 500, "inv-002", true)])
            .await
            .unwrap();

        assert_eq!(resp.rows.len(), 2);
        assert_eq!(resp.total_emissions, 100.0);
        assert!(resp.rows[0].cached);
        assert!(!resp.rows[1].cached);
        assert_eq!(resp.rows[1].property_id, Some(2));
        assert_eq!(resp.rows[1].property_name.as_deref(), Some("Property 2"));

        let calls = resolver.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        assert_eq!(calls[0][0].inventory_id, "inv-002");

        let entry = store.lookup("UK-tv-500-inv-002").unwrap();
        assert_eq!(entry.expiry, Expiry::Permanent);
        assert_eq!(entry.record, record(2, 40.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_misses_single_ordered_call() {
        let store = Arc::new(EmissionsStore::new(TTL));
        let rows: Vec<RequestRow> = (1..=5)
            .map(|i| row("US", "online", i * 100, &format!("inv-{i:03}"), false))
            .collect();
        let records: Vec<EmissionsRecord> = (1..=5).map(|i| record(i, i as f64)).collect();
        let resolver = FakeResolver::returning(records);
        let service = MeasureService::new(store, resolver.clone());

        let resp = service.process(&rows).await.unwrap();

        let calls = resolver.calls();
        assert_eq!(calls.len(), 1);
        let sent: Vec<&str> = calls[0].iter().map(|r| r.inventory_id.as_str()).collect();
        assert_eq!(sent, ["inv-001", "inv-002", "inv-003", "inv-004", "inv-005"]);

        assert!(resp.rows.iter().all(|r| !r.cached));
        let ids: Vec<Option<i64>> = resp.rows.iter().map(|r| r.property_id).collect();
        assert_eq!(ids, [Some(1), Some(2), Some(3), Some(4), Some(5)]);
        assert_eq!(resp.total_emissions, 15.0);
        assert_total_matches_rows(&resp);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hits_precede_resolved_rows() {
        let store = Arc::new(EmissionsStore::new(TTL));
        store.set("UK-tv-500-inv-002", record(2, 40.0), false);
        let resolver = FakeResolver::returning(vec![record(1, 60.0), record(3, 5.0)]);
        let service = MeasureService::new(store, resolver);

        let resp = service
            .process(&[
                row("US", "online", 1000, "inv-001", false),
                row("UK", "tv", 500, "inv-002", false),
                row("FR", "radio", 10, "inv-003", false),
            ])
            .await
            .unwrap();

        let order: Vec<(Option<i64>, bool)> = resp.rows.iter().map(|r| (r.property_id, r.cached)).collect();
        assert_eq!(order, [(Some(2), true), (Some(1), false), (Some(3), false)]);
        assert_total_matches_rows(&resp);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_coverage_is_cached_raw() {
        let store = Arc::new(EmissionsStore::new(TTL));
        store.set("US-online-1000-inv-001", record(1, 60.0), false);
        let resolver = FakeResolver::returning(vec![missing_record()]);
        let service = MeasureService::new(store.clone(), resolver);

        let resp = service
            .process(&[row("US", "online", 1000, "inv-001", false), row("DE", "ctv", 20, "inv-404", false)])
            .await
            .unwrap();

        let missing = &resp.rows[1];
        assert!(!missing.cached);
        assert_eq!(missing.property_id, None);
        assert_eq!(missing.property_name, None);
        assert_eq!(missing.inventory_coverage.as_deref(), Some(COVERAGE_MISSING));
        assert_eq!(resp.total_emissions, 60.0);

        assert_eq!(store.get("DE-ctv-20-inv-404"), Some(missing_record()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_missing_coverage_stays_hidden() {
        let store = Arc::new(EmissionsStore::new(TTL));
        store.set("DE-ctv-20-inv-404", missing_record(), false);
        let service = MeasureService::new(store, FakeResolver::returning(vec![]));

        let resp = service.process(&[row("DE", "ctv", 20, "inv-404", false)]).await.unwrap();

        assert!(resp.rows[0].cached);
        assert_eq!(resp.rows[0].property_id, None);
        assert_eq!(resp.rows[0].inventory_coverage.as_deref(), Some(COVERAGE_MISSING));
        assert_eq!(resp.total_emissions, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_batch_rejected() {
        let cache = CountingCache::new();
        let resolver = FakeResolver::returning(vec![]);
        let service = MeasureService::new(cache.clone(), resolver.clone());

        let err = service.process(&[]).await.unwrap_err();

        assert!(matches!(err, Error::Validation { row: None, .. }));
        assert!(resolver.calls().is_empty());
        assert!(cache.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_row_aborts_whole_batch() {
        let cache = CountingCache::new();
        let resolver = FakeResolver::returning(vec![record(1, 1.0)]);
        let service = MeasureService::new(cache.clone(), resolver.clone());

        let err = service
            .process(&[row("US", "online", 1000, "inv-001", false), row("UK", "tv", 0, "inv-002", false)])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation { row: Some(1), .. }));
        assert!(resolver.calls().is_empty());
        assert!(cache.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolver_failure_is_external_and_writes_nothing() {
        let cache = CountingCache::new();
        let resolver = FakeResolver::failing(Error::External("HTTP 503".into()));
        let service = MeasureService::new(cache.clone(), resolver.clone());

        let err = service
            .process(&[row("US", "online", 1000, "inv-001", false)])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::External(_)));
        assert!(err.is_retryable());
        assert_eq!(resolver.calls().len(), 1);
        assert!(cache.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_external_resolver_error_reclassified() {
        let service = MeasureService::new(
            CountingCache::new(),
            FakeResolver::failing(Error::Internal("unexpected payload".into())),
        );

        let err = service
            .process(&[row("US", "online", 1000, "inv-001", false)])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::External(msg) if msg.contains("unexpected payload")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_resolver_answer_is_internal_error() {
        let cache = CountingCache::new();
        let resolver = FakeResolver::returning(vec![record(1, 1.0)]);
        let service = MeasureService::new(cache.clone(), resolver);

        let err = service
            .process(&[row("US", "online", 1000, "inv-001", false), row("UK", "tv", 500, "inv-002", false)])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Internal(_)));
        assert!(cache.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_colliding_rows_priority_wins() {
        let cache = CountingCache::new();
        let resolver = FakeResolver::returning(vec![record(1, 10.0), record(1, 10.0)]);
        let service = MeasureService::new(cache.clone(), resolver.clone());

        let resp = service
            .process(&[row("US", "online", 1000, "inv-001", true), row("US", "online", 1000, "inv-001", false)])
            .await
            .unwrap();

        assert_eq!(resolver.calls()[0].len(), 2);
        assert_eq!(resp.rows.len(), 2);
        assert_eq!(resp.total_emissions, 20.0);
        assert!(cache.writes().iter().all(|(key, priority)| key == "US-online-1000-inv-001" && *priority));
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_entry_outlives_ttl() {
        let store = Arc::new(EmissionsStore::new(TTL));
        let resolver = FakeResolver::returning(vec![record(1, 60.0), record(2, 40.0)]);
        let service = MeasureService::new(store.clone(), resolver);

        service
            .process(&[row("US", "online", 1000, "inv-001", false), row("UK", "tv", 500, "inv-002", true)])
            .await
            .unwrap();

        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        assert!(store.get("US-online-1000-inv-001").is_none());
        assert!(store.get("UK-tv-500-inv-002").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_served_from_cache() {
        let store = Arc::new(EmissionsStore::new(TTL));
        let resolver = FakeResolver::returning(vec![record(1, 60.0)]);
        let service = MeasureService::new(store, resolver.clone());
        let rows = [row("US", "online", 1000, "inv-001", false)];

        let first = service.process(&rows).await.unwrap();
        let second = service.process(&rows).await.unwrap();

        assert!(!first.rows[0].cached);
        assert!(second.rows[0].cached);
        assert_ne!(first.request_id, second.request_id);
        assert_eq!(resolver.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_request() {
        let store = Arc::new(EmissionsStore::new(TTL));
        let rows: Vec<RequestRow> = (1..=100)
            .map(|i| row("US", "online", i, &format!("inv-{i}"), i % 3 == 0))
            .collect();
        let records: Vec<EmissionsRecord> = (1..=100).map(|i| record(i, 1.0)).collect();
        let service = MeasureService::new(store.clone(), FakeResolver::returning(records));

        let resp = service.process(&rows).await.unwrap();

        assert_eq!(resp.rows.len(), 100);
        assert_eq!(resp.total_emissions, 100.0);
        assert_eq!(store.len(), 100);
    }
}
