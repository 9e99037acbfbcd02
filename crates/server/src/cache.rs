//! Time-bounded cache of listing sets, one snapshot per catalog key.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use ala_core::{ContentType, Listing};
use ala_origin::{ListingRequest, ListingSource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Time source for TTL checks and fetch timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn utc_now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    start: Instant,
    start_utc: DateTime<Utc>,
    offset_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            start_utc: Utc::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }

    fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.offset()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        let offset = chrono::Duration::from_std(self.offset()).unwrap_or(chrono::TimeDelta::MAX);
        self.start_utc + offset
    }
}

/// One fetched listing set.
#[derive(Debug)]
pub struct Snapshot {
    pub listings: Vec<Listing>,
    pub fetched_at: Instant,
    pub fetched_at_utc: DateTime<Utc>,
}

/// Cache state of one catalog key, as reported by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatus {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    pub listings: usize,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
}

pub struct ListingCache {
    source: Arc<dyn ListingSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    snapshots: RwLock<HashMap<ListingRequest, Arc<Snapshot>>>,
    refresh_gates: Mutex<HashMap<ListingRequest, Arc<Mutex<()>>>>,
}

impl ListingCache {
    pub fn new(source: Arc<dyn ListingSource>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            source,
            clock,
            ttl,
            snapshots: RwLock::new(HashMap::new()),
            refresh_gates: Mutex::new(HashMap::new()),
        }
    }

    /// Current snapshot for `request`, refreshing it first when missing or
    /// older than the TTL.
    ///
    /// A snapshot is only replaced by a successful, non-empty fetch. When the
    /// refresh fails or comes back empty the previous snapshot (if any) is
    /// returned as is. Concurrent misses on one key share a single fetch.
    pub async fn get(&self, request: &ListingRequest) -> Option<Arc<Snapshot>> {
        if let Some(snapshot) = self.fresh(request).await {
            debug!(content_type = %request.content_type, genre = ?request.genre, "listing cache hit");
            return Some(snapshot);
        }

        let gate = self.gate(request).await;
        let snapshot = {
            let _guard = gate.lock().await;
            self.refresh(request).await
        };
        self.release_gate(request, gate).await;
        snapshot
    }

    async fn refresh(&self, request: &ListingRequest) -> Option<Arc<Snapshot>> {
        // Another request may have refreshed while we waited.
        if let Some(snapshot) = self.fresh(request).await {
            return Some(snapshot);
        }

        debug!(content_type = %request.content_type, genre = ?request.genre, "listing cache miss");
        match self.source.fetch_listings(request).await {
            Ok(listings) if !listings.is_empty() => {
                let snapshot = Arc::new(Snapshot {
                    listings,
                    fetched_at: self.clock.now(),
                    fetched_at_utc: self.clock.utc_now(),
                });
                info!(
                    content_type = %request.content_type,
                    genre = ?request.genre,
                    count = snapshot.listings.len(),
                    "listing cache refreshed"
                );
                self.snapshots
                    .write()
                    .await
                    .insert(request.clone(), snapshot.clone());
                Some(snapshot)
            }
            Ok(_) => {
                warn!(content_type = %request.content_type, genre = ?request.genre, "origin returned no listings, keeping previous snapshot");
                self.stored(request).await
            }
            Err(e) => {
                warn!(content_type = %request.content_type, genre = ?request.genre, error = %e, "listing refresh failed, keeping previous snapshot");
                self.stored(request).await
            }
        }
    }

    /// Every populated key, ordered by type then genre.
    pub async fn status(&self) -> Vec<CatalogStatus> {
        let snapshots = self.snapshots.read().await;
        let mut out: Vec<CatalogStatus> = snapshots
            .iter()
            .map(|(key, snap)| CatalogStatus {
                content_type: key.content_type,
                genre: key.genre.clone(),
                listings: snap.listings.len(),
                fetched_at: snap.fetched_at_utc,
            })
            .collect();
        out.sort_by(|a, b| {
            (a.content_type, &a.genre).cmp(&(b.content_type, &b.genre))
        });
        out
    }

    async fn stored(&self, request: &ListingRequest) -> Option<Arc<Snapshot>> {
        self.snapshots.read().await.get(request).cloned()
    }

    async fn fresh(&self, request: &ListingRequest) -> Option<Arc<Snapshot>> {
        let now = self.clock.now();
        self.stored(request)
            .await
            .filter(|s| now.saturating_duration_since(s.fetched_at) < self.ttl)
    }

    async fn gate(&self, request: &ListingRequest) -> Arc<Mutex<()>> {
        self.refresh_gates
            .lock()
            .await
            .entry(request.clone())
            .or_default()
            .clone()
    }

    /// Drops the key's gate once no other caller holds it. Every clone is
    /// released under the map lock, so the last holder sees a count of 2.
    async fn release_gate(&self, request: &ListingRequest, gate: Arc<Mutex<()>>) {
        let mut gates = self.refresh_gates.lock().await;
        if Arc::strong_count(&gate) == 2 {
            gates.remove(request);
        }
        drop(gate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ala_origin::OriginError;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    const TTL: Duration = Duration::from_secs(30 * 60);

    #[derive(Default)]
    struct Scripted {
        names: StdMutex<Vec<&'static str>>,
        fail: AtomicBool,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl Scripted {
        fn serving(names: &[&'static str]) -> Self {
            Self {
                names: StdMutex::new(names.to_vec()),
                ..Default::default()
            }
        }

        fn set(&self, names: &[&'static str]) {
            *self.names.lock().unwrap() = names.to_vec();
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ListingSource for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn fetch_listings(&self, request: &ListingRequest) -> Result<Vec<Listing>, OriginError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(OriginError::Fetch("connection refused".into()));
            }
            let names = self.names.lock().unwrap().clone();
            Ok(names
                .into_iter()
                .map(|n| {
                    let url = format!("https://asialiveaction.com/series/{n}/");
                    Listing::new(request.content_type, n, url, None)
                })
                .collect())
        }
    }

    fn cache(source: Arc<Scripted>, clock: Arc<ManualClock>) -> ListingCache {
        ListingCache::new(source, clock, TTL)
    }

    fn names(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.listings.iter().map(|l| l.display_name.as_str()).collect()
    }

    fn series() -> ListingRequest {
        ListingRequest::new(ContentType::Series, None)
    }

    #[tokio::test]
    async fn serves_from_cache_within_ttl() {
        let source = Arc::new(Scripted::serving(&["a", "b"]));
        let clock = Arc::new(ManualClock::new());
        let cache = cache(source.clone(), clock.clone());

        let first = cache.get(&series()).await.unwrap();
        clock.advance(Duration::from_secs(29 * 60));
        let second = cache.get(&series()).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn refetches_after_expiry() {
        let source = Arc::new(Scripted::serving(&["a"]));
        let clock = Arc::new(ManualClock::new());
        let cache = cache(source.clone(), clock.clone());

        cache.get(&series()).await.unwrap();
        source.set(&["a", "b"]);
        clock.advance(TTL);

        let snapshot = cache.get(&series()).await.unwrap();
        assert_eq!(source.calls(), 2);
        assert_eq!(names(&snapshot), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn keeps_stale_snapshot_on_failure_and_on_empty() {
        let source = Arc::new(Scripted::serving(&["a"]));
        let clock = Arc::new(ManualClock::new());
        let cache = cache(source.clone(), clock.clone());
        cache.get(&series()).await.unwrap();

        clock.advance(TTL * 2);
        source.fail.store(true, Ordering::SeqCst);
        assert_eq!(names(&cache.get(&series()).await.unwrap()), vec!["a"]);

        source.fail.store(false, Ordering::SeqCst);
        source.set(&[]);
        assert_eq!(names(&cache.get(&series()).await.unwrap()), vec!["a"]);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn nothing_cached_and_origin_down() {
        let source = Arc::new(Scripted::serving(&["a"]));
        source.fail.store(true, Ordering::SeqCst);
        let cache = cache(source, Arc::new(ManualClock::new()));
        assert!(cache.get(&series()).await.is_none());
        assert!(cache.status().await.is_empty());
    }

    #[tokio::test]
    async fn keys_include_type_and_genre() {
        let source = Arc::new(Scripted::serving(&["a"]));
        let cache = cache(source.clone(), Arc::new(ManualClock::new()));

        cache.get(&series()).await;
        cache.get(&ListingRequest::new(ContentType::Series, Some("Romance"))).await;
        cache.get(&ListingRequest::new(ContentType::Series, Some("romance"))).await;
        cache.get(&ListingRequest::new(ContentType::Movie, None)).await;

        assert_eq!(source.calls(), 3);
        let status = cache.status().await;
        assert_eq!(status.len(), 3);
        assert_eq!(status[0].content_type, ContentType::Series);
        assert_eq!(status[0].genre, None);
        assert_eq!(status[1].genre.as_deref(), Some("romance"));
        assert_eq!(status[2].content_type, ContentType::Movie);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let source = Arc::new(Scripted {
            names: StdMutex::new(vec!["a"]),
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        });
        let cache = cache(source.clone(), Arc::new(ManualClock::new()));

        let request = series();
        let (a, b, c) = tokio::join!(cache.get(&request), cache.get(&request), cache.get(&request));

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert!(c.is_some());
    }

    #[tokio::test]
    async fn refresh_gates_do_not_outlive_their_fetch() {
        let source = Arc::new(Scripted::serving(&[]));
        let cache = cache(source.clone(), Arc::new(ManualClock::new()));

        for i in 0..1000 {
            let genre = format!("genre-{i}");
            assert!(cache.get(&ListingRequest::new(ContentType::Series, Some(&genre))).await.is_none());
        }
        assert_eq!(source.calls(), 1000);
        assert!(cache.refresh_gates.lock().await.is_empty());
        assert!(cache.status().await.is_empty());
    }

    #[tokio::test]
    async fn shared_gate_is_dropped_by_the_last_waiter() {
        let source = Arc::new(Scripted {
            names: StdMutex::new(vec!["a"]),
            delay: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let cache = cache(source.clone(), Arc::new(ManualClock::new()));

        let request = series();
        tokio::join!(cache.get(&request), cache.get(&request), cache.get(&request));

        assert_eq!(source.calls(), 1);
        assert!(cache.refresh_gates.lock().await.is_empty());
    }

    #[test]
    fn manual_clock_moves_both_readings() {
        let clock = ManualClock::new();
        let (t0, u0) = (clock.now(), clock.utc_now());
        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now() - t0, Duration::from_secs(90));
        assert_eq!((clock.utc_now() - u0).num_seconds(), 90);
    }
}
