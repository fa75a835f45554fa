//! Single-slot time-boxed snapshot cache and the source seam used by the
//! HTTP routes.

use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::sheet::{self, OfferSnapshot, SheetConfig, SheetError};

pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

pub fn cache_ttl_from_env() -> Duration {
    let secs = std::env::var("YIELDBOARD_CACHE_TTL_SECS")
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_CACHE_TTL_SECS);
    Duration::from_secs(secs)
}

/// Where the routes get their offers. Implemented by the live cached sheet
/// reader and by an in-memory source for tests and demo mode.
pub trait OfferSource: Send + Sync + 'static {
    fn snapshot(&self) -> Result<OfferSnapshot, SheetError>;
}

struct CacheSlot {
    snapshot: OfferSnapshot,
    fetched_at: Instant,
}

/// One shared slot with a fixed time-to-live. The slot lock is held across a
/// refresh, so at most one fetch runs per expiry window; concurrent readers
/// of a fresh slot only clone the snapshot.
pub struct SnapshotCache {
    slot: Mutex<Option<CacheSlot>>,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            ttl,
        }
    }

    pub fn get_or_refresh(
        &self,
        refresh: impl FnOnce() -> Result<OfferSnapshot, SheetError>,
    ) -> Result<OfferSnapshot, SheetError> {
        let mut guard = self
            .slot
            .lock()
            .expect("snapshot cache lock should not be poisoned");

        if let Some(slot) = guard.as_ref() {
            if slot.fetched_at.elapsed() < self.ttl {
                debug!(
                    component = "cache",
                    event = "cache.hit",
                    age_ms = slot.fetched_at.elapsed().as_millis() as u64
                );
                return Ok(slot.snapshot.clone());
            }
        }

        match refresh() {
            Ok(snapshot) => {
                info!(
                    component = "cache",
                    event = "cache.refresh",
                    rows = snapshot.offers.len()
                );
                *guard = Some(CacheSlot {
                    snapshot: snapshot.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(snapshot)
            }
            Err(err) => {
                // An expired slot with a failed re-fetch surfaces the error;
                // the page-level notice blocks the table until the next
                // successful refresh.
                warn!(
                    component = "cache",
                    event = "cache.refresh_failed",
                    error = %err
                );
                Err(err)
            }
        }
    }
}

/// Live source: read-through cache in front of the sheet CSV export.
pub struct CachedSheetSource {
    config: SheetConfig,
    cache: SnapshotCache,
}

impl CachedSheetSource {
    pub fn new(config: SheetConfig, ttl: Duration) -> Self {
        Self {
            config,
            cache: SnapshotCache::new(ttl),
        }
    }
}

impl OfferSource for CachedSheetSource {
    fn snapshot(&self) -> Result<OfferSnapshot, SheetError> {
        self.cache
            .get_or_refresh(|| sheet::fetch_snapshot(&self.config))
    }
}

/// Fixed snapshot source for tests and demo mode.
#[derive(Clone)]
pub struct InMemorySnapshotSource {
    inner: Arc<RwLock<OfferSnapshot>>,
}

impl InMemorySnapshotSource {
    pub fn new(snapshot: OfferSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    pub fn replace_snapshot(&self, snapshot: OfferSnapshot) {
        let mut guard = self
            .inner
            .write()
            .expect("in-memory snapshot lock should not be poisoned");
        *guard = snapshot;
    }
}

impl OfferSource for InMemorySnapshotSource {
    fn snapshot(&self) -> Result<OfferSnapshot, SheetError> {
        Ok(self
            .inner
            .read()
            .expect("in-memory snapshot lock should not be poisoned")
            .clone())
    }
}
