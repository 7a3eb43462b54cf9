//! Catalog service
//!
//! Fronts the scan → fetch → synchronize → re-fetch → combine → transform
//! pipeline with a TTL cache. Refreshes are serialized through a gate; a
//! caller that waited on the gate while someone else refreshed takes that
//! result instead of starting another cycle.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::cache::TtlCache;
use crate::config::Config;
use crate::database::DocumentStore;
use crate::diagnostics::{CatalogEvent, Diagnostics};
use crate::error::{CatalogResult, StoreResult};
use crate::local::{FsLibraryScanner, LocalTreeProvider};
use crate::models::{ConversionCandidate, ConversionResult, SeriesMap};
use crate::store::{DocumentSeriesRepository, RemoteTreeRepository};
use crate::sync::SynchronizationManager;
use crate::transcode::{PlaceholderTranscoder, Transcoder};
use crate::transform::{to_client_series, ClientSeries};

pub type CatalogSnapshot = Arc<Vec<ClientSeries>>;

pub struct CatalogService {
    local: Arc<dyn LocalTreeProvider>,
    remote: Arc<dyn RemoteTreeRepository>,
    sync: SynchronizationManager,
    transcoder: Arc<dyn Transcoder>,
    diagnostics: Diagnostics,
    cache: RwLock<TtlCache<CatalogSnapshot>>,
    refresh_gate: Mutex<()>,
    scanned_candidates: Mutex<Vec<ConversionCandidate>>,
    candidates: Mutex<Vec<ConversionCandidate>>,
}

impl CatalogService {
    pub fn new(
        local: Arc<dyn LocalTreeProvider>,
        remote: Arc<dyn RemoteTreeRepository>,
        ttl: Duration,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            local,
            sync: SynchronizationManager::new(remote.clone(), diagnostics.clone()),
            remote,
            transcoder: Arc::new(PlaceholderTranscoder),
            diagnostics,
            cache: RwLock::new(TtlCache::new(ttl)),
            refresh_gate: Mutex::new(()),
            scanned_candidates: Mutex::new(Vec::new()),
            candidates: Mutex::new(Vec::new()),
        }
    }

    /// Wire the filesystem scanner and the SQLite document store from config
    pub fn from_config(config: &Config, diagnostics: Diagnostics) -> StoreResult<Self> {
        let store = Arc::new(DocumentStore::open(&config.database.path)?);
        let remote = Arc::new(DocumentSeriesRepository::new(store, diagnostics.clone()));
        let local = Arc::new(FsLibraryScanner::new(&config.library, diagnostics.clone()));
        Ok(Self::new(local, remote, config.cache.ttl(), diagnostics))
    }

    pub fn with_transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.transcoder = transcoder;
        self
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// All series, from cache when fresh
    ///
    /// On refresh failure the last good value is returned if there is one.
    pub async fn get_series(&self, force_refresh: bool) -> CatalogResult<CatalogSnapshot> {
        if !force_refresh {
            if let Some(cached) = self.cache.read().await.get() {
                debug!("Returning cached series data");
                return Ok(cached);
            }
        }

        let requested_at = Instant::now();
        let _gate = self.refresh_gate.lock().await;

        {
            let cache = self.cache.read().await;
            if let (Some(stored_at), Some(value)) = (cache.stored_at(), cache.stale()) {
                if stored_at >= requested_at {
                    debug!("Adopting series data refreshed by a concurrent request");
                    self.diagnostics.emit(CatalogEvent::RefreshCoalesced);
                    return Ok(value);
                }
            }
        }

        match self.fetch_and_sync_series().await {
            Ok(series) => {
                let snapshot = Arc::new(series);
                self.cache.write().await.set(snapshot.clone());
                Ok(snapshot)
            }
            Err(e) => {
                error!("Error fetching series data: {}", e);
                self.diagnostics.emit(CatalogEvent::RefreshFailed {
                    error: e.to_string(),
                });

                let cache = self.cache.read().await;
                match cache.stale() {
                    Some(stale) => {
                        warn!("Falling back to cached data due to error");
                        self.diagnostics.emit(CatalogEvent::ServedStale {
                            age_seconds: cache.age().map(|a| a.as_secs()).unwrap_or_default(),
                        });
                        Ok(stale)
                    }
                    None => Err(e),
                }
            }
        }
    }

    /// Look up a series by its remote identifier
    pub async fn get_series_by_id(
        &self,
        series_id: &str,
        force_refresh: bool,
    ) -> CatalogResult<Option<ClientSeries>> {
        let is_empty = self.cache.read().await.is_empty();
        if force_refresh || is_empty {
            self.get_series(force_refresh).await?;
        }

        let cache = self.cache.read().await;
        Ok(cache.stale().and_then(|all| {
            all.iter()
                .find(|s| s.id.as_deref() == Some(series_id))
                .cloned()
        }))
    }

    /// Files that are not yet in the target container format
    ///
    /// The list is computed once and reused until it is invalidated; an empty
    /// list triggers a forced refresh so the library is re-scanned.
    pub async fn get_conversion_candidates(&self) -> CatalogResult<Vec<ConversionCandidate>> {
        {
            let adopted = self.candidates.lock().await;
            if !adopted.is_empty() {
                return Ok(adopted.clone());
            }
        }

        self.get_series(true).await?;

        let scanned = self.scanned_candidates.lock().await.clone();
        let mut adopted = self.candidates.lock().await;
        *adopted = scanned;
        Ok(adopted.clone())
    }

    /// Convert all candidates, or only those whose path is listed
    pub async fn convert_episode(
        &self,
        file_paths: Option<&[String]>,
    ) -> CatalogResult<ConversionResult> {
        let mut result = ConversionResult::default();
        let candidates = self.get_conversion_candidates().await?;

        let to_convert: Vec<ConversionCandidate> = match file_paths {
            Some(paths) => candidates
                .into_iter()
                .filter(|c| paths.contains(&c.file_path))
                .collect(),
            None => candidates,
        };

        if to_convert.is_empty() {
            result.success = true;
            result.messages.push("No files to convert.".to_string());
            return Ok(result);
        }

        for candidate in &to_convert {
            match self.transcoder.transcode(candidate).await {
                Ok(()) => result.converted += 1,
                Err(e) => {
                    warn!("Failed to convert {}: {}", candidate.file_path, e);
                    result.failed += 1;
                    result
                        .messages
                        .push(format!("Failed to convert {}: {}", candidate.file_path, e));
                }
            }
        }

        result.success = result.failed == 0;
        result
            .messages
            .push(format!("Converted {} files.", result.converted));
        info!(
            "Conversion finished: {} converted, {} failed",
            result.converted, result.failed
        );
        Ok(result)
    }

    /// Drop the cached catalog and the adopted candidate list
    pub async fn invalidate(&self) {
        self.cache.write().await.invalidate();
        self.candidates.lock().await.clear();
    }

    pub async fn cache_age(&self) -> Option<Duration> {
        self.cache.read().await.age()
    }

    async fn fetch_and_sync_series(&self) -> CatalogResult<Vec<ClientSeries>> {
        let scan = self.local.scan().await?;
        *self.scanned_candidates.lock().await = scan.candidates;

        let remote = self.remote.fetch_all().await?;

        let primary = match self.sync_and_refetch(&scan.tree, &remote).await {
            Ok(updated) => updated,
            Err(e) => {
                error!("Error synchronizing with the document store: {}", e);
                self.diagnostics.emit(CatalogEvent::SyncFailed {
                    error: e.to_string(),
                });
                remote
            }
        };

        Ok(combine(primary, scan.tree)
            .values()
            .map(to_client_series)
            .collect())
    }

    async fn sync_and_refetch(&self, local: &SeriesMap, remote: &SeriesMap) -> StoreResult<SeriesMap> {
        self.sync.synchronize(local, remote).await?;
        self.remote.fetch_all().await
    }
}

/// Every series of `primary`, plus those only `secondary` knows about
pub fn combine(primary: SeriesMap, secondary: SeriesMap) -> SeriesMap {
    let mut combined = primary;
    for (name, series) in secondary {
        combined.entry(name).or_insert(series);
    }
    combined
}
