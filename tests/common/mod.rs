#![allow(dead_code)]

use async_trait::async_trait;
use reelsync::config::LibraryConfig;
use reelsync::database::DocumentStore;
use reelsync::diagnostics::Diagnostics;
use reelsync::error::{CatalogError, CatalogResult, StoreError, StoreResult};
use reelsync::local::{FsLibraryScanner, LocalScan, LocalTreeProvider};
use reelsync::models::{ConversionCandidate, EpisodeHandle, SeasonHandle, SeriesHandle, SeriesMap};
use reelsync::store::{DocumentSeriesRepository, RemoteTreeRepository};
use reelsync::transcode::Transcoder;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Create an empty file, including its parent directories
pub fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"").unwrap();
}

pub fn library_config(root: &Path) -> LibraryConfig {
    LibraryConfig {
        series_dir: root.to_path_buf(),
        ..Default::default()
    }
}

/// Filesystem scanner that counts its passes and can be slowed down
pub struct CountingScanner {
    inner: FsLibraryScanner,
    pub scans: AtomicUsize,
    delay: Duration,
}

impl CountingScanner {
    pub fn new(root: &Path, diagnostics: Diagnostics) -> Self {
        Self {
            inner: FsLibraryScanner::new(&library_config(root), diagnostics),
            scans: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalTreeProvider for CountingScanner {
    async fn scan(&self) -> CatalogResult<LocalScan> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.scan().await
    }
}

/// Document repository whose reads and writes can be switched off
pub struct FlakyRepository {
    inner: DocumentSeriesRepository,
    pub fail_fetch: AtomicBool,
    pub fail_create: AtomicBool,
    pub fetches: AtomicUsize,
}

impl FlakyRepository {
    pub fn new(diagnostics: Diagnostics) -> Self {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        Self {
            inner: DocumentSeriesRepository::new(store, diagnostics),
            fail_fetch: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        self.inner.store()
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    fn check_create(&self) -> StoreResult<()> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteTreeRepository for FlakyRepository {
    async fn fetch_all(&self) -> StoreResult<SeriesMap> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store offline".to_string()));
        }
        self.inner.fetch_all().await
    }

    async fn create_series(&self, name: &str) -> StoreResult<SeriesHandle> {
        self.check_create()?;
        self.inner.create_series(name).await
    }

    async fn create_season(
        &self,
        parent: &SeriesHandle,
        number: u32,
        name: &str,
    ) -> StoreResult<SeasonHandle> {
        self.check_create()?;
        self.inner.create_season(parent, number, name).await
    }

    async fn create_episode(
        &self,
        parent: &SeasonHandle,
        number: u32,
        name: &str,
    ) -> StoreResult<EpisodeHandle> {
        self.check_create()?;
        self.inner.create_episode(parent, number, name).await
    }
}

/// Transcoder that fails for any path containing `marker`
pub struct FailingTranscoder {
    pub marker: String,
    pub calls: AtomicUsize,
}

impl FailingTranscoder {
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Transcoder for FailingTranscoder {
    async fn transcode(&self, candidate: &ConversionCandidate) -> CatalogResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if candidate.file_path.contains(&self.marker) {
            return Err(CatalogError::Transcode {
                path: candidate.file_path.clone(),
                reason: "unsupported codec".to_string(),
            });
        }
        Ok(())
    }
}
