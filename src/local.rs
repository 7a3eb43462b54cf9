//! Local library scanner
//!
//! Builds a Series → Season → Episode tree from a directory layout like
//!
//! ```text
//! <series_dir>/<Series Name>/<Season 1>/<Series Name S01E01.mkv>
//! ```
//!
//! and collects every video whose container is not the target format as a
//! conversion candidate. Unreadable directories degrade to empty results.

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::LibraryConfig;
use crate::diagnostics::{CatalogEvent, Diagnostics, TreeSource};
use crate::error::{CatalogError, CatalogResult};
use crate::models::{position, ConversionCandidate, Episode, Series, SeriesMap};

/// Result of one pass over the local library
#[derive(Debug, Clone, Default)]
pub struct LocalScan {
    pub tree: SeriesMap,
    pub candidates: Vec<ConversionCandidate>,
}

/// Source of the locally observed catalog
#[async_trait]
pub trait LocalTreeProvider: Send + Sync {
    async fn scan(&self) -> CatalogResult<LocalScan>;
}

fn season_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[Ss](?:eason)?\s*(\d+)|(\d+)\s*$").expect("valid season regex"))
}

fn episode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[Ee](\d+)").expect("valid episode regex"))
}

/// Season number from a folder name such as `Season 2`, `S02` or `Dark 2`
pub fn parse_season_number(folder: &str) -> Option<u32> {
    let caps = season_regex().captures(folder)?;
    let digits = caps.get(1).or_else(|| caps.get(2))?;
    position(digits.as_str().parse::<i64>().ok())
}

/// Episode number from a file name such as `Dark S01E05.mkv`
pub fn parse_episode_number(file_name: &str) -> Option<u32> {
    let caps = episode_regex().captures(file_name)?;
    position(caps.get(1)?.as_str().parse::<i64>().ok())
}

/// Lowercase extension with its leading dot, e.g. `.mkv`
fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
}

/// Scans a series library on disk
#[derive(Debug, Clone)]
pub struct FsLibraryScanner {
    root: PathBuf,
    video_extensions: Vec<String>,
    target_format: String,
    diagnostics: Diagnostics,
}

impl FsLibraryScanner {
    pub fn new(config: &LibraryConfig, diagnostics: Diagnostics) -> Self {
        Self {
            root: config.series_dir.clone(),
            video_extensions: config
                .video_extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            target_format: config.target_format.to_lowercase(),
            diagnostics,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Blocking scan of the whole library
    pub fn scan_blocking(&self) -> LocalScan {
        let mut scan = LocalScan::default();

        for series_name in self.subdirectories(&self.root) {
            let series_path = self.root.join(&series_name);
            let mut series = Series::new(series_name);
            self.populate_seasons(&mut series, &series_path, &mut scan.candidates);
            scan.tree.insert(series.name.clone(), series);
        }

        info!(
            "Scanned {} series ({} conversion candidates) under {}",
            scan.tree.len(),
            scan.candidates.len(),
            self.root.display()
        );
        scan
    }

    fn populate_seasons(
        &self,
        series: &mut Series,
        series_path: &Path,
        candidates: &mut Vec<ConversionCandidate>,
    ) {
        for folder in self.subdirectories(series_path) {
            let Some(season_number) = parse_season_number(&folder) else {
                warn!("Skipping folder '{}' in series '{}': no valid season number", folder, series.name);
                self.diagnostics.emit(CatalogEvent::SkippedSeason {
                    source: TreeSource::Local,
                    series: series.name.clone(),
                    raw: folder,
                });
                continue;
            };

            let season_path = series_path.join(&folder);
            let series_name = series.name.clone();
            let season = series.insert_season(season_number);
            season.local_path = Some(season_path.clone());

            for file in self.media_files(&season_path) {
                let file_name = file
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();

                let Some(episode_number) = parse_episode_number(&file_name) else {
                    warn!(
                        "Skipping file '{}' in season {} of '{}': no valid episode number",
                        file_name, season_number, series_name
                    );
                    self.diagnostics.emit(CatalogEvent::SkippedEpisode {
                        source: TreeSource::Local,
                        series: series_name.clone(),
                        season: season_number,
                        raw: file_name,
                    });
                    continue;
                };

                season.episodes.insert(
                    episode_number,
                    Episode::new(&series_name, season_number, episode_number),
                );

                let extension = dotted_extension(&file).unwrap_or_default();
                if extension != self.target_format {
                    debug!("Conversion candidate: {}", file.display());
                    candidates.push(ConversionCandidate {
                        series_name: series_name.clone(),
                        season_number,
                        episode_number,
                        file_path: file.to_string_lossy().into_owned(),
                        original_format: extension,
                        target_format: self.target_format.clone(),
                    });
                }
            }
        }
    }

    /// Names of the immediate subdirectories of `path`, sorted
    fn subdirectories(&self, path: &Path) -> Vec<String> {
        self.entries(path)
            .into_iter()
            .filter(|e| e.file_type().is_dir())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect()
    }

    /// Video files directly inside `path`, sorted
    fn media_files(&self, path: &Path) -> Vec<PathBuf> {
        self.entries(path)
            .into_iter()
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                dotted_extension(e.path())
                    .map(|ext| self.video_extensions.contains(&ext))
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    fn entries(&self, path: &Path) -> Vec<walkdir::DirEntry> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!("Error reading directory {}: {}", path.display(), e);
                    self.diagnostics.emit(CatalogEvent::DirectoryUnreadable {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }
        entries
    }
}

#[async_trait]
impl LocalTreeProvider for FsLibraryScanner {
    async fn scan(&self) -> CatalogResult<LocalScan> {
        let scanner = self.clone();
        tokio::task::spawn_blocking(move || scanner.scan_blocking())
            .await
            .map_err(|e| CatalogError::Scan(e.to_string()))
    }
}
