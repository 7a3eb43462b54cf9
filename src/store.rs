//! Remote series repository
//!
//! The remote tree lives in the document store as three nested collections:
//! `series`, `series/<id>/seasons` and `series/<id>/seasons/<id>/episodes`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::database::{Document, DocumentStore};
use crate::diagnostics::{CatalogEvent, Diagnostics, TreeSource};
use crate::error::StoreResult;
use crate::models::{
    position, Episode, EpisodeHandle, Season, SeasonHandle, Series, SeriesHandle, SeriesMap,
};

pub const SERIES_COLLECTION: &str = "series";

/// The persisted side of the catalog
///
/// Creation calls return the handle of the new node, which is also the
/// handle used to address its child collection.
#[async_trait]
pub trait RemoteTreeRepository: Send + Sync {
    /// Read the whole remote tree
    async fn fetch_all(&self) -> StoreResult<SeriesMap>;

    async fn create_series(&self, name: &str) -> StoreResult<SeriesHandle>;

    async fn create_season(
        &self,
        parent: &SeriesHandle,
        number: u32,
        name: &str,
    ) -> StoreResult<SeasonHandle>;

    async fn create_episode(
        &self,
        parent: &SeasonHandle,
        number: u32,
        name: &str,
    ) -> StoreResult<EpisodeHandle>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDocument {
    pub name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonDocument {
    pub season: Option<i64>,
    pub name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeDocument {
    pub episode: Option<i64>,
    pub name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// [`RemoteTreeRepository`] over a [`DocumentStore`]
pub struct DocumentSeriesRepository {
    store: Arc<DocumentStore>,
    diagnostics: Diagnostics,
}

impl DocumentSeriesRepository {
    pub fn new(store: Arc<DocumentStore>, diagnostics: Diagnostics) -> Self {
        Self { store, diagnostics }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    fn populate_seasons(&self, series: &mut Series, handle: &SeriesHandle) -> StoreResult<()> {
        for doc in self.store.get_collection(&handle.seasons_collection())? {
            let number = decode::<SeasonDocument>(&doc).and_then(|d| position(d.season));

            let Some(number) = number else {
                warn!(
                    "Skipping season with invalid season number in series \"{}\"",
                    series.name
                );
                self.diagnostics.emit(CatalogEvent::SkippedSeason {
                    source: TreeSource::Remote,
                    series: series.name.clone(),
                    raw: doc.data.get("season").map(|v| v.to_string()).unwrap_or_default(),
                });
                continue;
            };

            let season_handle = handle.season(doc.id);
            let mut season = Season::new(&series.name, number).with_handle(season_handle.clone());
            self.populate_episodes(&series.name, number, &mut season, &season_handle)?;
            series.seasons.insert(number, season);
        }
        Ok(())
    }

    fn populate_episodes(
        &self,
        series_name: &str,
        season_number: u32,
        season: &mut Season,
        handle: &SeasonHandle,
    ) -> StoreResult<()> {
        for doc in self.store.get_collection(&handle.episodes_collection())? {
            let number = decode::<EpisodeDocument>(&doc).and_then(|d| position(d.episode));

            let Some(number) = number else {
                warn!(
                    "Skipping episode with invalid episode number in season {} of series \"{}\"",
                    season_number, series_name
                );
                self.diagnostics.emit(CatalogEvent::SkippedEpisode {
                    source: TreeSource::Remote,
                    series: series_name.to_string(),
                    season: season_number,
                    raw: doc.data.get("episode").map(|v| v.to_string()).unwrap_or_default(),
                });
                continue;
            };

            season.episodes.insert(
                number,
                Episode::new(series_name, season_number, number).with_handle(handle.episode(doc.id)),
            );
        }
        Ok(())
    }
}

/// Decode a document body, treating malformed bodies as absent fields
fn decode<T: for<'de> Deserialize<'de>>(doc: &Document) -> Option<T> {
    match serde_json::from_value(doc.data.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Malformed document {}/{}: {}", doc.collection, doc.id, e);
            None
        }
    }
}

#[async_trait]
impl RemoteTreeRepository for DocumentSeriesRepository {
    async fn fetch_all(&self) -> StoreResult<SeriesMap> {
        let mut tree = SeriesMap::new();

        for doc in self.store.get_collection(SERIES_COLLECTION)? {
            let name = decode::<SeriesDocument>(&doc)
                .and_then(|d| d.name)
                .filter(|n| !n.is_empty());

            let Some(name) = name else {
                warn!("Series document {} has no name. Skipping...", doc.id);
                self.diagnostics.emit(CatalogEvent::SkippedSeries {
                    source: TreeSource::Remote,
                    document_id: doc.id,
                });
                continue;
            };

            let handle = SeriesHandle::new(doc.id);
            let mut series = Series::stored(name, handle.clone());
            self.populate_seasons(&mut series, &handle)?;
            tree.insert(series.name.clone(), series);
        }

        debug!("Fetched {} series from the document store", tree.len());
        Ok(tree)
    }

    async fn create_series(&self, name: &str) -> StoreResult<SeriesHandle> {
        let doc = SeriesDocument {
            name: Some(name.to_string()),
            created_at: Some(Utc::now()),
        };
        let id = self
            .store
            .add_document(SERIES_COLLECTION, &serde_json::to_value(doc)?)?;
        Ok(SeriesHandle::new(id))
    }

    async fn create_season(
        &self,
        parent: &SeriesHandle,
        number: u32,
        name: &str,
    ) -> StoreResult<SeasonHandle> {
        let doc = SeasonDocument {
            season: Some(i64::from(number)),
            name: Some(name.to_string()),
            created_at: Some(Utc::now()),
        };
        let id = self
            .store
            .add_document(&parent.seasons_collection(), &serde_json::to_value(doc)?)?;
        Ok(parent.season(id))
    }

    async fn create_episode(
        &self,
        parent: &SeasonHandle,
        number: u32,
        name: &str,
    ) -> StoreResult<EpisodeHandle> {
        let doc = EpisodeDocument {
            episode: Some(i64::from(number)),
            name: Some(name.to_string()),
            created_at: Some(Utc::now()),
        };
        let id = self
            .store
            .add_document(&parent.episodes_collection(), &serde_json::to_value(doc)?)?;
        Ok(parent.episode(id))
    }
}
