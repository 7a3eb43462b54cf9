//! Catalog data model
//!
//! The internal tree carries storage handles for nodes that exist in the
//! document store. Handles never leave the server; see `transform` for the
//! client-facing shapes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::naming::{episode_name, season_name};

/// Series keyed by name
pub type SeriesMap = BTreeMap<String, Series>;

/// Handle to a series document; owns the `seasons` sub-collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesHandle {
    id: String,
}

impl SeriesHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> String {
        format!("series/{}", self.id)
    }

    /// Collection holding this series' season documents
    pub fn seasons_collection(&self) -> String {
        format!("{}/seasons", self.path())
    }

    /// Handle to a season document inside this series
    pub fn season(&self, id: impl Into<String>) -> SeasonHandle {
        SeasonHandle {
            series_id: self.id.clone(),
            id: id.into(),
        }
    }
}

/// Handle to a season document; owns the `episodes` sub-collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeasonHandle {
    series_id: String,
    id: String,
}

impl SeasonHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn series_id(&self) -> &str {
        &self.series_id
    }

    pub fn path(&self) -> String {
        format!("series/{}/seasons/{}", self.series_id, self.id)
    }

    /// Collection holding this season's episode documents
    pub fn episodes_collection(&self) -> String {
        format!("{}/episodes", self.path())
    }

    pub fn episode(&self, id: impl Into<String>) -> EpisodeHandle {
        EpisodeHandle {
            season: self.clone(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EpisodeHandle {
    season: SeasonHandle,
    id: String,
}

impl EpisodeHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn season(&self) -> &SeasonHandle {
        &self.season
    }

    pub fn path(&self) -> String {
        format!("{}/{}", self.season.episodes_collection(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub id: Option<String>,
    pub handle: Option<SeriesHandle>,
    pub name: String,
    pub seasons: BTreeMap<u32, Season>,
}

impl Series {
    /// A series seen locally, not yet known to the store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            handle: None,
            name: name.into(),
            seasons: BTreeMap::new(),
        }
    }

    /// A series read back from the store
    pub fn stored(name: impl Into<String>, handle: SeriesHandle) -> Self {
        Self {
            id: Some(handle.id().to_string()),
            handle: Some(handle),
            ..Self::new(name)
        }
    }

    /// Insert a season with its derived name, returning a mutable reference to it
    pub fn insert_season(&mut self, number: u32) -> &mut Season {
        let name = season_name(&self.name, number);
        self.seasons.entry(number).or_insert_with(|| Season::named(name))
    }

    pub fn episode_count(&self) -> usize {
        self.seasons.values().map(|s| s.episodes.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Season {
    pub id: Option<String>,
    pub handle: Option<SeasonHandle>,
    pub name: String,
    pub local_path: Option<PathBuf>,
    pub episodes: BTreeMap<u32, Episode>,
}

impl Season {
    fn named(name: String) -> Self {
        Self {
            id: None,
            handle: None,
            name,
            local_path: None,
            episodes: BTreeMap::new(),
        }
    }

    pub fn new(series_name: &str, number: u32) -> Self {
        Self::named(season_name(series_name, number))
    }

    pub fn with_handle(mut self, handle: SeasonHandle) -> Self {
        self.id = Some(handle.id().to_string());
        self.handle = Some(handle);
        self
    }

    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    pub id: Option<String>,
    pub handle: Option<EpisodeHandle>,
    pub name: String,
}

impl Episode {
    pub fn new(series_name: &str, season_number: u32, episode_number: u32) -> Self {
        Self {
            id: None,
            handle: None,
            name: episode_name(series_name, season_number, episode_number),
        }
    }

    pub fn with_handle(mut self, handle: EpisodeHandle) -> Self {
        self.id = Some(handle.id().to_string());
        self.handle = Some(handle);
        self
    }
}

/// Position of a node in the catalog, independent of any storage handle
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKey {
    Series(String),
    Season(String, u32),
    Episode(String, u32, u32),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Series(name) => write!(f, "{}", name),
            NodeKey::Season(name, season) => write!(f, "{}/{}", name, season),
            NodeKey::Episode(name, season, episode) => {
                write!(f, "{}/{}/{}", name, season, episode)
            }
        }
    }
}

/// A local video file whose container is not the canonical target format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionCandidate {
    pub series_name: String,
    pub season_number: u32,
    pub episode_number: u32,
    pub file_path: String,
    pub original_format: String,
    pub target_format: String,
}

/// Outcome of a conversion request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    pub converted: usize,
    pub failed: usize,
    pub messages: Vec<String>,
}

/// Validate a raw season/episode number; positions start at 1
pub fn position(raw: Option<i64>) -> Option<u32> {
    match raw {
        Some(n) if n >= 1 => u32::try_from(n).ok(),
        _ => None,
    }
}
