//! Client-safe views of the catalog tree
//!
//! Client shapes mirror the internal ones minus the storage handles.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Episode, Season, Series};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEpisode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSeason {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<String>,
    pub episodes: BTreeMap<u32, ClientEpisode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSeries {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub seasons: BTreeMap<u32, ClientSeason>,
}

pub fn to_client_series(series: &Series) -> ClientSeries {
    ClientSeries {
        id: series.id.clone(),
        name: series.name.clone(),
        seasons: to_client_seasons(&series.seasons),
    }
}

pub fn to_client_seasons(seasons: &BTreeMap<u32, Season>) -> BTreeMap<u32, ClientSeason> {
    seasons
        .iter()
        .map(|(number, season)| {
            let client = ClientSeason {
                id: season.id.clone(),
                name: season.name.clone(),
                local_path: season
                    .local_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
                episodes: to_client_episodes(&season.episodes),
            };
            (*number, client)
        })
        .collect()
}

pub fn to_client_episodes(episodes: &BTreeMap<u32, Episode>) -> BTreeMap<u32, ClientEpisode> {
    episodes
        .iter()
        .map(|(number, episode)| {
            let client = ClientEpisode {
                id: episode.id.clone(),
                name: episode.name.clone(),
            };
            (*number, client)
        })
        .collect()
}
