//! Additive synchronization of the local tree into the remote tree
//!
//! Only presence is compared: a node missing remotely is created, a node
//! present remotely is left exactly as it is, whatever its stored values.
//! Nothing is ever updated or deleted, so re-running after a partial failure
//! only creates what is still missing.

use std::sync::Arc;
use tracing::{debug, info};

use crate::diagnostics::{CatalogEvent, Diagnostics};
use crate::error::{StoreError, StoreResult};
use crate::models::{NodeKey, Season, Series, SeriesHandle, SeriesMap};
use crate::store::RemoteTreeRepository;

/// Identifiers assigned to the nodes created during one synchronization pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    created: Vec<(NodeKey, String)>,
}

impl SyncReport {
    fn record(&mut self, diagnostics: &Diagnostics, key: NodeKey, id: &str) {
        diagnostics.emit(CatalogEvent::NodeCreated {
            key: key.to_string(),
            id: id.to_string(),
        });
        self.created.push((key, id.to_string()));
    }

    /// True when the pass performed no writes
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }

    pub fn len(&self) -> usize {
        self.created.len()
    }

    /// Created nodes in creation order
    pub fn created(&self) -> &[(NodeKey, String)] {
        &self.created
    }

    /// Remote identifier assigned to the local node at `key`, if it was created
    pub fn id_for(&self, key: &NodeKey) -> Option<&str> {
        self.created
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, id)| id.as_str())
    }

    pub fn series_created(&self) -> usize {
        self.count(|k| matches!(k, NodeKey::Series(_)))
    }

    pub fn seasons_created(&self) -> usize {
        self.count(|k| matches!(k, NodeKey::Season(..)))
    }

    pub fn episodes_created(&self) -> usize {
        self.count(|k| matches!(k, NodeKey::Episode(..)))
    }

    fn count(&self, pred: impl Fn(&NodeKey) -> bool) -> usize {
        self.created.iter().filter(|(k, _)| pred(k)).count()
    }
}

pub struct SynchronizationManager {
    remote: Arc<dyn RemoteTreeRepository>,
    diagnostics: Diagnostics,
}

impl SynchronizationManager {
    pub fn new(remote: Arc<dyn RemoteTreeRepository>, diagnostics: Diagnostics) -> Self {
        Self {
            remote,
            diagnostics,
        }
    }

    /// Create every node of `local` that is missing from `remote`
    ///
    /// Writes are issued one at a time, parents before children, in the
    /// enumeration order of `local`. The first failing write aborts the pass;
    /// nodes created before it stay in the store.
    pub async fn synchronize(&self, local: &SeriesMap, remote: &SeriesMap) -> StoreResult<SyncReport> {
        let mut report = SyncReport::default();

        for (name, local_series) in local {
            match remote.get(name) {
                None => {
                    info!("Creating new series in store: {}", name);
                    let handle = self.remote.create_series(name).await?;
                    report.record(&self.diagnostics, NodeKey::Series(name.clone()), handle.id());

                    for (number, local_season) in &local_series.seasons {
                        self.create_season(local_series, *number, local_season, &handle, &mut report)
                            .await?;
                    }
                }
                Some(remote_series) => {
                    self.update_existing_series(local_series, remote_series, &mut report)
                        .await?;
                }
            }
        }

        if report.is_empty() {
            debug!("Remote tree already contains every local node");
        } else {
            info!(
                "Synchronization created {} series, {} seasons, {} episodes",
                report.series_created(),
                report.seasons_created(),
                report.episodes_created()
            );
        }
        Ok(report)
    }

    async fn update_existing_series(
        &self,
        local_series: &Series,
        remote_series: &Series,
        report: &mut SyncReport,
    ) -> StoreResult<()> {
        let handle = remote_series
            .handle
            .as_ref()
            .ok_or_else(|| StoreError::MissingHandle {
                kind: "series",
                key: remote_series.name.clone(),
            })?;

        for (number, local_season) in &local_series.seasons {
            let Some(remote_season) = remote_series.seasons.get(number) else {
                info!("Creating new season {} for series {}", number, remote_series.name);
                self.create_season(local_series, *number, local_season, handle, report)
                    .await?;
                continue;
            };

            let season_handle =
                remote_season
                    .handle
                    .as_ref()
                    .ok_or_else(|| StoreError::MissingHandle {
                        kind: "season",
                        key: NodeKey::Season(remote_series.name.clone(), *number).to_string(),
                    })?;

            for (episode_number, local_episode) in &local_season.episodes {
                if remote_season.episodes.contains_key(episode_number) {
                    continue;
                }

                info!(
                    "Creating new episode {} for {} in series {}",
                    episode_number, local_season.name, remote_series.name
                );
                let created = self
                    .remote
                    .create_episode(season_handle, *episode_number, &local_episode.name)
                    .await?;
                report.record(
                    &self.diagnostics,
                    NodeKey::Episode(local_series.name.clone(), *number, *episode_number),
                    created.id(),
                );
            }
        }
        Ok(())
    }

    /// Create a season and all of its episodes under `parent`
    async fn create_season(
        &self,
        local_series: &Series,
        number: u32,
        local_season: &Season,
        parent: &SeriesHandle,
        report: &mut SyncReport,
    ) -> StoreResult<()> {
        let season_handle = self
            .remote
            .create_season(parent, number, &local_season.name)
            .await?;
        report.record(
            &self.diagnostics,
            NodeKey::Season(local_series.name.clone(), number),
            season_handle.id(),
        );

        for (episode_number, local_episode) in &local_season.episodes {
            let created = self
                .remote
                .create_episode(&season_handle, *episode_number, &local_episode.name)
                .await?;
            report.record(
                &self.diagnostics,
                NodeKey::Episode(local_series.name.clone(), number, *episode_number),
                created.id(),
            );
        }
        Ok(())
    }
}
