use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Which side of the reconciliation produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeSource {
    Local,
    Remote,
}

/// Structured events about data that was skipped or degraded
///
/// These never change control flow. They exist so that skipped nodes and
/// swallowed errors can be observed by subscribers (and tests) instead of
/// only ending up in the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CatalogEvent {
    SkippedSeries {
        source: TreeSource,
        document_id: String,
    },
    SkippedSeason {
        source: TreeSource,
        series: String,
        raw: String,
    },
    SkippedEpisode {
        source: TreeSource,
        series: String,
        season: u32,
        raw: String,
    },
    DirectoryUnreadable {
        path: String,
        error: String,
    },
    NodeCreated {
        key: String,
        id: String,
    },
    SyncFailed {
        error: String,
    },
    RefreshFailed {
        error: String,
    },
    ServedStale {
        age_seconds: u64,
    },
    RefreshCoalesced,
}

/// Broadcast channel for [`CatalogEvent`]s
#[derive(Debug, Clone)]
pub struct Diagnostics {
    tx: broadcast::Sender<CatalogEvent>,
}

impl Diagnostics {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: CatalogEvent) {
        debug!("diagnostic: {:?}", event);
        // No subscribers is fine
        let _ = self.tx.send(event);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Drain every event currently buffered in a receiver
pub fn drain(rx: &mut broadcast::Receiver<CatalogEvent>) -> Vec<CatalogEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}
