// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::Arc;

use fetcharr_config::AppConfig;

pub mod decision_engine;
pub mod download_clients;
pub mod events;
pub mod history;
pub mod language_aggregation;
pub mod quality_aggregation;
pub mod queue;
pub mod queue_ordering;
pub mod release;
pub mod release_parsing;
pub mod specifications;
pub mod tracked_downloads;

pub use decision_engine::{DecisionEngine, EvaluatedRelease};
pub use download_clients::{
    DownloadClient, DownloadClientError, DownloadClientItem, DownloadItemStatus, NzbgetClient,
    QbittorrentClient,
};
pub use events::{EventPublisher, InMemoryEventBus};
pub use history::{HistoryEntry, HistoryEventType, HistoryStore, InMemoryHistoryStore};
pub use language_aggregation::aggregate_languages;
pub use quality_aggregation::{
    aggregate_quality, default_augmenters, LocalDownload, MediaStreamInfo, QualityAugmenter,
    QualityEvidence,
};
pub use queue::{QueueEntry, QueuePage, QueueQuery, QueueService};
pub use queue_ordering::{SortDirection, SortKey};
pub use release::{ReleaseCandidate, ReleaseInfo, SearchCriteria};
pub use release_parsing::{clean_title, parse_release_title, ParsedReleaseInfo};
pub use specifications::{Decision, Rejection, RejectionKind};
pub use tracked_downloads::{
    StatusMessage, TrackedDownload, TrackedDownloadService, TrackedDownloadState,
    TrackedDownloadStatus,
};

use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub events: Arc<InMemoryEventBus>,
    pub history: Arc<dyn HistoryStore>,
    pub tracked: Arc<TrackedDownloadService>,
    pub queue: Arc<QueueService>,
    pub engine: Arc<DecisionEngine>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self::with_clients(config, Vec::new())
    }

    pub fn with_clients(config: AppConfig, clients: Vec<Arc<dyn DownloadClient>>) -> Self {
        let events = Arc::new(InMemoryEventBus::new());
        let history: Arc<dyn HistoryStore> = Arc::new(InMemoryHistoryStore::new());
        let tracked = Arc::new(TrackedDownloadService::new(events.clone()));
        let queue = Arc::new(QueueService::new(
            clients,
            tracked.clone(),
            history.clone(),
            events.clone(),
        ));
        let engine = Arc::new(DecisionEngine::with_default_specifications(&config.decision));

        Self {
            config,
            events,
            history,
            tracked,
            queue,
            engine,
        }
    }

    pub fn on_start(&self) {
        info!(target: "application", "application state initialized");
    }
}
