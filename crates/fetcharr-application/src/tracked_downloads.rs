// SPDX-License-Identifier: GPL-3.0-or-later

//! Correlation of live download-client items with the grabs that caused
//! them.
//!
//! A tracked download is rebuilt from history on every reconciliation cycle,
//! so statuses derived from live client state (including `Warning`) are
//! re-evaluated each poll rather than sticking. The whole set for one client
//! is replaced atomically per cycle; entries the client no longer reports
//! are pruned only once their history is resolved.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use fetcharr_domain::{
    DomainEvent, DownloadProtocol, MovieId, TrackedDownloadsRemoved, TrackedDownloadsRemovedPayload,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::download_clients::{DownloadClientItem, DownloadItemStatus};
use crate::events::{EventPublisher, InMemoryEventBus};
use crate::history::{HistoryEventType, HistoryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedDownloadStatus {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackedDownloadState {
    Downloading,
    Imported,
    ImportFailed,
    Failed,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub title: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedDownload {
    pub download_id: String,
    pub client_name: String,
    pub protocol: DownloadProtocol,
    pub movie_ids: Vec<MovieId>,
    pub source_title: String,
    pub indexer: Option<String>,
    pub size_bytes: Option<u64>,
    pub state: TrackedDownloadState,
    pub status: TrackedDownloadStatus,
    pub status_messages: Vec<StatusMessage>,
    pub item: DownloadClientItem,
}

impl TrackedDownload {
    /// Degrade to warning without masking an existing error.
    pub fn warn(&mut self, title: impl Into<String>, messages: Vec<String>) {
        if self.status != TrackedDownloadStatus::Error {
            self.status = TrackedDownloadStatus::Warning;
        }
        self.status_messages.push(StatusMessage {
            title: title.into(),
            messages,
        });
    }

    pub fn error(&mut self, title: impl Into<String>, messages: Vec<String>) {
        self.status = TrackedDownloadStatus::Error;
        self.status_messages.push(StatusMessage {
            title: title.into(),
            messages,
        });
    }
}

pub struct TrackedDownloadService {
    cache: RwLock<HashMap<String, TrackedDownload>>,
    events: Arc<InMemoryEventBus>,
}

impl TrackedDownloadService {
    pub fn new(events: Arc<InMemoryEventBus>) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Build the tracked record for one live client item, seeding catalog
    /// context from the newest grab in history.
    pub fn track(
        &self,
        client_name: &str,
        protocol: DownloadProtocol,
        item: DownloadClientItem,
        history: &dyn HistoryStore,
    ) -> TrackedDownload {
        let entries = history.find_by_download_id(&item.download_id);

        let mut tracked = TrackedDownload {
            download_id: item.download_id.clone(),
            client_name: client_name.to_string(),
            protocol,
            movie_ids: Vec::new(),
            source_title: item.title.clone(),
            indexer: None,
            size_bytes: None,
            state: TrackedDownloadState::Downloading,
            status: TrackedDownloadStatus::Ok,
            status_messages: Vec::new(),
            item,
        };

        if let Some(newest) = entries.first() {
            tracked.state = state_from_history(newest.event_type);
        }

        if let Some(grab) = entries
            .iter()
            .find(|entry| entry.event_type == HistoryEventType::Grabbed)
        {
            tracked.movie_ids = grab.movie_ids.clone();
            tracked.source_title = grab.source_title.clone();
            tracked.indexer = grab.indexer.clone();
            tracked.size_bytes = grab.size_bytes;
        }

        if tracked.movie_ids.is_empty() {
            // Still shown in the queue, just without catalog context.
            trace!(
                target: "tracked_downloads",
                download_id = %tracked.download_id,
                title = %tracked.item.title,
                "no movie mapping found for download"
            );
            tracked.warn(
                format!("No movie found for download '{}'", tracked.item.title),
                Vec::new(),
            );
        }

        match tracked.item.status {
            DownloadItemStatus::Failed => {
                let messages = tracked.item.status_messages.clone();
                tracked.error("Download failed", messages);
            }
            DownloadItemStatus::Warning => {
                let messages = tracked.item.status_messages.clone();
                tracked.warn("Download client reported a problem", messages);
            }
            _ => {}
        }

        tracked
    }

    pub fn find(&self, download_id: &str) -> Option<TrackedDownload> {
        self.cache
            .read()
            .expect("tracked download cache poisoned")
            .get(download_id)
            .cloned()
    }

    pub fn get_tracked(&self) -> Vec<TrackedDownload> {
        self.cache
            .read()
            .expect("tracked download cache poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Replace one client's whole tracked set atomically. Entries the client
    /// stopped reporting are kept while their history is unresolved (the
    /// import may still be in flight) and pruned otherwise.
    pub fn replace_client_set(
        &self,
        client_name: &str,
        downloads: Vec<TrackedDownload>,
        history: &dyn HistoryStore,
    ) {
        let new_ids: HashSet<String> = downloads
            .iter()
            .map(|download| download.download_id.clone())
            .collect();

        let mut removed = Vec::new();
        {
            let mut cache = self.cache.write().expect("tracked download cache poisoned");

            cache.retain(|download_id, tracked| {
                if tracked.client_name != client_name || new_ids.contains(download_id) {
                    return true;
                }
                if history.has_unresolved(download_id) {
                    debug!(
                        target: "tracked_downloads",
                        %download_id,
                        "download disappeared from client but history is unresolved, keeping"
                    );
                    return true;
                }
                removed.push(download_id.clone());
                false
            });

            for download in downloads {
                cache.insert(download.download_id.clone(), download);
            }
        }

        if !removed.is_empty() {
            debug!(
                target: "tracked_downloads",
                count = removed.len(),
                client = client_name,
                "pruned tracked downloads"
            );
            let event: TrackedDownloadsRemoved = DomainEvent::new(
                "tracked_downloads.removed",
                TrackedDownloadsRemovedPayload {
                    download_ids: removed,
                },
            );
            self.events.publish(&event);
        }
    }

    pub fn stop_tracking(&self, download_ids: &[String]) {
        let mut removed = Vec::new();
        {
            let mut cache = self.cache.write().expect("tracked download cache poisoned");
            for download_id in download_ids {
                if cache.remove(download_id).is_some() {
                    removed.push(download_id.clone());
                }
            }
        }

        if !removed.is_empty() {
            let event: TrackedDownloadsRemoved = DomainEvent::new(
                "tracked_downloads.removed",
                TrackedDownloadsRemovedPayload {
                    download_ids: removed,
                },
            );
            self.events.publish(&event);
        }
    }
}

fn state_from_history(event_type: HistoryEventType) -> TrackedDownloadState {
    match event_type {
        HistoryEventType::Grabbed => TrackedDownloadState::Downloading,
        HistoryEventType::DownloadImported => TrackedDownloadState::Imported,
        HistoryEventType::DownloadFailed => TrackedDownloadState::Failed,
        HistoryEventType::DownloadIgnored => TrackedDownloadState::Ignored,
        HistoryEventType::ImportFailed => TrackedDownloadState::ImportFailed,
    }
}
