// SPDX-License-Identifier: GPL-3.0-or-later

//! Grab/import history seam.
//!
//! Persistence lives outside this core; the trait is the boundary the
//! storage layer implements. The in-memory store backs tests and fresh
//! installs.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use fetcharr_domain::MovieId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryEventType {
    Grabbed,
    DownloadFailed,
    DownloadImported,
    DownloadIgnored,
    ImportFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub download_id: String,
    pub event_type: HistoryEventType,
    pub source_title: String,
    pub indexer: Option<String>,
    pub size_bytes: Option<u64>,
    pub movie_ids: Vec<MovieId>,
    pub date: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn grabbed(
        download_id: impl Into<String>,
        source_title: impl Into<String>,
        indexer: impl Into<String>,
        movie_ids: Vec<MovieId>,
    ) -> Self {
        Self {
            download_id: download_id.into(),
            event_type: HistoryEventType::Grabbed,
            source_title: source_title.into(),
            indexer: Some(indexer.into()),
            size_bytes: None,
            movie_ids,
            date: Utc::now(),
        }
    }
}

pub trait HistoryStore: Send + Sync {
    /// All entries for a download id, newest first.
    fn find_by_download_id(&self, download_id: &str) -> Vec<HistoryEntry>;

    fn record(&self, entry: HistoryEntry);

    /// True while the newest entry is still a grab: the download has not yet
    /// been imported, failed, or ignored, so its tracked record must survive
    /// the client forgetting about it.
    fn has_unresolved(&self, download_id: &str) -> bool {
        self.find_by_download_id(download_id)
            .first()
            .map(|entry| entry.event_type == HistoryEventType::Grabbed)
            .unwrap_or(false)
    }
}

#[derive(Default)]
pub struct InMemoryHistoryStore {
    entries: RwLock<HashMap<String, Vec<HistoryEntry>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn find_by_download_id(&self, download_id: &str) -> Vec<HistoryEntry> {
        let mut entries = self
            .entries
            .read()
            .expect("history lock poisoned")
            .get(download_id)
            .cloned()
            .unwrap_or_default();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries
    }

    fn record(&self, entry: HistoryEntry) {
        self.entries
            .write()
            .expect("history lock poisoned")
            .entry(entry.download_id.clone())
            .or_default()
            .push(entry);
    }
}
