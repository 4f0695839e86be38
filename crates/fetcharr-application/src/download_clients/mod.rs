// SPDX-License-Identifier: GPL-3.0-or-later

//! Download client adapters.
//!
//! Each adapter normalizes its client's queue/history into the common
//! [`DownloadClientItem`] shape the reconciliation core operates on. The
//! protocol wrappers themselves stay thin: state resolution happens here,
//! from raw client fields, so the rest of the pipeline never sees
//! client-specific status strings.

pub mod nzbget;
pub mod qbittorrent;

pub use nzbget::NzbgetClient;
pub use qbittorrent::QbittorrentClient;

use std::time::Duration;

use async_trait::async_trait;
use fetcharr_domain::DownloadProtocol;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadItemStatus {
    Queued,
    Paused,
    Downloading,
    Completed,
    Failed,
    Warning,
}

impl DownloadItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for DownloadItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Queued => "queued",
            Self::Paused => "paused",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Warning => "warning",
        };
        write!(f, "{}", name)
    }
}

/// A queue or history entry normalized across clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadClientItem {
    pub download_id: String,
    pub title: String,
    pub category: Option<String>,
    pub total_size: i64,
    pub remaining_size: i64,
    pub remaining_time: Option<Duration>,
    pub output_path: Option<String>,
    pub status: DownloadItemStatus,
    pub status_messages: Vec<String>,
    pub client_name: String,
    pub can_be_removed: bool,
}

#[derive(Debug, Error)]
pub enum DownloadClientError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("authentication failed")]
    Authentication,
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    #[error("download client responded with status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

#[async_trait]
pub trait DownloadClient: Send + Sync {
    fn name(&self) -> &str;

    fn protocol(&self) -> DownloadProtocol;

    async fn get_items(&self) -> Result<Vec<DownloadClientItem>, DownloadClientError>;

    async fn remove_item(&self, download_id: &str) -> Result<(), DownloadClientError>;

    async fn test_connection(&self) -> Result<(), DownloadClientError>;
}
