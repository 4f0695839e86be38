// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// When set, API requests must present this key (header or bearer).
    pub api_key: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7979,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub max_concurrent_jobs: usize,
    pub queue_refresh_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 8,
            queue_refresh_interval_secs: 60,
        }
    }
}

/// Limits consulted by the config-driven release specifications. Passed to
/// the decision engine as a read-only snapshot; a zero means unlimited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    pub retention_days: u32,
    pub maximum_size_mb: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            retention_days: 0,
            maximum_size_mb: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NzbgetConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QbittorrentConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadClientsConfig {
    pub history_limit: usize,
    pub nzbget: Option<NzbgetConfig>,
    pub qbittorrent: Option<QbittorrentConfig>,
}

impl Default for DownloadClientsConfig {
    fn default() -> Self {
        Self {
            history_limit: 60,
            nzbget: None,
            qbittorrent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub telemetry: TelemetryConfig,
    pub scheduler: SchedulerConfig,
    pub decision: DecisionConfig,
    pub download_clients: DownloadClientsConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: FETCHARR_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("FETCHARR_").split("__"));

    let config: AppConfig = figment.extract()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}
