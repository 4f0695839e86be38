// SPDX-License-Identifier: GPL-3.0-or-later

//! qBittorrent adapter (Web API v2).

use std::collections::HashMap;
use std::time::Duration;

use fetcharr_domain::DownloadProtocol;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{DownloadClient, DownloadClientError, DownloadClientItem, DownloadItemStatus};

/// qBittorrent reports this ETA when it has no estimate.
const ETA_UNKNOWN: i64 = 8_640_000;

pub struct QbittorrentClient {
    client: Client,
    name: String,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    category: Option<String>,
}

impl QbittorrentClient {
    pub fn new(
        name: impl Into<String>,
        base_url: String,
        username: Option<String>,
        password: Option<String>,
        category: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
            category,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, DownloadClientError> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|err| DownloadClientError::InvalidBaseUrl(err.to_string()))
    }

    async fn authenticate_if_configured(&self) -> Result<(), DownloadClientError> {
        let Some(username) = self.username.as_deref() else {
            return Ok(());
        };
        let Some(password) = self.password.as_deref() else {
            return Ok(());
        };

        let url = self.endpoint("/api/v2/auth/login")?;
        let response = self
            .client
            .post(url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| DownloadClientError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DownloadClientError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(DownloadClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim() != "Ok." {
            return Err(DownloadClientError::Authentication);
        }

        Ok(())
    }

    async fn post_form(
        &self,
        path: &str,
        form: &HashMap<&str, String>,
    ) -> Result<(), DownloadClientError> {
        self.authenticate_if_configured().await?;
        let url = self.endpoint(path)?;

        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| DownloadClientError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DownloadClientError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(DownloadClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl DownloadClient for QbittorrentClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> DownloadProtocol {
        DownloadProtocol::Torrent
    }

    async fn get_items(&self) -> Result<Vec<DownloadClientItem>, DownloadClientError> {
        self.authenticate_if_configured().await?;

        let mut url = self.endpoint("/api/v2/torrents/info")?;
        if let Some(category) = &self.category {
            url.query_pairs_mut().append_pair("category", category);
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadClientError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DownloadClientError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(DownloadClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let torrents: Vec<QbittorrentTorrent> = serde_json::from_str(&body)
            .map_err(|e| DownloadClientError::Deserialization(e.to_string()))?;

        Ok(torrents
            .into_iter()
            .map(|torrent| {
                let status = map_torrent_state(&torrent.state);
                DownloadClientItem {
                    download_id: torrent.hash.to_uppercase(),
                    title: torrent.name,
                    category: torrent
                        .category
                        .and_then(|v| (!v.trim().is_empty()).then_some(v)),
                    total_size: torrent.size,
                    remaining_size: torrent.amount_left,
                    remaining_time: match torrent.eta {
                        eta if eta <= 0 || eta >= ETA_UNKNOWN => None,
                        eta => Some(Duration::from_secs(eta as u64)),
                    },
                    output_path: torrent
                        .save_path
                        .and_then(|v| (!v.trim().is_empty()).then_some(v)),
                    status,
                    status_messages: match status {
                        DownloadItemStatus::Failed => {
                            vec![format!("qBittorrent reported state '{}'", torrent.state)]
                        }
                        _ => Vec::new(),
                    },
                    client_name: self.name.clone(),
                    can_be_removed: status.is_terminal(),
                }
            })
            .collect())
    }

    async fn remove_item(&self, download_id: &str) -> Result<(), DownloadClientError> {
        let mut form = HashMap::new();
        form.insert("hashes", download_id.to_lowercase());
        form.insert("deleteFiles", "false".to_string());

        self.post_form("/api/v2/torrents/delete", &form).await
    }

    async fn test_connection(&self) -> Result<(), DownloadClientError> {
        self.authenticate_if_configured().await?;
        let url = self.endpoint("/api/v2/app/version")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadClientError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DownloadClientError::HttpStatus {
                status: response.status().as_u16(),
                body: response
                    .text()
                    .await
                    .map_err(|e| DownloadClientError::Request(e.to_string()))?,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct QbittorrentTorrent {
    hash: String,
    name: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    amount_left: i64,
    #[serde(default)]
    eta: i64,
    #[serde(default)]
    state: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    save_path: Option<String>,
}

fn map_torrent_state(state: &str) -> DownloadItemStatus {
    let state = state.to_lowercase();

    if state.contains("error") {
        DownloadItemStatus::Failed
    } else if state.contains("missingfiles") {
        DownloadItemStatus::Warning
    } else if state.contains("up") || state.contains("uploading") {
        // pausedUP/stalledUP/queuedUP/checkingUP: the download side is done.
        DownloadItemStatus::Completed
    } else if state.contains("paused") {
        DownloadItemStatus::Paused
    } else if state.contains("queued") || state.contains("stalled") {
        DownloadItemStatus::Queued
    } else {
        // downloading/metaDL/checkingDL/allocating and anything new qBittorrent grows
        DownloadItemStatus::Downloading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn state_mapping_covers_the_interesting_cases() {
        assert_eq!(map_torrent_state("error"), DownloadItemStatus::Failed);
        assert_eq!(
            map_torrent_state("missingFiles"),
            DownloadItemStatus::Warning
        );
        assert_eq!(map_torrent_state("pausedUP"), DownloadItemStatus::Completed);
        assert_eq!(map_torrent_state("pausedDL"), DownloadItemStatus::Paused);
        assert_eq!(map_torrent_state("queuedDL"), DownloadItemStatus::Queued);
        assert_eq!(map_torrent_state("stalledDL"), DownloadItemStatus::Queued);
        assert_eq!(
            map_torrent_state("downloading"),
            DownloadItemStatus::Downloading
        );
        assert_eq!(
            map_torrent_state("metaDL"),
            DownloadItemStatus::Downloading
        );
    }

    #[tokio::test]
    async fn test_connection_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/app/version"))
            .respond_with(ResponseTemplate::new(200).set_body_string("4.6.7"))
            .mount(&server)
            .await;

        let client = QbittorrentClient::new("qbittorrent", server.uri(), None, None, None);
        assert!(client.test_connection().await.is_ok());
    }

    #[tokio::test]
    async fn get_items_maps_sizes_eta_and_state() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/torrents/info"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[
                    {
                        "hash": "abc123",
                        "name": "Some.Movie.2020.1080p.BluRay-GRP",
                        "size": 4000,
                        "amount_left": 1000,
                        "eta": 120,
                        "state": "downloading",
                        "category": "movies",
                        "save_path": "/downloads/movies"
                    },
                    {
                        "hash": "def456",
                        "name": "Done.Movie.2019.720p.WEB-GRP",
                        "size": 2000,
                        "amount_left": 0,
                        "eta": 8640000,
                        "state": "pausedUP",
                        "category": "",
                        "save_path": "/downloads/movies"
                    }
                ]"#,
            ))
            .mount(&server)
            .await;

        let client = QbittorrentClient::new("qbittorrent", server.uri(), None, None, None);
        let items = client.get_items().await.expect("items should parse");

        assert_eq!(items.len(), 2);

        assert_eq!(items[0].download_id, "ABC123");
        assert_eq!(items[0].total_size, 4000);
        assert_eq!(items[0].remaining_size, 1000);
        assert_eq!(items[0].remaining_time, Some(Duration::from_secs(120)));
        assert_eq!(items[0].status, DownloadItemStatus::Downloading);
        assert_eq!(items[0].category.as_deref(), Some("movies"));

        assert_eq!(items[1].status, DownloadItemStatus::Completed);
        assert_eq!(items[1].remaining_time, None);
        assert!(items[1].category.is_none());
        assert!(items[1].can_be_removed);
    }

    #[tokio::test]
    async fn get_items_passes_category_filter() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v2/torrents/info"))
            .and(query_param("category", "movies"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let client = QbittorrentClient::new(
            "qbittorrent",
            server.uri(),
            None,
            None,
            Some("movies".to_string()),
        );
        let items = client.get_items().await.expect("items");
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn authenticates_before_listing_when_credentials_configured() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/auth/login"))
            .and(body_string_contains("username=admin"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Ok."))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/v2/torrents/info"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let client = QbittorrentClient::new(
            "qbittorrent",
            server.uri(),
            Some("admin".to_string()),
            Some("secret".to_string()),
            None,
        );
        assert!(client.get_items().await.is_ok());
    }

    #[tokio::test]
    async fn rejected_login_surfaces_authentication_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Fails."))
            .mount(&server)
            .await;

        let client = QbittorrentClient::new(
            "qbittorrent",
            server.uri(),
            Some("admin".to_string()),
            Some("wrong".to_string()),
            None,
        );
        let result = client.get_items().await;
        assert!(matches!(result, Err(DownloadClientError::Authentication)));
    }

    #[tokio::test]
    async fn remove_item_posts_hash() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v2/torrents/delete"))
            .and(body_string_contains("hashes=abc123"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = QbittorrentClient::new("qbittorrent", server.uri(), None, None, None);
        assert!(client.remove_item("ABC123").await.is_ok());
    }
}
