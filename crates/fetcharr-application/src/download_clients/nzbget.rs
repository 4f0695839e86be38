// SPDX-License-Identifier: GPL-3.0-or-later

//! NZBGet adapter (JSON-RPC).
//!
//! Queue groups and history entries are mapped into the normalized item
//! shape. History sub-stage statuses (PAR/unpack/move/script/delete/mark)
//! resolve to a single status with the same precedence the original client
//! applies; user-initiated deletes (`DeleteStatus == MANUAL`) are dropped
//! entirely so they are never reinterpreted as failures.

use std::time::Duration;

use fetcharr_domain::DownloadProtocol;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{DownloadClient, DownloadClientError, DownloadClientItem, DownloadItemStatus};

/// Sub-stage values that count as success. The empty string covers fields
/// NZBGet omits for stages that never ran.
const SUCCESS_STATUSES: [&str; 3] = ["SUCCESS", "NONE", ""];

/// Delete statuses that mean the download itself is unusable.
const DELETE_FAILED_STATUSES: [&str; 4] = ["HEALTH", "DUPE", "SCAN", "COPY"];

/// Name of the per-download parameter carrying our own correlation id.
const CORRELATION_PARAMETER: &str = "fetcharr";

pub struct NzbgetClient {
    client: Client,
    name: String,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
    category: Option<String>,
    history_limit: usize,
}

impl NzbgetClient {
    pub fn new(
        name: impl Into<String>,
        base_url: String,
        username: Option<String>,
        password: Option<String>,
        category: Option<String>,
        history_limit: usize,
    ) -> Self {
        Self {
            client: Client::new(),
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            username,
            password,
            category,
            history_limit,
        }
    }

    fn endpoint(&self) -> Result<Url, DownloadClientError> {
        Url::parse(&format!("{}/jsonrpc", self.base_url))
            .map_err(|err| DownloadClientError::InvalidBaseUrl(err.to_string()))
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, DownloadClientError> {
        let url = self.endpoint()?;

        let mut request = self
            .client
            .post(url)
            .json(&json!({ "method": method, "params": params }));

        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            request = request.basic_auth(username, Some(password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadClientError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DownloadClientError::Request(e.to_string()))?;

        if status.as_u16() == 401 {
            return Err(DownloadClientError::Authentication);
        }

        if !status.is_success() {
            return Err(DownloadClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: JsonRpcResponse<T> = serde_json::from_str(&body)
            .map_err(|e| DownloadClientError::Deserialization(e.to_string()))?;

        Ok(envelope.result)
    }

    async fn queue_items(&self) -> Result<Vec<DownloadClientItem>, DownloadClientError> {
        let global: NzbgetGlobalStatus = self.call("status", json!([])).await?;
        let queue: Vec<NzbgetQueueItem> = self.call("listgroups", json!([])).await?;

        let mut items = Vec::with_capacity(queue.len());
        let mut total_remaining: i64 = 0;

        for group in queue {
            let total_size = make_i64(group.file_size_hi, group.file_size_lo);
            let paused_size = make_i64(group.paused_size_hi, group.paused_size_lo);
            let remaining_size = make_i64(group.remaining_size_hi, group.remaining_size_lo);

            let mut item = DownloadClientItem {
                download_id: correlation_id(&group.parameters, group.nzb_id),
                title: group.nzb_name,
                category: normalize_category(group.category),
                total_size,
                remaining_size: 0,
                remaining_time: None,
                output_path: None,
                status: DownloadItemStatus::Downloading,
                status_messages: Vec::new(),
                client_name: self.name.clone(),
                can_be_removed: false,
            };

            if global.download_paused || (remaining_size == paused_size && remaining_size != 0) {
                item.status = DownloadItemStatus::Paused;
                item.remaining_size = remaining_size;
            } else {
                item.status = if group.active_downloads == 0 && remaining_size != 0 {
                    DownloadItemStatus::Queued
                } else {
                    DownloadItemStatus::Downloading
                };
                item.remaining_size = remaining_size - paused_size;

                if global.download_rate != 0 {
                    let seconds =
                        (total_remaining + item.remaining_size) / global.download_rate as i64;
                    item.remaining_time = Some(Duration::from_secs(seconds.max(0) as u64));
                    total_remaining += item.remaining_size;
                }
            }

            items.push(item);
        }

        Ok(items)
    }

    async fn history_items(&self) -> Result<Vec<DownloadClientItem>, DownloadClientError> {
        let history: Vec<NzbgetHistoryItem> = self.call("history", json!([])).await?;

        let mut items = Vec::new();

        for entry in history.into_iter().take(self.history_limit) {
            // A manual delete is a user decision, not a failure.
            if entry.delete_status == "MANUAL" {
                debug!(
                    target: "download_clients",
                    name = %entry.name,
                    "skipping manually deleted history entry"
                );
                continue;
            }

            let message = format!(
                "PAR Status: {} - Unpack Status: {} - Move Status: {} - Script Status: {} - Delete Status: {} - Mark Status: {}",
                entry.par_status,
                entry.unpack_status,
                entry.move_status,
                entry.script_status,
                entry.delete_status,
                entry.mark_status,
            );

            items.push(DownloadClientItem {
                download_id: correlation_id(&entry.parameters, entry.nzb_id),
                title: entry.name,
                category: normalize_category(entry.category),
                total_size: make_i64(entry.file_size_hi, entry.file_size_lo),
                remaining_size: 0,
                remaining_time: Some(Duration::ZERO),
                output_path: (!entry.dest_dir.is_empty()).then_some(entry.dest_dir),
                status: resolve_history_status(
                    &entry.par_status,
                    &entry.unpack_status,
                    &entry.move_status,
                    &entry.script_status,
                    &entry.delete_status,
                ),
                status_messages: vec![message],
                client_name: self.name.clone(),
                can_be_removed: true,
            });
        }

        Ok(items)
    }
}

#[async_trait::async_trait]
impl DownloadClient for NzbgetClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn protocol(&self) -> DownloadProtocol {
        DownloadProtocol::Usenet
    }

    async fn get_items(&self) -> Result<Vec<DownloadClientItem>, DownloadClientError> {
        let mut items = self.queue_items().await?;
        items.extend(self.history_items().await?);

        if let Some(category) = &self.category {
            items.retain(|item| item.category.as_deref() == Some(category));
        }

        Ok(items)
    }

    async fn remove_item(&self, download_id: &str) -> Result<(), DownloadClientError> {
        let nzb_id: i64 = download_id.parse().map_err(|_| {
            DownloadClientError::Request(format!("not an nzbget id: {}", download_id))
        })?;

        let _: bool = self
            .call("editqueue", json!(["GroupFinalDelete", 0, "", [nzb_id]]))
            .await?;
        Ok(())
    }

    async fn test_connection(&self) -> Result<(), DownloadClientError> {
        let version: String = self.call("version", json!([])).await?;

        let major: u32 = version
            .split(['.', '-'])
            .next()
            .and_then(|part| part.parse().ok())
            .unwrap_or(0);

        if major < 12 {
            return Err(DownloadClientError::Request(format!(
                "nzbget version too low, need 12.0 or higher, got {}",
                version
            )));
        }

        Ok(())
    }
}

/// Resolve the final status of a finished download from its sub-stage
/// statuses. Later stages override earlier ones, mirroring the order the
/// stages actually run in.
fn resolve_history_status(
    par: &str,
    unpack: &str,
    mv: &str,
    script: &str,
    delete: &str,
) -> DownloadItemStatus {
    let mut status = DownloadItemStatus::Completed;

    if !is_success(par) {
        status = DownloadItemStatus::Failed;
    }

    if unpack == "SPACE" {
        // Recoverable: the user can free disk space and retry the unpack.
        status = DownloadItemStatus::Warning;
    } else if !is_success(unpack) {
        status = DownloadItemStatus::Failed;
    }

    if !is_success(mv) {
        status = DownloadItemStatus::Warning;
    }

    if !is_success(script) {
        status = DownloadItemStatus::Failed;
    }

    if !is_success(delete) && !delete.trim().is_empty() {
        if DELETE_FAILED_STATUSES.contains(&delete) {
            status = DownloadItemStatus::Failed;
        } else {
            status = DownloadItemStatus::Warning;
        }
    }

    status
}

fn is_success(stage: &str) -> bool {
    SUCCESS_STATUSES.contains(&stage)
}

/// Prefer the embedded correlation parameter over the native id so renamed
/// or re-queued downloads still map back to the grab that created them.
fn correlation_id(parameters: &[NzbgetParameter], nzb_id: i64) -> String {
    parameters
        .iter()
        .find(|parameter| parameter.name == CORRELATION_PARAMETER)
        .map(|parameter| parameter.value.clone())
        .unwrap_or_else(|| nzb_id.to_string())
}

fn normalize_category(category: String) -> Option<String> {
    (!category.trim().is_empty()).then_some(category)
}

// NZBGet sends 64-bit sizes as two 32-bit halves because JSON numbers are
// not reliable past 2^53; join them back together.
fn make_i64(hi: u32, lo: u32) -> i64 {
    ((hi as i64) << 32) | lo as i64
}

/// Typed view of the numbered `CategoryN.*` keys in the NZBGet config dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NzbgetCategory {
    pub name: String,
    pub dest_dir: String,
    pub unpack: bool,
}

/// Parse the numbered category convention into a typed list at the adapter
/// boundary, instead of threading the raw key/value map any further.
pub fn parse_categories(
    config: &std::collections::HashMap<String, String>,
) -> Vec<NzbgetCategory> {
    let mut categories = Vec::new();

    for index in 1..100 {
        let Some(name) = config.get(&format!("Category{}.Name", index)) else {
            break;
        };

        let dest_dir = config
            .get(&format!("Category{}.DestDir", index))
            .filter(|dir| !dir.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| {
                let main_dir = config.get("MainDir").cloned().unwrap_or_default();
                let dest = config
                    .get("DestDir")
                    .cloned()
                    .unwrap_or_default()
                    .replace("${MainDir}", &main_dir);

                if config.get("AppendCategoryDir").map(String::as_str) != Some("no") {
                    format!("{}/{}", dest.trim_end_matches('/'), name)
                } else {
                    dest
                }
            });

        categories.push(NzbgetCategory {
            name: name.clone(),
            dest_dir,
            unpack: config.get(&format!("Category{}.Unpack", index)).map(String::as_str)
                == Some("yes"),
        });
    }

    categories
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct NzbgetGlobalStatus {
    #[serde(rename = "DownloadRate", default)]
    download_rate: u64,
    #[serde(rename = "DownloadPaused", default)]
    download_paused: bool,
}

#[derive(Debug, Deserialize)]
struct NzbgetQueueItem {
    #[serde(rename = "NZBID")]
    nzb_id: i64,
    #[serde(rename = "NZBName")]
    nzb_name: String,
    #[serde(rename = "Category", default)]
    category: String,
    #[serde(rename = "FileSizeHi", default)]
    file_size_hi: u32,
    #[serde(rename = "FileSizeLo", default)]
    file_size_lo: u32,
    #[serde(rename = "RemainingSizeHi", default)]
    remaining_size_hi: u32,
    #[serde(rename = "RemainingSizeLo", default)]
    remaining_size_lo: u32,
    #[serde(rename = "PausedSizeHi", default)]
    paused_size_hi: u32,
    #[serde(rename = "PausedSizeLo", default)]
    paused_size_lo: u32,
    #[serde(rename = "ActiveDownloads", default)]
    active_downloads: u32,
    #[serde(rename = "Parameters", default)]
    parameters: Vec<NzbgetParameter>,
}

#[derive(Debug, Deserialize)]
struct NzbgetHistoryItem {
    #[serde(rename = "NZBID")]
    nzb_id: i64,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Category", default)]
    category: String,
    #[serde(rename = "FileSizeHi", default)]
    file_size_hi: u32,
    #[serde(rename = "FileSizeLo", default)]
    file_size_lo: u32,
    #[serde(rename = "DestDir", default)]
    dest_dir: String,
    #[serde(rename = "ParStatus", default)]
    par_status: String,
    #[serde(rename = "UnpackStatus", default)]
    unpack_status: String,
    #[serde(rename = "MoveStatus", default)]
    move_status: String,
    #[serde(rename = "ScriptStatus", default)]
    script_status: String,
    #[serde(rename = "DeleteStatus", default)]
    delete_status: String,
    #[serde(rename = "MarkStatus", default)]
    mark_status: String,
    #[serde(rename = "Parameters", default)]
    parameters: Vec<NzbgetParameter>,
}

#[derive(Debug, Clone, Deserialize)]
struct NzbgetParameter {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Value")]
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> NzbgetClient {
        NzbgetClient::new("nzbget", server.uri(), None, None, None, 60)
    }

    async fn mock_method(server: &MockServer, rpc_method: &str, result: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/jsonrpc"))
            .and(body_string_contains(rpc_method))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "result": result })),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn make_i64_joins_halves() {
        assert_eq!(make_i64(0, 42), 42);
        assert_eq!(make_i64(1, 0), 1 << 32);
        assert_eq!(make_i64(1, 1), (1i64 << 32) | 1);
    }

    #[test]
    fn history_status_all_success_is_completed() {
        assert_eq!(
            resolve_history_status("SUCCESS", "SUCCESS", "SUCCESS", "NONE", ""),
            DownloadItemStatus::Completed
        );
    }

    #[test]
    fn history_status_par_failure_is_failed() {
        assert_eq!(
            resolve_history_status("FAILURE", "SUCCESS", "SUCCESS", "NONE", ""),
            DownloadItemStatus::Failed
        );
    }

    #[test]
    fn history_status_unpack_space_is_warning() {
        assert_eq!(
            resolve_history_status("SUCCESS", "SPACE", "SUCCESS", "NONE", ""),
            DownloadItemStatus::Warning
        );
    }

    #[test]
    fn history_status_move_failure_is_warning() {
        assert_eq!(
            resolve_history_status("SUCCESS", "SUCCESS", "FAILURE", "NONE", ""),
            DownloadItemStatus::Warning
        );
    }

    #[test]
    fn history_status_script_failure_is_failed() {
        assert_eq!(
            resolve_history_status("SUCCESS", "SUCCESS", "SUCCESS", "FAILURE", ""),
            DownloadItemStatus::Failed
        );
    }

    #[test]
    fn history_status_delete_health_is_failed_but_other_delete_is_warning() {
        assert_eq!(
            resolve_history_status("SUCCESS", "SUCCESS", "SUCCESS", "NONE", "HEALTH"),
            DownloadItemStatus::Failed
        );
        assert_eq!(
            resolve_history_status("SUCCESS", "SUCCESS", "SUCCESS", "NONE", "GOOD"),
            DownloadItemStatus::Warning
        );
    }

    #[test]
    fn parses_numbered_categories_into_typed_list() {
        let mut config = std::collections::HashMap::new();
        config.insert("MainDir".to_string(), "/data".to_string());
        config.insert("DestDir".to_string(), "${MainDir}/complete".to_string());
        config.insert("Category1.Name".to_string(), "movies".to_string());
        config.insert("Category1.Unpack".to_string(), "yes".to_string());
        config.insert("Category2.Name".to_string(), "tv".to_string());
        config.insert(
            "Category2.DestDir".to_string(),
            "/data/tv-complete".to_string(),
        );

        let categories = parse_categories(&config);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name, "movies");
        assert_eq!(categories[0].dest_dir, "/data/complete/movies");
        assert!(categories[0].unpack);
        assert_eq!(categories[1].dest_dir, "/data/tv-complete");
        assert!(!categories[1].unpack);
    }

    #[tokio::test]
    async fn queue_maps_paused_queued_and_downloading() {
        let server = MockServer::start().await;

        mock_method(
            &server,
            "status",
            serde_json::json!({ "DownloadRate": 1_000_000, "DownloadPaused": false }),
        )
        .await;
        mock_method(
            &server,
            "listgroups",
            serde_json::json!([
                {
                    "NZBID": 1,
                    "NZBName": "Paused.Movie.2020.1080p",
                    "Category": "movies",
                    "FileSizeHi": 0, "FileSizeLo": 1000,
                    "RemainingSizeHi": 0, "RemainingSizeLo": 500,
                    "PausedSizeHi": 0, "PausedSizeLo": 500,
                    "ActiveDownloads": 0,
                    "Parameters": []
                },
                {
                    "NZBID": 2,
                    "NZBName": "Queued.Movie.2020.1080p",
                    "Category": "movies",
                    "FileSizeHi": 0, "FileSizeLo": 1000,
                    "RemainingSizeHi": 0, "RemainingSizeLo": 800,
                    "PausedSizeHi": 0, "PausedSizeLo": 0,
                    "ActiveDownloads": 0,
                    "Parameters": []
                },
                {
                    "NZBID": 3,
                    "NZBName": "Active.Movie.2020.1080p",
                    "Category": "movies",
                    "FileSizeHi": 0, "FileSizeLo": 1000,
                    "RemainingSizeHi": 0, "RemainingSizeLo": 200,
                    "PausedSizeHi": 0, "PausedSizeLo": 0,
                    "ActiveDownloads": 2,
                    "Parameters": []
                }
            ]),
        )
        .await;
        mock_method(&server, "history", serde_json::json!([])).await;

        let items = client(&server).get_items().await.expect("items");
        assert_eq!(items.len(), 3);

        assert_eq!(items[0].status, DownloadItemStatus::Paused);
        assert_eq!(items[0].remaining_size, 500);
        assert_eq!(items[0].remaining_time, None);

        assert_eq!(items[1].status, DownloadItemStatus::Queued);
        assert!(items[1].remaining_time.is_some());

        assert_eq!(items[2].status, DownloadItemStatus::Downloading);
        assert!(items[2].remaining_time.is_some());
    }

    #[tokio::test]
    async fn zero_download_rate_leaves_remaining_time_unset() {
        let server = MockServer::start().await;

        mock_method(
            &server,
            "status",
            serde_json::json!({ "DownloadRate": 0, "DownloadPaused": false }),
        )
        .await;
        mock_method(
            &server,
            "listgroups",
            serde_json::json!([
                {
                    "NZBID": 1,
                    "NZBName": "Active.Movie.2020.1080p",
                    "Category": "",
                    "FileSizeHi": 0, "FileSizeLo": 1000,
                    "RemainingSizeHi": 0, "RemainingSizeLo": 200,
                    "PausedSizeHi": 0, "PausedSizeLo": 0,
                    "ActiveDownloads": 1,
                    "Parameters": []
                }
            ]),
        )
        .await;
        mock_method(&server, "history", serde_json::json!([])).await;

        let items = client(&server).get_items().await.expect("items");
        assert_eq!(items[0].status, DownloadItemStatus::Downloading);
        assert_eq!(items[0].remaining_time, None);
    }

    #[tokio::test]
    async fn history_skips_manual_deletes_and_prefers_correlation_parameter() {
        let server = MockServer::start().await;

        mock_method(
            &server,
            "status",
            serde_json::json!({ "DownloadRate": 0, "DownloadPaused": false }),
        )
        .await;
        mock_method(&server, "listgroups", serde_json::json!([])).await;
        mock_method(
            &server,
            "history",
            serde_json::json!([
                {
                    "NZBID": 10,
                    "Name": "Deleted.By.User.2020.1080p",
                    "Category": "movies",
                    "FileSizeHi": 0, "FileSizeLo": 1000,
                    "DestDir": "/complete/a",
                    "ParStatus": "SUCCESS",
                    "UnpackStatus": "SUCCESS",
                    "MoveStatus": "SUCCESS",
                    "ScriptStatus": "NONE",
                    "DeleteStatus": "MANUAL",
                    "MarkStatus": "NONE",
                    "Parameters": []
                },
                {
                    "NZBID": 11,
                    "Name": "Imported.Movie.2020.1080p",
                    "Category": "movies",
                    "FileSizeHi": 0, "FileSizeLo": 2000,
                    "DestDir": "/complete/b",
                    "ParStatus": "SUCCESS",
                    "UnpackStatus": "SUCCESS",
                    "MoveStatus": "SUCCESS",
                    "ScriptStatus": "SUCCESS",
                    "DeleteStatus": "",
                    "MarkStatus": "",
                    "Parameters": [ { "Name": "fetcharr", "Value": "grab-42" } ]
                }
            ]),
        )
        .await;

        let items = client(&server).get_items().await.expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].download_id, "grab-42");
        assert_eq!(items[0].status, DownloadItemStatus::Completed);
        assert_eq!(items[0].output_path.as_deref(), Some("/complete/b"));
        assert_eq!(items[0].remaining_time, Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn category_filter_drops_foreign_items() {
        let server = MockServer::start().await;

        mock_method(
            &server,
            "status",
            serde_json::json!({ "DownloadRate": 0, "DownloadPaused": false }),
        )
        .await;
        mock_method(
            &server,
            "listgroups",
            serde_json::json!([
                {
                    "NZBID": 1,
                    "NZBName": "Movie.In.Category",
                    "Category": "movies",
                    "FileSizeHi": 0, "FileSizeLo": 1000,
                    "RemainingSizeHi": 0, "RemainingSizeLo": 0,
                    "PausedSizeHi": 0, "PausedSizeLo": 0,
                    "ActiveDownloads": 1,
                    "Parameters": []
                },
                {
                    "NZBID": 2,
                    "NZBName": "Software.Download",
                    "Category": "apps",
                    "FileSizeHi": 0, "FileSizeLo": 1000,
                    "RemainingSizeHi": 0, "RemainingSizeLo": 0,
                    "PausedSizeHi": 0, "PausedSizeLo": 0,
                    "ActiveDownloads": 1,
                    "Parameters": []
                }
            ]),
        )
        .await;
        mock_method(&server, "history", serde_json::json!([])).await;

        let client = NzbgetClient::new(
            "nzbget",
            server.uri(),
            None,
            None,
            Some("movies".to_string()),
            60,
        );
        let items = client.get_items().await.expect("items");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Movie.In.Category");
    }

    #[tokio::test]
    async fn test_connection_rejects_old_versions() {
        let server = MockServer::start().await;
        mock_method(&server, "version", serde_json::json!("11.0-testing")).await;

        let result = client(&server).test_connection().await;
        assert!(result.is_err());
    }
}
