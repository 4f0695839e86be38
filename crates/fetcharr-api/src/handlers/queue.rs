// SPDX-License-Identifier: GPL-3.0-or-later
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use fetcharr_application::{
    AppState, QueueEntry, QueuePage, QueueQuery, SortDirection, SortKey,
};
use fetcharr_domain::MovieId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QueueParams {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub sort_key: Option<String>,
    pub sort_dir: Option<String>,
    /// Restrict the listing to entries mapped to this movie id.
    pub movie_id: Option<String>,
    /// Restrict the listing to one download client by name.
    pub download_client: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QueueEntryResource {
    pub download_id: String,
    pub movie_ids: Vec<String>,
    pub title: String,
    pub size: i64,
    pub size_left: i64,
    pub timeleft_secs: Option<u64>,
    pub estimated_completion_time: Option<String>,
    pub protocol: String,
    pub indexer: Option<String>,
    pub download_client: String,
    pub status: String,
    pub tracked_status: String,
    pub status_messages: Vec<StatusMessageResource>,
    pub output_path: Option<String>,
    pub progress: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusMessageResource {
    pub title: String,
    pub messages: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QueuePageResource {
    pub page: usize,
    pub page_size: usize,
    pub total_records: usize,
    pub records: Vec<QueueEntryResource>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QueueErrorResponse {
    pub error: String,
}

impl From<QueueEntry> for QueueEntryResource {
    fn from(entry: QueueEntry) -> Self {
        let progress = entry.progress();
        Self {
            download_id: entry.download_id,
            movie_ids: entry.movie_ids.iter().map(|id| id.to_string()).collect(),
            title: entry.title,
            size: entry.size,
            size_left: entry.size_left,
            timeleft_secs: entry.timeleft.map(|d| d.as_secs()),
            estimated_completion_time: entry
                .estimated_completion_time
                .map(|time| time.to_rfc3339()),
            protocol: entry.protocol.to_string(),
            indexer: entry.indexer,
            download_client: entry.download_client,
            status: entry.status.to_string(),
            tracked_status: format!("{:?}", entry.tracked_status).to_lowercase(),
            status_messages: entry
                .status_messages
                .into_iter()
                .map(|message| StatusMessageResource {
                    title: message.title,
                    messages: message.messages,
                })
                .collect(),
            output_path: entry.output_path,
            progress,
        }
    }
}

impl From<QueuePage> for QueuePageResource {
    fn from(page: QueuePage) -> Self {
        Self {
            page: page.page,
            page_size: page.page_size,
            total_records: page.total_records,
            records: page.entries.into_iter().map(Into::into).collect(),
        }
    }
}

/// List the reconciled download queue.
#[utoipa::path(
    get,
    path = "/api/v1/queue",
    params(QueueParams),
    responses(
        (status = 200, description = "Reconciled queue page", body = QueuePageResource),
        (status = 400, description = "Invalid query parameter", body = QueueErrorResponse)
    ),
    tag = "queue"
)]
pub async fn get_queue(
    State(state): State<AppState>,
    Query(params): Query<QueueParams>,
) -> impl IntoResponse {
    let movie_id = match params.movie_id.as_deref() {
        Some(raw) => match Uuid::parse_str(raw) {
            Ok(uuid) => Some(MovieId::from_uuid(uuid)),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(QueueErrorResponse {
                        error: format!("movie_id '{}' is not a valid id", raw),
                    }),
                )
                    .into_response();
            }
        },
        None => None,
    };

    let query = QueueQuery {
        page: params.page.unwrap_or(1),
        page_size: params.page_size.unwrap_or(20),
        sort_key: params
            .sort_key
            .as_deref()
            .map(SortKey::parse)
            .unwrap_or(SortKey::Timeleft),
        sort_dir: params
            .sort_dir
            .as_deref()
            .map(SortDirection::parse)
            .unwrap_or(SortDirection::Ascending),
        movie_id,
        download_client: params.download_client,
    };

    let page: QueuePageResource = state.queue.get_queue(&query).into();
    (StatusCode::OK, Json(page)).into_response()
}
