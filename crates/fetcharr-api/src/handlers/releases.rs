// SPDX-License-Identifier: GPL-3.0-or-later
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::DateTime;
use fetcharr_application::{
    parse_release_title, AppState, ReleaseCandidate, ReleaseInfo, SearchCriteria,
};
use fetcharr_domain::{DownloadProtocol, MovieId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct EvaluateReleasesRequest {
    pub candidates: Vec<CandidateResource>,
    pub criteria: Option<CriteriaResource>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CandidateResource {
    pub title: String,
    pub indexer: String,
    /// "usenet" or "torrent"
    pub protocol: String,
    pub size_bytes: Option<u64>,
    /// RFC 3339 publish date as reported by the indexer.
    pub publish_date: Option<String>,
    pub seeders: Option<u32>,
    pub leechers: Option<u32>,
    pub download_url: Option<String>,
    pub guid: Option<String>,
    #[serde(default)]
    pub matched_movie_ids: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CriteriaResource {
    pub target_movie_id: Option<String>,
    #[serde(default)]
    pub requested_movie_ids: Vec<String>,
    pub expected_title: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EvaluatedReleaseResource {
    pub title: String,
    pub indexer: String,
    pub approved: bool,
    pub rejections: Vec<RejectionResource>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RejectionResource {
    pub reason: String,
    /// "permanent" rejections need user action; "temporary" ones clear on
    /// their own on a later pass.
    pub kind: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReleaseErrorResponse {
    pub error: String,
}

fn parse_movie_ids(raw: &[String]) -> Result<Vec<MovieId>, String> {
    raw.iter()
        .map(|value| {
            Uuid::parse_str(value)
                .map(MovieId::from_uuid)
                .map_err(|_| format!("'{}' is not a valid movie id", value))
        })
        .collect()
}

fn parse_protocol(raw: &str) -> Result<DownloadProtocol, String> {
    match raw.trim().to_lowercase().as_str() {
        "usenet" => Ok(DownloadProtocol::Usenet),
        "torrent" => Ok(DownloadProtocol::Torrent),
        other => Err(format!("unknown protocol '{}'", other)),
    }
}

/// Evaluate indexer release candidates against the decision engine.
#[utoipa::path(
    post,
    path = "/api/v1/release/evaluate",
    request_body = EvaluateReleasesRequest,
    responses(
        (status = 200, description = "Per-candidate decisions", body = [EvaluatedReleaseResource]),
        (status = 400, description = "Invalid request", body = ReleaseErrorResponse)
    ),
    tag = "releases"
)]
pub async fn evaluate_releases(
    State(state): State<AppState>,
    Json(request): Json<EvaluateReleasesRequest>,
) -> impl IntoResponse {
    let criteria = match request.criteria {
        Some(resource) => {
            let target_movie_id = match resource.target_movie_id.as_deref() {
                Some(raw) => match Uuid::parse_str(raw) {
                    Ok(uuid) => Some(MovieId::from_uuid(uuid)),
                    Err(_) => {
                        return bad_request(format!("'{}' is not a valid movie id", raw));
                    }
                },
                None => None,
            };

            let requested_movie_ids = match parse_movie_ids(&resource.requested_movie_ids) {
                Ok(ids) => ids,
                Err(error) => return bad_request(error),
            };

            Some(SearchCriteria {
                target_collection_id: None,
                target_movie_id,
                requested_movie_ids,
                expected_title: resource.expected_title,
            })
        }
        None => None,
    };

    let mut candidates = Vec::with_capacity(request.candidates.len());
    for resource in request.candidates {
        let protocol = match parse_protocol(&resource.protocol) {
            Ok(protocol) => protocol,
            Err(error) => return bad_request(error),
        };

        let movie_ids = match parse_movie_ids(&resource.matched_movie_ids) {
            Ok(ids) => ids,
            Err(error) => return bad_request(error),
        };

        let publish_date = resource
            .publish_date
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|date| date.with_timezone(&chrono::Utc));

        let parsed = parse_release_title(&resource.title);
        let mut candidate = ReleaseCandidate::new(
            ReleaseInfo {
                title: resource.title,
                indexer: resource.indexer,
                protocol,
                size_bytes: resource.size_bytes,
                publish_date,
                seeders: resource.seeders,
                leechers: resource.leechers,
                download_url: resource.download_url,
                guid: resource.guid,
            },
            parsed,
        );
        candidate.movie_ids = movie_ids;
        candidates.push(candidate);
    }

    let evaluated = state.engine.evaluate(candidates, criteria.as_ref());

    let resources: Vec<EvaluatedReleaseResource> = evaluated
        .into_iter()
        .map(|result| EvaluatedReleaseResource {
            title: result.candidate.release.title,
            indexer: result.candidate.release.indexer,
            approved: result.decision.is_accepted(),
            rejections: result
                .decision
                .rejections()
                .iter()
                .map(|rejection| RejectionResource {
                    reason: rejection.reason.clone(),
                    kind: format!("{:?}", rejection.kind).to_lowercase(),
                })
                .collect(),
        })
        .collect();

    (StatusCode::OK, Json(resources)).into_response()
}

fn bad_request(error: String) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, Json(ReleaseErrorResponse { error })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetcharr_config::AppConfig;

    fn candidate(title: &str, protocol: &str, seeders: Option<u32>) -> CandidateResource {
        CandidateResource {
            title: title.to_string(),
            indexer: "indexer".to_string(),
            protocol: protocol.to_string(),
            size_bytes: None,
            publish_date: None,
            seeders,
            leechers: None,
            download_url: None,
            guid: None,
            matched_movie_ids: Vec::new(),
        }
    }

    #[tokio::test]
    async fn evaluates_rss_candidates_without_criteria() {
        let state = AppState::new(AppConfig::default());
        let request = EvaluateReleasesRequest {
            candidates: vec![candidate("Some.Movie.2020.1080p.BluRay-GRP", "torrent", Some(0))],
            criteria: None,
        };

        let response = evaluate_releases(State(state), Json(request))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_protocol_is_a_bad_request() {
        let state = AppState::new(AppConfig::default());
        let request = EvaluateReleasesRequest {
            candidates: vec![candidate("Some.Movie.2020.1080p-GRP", "carrier-pigeon", None)],
            criteria: None,
        };

        let response = evaluate_releases(State(state), Json(request))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_movie_id_in_criteria_is_a_bad_request() {
        let state = AppState::new(AppConfig::default());
        let request = EvaluateReleasesRequest {
            candidates: Vec::new(),
            criteria: Some(CriteriaResource {
                target_movie_id: Some("garbage".to_string()),
                requested_movie_ids: Vec::new(),
                expected_title: None,
            }),
        };

        let response = evaluate_releases(State(state), Json(request))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
