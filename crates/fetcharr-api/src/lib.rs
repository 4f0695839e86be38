// SPDX-License-Identifier: GPL-3.0-or-later
pub mod handlers;
pub mod middleware;

use axum::{middleware as axum_middleware, routing::get, routing::post, Json, Router};
use fetcharr_application::AppState;
use handlers::queue::{
    get_queue, QueueEntryResource, QueueErrorResponse, QueuePageResource, StatusMessageResource,
    __path_get_queue,
};
use handlers::releases::{
    evaluate_releases, CandidateResource, CriteriaResource, EvaluateReleasesRequest,
    EvaluatedReleaseResource, RejectionResource, ReleaseErrorResponse, __path_evaluate_releases,
};
use middleware::auth::auth_middleware;
use serde::Serialize;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Serialize, utoipa::ToSchema)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
#[allow(dead_code)]
async fn health() -> Json<HealthResponse> {
    health_handler().await
}

#[derive(OpenApi)]
#[openapi(
    paths(health, get_queue, evaluate_releases),
    components(
        schemas(
            HealthResponse,
            QueuePageResource,
            QueueEntryResource,
            StatusMessageResource,
            QueueErrorResponse,
            EvaluateReleasesRequest,
            CandidateResource,
            CriteriaResource,
            EvaluatedReleaseResource,
            RejectionResource,
            ReleaseErrorResponse,
        )
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "queue", description = "Reconciled download queue"),
        (name = "releases", description = "Release decision endpoints")
    ),
    info(
        title = "Fetcharr API",
        version = "0.1.0",
        description = "Release decision engine and download queue reconciliation",
    )
)]
struct ApiDoc;

pub fn router(state: AppState) -> Router {
    info!(target: "api", "building router");

    let api_v1 = Router::new()
        .route("/queue", get(get_queue))
        .route("/release/evaluate", post(evaluate_releases))
        .layer(axum_middleware::from_fn_with_state(
            state.config.http.api_key.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health_handler))
        .nest("/api/v1", api_v1)
        .with_state(state)
}
