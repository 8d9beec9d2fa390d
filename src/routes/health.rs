use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    response::ApiResponse,
    state::AppState,
    store::{Collection, ListFilter},
};

#[derive(Serialize, ToSchema)]
pub struct HealthData {
    /// `ok`, or `degraded` when the store probe fails.
    pub status: String,
    pub service: String,
    pub version: String,
    pub store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and store status", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthData>> {
    let probe = ListFilter {
        category_id: None,
        offset: 0,
        limit: 1,
    };
    let reachable = matches!(
        tokio::time::timeout(
            state.config.store_timeout,
            state.store.list(Collection::Categories, &probe),
        )
        .await,
        Ok(Ok(_))
    );
    if !reachable {
        tracing::warn!("health probe could not reach the store");
    }

    let data = HealthData {
        status: if reachable { "ok" } else { "degraded" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: state.config.store_backend.as_str().to_string(),
    };
    Json(ApiResponse::success("Health check", data, None))
}
