use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::enquiries::EnquiryList,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Enquiry,
    response::ApiResponse,
    routes::params::Pagination,
    services::enquiry_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_enquiries))
        .route("/{id}", get(get_enquiry).delete(delete_enquiry))
}

#[utoipa::path(
    get,
    path = "/api/admin/enquiries",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List enquiries", body = ApiResponse<EnquiryList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Enquiries"
)]
pub async fn list_enquiries(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<EnquiryList>>> {
    let resp = enquiry_service::list_enquiries(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/enquiries/{id}",
    params(
        ("id" = String, Path, description = "Enquiry ID")
    ),
    responses(
        (status = 200, description = "Get enquiry", body = ApiResponse<Enquiry>),
        (status = 404, description = "Enquiry not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Enquiries"
)]
pub async fn get_enquiry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Enquiry>>> {
    let resp = enquiry_service::get_enquiry(&state, &user, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/enquiries/{id}",
    params(
        ("id" = String, Path, description = "Enquiry ID")
    ),
    responses(
        (status = 200, description = "Deleted enquiry"),
        (status = 404, description = "Enquiry not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Enquiries"
)]
pub async fn delete_enquiry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = enquiry_service::delete_enquiry(&state, &user, &id).await?;
    Ok(Json(resp))
}
