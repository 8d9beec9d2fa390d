use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};

use crate::{
    dto::upload::UploadResponse,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::upload_service,
    state::AppState,
};

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(upload_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
}

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content_type = "multipart/form-data", description = "Image in the `file` field"),
    responses(
        (status = 200, description = "Stored image path", body = ApiResponse<UploadResponse>),
        (status = 400, description = "Missing file or disallowed extension"),
    ),
    security(("bearer_auth" = [])),
    tag = "Upload"
)]
pub async fn upload_image(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<UploadResponse>>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let resp = upload_service::store_image(&state, &user, &file_name, &data).await?;
        return Ok(Json(resp));
    }
    Err(AppError::BadRequest("Missing `file` field".into()))
}
