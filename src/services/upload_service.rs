use std::path::Path;

use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::upload::UploadResponse,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Public URL prefix under which `UPLOAD_DIR` is served.
pub const UPLOAD_URL_PREFIX: &str = "/uploads";

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Normalized extension of an allowed image file name.
pub fn image_extension(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.into_iter().find(|allowed| *allowed == ext)
}

/// Writes an uploaded image under a random name and returns its public path.
pub async fn store_image(
    state: &AppState,
    user: &AuthUser,
    file_name: &str,
    data: &[u8],
) -> AppResult<ApiResponse<UploadResponse>> {
    ensure_admin(user)?;
    let ext = image_extension(file_name).ok_or_else(|| {
        AppError::BadRequest(format!(
            "Only {} files are allowed",
            ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;
    if data.is_empty() {
        return Err(AppError::BadRequest("Uploaded file is empty".into()));
    }
    if data.len() > state.config.max_upload_bytes {
        return Err(AppError::BadRequest("Uploaded file is too large".into()));
    }

    let stored_name = format!("{}.{ext}", Uuid::new_v4().simple());
    let dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    tokio::fs::write(dir.join(&stored_name), data)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let file_path = format!("{UPLOAD_URL_PREFIX}/{stored_name}");
    tracing::info!(file_path = %file_path, bytes = data.len(), original = file_name, "upload stored");

    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "upload",
        Some("uploads"),
        Some(serde_json::json!({ "file_path": file_path, "original_name": file_name })),
    )
    .await;

    Ok(ApiResponse::success(
        "Uploaded",
        UploadResponse { file_path },
        Some(Meta::empty()),
    ))
}
