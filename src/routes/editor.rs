use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::editor::{AttachRequest, OpenSessionRequest, SessionSearchRequest},
    editor::{EntityEdit, session::SessionSnapshot},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::editor_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(open_session))
        .route("/sessions/{sid}", get(get_session).delete(close_session))
        .route("/sessions/{sid}/edits", post(apply_edit))
        .route("/sessions/{sid}/search", post(search))
        .route("/sessions/{sid}/attach", post(attach))
        .route("/sessions/{sid}/detach", post(detach))
        .route("/sessions/{sid}/submit", post(submit))
}

#[utoipa::path(
    post,
    path = "/api/admin/editor/sessions",
    request_body = OpenSessionRequest,
    responses(
        (status = 200, description = "Loaded session, or the load failure", body = ApiResponse<SessionSnapshot>),
    ),
    security(("bearer_auth" = [])),
    tag = "Editor"
)]
pub async fn open_session(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<OpenSessionRequest>,
) -> AppResult<Json<ApiResponse<SessionSnapshot>>> {
    let resp = editor_service::open_session(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/editor/sessions/{sid}",
    params(("sid" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session snapshot", body = ApiResponse<SessionSnapshot>),
        (status = 404, description = "Session not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Editor"
)]
pub async fn get_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sid): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SessionSnapshot>>> {
    let resp = editor_service::get_session(&state, &user, sid).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/editor/sessions/{sid}/edits",
    params(("sid" = Uuid, Path, description = "Session ID")),
    request_body = EntityEdit,
    responses(
        (status = 200, description = "Snapshot after the edit", body = ApiResponse<SessionSnapshot>),
        (status = 409, description = "Session is not accepting edits"),
        (status = 422, description = "Invalid edit"),
    ),
    security(("bearer_auth" = [])),
    tag = "Editor"
)]
pub async fn apply_edit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sid): Path<Uuid>,
    Json(edit): Json<EntityEdit>,
) -> AppResult<Json<ApiResponse<SessionSnapshot>>> {
    let resp = editor_service::apply_edit(&state, &user, sid, edit).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/editor/sessions/{sid}/search",
    params(("sid" = Uuid, Path, description = "Session ID")),
    request_body = SessionSearchRequest,
    responses(
        (status = 200, description = "Snapshot with search results", body = ApiResponse<SessionSnapshot>),
        (status = 422, description = "Empty term or missing category"),
    ),
    security(("bearer_auth" = [])),
    tag = "Editor"
)]
pub async fn search(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sid): Path<Uuid>,
    Json(payload): Json<SessionSearchRequest>,
) -> AppResult<Json<ApiResponse<SessionSnapshot>>> {
    let resp = editor_service::search(&state, &user, sid, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/editor/sessions/{sid}/attach",
    params(("sid" = Uuid, Path, description = "Session ID")),
    request_body = AttachRequest,
    responses(
        (status = 200, description = "Snapshot after attaching", body = ApiResponse<SessionSnapshot>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Editor"
)]
pub async fn attach(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sid): Path<Uuid>,
    Json(payload): Json<AttachRequest>,
) -> AppResult<Json<ApiResponse<SessionSnapshot>>> {
    let resp = editor_service::attach(&state, &user, sid, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/editor/sessions/{sid}/detach",
    params(("sid" = Uuid, Path, description = "Session ID")),
    request_body = AttachRequest,
    responses(
        (status = 200, description = "Snapshot after detaching", body = ApiResponse<SessionSnapshot>),
    ),
    security(("bearer_auth" = [])),
    tag = "Editor"
)]
pub async fn detach(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sid): Path<Uuid>,
    Json(payload): Json<AttachRequest>,
) -> AppResult<Json<ApiResponse<SessionSnapshot>>> {
    let resp = editor_service::detach(&state, &user, sid, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/editor/sessions/{sid}/submit",
    params(("sid" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Saved snapshot", body = ApiResponse<SessionSnapshot>),
        (status = 409, description = "Stale revision or session not editable"),
        (status = 422, description = "Entity failed validation"),
        (status = 504, description = "Store timed out"),
    ),
    security(("bearer_auth" = [])),
    tag = "Editor"
)]
pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sid): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SessionSnapshot>>> {
    let resp = editor_service::submit(&state, &user, sid).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/editor/sessions/{sid}",
    params(("sid" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session closed"),
        (status = 404, description = "Session not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Editor"
)]
pub async fn close_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sid): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = editor_service::close_session(&state, &user, sid).await?;
    Ok(Json(resp))
}
