use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::editor::{AttachRequest, OpenSessionRequest, SessionSearchRequest},
    editor::{
        EditorSession, EditorState, EntityEdit,
        session::{SAVED_DISPLAY_DELAY, SessionSnapshot},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::{AppState, EditorSessions, SessionHandle},
};

/// Locks a registered session and marks it as in use.
async fn checkout(state: &AppState, id: Uuid) -> AppResult<OwnedMutexGuard<EditorSession>> {
    let handle: SessionHandle = state
        .sessions
        .read()
        .await
        .get(&id)
        .cloned()
        .ok_or(AppError::NotFound)?;
    let mut session = handle.lock_owned().await;
    session.touch();
    Ok(session)
}

/// Drops sessions idle for at least `ttl`. Sessions locked by a running
/// request are in use and stay.
pub async fn evict_idle(sessions: &EditorSessions, ttl: Duration) -> usize {
    let mut map = sessions.write().await;
    let before = map.len();
    map.retain(|_, handle| match handle.try_lock() {
        Ok(session) => session.idle_for() < ttl,
        Err(_) => true,
    });
    let evicted = before - map.len();
    if evicted > 0 {
        tracing::debug!(evicted, remaining = map.len(), "idle editor sessions evicted");
    }
    evicted
}

/// Periodically evicts idle sessions for the life of the process.
pub fn spawn_session_sweeper(sessions: EditorSessions, ttl: Duration) -> JoinHandle<()> {
    let period = (ttl / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            evict_idle(&sessions, ttl).await;
        }
    })
}

fn snapshot(message: &str, session: &EditorSession) -> ApiResponse<SessionSnapshot> {
    ApiResponse::success(message, session.snapshot(), Some(Meta::empty()))
}

/// Drops a saved session once the success banner has had its time.
fn close_after_saved(sessions: EditorSessions, id: Uuid) {
    tokio::spawn(async move {
        tokio::time::sleep(SAVED_DISPLAY_DELAY).await;
        sessions.write().await.remove(&id);
        tracing::debug!(session = %id, "saved session closed");
    });
}

/// Opens and loads a session. Sessions that fail to load are reported but not
/// kept.
pub async fn open_session(
    state: &AppState,
    user: &AuthUser,
    payload: OpenSessionRequest,
) -> AppResult<ApiResponse<SessionSnapshot>> {
    ensure_admin(user)?;
    evict_idle(&state.sessions, state.config.session_idle_ttl).await;
    let mut session = EditorSession::open(payload.kind, &payload.id);
    session
        .load(state.store.as_ref(), state.config.store_timeout)
        .await;

    let resp = snapshot("Editor session", &session);
    if matches!(session.state(), EditorState::LoadFailed { .. }) {
        tracing::info!(kind = payload.kind.as_str(), id = %payload.id, "editor load failed");
        return Ok(resp);
    }

    tracing::debug!(session = %session.id(), kind = payload.kind.as_str(), "editor session opened");
    state
        .sessions
        .write()
        .await
        .insert(session.id(), Arc::new(Mutex::new(session)));
    Ok(resp)
}

pub async fn get_session(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SessionSnapshot>> {
    ensure_admin(user)?;
    let session = checkout(state, id).await?;
    Ok(snapshot("Editor session", &session))
}

pub async fn apply_edit(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    edit: EntityEdit,
) -> AppResult<ApiResponse<SessionSnapshot>> {
    ensure_admin(user)?;
    let mut session = checkout(state, id).await?;
    session.apply(&edit)?;
    Ok(snapshot("Edit applied", &session))
}

pub async fn search(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SessionSearchRequest,
) -> AppResult<ApiResponse<SessionSnapshot>> {
    ensure_admin(user)?;
    let mut session = checkout(state, id).await?;
    session
        .search(
            state.store.as_ref(),
            &payload.term,
            payload.scope,
            payload.target,
            state.config.store_timeout,
        )
        .await?;
    Ok(snapshot("Search results", &session))
}

pub async fn attach(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AttachRequest,
) -> AppResult<ApiResponse<SessionSnapshot>> {
    ensure_admin(user)?;
    let mut session = checkout(state, id).await?;
    session
        .attach(
            state.store.as_ref(),
            payload.target,
            &payload.product_id,
            state.config.store_timeout,
        )
        .await?;
    Ok(snapshot("Attached", &session))
}

pub async fn detach(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AttachRequest,
) -> AppResult<ApiResponse<SessionSnapshot>> {
    ensure_admin(user)?;
    let mut session = checkout(state, id).await?;
    session.detach(payload.target, &payload.product_id)?;
    Ok(snapshot("Detached", &session))
}

/// Saves the session's entity. A failed save leaves the session open with
/// its edits.
pub async fn submit(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SessionSnapshot>> {
    ensure_admin(user)?;
    let mut session = checkout(state, id).await?;
    let was_new = session.is_new();
    let saved_id = session
        .submit(state.store.as_ref(), state.config.store_timeout)
        .await?
        .id()
        .to_string();

    let kind = session.kind().as_str();
    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        &format!("{kind}_{}", if was_new { "create" } else { "update" }),
        Some(kind),
        Some(serde_json::json!({ "id": saved_id, "session": id })),
    )
    .await;

    close_after_saved(state.sessions.clone(), id);
    Ok(snapshot("Saved", &session))
}

pub async fn close_session(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Closed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
