use crate::{
    audit::log_audit,
    dto::categories::{CategoryList, CategorySearchQuery},
    editor::edits::validate_category,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Category,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    store::{Collection, ProductSearch, documents},
};

pub async fn list_categories(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<ApiResponse<CategoryList>> {
    let (page, per_page, _) = pagination.normalize();
    let (items, total) =
        documents::list::<Category>(state.store.as_ref(), &pagination.filter(None)).await?;

    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success("Categories", CategoryList { items }, Some(meta)))
}

pub async fn get_category(state: &AppState, id: &str) -> AppResult<ApiResponse<Category>> {
    let category = documents::fetch::<Category>(state.store.as_ref(), id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Category", category, None))
}

pub async fn search_categories(
    state: &AppState,
    user: &AuthUser,
    query: CategorySearchQuery,
) -> AppResult<ApiResponse<CategoryList>> {
    ensure_admin(user)?;
    let term = query.term.trim();
    if term.is_empty() {
        return Err(AppError::BadRequest("Search term must not be empty".into()));
    }
    let search = ProductSearch {
        term: term.to_string(),
        category_id: None,
    };
    let items = documents::search::<Category>(state.store.as_ref(), &search).await?;
    Ok(ApiResponse::success("Categories", CategoryList { items }, None))
}

/// Creates a category; without an id one is derived from the name.
pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    mut payload: Category,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    validate_category(&payload)?;
    if payload.id.trim().is_empty() {
        payload.id =
            documents::next_free_id(state.store.as_ref(), Collection::Categories, &payload.slug())
                .await?;
    }
    payload.revision = None;

    let category = documents::create(state.store.as_ref(), &payload).await?;
    tracing::info!(category_id = %category.id, "category created");

    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await;

    Ok(ApiResponse::success("Category created", category, Some(Meta::empty())))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    mut payload: Category,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    if payload.id.is_empty() {
        payload.id = id.to_string();
    }
    if payload.id != id {
        return Err(AppError::BadRequest("Category id does not match path".into()));
    }
    validate_category(&payload)?;

    let category = documents::save(state.store.as_ref(), &payload).await?;

    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "category_update",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id, "revision": category.revision })),
    )
    .await;

    Ok(ApiResponse::success("Updated", category, Some(Meta::empty())))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    documents::remove::<Category>(state.store.as_ref(), id).await?;

    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "category_delete",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
