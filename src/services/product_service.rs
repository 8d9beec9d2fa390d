use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{InformationUpdate, ProductDetail, ProductList, ProductSearchQuery},
    editor::{
        edits::validate_product,
        resolver::{self, SearchSubject},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    store::documents,
};

/// Search issued from outside an editor: optionally excludes one product and
/// scopes by an explicit category.
struct SearchOrigin<'a> {
    exclude: &'a str,
    category_id: Option<&'a str>,
}

impl SearchSubject for SearchOrigin<'_> {
    fn subject_id(&self) -> &str {
        self.exclude
    }

    fn scope_category(&self) -> Option<&str> {
        self.category_id.filter(|c| !c.trim().is_empty())
    }
}

pub async fn list_products(
    state: &AppState,
    category_id: Option<String>,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, per_page, _) = pagination.normalize();
    let filter = pagination.filter(category_id);
    let (items, total) = documents::list::<Product>(state.store.as_ref(), &filter).await?;

    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: &str) -> AppResult<ApiResponse<Product>> {
    let product = documents::fetch::<Product>(state.store.as_ref(), id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product, None))
}

/// Product with its related and other products resolved for display.
pub async fn get_product_detail(state: &AppState, id: &str) -> AppResult<ApiResponse<ProductDetail>> {
    let store = state.store.as_ref();
    let product = documents::fetch::<Product>(store, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let related = resolver::resolve_refs(store, &product.related_products).await?;
    let other = resolver::resolve_refs(store, &product.other_products).await?;
    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product,
            related,
            other,
        },
        None,
    ))
}

pub async fn search_products(
    state: &AppState,
    user: &AuthUser,
    query: ProductSearchQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let origin = SearchOrigin {
        exclude: query.exclude.as_deref().unwrap_or_default(),
        category_id: query.category_id.as_deref(),
    };
    let search = resolver::build_search(&query.term, query.scope, &origin)?;
    let items = resolver::search(state.store.as_ref(), &search, &origin, &[]).await?;
    Ok(ApiResponse::success("Products", ProductList { items }, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    mut payload: Product,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.id.trim().is_empty() {
        payload.id = Uuid::new_v4().simple().to_string();
    }
    payload.revision = None;
    validate_product(&payload)?;

    let product = documents::create(state.store.as_ref(), &payload).await?;
    tracing::info!(product_id = %product.id, "product created");

    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::success("Product created", product, Some(Meta::empty())))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    mut payload: Product,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.id.is_empty() {
        payload.id = id.to_string();
    }
    if payload.id != id {
        return Err(AppError::BadRequest("Product id does not match path".into()));
    }
    validate_product(&payload)?;

    let product = documents::save(state.store.as_ref(), &payload).await?;

    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id, "revision": product.revision })),
    )
    .await;

    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

/// Replaces `details.information` and nothing else.
pub async fn update_information(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    payload: InformationUpdate,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let mut product = documents::fetch::<Product>(state.store.as_ref(), id)
        .await?
        .ok_or(AppError::NotFound)?;
    if payload.revision.is_some() {
        product.revision = payload.revision;
    }
    product.details.information = payload.information;

    let product = documents::save(state.store.as_ref(), &product).await?;

    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "product_information_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await;

    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    documents::remove::<Product>(state.store.as_ref(), id).await?;

    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
