//! Public storefront reads and lead capture.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::{
        categories::CategoryList,
        enquiries::CreateEnquiryRequest,
        products::{CategoryFilter, ProductDetail, ProductList},
    },
    error::AppResult,
    models::{Category, Enquiry},
    response::ApiResponse,
    routes::params::Pagination,
    services::{category_service, enquiry_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/categories", get(list_categories))
        .route("/categories/{id}", get(get_category))
        .route("/enquiry", post(create_enquiry))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("category_id" = Option<String>, Query, description = "Only products in this category"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>)
    ),
    tag = "Catalog"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, filter.category_id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product with related products", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Catalog"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::get_product_detail(&state, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "List categories", body = ApiResponse<CategoryList>)
    ),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = category_service::list_categories(&state, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = String, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Get category", body = ApiResponse<Category>),
        (status = 404, description = "Category not found"),
    ),
    tag = "Catalog"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::get_category(&state, &id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/enquiry",
    request_body = CreateEnquiryRequest,
    responses(
        (status = 201, description = "Enquiry received", body = ApiResponse<Enquiry>),
        (status = 400, description = "Missing name, email or message"),
    ),
    tag = "Catalog"
)]
pub async fn create_enquiry(
    State(state): State<AppState>,
    Json(payload): Json<CreateEnquiryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Enquiry>>)> {
    let resp = enquiry_service::create_enquiry(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
