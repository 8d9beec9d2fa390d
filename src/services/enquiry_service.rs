use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::enquiries::{CreateEnquiryRequest, EnquiryList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Enquiry,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
    store::documents,
};

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate(payload: &CreateEnquiryRequest) -> AppResult<()> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    if !payload.email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    if payload.message.trim().is_empty() {
        return Err(AppError::BadRequest("Message is required".into()));
    }
    Ok(())
}

/// Public lead capture from the storefront.
pub async fn create_enquiry(
    state: &AppState,
    payload: CreateEnquiryRequest,
) -> AppResult<ApiResponse<Enquiry>> {
    validate(&payload)?;
    let enquiry = Enquiry {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        phone: non_empty(payload.phone),
        company: non_empty(payload.company),
        message: payload.message,
        product_id: non_empty(payload.product_id),
        created_at: Utc::now(),
    };
    let enquiry = documents::create(state.store.as_ref(), &enquiry).await?;
    tracing::info!(enquiry_id = %enquiry.id, product_id = ?enquiry.product_id, "enquiry received");

    Ok(ApiResponse::success("Enquiry received", enquiry, Some(Meta::empty())))
}

pub async fn list_enquiries(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<EnquiryList>> {
    ensure_admin(user)?;
    let (page, per_page, _) = pagination.normalize();
    let (items, total) =
        documents::list::<Enquiry>(state.store.as_ref(), &pagination.filter(None)).await?;

    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success("Enquiries", EnquiryList { items }, Some(meta)))
}

pub async fn get_enquiry(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> AppResult<ApiResponse<Enquiry>> {
    ensure_admin(user)?;
    let enquiry = documents::fetch::<Enquiry>(state.store.as_ref(), id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Enquiry", enquiry, None))
}

pub async fn delete_enquiry(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    documents::remove::<Enquiry>(state.store.as_ref(), id).await?;

    log_audit(
        state.store.as_ref(),
        Some(user.user_id),
        "enquiry_delete",
        Some("enquiry"),
        Some(serde_json::json!({ "enquiry_id": id })),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
