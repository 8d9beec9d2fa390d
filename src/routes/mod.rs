use axum::Router;

use crate::{config::AppConfig, state::AppState};

pub mod auth;
pub mod catalog;
pub mod categories;
pub mod doc;
pub mod editor;
pub mod enquiries;
pub mod health;
pub mod params;
pub mod products;
pub mod upload;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router(config: &AppConfig) -> Router<AppState> {
    let admin = Router::new()
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/enquiries", enquiries::router())
        .nest("/editor", editor::router());

    Router::new()
        .merge(catalog::router())
        .nest("/auth", auth::router())
        .nest("/upload", upload::router(config.max_upload_bytes))
        .nest("/admin", admin)
}
