#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, time::Duration};

use equipment_catalog_api::{
    config::{AppConfig, StoreBackend},
    middleware::auth::{ADMIN_ROLE, AuthUser},
    models::Product,
    state::AppState,
    store::{MemoryStore, documents},
};
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        store_backend: StoreBackend::Memory,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: JWT_SECRET.into(),
        upload_dir: upload_dir(),
        max_upload_bytes: 1024 * 1024,
        store_timeout: Duration::from_secs(10),
        session_idle_ttl: Duration::from_secs(30 * 60),
    }
}

fn upload_dir() -> PathBuf {
    std::env::temp_dir().join(format!("catalog-uploads-{}", Uuid::new_v4().simple()))
}

/// App state over a fresh in-memory store; the store handle is returned too
/// so tests can inspect the audit log.
pub fn memory_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), test_config());
    (state, store)
}

pub fn admin() -> AuthUser {
    AuthUser {
        user_id: Uuid::new_v4(),
        role: ADMIN_ROLE.into(),
    }
}

pub fn product(id: &str, category_id: &str, name: &str) -> Product {
    let mut product = Product::blank();
    product.id = id.into();
    product.category_id = category_id.into();
    product.name = name.into();
    product.rating = 4.0;
    product
}

/// P1 and P2 in category c1, P3 in c2.
pub async fn seed_products(store: &MemoryStore) {
    for p in [
        product("p1", "c1", "Loader One"),
        product("p2", "c1", "Loader Two"),
        product("p3", "c2", "Tower Crane"),
    ] {
        documents::create(store, &p).await.unwrap();
    }
}
