use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use equipment_catalog_api::{
    app::build_app,
    config::{AppConfig, StoreBackend},
    db::{create_pool, run_migrations},
    services::editor_service::spawn_session_sweeper,
    state::AppState,
    store::{DocumentStore, MemoryStore, PgStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,equipment_catalog_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database_url).await?;
            let store = PgStore::new(pool);
            run_migrations(store.orm()).await?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("STORE_BACKEND=memory: documents are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let session_idle_ttl = config.session_idle_ttl;
    let state = AppState::new(store, config);
    spawn_session_sweeper(state.sessions.clone(), session_idle_ttl);
    let app = build_app(state);

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}
