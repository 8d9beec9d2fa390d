use equipment_catalog_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    store::PgStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    let store = PgStore::new(create_pool(&config.database_url).await?);
    run_migrations(store.orm()).await?;
    println!("Migrations applied");
    Ok(())
}
