use equipment_catalog_api::{
    db::{create_pool, run_migrations},
    models::{Product, ProductRef, SpecValue, Specification},
    store::{DocumentStore, PgStore, ProductSearch, StoreError, documents},
};
use uuid::Uuid;

/// Migrated store, or `None` when no database is configured.
async fn pg_store() -> anyhow::Result<Option<PgStore>> {
    let Ok(database_url) =
        std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL"))
    else {
        eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run Postgres store tests.");
        return Ok(None);
    };
    let store = PgStore::new(create_pool(&database_url).await?);
    run_migrations(store.orm()).await?;
    Ok(Some(store))
}

// Round-trips documents through Postgres; skipped without a database.
#[tokio::test]
async fn product_round_trip_search_and_revision_check() -> anyhow::Result<()> {
    let Some(store) = pg_store().await? else {
        return Ok(());
    };

    let suffix = Uuid::new_v4().simple().to_string();
    let category_id = format!("cat-{suffix}");

    let mut product = Product::blank();
    product.category_id = category_id.clone();
    product.name = format!("Dozer {suffix}");
    product.rating = 4.5;
    product.specification = Specification::from_entries([
        ("Weight", SpecValue::Text("18 t".into())),
        ("Blade", SpecValue::List(vec!["Straight".into(), "Semi-U".into()])),
        ("Engine", SpecValue::Text("Cummins".into())),
    ]);
    product.related_products = vec![ProductRef::new("other")];

    let created = documents::create(&store, &product).await?;
    assert_eq!(created.revision, Some(1));

    let loaded: Product = documents::fetch(&store, &product.id)
        .await?
        .expect("inserted product");
    assert_eq!(Product { revision: None, ..loaded.clone() }, product);
    let labels: Vec<_> = loaded.specification.labels().collect();
    assert_eq!(labels, vec!["Weight", "Blade", "Engine"]);

    let found: Vec<Product> = documents::search(
        &store,
        &ProductSearch {
            term: category_id.to_uppercase(),
            category_id: Some(category_id.clone()),
        },
    )
    .await?;
    assert_eq!(found.len(), 1);

    let mut edited = loaded.clone();
    edited.description = "Updated".into();
    let saved = documents::save(&store, &edited).await?;
    assert_eq!(saved.revision, Some(2));
    assert_eq!(saved.description, "Updated");

    let stale = documents::save(&store, &edited).await;
    assert!(matches!(stale, Err(StoreError::Conflict { expected: 1, actual: 2 })));

    let dup = documents::create(&store, &product).await;
    assert!(matches!(dup, Err(StoreError::AlreadyExists(_))));

    documents::remove::<Product>(&store, &product.id).await?;
    assert!(documents::fetch::<Product>(&store, &product.id).await?.is_none());
    assert!(matches!(
        store.delete(equipment_catalog_api::store::Collection::Products, &product.id).await,
        Err(StoreError::NotFound)
    ));

    Ok(())
}

#[tokio::test]
async fn racing_inserts_report_already_exists() -> anyhow::Result<()> {
    let Some(store) = pg_store().await? else {
        return Ok(());
    };

    let mut product = Product::blank();
    product.name = "Grader".into();
    product.category_id = "graders".into();

    let (a, b) = tokio::join!(
        documents::create(&store, &product),
        documents::create(&store, &product),
    );
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(StoreError::AlreadyExists(id)) if *id == product.id))
    );

    documents::remove::<Product>(&store, &product.id).await?;
    Ok(())
}
