use chrono::Utc;
use equipment_catalog_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    editor::resolver::DEFAULT_DEAL_DISCOUNT,
    middleware::auth::ADMIN_ROLE,
    models::{
        AdminUser, Category, Faq, Product, ProductRef, ProductSummary, SpecValue, Specification,
    },
    services::auth_service::hash_password,
    store::{Document, DocumentStore, PgStore, documents},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let store = PgStore::new(create_pool(&config.database_url).await?);
    // Ensure migrations are applied.
    run_migrations(store.orm()).await?;

    let email = std::env::var("SEED_ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".into());
    let password = std::env::var("SEED_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());
    let admin = ensure_admin(&store, &email, &password).await?;

    let products = sample_products();
    for product in &products {
        ensure(&store, product).await?;
    }
    for category in sample_categories(&products) {
        ensure(&store, &category).await?;
    }

    println!("Seed completed. Admin ID: {}", admin.id);
    Ok(())
}

async fn ensure_admin(store: &PgStore, email: &str, password: &str) -> anyhow::Result<AdminUser> {
    let password_hash = hash_password(password)?;
    let admin = store
        .upsert_admin(AdminUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash,
            role: ADMIN_ROLE.to_string(),
            created_at: Utc::now(),
        })
        .await?;
    println!("Ensured admin {email}");
    Ok(admin)
}

/// Inserts `doc` unless a document with its id already exists.
async fn ensure<D: Document>(store: &PgStore, doc: &D) -> anyhow::Result<()> {
    if documents::fetch::<D>(store, doc.document_id()).await?.is_some() {
        println!("Skipped existing {} `{}`", D::COLLECTION.as_str(), doc.document_id());
        return Ok(());
    }
    documents::create(store, doc).await?;
    println!("Seeded {} `{}`", D::COLLECTION.as_str(), doc.document_id());
    Ok(())
}

fn text(value: &str) -> SpecValue {
    SpecValue::Text(value.to_string())
}

fn product(id: &str, category_id: &str, name: &str, rating: f64, spec: Specification) -> Product {
    let mut product = Product::blank();
    product.id = id.to_string();
    product.category_id = category_id.to_string();
    product.name = name.to_string();
    product.rating = rating;
    product.specification = spec;
    product.hero_images = vec![format!("/uploads/{id}.jpg")];
    product
}

fn sample_products() -> Vec<Product> {
    let mut exc_200 = product(
        "exc-200",
        "excavators",
        "Crawler Excavator 200",
        4.6,
        Specification::from_entries([
            ("Operating Weight", text("20 t")),
            ("Engine Power", text("110 kW")),
            (
                "Bucket Options",
                SpecValue::List(vec!["0.8 m3".into(), "1.0 m3".into()]),
            ),
        ]),
    );
    exc_200.description = "Mid-size crawler excavator for earthmoving and site prep.".into();
    exc_200.details.benefits = vec![
        "Low fuel consumption".into(),
        "Reinforced boom for heavy digging".into(),
    ];
    exc_200.details.faqs = vec![Faq {
        question: "Is a quick coupler included?".into(),
        answer: "A hydraulic quick coupler is available as an option.".into(),
    }];
    exc_200.related_products = vec![ProductRef::new("exc-300")];
    exc_200.other_products = vec![ProductRef::new("wl-150")];
    exc_200.youtube_link = "https://www.youtube.com/watch?v=dQw4w9WgXcQ".into();

    let mut exc_300 = product(
        "exc-300",
        "excavators",
        "Crawler Excavator 300",
        4.4,
        Specification::from_entries([
            ("Operating Weight", text("30 t")),
            ("Engine Power", text("160 kW")),
        ]),
    );
    exc_300.related_products = vec![ProductRef::new("exc-200")];

    let wl_150 = product(
        "wl-150",
        "wheel-loaders",
        "Wheel Loader 150",
        4.2,
        Specification::from_entries([
            ("Bucket Capacity", text("2.5 m3")),
            ("Rated Load", text("5 t")),
        ]),
    );

    vec![exc_200, exc_300, wl_150]
}

fn sample_categories(products: &[Product]) -> Vec<Category> {
    let cards = |category_id: &str| -> Vec<ProductSummary> {
        products
            .iter()
            .filter(|p| p.category_id == category_id)
            .map(ProductSummary::from)
            .collect()
    };

    let mut excavators = Category::blank();
    excavators.id = "excavators".into();
    excavators.name = "Excavators".into();
    excavators.description = "Crawler and wheeled excavators from 1 to 50 tonnes.".into();
    excavators.hero_images = vec!["/uploads/excavators.jpg".into()];
    excavators.products = cards("excavators");
    excavators.deals = cards("excavators")
        .into_iter()
        .take(1)
        .map(|mut card| {
            card.discount = Some(DEFAULT_DEAL_DISCOUNT.into());
            card
        })
        .collect();
    excavators.trending_products = cards("excavators");

    let mut loaders = Category::blank();
    loaders.id = "wheel-loaders".into();
    loaders.name = "Wheel Loaders".into();
    loaders.description = "Compact and large wheel loaders.".into();
    loaders.products = cards("wheel-loaders");
    loaders.new_releases = cards("wheel-loaders");

    vec![excavators, loaders]
}
