mod common;

use std::{sync::Arc, time::Duration};

use common::{admin, memory_state, product, seed_products};
use equipment_catalog_api::{
    dto::{
        editor::{AttachRequest, OpenSessionRequest, SessionSearchRequest},
        products::ProductSearchQuery,
    },
    editor::{
        CategoryEdit, EditError, EditorEntity, EditorState, EntityEdit, EntityKind, LoadFailure,
        ProductEdit, RefTarget, SearchScope, TextList,
        session::{NEW_ENTITY_ID, SAVED_DISPLAY_DELAY},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::{Category, Product, ProductRef, SpecValue, Specification},
    services::{category_service, editor_service, product_service},
    state::AppState,
    store::{MemoryStore, documents},
};
use uuid::Uuid;

fn product_edit(edit: ProductEdit) -> EntityEdit {
    EntityEdit::Product(edit)
}

fn entity_product(entity: &Option<EditorEntity>) -> &Product {
    match entity {
        Some(EditorEntity::Product(p)) => p,
        other => panic!("expected a product, got {other:?}"),
    }
}

async fn open(
    state: &equipment_catalog_api::state::AppState,
    user: &AuthUser,
    kind: EntityKind,
    id: &str,
) -> Uuid {
    let resp = editor_service::open_session(
        state,
        user,
        OpenSessionRequest {
            kind,
            id: id.into(),
        },
    )
    .await
    .unwrap();
    let snapshot = resp.data.unwrap();
    assert_eq!(snapshot.state, EditorState::Ready);
    snapshot.session_id
}

#[tokio::test]
async fn same_category_search_excludes_current_product() {
    let (state, store) = memory_state();
    seed_products(&store).await;
    let user = admin();
    let sid = open(&state, &user, EntityKind::Product, "p1").await;

    let snapshot = editor_service::search(
        &state,
        &user,
        sid,
        SessionSearchRequest {
            term: "c1".into(),
            scope: SearchScope::SameCategory,
            target: RefTarget::RelatedProducts,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();

    let ids: Vec<_> = snapshot.search_results.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["p2"]);
    assert_eq!(snapshot.active_target, Some(RefTarget::RelatedProducts));
}

#[tokio::test]
async fn scoped_search_without_category_fails_and_clears_results() {
    let (state, store) = memory_state();
    seed_products(&store).await;
    documents::create(store.as_ref(), &product("p4", "", "Loose Loader"))
        .await
        .unwrap();
    let user = admin();
    let sid = open(&state, &user, EntityKind::Product, "p4").await;

    let request = |scope| SessionSearchRequest {
        term: "loader".into(),
        scope,
        target: RefTarget::OtherProducts,
    };
    let found = editor_service::search(&state, &user, sid, request(SearchScope::All))
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(found.search_results.len(), 2);

    let err = editor_service::search(&state, &user, sid, request(SearchScope::SameCategory))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Edit(EditError::MissingCategory)));

    let snapshot = editor_service::get_session(&state, &user, sid)
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(snapshot.search_results.is_empty());
}

#[tokio::test]
async fn attach_detach_and_save_related_products() {
    let (state, store) = memory_state();
    seed_products(&store).await;
    let user = admin();
    let sid = open(&state, &user, EntityKind::Product, "p1").await;
    let p2 = || AttachRequest {
        target: RefTarget::RelatedProducts,
        product_id: "p2".into(),
    };

    editor_service::attach(&state, &user, sid, p2()).await.unwrap();
    let snapshot = editor_service::detach(&state, &user, sid, p2())
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(entity_product(&snapshot.entity).related_products.is_empty());

    editor_service::attach(&state, &user, sid, p2()).await.unwrap();
    editor_service::attach(
        &state,
        &user,
        sid,
        AttachRequest {
            target: RefTarget::OtherProducts,
            product_id: "p3".into(),
        },
    )
    .await
    .unwrap();
    let saved = editor_service::submit(&state, &user, sid)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(
        saved.state,
        EditorState::Saved {
            redirect_after_ms: 2000
        }
    );

    let stored: Product = documents::fetch(store.as_ref(), "p1").await.unwrap().unwrap();
    assert_eq!(stored.related_products, vec![ProductRef::new("p2")]);
    assert_eq!(stored.revision, Some(2));

    let detail = product_service::get_product_detail(&state, "p1")
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(detail.related[0].name, "Loader Two");
    assert_eq!(detail.other[0].id, "p3");
}

#[tokio::test]
async fn attaching_unknown_product_is_not_found() {
    let (state, store) = memory_state();
    seed_products(&store).await;
    let user = admin();
    let sid = open(&state, &user, EntityKind::Product, "p1").await;

    let err = editor_service::attach(
        &state,
        &user,
        sid,
        AttachRequest {
            target: RefTarget::RelatedProducts,
            product_id: "ghost".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn specification_rename_keeps_value_and_position() {
    let (state, store) = memory_state();
    let mut p1 = product("p1", "c1", "Loader One");
    p1.specification = Specification::from_entries([("Engine", SpecValue::Text("Cummins".into()))]);
    documents::create(store.as_ref(), &p1).await.unwrap();
    let user = admin();
    let sid = open(&state, &user, EntityKind::Product, "p1").await;

    for edit in [
        ProductEdit::AppendSpecification,
        ProductEdit::SetSpecificationValue {
            label: "New Specification 2".into(),
            value: SpecValue::Text("12 t".into()),
        },
        ProductEdit::AppendSpecification,
        ProductEdit::RenameSpecification {
            from: "New Specification 2".into(),
            to: "Weight".into(),
        },
    ] {
        editor_service::apply_edit(&state, &user, sid, product_edit(edit))
            .await
            .unwrap();
    }

    let snapshot = editor_service::get_session(&state, &user, sid)
        .await
        .unwrap()
        .data
        .unwrap();
    let spec = &entity_product(&snapshot.entity).specification;
    let labels: Vec<_> = spec.labels().collect();
    assert_eq!(labels, vec!["Engine", "Weight", "New Specification 3"]);
    assert_eq!(spec.get("Weight"), Some(&SpecValue::Text("12 t".into())));
    assert_eq!(snapshot.edit_count, 4);
}

#[tokio::test]
async fn invalid_edit_leaves_snapshot_unchanged() {
    let (state, store) = memory_state();
    seed_products(&store).await;
    let user = admin();
    let sid = open(&state, &user, EntityKind::Product, "p1").await;

    let err = editor_service::apply_edit(
        &state,
        &user,
        sid,
        product_edit(ProductEdit::RemoveText {
            list: TextList::Benefits,
            index: 0,
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        AppError::Edit(EditError::OutOfRange { index: 0, len: 0 })
    ));

    let snapshot = editor_service::get_session(&state, &user, sid)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(snapshot.edit_count, 0);
    assert_eq!(snapshot.state, EditorState::Ready);
}

#[tokio::test]
async fn missing_entity_reports_load_failure() {
    let (state, _store) = memory_state();
    let user = admin();
    let snapshot = editor_service::open_session(
        &state,
        &user,
        OpenSessionRequest {
            kind: EntityKind::Category,
            id: "nope".into(),
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(
        snapshot.state,
        EditorState::LoadFailed {
            failure: LoadFailure::NotFound
        }
    );
    assert!(snapshot.entity.is_none());

    let err = editor_service::get_session(&state, &user, snapshot.session_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn stale_submit_keeps_edits() {
    let (state, store) = memory_state();
    seed_products(&store).await;
    let user = admin();
    let sid = open(&state, &user, EntityKind::Product, "p1").await;

    editor_service::apply_edit(
        &state,
        &user,
        sid,
        product_edit(ProductEdit::SetDescription {
            value: "Compact loader".into(),
        }),
    )
    .await
    .unwrap();

    // Another admin saves the same product first.
    let mut other: Product = documents::fetch(store.as_ref(), "p1").await.unwrap().unwrap();
    other.rating = 3.0;
    documents::save(store.as_ref(), &other).await.unwrap();

    let err = editor_service::submit(&state, &user, sid).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let snapshot = editor_service::get_session(&state, &user, sid)
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(snapshot.state.name(), "submit_failed");
    assert_eq!(entity_product(&snapshot.entity).description, "Compact loader");

    let stored: Product = documents::fetch(store.as_ref(), "p1").await.unwrap().unwrap();
    assert_eq!(stored.description, "");
    assert_eq!(stored.rating, 3.0);
}

#[tokio::test]
async fn new_category_gets_slug_id_and_session_closes_after_delay() {
    let (state, store) = memory_state();
    seed_products(&store).await;
    let user = admin();

    let mut existing = Category::blank();
    existing.id = "wheel-loaders".into();
    existing.name = "Wheel Loaders".into();
    documents::create(store.as_ref(), &existing).await.unwrap();

    let sid = open(&state, &user, EntityKind::Category, NEW_ENTITY_ID).await;
    editor_service::apply_edit(
        &state,
        &user,
        sid,
        EntityEdit::Category(CategoryEdit::SetName {
            value: "Wheel Loaders".into(),
        }),
    )
    .await
    .unwrap();

    let scoped = editor_service::search(
        &state,
        &user,
        sid,
        SessionSearchRequest {
            term: "loader".into(),
            scope: SearchScope::SameCategory,
            target: RefTarget::Deals,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(scoped, AppError::Edit(EditError::MissingCategory)));

    editor_service::attach(
        &state,
        &user,
        sid,
        AttachRequest {
            target: RefTarget::Deals,
            product_id: "p2".into(),
        },
    )
    .await
    .unwrap();

    let saved = editor_service::submit(&state, &user, sid)
        .await
        .unwrap()
        .data
        .unwrap();
    assert!(!saved.is_new);
    let category = match saved.entity {
        Some(EditorEntity::Category(c)) => c,
        other => panic!("expected a category, got {other:?}"),
    };
    assert_eq!(category.id, "wheel-loaders-2");
    assert_eq!(category.deals[0].discount.as_deref(), Some("20% OFF"));

    let audit = store.audit_entries().await;
    assert!(audit.iter().any(|e| e.action == "category_create"));

    tokio::time::sleep(SAVED_DISPLAY_DELAY + Duration::from_millis(300)).await;
    let err = editor_service::get_session(&state, &user, sid).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn saved_entity_round_trips() {
    let (state, _store) = memory_state();
    let user = admin();

    let mut p = product("exc-200", "excavators", "Excavator 200");
    p.specification = Specification::from_entries([
        ("Weight", SpecValue::Text("20 t".into())),
        ("Buckets", SpecValue::List(vec!["0.8 m3".into(), "1.0 m3".into()])),
    ]);
    p.details.information = vec!["Tier 4 engine".into()];
    p.youtube_link = "https://www.youtube.com/watch?v=abc".into();

    let created = product_service::create_product(&state, &user, p.clone())
        .await
        .unwrap()
        .data
        .unwrap();
    let loaded = product_service::get_product(&state, "exc-200")
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(loaded, created);
    assert_eq!(
        Product {
            revision: None,
            ..loaded
        },
        p
    );
}

#[tokio::test]
async fn product_put_and_information_update() {
    let (state, store) = memory_state();
    seed_products(&store).await;
    let user = admin();

    let mut p1: Product = documents::fetch(store.as_ref(), "p1").await.unwrap().unwrap();
    p1.name = "Loader One Mk2".into();
    let updated = product_service::update_product(&state, &user, "p1", p1.clone())
        .await
        .unwrap()
        .data
        .unwrap();
    assert_eq!(updated.revision, Some(2));

    // The earlier snapshot is now stale.
    let err = product_service::update_product(&state, &user, "p1", p1)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let info = product_service::update_information(
        &state,
        &user,
        "p1",
        equipment_catalog_api::dto::products::InformationUpdate {
            information: vec!["Ships assembled".into()],
            revision: None,
        },
    )
    .await
    .unwrap()
    .data
    .unwrap();
    assert_eq!(info.details.information, vec!["Ships assembled"]);
    assert_eq!(info.name, "Loader One Mk2");

    let err = product_service::update_product(&state, &user, "ghost", product("ghost", "c1", "Ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn admin_search_honours_scope_and_exclusion() {
    let (state, store) = memory_state();
    seed_products(&store).await;
    let user = admin();

    let resp = product_service::search_products(
        &state,
        &user,
        ProductSearchQuery {
            term: "LOADER".into(),
            scope: SearchScope::SameCategory,
            category_id: Some("c1".into()),
            exclude: Some("p1".into()),
        },
    )
    .await
    .unwrap();
    let ids: Vec<_> = resp.data.unwrap().items.into_iter().map(|p| p.id).collect();
    assert_eq!(ids, vec!["p2"]);

    let err = product_service::search_products(
        &state,
        &user,
        ProductSearchQuery {
            term: "loader".into(),
            scope: SearchScope::SameCategory,
            category_id: None,
            exclude: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Edit(EditError::MissingCategory)));
}

#[tokio::test]
async fn non_admin_is_forbidden() {
    let (state, store) = memory_state();
    seed_products(&store).await;
    let viewer = AuthUser {
        user_id: Uuid::new_v4(),
        role: "viewer".into(),
    };

    let err = editor_service::open_session(
        &state,
        &viewer,
        OpenSessionRequest {
            kind: EntityKind::Product,
            id: "p1".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let mut category = Category::blank();
    category.name = "Cranes".into();
    let err = category_service::create_category(&state, &viewer, category)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

async fn state_with_session_ttl(ttl: Duration) -> AppState {
    let store = Arc::new(MemoryStore::new());
    seed_products(&store).await;
    let mut config = common::test_config();
    config.session_idle_ttl = ttl;
    AppState::new(store, config)
}

#[tokio::test]
async fn abandoned_sessions_are_evicted_on_open() {
    let state = state_with_session_ttl(Duration::from_millis(100)).await;
    let user = admin();

    for _ in 0..5 {
        open(&state, &user, EntityKind::Product, "p1").await;
    }
    assert_eq!(state.sessions.read().await.len(), 5);

    tokio::time::sleep(Duration::from_millis(150)).await;
    let sid = open(&state, &user, EntityKind::Product, "p1").await;
    assert_eq!(state.sessions.read().await.len(), 1);
    assert!(editor_service::get_session(&state, &user, sid).await.is_ok());
}

#[tokio::test]
async fn sessions_in_use_outlive_idle_ones() {
    let ttl = Duration::from_millis(300);
    let state = state_with_session_ttl(ttl).await;
    let user = admin();
    let active = open(&state, &user, EntityKind::Product, "p1").await;
    let idle = open(&state, &user, EntityKind::Product, "p2").await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    editor_service::apply_edit(&state, &user, active, product_edit(ProductEdit::AppendFaq))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(editor_service::evict_idle(&state.sessions, ttl).await, 1);
    assert!(editor_service::get_session(&state, &user, active).await.is_ok());
    let err = editor_service::get_session(&state, &user, idle).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}
