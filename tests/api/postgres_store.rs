//! Store behaviour that only a real database enforces. Skipped unless
//! `TEST_STORE=postgres`.
use crate::helpers::{draft, postgres_enabled, test_stores};
use blogcast::configuration::StoreBackend;
use blogcast::domain::{Environment, SubscriberEmail};
use blogcast::environment::EnvironmentResolver;
use blogcast::error::StoreError;
use blogcast::models::NewSubscriber;
use blogcast::promotion::{ContentPromoter, PromotionOutcome};
use blogcast::store::{PgStore, StoreClient};

async fn postgres_stores() -> Option<EnvironmentResolver> {
    if !postgres_enabled() {
        return None;
    }
    let stores = EnvironmentResolver::new(&test_stores(StoreBackend::Postgres))
        .expect("Failed to resolve the test stores.");
    for environment in [Environment::Dev, Environment::Prod] {
        stores
            .resolve(environment)
            .migrate()
            .await
            .expect("Failed to migrate the database.");
    }
    Some(stores)
}

async fn postgres_store() -> Option<PgStore> {
    if !postgres_enabled() {
        return None;
    }
    let store = PgStore::new(&test_stores(StoreBackend::Postgres).prod);
    store.migrate().await.expect("Failed to migrate the database.");
    Some(store)
}

#[tokio::test]
async fn promoting_twice_updates_the_same_postgres_row() {
    // arrange
    let stores = match postgres_stores().await {
        Some(stores) => stores,
        None => return,
    };
    let dev = stores.resolve(Environment::Dev);
    let prod = stores.resolve(Environment::Prod);
    let source = dev.insert_post(draft("foo", "Old")).await.unwrap();
    let promoter = ContentPromoter::new(stores.clone());

    // act
    let first = promoter
        .promote_slug("foo", Environment::Dev, Environment::Prod)
        .await
        .unwrap();
    let mut edited = draft("foo", "New");
    edited.tags = None;
    dev.update_post(source.id, edited).await.unwrap();
    let second = promoter
        .promote_slug("foo", Environment::Dev, Environment::Prod)
        .await
        .unwrap();

    // assert
    assert_eq!(first.outcome, PromotionOutcome::Inserted);
    assert_eq!(second.outcome, PromotionOutcome::Updated);
    assert_eq!(first.post.id, second.post.id);
    assert_ne!(second.post.id, source.id);
    assert_eq!(second.post.created_at, first.post.created_at);

    let promoted = prod.published_posts(20).await.unwrap();
    assert_eq!(promoted.len(), 1);
    assert_eq!(promoted[0].title, "New");
    assert_eq!(promoted[0].tags, None);
}

#[tokio::test]
async fn duplicate_slugs_violate_the_unique_constraint() {
    // arrange
    let store = match postgres_store().await {
        Some(store) => store,
        None => return,
    };
    store.insert_post(draft("dup", "First")).await.unwrap();

    // act
    let result = store.insert_post(draft("dup", "Second")).await;

    // assert
    assert!(matches!(result, Err(StoreError::Constraint(_))));
}

#[tokio::test]
async fn duplicate_subscriber_emails_violate_the_unique_constraint() {
    // arrange
    let store = match postgres_store().await {
        Some(store) => store,
        None => return,
    };
    let email = SubscriberEmail::parse("ursula_le_guin@gmail.com".into()).unwrap();
    store
        .insert_subscriber(NewSubscriber::new(&email, "website"))
        .await
        .unwrap();

    // act
    let result = store
        .insert_subscriber(NewSubscriber::new(&email, "import"))
        .await;

    // assert
    assert!(matches!(result, Err(StoreError::Constraint(_))));
    assert_eq!(store.active_subscribers().await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_rows_map_to_not_found() {
    // arrange
    let store = match postgres_store().await {
        Some(store) => store,
        None => return,
    };

    // act
    let result = store.update_post(uuid::Uuid::new_v4(), draft("ghost", "Ghost")).await;

    // assert
    assert!(matches!(result, Err(StoreError::NotFound)));
}
