//! Environment-scoped content stores.
//!
//! Every environment tag is bound to one [`StoreClient`]. The concrete client
//! is chosen once, by [`connect`], from the store's configured backend.

mod in_memory;
mod postgres;

use crate::configuration::{StoreBackend, StoreSettings};
use crate::domain::SubscriberEmail;
use crate::error::StoreError;
use crate::models::{NewSendRecord, NewSubscriber, Post, PostDraft, SendRecord, Subscriber};
use async_trait::async_trait;
pub use in_memory::InMemoryStore;
pub use postgres::PgStore;
use std::sync::Arc;

#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Bring the store's schema up to date. A no-op for stores without one.
    async fn migrate(&self) -> Result<(), StoreError>;

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError>;

    async fn insert_post(&self, draft: PostDraft) -> Result<Post, StoreError>;

    /// Overwrite the content fields of the post identified by `id`, keeping its
    /// identity, slug and creation time.
    async fn update_post(&self, id: uuid::Uuid, draft: PostDraft) -> Result<Post, StoreError>;

    /// Published posts, newest first.
    async fn published_posts(&self, limit: i64) -> Result<Vec<Post>, StoreError>;

    async fn find_subscriber(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, StoreError>;

    async fn insert_subscriber(&self, subscriber: NewSubscriber)
        -> Result<Subscriber, StoreError>;

    /// Returns `false` if no subscriber has that address.
    async fn set_subscriber_active(
        &self,
        email: &SubscriberEmail,
        is_active: bool,
    ) -> Result<bool, StoreError>;

    /// Active subscribers, most recent first.
    async fn active_subscribers(&self) -> Result<Vec<Subscriber>, StoreError>;

    async fn append_send_record(&self, record: NewSendRecord) -> Result<SendRecord, StoreError>;

    /// Send history, most recent first.
    async fn recent_send_records(&self, limit: i64) -> Result<Vec<SendRecord>, StoreError>;
}

/// Build the client for one store. Never opens a connection: Postgres pools
/// connect lazily on first use.
pub fn connect(settings: &StoreSettings) -> Arc<dyn StoreClient> {
    match settings.backend {
        StoreBackend::Postgres => Arc::new(PgStore::new(settings)),
        StoreBackend::Memory => Arc::new(InMemoryStore::new(settings.endpoint())),
    }
}
