use super::StoreClient;
use crate::configuration::StoreSettings;
use crate::domain::SubscriberEmail;
use crate::error::StoreError;
use crate::models::{
    NewPost, NewSendRecord, NewSubscriber, Post, PostChanges, PostDraft, SendRecord, Subscriber,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::DatabaseErrorKind;
use std::time::Duration;

embed_migrations!("migrations");

type PgPool = Pool<ConnectionManager<PgConnection>>;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(settings: &StoreSettings) -> Self {
        let manager = ConnectionManager::<PgConnection>::new(settings.connection_string());
        let pool = Pool::builder()
            .connection_timeout(Duration::from_secs(5))
            .build_unchecked(manager);
        Self { pool }
    }

    /// Diesel is synchronous; every query runs on the blocking pool with its
    /// own pooled connection.
    async fn run<F, T>(&self, query: F) -> Result<T, StoreError>
    where
        F: FnOnce(&PgConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| StoreError::Connection(anyhow::Error::new(e)))?;
            query(&*conn)
        })
        .await
        .map_err(|e| StoreError::Connection(anyhow::Error::new(e)))?
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => StoreError::NotFound,
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Constraint(info.message().to_string())
            }
            other => StoreError::Query(anyhow::Error::new(other)),
        }
    }
}

#[async_trait]
impl StoreClient for PgStore {
    #[tracing::instrument(name = "Run pending store migrations", skip(self))]
    async fn migrate(&self) -> Result<(), StoreError> {
        self.run(|conn| {
            embedded_migrations::run(conn)
                .map_err(|e| StoreError::Query(anyhow!("Failed to run migrations: {}", e)))
        })
        .await
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        use crate::schema::posts;
        let slug = slug.to_string();
        self.run(move |conn| {
            Ok(posts::table
                .filter(posts::slug.eq(slug))
                .first::<Post>(conn)
                .optional()?)
        })
        .await
    }

    async fn insert_post(&self, draft: PostDraft) -> Result<Post, StoreError> {
        use crate::schema::posts;
        let new_post = NewPost::from_draft(draft, Utc::now());
        self.run(move |conn| {
            Ok(diesel::insert_into(posts::table)
                .values(&new_post)
                .get_result::<Post>(conn)?)
        })
        .await
    }

    async fn update_post(&self, id: uuid::Uuid, draft: PostDraft) -> Result<Post, StoreError> {
        use crate::schema::posts;
        let changes = PostChanges::from_draft(draft, Utc::now());
        self.run(move |conn| {
            Ok(diesel::update(posts::table.find(id))
                .set(&changes)
                .get_result::<Post>(conn)?)
        })
        .await
    }

    async fn published_posts(&self, limit: i64) -> Result<Vec<Post>, StoreError> {
        use crate::schema::posts;
        self.run(move |conn| {
            Ok(posts::table
                .filter(posts::published.eq(true))
                .order(posts::created_at.desc())
                .limit(limit)
                .load::<Post>(conn)?)
        })
        .await
    }

    async fn find_subscriber(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, StoreError> {
        use crate::schema::newsletter_subscribers as subs;
        let email = email.as_ref().to_string();
        self.run(move |conn| {
            Ok(subs::table
                .filter(subs::email.eq(email))
                .first::<Subscriber>(conn)
                .optional()?)
        })
        .await
    }

    async fn insert_subscriber(
        &self,
        subscriber: NewSubscriber,
    ) -> Result<Subscriber, StoreError> {
        use crate::schema::newsletter_subscribers as subs;
        self.run(move |conn| {
            Ok(diesel::insert_into(subs::table)
                .values(&subscriber)
                .get_result::<Subscriber>(conn)?)
        })
        .await
    }

    async fn set_subscriber_active(
        &self,
        email: &SubscriberEmail,
        is_active: bool,
    ) -> Result<bool, StoreError> {
        use crate::schema::newsletter_subscribers as subs;
        let email = email.as_ref().to_string();
        self.run(move |conn| {
            let updated = diesel::update(subs::table.filter(subs::email.eq(email)))
                .set(subs::is_active.eq(is_active))
                .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn active_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        use crate::schema::newsletter_subscribers as subs;
        self.run(|conn| {
            Ok(subs::table
                .filter(subs::is_active.eq(true))
                .order(subs::subscribed_at.desc())
                .load::<Subscriber>(conn)?)
        })
        .await
    }

    async fn append_send_record(&self, record: NewSendRecord) -> Result<SendRecord, StoreError> {
        use crate::schema::newsletter_sends as sends;
        self.run(move |conn| {
            Ok(diesel::insert_into(sends::table)
                .values(&record)
                .get_result::<SendRecord>(conn)?)
        })
        .await
    }

    async fn recent_send_records(&self, limit: i64) -> Result<Vec<SendRecord>, StoreError> {
        use crate::schema::newsletter_sends as sends;
        self.run(move |conn| {
            Ok(sends::table
                .order(sends::sent_at.desc())
                .limit(limit)
                .load::<SendRecord>(conn)?)
        })
        .await
    }
}
