use super::StoreClient;
use crate::domain::SubscriberEmail;
use crate::error::StoreError;
use crate::models::{
    NewPost, NewSendRecord, NewSubscriber, Post, PostChanges, PostDraft, SendRecord, Subscriber,
};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

/// A process-local store with the same uniqueness rules as the Postgres
/// schema. Backs local runs and tests.
pub struct InMemoryStore {
    endpoint: String,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    posts: Vec<Post>,
    subscribers: Vec<Subscriber>,
    sends: Vec<SendRecord>,
}

impl InMemoryStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Connection(anyhow!("{} is poisoned", self.endpoint)))
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn migrate(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, StoreError> {
        let state = self.state()?;
        Ok(state.posts.iter().find(|post| post.slug == slug).cloned())
    }

    async fn insert_post(&self, draft: PostDraft) -> Result<Post, StoreError> {
        let mut state = self.state()?;
        if state.posts.iter().any(|post| post.slug == draft.slug) {
            return Err(StoreError::Constraint(format!(
                "duplicate key value violates unique constraint \"posts_slug_key\" ({})",
                draft.slug
            )));
        }
        let post: Post = NewPost::from_draft(draft, Utc::now()).into();
        state.posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: uuid::Uuid, draft: PostDraft) -> Result<Post, StoreError> {
        let mut state = self.state()?;
        let post = state
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(StoreError::NotFound)?;
        PostChanges::from_draft(draft, Utc::now()).apply_to(post);
        Ok(post.clone())
    }

    async fn published_posts(&self, limit: i64) -> Result<Vec<Post>, StoreError> {
        let state = self.state()?;
        let mut posts: Vec<Post> = state
            .posts
            .iter()
            .rev()
            .filter(|post| post.published)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit.max(0) as usize);
        Ok(posts)
    }

    async fn find_subscriber(
        &self,
        email: &SubscriberEmail,
    ) -> Result<Option<Subscriber>, StoreError> {
        let state = self.state()?;
        Ok(state
            .subscribers
            .iter()
            .find(|subscriber| subscriber.email == email.as_ref())
            .cloned())
    }

    async fn insert_subscriber(
        &self,
        subscriber: NewSubscriber,
    ) -> Result<Subscriber, StoreError> {
        let mut state = self.state()?;
        if state.subscribers.iter().any(|s| s.email == subscriber.email) {
            return Err(StoreError::Constraint(format!(
                "duplicate key value violates unique constraint \"newsletter_subscribers_email_key\" ({})",
                subscriber.email
            )));
        }
        let subscriber: Subscriber = subscriber.into();
        state.subscribers.push(subscriber.clone());
        Ok(subscriber)
    }

    async fn set_subscriber_active(
        &self,
        email: &SubscriberEmail,
        is_active: bool,
    ) -> Result<bool, StoreError> {
        let mut state = self.state()?;
        match state
            .subscribers
            .iter_mut()
            .find(|subscriber| subscriber.email == email.as_ref())
        {
            Some(subscriber) => {
                subscriber.is_active = is_active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn active_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        let state = self.state()?;
        let mut subscribers: Vec<Subscriber> = state
            .subscribers
            .iter()
            .rev()
            .filter(|subscriber| subscriber.is_active)
            .cloned()
            .collect();
        subscribers.sort_by(|a, b| b.subscribed_at.cmp(&a.subscribed_at));
        Ok(subscribers)
    }

    async fn append_send_record(&self, record: NewSendRecord) -> Result<SendRecord, StoreError> {
        let mut state = self.state()?;
        let record: SendRecord = record.into();
        state.sends.push(record.clone());
        Ok(record)
    }

    async fn recent_send_records(&self, limit: i64) -> Result<Vec<SendRecord>, StoreError> {
        let state = self.state()?;
        // Reverse first so entries sharing a timestamp stay newest first.
        let mut sends: Vec<SendRecord> = state.sends.iter().rev().cloned().collect();
        sends.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        sends.truncate(limit.max(0) as usize);
        Ok(sends)
    }
}
