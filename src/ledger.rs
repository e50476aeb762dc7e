use crate::dispatch::DispatchReport;
use crate::domain::{ContentRecord, Environment};
use crate::error::StoreError;
use crate::models::{NewSendRecord, SendRecord};
use crate::store::StoreClient;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendStatus {
    Sent,
    Partial,
    Failed,
}

impl SendStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendStatus::Sent => "sent",
            SendStatus::Partial => "partial",
            SendStatus::Failed => "failed",
        }
    }

    pub fn from_report(report: &DispatchReport) -> Self {
        match (report.sent, report.failed) {
            (_, 0) => SendStatus::Sent,
            (0, _) => SendStatus::Failed,
            _ => SendStatus::Partial,
        }
    }
}

/// Which post a send was about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRef {
    pub post_id: Option<uuid::Uuid>,
    pub title: String,
    pub slug: String,
}

impl From<&ContentRecord> for ContentRef {
    fn from(record: &ContentRecord) -> Self {
        Self {
            post_id: record.id,
            title: record.title.clone(),
            slug: record.slug.clone(),
        }
    }
}

/// Append-only history of dispatch batches.
pub struct SendLedger {
    store: Arc<dyn StoreClient>,
}

impl SendLedger {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }

    #[tracing::instrument(
        name = "Append a send record",
        skip(self, content),
        fields(post_slug = %content.slug)
    )]
    pub async fn append(
        &self,
        content: ContentRef,
        recipient_count: usize,
        environment: Environment,
        status: SendStatus,
    ) -> Result<SendRecord, StoreError> {
        let subscriber_count = i32::try_from(recipient_count).map_err(|_| {
            StoreError::Constraint(format!(
                "{} recipients do not fit in a send record",
                recipient_count
            ))
        })?;
        self.store
            .append_send_record(NewSendRecord {
                id: uuid::Uuid::new_v4(),
                post_id: content.post_id,
                post_title: content.title,
                post_slug: content.slug,
                subscriber_count,
                environment: environment.as_str().to_string(),
                status: status.as_str().to_string(),
                sent_at: Utc::now(),
            })
            .await
    }

    /// Like [`append`](Self::append), but a failure is logged and dropped.
    /// The batch it describes has already been delivered.
    pub async fn record(
        &self,
        content: ContentRef,
        recipient_count: usize,
        environment: Environment,
        status: SendStatus,
    ) -> Option<SendRecord> {
        match self
            .append(content, recipient_count, environment, status)
            .await
        {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to record the newsletter send"
                );
                None
            }
        }
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<SendRecord>, StoreError> {
        self.store.recent_send_records(limit).await
    }
}
