//! Bulk newsletter delivery.
//!
//! A dispatch renders and sends one message per recipient. Every send runs in
//! its own task and the batch waits for all of them to settle: a failure for
//! one recipient is recorded in the report and never cancels or delays the
//! others.
//!
//! Recipients are taken as given. There is no de-duplication and no batch
//! idempotency key, so dispatching the same post to the same list twice sends
//! every message twice.

use crate::domain::{ContentRecord, Environment, SubscriberEmail};
use crate::email::{Email, EmailHeader, EmailMessage, EmailTag};
use crate::error::{error_chain_fmt, InputError, RenderError};
use crate::template::{DeliveryContext, NewsletterTemplate, RenderedMessage};
use anyhow::Context;
use futures::future::join_all;
use std::sync::Arc;

/// The address previews are rendered for.
pub const PREVIEW_ADDRESS: &str = "preview@example.com";

#[derive(thiserror::Error)]
pub enum DispatchError {
    #[error("No subscribers provided")]
    EmptyRecipients,
    #[error(transparent)]
    InvalidInput(#[from] InputError),
}

impl std::fmt::Debug for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    Sent,
    Failed,
}

/// The settled outcome of delivering to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DispatchAttempt {
    pub email: String,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchAttempt {
    fn sent(email: String, id: String) -> Self {
        Self {
            email,
            status: AttemptStatus::Sent,
            id: Some(id),
            error: None,
        }
    }

    fn failed(email: String, error: String) -> Self {
        Self {
            email,
            status: AttemptStatus::Failed,
            id: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
    /// One entry per recipient, in input order.
    pub details: Vec<DispatchAttempt>,
}

impl DispatchReport {
    fn from_attempts(details: Vec<DispatchAttempt>) -> Self {
        let sent = details
            .iter()
            .filter(|attempt| attempt.status == AttemptStatus::Sent)
            .count();
        Self {
            sent,
            failed: details.len() - sent,
            total: details.len(),
            details,
        }
    }
}

pub struct DispatchEngine {
    email_client: Arc<dyn Email>,
    template: Arc<NewsletterTemplate>,
    site_url: Arc<str>,
}

impl DispatchEngine {
    pub fn new(email_client: Arc<dyn Email>, template: NewsletterTemplate, site_url: &str) -> Self {
        Self {
            email_client,
            template: Arc::new(template),
            site_url: Arc::from(site_url.trim_end_matches('/')),
        }
    }

    /// Render `record` for [`PREVIEW_ADDRESS`] without sending anything.
    pub fn preview(&self, record: Option<&ContentRecord>) -> Result<RenderedMessage, RenderError> {
        let record = record.ok_or(InputError::MissingRecord)?;
        let context = DeliveryContext::for_post(&self.site_url, &record.slug, Some(PREVIEW_ADDRESS));
        self.template.render(Some(record), &context)
    }

    #[tracing::instrument(
        name = "Dispatch newsletter",
        skip(self, record, recipients),
        fields(
            post_slug = tracing::field::Empty,
            recipients = recipients.len(),
            environment = %environment
        )
    )]
    pub async fn dispatch(
        &self,
        record: Option<&ContentRecord>,
        recipients: &[String],
        environment: Environment,
    ) -> Result<DispatchReport, DispatchError> {
        if recipients.is_empty() {
            return Err(DispatchError::EmptyRecipients);
        }
        let record = Arc::new(record.ok_or(InputError::MissingRecord)?.clone());
        tracing::Span::current().record("post_slug", &tracing::field::display(&record.slug));

        let handles: Vec<_> = recipients
            .iter()
            .map(|address| {
                let delivery = Delivery {
                    email_client: Arc::clone(&self.email_client),
                    template: Arc::clone(&self.template),
                    site_url: Arc::clone(&self.site_url),
                    record: Arc::clone(&record),
                    environment,
                };
                tokio::spawn(delivery.run(address.clone()))
            })
            .collect();

        // join_all waits on every handle; a failed or panicked task never
        // cancels its siblings.
        let details = join_all(handles)
            .await
            .into_iter()
            .zip(recipients)
            .map(|(joined, address)| match joined {
                Ok(attempt) => attempt,
                Err(e) => DispatchAttempt::failed(
                    address.clone(),
                    format!("The delivery task did not complete: {}", e),
                ),
            })
            .collect();

        let report = DispatchReport::from_attempts(details);
        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            total = report.total,
            "Newsletter dispatch settled"
        );
        Ok(report)
    }
}

/// Everything one per-recipient task owns.
struct Delivery {
    email_client: Arc<dyn Email>,
    template: Arc<NewsletterTemplate>,
    site_url: Arc<str>,
    record: Arc<ContentRecord>,
    environment: Environment,
}

impl Delivery {
    async fn run(self, address: String) -> DispatchAttempt {
        match self.send(&address).await {
            Ok(id) => DispatchAttempt::sent(address, id),
            Err(e) => {
                tracing::warn!(
                    error.cause_chain = ?e,
                    recipient = %address,
                    "Failed to deliver the newsletter to a recipient"
                );
                DispatchAttempt::failed(address, format!("{:#}", e))
            }
        }
    }

    async fn send(&self, address: &str) -> Result<String, anyhow::Error> {
        let recipient = SubscriberEmail::parse(address.to_string()).map_err(anyhow::Error::msg)?;
        let context =
            DeliveryContext::for_post(&self.site_url, &self.record.slug, Some(recipient.as_ref()));
        let rendered = self.template.render(Some(self.record.as_ref()), &context)?;
        let message = EmailMessage {
            recipient,
            subject: rendered.subject,
            html_content: rendered.html,
            text_content: rendered.text,
            headers: vec![
                EmailHeader::new(
                    "List-Unsubscribe",
                    format!("<{}>", context.unsubscribe_link()),
                ),
                EmailHeader::new("List-Unsubscribe-Post", "List-Unsubscribe=One-Click"),
            ],
            tags: vec![
                EmailTag::new("campaign", "newsletter"),
                EmailTag::new("environment", self.environment.as_str()),
                EmailTag::new("post_slug", self.record.slug.clone()),
            ],
        };
        self.email_client
            .send_email(&message)
            .await
            .with_context(|| format!("Failed to send newsletter issue to {}", address))
    }
}
