mod ses_email_client;

use crate::domain::SubscriberEmail;
use async_trait::async_trait;
pub use ses_email_client::SesEmailClient;

/// A provider-side label attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTag {
    pub name: String,
    pub value: String,
}

impl EmailTag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// An extra MIME header, such as `List-Unsubscribe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailHeader {
    pub name: String,
    pub value: String,
}

impl EmailHeader {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub recipient: SubscriberEmail,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
    pub headers: Vec<EmailHeader>,
    pub tags: Vec<EmailTag>,
}

impl EmailMessage {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }
}

/// The outbound mail transport. Returns the provider's message id.
#[async_trait]
pub trait Email: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> Result<String, anyhow::Error>;
}
