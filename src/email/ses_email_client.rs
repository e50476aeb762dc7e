use crate::configuration::EmailClientSettings;
use crate::email::{Email, EmailMessage};
use crate::error::ConfigurationError;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use aws_sdk_sesv2 as ses;
use aws_sdk_sesv2::model::{Destination, EmailContent, MessageTag, RawMessage};
use aws_sdk_sesv2::Blob;
use lettre::message::header::{ContentType, HeaderName, HeaderValue};
use lettre::message::{Mailbox, Message, MultiPart, SinglePart};

pub struct SesEmailClient {
    ses_client: ses::Client,
    from_address: String,
}

impl SesEmailClient {
    pub fn new(ses_client: ses::Client, from_address: String) -> Self {
        Self {
            ses_client,
            from_address,
        }
    }

    /// Builds the client from the ambient AWS credential chain.
    pub async fn from_settings(
        settings: &EmailClientSettings,
    ) -> Result<Self, ConfigurationError> {
        let from_address = settings.from_address()?;
        let shared_config = aws_config::load_from_env().await;
        Ok(Self::new(ses::Client::new(&shared_config), from_address))
    }
}

/// Assemble `message` as a multipart/alternative MIME document. SES only
/// forwards custom headers for raw content, so the whole message is built
/// here rather than through the simple content API.
fn mime_message(from_address: &str, message: &EmailMessage) -> anyhow::Result<Vec<u8>> {
    let from: Mailbox = from_address
        .parse()
        .with_context(|| format!("Invalid sender address {}", from_address))?;
    let to: Mailbox = message
        .recipient
        .as_ref()
        .parse()
        .with_context(|| format!("Invalid recipient address {}", message.recipient.as_ref()))?;

    let mut builder = Message::builder()
        .from(from)
        .to(to)
        .subject(&message.subject);
    for header in &message.headers {
        let name = HeaderName::new_from_ascii(header.name.clone())
            .map_err(|_| anyhow!("Invalid header name {}", header.name))?;
        builder = builder.raw_header(HeaderValue::new(name, header.value.clone()));
    }

    let email = builder
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(message.text_content.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(message.html_content.clone()),
                ),
        )
        .context("Failed to assemble the MIME message.")?;
    Ok(email.formatted())
}

#[async_trait]
impl Email for SesEmailClient {
    async fn send_email(&self, message: &EmailMessage) -> anyhow::Result<String> {
        let raw = RawMessage::builder()
            .data(Blob::new(mime_message(&self.from_address, message)?))
            .build();
        let content = EmailContent::builder().raw(raw).build();
        let destination = Destination::builder()
            .to_addresses(message.recipient.as_ref())
            .build();

        let mut request = self
            .ses_client
            .send_email()
            .from_email_address(&self.from_address)
            .destination(destination)
            .content(content);
        for tag in &message.tags {
            request = request.email_tags(
                MessageTag::builder()
                    .name(&tag.name)
                    .value(&tag.value)
                    .build(),
            );
        }

        let output = request.send().await?;
        output
            .message_id
            .ok_or_else(|| anyhow!("SES accepted the email without returning a message id."))
    }
}
