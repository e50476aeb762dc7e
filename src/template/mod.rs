//! Newsletter rendering.
//!
//! Both bodies are tera templates compiled into the binary. The HTML one is
//! autoescaped; only URLs built here or taken from the configuration are
//! marked `safe`.
//!
//! [`NewsletterTemplate::render`] is a pure function of the record, the
//! delivery context and the configured [`Branding`]: it reads no clock and no
//! global state, so rendering the same inputs twice yields identical bytes.

mod body;

pub use body::{excerpt, extract_body, find_body, BODY_SOURCES, EXCERPT_LENGTH, FALLBACK_BODY};

use crate::domain::ContentRecord;
use crate::error::{InputError, RenderError};
use chrono::Datelike;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tera::{Context, Tera};

/// Tags beyond this many are left out of the HTML header chips.
pub const MAX_HTML_TAGS: usize = 2;

const HTML_TEMPLATE: &str = "newsletter.html";
const TEXT_TEMPLATE: &str = "newsletter.txt";

/// Matches `encodeURIComponent`: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SocialLink {
    pub label: String,
    pub url: String,
}

/// The newsletter's fixed identity, shared by every message.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Branding {
    pub name: String,
    pub tagline: String,
    pub author: String,
    pub contact_email: String,
    #[serde(default)]
    pub social_links: Vec<SocialLink>,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            name: "The Newsletter".into(),
            tagline: "Fresh posts delivered to your inbox".into(),
            author: "The Author".into(),
            contact_email: "hello@example.com".into(),
            social_links: Vec::new(),
        }
    }
}

/// Where links in a message point, and who it is addressed to.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryContext {
    pub canonical_url: String,
    pub unsubscribe_url: String,
    pub site_url: String,
    pub recipient_address: Option<String>,
}

impl DeliveryContext {
    pub fn for_post(site_url: &str, slug: &str, recipient_address: Option<&str>) -> Self {
        let site_url = site_url.trim_end_matches('/');
        Self {
            canonical_url: format!(
                "{}/blog/{}",
                site_url,
                utf8_percent_encode(slug, URI_COMPONENT)
            ),
            unsubscribe_url: format!("{}/unsubscribe", site_url),
            site_url: site_url.to_string(),
            recipient_address: recipient_address.map(str::to_string),
        }
    }

    /// The unsubscribe URL, personalised with the recipient's address when
    /// there is one.
    pub fn unsubscribe_link(&self) -> String {
        match &self.recipient_address {
            Some(address) => format!(
                "{}?email={}",
                self.unsubscribe_url,
                utf8_percent_encode(address, URI_COMPONENT)
            ),
            None => self.unsubscribe_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RenderedMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub struct NewsletterTemplate {
    branding: Branding,
    engine: Tera,
}

impl NewsletterTemplate {
    pub fn new(branding: Branding) -> Result<Self, tera::Error> {
        let mut engine = Tera::default();
        engine.add_raw_templates(vec![
            (
                HTML_TEMPLATE,
                include_str!("../../templates/newsletter.html"),
            ),
            (TEXT_TEMPLATE, include_str!("../../templates/newsletter.txt")),
        ])?;
        Ok(Self { branding, engine })
    }

    pub fn render(
        &self,
        record: Option<&ContentRecord>,
        context: &DeliveryContext,
    ) -> Result<RenderedMessage, RenderError> {
        let record = record.ok_or(InputError::MissingRecord)?;
        let view = self.view(record, context);

        Ok(RenderedMessage {
            subject: subject(record),
            html: self.render_one(HTML_TEMPLATE, &view)?,
            text: self.render_one(TEXT_TEMPLATE, &view)?,
        })
    }

    fn render_one(&self, template: &'static str, view: &Context) -> Result<String, RenderError> {
        self.engine
            .render(template, view)
            .map_err(|e| RenderError::Template(template, e))
    }

    /// Everything either body displays, computed once so the two stay in sync.
    fn view(&self, record: &ContentRecord, context: &DeliveryContext) -> Context {
        let branding = &self.branding;
        let tags = record.tag_list();
        let heading = branding.name.to_uppercase();
        let initial = branding
            .name
            .chars()
            .find(|c| c.is_alphanumeric())
            .map(|c| c.to_uppercase().collect::<String>())
            .unwrap_or_default();

        let mut view = Context::new();
        view.insert("brand_name", &branding.name);
        view.insert("brand_initial", &initial);
        view.insert("heading_rule", &"=".repeat(heading.chars().count()));
        view.insert("heading", &heading);
        view.insert("tagline", &branding.tagline);
        view.insert("author", &branding.author);
        view.insert("contact_email", &branding.contact_email);
        view.insert("social_links", &branding.social_links);

        view.insert("title", record.title.trim());
        view.insert(
            "published_on",
            &record
                .created_at
                .map(|created_at| created_at.format("%B %-d, %Y").to_string()),
        );
        view.insert(
            "chip_tags",
            &tags.iter().take(MAX_HTML_TAGS).collect::<Vec<_>>(),
        );
        view.insert("tags", &tags);
        view.insert("cover_image", &record.cover_image());
        view.insert("excerpt", &excerpt(extract_body(record)));
        view.insert(
            "copyright_year",
            &record.created_at.map(|created_at| created_at.year()),
        );

        view.insert("canonical_url", &context.canonical_url);
        view.insert("site_url", &context.site_url);
        view.insert("unsubscribe_url", &context.unsubscribe_link());
        view
    }
}

pub fn subject(record: &ContentRecord) -> String {
    format!("📝 New Post: {}", record.title.trim())
}
