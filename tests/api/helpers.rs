use anyhow::anyhow;
use async_trait::async_trait;
use blogcast::configuration::{get_configuration, StoreBackend, StoreSettings, StoresSettings};
use blogcast::domain::Environment;
use blogcast::email::{Email, EmailMessage};
use blogcast::environment::EnvironmentResolver;
use blogcast::models::{Post, PostDraft};
use blogcast::startup::Application;
use blogcast::telemetry::{get_subscriber, init_subscriber};
use diesel::{Connection, PgConnection, RunQueryDsl};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".into();
    let subscriber_name = "test".into();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

/// Records every message it is asked to send. Addresses in `failing` are
/// rejected the way a provider would reject them.
#[derive(Default)]
pub struct MockEmailClient {
    pub sent_emails: Mutex<Vec<EmailMessage>>,
    pub failing: Mutex<HashSet<String>>,
}

impl MockEmailClient {
    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }
}

#[async_trait]
impl Email for MockEmailClient {
    async fn send_email(&self, message: &EmailMessage) -> anyhow::Result<String> {
        if self
            .failing
            .lock()
            .unwrap()
            .contains(message.recipient.as_ref())
        {
            return Err(anyhow!("Message rejected: mailbox unavailable"));
        }
        self.sent_emails.lock().unwrap().push(message.clone());
        Ok(Uuid::new_v4().to_string())
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub email_client: Arc<MockEmailClient>,
    pub stores: EnvironmentResolver,
}

pub struct UnsubscribeLinks {
    pub html: reqwest::Url,
    pub plain_text: reqwest::Url,
}

impl TestApp {
    pub async fn post_subscriptions(&self, body: String) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/subscriptions", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_newsletters(&self, body: &serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/newsletters", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_promotions(&self, body: &serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/promotions", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(&format!("{}{}", &self.address, path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn seed_post(&self, environment: Environment, draft: PostDraft) -> Post {
        self.stores
            .resolve(environment)
            .insert_post(draft)
            .await
            .expect("Failed to seed a post.")
    }

    /// Extract the unsubscribe links from a sent newsletter, pointed at this
    /// app's random port.
    pub fn get_unsubscribe_links(&self, email: &EmailMessage) -> UnsubscribeLinks {
        let get_link = |s: &str| {
            let raw_link = linkify::LinkFinder::new()
                .links(s)
                .filter(|l| *l.kind() == linkify::LinkKind::Url)
                .map(|l| l.as_str().to_owned())
                .find(|l| l.contains("/unsubscribe"))
                .expect("No unsubscribe link in the email.");
            let mut link = reqwest::Url::parse(&raw_link).unwrap();
            assert_eq!(link.host_str().unwrap(), "127.0.0.1");
            link.set_port(Some(self.port)).unwrap();
            link
        };
        UnsubscribeLinks {
            html: get_link(&email.html_content),
            plain_text: get_link(&email.text_content),
        }
    }
}

pub fn draft(slug: &str, title: &str) -> PostDraft {
    PostDraft {
        title: title.into(),
        slug: slug.into(),
        content: "Some **markdown** content for the newsletter.".into(),
        tags: Some("rust,testing".into()),
        image_url: None,
        published: true,
    }
}

/// API tests run against in-memory stores unless `TEST_STORE=postgres`, in
/// which case each test gets fresh databases on the configured server.
pub fn postgres_enabled() -> bool {
    std::env::var("TEST_STORE")
        .map(|store| store.eq_ignore_ascii_case("postgres"))
        .unwrap_or(false)
}

/// Fresh, isolated store settings for one test: a random database name per
/// environment, created up front when running against Postgres.
pub fn test_stores(backend: StoreBackend) -> StoresSettings {
    let mut stores = get_configuration()
        .expect("Failed to read configuration.")
        .stores;
    for store in [&mut stores.dev, &mut stores.prod] {
        store.backend = backend;
        store.database_name = Uuid::new_v4().to_string();
        if backend == StoreBackend::Postgres {
            create_database(store);
        }
    }
    stores
}

fn create_database(settings: &StoreSettings) {
    let connection = PgConnection::establish(&settings.connection_string_without_database())
        .expect("Failed to connect to Postgres.");
    diesel::sql_query(format!("CREATE DATABASE \"{}\"", settings.database_name))
        .execute(&connection)
        .expect("Failed to create database.");
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let backend = if postgres_enabled() {
        StoreBackend::Postgres
    } else {
        StoreBackend::Memory
    };
    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = None;
        c.application.environment = Environment::Prod;
        c.stores = test_stores(backend);
        c
    };

    let email_client = Arc::new(MockEmailClient::default());
    let app = Application::build(&configuration, email_client.clone())
        .await
        .expect("Failed to build application.");
    let stores = app.stores.clone();
    let _ = tokio::spawn(app.server.launch());
    let port = app.port.get().await.expect("Failed to get the bound port.");
    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        port,
        email_client,
        stores,
    }
}
