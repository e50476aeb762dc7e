use crate::catchers::*;
use crate::configuration::Settings;
use crate::dispatch::DispatchEngine;
use crate::domain::Environment;
use crate::email::Email;
use crate::environment::EnvironmentResolver;
use crate::ledger::SendLedger;
use crate::promotion::ContentPromoter;
use crate::routes::*;
use crate::template::NewsletterTemplate;
use anyhow::{anyhow, Context};
use rocket::config::LogLevel;
use rocket::fairing::AdHoc;
use rocket::{Config, Ignite, Rocket};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

/// The environment whose store backs the public site: post listing,
/// subscriptions and the subscriber list.
#[derive(Debug, Clone, Copy)]
pub struct SiteEnvironment(pub Environment);

/// Resolves to the port the server actually bound, once it is listening.
pub struct Port(oneshot::Receiver<u16>);

impl Port {
    pub async fn get(self) -> anyhow::Result<u16> {
        self.0
            .await
            .context("The server shut down before it started listening.")
    }
}

pub struct Application {
    pub server: Rocket<Ignite>,
    pub port: Port,
    pub stores: EnvironmentResolver,
}

impl Application {
    pub async fn build(
        configuration: &Settings,
        email_client: Arc<dyn Email>,
    ) -> anyhow::Result<Application> {
        let stores = EnvironmentResolver::new(&configuration.stores)?;
        for environment in [Environment::Dev, Environment::Prod] {
            stores
                .resolve(environment)
                .migrate()
                .await
                .with_context(|| format!("Failed to migrate the {} store.", environment))?;
        }

        let engine = DispatchEngine::new(
            email_client,
            NewsletterTemplate::new(configuration.newsletter.clone())
                .context("Failed to compile the newsletter templates.")?,
            &configuration.application.base_url,
        );
        let (port_sender, port) = oneshot::channel();
        let port_sender = Mutex::new(Some(port_sender));

        let server = rocket::custom(Config {
            address: configuration.application.host,
            port: configuration.application.port.unwrap_or(0),
            log_level: LogLevel::Off,
            ..Config::default()
        })
        .manage(stores.clone())
        .manage(SiteEnvironment(configuration.application.environment))
        .manage(engine)
        .manage(ContentPromoter::new(stores.clone()))
        .manage(SendLedger::new(stores.resolve(Environment::Prod)))
        .attach(AdHoc::on_liftoff("Port reporter", move |rocket| {
            let bound = rocket.config().port;
            if let Some(sender) = port_sender.lock().ok().and_then(|mut s| s.take()) {
                let _ = sender.send(bound);
            }
            Box::pin(async {})
        }))
        .mount(
            "/",
            routes![
                health_check,
                publish_newsletter,
                preview_newsletter,
                list_sends,
                promote_post,
                list_posts,
                subscribe,
                unsubscribe,
                unsubscribe_one_click,
                list_subscribers,
                export_subscribers
            ],
        )
        .register(
            "/",
            catchers![
                unprocessable_entity_to_bad_request,
                bad_request,
                not_found,
                internal_error
            ],
        )
        .ignite()
        .await
        .map_err(|e| anyhow!("Failed to ignite the server: {}", e))?;

        Ok(Application {
            server,
            port: Port(port),
            stores,
        })
    }
}
