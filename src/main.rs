use blogcast::configuration::get_configuration;
use blogcast::email::SesEmailClient;
use blogcast::startup::Application;
use blogcast::telemetry::{get_subscriber, init_subscriber};
use std::sync::Arc;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("blogcast".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration()?;
    let email_client = SesEmailClient::from_settings(&configuration.email_client).await?;
    let application = Application::build(&configuration, Arc::new(email_client)).await?;
    application
        .server
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("The server stopped unexpectedly: {}", e))?;
    Ok(())
}
