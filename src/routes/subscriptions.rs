use crate::domain::SubscriberEmail;
use crate::environment::EnvironmentResolver;
use crate::error::{error_chain_fmt, StoreError};
use crate::models::NewSubscriber;
use crate::routes::json_error;
use crate::startup::SiteEnvironment;
use crate::store::StoreClient;
use anyhow::Context;
use rocket::form::Form;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::{Request, State};
use uuid::Uuid;

const SUBSCRIPTION_SOURCE: &str = "website";

#[derive(FromForm)]
pub struct FormData {
    email: String,
}

#[tracing::instrument(
    name = "Adding a new subscriber",
    skip(form, stores, site),
    fields(
        request_id = %Uuid::new_v4(),
        subscriber_email = %form.email
    )
)]
#[post("/subscriptions", data = "<form>")]
pub async fn subscribe(
    form: Form<FormData>,
    stores: &State<EnvironmentResolver>,
    site: &State<SiteEnvironment>,
) -> Result<(), SubscribeError> {
    let email = SubscriberEmail::parse(form.into_inner().email)
        .map_err(SubscribeError::ValidationError)?;
    let store = stores.resolve(site.0);

    let existing = store
        .find_subscriber(&email)
        .await
        .context("Failed to look up the subscriber.")?;
    match existing {
        Some(subscriber) if subscriber.is_active => {
            tracing::info!("Already subscribed");
        }
        Some(_) => {
            store
                .set_subscriber_active(&email, true)
                .await
                .context("Failed to reactivate the subscriber.")?;
        }
        None => insert_subscriber(store.as_ref(), &email).await?,
    }
    Ok(())
}

#[tracing::instrument(name = "Saving new subscriber details", skip(store, email))]
async fn insert_subscriber(
    store: &dyn StoreClient,
    email: &SubscriberEmail,
) -> Result<(), SubscribeError> {
    match store
        .insert_subscriber(NewSubscriber::new(email, SUBSCRIPTION_SOURCE))
        .await
    {
        Ok(_) => Ok(()),
        // A concurrent request subscribed the same address first.
        Err(StoreError::Constraint(_)) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)
            .context("Failed to insert the new subscriber.")
            .into()),
    }
}

#[tracing::instrument(name = "Unsubscribe a reader", skip(email, stores, site))]
#[get("/unsubscribe?<email>")]
pub async fn unsubscribe(
    email: Option<String>,
    stores: &State<EnvironmentResolver>,
    site: &State<SiteEnvironment>,
) -> Result<&'static str, SubscribeError> {
    deactivate(email, stores, site).await
}

/// RFC 8058 one-click unsubscribe: mail clients POST
/// `List-Unsubscribe=One-Click` to the `List-Unsubscribe` URL, which already
/// carries the address.
#[tracing::instrument(name = "One-click unsubscribe", skip(email, stores, site))]
#[post("/unsubscribe?<email>")]
pub async fn unsubscribe_one_click(
    email: Option<String>,
    stores: &State<EnvironmentResolver>,
    site: &State<SiteEnvironment>,
) -> Result<&'static str, SubscribeError> {
    deactivate(email, stores, site).await
}

async fn deactivate(
    email: Option<String>,
    stores: &EnvironmentResolver,
    site: &SiteEnvironment,
) -> Result<&'static str, SubscribeError> {
    let email = email.ok_or(SubscribeError::MissingEmail)?;
    let email = SubscriberEmail::parse(email).map_err(SubscribeError::ValidationError)?;

    let found = stores
        .resolve(site.0)
        .set_subscriber_active(&email, false)
        .await
        .context("Failed to deactivate the subscriber.")?;
    match found {
        true => Ok("You have been unsubscribed."),
        false => Err(SubscribeError::UnknownSubscriber),
    }
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("An email address is required.")]
    MissingEmail,
    #[error("No subscriber has that email address.")]
    UnknownSubscriber,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl<'r> Responder<'r, 'static> for SubscribeError {
    fn respond_to(self, request: &'r Request<'_>) -> rocket::response::Result<'static> {
        tracing::warn!("SubscribeError: {:?}", self);
        let status = match self {
            SubscribeError::ValidationError(_) | SubscribeError::MissingEmail => {
                Status::BadRequest
            }
            SubscribeError::UnknownSubscriber => Status::NotFound,
            SubscribeError::UnexpectedError(_) => Status::InternalServerError,
        };
        json_error(request, status, self.to_string())
    }
}
