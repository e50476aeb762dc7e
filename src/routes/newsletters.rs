use crate::dispatch::{DispatchEngine, DispatchError, DispatchReport};
use crate::domain::{ContentRecord, Environment};
use crate::error::RenderError;
use crate::ledger::{ContentRef, SendLedger, SendStatus};
use crate::models::SendRecord;
use crate::routes::json_error;
use crate::template::RenderedMessage;
use anyhow::Context;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::{Error as JsonError, Json};
use rocket::{Request, State};
use uuid::Uuid;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 500;

#[derive(serde::Deserialize)]
pub struct BodyData {
    #[serde(default)]
    post: Option<ContentRecord>,
    #[serde(default)]
    subscribers: Option<Vec<String>>,
    #[serde(default)]
    environment: Option<Environment>,
}

#[derive(serde::Deserialize)]
pub struct PreviewData {
    #[serde(default)]
    post: Option<ContentRecord>,
}

#[derive(serde::Serialize)]
pub struct PublishResponse {
    success: bool,
    #[serde(flatten)]
    report: DispatchReport,
}

#[tracing::instrument(
    name = "Publish a newsletter issue",
    skip(body, engine, ledger),
    fields(request_id = %Uuid::new_v4())
)]
#[post("/newsletters", data = "<body>")]
pub async fn publish_newsletter(
    body: Result<Json<BodyData>, JsonError<'_>>,
    engine: &State<DispatchEngine>,
    ledger: &State<SendLedger>,
) -> Result<Json<PublishResponse>, PublishError> {
    let body = body?.into_inner();
    let environment = body.environment.unwrap_or(Environment::Prod);
    let recipients = body.subscribers.unwrap_or_default();

    let report = engine
        .dispatch(body.post.as_ref(), &recipients, environment)
        .await?;

    if let Some(post) = body.post.as_ref() {
        ledger
            .record(
                ContentRef::from(post),
                report.total,
                environment,
                SendStatus::from_report(&report),
            )
            .await;
    }

    Ok(Json(PublishResponse {
        success: true,
        report,
    }))
}

#[tracing::instrument(name = "Preview a newsletter issue", skip(body, engine))]
#[post("/newsletters/preview", data = "<body>")]
pub async fn preview_newsletter(
    body: Result<Json<PreviewData>, JsonError<'_>>,
    engine: &State<DispatchEngine>,
) -> Result<Json<RenderedMessage>, PublishError> {
    let body = body?.into_inner();
    let rendered = engine.preview(body.post.as_ref())?;
    Ok(Json(rendered))
}

#[tracing::instrument(name = "List newsletter sends", skip(ledger))]
#[get("/newsletters/sends?<limit>")]
pub async fn list_sends(
    limit: Option<i64>,
    ledger: &State<SendLedger>,
) -> Result<Json<Vec<SendRecord>>, PublishError> {
    let limit = limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let sends = ledger
        .recent(limit)
        .await
        .context("Failed to load the send history.")?;
    Ok(Json(sends))
}

#[derive(thiserror::Error)]
pub enum PublishError {
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Rejected(#[from] DispatchError),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for PublishError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::error::error_chain_fmt(self, f)
    }
}

impl<'a> From<JsonError<'a>> for PublishError {
    fn from(e: JsonError<'a>) -> Self {
        match e {
            JsonError::Parse(_, e) => PublishError::InvalidRequest(e.to_string()),
            JsonError::Io(e) => PublishError::UnexpectedError(
                anyhow::Error::new(e).context("Failed to read the request body."),
            ),
        }
    }
}

impl From<RenderError> for PublishError {
    fn from(e: RenderError) -> Self {
        match e {
            RenderError::Input(e) => PublishError::Rejected(e.into()),
            e @ RenderError::Template(..) => PublishError::UnexpectedError(e.into()),
        }
    }
}

impl<'r> Responder<'r, 'static> for PublishError {
    fn respond_to(self, request: &'r Request<'_>) -> rocket::response::Result<'static> {
        tracing::warn!("PublishError: {:?}", self);
        let status = match self {
            PublishError::InvalidRequest(_) | PublishError::Rejected(_) => Status::BadRequest,
            PublishError::UnexpectedError(_) => Status::InternalServerError,
        };
        json_error(request, status, self.to_string())
    }
}
