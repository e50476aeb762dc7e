use crate::domain::Environment;
use crate::error::error_chain_fmt;
use crate::promotion::{ContentPromoter, Promotion, PromotionError};
use crate::routes::json_error;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::{Error as JsonError, Json};
use rocket::{Request, State};
use uuid::Uuid;

#[derive(serde::Deserialize)]
pub struct PromotionRequest {
    #[serde(default)]
    slug: String,
    #[serde(default = "default_source")]
    source: Environment,
    #[serde(default = "default_target")]
    target: Environment,
}

fn default_source() -> Environment {
    Environment::Dev
}

fn default_target() -> Environment {
    Environment::Prod
}

#[tracing::instrument(
    name = "Promote a post between environments",
    skip(body, promoter),
    fields(request_id = %Uuid::new_v4())
)]
#[post("/promotions", data = "<body>")]
pub async fn promote_post(
    body: Result<Json<PromotionRequest>, JsonError<'_>>,
    promoter: &State<ContentPromoter>,
) -> Result<Json<Promotion>, PromoteError> {
    let body = body.map_err(|e| PromoteError::InvalidRequest(e.to_string()))?;
    let promotion = promoter
        .promote_slug(&body.slug, body.source, body.target)
        .await?;
    Ok(Json(promotion))
}

#[derive(thiserror::Error)]
pub enum PromoteError {
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Promotion(#[from] PromotionError),
}

impl std::fmt::Debug for PromoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl<'r> Responder<'r, 'static> for PromoteError {
    fn respond_to(self, request: &'r Request<'_>) -> rocket::response::Result<'static> {
        tracing::warn!("PromoteError: {:?}", self);
        let status = match self {
            PromoteError::InvalidRequest(_) | PromoteError::Promotion(PromotionError::Input(_)) => {
                Status::BadRequest
            }
            PromoteError::Promotion(PromotionError::Store { .. }) => Status::InternalServerError,
        };
        json_error(request, status, self.to_string())
    }
}
