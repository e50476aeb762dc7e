mod health;
mod newsletters;
mod posts;
mod promotions;
mod subscribers;
mod subscriptions;

pub use health::*;
pub use newsletters::*;
pub use posts::*;
pub use promotions::*;
pub use subscribers::*;
pub use subscriptions::*;

use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use rocket::Request;

#[derive(serde::Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// The `{ "error": ... }` body every failing JSON endpoint answers with.
pub(crate) fn json_error<'r>(
    request: &'r Request<'_>,
    status: Status,
    message: String,
) -> rocket::response::Result<'static> {
    (status, Json(ErrorBody { error: message })).respond_to(request)
}
