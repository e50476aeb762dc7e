use crate::routes::ErrorBody;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::Request;

type JsonFailure = (Status, Json<ErrorBody>);

fn failure(status: Status, message: &str) -> JsonFailure {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

/// Form guards reject missing or malformed fields with 422.
#[catch(422)]
pub fn unprocessable_entity_to_bad_request(_req: &Request) -> JsonFailure {
    failure(Status::BadRequest, "The request is missing required fields.")
}

#[catch(400)]
pub fn bad_request(_req: &Request) -> JsonFailure {
    failure(Status::BadRequest, "The request could not be understood.")
}

#[catch(404)]
pub fn not_found(req: &Request) -> JsonFailure {
    failure(
        Status::NotFound,
        &format!("No route matches {}.", req.uri().path()),
    )
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> JsonFailure {
    failure(Status::InternalServerError, "Something went wrong.")
}
