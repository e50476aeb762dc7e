use crate::domain::Environment;
use crate::environment::EnvironmentResolver;
use crate::models::Post;
use crate::startup::SiteEnvironment;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

const POSTS_PAGE_SIZE: i64 = 20;

/// Published posts of one environment, newest first. Defaults to the
/// environment the site is served from.
#[tracing::instrument(name = "List published posts", skip(stores, site))]
#[get("/posts?<environment>")]
pub async fn list_posts(
    environment: Option<&str>,
    stores: &State<EnvironmentResolver>,
    site: &State<SiteEnvironment>,
) -> Result<Json<Vec<Post>>, Status> {
    let environment = match environment {
        Some(tag) => tag.parse::<Environment>().map_err(|e| {
            tracing::warn!("{}", e);
            Status::BadRequest
        })?,
        None => site.0,
    };
    stores
        .resolve(environment)
        .published_posts(POSTS_PAGE_SIZE)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to load posts: {:?}", e);
            Status::InternalServerError
        })
}
