use crate::environment::EnvironmentResolver;
use crate::models::Subscriber;
use crate::startup::SiteEnvironment;
use chrono::Utc;
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::State;

#[derive(Responder)]
#[response(content_type = "text/csv")]
pub struct CsvExport {
    inner: String,
    disposition: Header<'static>,
}

#[tracing::instrument(name = "List active subscribers", skip(stores, site))]
#[get("/subscribers")]
pub async fn list_subscribers(
    stores: &State<EnvironmentResolver>,
    site: &State<SiteEnvironment>,
) -> Result<Json<Vec<Subscriber>>, Status> {
    active_subscribers(stores, site).await.map(Json)
}

#[tracing::instrument(name = "Export active subscribers", skip(stores, site))]
#[get("/subscribers/export")]
pub async fn export_subscribers(
    stores: &State<EnvironmentResolver>,
    site: &State<SiteEnvironment>,
) -> Result<CsvExport, Status> {
    let subscribers = active_subscribers(stores, site).await?;
    let filename = format!(
        "newsletter-subscribers-{}.csv",
        Utc::now().format("%Y-%m-%d")
    );
    Ok(CsvExport {
        inner: to_csv(&subscribers),
        disposition: Header::new(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ),
    })
}

async fn active_subscribers(
    stores: &EnvironmentResolver,
    site: &SiteEnvironment,
) -> Result<Vec<Subscriber>, Status> {
    stores
        .resolve(site.0)
        .active_subscribers()
        .await
        .map_err(|e| {
            tracing::error!("Failed to load subscribers: {:?}", e);
            Status::InternalServerError
        })
}

/// RFC 4180: CRLF row endings, and fields holding a comma, quote or line
/// break are wrapped in quotes with inner quotes doubled.
fn to_csv(subscribers: &[Subscriber]) -> String {
    let mut rows = vec!["Email,Subscribed Date,Source".to_string()];
    rows.extend(subscribers.iter().map(|s| {
        [
            csv_field(&s.email),
            csv_field(&s.subscribed_at.format("%Y-%m-%d").to_string()),
            csv_field(&s.source),
        ]
        .join(",")
    }));
    rows.join("\r\n")
}

fn csv_field(raw: &str) -> String {
    if raw.contains(|c: char| matches!(c, ',' | '"' | '\r' | '\n')) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
