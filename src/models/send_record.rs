use crate::schema::newsletter_sends;
use chrono::offset::Utc;
use chrono::DateTime;

/// One completed dispatch batch. Rows are only ever inserted.
#[derive(Debug, Clone, PartialEq, Queryable, serde::Serialize)]
pub struct SendRecord {
    pub id: uuid::Uuid,
    pub post_id: Option<uuid::Uuid>,
    pub post_title: String,
    pub post_slug: String,
    pub subscriber_count: i32,
    pub environment: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "newsletter_sends"]
pub struct NewSendRecord {
    pub id: uuid::Uuid,
    pub post_id: Option<uuid::Uuid>,
    pub post_title: String,
    pub post_slug: String,
    pub subscriber_count: i32,
    pub environment: String,
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

impl From<NewSendRecord> for SendRecord {
    fn from(new_record: NewSendRecord) -> Self {
        SendRecord {
            id: new_record.id,
            post_id: new_record.post_id,
            post_title: new_record.post_title,
            post_slug: new_record.post_slug,
            subscriber_count: new_record.subscriber_count,
            environment: new_record.environment,
            status: new_record.status,
            sent_at: new_record.sent_at,
        }
    }
}
