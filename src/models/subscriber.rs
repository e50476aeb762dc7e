use crate::domain::SubscriberEmail;
use crate::schema::newsletter_subscribers;
use chrono::offset::Utc;
use chrono::DateTime;

#[derive(Debug, Clone, PartialEq, Queryable, serde::Serialize)]
pub struct Subscriber {
    pub id: uuid::Uuid,
    pub email: String,
    pub is_active: bool,
    pub source: String,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "newsletter_subscribers"]
pub struct NewSubscriber {
    pub id: uuid::Uuid,
    pub email: String,
    pub is_active: bool,
    pub source: String,
    pub subscribed_at: DateTime<Utc>,
}

impl NewSubscriber {
    pub fn new(email: &SubscriberEmail, source: &str) -> Self {
        NewSubscriber {
            id: uuid::Uuid::new_v4(),
            email: email.as_ref().to_string(),
            is_active: true,
            source: source.to_string(),
            subscribed_at: Utc::now(),
        }
    }
}

impl From<NewSubscriber> for Subscriber {
    fn from(new_subscriber: NewSubscriber) -> Self {
        Subscriber {
            id: new_subscriber.id,
            email: new_subscriber.email,
            is_active: new_subscriber.is_active,
            source: new_subscriber.source,
            subscribed_at: new_subscriber.subscribed_at,
        }
    }
}
