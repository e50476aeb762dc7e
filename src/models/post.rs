use crate::domain::ContentRecord;
use crate::schema::posts;
use crate::template::find_body;
use chrono::offset::Utc;
use chrono::DateTime;

#[derive(Debug, Clone, PartialEq, Queryable, serde::Serialize)]
pub struct Post {
    pub id: uuid::Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub tags: Option<String>,
    pub image_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Post> for ContentRecord {
    fn from(post: Post) -> Self {
        ContentRecord {
            id: Some(post.id),
            title: post.title,
            slug: post.slug,
            content: Some(post.content),
            tags: post.tags,
            image_url: post.image_url,
            published: post.published,
            created_at: Some(post.created_at),
            updated_at: Some(post.updated_at),
            ..ContentRecord::default()
        }
    }
}

/// The fields promotion copies across stores. Identity and timestamps are
/// always owned by the store being written to.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub tags: Option<String>,
    pub image_url: Option<String>,
    pub published: bool,
}

/// The body is read along the same fallback chain the newsletter uses, so a
/// record carrying its markdown under `body` or `text` is copied intact.
impl From<&ContentRecord> for PostDraft {
    fn from(record: &ContentRecord) -> Self {
        PostDraft {
            title: record.title.clone(),
            slug: record.slug.clone(),
            content: find_body(record).unwrap_or_default().to_string(),
            tags: record.tags.clone(),
            image_url: record.image_url.clone(),
            published: record.published,
        }
    }
}

#[derive(Insertable)]
#[table_name = "posts"]
pub struct NewPost {
    pub id: uuid::Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub tags: Option<String>,
    pub image_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewPost {
    pub fn from_draft(draft: PostDraft, now: DateTime<Utc>) -> Self {
        NewPost {
            id: uuid::Uuid::new_v4(),
            title: draft.title,
            slug: draft.slug,
            content: draft.content,
            tags: draft.tags,
            image_url: draft.image_url,
            published: draft.published,
            created_at: now,
            updated_at: now,
        }
    }
}

impl From<NewPost> for Post {
    fn from(new_post: NewPost) -> Self {
        Post {
            id: new_post.id,
            title: new_post.title,
            slug: new_post.slug,
            content: new_post.content,
            tags: new_post.tags,
            image_url: new_post.image_url,
            published: new_post.published,
            created_at: new_post.created_at,
            updated_at: new_post.updated_at,
        }
    }
}

// The slug is the join key and never changes on update.
#[derive(AsChangeset)]
#[table_name = "posts"]
#[changeset_options(treat_none_as_null = "true")]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub tags: Option<String>,
    pub image_url: Option<String>,
    pub published: bool,
    pub updated_at: DateTime<Utc>,
}

impl PostChanges {
    pub fn from_draft(draft: PostDraft, now: DateTime<Utc>) -> Self {
        PostChanges {
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            image_url: draft.image_url,
            published: draft.published,
            updated_at: now,
        }
    }

    pub fn apply_to(self, post: &mut Post) {
        post.title = self.title;
        post.content = self.content;
        post.tags = self.tags;
        post.image_url = self.image_url;
        post.published = self.published;
        post.updated_at = self.updated_at;
    }
}
