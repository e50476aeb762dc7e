table! {
    posts (id) {
        id -> Uuid,
        title -> Text,
        slug -> Text,
        content -> Text,
        tags -> Nullable<Text>,
        image_url -> Nullable<Text>,
        published -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    newsletter_subscribers (id) {
        id -> Uuid,
        email -> Text,
        is_active -> Bool,
        source -> Text,
        subscribed_at -> Timestamptz,
    }
}

table! {
    newsletter_sends (id) {
        id -> Uuid,
        post_id -> Nullable<Uuid>,
        post_title -> Text,
        post_slug -> Text,
        subscriber_count -> Int4,
        environment -> Text,
        status -> Text,
        sent_at -> Timestamptz,
    }
}
