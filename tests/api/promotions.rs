use crate::helpers::{draft, spawn_app};
use blogcast::domain::Environment;

#[tokio::test]
async fn promoting_a_dev_post_inserts_it_into_prod() {
    // arrange
    let app = spawn_app().await;
    let source = app.seed_post(Environment::Dev, draft("hello", "Hello")).await;

    // act
    let response = app
        .post_promotions(&serde_json::json!({ "slug": "hello" }))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "inserted");
    assert_eq!(body["post"]["slug"], "hello");
    assert_ne!(body["post"]["id"], source.id.to_string());

    let promoted = app
        .stores
        .resolve(Environment::Prod)
        .find_post_by_slug("hello")
        .await
        .unwrap();
    assert_eq!(promoted.unwrap().title, "Hello");
}

#[tokio::test]
async fn promoting_over_an_existing_slug_updates_it() {
    // arrange
    let app = spawn_app().await;
    app.seed_post(Environment::Prod, draft("foo", "Old")).await;
    app.seed_post(Environment::Dev, draft("foo", "New")).await;

    // act
    let response = app
        .post_promotions(&serde_json::json!({
            "slug": "foo",
            "source": "dev",
            "target": "prod"
        }))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["outcome"], "updated");

    let posts: serde_json::Value = app
        .get("/posts?environment=prod")
        .await
        .json()
        .await
        .unwrap();
    let posts = posts.as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "New");
}

#[tokio::test]
async fn promotion_input_errors_are_400s() {
    // arrange
    let app = spawn_app().await;
    let mut unpublished = draft("draft", "Draft");
    unpublished.published = false;
    app.seed_post(Environment::Dev, unpublished).await;
    let test_cases = vec![
        (serde_json::json!({ "slug": "" }), "an empty slug"),
        (serde_json::json!({ "slug": "missing" }), "an unknown slug"),
        (serde_json::json!({ "slug": "draft" }), "an unpublished post"),
        (
            serde_json::json!({ "slug": "draft", "source": "prod", "target": "prod" }),
            "the same source and target",
        ),
        (
            serde_json::json!({ "slug": "draft", "target": "staging" }),
            "an unknown environment",
        ),
    ];

    for (body, description) in test_cases {
        // act
        let response = app.post_promotions(&body).await;

        // assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
    }
    let prod_posts = app
        .stores
        .resolve(Environment::Prod)
        .published_posts(20)
        .await
        .unwrap();
    assert!(prod_posts.is_empty());
}
