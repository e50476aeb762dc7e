use crate::helpers::{spawn_app, TestApp};
use blogcast::domain::{Environment, SubscriberEmail};

fn hello_post() -> serde_json::Value {
    serde_json::json!({
        "title": "Hello",
        "slug": "hello",
        "content": "**Hi** there, this is the first post.",
        "tags": "intro,test",
        "published": true,
        "created_at": "2024-01-01T00:00:00Z"
    })
}

async fn sends(app: &TestApp) -> serde_json::Value {
    app.get("/newsletters/sends").await.json().await.unwrap()
}

#[tokio::test]
async fn partial_failures_are_reported_and_recorded() {
    // arrange
    let app = spawn_app().await;
    app.email_client.fail_for("b@x.com");

    // act
    let response = app
        .post_newsletters(&serde_json::json!({
            "post": hello_post(),
            "subscribers": ["a@x.com", "b@x.com"],
            "environment": "prod"
        }))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["sent"], 1);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["total"], 2);
    assert_eq!(body["details"][0]["email"], "a@x.com");
    assert_eq!(body["details"][0]["status"], "sent");
    assert_eq!(body["details"][1]["email"], "b@x.com");
    assert_eq!(body["details"][1]["status"], "failed");

    let history = sends(&app).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["subscriber_count"], 2);
    assert_eq!(history[0]["status"], "partial");
    assert_eq!(history[0]["post_slug"], "hello");
    assert_eq!(history[0]["environment"], "prod");
}

#[tokio::test]
async fn every_recipient_gets_a_personalised_newsletter() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app
        .post_newsletters(&serde_json::json!({
            "post": hello_post(),
            "subscribers": ["a@x.com", "b@x.com", "c@x.com"]
        }))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let emails = app.email_client.sent_emails.lock().unwrap();
    assert_eq!(
        emails.len(),
        3,
        "Expected 3 emails, {} were sent",
        emails.len()
    );
    for email in emails.iter() {
        assert_eq!(email.subject, "📝 New Post: Hello");
        let links = app.get_unsubscribe_links(email);
        let expected_query = format!("email={}", email.recipient.as_ref().replace('@', "%40"));
        assert_eq!(links.html.query(), Some(expected_query.as_str()));
        assert_eq!(links.html, links.plain_text);
        let header = email.header("List-Unsubscribe").unwrap();
        assert!(header.starts_with('<') && header.ends_with('>'));
        assert!(header.contains(&expected_query));
        assert_eq!(
            email.header("List-Unsubscribe-Post"),
            Some("List-Unsubscribe=One-Click")
        );
    }
}

#[tokio::test]
async fn the_one_click_unsubscribe_header_accepts_a_post() {
    // arrange
    let app = spawn_app().await;
    app.post_subscriptions("email=ursula_le_guin%40gmail.com".into())
        .await
        .error_for_status()
        .unwrap();
    app.post_newsletters(&serde_json::json!({
        "post": hello_post(),
        "subscribers": ["ursula_le_guin@gmail.com"]
    }))
    .await
    .error_for_status()
    .unwrap();
    let link = {
        let emails = app.email_client.sent_emails.lock().unwrap();
        let header = emails[0].header("List-Unsubscribe").unwrap();
        let raw_link = header.trim_start_matches('<').trim_end_matches('>');
        let mut link = reqwest::Url::parse(raw_link).unwrap();
        link.set_port(Some(app.port)).unwrap();
        link
    };

    // act
    let response = reqwest::Client::new()
        .post(link)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("List-Unsubscribe=One-Click")
        .send()
        .await
        .expect("Failed to execute request.");

    // assert
    assert_eq!(200, response.status().as_u16());
    let email = SubscriberEmail::parse("ursula_le_guin@gmail.com".into()).unwrap();
    let subscriber = app
        .stores
        .resolve(Environment::Prod)
        .find_subscriber(&email)
        .await
        .unwrap()
        .unwrap();
    assert!(!subscriber.is_active);
}

#[tokio::test]
async fn invalid_payloads_are_rejected_with_a_400() {
    // arrange
    let app = spawn_app().await;
    let test_cases = vec![
        (
            serde_json::json!({"subscribers": ["a@x.com"]}),
            "missing post",
        ),
        (serde_json::json!({"post": hello_post()}), "missing subscribers"),
        (
            serde_json::json!({"post": hello_post(), "subscribers": []}),
            "empty subscribers",
        ),
        (
            serde_json::json!({"post": hello_post(), "subscribers": "a@x.com"}),
            "subscribers not an array",
        ),
    ];

    for (body, description) in test_cases {
        // act
        let response = app.post_newsletters(&body).await;

        // assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }
    assert!(app.email_client.sent_emails.lock().unwrap().is_empty());
    assert_eq!(sends(&app).await, serde_json::json!([]));
}

#[tokio::test]
async fn malformed_json_is_rejected_with_a_400() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = reqwest::Client::new()
        .post(&format!("{}/newsletters", &app.address))
        .header("Content-Type", "application/json")
        .body("{\"post\": ")
        .send()
        .await
        .expect("Failed to execute request.");

    // assert
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn following_the_unsubscribe_link_deactivates_the_subscriber() {
    // arrange
    let app = spawn_app().await;
    app.post_subscriptions("email=ursula_le_guin%40gmail.com".into())
        .await
        .error_for_status()
        .unwrap();
    app.post_newsletters(&serde_json::json!({
        "post": hello_post(),
        "subscribers": ["ursula_le_guin@gmail.com"]
    }))
    .await
    .error_for_status()
    .unwrap();
    let link = {
        let emails = app.email_client.sent_emails.lock().unwrap();
        app.get_unsubscribe_links(&emails[0]).html
    };

    // act
    let response = reqwest::get(link).await.unwrap();

    // assert
    assert_eq!(200, response.status().as_u16());
    let email = SubscriberEmail::parse("ursula_le_guin@gmail.com".into()).unwrap();
    let subscriber = app
        .stores
        .resolve(Environment::Prod)
        .find_subscriber(&email)
        .await
        .unwrap()
        .unwrap();
    assert!(!subscriber.is_active);
}

#[tokio::test]
async fn previews_render_without_sending() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = reqwest::Client::new()
        .post(&format!("{}/newsletters/preview", &app.address))
        .json(&serde_json::json!({ "post": hello_post() }))
        .send()
        .await
        .expect("Failed to execute request.");

    // assert
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["subject"], "📝 New Post: Hello");
    assert!(body["html"]
        .as_str()
        .unwrap()
        .contains("unsubscribe?email=preview%40example.com"));
    assert!(app.email_client.sent_emails.lock().unwrap().is_empty());
}

#[tokio::test]
async fn a_date_only_timestamp_does_not_block_the_dispatch() {
    // arrange
    let app = spawn_app().await;
    let mut post = hello_post();
    post["created_at"] = serde_json::json!("2024-01-01");

    // act
    let response = app
        .post_newsletters(&serde_json::json!({
            "post": post,
            "subscribers": ["a@x.com"]
        }))
        .await;

    // assert
    assert_eq!(200, response.status().as_u16());
    let emails = app.email_client.sent_emails.lock().unwrap();
    assert_eq!(emails.len(), 1);
    assert!(emails[0].text_content.contains("Published: January 1, 2024"));
}
