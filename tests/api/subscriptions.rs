use email_capture::domain::SubscriptionRecord;
use serde_json::{Value, json};

use crate::helpers::spawn_app;

#[tokio::test]
async fn subscribe_returns_a_200_for_a_valid_email() {
    let app = spawn_app().await;

    let response = app
        .post_subscribe(json!({ "email": "ursula_le_guin@gmail.com" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap()),
        Some("*")
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Successfully subscribed!");
}

#[tokio::test]
async fn subscribe_persists_the_record_and_the_index_entry() {
    let app = spawn_app().await;

    app.post_subscribe(json!({ "email": "ursula_le_guin@gmail.com" }))
        .await;

    let raw = app
        .store
        .get("ursula_le_guin@gmail.com")
        .await
        .unwrap()
        .expect("No record stored for the new subscriber");
    let record: SubscriptionRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(record.email, "ursula_le_guin@gmail.com");
    assert_eq!(record.source.as_deref(), Some("coming-soon-page"));
    assert_ne!(record.subscribed_at, "unknown");

    assert_eq!(app.stored_index().await, vec!["ursula_le_guin@gmail.com"]);
}

#[tokio::test]
async fn subscribe_normalizes_the_email_before_storing_it() {
    let app = spawn_app().await;

    let response = app
        .post_subscribe(json!({ "email": "  Ursula_Le_Guin@GMAIL.com " }))
        .await;

    assert_eq!(200, response.status().as_u16());
    assert!(
        app.store
            .get("ursula_le_guin@gmail.com")
            .await
            .unwrap()
            .is_some()
    );
    assert_eq!(app.stored_index().await, vec!["ursula_le_guin@gmail.com"]);
}

#[tokio::test]
async fn subscribing_twice_is_idempotent() {
    let app = spawn_app().await;

    app.post_subscribe(json!({ "email": "ursula_le_guin@gmail.com" }))
        .await;
    let first_record = app.store.get("ursula_le_guin@gmail.com").await.unwrap();

    // A different spelling of the same address hits the duplicate path.
    let response = app
        .post_subscribe(json!({ "email": "Ursula_Le_Guin@gmail.com" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Already subscribed");

    // No second record, no second index entry, no rewrite of the first.
    assert_eq!(
        app.store.get("ursula_le_guin@gmail.com").await.unwrap(),
        first_record
    );
    assert_eq!(app.stored_index().await.len(), 1);
}

#[tokio::test]
async fn subscribe_returns_a_400_when_the_email_is_invalid() {
    let app = spawn_app().await;
    let invalid_emails = [
        "",
        "not-an-email",
        "ursuladomain.com",
        "@domain.com",
        "ursula@domain",
        "ursula@.com",
        "ursula le guin@domain.com",
        "ursula@le@domain.com",
    ];

    for email in invalid_emails {
        let response = app.post_subscribe(json!({ "email": email })).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not reject '{}'",
            email
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Invalid email address");
    }

    assert!(app.stored_index().await.is_empty());
}

#[tokio::test]
async fn subscribe_returns_a_400_when_the_email_field_is_missing() {
    let app = spawn_app().await;

    let response = app.post_subscribe(json!({})).await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn subscribe_returns_a_500_for_a_body_that_is_not_json() {
    let app = spawn_app().await;

    let response = app.post_subscribe_raw("definitely not json").await;

    assert_eq!(500, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Server error. Please try again.");
}

#[tokio::test]
async fn subscribe_records_the_user_agent_header() {
    let app = spawn_app().await;

    reqwest::Client::new()
        .post(format!("{}/api/subscribe", app.address))
        .header("User-Agent", "integration-test")
        .json(&json!({ "email": "ursula_le_guin@gmail.com" }))
        .send()
        .await
        .expect("Failed to execute request.");

    let raw = app
        .store
        .get("ursula_le_guin@gmail.com")
        .await
        .unwrap()
        .unwrap();
    let record: SubscriptionRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(record.user_agent.as_deref(), Some("integration-test"));
}

#[tokio::test]
async fn subscribe_falls_back_to_unknown_when_the_user_agent_is_absent() {
    let app = spawn_app().await;

    // reqwest sends no User-Agent header unless asked to.
    app.post_subscribe(json!({ "email": "ursula_le_guin@gmail.com" }))
        .await;

    let raw = app
        .store
        .get("ursula_le_guin@gmail.com")
        .await
        .unwrap()
        .unwrap();
    let record: SubscriptionRecord = serde_json::from_str(&raw).unwrap();
    assert_eq!(record.user_agent.as_deref(), Some("unknown"));
}

#[tokio::test]
async fn preflight_requests_get_the_cors_contract() {
    let app = spawn_app().await;

    let response = reqwest::Client::new()
        .request(
            reqwest::Method::OPTIONS,
            format!("{}/api/subscribe", app.address),
        )
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(204, response.status().as_u16());
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .map(|v| v.to_str().unwrap().to_owned())
    };
    assert_eq!(header("access-control-allow-origin").as_deref(), Some("*"));
    assert_eq!(
        header("access-control-allow-methods").as_deref(),
        Some("POST, OPTIONS")
    );
    assert_eq!(
        header("access-control-allow-headers").as_deref(),
        Some("Content-Type")
    );
    assert_eq!(header("access-control-max-age").as_deref(), Some("86400"));
    assert!(response.text().await.unwrap().is_empty());
}
