mod common;

use axum::body::Body;
use axum::http::StatusCode;
use common::{jane_doe, request_builder, send, test_config, TestApp};
use contact_relay::adapters::mocks::{FailingTransport, RecordingSink, RecordingTransport};
use contact_relay::api::response::{
    CONTACT_FAILURE, CONTACT_SUCCESS, INVALID_PAYLOAD, VALIDATION_FAILED,
};
use contact_relay::domain::model::{
    Mode, COMPANY_MESSAGE, EMAIL_MESSAGE, MESSAGE_MESSAGE, NAME_MESSAGE,
};
use rstest::rstest;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_valid_submission_dispatches_exactly_one_email() {
    let app = TestApp::new(&test_config());

    let (status, body) = app
        .post_json("/api/contact", jane_doe(), "203.0.113.10")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], CONTACT_SUCCESS);
    assert!(body["data"]["messageId"].as_str().is_some_and(|id| !id.is_empty()));

    let sent = app.transport.sent();
    assert_eq!(sent.len(), 1);
    let mail = &sent[0];
    assert_eq!(mail.to, "contact@meanx.ai");
    assert_eq!(mail.reply_to, "jane@acme.io");
    assert_eq!(mail.subject, "New Contact Form Submission from Jane Doe");
    assert!(mail.text_body.contains("Company: Acme"));
    assert_eq!(body["data"]["messageId"], mail.message_id.as_str());
}

#[tokio::test]
async fn test_missing_company_is_reported_as_not_provided() {
    let app = TestApp::new(&test_config());

    let (status, _) = app
        .post_json(
            "/api/contact",
            json!({
                "name": "Jane Doe",
                "email": "jane@acme.io",
                "company": "",
                "message": "Hello, I would like a demo."
            }),
            "203.0.113.11",
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let sent = app.transport.sent();
    assert!(sent[0].text_body.contains("Company: Not provided"));
}

#[tokio::test]
async fn test_every_invalid_field_is_reported_without_dispatch() {
    let app = TestApp::new(&test_config());

    let (status, body) = app
        .post_json(
            "/api/contact",
            json!({ "name": "J", "email": "not-an-email", "message": "short" }),
            "203.0.113.12",
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], VALIDATION_FAILED);

    let errors = body["errors"].as_array().unwrap();
    let fields: Vec<&str> = errors
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "email", "message"]);
    assert_eq!(errors[0]["message"], NAME_MESSAGE);
    assert_eq!(errors[1]["message"], EMAIL_MESSAGE);
    assert_eq!(errors[2]["message"], MESSAGE_MESSAGE);

    assert_eq!(app.transport.sent_count(), 0);
}

#[rstest]
#[case::missing_at("jane.acme.io")]
#[case::missing_tld("jane@acme")]
#[case::spaces("jane doe@acme.io")]
#[case::empty("")]
#[case::trailing_dot("jane@example.com.")]
#[tokio::test]
async fn test_invalid_email_is_rejected(#[case] email: &str) {
    let app = TestApp::new(&test_config());
    let mut payload = jane_doe();
    payload["email"] = json!(email);

    let (status, body) = app
        .post_json("/api/contact", payload, "203.0.113.13")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "email");
    assert_eq!(app.transport.sent_count(), 0);
}

#[tokio::test]
async fn test_email_is_normalized_before_dispatch() {
    let app = TestApp::new(&test_config());
    let mut payload = jane_doe();
    payload["email"] = json!("Jane.Doe+news@GoogleMail.com");

    let (status, _) = app
        .post_json("/api/contact", payload, "203.0.113.14")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.transport.sent()[0].reply_to, "janedoe@gmail.com");
}

#[tokio::test]
async fn test_sixth_submission_within_the_hour_is_limited() {
    let app = TestApp::new(&test_config());

    for _ in 0..5 {
        let (status, _) = app
            .post_json("/api/contact", jane_doe(), "203.0.113.20")
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = app
        .post_json("/api/contact", jane_doe(), "203.0.113.20")
        .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Too many contact submissions, please try again later."
    );
    assert_eq!(app.transport.sent_count(), 5);

    // 其他來源不受影響
    let (status, _) = app
        .post_json("/api/contact", jane_doe(), "203.0.113.21")
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_contact_window_resets_after_an_hour() {
    let app = TestApp::new(&test_config());

    for _ in 0..5 {
        app.post_json("/api/contact", jane_doe(), "203.0.113.22")
            .await;
    }
    app.clock.advance(Duration::from_secs(3600));

    let (status, _) = app
        .post_json("/api/contact", jane_doe(), "203.0.113.22")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.transport.sent_count(), 6);
}

#[tokio::test]
async fn test_invalid_submissions_do_not_consume_quota() {
    let app = TestApp::new(&test_config());

    for _ in 0..10 {
        let (status, _) = app
            .post_json("/api/contact", json!({ "name": "J" }), "203.0.113.23")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = app
        .post_json("/api/contact", jane_doe(), "203.0.113.23")
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_transport_failure_returns_generic_500() {
    let config = test_config();
    let transport = FailingTransport::new("535 authentication failed for relay@smtp.example.com");
    let router = common::build_router(
        &config,
        Arc::new(transport.clone()),
        Arc::new(RecordingSink::new()),
        Default::default(),
    );

    let request = request_builder("POST", "/api/contact", "203.0.113.30")
        .header("content-type", "application/json")
        .body(Body::from(jane_doe().to_string()))
        .unwrap();
    let (status, body) = send(&router, request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], CONTACT_FAILURE);
    assert!(body.get("errors").is_none());

    let raw = body.to_string();
    assert!(!raw.contains("smtp.example.com"));
    assert!(!raw.contains("535"));
    assert_eq!(transport.attempts(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_a_400() {
    let app = TestApp::new(&test_config());
    let request = request_builder("POST", "/api/contact", "203.0.113.40")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": \"Jane"))
        .unwrap();

    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], INVALID_PAYLOAD);
    assert_eq!(app.transport.sent_count(), 0);
}

#[tokio::test]
async fn test_urlencoded_form_is_accepted() {
    let app = TestApp::new(&test_config());
    let request = request_builder("POST", "/api/contact", "203.0.113.41")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(
            "name=Jane+Doe&email=jane%40acme.io&message=Hello%2C+I+would+like+a+demo.",
        ))
        .unwrap();

    let (status, body) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(app.transport.sent()[0].reply_to, "jane@acme.io");
}

#[tokio::test]
async fn test_preview_url_is_returned_in_development() {
    let config = test_config();
    let app = TestApp::with_transport(
        &config,
        RecordingTransport::with_previews("https://ethereal.email/message/"),
    );

    let (status, body) = app
        .post_json("/api/contact", jane_doe(), "203.0.113.50")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["previewUrl"], "https://ethereal.email/message/1");
}

#[tokio::test]
async fn test_preview_url_is_withheld_in_production() {
    let mut config = test_config();
    config.mode = Mode::Production;
    let app = TestApp::with_transport(
        &config,
        RecordingTransport::with_previews("https://ethereal.email/message/"),
    );

    let (status, body) = app
        .post_json("/api/contact", jane_doe(), "203.0.113.51")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("previewUrl").is_none());
    assert!(body["data"]["messageId"].is_string());
}

#[rstest]
#[case::one_char("J".to_string(), StatusCode::BAD_REQUEST)]
#[case::two_chars("Jo".to_string(), StatusCode::OK)]
#[case::hundred_chars("a".repeat(100), StatusCode::OK)]
#[case::hundred_and_one_chars("a".repeat(101), StatusCode::BAD_REQUEST)]
#[case::padded_short("  J  ".to_string(), StatusCode::BAD_REQUEST)]
#[tokio::test]
async fn test_name_length_bounds(#[case] name: String, #[case] expected: StatusCode) {
    let app = TestApp::new(&test_config());
    let payload = json!({
        "name": name,
        "email": "jane@example.com",
        "message": "Interested in your AI consulting services."
    });

    let (status, _) = app
        .post_json("/api/contact", payload, "203.0.113.60")
        .await;

    assert_eq!(status, expected);
    let dispatched = usize::from(expected == StatusCode::OK);
    assert_eq!(app.transport.sent_count(), dispatched);
}

#[rstest]
#[case::nine_after_trim("   123456789   ".to_string(), StatusCode::BAD_REQUEST)]
#[case::ten_chars("1234567890".to_string(), StatusCode::OK)]
#[case::five_thousand("m".repeat(5000), StatusCode::OK)]
#[case::five_thousand_and_one("m".repeat(5001), StatusCode::BAD_REQUEST)]
#[tokio::test]
async fn test_message_length_bounds(#[case] message: String, #[case] expected: StatusCode) {
    let app = TestApp::new(&test_config());
    let mut payload = jane_doe();
    payload["message"] = json!(message);

    let (status, body) = app
        .post_json("/api/contact", payload, "203.0.113.61")
        .await;

    assert_eq!(status, expected);
    if expected == StatusCode::BAD_REQUEST {
        assert_eq!(body["errors"][0]["field"], "message");
        assert_eq!(body["errors"][0]["message"], MESSAGE_MESSAGE);
    }
    let dispatched = usize::from(expected == StatusCode::OK);
    assert_eq!(app.transport.sent_count(), dispatched);
}

#[rstest]
#[case::hundred_chars("c".repeat(100), StatusCode::OK)]
#[case::hundred_and_one_chars("c".repeat(101), StatusCode::BAD_REQUEST)]
#[tokio::test]
async fn test_company_length_bounds(#[case] company: String, #[case] expected: StatusCode) {
    let app = TestApp::new(&test_config());
    let mut payload = jane_doe();
    payload["company"] = json!(company);

    let (status, body) = app
        .post_json("/api/contact", payload, "203.0.113.62")
        .await;

    assert_eq!(status, expected);
    if expected == StatusCode::BAD_REQUEST {
        assert_eq!(body["errors"][0]["field"], "company");
        assert_eq!(body["errors"][0]["message"], COMPANY_MESSAGE);
    }
    let dispatched = usize::from(expected == StatusCode::OK);
    assert_eq!(app.transport.sent_count(), dispatched);
}
