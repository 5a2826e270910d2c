mod common;

use axum::http::StatusCode;
use link_lifecycle::infrastructure::rate_limit::RateLimitPolicy;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_shorten_success() {
    let app = common::create_test_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    let code = json["code"].as_str().unwrap();
    assert_eq!(code.len(), 7);
    assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(json["long_url"], "https://example.com");
    assert_eq!(json["short_url"], format!("{}/r/{}", common::BASE_URL, code));
    assert!(json["expires_at"].is_null());

    assert_eq!(app.repository.len(), 1);
}

#[tokio::test]
async fn test_shorten_with_custom_code() {
    let app = common::create_test_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({
            "url": "https://example.com",
            "custom_code": "valid_code-1"
        }))
        .await;

    response.assert_status_ok();

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["code"], "valid_code-1");
    assert_eq!(json["short_url"], "http://s.example.com/r/valid_code-1");
}

#[tokio::test]
async fn test_shorten_duplicate_custom_code_conflicts() {
    let app = common::create_test_app();
    let body = json!({ "url": "https://example.com", "custom_code": "promo" });

    app.server
        .post("/api/shorten")
        .json(&body)
        .await
        .assert_status_ok();

    let response = app.server.post("/api/shorten").json(&body).await;

    response.assert_status(StatusCode::CONFLICT);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "conflict");
    assert_eq!(json["error"]["details"]["code"], "promo");
}

#[tokio::test]
async fn test_shorten_invalid_url() {
    let app = common::create_test_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "not-a-url" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_shorten_rejects_url_with_line_break() {
    let app = common::create_test_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com/a\nb", "custom_code": "nlcode" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "validation_error");
    assert!(app.repository.is_empty());

    app.server
        .get("/r/nlcode")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_shorten_rejects_bad_custom_codes() {
    let app = common::create_test_app_with_policy(
        RateLimitPolicy {
            max_requests: 100,
            window: Duration::from_secs(60),
        },
        false,
    );

    for bad in ["ab", "has space", "semi;colon"] {
        let response = app
            .server
            .post("/api/shorten")
            .json(&json!({ "url": "https://example.com", "custom_code": bad }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    assert!(app.repository.is_empty());
}

#[tokio::test]
async fn test_shorten_with_expiration() {
    let app = common::create_test_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com", "expiration_hours": 24 }))
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert!(json["expires_at"].is_string());
}

#[tokio::test]
async fn test_shorten_zero_expiration_never_expires() {
    let app = common::create_test_app();

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com", "expiration_hours": 0 }))
        .await;

    response.assert_status_ok();
    let json = response.json::<serde_json::Value>();
    assert!(json["expires_at"].is_null());
}

#[tokio::test]
async fn test_shorten_rate_limited_after_quota() {
    let app = common::create_test_app();

    for remaining in (0..5).rev() {
        let response = app
            .server
            .post("/api/shorten")
            .json(&json!({ "url": "https://example.com" }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("x-ratelimit-limit"), "5");
        assert_eq!(
            response.header("x-ratelimit-remaining"),
            remaining.to_string().as_str()
        );
    }

    let response = app
        .server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com" }))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);

    let retry_after: u64 = response
        .header("retry-after")
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "rate_limited");

    assert_eq!(app.repository.len(), 5);
}

#[tokio::test]
async fn test_rate_limit_does_not_apply_to_reads() {
    let app = common::create_test_app_with_policy(
        RateLimitPolicy {
            max_requests: 1,
            window: Duration::from_secs(60),
        },
        false,
    );

    app.server
        .post("/api/shorten")
        .json(&json!({ "url": "https://example.com", "custom_code": "only" }))
        .await
        .assert_status_ok();

    for _ in 0..5 {
        app.server.get("/r/only").await.assert_status(StatusCode::TEMPORARY_REDIRECT);
        app.server.get("/api/all-links").await.assert_status_ok();
    }
}

#[tokio::test]
async fn test_rate_limit_keys_on_forwarded_ip_behind_proxy() {
    let app = common::create_test_app_with_policy(
        RateLimitPolicy {
            max_requests: 1,
            window: Duration::from_secs(60),
        },
        true,
    );

    let first = |ip: &'static str| {
        app.server
            .post("/api/shorten")
            .add_header("x-forwarded-for", ip)
            .json(&json!({ "url": "https://example.com" }))
    };

    first("203.0.113.1").await.assert_status_ok();
    first("203.0.113.2").await.assert_status_ok();
    first("203.0.113.1")
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}
