use axum::http::StatusCode;
use github_roaster::RateLimiter;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::test_helpers::*;
use common::{CountingLimiter, FakeGenerator, FakeProfiles};

const ROAST_URI: &str = "/api/github-roasting?username=octocat";

#[tokio::test]
async fn test_successful_roast() {
    setup_test_logger();
    let profile = sample_profile();
    let profiles = FakeProfiles::ok(profile.clone());
    let generator = FakeGenerator::ok("Profilmu membosankan.");
    let app = app_with(default_limiter(), profiles.clone(), generator.clone());

    let (status, body) = get(app, ROAST_URI, Some("203.0.113.1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "roasting": "Profilmu membosankan." }));
    assert_eq!(profiles.calls(), 1);
    assert_eq!(generator.calls(), 1);

    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains(&serde_json::to_string(&profile).unwrap()));
    assert!(prompt.contains("```# Hi, I'm Octocat```"));
}

#[tokio::test]
async fn test_missing_username() {
    let profiles = FakeProfiles::ok(sample_profile());
    let generator = FakeGenerator::ok("unused");
    let limiter = Arc::new(CountingLimiter::default());

    for uri in ["/api/github-roasting", "/api/github-roasting?username=", "/api/github-roasting?username=%20"] {
        let app = app_with(limiter.clone(), profiles.clone(), generator.clone());
        let (status, body) = get(app, uri, Some("203.0.113.1")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "message": "Username is required" }));
    }

    assert_eq!(limiter.calls(), 0);
    assert_eq!(profiles.calls(), 0);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_repeated_username_uses_first_value() {
    let profiles = FakeProfiles::ok(sample_profile());
    let generator = FakeGenerator::ok("roast");
    let app = app_with(default_limiter(), profiles.clone(), generator);

    let (status, body) = get(
        app,
        "/api/github-roasting?username=octocat&username=ghost",
        Some("203.0.113.1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "roasting": "roast" }));
    assert_eq!(profiles.last_username().as_deref(), Some("octocat"));
}

#[tokio::test]
async fn test_unresolvable_client() {
    let profiles = FakeProfiles::ok(sample_profile());
    let generator = FakeGenerator::ok("unused");
    let limiter = Arc::new(CountingLimiter::default());
    let app = app_with(limiter.clone(), profiles.clone(), generator.clone());

    let (status, body) = get(app, ROAST_URI, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Client IP is invalid." }));
    assert_eq!(limiter.calls(), 0);
    assert_eq!(profiles.calls(), 0);
}

#[tokio::test]
async fn test_peer_address_is_used_without_forwarded_for() {
    let limiter = default_limiter();
    let profiles = FakeProfiles::ok(sample_profile());
    let generator = FakeGenerator::ok("roast");
    let peer = "198.51.100.4:52000".parse().unwrap();

    let app = app_with(limiter.clone(), profiles, generator);
    let (status, _) = get_from_peer(app, ROAST_URI, peer).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(limiter.remaining("198.51.100.4").await, 4);
}

#[tokio::test]
async fn test_sixth_request_is_rate_limited() {
    let limiter = default_limiter();
    let profiles = FakeProfiles::ok(sample_profile());
    let generator = FakeGenerator::ok("roast");

    for _ in 0..5 {
        let app = app_with(limiter.clone(), profiles.clone(), generator.clone());
        let (status, _) = get(app, ROAST_URI, Some("203.0.113.9")).await;
        assert_eq!(status, StatusCode::OK);
    }

    let app = app_with(limiter.clone(), profiles.clone(), generator.clone());
    let (status, body) = get(app, ROAST_URI, Some("203.0.113.9")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body, json!({ "message": "Too many requests, try again later." }));
    assert_eq!(profiles.calls(), 5);

    // Other clients are unaffected
    let app = app_with(limiter.clone(), profiles.clone(), generator.clone());
    let (status, _) = get(app, ROAST_URI, Some("203.0.113.10")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_client_recovers_after_window() {
    let limiter = Arc::new(RateLimiter::new(5, Duration::from_secs(60)));
    let profiles = FakeProfiles::ok(sample_profile());
    let generator = FakeGenerator::ok("roast");

    for _ in 0..6 {
        let app = app_with(limiter.clone(), profiles.clone(), generator.clone());
        get(app, ROAST_URI, Some("203.0.113.9")).await;
    }

    tokio::time::advance(Duration::from_secs(61)).await;

    let app = app_with(limiter.clone(), profiles.clone(), generator.clone());
    let (status, _) = get(app, ROAST_URI, Some("203.0.113.9")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_fetch_failure_skips_generation() {
    let profiles = FakeProfiles::failing();
    let generator = FakeGenerator::ok("unused");
    let app = app_with(default_limiter(), profiles.clone(), generator.clone());

    let (status, body) = get(app, ROAST_URI, Some("203.0.113.1")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Error generating roast" }));
    assert_eq!(profiles.calls(), 1);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_generation_failure_is_generic() {
    let generator = FakeGenerator::failing();
    let app = app_with(default_limiter(), FakeProfiles::ok(sample_profile()), generator.clone());

    let (status, body) = get(app, ROAST_URI, Some("203.0.113.1")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Error generating roast" }));
    assert!(!body.to_string().contains("AIza"));
}

#[tokio::test]
async fn test_health_check() {
    let app = app_with(
        default_limiter(),
        FakeProfiles::ok(sample_profile()),
        FakeGenerator::ok("unused"),
    );

    let (status, body) = get(app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["service"], json!("github-roaster"));
    assert!(body["uptime_seconds"].as_i64().unwrap() >= 0);
}
