//! Bearer authentication, scopes and rate limiting

mod common;

use axum::http::{Method, StatusCode};
use common::{test_config, TestApp};
use labdesk_common::auth::JwtManager;
use pretty_assertions::assert_eq;
use serde_json::json;

const SECRET: &str = "integration-test-secret";

async fn secured_app() -> TestApp {
    let mut config = test_config();
    config.auth.jwt_secret = Some(SECRET.to_string());
    TestApp::with_config(config).await
}

fn token(scopes: &[&str]) -> String {
    JwtManager::new(SECRET, 3600)
        .generate_token("tester", scopes.iter().map(|s| s.to_string()).collect())
        .expect("token")
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = secured_app().await;

    let (status, body) = app.get("/api/v1/faculties").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .call(Method::GET, "/api/v1/faculties", None, Some("not-a-jwt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_elsewhere_is_rejected() {
    let app = secured_app().await;
    let foreign = JwtManager::new("some-other-secret", 3600)
        .generate_token("intruder", vec!["admin".into()])
        .expect("token");

    let (status, _) = app
        .call(Method::GET, "/api/v1/faculties", None, Some(&foreign))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn scopes_gate_reads_and_writes() {
    let app = secured_app().await;
    let reader = token(&["read"]);
    let writer = token(&["read", "write"]);
    let body = json!({"facultyName": "Faculty of Law"});

    let (status, page) = app
        .call(Method::GET, "/api/v1/faculties", None, Some(&reader))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalItems"], 0);

    let (status, error) = app
        .call(Method::POST, "/api/v1/faculties", Some(body.clone()), Some(&reader))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["code"], "FORBIDDEN");

    let (status, _) = app
        .call(Method::POST, "/api/v1/faculties", Some(body), Some(&writer))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call(Method::DELETE, "/api/v1/faculties/1", None, Some(&reader))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_implies_every_scope() {
    let app = secured_app().await;
    let admin = token(&["admin"]);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/v1/domains",
            Some(json!({"domainName": "Optics"})),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .call(Method::GET, "/api/v1/domains/all", None, Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_checks_are_public() {
    let app = secured_app().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn metrics_are_absent_without_a_recorder() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/api/v1/no-such-resource").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bursts_beyond_the_limit_are_throttled() {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.requests_per_second = 1;
    config.rate_limit.burst = 1;
    let app = TestApp::with_config(config).await;

    let (status, _) = app.get("/api/v1/faculties").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/api/v1/faculties").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["code"], "RATE_LIMITED");

    // Probes sit outside the limited router
    let (status, _) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
}
