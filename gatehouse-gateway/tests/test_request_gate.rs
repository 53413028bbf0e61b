//! End-to-end tests of the request gate: limiter, bearer check and
//! error mapping over the full router.

mod common;

use async_trait::async_trait;
use axum::http::{StatusCode, header};
use serde_json::json;
use std::sync::Arc;

use gatehouse_core::config::BucketConfig;
use gatehouse_core::infrastructure::rate_limiter::{
    BucketOutcome, BucketPolicy, RateLimitStorage, RateLimitStorageError,
};

use common::*;

struct UnreachableStorage;

#[async_trait]
impl RateLimitStorage for UnreachableStorage {
    async fn take_tokens(
        &self,
        _key: &str,
        _policy: &BucketPolicy,
        _now_ms: u64,
        _cost: u32,
    ) -> Result<BucketOutcome, RateLimitStorageError> {
        Err(RateLimitStorageError::Connection("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), RateLimitStorageError> {
        Ok(())
    }

    async fn cleanup(&self) {}

    fn backend_name(&self) -> &'static str {
        "unreachable"
    }
}

// ============================================================================
// Registration and login
// ============================================================================

#[tokio::test]
async fn test_register_then_duplicate_is_conflict() {
    let router = build_router(&test_config());

    let response = register(&router, "ada@example.com").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        body_json(response).await["message"],
        "User registered successfully"
    );

    let response = register(&router, "ada@example.com").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "EMAIL_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_register_rejects_bad_input_with_400() {
    let router = build_router(&test_config());
    let cases = [
        json!({ "name": "A", "email": "not-an-email", "password": PASSWORD }),
        json!({ "name": "A", "email": "a@example.com", "password": "short" }),
        json!({ "name": "", "email": "a@example.com", "password": PASSWORD }),
        json!({ "email": "a@example.com", "password": PASSWORD }),
    ];

    for body in cases {
        let request = json_request("POST", "/api/v1/auth/register", body.clone());
        let response = send(&router, request, peer(1)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let router = build_router(&test_config());
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();

    let response = send(&router, request, peer(1)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_returns_bearer_pair() {
    let router = build_router(&test_config());
    register(&router, "grace@example.com").await;

    let request = json_request(
        "POST",
        "/api/v1/auth/login",
        json!({ "email": "grace@example.com", "password": PASSWORD }),
    );
    let response = send(&router, request, peer(1)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 900);
    assert!(body["access_token"].as_str().is_some());
    assert!(body["refresh_token"].as_str().is_some());
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let router = build_router(&test_config());
    register(&router, "grace@example.com").await;

    let wrong_password = json_request(
        "POST",
        "/api/v1/auth/login",
        json!({ "email": "grace@example.com", "password": "wrong-password" }),
    );
    let unknown = json_request(
        "POST",
        "/api/v1/auth/login",
        json!({ "email": "nobody@example.com", "password": PASSWORD }),
    );

    let first = send(&router, wrong_password, peer(1)).await;
    let second = send(&router, unknown, peer(1)).await;
    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(first).await["message"],
        body_json(second).await["message"]
    );
}

// ============================================================================
// Protected route
// ============================================================================

#[tokio::test]
async fn test_profile_requires_bearer() {
    let router = build_router(&test_config());
    let request = axum::http::Request::builder()
        .uri("/api/v1/profile")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = send(&router, request, peer(1)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_profile_with_access_token() {
    let router = build_router(&test_config());
    let (access, _) = login(&router, "grace@example.com").await;

    let response = send(&router, bearer_request("GET", "/api/v1/profile", &access), peer(1)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("ratelimit-remaining"));

    let body = body_json(response).await;
    assert_eq!(body["message"], "Profile fetched");
    assert_eq!(body["email"], "grace@example.com");
    assert_eq!(body["name"], "Test User");
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let router = build_router(&test_config());
    let (_, refresh) = login(&router, "grace@example.com").await;

    let response = send(&router, bearer_request("GET", "/api/v1/profile", &refresh), peer(1)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_garbage_token_is_401() {
    let router = build_router(&test_config());
    let response = send(
        &router,
        bearer_request("GET", "/api/v1/profile", "not.a.jwt"),
        peer(1),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Logout and refresh
// ============================================================================

#[tokio::test]
async fn test_logout_revokes_access_token() {
    let router = build_router(&test_config());
    let (access, _) = login(&router, "grace@example.com").await;

    let response = send(&router, bearer_request("POST", "/api/v1/auth/logout", &access), peer(1)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Logout successful");

    let response = send(&router, bearer_request("GET", "/api/v1/profile", &access), peer(1)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["message"], "Token has been revoked");
}

#[tokio::test]
async fn test_logout_without_bearer_is_401() {
    let router = build_router(&test_config());
    let request = json_request("POST", "/api/v1/auth/logout", json!({}));

    let response = send(&router, request, peer(1)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reusable_refresh_keeps_working() {
    let router = build_router(&test_config());
    let (_, refresh) = login(&router, "grace@example.com").await;

    for _ in 0..2 {
        let request = json_request(
            "POST",
            "/api/v1/auth/refresh",
            json!({ "refresh_token": refresh }),
        );
        let response = send(&router, request, peer(1)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Token refreshed");
        assert!(body.get("refresh_token").is_none());

        let access = body["access_token"].as_str().unwrap();
        let profile = send(&router, bearer_request("GET", "/api/v1/profile", access), peer(1)).await;
        assert_eq!(profile.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_rotating_refresh_is_single_use() {
    let router = build_router(&rotating_config());
    let (_, refresh) = login(&router, "grace@example.com").await;

    let request = json_request(
        "POST",
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh }),
    );
    let response = send(&router, request, peer(1)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let replacement = body_json(response).await["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(replacement, refresh);

    let replay = json_request(
        "POST",
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh }),
    );
    let response = send(&router, replay, peer(1)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_access_token_cannot_refresh() {
    let router = build_router(&test_config());
    let (access, _) = login(&router, "grace@example.com").await;

    let request = json_request(
        "POST",
        "/api/v1/auth/refresh",
        json!({ "refresh_token": access }),
    );
    let response = send(&router, request, peer(1)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_with_refresh_token_revokes_it_under_rotation() {
    let router = build_router(&rotating_config());
    let (access, refresh) = login(&router, "grace@example.com").await;

    let mut request = json_request(
        "POST",
        "/api/v1/auth/logout",
        json!({ "refresh_token": refresh }),
    );
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", access).parse().unwrap(),
    );
    let response = send(&router, request, peer(1)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let request = json_request(
        "POST",
        "/api/v1/auth/refresh",
        json!({ "refresh_token": refresh }),
    );
    let response = send(&router, request, peer(1)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Rate limiting
// ============================================================================

#[tokio::test]
async fn test_login_budget_exhausts_with_429() {
    let mut config = test_config();
    config.rate_limit.classes.login = BucketConfig::new(2, 2.0);
    let router = build_router(&config);

    for _ in 0..2 {
        let request = json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "email": "x@example.com", "password": PASSWORD }),
        );
        let response = send(&router, request, peer(9)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let request = json_request(
        "POST",
        "/api/v1/auth/login",
        json!({ "email": "x@example.com", "password": PASSWORD }),
    );
    let response = send(&router, request, peer(9)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "30");
    assert_eq!(response.headers()["ratelimit-remaining"], "0");

    let body = body_json(response).await;
    assert_eq!(body["code"], "RATE_LIMIT_EXCEEDED");
}

#[tokio::test]
async fn test_callers_have_separate_budgets() {
    let mut config = test_config();
    config.rate_limit.classes.login = BucketConfig::new(1, 1.0);
    let router = build_router(&config);
    let body = json!({ "email": "x@example.com", "password": PASSWORD });

    let first = send(&router, json_request("POST", "/api/v1/auth/login", body.clone()), peer(10)).await;
    let second = send(&router, json_request("POST", "/api/v1/auth/login", body.clone()), peer(10)).await;
    let other = send(&router, json_request("POST", "/api/v1/auth/login", body), peer(11)).await;

    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(other.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_action_classes_have_separate_budgets() {
    let mut config = test_config();
    config.rate_limit.classes.register = BucketConfig::new(1, 1.0);
    let router = build_router(&config);

    assert_eq!(register(&router, "a@example.com").await.status(), StatusCode::CREATED);
    assert_eq!(
        register(&router, "b@example.com").await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let request = json_request(
        "POST",
        "/api/v1/auth/login",
        json!({ "email": "a@example.com", "password": PASSWORD }),
    );
    assert_eq!(send(&router, request, peer(1)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_limiter_runs_before_token_verification() {
    let mut config = test_config();
    config.rate_limit.classes.profile = BucketConfig::new(1, 1.0);
    let router = build_router(&config);

    let first = send(&router, bearer_request("GET", "/api/v1/profile", "bogus"), peer(12)).await;
    let second = send(&router, bearer_request("GET", "/api/v1/profile", "bogus"), peer(12)).await;

    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_global_budget_spans_callers_and_routes() {
    let mut config = test_config();
    config.rate_limit.classes.global = Some(BucketConfig::new(2, 2.0));
    let router = build_router(&config);
    let body = json!({ "email": "x@example.com", "password": PASSWORD });

    let first = send(&router, json_request("POST", "/api/v1/auth/login", body.clone()), peer(20)).await;
    let second = send(&router, bearer_request("GET", "/api/v1/profile", "bogus"), peer(21)).await;
    let third = send(&router, json_request("POST", "/api/v1/auth/login", body), peer(22)).await;

    assert_eq!(first.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_disabled_limiter_admits_everything() {
    let mut config = test_config();
    config.rate_limit.enabled = false;
    config.rate_limit.classes.login = BucketConfig::new(1, 1.0);
    let router = build_router(&config);

    for _ in 0..3 {
        let request = json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "email": "x@example.com", "password": PASSWORD }),
        );
        let response = send(&router, request, peer(13)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!response.headers().contains_key("ratelimit-limit"));
    }
}

#[tokio::test]
async fn test_unreachable_store_fails_open() {
    let mut config = test_config();
    config.rate_limit.classes.login = BucketConfig::new(1, 1.0);
    let router = build_router_with_storage(&config, Arc::new(UnreachableStorage));

    for _ in 0..5 {
        let request = json_request(
            "POST",
            "/api/v1/auth/login",
            json!({ "email": "x@example.com", "password": PASSWORD }),
        );
        let response = send(&router, request, peer(14)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

// ============================================================================
// Public routes
// ============================================================================

#[tokio::test]
async fn test_health_reports_backends() {
    let router = build_router(&test_config());
    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = send(&router, request, peer(1)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["details"]["rate_limiter"], "memory");
    assert_eq!(body["details"]["cache"], "memory");
}

#[tokio::test]
async fn test_openapi_document_served_when_enabled() {
    let router = build_router(&test_config());
    let request = axum::http::Request::builder()
        .uri("/api-docs/openapi.json")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = send(&router, request, peer(1)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["paths"]["/api/v1/profile"].is_object());

    let mut config = test_config();
    config.server.enable_docs = false;
    let router = build_router(&config);
    let request = axum::http::Request::builder()
        .uri("/api-docs/openapi.json")
        .body(axum::body::Body::empty())
        .unwrap();
    assert_eq!(send(&router, request, peer(1)).await.status(), StatusCode::NOT_FOUND);
}
