mod support;

use serde_json::json;

use quizdesk::api::models::{RegisterProfile, Role};
use quizdesk::api::transport::{ApiRequest, Method};
use quizdesk::error::ClientError;
use quizdesk::store::schema::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

use support::{ScriptedTransport, auth_manager, seed_tokens, temp_store, url};

fn stored(store: &quizdesk::store::json_store::JsonStore, key: &str) -> Option<String> {
    store.get::<String>(key)
}

#[test]
fn login_stores_both_tokens() {
    let (_dir, store) = temp_store();
    let transport = ScriptedTransport::new();
    transport.push_json(200, json!({"access": "a1", "refresh": "r1"}));

    let mut auth = auth_manager(&transport, &store);
    let credentials = auth.login("ann@example.com", "pw").unwrap();

    assert_eq!(credentials.access, "a1");
    assert_eq!(credentials.refresh, "r1");
    assert_eq!(stored(&store, ACCESS_TOKEN_KEY).as_deref(), Some("a1"));
    assert_eq!(stored(&store, REFRESH_TOKEN_KEY).as_deref(), Some("r1"));
    assert!(auth.is_authenticated());

    let request = transport.last_request().unwrap();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, url("auth/login/"));
    assert_eq!(
        request.body,
        Some(json!({"email": "ann@example.com", "password": "pw"}))
    );
}

#[test]
fn failed_login_leaves_prior_tokens_alone() {
    let (_dir, store) = temp_store();
    seed_tokens(&store, "old-access", "old-refresh");
    let transport = ScriptedTransport::new();
    transport.push_json(
        401,
        json!({"detail": "No active account found with the given credentials"}),
    );

    let mut auth = auth_manager(&transport, &store);
    let err = auth.login("ann@example.com", "wrong").unwrap_err();

    assert_eq!(
        err,
        ClientError::Auth("No active account found with the given credentials".to_string())
    );
    assert_eq!(stored(&store, ACCESS_TOKEN_KEY).as_deref(), Some("old-access"));
    assert_eq!(stored(&store, REFRESH_TOKEN_KEY).as_deref(), Some("old-refresh"));
}

#[test]
fn failed_login_without_detail_uses_fallback() {
    let (_dir, store) = temp_store();
    let transport = ScriptedTransport::new();
    transport.push_json(500, json!({}));

    let mut auth = auth_manager(&transport, &store);
    let err = auth.login("a@b.c", "pw").unwrap_err();
    assert_eq!(err.to_string(), "Login failed");
    assert!(!store.contains(ACCESS_TOKEN_KEY));
}

#[test]
fn network_error_on_login_is_not_retried() {
    let (_dir, store) = temp_store();
    let transport = ScriptedTransport::new();
    transport.push_error(ClientError::Network("connection refused".to_string()));

    let mut auth = auth_manager(&transport, &store);
    let err = auth.login("a@b.c", "pw").unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(transport.request_count(), 1);
    assert!(!auth.is_authenticated());
}

#[test]
fn unauthorized_then_refresh_then_success_returns_retry() {
    let (_dir, store) = temp_store();
    seed_tokens(&store, "stale", "r1");
    let transport = ScriptedTransport::new();
    transport
        .push_json(401, json!({"detail": "Given token not valid"}))
        .push_json(200, json!({"access": "fresh"}))
        .push_json(200, json!({"results": []}));

    let mut auth = auth_manager(&transport, &store);
    let response = auth.send(ApiRequest::get(url("tests/"))).unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.json_value(), Some(json!({"results": []})));
    assert_eq!(transport.request_count(), 3);
    assert_eq!(transport.unused(), 0);

    let requests = transport.requests();
    assert_eq!(requests[0].bearer.as_deref(), Some("stale"));
    assert_eq!(requests[1].url, url("auth/refresh/"));
    assert_eq!(requests[1].body, Some(json!({"refresh": "r1"})));
    assert_eq!(requests[2].url, url("tests/"));
    assert_eq!(requests[2].bearer.as_deref(), Some("fresh"));

    assert_eq!(stored(&store, ACCESS_TOKEN_KEY).as_deref(), Some("fresh"));
    assert_eq!(stored(&store, REFRESH_TOKEN_KEY).as_deref(), Some("r1"));
}

#[test]
fn retry_result_is_returned_as_is_even_when_unauthorized() {
    let (_dir, store) = temp_store();
    seed_tokens(&store, "stale", "r1");
    let transport = ScriptedTransport::new();
    transport
        .push_json(401, json!({}))
        .push_json(200, json!({"access": "fresh"}))
        .push_json(401, json!({}))
        .push_json(200, json!({"access": "never-used"}));

    let mut auth = auth_manager(&transport, &store);
    let response = auth.send(ApiRequest::get(url("tests/"))).unwrap();

    assert_eq!(response.status, 401);
    assert_eq!(transport.request_count(), 3);
    assert_eq!(transport.unused(), 1);
}

#[test]
fn refresh_failure_clears_tokens_and_expires_session() {
    let (_dir, store) = temp_store();
    seed_tokens(&store, "stale", "revoked");
    let transport = ScriptedTransport::new();
    transport
        .push_json(401, json!({}))
        .push_json(401, json!({"detail": "Token is blacklisted"}))
        .push_json(200, json!({"results": []}));

    let mut auth = auth_manager(&transport, &store);
    let err = auth.send(ApiRequest::get(url("tests/"))).unwrap_err();

    assert_eq!(err, ClientError::SessionExpired);
    assert_eq!(err.to_string(), "Session expired. Please login again.");
    assert!(!store.contains(ACCESS_TOKEN_KEY));
    assert!(!store.contains(REFRESH_TOKEN_KEY));
    assert!(auth.credentials().is_none());

    // The next call goes out without any bearer token.
    let response = auth.send(ApiRequest::get(url("tests/"))).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(transport.last_request().unwrap().bearer, None);
}

#[test]
fn malformed_refresh_body_counts_as_failure() {
    let (_dir, store) = temp_store();
    seed_tokens(&store, "stale", "r1");
    let transport = ScriptedTransport::new();
    transport.push_json(200, json!({"token": "wrong-shape"}));

    let mut auth = auth_manager(&transport, &store);
    assert_eq!(auth.refresh_access_token(), None);
    assert!(!auth.is_authenticated());
    assert!(!store.contains(REFRESH_TOKEN_KEY));
}

#[test]
fn unauthorized_without_refresh_token_is_returned() {
    let (_dir, store) = temp_store();
    let transport = ScriptedTransport::new();
    transport.push_json(401, json!({"detail": "Authentication credentials were not provided."}));

    let mut auth = auth_manager(&transport, &store);
    let response = auth.send(ApiRequest::get(url("users/me/"))).unwrap();
    assert_eq!(response.status, 401);
    assert_eq!(transport.request_count(), 1);
}

#[test]
fn tokens_survive_restart_and_logout_is_idempotent() {
    let (_dir, store) = temp_store();
    let transport = ScriptedTransport::new();
    transport.push_json(200, json!({"access": "a1", "refresh": "r1"}));
    auth_manager(&transport, &store).login("a@b.c", "pw").unwrap();

    let mut restarted = auth_manager(&transport, &store);
    assert!(restarted.is_authenticated());

    restarted.logout();
    restarted.logout();
    assert!(!restarted.is_authenticated());
    assert!(!store.contains(ACCESS_TOKEN_KEY));
}

fn profile(password2: &str) -> RegisterProfile {
    RegisterProfile {
        email: "ann@example.com".to_string(),
        password: "s3cret-pass".to_string(),
        password2: password2.to_string(),
        first_name: "Ann".to_string(),
        last_name: "Lee".to_string(),
        role: Role::Student,
    }
}

#[test]
fn register_rejects_mismatched_passwords_without_request() {
    let (_dir, store) = temp_store();
    let transport = ScriptedTransport::new();
    let auth = auth_manager(&transport, &store);

    let err = auth.register(&profile("different")).unwrap_err();
    assert_eq!(err, ClientError::Validation("Passwords do not match".to_string()));
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn register_joins_field_errors_in_server_order() {
    let (_dir, store) = temp_store();
    let transport = ScriptedTransport::new();
    transport.push_json(
        400,
        json!({
            "email": ["user with this email already exists."],
            "password": ["This password is too common."]
        }),
    );
    let auth = auth_manager(&transport, &store);

    let err = auth.register(&profile("s3cret-pass")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "user with this email already exists., This password is too common."
    );

    let body = transport.last_request().unwrap().body.unwrap();
    assert_eq!(body["role"], "student");
    assert_eq!(body["password2"], "s3cret-pass");
}

#[test]
fn register_success_does_not_log_in() {
    let (_dir, store) = temp_store();
    let transport = ScriptedTransport::new();
    transport.push_json(201, json!({"id": 7, "email": "ann@example.com"}));
    let auth = auth_manager(&transport, &store);

    auth.register(&profile("s3cret-pass")).unwrap();
    assert!(!auth.is_authenticated());
    assert_eq!(transport.last_request().unwrap().url, url("auth/register/"));
}
