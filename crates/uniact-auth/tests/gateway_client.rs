//! Integration tests for AuthGateway, ApiClient and AuthContext.
//!
//! Uses wiremock for HTTP mocking. Tests cover login response shapes, token
//! synthesis, failure reporting, refresh rotation and 401 handling on data
//! requests.

use std::sync::Arc;

use serde_json::json;
use uniact_auth::{
    paths, ActionResult, ApiClient, AuthAction, AuthConfig, AuthContext, AuthError, AuthGateway,
    Credentials, DurableStorage, GuardDecision, Identity, MemoryStorage, Role, SessionState,
    SessionStore, REFRESH_TOKEN_KEY, SESSION_KEY,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(mock_server: &MockServer) -> AuthConfig {
    AuthConfig::default()
        .with_url(mock_server.uri())
        .with_timeout(5)
}

fn create_gateway(mock_server: &MockServer) -> AuthGateway {
    AuthGateway::new(&config_for(mock_server)).expect("failed to create gateway")
}

fn empty_store() -> (SessionStore, MemoryStorage) {
    let storage = MemoryStorage::new();
    (SessionStore::open(Arc::new(storage.clone())), storage)
}

fn credentials() -> Credentials {
    Credentials::new("65015368", "correct-horse")
}

#[tokio::test]
async fn test_login_success_saves_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"studentId": "65015368", "password": "correct-horse"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": "1", "studentId": "65015368", "role": "staff", "firstName": "Anan"},
            "token": "tok123",
            "refreshToken": "ref1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, storage) = empty_store();

    let outcome = gateway.authenticate(&mut store, &credentials()).await;

    assert!(outcome.is_success(), "unexpected error: {:?}", outcome.error);
    assert_eq!(outcome.identity.role, Role::Staff);
    assert_eq!(outcome.token, "tok123");
    assert!(store.has_role(&[Role::Staff]));
    assert_eq!(store.refresh_token(), Some("ref1".to_string()));

    let reloaded = SessionStore::open(Arc::new(storage));
    assert_eq!(reloaded.identity(), Some(&outcome.identity));
}

#[tokio::test]
async fn test_login_without_token_synthesizes_one() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": 5, "studentId": 65015368}
        })))
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, _) = empty_store();

    let outcome = gateway.authenticate(&mut store, &credentials()).await;

    assert!(outcome.is_success());
    assert!(!outcome.token.is_empty());
    assert_eq!(outcome.identity.id, "5");
    assert_eq!(outcome.identity.role, Role::Student);
    assert!(store.is_authenticated());
    assert_eq!(store.token(), Some(outcome.token.as_str()));
}

#[tokio::test]
async fn test_login_without_token_rejected_when_synthesis_disabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": "5", "studentId": "65015368"}
        })))
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server).with_allow_missing_token(false);
    let gateway = AuthGateway::new(&config).unwrap();
    let (mut store, _) = empty_store();

    let outcome = gateway.authenticate(&mut store, &credentials()).await;

    assert!(!outcome.is_success());
    assert!(outcome.identity.is_empty());
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn test_login_nested_data_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "user": {"_id": "u-77", "role": "ADMIN", "email": "root@uni.ac.th"},
                "accessToken": "nested-token"
            }
        })))
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, _) = empty_store();

    let outcome = gateway.authenticate(&mut store, &credentials()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.identity.id, "u-77");
    assert_eq!(outcome.identity.student_id, "65015368");
    assert_eq!(outcome.identity.role, Role::Admin);
    assert_eq!(outcome.token, "nested-token");
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, _) = empty_store();

    let outcome = gateway.authenticate(&mut store, &credentials()).await;

    assert_eq!(
        outcome.error.as_deref(),
        Some("Invalid student ID or password")
    );
    assert!(outcome.identity.is_empty());
    assert!(outcome.token.is_empty());
    assert_eq!(store.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_login_server_message_is_surfaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Account not activated"})),
        )
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, _) = empty_store();

    let outcome = gateway.authenticate(&mut store, &credentials()).await;

    let error = outcome.error.expect("expected error");
    assert!(error.contains("Account not activated"), "got: {}", error);
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn test_login_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, _) = empty_store();

    let outcome = gateway.authenticate(&mut store, &credentials()).await;

    assert!(!outcome.is_success());
    assert!(outcome.identity.is_empty());
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn test_login_response_without_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "orphan"})))
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, _) = empty_store();

    let outcome = gateway.authenticate(&mut store, &credentials()).await;

    assert!(!outcome.is_success());
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn test_login_network_error_leaves_state_unchanged() {
    // Nothing listens on the reserved discard port.
    let config = AuthConfig::default()
        .with_url("http://127.0.0.1:9")
        .with_timeout(2);
    let gateway = AuthGateway::new(&config).unwrap();
    let (mut store, storage) = empty_store();

    let outcome = gateway.authenticate(&mut store, &credentials()).await;

    assert!(outcome.identity.is_empty());
    assert!(outcome.error.as_deref().is_some_and(|e| !e.is_empty()));
    assert_eq!(store.state(), SessionState::Unauthenticated);
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_failed_login_keeps_existing_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, _) = empty_store();
    let existing = Identity::new("1", "65015368", Role::Student);
    store.save(existing.clone(), "old-token");

    let outcome = gateway.authenticate(&mut store, &credentials()).await;

    assert!(!outcome.is_success());
    assert_eq!(store.identity(), Some(&existing));
    assert_eq!(store.token(), Some("old-token"));
}

#[tokio::test]
async fn test_refresh_rotates_tokens() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refreshToken": "ref1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "tok2",
            "refreshToken": "ref2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, storage) = empty_store();
    let identity = Identity::new("1", "65015368", Role::Student);
    store.save_with_refresh(identity.clone(), "tok1", Some("ref1".into()));

    let token = gateway.refresh(&mut store).await.unwrap();

    assert_eq!(token, "tok2");
    assert_eq!(store.token(), Some("tok2"));
    assert_eq!(store.identity(), Some(&identity));
    assert_eq!(store.refresh_token(), Some("ref2".to_string()));
    assert_eq!(
        storage.get(REFRESH_TOKEN_KEY).unwrap(),
        Some("\"ref2\"".to_string())
    );
}

#[tokio::test]
async fn test_refresh_without_refresh_token() {
    let mock_server = MockServer::start().await;
    let gateway = create_gateway(&mock_server);
    let (mut store, _) = empty_store();
    store.save(Identity::new("1", "65015368", Role::Student), "tok1");

    let result = gateway.refresh(&mut store).await;

    assert!(matches!(result, Err(AuthError::NoRefreshToken)));
    assert!(store.is_authenticated());
}

#[tokio::test]
async fn test_refresh_rejected_clears_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, storage) = empty_store();
    store.save_with_refresh(
        Identity::new("1", "65015368", Role::Student),
        "tok1",
        Some("revoked".into()),
    );

    let result = gateway.refresh(&mut store).await;

    assert!(matches!(result, Err(AuthError::Unauthorized { .. })));
    assert!(!store.is_authenticated());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_api_get_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/activities"))
        .and(header("authorization", "Bearer tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Campus clean-up"}
        ])))
        .mount(&mock_server)
        .await;

    let api = ApiClient::new(create_gateway(&mock_server));
    let (mut store, _) = empty_store();
    store.save(Identity::new("1", "65015368", Role::Student), "tok123");

    let body = api.get_json(&mut store, "/activities").await.unwrap();
    assert_eq!(body[0]["title"], "Campus clean-up");
}

#[tokio::test]
async fn test_api_get_requires_session() {
    let mock_server = MockServer::start().await;
    let api = ApiClient::new(create_gateway(&mock_server));
    let (mut store, _) = empty_store();

    let result = api.get_json(&mut store, "/activities").await;
    assert!(matches!(result, Err(AuthError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_api_401_refreshes_and_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "fresh"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = ApiClient::new(create_gateway(&mock_server));
    let (mut store, _) = empty_store();
    store.save_with_refresh(
        Identity::new("1", "65015368", Role::Student),
        "stale",
        Some("ref1".into()),
    );

    let body = api.get_json(&mut store, "/users/me").await.unwrap();

    assert_eq!(body["id"], "1");
    assert_eq!(store.token(), Some("fresh"));
    // Rotation is optional; the old refresh token is kept.
    assert_eq!(store.refresh_token(), Some("ref1".to_string()));
}

#[tokio::test]
async fn test_api_401_without_refresh_token_ends_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .mount(&mock_server)
        .await;

    let api = ApiClient::new(create_gateway(&mock_server));
    let (mut store, storage) = empty_store();
    store.save(Identity::new("1", "65015368", Role::Student), "expired");

    let result = api.get_json(&mut store, "/users/me").await;

    match result {
        Err(AuthError::Unauthorized { message }) => assert_eq!(message, "jwt expired"),
        other => panic!("expected Unauthorized, got {:?}", other),
    }
    assert!(!store.is_authenticated());
    assert!(storage.get(SESSION_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_api_non_auth_errors_keep_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/activities/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Activity not found"})))
        .mount(&mock_server)
        .await;

    let api = ApiClient::new(create_gateway(&mock_server));
    let (mut store, _) = empty_store();
    store.save(Identity::new("1", "65015368", Role::Student), "tok");

    let result = api.get_json(&mut store, "/activities/404").await;

    match result {
        Err(AuthError::HttpStatus { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Activity not found");
        }
        other => panic!("expected HttpStatus, got {:?}", other),
    }
    assert!(store.is_authenticated());
}

#[tokio::test]
async fn test_context_dispatch_login_and_logout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": "3", "studentId": "65015368", "role": "staff"},
            "token": "staff-token"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer staff-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let storage = MemoryStorage::new();
    let mut ctx = AuthContext::new(&config_for(&mock_server), Arc::new(storage.clone())).unwrap();
    assert_eq!(ctx.guard("/staff"), GuardDecision::Redirect(paths::LOGIN));

    let result = ctx.dispatch(AuthAction::Login(credentials())).await;
    assert!(matches!(result, ActionResult::LoggedIn(ref identity) if identity.role == Role::Staff));
    assert!(ctx.guard("/staff").is_render());
    assert_eq!(ctx.guard("/admin"), GuardDecision::Redirect(paths::STAFF_HOME));

    let result = ctx.dispatch(AuthAction::Logout).await;
    assert_eq!(result, ActionResult::LoggedOut);
    assert!(!ctx.is_authenticated());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_logout_clears_even_when_api_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, storage) = empty_store();
    store.save(Identity::new("1", "65015368", Role::Admin), "tok");

    gateway.logout(&mut store).await;

    assert!(!store.is_authenticated());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_login_as_other_user_drops_previous_refresh_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": "2", "studentId": "65019999", "role": "student"},
            "token": "tok-b"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "stolen"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let gateway = create_gateway(&mock_server);
    let (mut store, storage) = empty_store();
    store.save_with_refresh(
        Identity::new("1", "65015368", Role::Admin),
        "tok-a",
        Some("refresh-a".into()),
    );

    let outcome = gateway
        .authenticate(&mut store, &Credentials::new("65019999", "pw"))
        .await;

    assert!(outcome.is_success());
    assert_eq!(store.identity().map(|i| i.id.as_str()), Some("2"));
    assert_eq!(store.refresh_token(), None);
    assert_eq!(storage.get(REFRESH_TOKEN_KEY).unwrap(), None);
    assert!(matches!(
        gateway.refresh(&mut store).await,
        Err(AuthError::NoRefreshToken)
    ));
}
