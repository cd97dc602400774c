//! Integration tests for the IPC auth bridge
//!
//! Exercises the bridge logic end to end against an in-memory session
//! store, recording/failing browser openers, and a mock identity provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};
use parking_lot::Mutex;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dm_auth::{AuthService, Session};
use dm_config::AuthConfig;
use dm_session::{MemorySessionStore, SessionStorage};
use dm_types::{AppError, AppResult, User};
use doorman::auth::manager::AuthManager;
use doorman::auth::opener::ExternalOpener;

/// Opener that records every URL instead of launching a browser
struct RecordingOpener {
    opened: Arc<Mutex<Vec<String>>>,
}

impl ExternalOpener for RecordingOpener {
    fn open_external(&self, url: &str) -> AppResult<()> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

/// Opener that always fails, simulating a missing system browser
struct FailingOpener;

impl ExternalOpener for FailingOpener {
    fn open_external(&self, _url: &str) -> AppResult<()> {
        Err(AppError::ExternalOpen(
            "xdg-open exited with status 4".to_string(),
        ))
    }
}

fn test_config(auth_domain: &str) -> AuthConfig {
    AuthConfig {
        client_id: "client_01".to_string(),
        api_key: "sk_test".to_string(),
        session_passphrase: "hunter2".to_string(),
        redirect_uri: "doorman://callback".to_string(),
        auth_domain: auth_domain.to_string(),
    }
}

fn user_json() -> serde_json::Value {
    json!({
        "id": "user_01",
        "email": "ada@example.com",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "profilePictureUrl": null
    })
}

fn test_user() -> User {
    serde_json::from_value(user_json()).unwrap()
}

/// Bridge wired to a recording opener; returns handles to the recorded URLs
/// and the backing store
fn recording_manager(
    auth_domain: &str,
) -> (
    AuthManager<MemorySessionStore>,
    Arc<MemorySessionStore>,
    Arc<Mutex<Vec<String>>>,
) {
    let storage = Arc::new(MemorySessionStore::new());
    let opened = Arc::new(Mutex::new(Vec::new()));
    let manager = AuthManager::new(
        AuthService::new(test_config(auth_domain), storage.clone()),
        Box::new(RecordingOpener {
            opened: opened.clone(),
        }),
    );
    (manager, storage, opened)
}

fn state_of(sign_in_url: &str) -> String {
    reqwest::Url::parse(sign_in_url)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

/// A session blob expiring far enough out that no refresh is attempted
fn fresh_session_blob() -> String {
    Session {
        session_id: "sess_1".to_string(),
        access_token: "at_1".to_string(),
        refresh_token: "rt_1".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
        user: test_user(),
    }
    .to_blob()
    .unwrap()
}

#[tokio::test]
async fn test_sign_in_opens_authorize_url() {
    let (manager, _storage, opened) = recording_manager("https://auth.example.com");

    let result = manager.sign_in().await;
    assert!(result.success);
    assert!(result.error.is_none());

    let opened = opened.lock();
    assert_eq!(opened.len(), 1);
    assert!(opened[0].starts_with("https://auth.example.com/oauth2/authorize?"));
    assert!(opened[0].contains("client_id=client_01"));
    assert!(opened[0].contains("code_challenge="));
}

#[tokio::test]
async fn test_sign_in_open_failure_is_structured() {
    let storage = Arc::new(MemorySessionStore::new());
    let manager = AuthManager::new(
        AuthService::new(test_config("https://auth.example.com"), storage),
        Box::new(FailingOpener),
    );

    let result = manager.sign_in().await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("xdg-open"));

    // The failure is contained; the bridge keeps answering
    assert!(manager.get_user().await.is_none());
}

#[tokio::test]
async fn test_get_user_without_session_is_offline() {
    let server = MockServer::start().await;
    let (manager, _storage, _opened) = recording_manager(&server.uri());

    // Any request to the provider fails verification when the server drops
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    assert!(manager.get_user().await.is_none());
}

#[tokio::test]
async fn test_sign_out_without_session_broadcasts_null() {
    let (manager, storage, opened) = recording_manager("https://auth.example.com");

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    manager.broadcaster().subscribe(move |payload| {
        received_clone.lock().push(payload.user.clone());
    });

    let result = manager.sign_out().await;
    assert!(result.success);

    // Exactly one broadcast, with no user, and no browser involved
    let received = received.lock();
    assert_eq!(received.len(), 1);
    assert!(received[0].is_none());
    assert!(opened.lock().is_empty());
    assert!(storage.get_session().await.is_none());
}

#[tokio::test]
async fn test_unsubscribed_listener_misses_broadcast() {
    let (manager, _storage, _opened) = recording_manager("https://auth.example.com");

    let kept = Arc::new(AtomicUsize::new(0));
    let dropped = Arc::new(AtomicUsize::new(0));

    let kept_clone = kept.clone();
    manager.broadcaster().subscribe(move |_| {
        kept_clone.fetch_add(1, Ordering::SeqCst);
    });
    let dropped_clone = dropped.clone();
    let id = manager.broadcaster().subscribe(move |_| {
        dropped_clone.fetch_add(1, Ordering::SeqCst);
    });
    manager.broadcaster().unsubscribe(id);

    let result = manager.sign_out().await;
    assert!(result.success);

    assert_eq!(kept.load(Ordering::SeqCst), 1);
    assert_eq!(dropped.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_full_sign_in_flow_announces_user() {
    let server = MockServer::start().await;
    let (manager, _storage, opened) = recording_manager(&server.uri());

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at_1",
            "refresh_token": "rt_1",
            "expires_in": 3600,
            "session_id": "sess_1",
            "user": user_json()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    manager.broadcaster().subscribe(move |payload| {
        received_clone.lock().push(payload.user.clone());
    });

    assert!(manager.sign_in().await.success);

    // Simulate the OS handing the redirect back to the app
    let state = state_of(&opened.lock()[0]);
    manager
        .handle_auth_callback(&format!("doorman://callback?code=abc&state={}", state))
        .await
        .unwrap();

    {
        let received = received.lock();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].as_ref().unwrap().email, "ada@example.com");
    }

    // Session is persisted; the user resolves with no further provider call
    let user = manager.get_user().await.unwrap();
    assert_eq!(user.id, "user_01");
}

#[tokio::test]
async fn test_sign_out_with_session_opens_logout_url() {
    let (manager, storage, opened) = recording_manager("https://auth.example.com");
    storage
        .save_session(None, &fresh_session_blob())
        .await
        .unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    manager.broadcaster().subscribe(move |payload| {
        received_clone.lock().push(payload.user.clone());
    });

    let result = manager.sign_out().await;
    assert!(result.success);

    let opened = opened.lock();
    assert_eq!(opened.len(), 1);
    assert_eq!(
        opened[0],
        "https://auth.example.com/oauth2/logout?session_id=sess_1"
    );

    assert!(storage.get_session().await.is_none());

    let received = received.lock();
    assert_eq!(received.len(), 1);
    assert!(received[0].is_none());
}

#[tokio::test]
async fn test_get_user_persists_refreshed_session() {
    let server = MockServer::start().await;
    let (manager, storage, _opened) = recording_manager(&server.uri());

    // Stored session is inside the refresh window
    let expiring = Session {
        session_id: "sess_1".to_string(),
        access_token: "at_1".to_string(),
        refresh_token: "rt_1".to_string(),
        expires_at: Utc::now() + Duration::seconds(10),
        user: test_user(),
    };
    storage
        .save_session(None, &expiring.to_blob().unwrap())
        .await
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "at_2",
            "refresh_token": "rt_2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = manager.get_user().await.unwrap();
    assert_eq!(user.id, "user_01");

    // The refreshed record was written back before get_user returned
    let stored = Session::from_blob(&storage.get_session().await.unwrap()).unwrap();
    assert_eq!(stored.access_token, "at_2");
    assert_eq!(stored.refresh_token, "rt_2");
}
