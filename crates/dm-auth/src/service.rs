//! Auth service: hosted sign-in, state resolution, refresh, and sign-out

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::pkce::{generate_pkce_challenge, generate_state};
use crate::session::Session;
use chrono::{Duration, Utc};
use dm_config::AuthConfig;
use dm_session::SessionStorage;
use dm_types::{AppError, AppResult, User};

/// Access-token lifetime assumed when the provider omits `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Resolved auth state for the current stored session.
///
/// When resolution refreshed the session, the new serialized record is in
/// `refreshed_session` and the CALLER must persist it — the read path never
/// writes storage itself.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub user: Option<User>,
    pub session_id: Option<String>,
    pub refreshed_session: Option<String>,
}

impl AuthState {
    fn signed_out() -> Self {
        Self {
            user: None,
            session_id: None,
            refreshed_session: None,
        }
    }
}

/// Sign-in attempt awaiting its redirect callback
struct PendingSignIn {
    csrf_state: String,
    code_verifier: String,
}

/// Token endpoint response (code exchange and refresh grant share the shape)
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,

    #[serde(default)]
    refresh_token: Option<String>,

    /// Expires in seconds
    #[serde(default)]
    expires_in: Option<i64>,

    #[serde(default)]
    session_id: Option<String>,

    #[serde(default)]
    user: Option<User>,
}

/// Client for the hosted identity provider.
///
/// Owns the pending sign-in state (PKCE verifier + CSRF state) and the
/// session storage adapter; everything network-side goes through one
/// `reqwest` client.
pub struct AuthService<S: SessionStorage> {
    config: AuthConfig,
    storage: Arc<S>,
    http: reqwest::Client,
    /// At most one sign-in can be pending; starting a new one replaces it
    pending: Mutex<Option<PendingSignIn>>,
}

impl<S: SessionStorage> AuthService<S> {
    pub fn new(config: AuthConfig, storage: Arc<S>) -> Self {
        Self {
            config,
            storage,
            http: reqwest::Client::new(),
            pending: Mutex::new(None),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.auth_domain.trim_end_matches('/'), path)
    }

    /// Build the hosted sign-in URL and remember the pending PKCE/CSRF
    /// material for the redirect callback.
    pub fn sign_in_url(&self) -> AppResult<String> {
        self.config.validate().map_err(AppError::Config)?;

        let pkce = generate_pkce_challenge();
        let csrf_state = generate_state();

        let url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&code_challenge={}&code_challenge_method=S256&state={}",
            self.endpoint("/oauth2/authorize"),
            urlencoding::encode(&self.config.client_id),
            urlencoding::encode(&self.config.redirect_uri),
            urlencoding::encode(&pkce.code_challenge),
            urlencoding::encode(&csrf_state),
        );

        *self.pending.lock() = Some(PendingSignIn {
            csrf_state,
            code_verifier: pkce.code_verifier,
        });

        debug!("Built sign-in URL for client {}", self.config.client_id);

        Ok(url)
    }

    /// Complete a sign-in from the captured redirect URL.
    ///
    /// Verifies the CSRF state against the pending sign-in, exchanges the
    /// authorization code, persists the new session, and returns the user.
    pub async fn complete_sign_in(&self, callback_url: &str) -> AppResult<User> {
        let url = reqwest::Url::parse(callback_url)
            .map_err(|e| AppError::Auth(format!("Invalid callback URL: {}", e)))?;

        let mut code = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }

        let code =
            code.ok_or_else(|| AppError::Auth("Callback is missing the code parameter".into()))?;
        let state =
            state.ok_or_else(|| AppError::Auth("Callback is missing the state parameter".into()))?;

        let pending = self
            .pending
            .lock()
            .take()
            .ok_or_else(|| AppError::Auth("No sign-in in progress".into()))?;

        if pending.csrf_state != state {
            return Err(AppError::Auth("State parameter mismatch".into()));
        }

        let params = [
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code_verifier", pending.code_verifier.as_str()),
        ];

        let response = self.post_token_request(&params).await?;

        let session = Session {
            session_id: response
                .session_id
                .ok_or_else(|| AppError::Auth("Token response missing session_id".into()))?,
            refresh_token: response
                .refresh_token
                .ok_or_else(|| AppError::Auth("Token response missing refresh_token".into()))?,
            expires_at: Utc::now()
                + Duration::seconds(response.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)),
            access_token: response.access_token,
            user: response
                .user
                .ok_or_else(|| AppError::Auth("Token response missing user".into()))?,
        };

        self.storage.save_session(None, &session.to_blob()?).await?;

        info!("Sign-in completed for user {}", session.user.id);

        Ok(session.user)
    }

    /// Resolve the auth state of the stored session.
    ///
    /// Returns signed-out (never an error) for an absent or undecodable
    /// session, and for a session whose refresh was rejected. When a refresh
    /// happened the new serialized record rides along in
    /// `AuthState::refreshed_session` for the caller to persist.
    pub async fn with_auth(&self) -> AppResult<AuthState> {
        let Some(blob) = self.storage.get_session().await else {
            return Ok(AuthState::signed_out());
        };

        let session = match Session::from_blob(&blob) {
            Ok(session) => session,
            Err(e) => {
                warn!("Stored session is not decodable, treating as signed out: {}", e);
                return Ok(AuthState::signed_out());
            }
        };

        if !session.needs_refresh() {
            return Ok(AuthState {
                user: Some(session.user),
                session_id: Some(session.session_id),
                refreshed_session: None,
            });
        }

        match self.refresh(&session).await {
            Ok(refreshed) => {
                let blob = refreshed.to_blob()?;
                Ok(AuthState {
                    user: Some(refreshed.user),
                    session_id: Some(refreshed.session_id),
                    refreshed_session: Some(blob),
                })
            }
            Err(e) => {
                warn!("Session refresh failed, treating as signed out: {}", e);
                Ok(AuthState::signed_out())
            }
        }
    }

    /// Refresh-token grant for a session nearing expiry
    async fn refresh(&self, session: &Session) -> AppResult<Session> {
        info!("Refreshing session {}", session.session_id);

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", session.refresh_token.as_str()),
            ("client_id", self.config.client_id.as_str()),
        ];

        let response = self.post_token_request(&params).await?;

        Ok(Session {
            // The provider may rotate these; keep the previous values when it
            // does not send replacements.
            session_id: response
                .session_id
                .unwrap_or_else(|| session.session_id.clone()),
            refresh_token: response
                .refresh_token
                .unwrap_or_else(|| session.refresh_token.clone()),
            user: response.user.unwrap_or_else(|| session.user.clone()),
            expires_at: Utc::now()
                + Duration::seconds(response.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)),
            access_token: response.access_token,
        })
    }

    async fn post_token_request(&self, params: &[(&str, &str)]) -> AppResult<TokenResponse> {
        let response = self
            .http
            .post(self.endpoint("/oauth2/token"))
            .bearer_auth(&self.config.api_key)
            .form(params)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to send token request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Token request failed with status {}: {}", status, body);
            return Err(AppError::Auth(format!(
                "Token request failed with status {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse token response: {}", e)))
    }

    /// Clear the stored session and return the hosted logout URL, which
    /// invalidates the session on the provider when opened.
    pub async fn sign_out(&self, session_id: &str) -> AppResult<String> {
        self.storage.clear_session().await?;

        info!("Cleared local session {}", session_id);

        Ok(format!(
            "{}?session_id={}",
            self.endpoint("/oauth2/logout"),
            urlencoding::encode(session_id),
        ))
    }

    /// Persist a session record produced elsewhere (a refresh)
    pub async fn save_session(&self, session_data: &str) -> AppResult<()> {
        self.storage.save_session(None, session_data).await
    }

    /// Drop the stored session without contacting the provider
    pub async fn clear_session(&self) -> AppResult<()> {
        self.storage.clear_session().await
    }
}
