//! Bridge logic behind the auth commands
//!
//! Mediates between the hosted-auth service and the IPC surface: converts
//! every failure into the structured shapes the webview expects and owns the
//! auth-changed broadcaster.

use tracing::{error, info, warn};

use crate::auth::events::AuthBroadcaster;
use crate::auth::opener::ExternalOpener;
use crate::auth::types::AuthIpcResult;
use dm_auth::{AuthService, AuthState};
use dm_session::SessionStorage;
use dm_types::{AppResult, User};

pub struct AuthManager<S: SessionStorage> {
    service: AuthService<S>,
    broadcaster: AuthBroadcaster,
    opener: Box<dyn ExternalOpener>,
}

impl<S: SessionStorage> AuthManager<S> {
    pub fn new(service: AuthService<S>, opener: Box<dyn ExternalOpener>) -> Self {
        Self {
            service,
            broadcaster: AuthBroadcaster::new(),
            opener,
        }
    }

    pub fn broadcaster(&self) -> &AuthBroadcaster {
        &self.broadcaster
    }

    /// Start hosted sign-in: build the authorize URL and open it externally.
    ///
    /// Completion is observed later, when the redirect callback arrives via
    /// [`Self::handle_auth_callback`].
    pub async fn sign_in(&self) -> AuthIpcResult {
        match self.try_sign_in().await {
            Ok(()) => AuthIpcResult::ok(),
            Err(e) => {
                error!("Sign in failed: {}", e);
                AuthIpcResult::failure(e.to_string())
            }
        }
    }

    async fn try_sign_in(&self) -> AppResult<()> {
        let url = self.service.sign_in_url()?;
        self.opener.open_external(&url)
    }

    /// Sign out: hosted logout when a user session exists, local clear
    /// otherwise. Broadcasts `user: null` on success.
    pub async fn sign_out(&self) -> AuthIpcResult {
        match self.try_sign_out().await {
            Ok(()) => {
                self.broadcaster.broadcast(None);
                AuthIpcResult::ok()
            }
            Err(e) => {
                error!("Sign out failed: {}", e);
                AuthIpcResult::failure(e.to_string())
            }
        }
    }

    async fn try_sign_out(&self) -> AppResult<()> {
        let auth = self.auth_state().await?;

        match (auth.user, auth.session_id) {
            (Some(_), Some(session_id)) => {
                // The logout URL invalidates the hosted session; the local
                // slot is already cleared by the service.
                let logout_url = self.service.sign_out(&session_id).await?;
                self.opener.open_external(&logout_url)?;
            }
            _ => {
                self.service.clear_session().await?;
            }
        }

        Ok(())
    }

    /// Resolve the current user; every failure degrades to `None` since the
    /// webview has no error-display path for this call.
    pub async fn get_user(&self) -> Option<User> {
        match self.auth_state().await {
            Ok(auth) => auth.user,
            Err(e) => {
                warn!("Get user failed: {}", e);
                None
            }
        }
    }

    /// Complete a sign-in from a captured `doorman://callback` redirect and
    /// announce the new user.
    pub async fn handle_auth_callback(&self, url: &str) -> AppResult<()> {
        let user = self.service.complete_sign_in(url).await?;

        info!("Signed in as {}", user.email);
        self.broadcaster.broadcast(Some(user));

        Ok(())
    }

    /// Resolve auth state, persisting a refreshed session before returning
    /// so the stored record never lags the one we act on.
    async fn auth_state(&self) -> AppResult<AuthState> {
        let auth = self.service.with_auth().await?;

        if let Some(ref refreshed) = auth.refreshed_session {
            self.service.save_session(refreshed).await?;
        }

        Ok(auth)
    }
}
