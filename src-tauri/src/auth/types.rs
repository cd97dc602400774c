//! Wire contract shared with the webview

use dm_types::User;
use serde::{Deserialize, Serialize};

/// Literal channel identifiers for the four auth operations.
///
/// The webview consumes them through a four-member `window.auth` surface:
/// `signIn()`, `signOut()`, and `getUser()` invoke the matching Tauri
/// commands, and `onAuthChange(callback)` subscribes to the
/// [`channels::ON_AUTH_CHANGE`] event and returns an unsubscribe function.
/// Both sides must use these strings verbatim.
pub mod channels {
    pub const SIGN_IN: &str = "auth:sign-in";
    pub const SIGN_OUT: &str = "auth:sign-out";
    pub const GET_USER: &str = "auth:get-user";
    pub const ON_AUTH_CHANGE: &str = "auth:on-auth-change";
}

/// Result shape for sign-in/sign-out.
///
/// Failures at the bridge are always converted into this structure; an
/// uncaught fault never crosses the process boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthIpcResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthIpcResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Payload of the auth-changed broadcast
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthChangePayload {
    pub user: Option<User>,
}
