//! User model returned by the hosted identity provider

use serde::{Deserialize, Serialize};

/// A signed-in user as reported by the identity provider.
///
/// Derived from the current session on every `get-user` call and never
/// persisted on its own. Serializes camelCase because the webview consumes
/// it directly (`firstName`, `profilePictureUrl`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}
