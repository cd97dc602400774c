//! The session record persisted between runs

use chrono::{DateTime, Duration, Utc};
use dm_types::{AppResult, User};
use serde::{Deserialize, Serialize};

/// Refresh when the access token is within this many seconds of expiry
const REFRESH_BUFFER_SECS: i64 = 60;

/// Everything needed to act on behalf of a signed-in user.
///
/// Serialized to a JSON string and handed to the session storage adapter;
/// storage never interprets the contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Provider-side session identifier, needed for hosted logout
    pub session_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl Session {
    /// Serialize to the opaque string the storage adapter persists
    pub fn to_blob(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a stored blob back into a session
    pub fn from_blob(blob: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(blob)?)
    }

    /// Whether the access token is expired or about to expire
    pub fn needs_refresh(&self) -> bool {
        Utc::now() + Duration::seconds(REFRESH_BUFFER_SECS) >= self.expires_at
    }
}
