use serde::{Deserialize, Serialize};

/// Hosted-auth configuration, read once at process start and passed to the
/// auth service factory. Deliberately a plain struct rather than ambient
/// global state so the session store and bridge stay testable in isolation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthConfig {
    /// OAuth client identifier issued by the identity provider
    #[serde(default)]
    pub client_id: String,

    /// Server-side API key for the token endpoint
    #[serde(default)]
    pub api_key: String,

    /// Passphrase the encrypted session slot is keyed from. Changing it
    /// simply orphans any previously saved session (treated as signed out).
    #[serde(default)]
    pub session_passphrase: String,

    /// Custom-scheme URI the provider redirects back to after hosted sign-in
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,

    /// Base URL of the hosted identity provider
    #[serde(default = "default_auth_domain")]
    pub auth_domain: String,
}

fn default_redirect_uri() -> String {
    "doorman://callback".to_string()
}

fn default_auth_domain() -> String {
    "https://auth.doorman.dev".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            api_key: String::new(),
            session_passphrase: String::new(),
            redirect_uri: default_redirect_uri(),
            auth_domain: default_auth_domain(),
        }
    }
}

impl AuthConfig {
    /// Check that the fields sign-in cannot work without are present.
    ///
    /// Called by consumers at the point of use, not at load time: a missing
    /// credential must not prevent the app from starting in a signed-out
    /// state.
    pub fn validate(&self) -> Result<(), String> {
        if self.client_id.is_empty() {
            return Err("client_id is not configured".to_string());
        }
        if self.session_passphrase.is_empty() {
            return Err("session_passphrase is not configured".to_string());
        }
        Ok(())
    }
}
