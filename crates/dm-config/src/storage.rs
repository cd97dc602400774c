//! Loading the settings file and applying environment overrides

use crate::types::AuthConfig;
use dm_types::{AppError, AppResult};
use std::path::Path;
use tracing::{info, warn};

/// Load configuration from a YAML file, falling back to defaults when the
/// file does not exist. A file that exists but fails to parse is an error:
/// silently ignoring a malformed settings file hides typos from the user.
pub async fn load_config(path: &Path) -> AppResult<AuthConfig> {
    if !path.exists() {
        info!(
            "No settings file at {}, using defaults",
            path.display()
        );
        return Ok(AuthConfig::default());
    }

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::Config(format!("Failed to read settings file: {}", e)))?;

    serde_yaml::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse settings file: {}", e)))
}

/// Apply `DOORMAN_*` environment overrides on top of file-based settings.
///
/// Credentials usually arrive this way in development so they stay out of
/// the settings file.
pub fn apply_env_overrides(mut config: AuthConfig) -> AuthConfig {
    if let Ok(client_id) = std::env::var("DOORMAN_CLIENT_ID") {
        config.client_id = client_id;
    }
    if let Ok(api_key) = std::env::var("DOORMAN_API_KEY") {
        config.api_key = api_key;
    }
    if let Ok(passphrase) = std::env::var("DOORMAN_SESSION_PASSPHRASE") {
        config.session_passphrase = passphrase;
    }
    if let Ok(redirect_uri) = std::env::var("DOORMAN_REDIRECT_URI") {
        config.redirect_uri = redirect_uri;
    }
    if let Ok(auth_domain) = std::env::var("DOORMAN_AUTH_DOMAIN") {
        config.auth_domain = auth_domain;
    }

    if let Err(reason) = config.validate() {
        warn!("Auth configuration incomplete: {}", reason);
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("settings.yaml")).await.unwrap();

        assert_eq!(config, AuthConfig::default());
        assert_eq!(config.redirect_uri, "doorman://callback");
    }

    #[tokio::test]
    async fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "client_id: client_01").unwrap();
        writeln!(file, "session_passphrase: hunter2").unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.client_id, "client_01");
        assert_eq!(config.session_passphrase, "hunter2");
        // Unspecified fields fall back to serde defaults
        assert_eq!(config.redirect_uri, "doorman://callback");
        assert_eq!(config.auth_domain, "https://auth.doorman.dev");
    }

    #[tokio::test]
    async fn test_load_malformed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "client_id: [unterminated").unwrap();

        assert!(load_config(&path).await.is_err());
    }

    #[test]
    fn test_validate_requires_client_id_and_passphrase() {
        let mut config = AuthConfig::default();
        assert!(config.validate().is_err());

        config.client_id = "client_01".to_string();
        assert!(config.validate().is_err());

        config.session_passphrase = "hunter2".to_string();
        assert!(config.validate().is_ok());
    }
}
