//! OS-specific path resolution for configuration and session files

use dm_types::{AppError, AppResult};
use std::path::PathBuf;

/// Get the configuration directory
///
/// Priority:
/// 1. Runtime override via `DOORMAN_ENV` environment variable: `~/.doorman-{env}/`
/// 2. Development mode (debug builds): `~/.doorman-dev/`
/// 3. Production mode (release builds): `~/.doorman/`
pub fn config_dir() -> AppResult<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppError::Config("Could not determine home directory".to_string()))?;

    // Runtime override via environment variable (for testing)
    if let Ok(env_suffix) = std::env::var("DOORMAN_ENV") {
        return Ok(home.join(format!(".doorman-{}", env_suffix)));
    }

    #[cfg(debug_assertions)]
    let dir = home.join(".doorman-dev");

    #[cfg(not(debug_assertions))]
    let dir = home.join(".doorman");

    Ok(dir)
}

/// Get the configuration file path
pub fn config_file() -> AppResult<PathBuf> {
    Ok(config_dir()?.join("settings.yaml"))
}

/// Get the encrypted session slot path
pub fn session_file() -> AppResult<PathBuf> {
    Ok(config_dir()?.join("session.json.enc"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir_exists(path: &PathBuf) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to create directory {}: {}",
                path.display(),
                e
            ))
        })?;
    }
    Ok(())
}
