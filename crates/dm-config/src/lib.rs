//! Configuration management module
//!
//! Loads the Doorman settings file and resolves per-OS paths for the
//! configuration directory and the encrypted session slot.

pub mod paths;
mod storage;
mod types;

pub use storage::{apply_env_overrides, load_config};
pub use types::AuthConfig;

use dm_types::AppResult;

/// Load configuration from the default location with environment overrides
/// applied. Missing settings file is not an error; a malformed one is.
pub async fn load() -> AppResult<AuthConfig> {
    let config = load_config(&paths::config_file()?).await?;
    Ok(apply_env_overrides(config))
}
