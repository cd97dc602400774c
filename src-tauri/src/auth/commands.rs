//! Auth Tauri command handlers
//!
//! The request/response half of the bridge. Each command mirrors one wire
//! operation from [`crate::auth::types::channels`]; none of them ever
//! returns `Err` — failures are folded into the payload per the bridge's
//! error policy.

use std::sync::Arc;

use tauri::State;

use crate::auth::manager::AuthManager;
use crate::auth::types::AuthIpcResult;
use dm_session::EncryptedSessionStore;
use dm_types::User;

/// Bridge manager specialized to the encrypted on-disk store the app runs
/// with
pub type DesktopAuthManager = AuthManager<EncryptedSessionStore>;

/// `auth:sign-in`
#[tauri::command]
pub async fn sign_in(manager: State<'_, Arc<DesktopAuthManager>>) -> Result<AuthIpcResult, String> {
    Ok(manager.sign_in().await)
}

/// `auth:sign-out`
#[tauri::command]
pub async fn sign_out(manager: State<'_, Arc<DesktopAuthManager>>) -> Result<AuthIpcResult, String> {
    Ok(manager.sign_out().await)
}

/// `auth:get-user`
#[tauri::command]
pub async fn get_user(manager: State<'_, Arc<DesktopAuthManager>>) -> Result<Option<User>, String> {
    Ok(manager.get_user().await)
}
