//! System-browser seam
//!
//! Sign-in and sign-out both hand a hosted URL to the user's default
//! browser. The trait exists so tests can swap in a recording or failing
//! opener.

use tauri::AppHandle;
use tauri_plugin_shell::ShellExt;

use dm_types::{AppError, AppResult};

pub trait ExternalOpener: Send + Sync {
    fn open_external(&self, url: &str) -> AppResult<()>;
}

/// Opens URLs through the shell plugin
pub struct ShellOpener {
    app_handle: AppHandle,
}

impl ShellOpener {
    pub fn new(app_handle: AppHandle) -> Self {
        Self { app_handle }
    }
}

impl ExternalOpener for ShellOpener {
    fn open_external(&self, url: &str) -> AppResult<()> {
        #[allow(deprecated)]
        self.app_handle
            .shell()
            .open(url, None)
            .map_err(|e| AppError::ExternalOpen(e.to_string()))
    }
}
