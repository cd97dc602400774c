//! Doorman Library
//!
//! The privileged half of the Doorman desktop app: the auth bridge between
//! the hosted-auth service and the webview.

pub mod auth;

use std::sync::Arc;

use tauri::Manager;
use tauri_plugin_deep_link::DeepLinkExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use auth::manager::AuthManager;
use auth::opener::ShellOpener;
use dm_auth::AuthService;
use dm_session::EncryptedSessionStore;

pub fn run() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doorman=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Doorman...");

    let config_dir =
        dm_config::paths::config_dir().unwrap_or_else(|_| std::path::PathBuf::from("unknown"));
    #[cfg(debug_assertions)]
    info!("Running in DEVELOPMENT mode");
    #[cfg(not(debug_assertions))]
    info!("Running in PRODUCTION mode");
    info!("Configuration directory: {}", config_dir.display());

    let service = tauri::async_runtime::block_on(async {
        let config = dm_config::load().await.unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            dm_config::AuthConfig::default()
        });

        // Open the encrypted session slot. A slot sealed under a different
        // passphrase simply reads as "no session"; construction never fails.
        let session_path =
            dm_config::paths::session_file().expect("Failed to resolve session file path");
        let storage = Arc::new(
            EncryptedSessionStore::new(session_path, config.session_passphrase.clone()).await,
        );

        AuthService::new(config, storage)
    });

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_deep_link::init())
        .setup(move |app| {
            info!("Tauri app initialized");

            let opener = ShellOpener::new(app.handle().clone());
            let manager = Arc::new(AuthManager::new(service, Box::new(opener)));

            // Broadcasts now reach the webview too
            manager.broadcaster().set_app_handle(app.handle().clone());

            // Route doorman://callback redirects back into the auth service.
            // macOS registers the scheme through the bundle; Linux and
            // Windows dev builds register at runtime.
            #[cfg(any(windows, target_os = "linux"))]
            if let Err(e) = app.deep_link().register_all() {
                warn!("Failed to register deep link schemes: {}", e);
            }

            let callback_manager = manager.clone();
            app.deep_link().on_open_url(move |event| {
                for url in event.urls() {
                    let manager = callback_manager.clone();
                    let url = url.to_string();
                    tauri::async_runtime::spawn(async move {
                        if let Err(e) = manager.handle_auth_callback(&url).await {
                            error!("Auth callback failed: {}", e);
                        }
                    });
                }
            });

            app.manage(manager);

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            auth::commands::sign_in,
            auth::commands::sign_out,
            auth::commands::get_user,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
