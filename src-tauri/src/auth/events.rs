//! Auth-changed broadcast
//!
//! Fire-and-forget push from the bridge to whoever is listening: in-process
//! subscribers (tests, future native UI) and the webview via the
//! `auth:on-auth-change` event.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tauri::{AppHandle, Emitter};
use tracing::{debug, error};

use crate::auth::types::{channels, AuthChangePayload};
use dm_types::User;

type Listener = Box<dyn Fn(&AuthChangePayload) + Send + Sync>;

/// Handle returned by [`AuthBroadcaster::subscribe`]; pass it back to
/// [`AuthBroadcaster::unsubscribe`] to deregister. Unsubscribing the same
/// handle twice is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

/// Publish/subscribe half of the auth bridge.
///
/// Kept separate from the request/response commands: broadcasts are
/// delivered to every registered listener, with no reply and no ordering
/// relationship to in-flight command responses.
#[derive(Default)]
pub struct AuthBroadcaster {
    listeners: Mutex<HashMap<u64, Listener>>,
    next_id: AtomicU64,
    /// Set during Tauri setup; broadcasts before that only reach in-process
    /// listeners
    app_handle: Mutex<Option<AppHandle>>,
}

impl AuthBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Tauri app handle so broadcasts reach the webview
    pub fn set_app_handle(&self, app_handle: AppHandle) {
        *self.app_handle.lock() = Some(app_handle);
    }

    /// Register a listener for auth-changed broadcasts
    pub fn subscribe(
        &self,
        listener: impl Fn(&AuthChangePayload) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, Box::new(listener));
        ListenerId(id)
    }

    /// Remove a listener; unknown or already-removed handles are ignored
    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.lock().remove(&id.0);
    }

    /// Deliver an auth change to every listener and the webview
    pub fn broadcast(&self, user: Option<User>) {
        let payload = AuthChangePayload { user };

        for listener in self.listeners.lock().values() {
            listener(&payload);
        }

        if let Some(ref app_handle) = *self.app_handle.lock() {
            if let Err(e) = app_handle.emit(channels::ON_AUTH_CHANGE, payload) {
                error!("Failed to emit auth-changed event: {}", e);
            } else {
                debug!("Emitted auth-changed event to webview");
            }
        }
    }
}
