//! Session storage module
//!
//! A single encrypted on-disk slot holding the serialized session record,
//! plus the storage capability the auth service is written against.

mod memory;
mod store;

pub use memory::MemorySessionStore;
pub use store::EncryptedSessionStore;

use async_trait::async_trait;
use dm_types::AppResult;

/// Storage capability required by the auth service.
///
/// The interface is shaped so server-side implementations can thread an HTTP
/// response through `save_session` (to set cookies); desktop stores have no
/// such context and callers pass `None`.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Response context used by server-side implementations; ignored on
    /// desktop.
    type Response: Send;

    /// Return the current session record, or `None` if none exists.
    ///
    /// "No session" is a normal state, never an error — a missing,
    /// unreadable, or undecryptable slot all land here.
    async fn get_session(&self) -> Option<String>;

    /// Durably overwrite the single session slot. Last write wins.
    async fn save_session(
        &self,
        response: Option<&mut Self::Response>,
        session_data: &str,
    ) -> AppResult<()>;

    /// Remove the session slot. Clearing an already-empty slot is fine.
    async fn clear_session(&self) -> AppResult<()>;
}
