//! In-memory session store for tests and embedding

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::SessionStorage;
use dm_types::AppResult;

/// Volatile single-slot store with the same semantics as the encrypted file
/// store. Exists so the auth service and bridge can be exercised without
/// touching the filesystem.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStore {
    type Response = ();

    async fn get_session(&self) -> Option<String> {
        self.slot.read().await.clone()
    }

    async fn save_session(
        &self,
        _response: Option<&mut Self::Response>,
        session_data: &str,
    ) -> AppResult<()> {
        *self.slot.write().await = Some(session_data.to_string());
        Ok(())
    }

    async fn clear_session(&self) -> AppResult<()> {
        *self.slot.write().await = None;
        Ok(())
    }
}
