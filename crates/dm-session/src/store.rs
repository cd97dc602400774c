//! Encrypted file-backed session slot
//!
//! Stores one optional string, sealed with AES-256-GCM under a key derived
//! from the configured passphrase. Anything that prevents reading the slot
//! back (missing file, truncated JSON, wrong passphrase) means "no session".

use std::num::NonZeroU32;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{aead, pbkdf2};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::SessionStorage;
use dm_types::{AppError, AppResult};

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// On-disk representation of the sealed slot (all fields base64)
#[derive(Debug, Serialize, Deserialize)]
struct SealedSlot {
    salt: String,
    nonce: String,
    ciphertext: String,
}

/// Encrypted single-slot session store
///
/// The slot is cached in memory and mirrored to disk on every write, so
/// reads never touch the filesystem after construction.
pub struct EncryptedSessionStore {
    /// Path to the sealed slot file
    path: PathBuf,
    /// Passphrase the sealing key is derived from
    passphrase: String,
    /// In-memory copy of the slot
    slot: RwLock<Option<String>>,
}

impl EncryptedSessionStore {
    /// Open the store, decrypting any existing slot file.
    ///
    /// Never fails: a fresh path, an unreadable file, or a file sealed under
    /// a different passphrase all yield an empty slot.
    pub async fn new(path: PathBuf, passphrase: impl Into<String>) -> Self {
        let passphrase = passphrase.into();
        let slot = Self::load(&path, &passphrase).await;

        Self {
            path,
            passphrase,
            slot: RwLock::new(slot),
        }
    }

    /// Best-effort load of the sealed slot from disk
    async fn load(path: &PathBuf, passphrase: &str) -> Option<String> {
        if !path.exists() {
            return None;
        }

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read session slot {}: {}", path.display(), e);
                return None;
            }
        };

        let sealed: SealedSlot = match serde_json::from_str(&content) {
            Ok(sealed) => sealed,
            Err(e) => {
                warn!("Session slot {} is not parseable: {}", path.display(), e);
                return None;
            }
        };

        match unseal(passphrase, &sealed) {
            Some(plaintext) => Some(plaintext),
            None => {
                // Wrong passphrase or tampered file. Either way the session
                // is unrecoverable and the user is simply signed out.
                warn!(
                    "Could not decrypt session slot {}, treating as no session",
                    path.display()
                );
                None
            }
        }
    }

    /// Seal and persist the current plaintext
    async fn persist(&self, session_data: &str) -> AppResult<()> {
        let sealed = seal(&self.passphrase, session_data)?;

        let content = serde_json::to_string(&sealed)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Session(format!("Failed to create session directory: {}", e))
            })?;
        }

        fs::write(&self.path, content)
            .await
            .map_err(|e| AppError::Session(format!("Failed to write session slot: {}", e)))?;

        // Owner read/write only on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)
                .await
                .map_err(|e| AppError::Session(format!("Failed to get file metadata: {}", e)))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)
                .await
                .map_err(|e| AppError::Session(format!("Failed to set file permissions: {}", e)))?;
        }

        debug!("Session slot written to {}", self.path.display());

        Ok(())
    }
}

#[async_trait]
impl SessionStorage for EncryptedSessionStore {
    type Response = ();

    async fn get_session(&self) -> Option<String> {
        self.slot.read().await.clone()
    }

    async fn save_session(
        &self,
        _response: Option<&mut Self::Response>,
        session_data: &str,
    ) -> AppResult<()> {
        // Persist before updating the cache so a failed write never leaves
        // the in-memory slot ahead of disk.
        self.persist(session_data).await?;
        *self.slot.write().await = Some(session_data.to_string());
        Ok(())
    }

    async fn clear_session(&self) -> AppResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AppError::Session(format!(
                    "Failed to remove session slot: {}",
                    e
                )))
            }
        }
        *self.slot.write().await = None;
        Ok(())
    }
}

/// Derive the sealing key from the passphrase and a per-file salt
fn derive_key(passphrase: &str, salt: &[u8]) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        NonZeroU32::new(PBKDF2_ITERATIONS).expect("iterations is non-zero"),
        salt,
        passphrase.as_bytes(),
        &mut key,
    );
    key
}

/// Seal plaintext under the passphrase with a fresh salt and nonce
fn seal(passphrase: &str, plaintext: &str) -> AppResult<SealedSlot> {
    let rng = SystemRandom::new();

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt)
        .map_err(|_| AppError::Session("Failed to generate salt".to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    rng.fill(&mut nonce_bytes)
        .map_err(|_| AppError::Session("Failed to generate nonce".to_string()))?;

    let key = derive_key(passphrase, &salt);
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, &key)
        .map_err(|_| AppError::Session("Failed to build sealing key".to_string()))?;
    let sealing_key = aead::LessSafeKey::new(unbound);

    let mut in_out = plaintext.as_bytes().to_vec();
    sealing_key
        .seal_in_place_append_tag(
            aead::Nonce::assume_unique_for_key(nonce_bytes),
            aead::Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| AppError::Session("Failed to seal session".to_string()))?;

    Ok(SealedSlot {
        salt: STANDARD.encode(salt),
        nonce: STANDARD.encode(nonce_bytes),
        ciphertext: STANDARD.encode(in_out),
    })
}

/// Unseal a slot; `None` for any mismatch (wrong key, tampering, bad encoding)
fn unseal(passphrase: &str, sealed: &SealedSlot) -> Option<String> {
    let salt = STANDARD.decode(&sealed.salt).ok()?;
    let nonce_bytes: [u8; NONCE_LEN] = STANDARD
        .decode(&sealed.nonce)
        .ok()?
        .try_into()
        .ok()?;
    let mut ciphertext = STANDARD.decode(&sealed.ciphertext).ok()?;

    let key = derive_key(passphrase, &salt);
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, &key).ok()?;
    let opening_key = aead::LessSafeKey::new(unbound);

    let plaintext = opening_key
        .open_in_place(
            aead::Nonce::assume_unique_for_key(nonce_bytes),
            aead::Aad::empty(),
            &mut ciphertext,
        )
        .ok()?;

    String::from_utf8(plaintext.to_vec()).ok()
}
