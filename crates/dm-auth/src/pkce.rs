//! PKCE (RFC 7636) helpers for the hosted authorization-code flow

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

/// PKCE verifier/challenge pair (S256 method)
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// Random verifier sent with the token request
    pub code_verifier: String,
    /// BASE64URL(SHA256(code_verifier)), sent with the authorize request
    pub code_challenge: String,
}

/// Random alphanumeric string from the RFC 7636 unreserved set
fn random_urlsafe(len: usize) -> String {
    let mut rng = thread_rng();
    (0..len)
        .map(|_| {
            let idx = rng.gen_range(0..62);
            match idx {
                0..=25 => (b'A' + idx) as char,
                26..=51 => (b'a' + (idx - 26)) as char,
                _ => (b'0' + (idx - 52)) as char,
            }
        })
        .collect()
}

/// Generate a PKCE challenge for an authorization-code flow.
///
/// The verifier is 64 characters (RFC 7636 allows 43-128); the challenge is
/// the base64url-encoded SHA-256 hash of the verifier.
pub fn generate_pkce_challenge() -> PkceChallenge {
    let code_verifier = random_urlsafe(64);

    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    let code_challenge = URL_SAFE_NO_PAD.encode(hasher.finalize());

    PkceChallenge {
        code_verifier,
        code_challenge,
    }
}

/// Generate a random state string for CSRF protection.
///
/// Stored before redirecting to the authorization server and compared
/// against the `state` query parameter when the callback arrives.
pub fn generate_state() -> String {
    random_urlsafe(32)
}
