//! Hosted-auth session service
//!
//! Client side of the hosted authentication protocol: builds the sign-in
//! URL, completes the code exchange when the redirect comes back, resolves
//! the current auth state (refreshing the session when the access token is
//! close to expiry), and produces the hosted logout URL.
//!
//! Persistence goes through the [`dm_session::SessionStorage`] capability;
//! the serialized [`Session`] string is opaque to everything outside this
//! crate.

mod pkce;
mod service;
mod session;

pub use pkce::{generate_pkce_challenge, generate_state, PkceChallenge};
pub use service::{AuthService, AuthState};
pub use session::Session;
