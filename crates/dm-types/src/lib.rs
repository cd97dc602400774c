//! Shared types for Doorman
//!
//! Error types and the user model passed between the auth service, the IPC
//! bridge, and the webview.

mod errors;
mod user;

pub use errors::{AppError, AppResult};
pub use user::User;
