//! Auth bridge between the hosted-auth service and the webview
//!
//! Request/response operations cross the boundary as Tauri commands
//! ([`commands`]); the auth-changed push goes the other way as an event
//! broadcast ([`events`]). The two directions are deliberately separate
//! abstractions so their delivery guarantees stay distinct.

pub mod commands;
pub mod events;
pub mod manager;
pub mod opener;
pub mod types;
