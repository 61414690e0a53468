//! Client for Tor's textual control protocol.
//!
//! - **reply**: Reply grammar and completion detection
//! - **auth**: AUTHENTICATE command construction
//! - **client**: Connection-per-command client

pub mod auth;
pub mod client;
pub mod reply;

pub use auth::{AUTHENTICATE, AuthMethod, is_auth_command};
pub use client::ControlClient;
