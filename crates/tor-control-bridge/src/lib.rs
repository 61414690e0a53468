//! tor-control-bridge: native messaging host for the Tor control port.
//!
//! Browser extensions cannot open raw TCP sockets. This crate sits between
//! the browser (length-prefixed JSON over stdin/stdout) and Tor's textual
//! control protocol (CRLF-terminated lines over TCP).
//!
//! # Architecture
//!
//! - **channel**: Framed JSON messages over a byte stream
//! - **control**: One-shot control port client (connect, authenticate, command)
//! - **bridge**: Read-dispatch-write loop tying the two together

pub mod bridge;
pub mod channel;
pub mod config;
pub mod control;
pub mod error;
pub mod logging;

pub use bridge::{CommandExecutor, run_bridge};
pub use channel::FramedChannel;
pub use channel::protocol::{BridgeResult, Envelope};
pub use config::{BridgeConfig, CliArgs};
pub use control::{AuthMethod, ControlClient};
pub use error::{ChannelError, CommandError};

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
