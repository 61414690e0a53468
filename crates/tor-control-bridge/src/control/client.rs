//! Connection-per-command control port client.
//!
//! Every command gets a fresh TCP connection that is authenticated, used for
//! exactly one command and then closed. Each connect, write and read is
//! bounded by the configured timeout.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::auth::is_auth_command;
use super::reply::ReplyScanner;
use crate::bridge::CommandExecutor;
use crate::config::BridgeConfig;
use crate::error::{CommandError, Stage};

const LINE_TERMINATOR: &[u8] = b"\r\n";
const READ_CHUNK: usize = 1024;

/// Status code of a successful reply.
const STATUS_OK: u16 = 250;

pub struct ControlClient {
    config: BridgeConfig,
}

impl ControlClient {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Run one command and return the raw reply text.
    ///
    /// Authenticates first unless `command` is itself an AUTHENTICATE. A
    /// reply cut short by the peer closing the connection is returned as-is.
    pub async fn send_command(&self, command: &str) -> Result<String, CommandError> {
        let command = command_line(command)?;
        let auth_line = if is_auth_command(command) {
            None
        } else {
            Some(self.config.auth.command().await?)
        };

        let mut conn = ControlConnection::open(&self.config).await?;
        if let Some(auth_line) = auth_line {
            conn.authenticate(&auth_line).await?;
        }

        conn.send_line(command).await?;
        let reply = conn.read_reply().await?;
        conn.close().await;

        tracing::debug!(
            reply_bytes = reply.raw.len(),
            status = ?reply.final_status,
            "Command completed"
        );
        Ok(reply.into_text())
    }
}

#[async_trait]
impl CommandExecutor for ControlClient {
    async fn execute(&self, command: &str) -> Result<String, CommandError> {
        self.send_command(command).await
    }
}

/// Normalize caller text into a single protocol line, terminator excluded.
fn command_line(command: &str) -> Result<&str, CommandError> {
    let command = command.trim_end_matches(['\r', '\n']);
    if command.trim().is_empty() {
        return Err(CommandError::missing_command());
    }
    if command.contains(['\r', '\n']) {
        return Err(CommandError::validation(
            "Command must be a single line without CR or LF",
        ));
    }
    Ok(command)
}

/// Accumulated reply bytes and the final status, if one arrived.
struct Reply {
    raw: Vec<u8>,
    final_status: Option<u16>,
}

impl Reply {
    fn into_text(self) -> String {
        match String::from_utf8(self.raw) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

/// A live control connection. Closed when dropped.
struct ControlConnection {
    stream: TcpStream,
    timeout: Duration,
    max_reply_bytes: usize,
}

impl ControlConnection {
    async fn open(config: &BridgeConfig) -> Result<Self, CommandError> {
        Self::open_with(config, TcpStream::connect((config.host.as_str(), config.port))).await
    }

    async fn open_with<F>(config: &BridgeConfig, connect: F) -> Result<Self, CommandError>
    where
        F: Future<Output = io::Result<TcpStream>>,
    {
        let stream = timeout(config.timeout, connect)
            .await
            .map_err(|_| CommandError::timeout(Stage::Connect, config.timeout))?
            .map_err(CommandError::Connect)?;

        tracing::trace!(addr = %config.target(), "Opened control connection");
        Ok(Self {
            stream,
            timeout: config.timeout,
            max_reply_bytes: config.max_reply_bytes,
        })
    }

    async fn authenticate(&mut self, auth_line: &str) -> Result<(), CommandError> {
        self.send_line(auth_line).await?;
        let reply = self.read_reply().await?;

        match reply.final_status {
            Some(STATUS_OK) => {
                tracing::trace!("Authenticated");
                Ok(())
            }
            Some(status) => Err(CommandError::auth(format!(
                "control port rejected credentials with status {status}"
            ))),
            None => Err(CommandError::auth(
                "connection closed before authentication completed",
            )),
        }
    }

    async fn send_line(&mut self, line: &str) -> Result<(), CommandError> {
        let mut data = Vec::with_capacity(line.len() + LINE_TERMINATOR.len());
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(LINE_TERMINATOR);

        timeout(self.timeout, self.stream.write_all(&data))
            .await
            .map_err(|_| CommandError::timeout(Stage::Write, self.timeout))??;
        Ok(())
    }

    /// Read until a final status line arrives or the peer closes.
    async fn read_reply(&mut self) -> Result<Reply, CommandError> {
        let mut raw = Vec::new();
        let mut scanner = ReplyScanner::new();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            let n = timeout(self.timeout, self.stream.read(&mut chunk))
                .await
                .map_err(|_| CommandError::timeout(Stage::Read, self.timeout))??;
            if n == 0 {
                tracing::trace!(reply_bytes = raw.len(), "Peer closed before final line");
                return Ok(Reply {
                    raw,
                    final_status: None,
                });
            }

            raw.extend_from_slice(&chunk[..n]);
            if raw.len() > self.max_reply_bytes {
                return Err(CommandError::protocol(format!(
                    "reply exceeded {} bytes",
                    self.max_reply_bytes
                )));
            }

            if let Some(status) = scanner.feed(&raw) {
                return Ok(Reply {
                    raw,
                    final_status: Some(status),
                });
            }
        }
    }

    async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!(error = %e, "Control connection shutdown failed");
        }
    }
}

impl Drop for ControlConnection {
    fn drop(&mut self) {
        tracing::trace!("Closed control connection");
    }
}
