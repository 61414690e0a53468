//! Bridge loop: framed request in, control port command, framed result out.
//!
//! Strictly sequential. One envelope is read, fully handled (network round
//! trip included) and answered before the next is read. Every envelope gets
//! exactly one result, in order. Only a framing failure on the input stream
//! ends the loop early; everything else is reported to the caller as a
//! failure result.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::channel::FramedChannel;
use crate::channel::protocol::{BridgeResult, Envelope};
use crate::error::{ChannelError, CommandError};

/// Executes one control port command.
///
/// Abstracts the network client so the loop can run against a stub.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str) -> Result<String, CommandError>;
}

/// Run the loop until the input stream ends.
///
/// Returns the number of results written. A fatal framing error on either
/// side is returned as `Err` after logging.
pub async fn run_bridge<R, W, E>(reader: R, writer: W, executor: &E) -> Result<u64, ChannelError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    E: CommandExecutor + ?Sized,
{
    let mut channel = FramedChannel::new(reader, writer);
    let mut handled = 0u64;

    loop {
        let result = match channel.read_message::<Envelope>().await {
            Ok(Some(envelope)) => dispatch(executor, &envelope).await,
            Ok(None) => break,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(error = %e, "Rejecting malformed message");
                BridgeResult::failure(e.to_string())
            }
            Err(e) => {
                tracing::error!(error = %e, "Input channel failed");
                return Err(e);
            }
        };

        if let Err(e) = respond(&mut channel, &result).await {
            tracing::error!(error = %e, "Output channel failed");
            return Err(e);
        }
        handled += 1;
    }

    tracing::info!(handled, "Input stream closed");
    Ok(handled)
}

async fn dispatch<E>(executor: &E, envelope: &Envelope) -> BridgeResult
where
    E: CommandExecutor + ?Sized,
{
    let Some(command) = envelope.command() else {
        tracing::debug!("Envelope has no command");
        return CommandError::missing_command().into();
    };

    // Only the keyword: arguments may carry credentials.
    let keyword = command.split_ascii_whitespace().next().unwrap_or_default();
    tracing::debug!(keyword, "Dispatching command");

    match AssertUnwindSafe(executor.execute(command))
        .catch_unwind()
        .await
    {
        Ok(Ok(response)) => BridgeResult::success(response),
        Ok(Err(e @ CommandError::Auth { .. })) => {
            if let CommandError::Auth { detail } = &e {
                tracing::warn!(keyword, %detail, "Authentication failed");
            }
            e.into()
        }
        Ok(Err(e)) => {
            tracing::warn!(keyword, error = %e, "Command failed");
            e.into()
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(keyword, panic = %message, "Command handler panicked");
            BridgeResult::failure(format!("internal error: {message}"))
        }
    }
}

/// Write `result`, substituting a failure result if it cannot be sent as is.
async fn respond<R, W>(
    channel: &mut FramedChannel<R, W>,
    result: &BridgeResult,
) -> Result<(), ChannelError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match channel.write_message(result).await {
        Err(e) if e.is_recoverable() => {
            tracing::warn!(error = %e, "Result not sendable, replying with failure");
            channel
                .write_message(&BridgeResult::failure(e.to_string()))
                .await
        }
        other => other,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
