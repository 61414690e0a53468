//! tor-control-bridge binary.
//!
//! Launched by the browser as a native messaging host. Reads framed requests
//! on stdin, writes framed results on stdout, logs on stderr, and exits when
//! the browser closes stdin.

use anyhow::Context;
use clap::Parser;
use tokio::io::{stdin, stdout};

use tor_control_bridge::{CliArgs, ControlClient, VERSION, logging, run_bridge};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    logging::init_tracing();

    if !args.launcher_args.is_empty() {
        tracing::debug!(launcher_args = ?args.launcher_args, "Ignoring launcher arguments");
    }
    let config = args.into_config();
    tracing::info!(
        version = VERSION,
        addr = %config.target(),
        auth = ?config.auth,
        "Starting tor-control-bridge"
    );

    let client = ControlClient::new(config);
    let handled = run_bridge(stdin(), stdout(), &client)
        .await
        .context("framed channel failed")?;

    tracing::info!(handled, "Exiting");
    Ok(())
}
