//! Runtime configuration.
//!
//! Every setting can come from a command-line flag or its environment
//! variable; flags win. Browsers launch native hosts with their own extra
//! arguments (caller origin, parent window handle), which are accepted and
//! ignored.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::control::AuthMethod;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9051;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_REPLY_BYTES: usize = 1024 * 1024;

/// Settings for reaching and authenticating to the control port.
///
/// `Default` is the built-in defaults only; environment overrides are applied
/// by [`CliArgs`].
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    /// Bound on each connect, write and read.
    pub timeout: Duration,
    /// Largest reply accumulated before the command is failed.
    pub max_reply_bytes: usize,
    pub auth: AuthMethod,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            max_reply_bytes: DEFAULT_MAX_REPLY_BYTES,
            auth: AuthMethod::Null,
        }
    }
}

impl BridgeConfig {
    /// `host:port`, for logs.
    pub fn target(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Tor control port bridge for browser native messaging
#[derive(Parser, Debug)]
#[command(name = "tor-control-bridge")]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Control port host
    #[arg(long, env = "TOR_CONTROL_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Control port number
    #[arg(long, env = "TOR_CONTROL_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Timeout in seconds for each connect, write and read
    #[arg(
        long,
        env = "TOR_CONTROL_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Maximum reply size in bytes
    #[arg(long, env = "TOR_CONTROL_MAX_REPLY_BYTES", default_value_t = DEFAULT_MAX_REPLY_BYTES)]
    pub max_reply_bytes: usize,

    /// Control port password (HashedControlPassword)
    #[arg(
        long,
        env = "TOR_CONTROL_PASSWORD",
        hide_env_values = true,
        value_parser = parse_password
    )]
    pub password: Option<String>,

    /// Control auth cookie file (CookieAuthentication). Takes precedence over --password.
    #[arg(long, env = "TOR_CONTROL_COOKIE_FILE")]
    pub cookie_file: Option<PathBuf>,

    /// Arguments appended by the launching browser.
    #[arg(hide = true, num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub launcher_args: Vec<String>,
}

impl CliArgs {
    pub fn into_config(self) -> BridgeConfig {
        let auth = match (self.cookie_file, self.password) {
            (Some(path), _) => AuthMethod::CookieFile(path),
            (None, Some(password)) => AuthMethod::Password(password),
            (None, None) => AuthMethod::Null,
        };

        BridgeConfig {
            host: self.host,
            port: self.port,
            timeout: Duration::from_secs(self.timeout_secs),
            max_reply_bytes: self.max_reply_bytes,
            auth,
        }
    }
}

/// A password is sent inside a single AUTHENTICATE line.
fn parse_password(value: &str) -> Result<String, String> {
    if value.contains(['\r', '\n']) {
        return Err("password must not contain CR or LF".to_string());
    }
    Ok(value.to_string())
}
