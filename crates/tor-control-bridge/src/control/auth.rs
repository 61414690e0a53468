//! AUTHENTICATE command construction.

use std::fmt;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::error::CommandError;

/// Keyword of the control protocol's authentication command.
pub const AUTHENTICATE: &str = "AUTHENTICATE";

/// How the bridge authenticates each new control connection.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthMethod {
    /// Bare `AUTHENTICATE` (control port without a password or cookie).
    #[default]
    Null,
    /// `AUTHENTICATE "<password>"` for HashedControlPassword.
    Password(String),
    /// `AUTHENTICATE <hex>` with the contents of the control auth cookie.
    CookieFile(PathBuf),
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Password(_) => f.write_str("Password(<redacted>)"),
            Self::CookieFile(path) => f.debug_tuple("CookieFile").field(path).finish(),
        }
    }
}

impl AuthMethod {
    /// Build the authentication command line, without terminator.
    pub async fn command(&self) -> Result<String, CommandError> {
        match self {
            Self::Null => Ok(AUTHENTICATE.to_string()),
            Self::Password(password) => {
                if password.contains(['\r', '\n']) {
                    return Err(CommandError::validation(
                        "Control port password must not contain CR or LF",
                    ));
                }
                Ok(format!("{AUTHENTICATE} {}", quote(password)))
            }
            Self::CookieFile(path) => {
                let cookie = tokio::fs::read(path).await.map_err(|e| {
                    CommandError::auth(format!("cannot read cookie {}: {e}", path.display()))
                })?;
                Ok(format!("{AUTHENTICATE} {}", hex(&cookie)))
            }
        }
    }
}

/// Whether `command` is itself an authentication attempt.
pub fn is_auth_command(command: &str) -> bool {
    command
        .split_ascii_whitespace()
        .next()
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case(AUTHENTICATE))
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02X}");
        out
    })
}
