//! Remote sessions
//!
//! Everything needed to drive a shell on another host: the endpoint parsed
//! from an `ssh` line, the transport that produces an interactive byte
//! stream, the session engine that turns that stream into command results,
//! and `scp`-style file transfer.

pub mod prompt;
pub mod pty;
pub mod session;
pub mod transfer;
pub mod transport;

pub use prompt::{ends_like_prompt, is_password_cue, is_prompt_line, prompt_location};
pub use session::{Phase, RemoteSession};
pub use transfer::{FileTransfer, ProgressThrottle, PtyScpTransfer, TransferDirection, TransferSpec};
pub use transport::{PtySshTransport, ShellChannel, StreamHandlers, Transport};

use crate::command::CommandLine;
use crate::config::RemoteConfig;
use std::fmt;
use zeroize::Zeroizing;

/// Flag that carries the password on `ssh` and `scp` lines
pub const PASSWORD_FLAG: &str = "-#p";

/// Flag that carries the port
pub const PORT_FLAG: &str = "-p";

/// Problems with the arguments of an `ssh` or `scp` line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteSpecError {
    #[error("Ssh Host is required")]
    MissingHost,

    #[error("Password is required (-#p)")]
    MissingPassword,

    #[error("Scp Host is required")]
    MissingTransferHost,

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Local path is required")]
    MissingLocalPath,

    #[error("Remote path is required")]
    MissingRemotePath,
}

/// Where and as whom to connect
#[derive(Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Zeroizing<String>,
}

impl Endpoint {
    /// Build an endpoint from `[user@]host`, falling back to the default user
    pub fn new(address: &str, password: &str, port: u16, default_user: &str) -> Self {
        let (user, host) = match address.split_once('@') {
            Some((user, host)) if !user.is_empty() => (user, host),
            Some((_, host)) => (default_user, host),
            None => (default_user, address),
        };
        Self {
            host: host.to_string(),
            port,
            user: user.to_string(),
            password: Zeroizing::new(password.to_string()),
        }
    }

    /// `user@host` as given to the transport programs
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}

/// Parse `ssh [user@]host -#p PASSWORD [-p PORT]`
pub fn parse_connect(line: &CommandLine, config: &RemoteConfig) -> Result<Endpoint, RemoteSpecError> {
    let address = line
        .arguments()
        .first()
        .filter(|p| p.key.is_none() && !p.value.starts_with('-'))
        .map(|p| p.value.as_str())
        .ok_or(RemoteSpecError::MissingHost)?;

    let host = address.rsplit('@').next().unwrap_or_default();
    if host.is_empty() {
        return Err(RemoteSpecError::MissingHost);
    }

    let password = line
        .value_of(PASSWORD_FLAG)
        .ok_or(RemoteSpecError::MissingPassword)?;
    let port = parse_port(line, config.default_port)?;

    Ok(Endpoint::new(address, password, port, &config.default_user))
}

pub(crate) fn parse_port(line: &CommandLine, default_port: u16) -> Result<u16, RemoteSpecError> {
    match line.value_of(PORT_FLAG) {
        Some(port) => port
            .parse::<u16>()
            .ok()
            .filter(|p| *p > 0)
            .ok_or_else(|| RemoteSpecError::InvalidPort(port.to_string())),
        None => Ok(default_port),
    }
}
