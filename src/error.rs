//! Error types and Result aliases for ShellRunner

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for ShellRunner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ShellRunner
#[derive(Debug)]
pub enum Error {
    // === Transport errors ===
    /// Failed to open a pseudo-terminal for a transport program
    PtyCreationFailed {
        program: String,
        reason: String,
    },

    /// Failed to spawn the transport program
    TransportSpawnFailed {
        program: String,
        reason: String,
    },

    /// Remote host rejected or never completed the connection
    ConnectFailed {
        host: String,
        reason: String,
    },

    /// Connect gave up after the configured number of attempts
    ConnectRetriesExhausted {
        host: String,
        attempts: u32,
    },

    /// No prompt seen before the connect timeout
    ConnectTimeout {
        host: String,
        duration: Duration,
    },

    /// Writing to the remote stream failed
    StreamWriteFailed {
        reason: String,
    },

    /// Remote stream closed while a command was waiting for its prompt
    StreamClosed {
        reason: String,
    },

    /// An operation needed an open remote session
    NotConnected,

    /// A session is already open
    AlreadyConnected {
        host: String,
    },

    /// File transfer failed
    TransferFailed {
        path: String,
        reason: String,
    },

    // === Command errors ===
    /// Connection or transfer arguments were incomplete
    InvalidRemoteSpec(crate::remote::RemoteSpecError),

    /// Local engine could not run the script
    LocalExecutionFailed {
        script: String,
        reason: String,
    },

    /// A required script variable was not declared
    RequiredVariableMissing {
        key: String,
    },

    /// Script file to import does not exist
    ScriptNotFound {
        path: PathBuf,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Configuration file not found
    ConfigNotFound,

    /// Configuration validation failed
    ConfigValidationFailed {
        field: String,
        reason: String,
    },

    /// Failed to serialize configuration
    ConfigSerializationFailed {
        format: String,
        reason: String,
    },

    /// Failed to parse configuration
    ConfigParseFailed {
        format: String,
        reason: String,
    },

    // === I/O and serialization errors ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    /// Generic errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Transport errors
            Error::PtyCreationFailed { program, reason } => {
                write!(f, "Failed to create PTY for '{}': {}", program, reason)
            }
            Error::TransportSpawnFailed { program, reason } => {
                write!(f, "Failed to spawn '{}': {}", program, reason)
            }
            Error::ConnectFailed { host, reason } => {
                write!(f, "Connection to '{}' failed: {}", host, reason)
            }
            Error::ConnectRetriesExhausted { host, attempts } => {
                write!(f, "Connection to '{}' failed after {} attempts", host, attempts)
            }
            Error::ConnectTimeout { host, duration } => {
                write!(f, "Connection to '{}' timed out after {:?}", host, duration)
            }
            Error::StreamWriteFailed { reason } => {
                write!(f, "Failed to write to remote stream: {}", reason)
            }
            Error::StreamClosed { reason } => {
                write!(f, "Remote stream closed: {}", reason)
            }
            Error::NotConnected => write!(f, "No remote session is open"),
            Error::AlreadyConnected { host } => {
                write!(f, "A remote session to '{}' is already open", host)
            }
            Error::TransferFailed { path, reason } => {
                write!(f, "Transfer of '{}' failed: {}", path, reason)
            }

            // Command errors
            Error::InvalidRemoteSpec(err) => write!(f, "{}", err),
            Error::LocalExecutionFailed { script, reason } => {
                write!(f, "Failed to execute '{}': {}", script, reason)
            }
            Error::RequiredVariableMissing { key } => {
                write!(f, "Variable {} is required", key)
            }
            Error::ScriptNotFound { path } => {
                write!(f, "File「{}」is not found", path.display())
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigNotFound => write!(f, "Configuration file not found"),
            Error::ConfigValidationFailed { field, reason } => {
                write!(f, "Configuration validation failed for '{}': {}", field, reason)
            }
            Error::ConfigSerializationFailed { format, reason } => {
                write!(f, "Failed to serialize config as {}: {}", format, reason)
            }
            Error::ConfigParseFailed { format, reason } => {
                write!(f, "Failed to parse {} config: {}", format, reason)
            }

            // I/O and serialization errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),

            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

// portable-pty reports failures as anyhow errors
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<crate::remote::RemoteSpecError> for Error {
    fn from(err: crate::remote::RemoteSpecError) -> Self {
        Error::InvalidRemoteSpec(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
