//! Configuration management for ShellRunner
//!
//! Configuration covers the local shell, the remote session engine, console
//! geometry and per-command capture policy overrides. Every section has
//! defaults, so an empty file is a valid configuration.

pub mod loader;

use crate::command::CapturePolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for ShellRunner
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local engine configuration
    pub local: LocalConfig,

    /// Remote session configuration
    pub remote: RemoteConfig,

    /// Console configuration
    pub display: DisplayConfig,

    /// Capture policy overrides keyed by command keyword
    pub capture: HashMap<String, CapturePolicy>,
}

/// Local engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Shell executable used for passthrough lines
    pub shell: PathBuf,

    /// Arguments placed before the script text
    pub shell_args: Vec<String>,

    /// Program used by `open`
    pub open_command: String,

    /// Extra environment variables for local commands
    pub environment: HashMap<String, String>,

    /// Starting directory (defaults to the process working directory)
    pub working_directory: Option<PathBuf>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        #[cfg(windows)]
        let (shell, shell_args, open_command) = (
            PathBuf::from("powershell.exe"),
            vec!["-NoProfile".to_string(), "-Command".to_string()],
            "explorer".to_string(),
        );

        #[cfg(target_os = "macos")]
        let (shell, shell_args, open_command) = (
            PathBuf::from("/bin/sh"),
            vec!["-c".to_string()],
            "open".to_string(),
        );

        #[cfg(all(unix, not(target_os = "macos")))]
        let (shell, shell_args, open_command) = (
            PathBuf::from("/bin/sh"),
            vec!["-c".to_string()],
            "xdg-open".to_string(),
        );

        Self {
            shell,
            shell_args,
            open_command,
            environment: HashMap::new(),
            working_directory: None,
        }
    }
}

/// Remote session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// User when the connect line names none
    pub default_user: String,

    /// Port when the connect line names none
    pub default_port: u16,

    /// Superuser name that also marks prompt lines
    pub superuser: String,

    /// Connection attempts before giving up
    pub connect_attempts: u32,

    /// Seconds to wait for the first prompt on each attempt
    pub connect_timeout_secs: u64,

    /// Substring that marks a privileged command
    pub sudo_marker: String,

    /// Substring (case-insensitive) of the password request line
    pub password_cue: String,

    /// Milliseconds to wait for the password request
    pub password_cue_timeout_ms: u64,

    /// Program that opens remote sessions
    pub ssh_program: String,

    /// Program that copies files
    pub scp_program: String,

    /// Extra arguments for both programs, e.g. `-o` options
    pub extra_ssh_args: Vec<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            default_user: "root".to_string(),
            default_port: 22,
            superuser: "root".to_string(),
            connect_attempts: 3,
            connect_timeout_secs: 10,
            sudo_marker: "sudo".to_string(),
            password_cue: "password".to_string(),
            password_cue_timeout_ms: 500,
            ssh_program: "ssh".to_string(),
            scp_program: "scp".to_string(),
            extra_ssh_args: Vec::new(),
        }
    }
}

impl RemoteConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn password_cue_timeout(&self) -> Duration {
        Duration::from_millis(self.password_cue_timeout_ms)
    }
}

/// Console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Console width; detected from `$COLUMNS` when unset
    pub width: Option<usize>,

    /// Rows of the pseudo-terminal opened for transports
    pub rows: u16,

    /// Row where the prompt is drawn in fixed-row mode
    pub redraw_anchor_row: u16,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: None,
            rows: 24,
            redraw_anchor_row: 1,
        }
    }
}

impl DisplayConfig {
    /// Effective console width
    pub fn effective_width(&self) -> usize {
        self.width
            .or_else(|| {
                std::env::var("COLUMNS")
                    .ok()
                    .and_then(|c| c.trim().parse().ok())
            })
            .filter(|w| *w > 0)
            .unwrap_or(120)
    }
}

/// Configuration utilities
pub mod utils {
    use super::*;

    /// Get configuration file format from path
    pub fn get_config_format(path: &Path) -> Option<loader::ConfigFormat> {
        match path.extension()?.to_str()? {
            "toml" => Some(loader::ConfigFormat::Toml),
            "json" => Some(loader::ConfigFormat::Json),
            _ => None,
        }
    }
}
