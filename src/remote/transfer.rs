//! File transfer
//!
//! `scp DEST SOURCE -#p PASSWORD [-p PORT]`: the argument containing `:`
//! is the remote side, and the first argument names the destination.

use super::prompt::is_password_cue;
use super::pty::{pty_size, PtyOutput, PtyProcess};
use super::{parse_port, Endpoint, RemoteSpecError, PASSWORD_FLAG};
use crate::command::CommandLine;
use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::terminal::{strip_control_sequences, Console};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

static PROGRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,3})%").expect("progress pattern"));

/// Percentage points between upload progress reports
pub const PROGRESS_STEP: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Local file to remote path
    Upload,
    /// Remote path to local file
    Download,
}

/// A parsed `scp` line
#[derive(Debug, Clone)]
pub struct TransferSpec {
    pub direction: TransferDirection,
    pub endpoint: Endpoint,
    pub local_path: PathBuf,
    pub remote_path: String,
}

impl TransferSpec {
    pub fn parse(line: &CommandLine, config: &RemoteConfig) -> std::result::Result<Self, RemoteSpecError> {
        let arguments: Vec<&str> = line.positionals().take(2).collect();

        let remote_index = arguments
            .iter()
            .position(|a| is_remote_argument(a))
            .ok_or(RemoteSpecError::MissingRemotePath)?;
        let local = arguments
            .iter()
            .enumerate()
            .find(|(i, a)| *i != remote_index && !is_remote_argument(a))
            .map(|(_, a)| *a)
            .ok_or(RemoteSpecError::MissingLocalPath)?;

        let (address, remote_path) = arguments[remote_index]
            .split_once(':')
            .ok_or(RemoteSpecError::MissingRemotePath)?;
        if address.rsplit('@').next().unwrap_or_default().is_empty() {
            return Err(RemoteSpecError::MissingTransferHost);
        }
        if remote_path.is_empty() {
            return Err(RemoteSpecError::MissingRemotePath);
        }

        let password = line
            .value_of(PASSWORD_FLAG)
            .ok_or(RemoteSpecError::MissingPassword)?;
        let port = parse_port(line, config.default_port)?;

        let direction = if remote_index == 0 {
            TransferDirection::Upload
        } else {
            TransferDirection::Download
        };

        Ok(Self {
            direction,
            endpoint: Endpoint::new(address, password, port, &config.default_user),
            local_path: PathBuf::from(local),
            remote_path: remote_path.to_string(),
        })
    }
}

/// `host:path` or `user@host:path`, but not a drive-letter path like `C:\x`
fn is_remote_argument(argument: &str) -> bool {
    let bytes = argument.as_bytes();
    let drive_letter = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/');
    argument.contains(':') && !drive_letter
}

/// Turns a stream of percentages into step-sized reports
#[derive(Debug, Clone)]
pub struct ProgressThrottle {
    step: u8,
    last: Option<u8>,
}

impl ProgressThrottle {
    pub fn new(step: u8) -> Self {
        Self {
            step: step.max(1),
            last: None,
        }
    }

    /// The step to report for `percent`, if it is a new one
    pub fn update(&mut self, percent: u8) -> Option<u8> {
        let bucket = percent.min(100) / self.step * self.step;
        match self.last {
            Some(last) if bucket <= last => None,
            _ => {
                self.last = Some(bucket);
                Some(bucket)
            }
        }
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(PROGRESS_STEP)
    }
}

/// Copies files between this machine and a remote host
pub trait FileTransfer: Send {
    /// Copy `local` to `remote`, reporting percentages as they are known
    fn upload(
        &mut self,
        endpoint: &Endpoint,
        local: &Path,
        remote: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<()>;

    /// Copy `remote` to `local`
    fn download(&mut self, endpoint: &Endpoint, remote: &str, local: &Path) -> Result<()>;
}

/// Run a parsed transfer, reporting to the console
///
/// Relative local paths resolve against `base_dir`. An existing local file
/// is replaced on download.
pub fn execute(
    spec: &TransferSpec,
    transfer: &mut dyn FileTransfer,
    console: &dyn Console,
    base_dir: &Path,
) -> Result<()> {
    let local = base_dir.join(&spec.local_path);

    match spec.direction {
        TransferDirection::Upload => {
            if !local.is_file() {
                return Err(Error::TransferFailed {
                    path: local.display().to_string(),
                    reason: "local file not found".to_string(),
                });
            }
            console.write_line(&format!("scp upload file {} start", spec.local_path.display()));
            let mut throttle = ProgressThrottle::default();
            transfer.upload(&spec.endpoint, &local, &spec.remote_path, &mut |percent| {
                if let Some(step) = throttle.update(percent) {
                    console.write_line(&format!("....{}%", step));
                }
            })?;
            console.write_line(&format!("scp upload file {} finish", spec.local_path.display()));
        }
        TransferDirection::Download => {
            if local.is_file() {
                fs::remove_file(&local)?;
            }
            console.write_line(&format!("scp download {} start", spec.remote_path));
            transfer.download(&spec.endpoint, &spec.remote_path, &local)?;
            console.write_line(&format!("scp download file {} finish", spec.local_path.display()));
        }
    }

    Ok(())
}

/// File transfer through the system `scp` program
pub struct PtyScpTransfer {
    config: RemoteConfig,
    rows: u16,
    cols: usize,
}

impl PtyScpTransfer {
    pub fn new(config: RemoteConfig, rows: u16, cols: usize) -> Self {
        Self { config, rows, cols }
    }

    fn scp_args(&self, endpoint: &Endpoint, source: String, destination: String) -> Vec<String> {
        let mut args = vec![
            "-P".to_string(),
            endpoint.port.to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            "NumberOfPasswordPrompts=1".to_string(),
        ];
        args.extend(self.config.extra_ssh_args.iter().cloned());
        args.push(source);
        args.push(destination);
        args
    }

    fn run(
        &self,
        endpoint: &Endpoint,
        args: Vec<String>,
        path: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<()> {
        let (mut process, rx) = PtyProcess::spawn(
            &self.config.scp_program,
            &args,
            pty_size(self.rows, self.cols),
        )?;

        let mut answered = false;
        let mut last_line = String::new();

        while let Ok(PtyOutput::Data(bytes)) = rx.recv() {
            let text = strip_control_sequences(&String::from_utf8_lossy(&bytes));

            for line in text.split(['\r', '\n']).map(str::trim).filter(|l| !l.is_empty()) {
                if is_password_cue(line, &self.config.password_cue) {
                    if answered {
                        process.kill();
                        return Err(Error::TransferFailed {
                            path: path.to_string(),
                            reason: "password rejected".to_string(),
                        });
                    }
                    let mut answer = Zeroizing::new(endpoint.password.as_bytes().to_vec());
                    answer.push(b'\r');
                    process.write(&answer)?;
                    answered = true;
                    continue;
                }

                for caps in PROGRESS.captures_iter(line) {
                    if let Ok(percent) = caps[1].parse::<u8>() {
                        progress(percent);
                    }
                }
                last_line = line.to_string();
            }
        }

        if process.wait()? {
            Ok(())
        } else {
            let reason = if last_line.is_empty() {
                format!("{} exited with an error", self.config.scp_program)
            } else {
                last_line
            };
            Err(Error::TransferFailed {
                path: path.to_string(),
                reason,
            })
        }
    }
}

impl FileTransfer for PtyScpTransfer {
    fn upload(
        &mut self,
        endpoint: &Endpoint,
        local: &Path,
        remote: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<()> {
        let destination = format!("{}:{}", endpoint.destination(), remote);
        let args = self.scp_args(endpoint, local.display().to_string(), destination);
        info!("Uploading {} to {}", local.display(), endpoint);
        self.run(endpoint, args, &local.display().to_string(), progress)
    }

    fn download(&mut self, endpoint: &Endpoint, remote: &str, local: &Path) -> Result<()> {
        let source = format!("{}:{}", endpoint.destination(), remote);
        let args = self.scp_args(endpoint, source, local.display().to_string());
        info!("Downloading {} from {}", remote, endpoint);
        self.run(endpoint, args, remote, &mut |_| {})
    }
}
