//! Local command execution
//!
//! Passthrough lines that are not sent to a remote session run through the
//! platform shell. The engine keeps its own working directory, so `cd` is
//! handled here rather than by a child shell that would forget it.

use crate::config::LocalConfig;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::runtime::Runtime;

/// Outcome of one local invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellResult {
    pub script: String,
    /// Standard output, one entry per line
    pub output: Vec<String>,
    /// Standard error, one entry per line
    pub errors: Vec<String>,
    /// Set when the script could not run at all
    pub error_message: Option<String>,
    pub exit_code: Option<i32>,
}

impl ShellResult {
    pub fn failed(script: &str, message: impl Into<String>) -> Self {
        Self {
            script: script.to_string(),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_message.is_none() && self.exit_code.map_or(true, |c| c == 0)
    }
}

/// Something that runs script text on the local machine
pub trait LocalEngine: Send {
    /// Run a script and collect its output
    fn invoke(&mut self, script: &str) -> ShellResult {
        self.invoke_streaming(script, &mut |_| {})
    }

    /// Run a script, handing each output line to `on_line` as it arrives
    fn invoke_streaming(&mut self, script: &str, on_line: &mut dyn FnMut(&str)) -> ShellResult;

    /// Directory relative paths resolve against
    fn current_dir(&self) -> &Path;
}

/// Local engine backed by the platform shell
pub struct ProcessEngine {
    runtime: Runtime,
    shell: PathBuf,
    shell_args: Vec<String>,
    working_dir: PathBuf,
    env_vars: HashMap<String, String>,
}

impl ProcessEngine {
    pub fn new(config: &LocalConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Other(format!("Failed to start process runtime: {}", e)))?;

        let working_dir = match &config.working_directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        Ok(Self {
            runtime,
            shell: config.shell.clone(),
            shell_args: config.shell_args.clone(),
            working_dir,
            env_vars: config.environment.clone(),
        })
    }

    /// Set environment variable
    pub fn set_env(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }

    fn change_dir(&mut self, script: &str, target: &str) -> ShellResult {
        let path = resolve_dir(&self.working_dir, target);
        match path.canonicalize() {
            Ok(dir) if dir.is_dir() => {
                debug!("Working directory is now {}", dir.display());
                self.working_dir = dir;
                ShellResult {
                    script: script.to_string(),
                    exit_code: Some(0),
                    ..Default::default()
                }
            }
            _ => ShellResult::failed(script, format!("cd: no such directory: {}", target)),
        }
    }

    async fn run_script(
        &self,
        script: &str,
        on_line: &mut dyn FnMut(&str),
    ) -> Result<(Vec<String>, Vec<String>, Option<i32>)> {
        let mut child = Command::new(&self.shell)
            .args(&self.shell_args)
            .arg(script)
            .current_dir(&self.working_dir)
            .envs(&self.env_vars)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::LocalExecutionFailed {
                script: script.to_string(),
                reason: e.to_string(),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let read_stdout = async {
            let mut lines = Vec::new();
            if let Some(stdout) = stdout {
                let mut reader = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    on_line(&line);
                    lines.push(line);
                }
            }
            lines
        };

        let read_stderr = async {
            let mut lines = Vec::new();
            if let Some(stderr) = stderr {
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    lines.push(line);
                }
            }
            lines
        };

        let (output, errors) = tokio::join!(read_stdout, read_stderr);
        let status = child.wait().await?;

        Ok((output, errors, status.code()))
    }
}

impl LocalEngine for ProcessEngine {
    fn invoke_streaming(&mut self, script: &str, on_line: &mut dyn FnMut(&str)) -> ShellResult {
        let script = script.trim();
        if let Some(target) = cd_target(script) {
            return self.change_dir(script, target);
        }

        debug!("Running local script: {}", script);
        match self.runtime.block_on(self.run_script(script, on_line)) {
            Ok((output, errors, exit_code)) => ShellResult {
                script: script.to_string(),
                output,
                errors,
                error_message: None,
                exit_code,
            },
            Err(e) => {
                warn!("Local script failed to run: {}", e);
                ShellResult::failed(script, e.to_string())
            }
        }
    }

    fn current_dir(&self) -> &Path {
        &self.working_dir
    }
}

/// Target of a bare `cd` line
fn cd_target(script: &str) -> Option<&str> {
    let rest = script.strip_prefix("cd")?;
    if rest.is_empty() {
        return Some("~");
    }
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let target = rest.trim();
    if target.contains([';', '&', '|']) {
        return None;
    }
    Some(if target.is_empty() { "~" } else { target })
}

fn resolve_dir(base: &Path, target: &str) -> PathBuf {
    let target = target.trim_matches(|c| c == '"' || c == '\'');
    let home = dirs::home_dir();
    if target == "~" {
        if let Some(home) = home {
            return home;
        }
    } else if let (Some(rest), Some(home)) = (target.strip_prefix("~/"), home) {
        return home.join(rest);
    }
    base.join(target)
}
