//! Mock local engine and file transfer

use shellrunner::error::{Error, Result};
use shellrunner::execution::{LocalEngine, ShellResult};
use shellrunner::remote::{Endpoint, FileTransfer};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Local engine that records scripts and replays canned output
#[derive(Clone)]
pub struct MockEngine {
    pub dir: PathBuf,
    pub scripts: Arc<Mutex<Vec<String>>>,
    pub outputs: HashMap<String, Vec<String>>,
}

impl MockEngine {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            scripts: Arc::new(Mutex::new(Vec::new())),
            outputs: HashMap::new(),
        }
    }

    pub fn respond(mut self, script: &str, lines: &[&str]) -> Self {
        self.outputs.insert(
            script.to_string(),
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }
}

impl LocalEngine for MockEngine {
    fn invoke_streaming(&mut self, script: &str, on_line: &mut dyn FnMut(&str)) -> ShellResult {
        self.scripts.lock().unwrap().push(script.to_string());
        let output = self.outputs.get(script).cloned().unwrap_or_default();
        for line in &output {
            on_line(line);
        }
        ShellResult {
            script: script.to_string(),
            output,
            exit_code: Some(0),
            ..Default::default()
        }
    }

    fn current_dir(&self) -> &Path {
        &self.dir
    }
}

/// One recorded transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferCall {
    Upload { host: String, local: PathBuf, remote: String },
    Download { host: String, remote: String, local: PathBuf },
}

/// File transfer that copies nothing remote; downloads write a stub file
#[derive(Clone, Default)]
pub struct MockTransfer {
    pub calls: Arc<Mutex<Vec<TransferCall>>>,
}

impl MockTransfer {
    pub fn calls(&self) -> Vec<TransferCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl FileTransfer for MockTransfer {
    fn upload(
        &mut self,
        endpoint: &Endpoint,
        local: &Path,
        remote: &str,
        progress: &mut dyn FnMut(u8),
    ) -> Result<()> {
        for percent in (0..=100).step_by(3) {
            progress(percent);
        }
        progress(100);
        self.calls.lock().unwrap().push(TransferCall::Upload {
            host: endpoint.host.clone(),
            local: local.to_path_buf(),
            remote: remote.to_string(),
        });
        Ok(())
    }

    fn download(&mut self, endpoint: &Endpoint, remote: &str, local: &Path) -> Result<()> {
        if remote.contains("missing") {
            return Err(Error::TransferFailed {
                path: remote.to_string(),
                reason: "No such file or directory".to_string(),
            });
        }
        fs::write(local, format!("contents of {}", remote))?;
        self.calls.lock().unwrap().push(TransferCall::Download {
            host: endpoint.host.clone(),
            remote: remote.to_string(),
            local: local.to_path_buf(),
        });
        Ok(())
    }
}
