//! Remote transports
//!
//! A [`Transport`] turns an [`Endpoint`] into an authenticated interactive
//! byte stream. Output is pushed to the registered [`StreamHandlers`] from a
//! transport-owned thread; input goes through the returned [`ShellChannel`].

use super::prompt::{is_password_cue, is_prompt_line};
use super::pty::{pty_size, write_shared, PtyOutput, PtyProcess, SharedWriter};
use super::Endpoint;
use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::terminal::strip_control_sequences;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use zeroize::Zeroizing;

/// Callback for stream data
pub type DataHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Callback for stream failures
pub type ErrorHandler = Arc<dyn Fn(Error) + Send + Sync>;

/// Callbacks a transport delivers to
#[derive(Clone)]
pub struct StreamHandlers {
    pub on_data: DataHandler,
    pub on_error: ErrorHandler,
}

/// Input side of an open shell
pub trait ShellChannel: Send {
    fn write(&mut self, data: &[u8]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    /// Close the stream; safe to call more than once
    fn close(&mut self);
}

/// Opens interactive shells on remote hosts
pub trait Transport: Send {
    /// Start a shell and begin delivering its output to `handlers`
    ///
    /// Returns once the stream exists; waiting for the prompt is the caller's
    /// job. `timeout` bounds the transport's own connection setup.
    fn open_shell(
        &mut self,
        endpoint: &Endpoint,
        timeout: Duration,
        handlers: StreamHandlers,
    ) -> Result<Box<dyn ShellChannel>>;
}

/// Transport that runs the system `ssh` client on a pseudo-terminal
pub struct PtySshTransport {
    config: RemoteConfig,
    rows: u16,
    cols: usize,
}

impl PtySshTransport {
    pub fn new(config: RemoteConfig, rows: u16, cols: usize) -> Self {
        Self { config, rows, cols }
    }

    fn ssh_args(&self, endpoint: &Endpoint, timeout: Duration) -> Vec<String> {
        let mut args = vec![
            "-tt".to_string(),
            "-p".to_string(),
            endpoint.port.to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", timeout.as_secs().max(1)),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            "NumberOfPasswordPrompts=1".to_string(),
        ];
        args.extend(self.config.extra_ssh_args.iter().cloned());
        args.push(endpoint.destination());
        args
    }
}

impl Transport for PtySshTransport {
    fn open_shell(
        &mut self,
        endpoint: &Endpoint,
        timeout: Duration,
        handlers: StreamHandlers,
    ) -> Result<Box<dyn ShellChannel>> {
        let args = self.ssh_args(endpoint, timeout);
        info!("Opening ssh session to {}", endpoint);

        let (process, rx) = PtyProcess::spawn(
            &self.config.ssh_program,
            &args,
            pty_size(self.rows, self.cols),
        )?;

        let login = LoginResponder {
            writer: process.writer(),
            password: endpoint.password.clone(),
            host: endpoint.host.clone(),
            watch: LoginWatch::new(
                &endpoint.user,
                &self.config.superuser,
                &self.config.password_cue,
            ),
        };
        thread::spawn(move || login.deliver(rx, handlers));

        Ok(Box::new(PtySshChannel {
            process: Some(process),
        }))
    }
}

/// What to do with one chunk of output during login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginStep {
    Forward,
    AnswerPassword,
    Denied,
}

/// Tracks the ssh login until the first shell prompt
///
/// Authentication failures and the password request are only looked for
/// before that prompt. Afterwards every chunk is plain output.
#[derive(Debug)]
struct LoginWatch {
    user: String,
    superuser: String,
    cue: String,
    answered: bool,
    logged_in: bool,
    // Output since the last complete line; the cue can arrive split across reads
    pending: String,
}

impl LoginWatch {
    fn new(user: &str, superuser: &str, cue: &str) -> Self {
        Self {
            user: user.to_string(),
            superuser: superuser.to_string(),
            cue: cue.to_string(),
            answered: false,
            logged_in: false,
            pending: String::new(),
        }
    }

    fn observe(&mut self, text: &str) -> LoginStep {
        if self.logged_in {
            return LoginStep::Forward;
        }
        if text.contains("Permission denied") {
            return LoginStep::Denied;
        }

        self.pending.push_str(&strip_control_sequences(text));
        let last = self.pending.rsplit(['\r', '\n']).next().unwrap_or("");
        if !self.answered && is_password_cue(last, &self.cue) {
            self.answered = true;
            self.pending.clear();
            return LoginStep::AnswerPassword;
        }

        // `deploy@box's password:` has the shape of a prompt too
        let prompt_seen = self.pending.split(['\r', '\n']).any(|line| {
            !is_password_cue(line, &self.cue)
                && is_prompt_line(line.trim(), &self.user, &self.superuser)
        });
        if prompt_seen {
            self.logged_in = true;
            self.pending.clear();
            return LoginStep::Forward;
        }

        if let Some(newline) = self.pending.rfind(['\r', '\n']) {
            self.pending.drain(..=newline);
        }
        LoginStep::Forward
    }
}

/// Answers the login password request, then forwards output
struct LoginResponder {
    writer: SharedWriter,
    password: Zeroizing<String>,
    host: String,
    watch: LoginWatch,
}

impl LoginResponder {
    fn deliver(mut self, rx: Receiver<PtyOutput>, handlers: StreamHandlers) {
        while let Ok(event) = rx.recv() {
            let bytes = match event {
                PtyOutput::Data(bytes) => bytes,
                PtyOutput::Closed => {
                    (handlers.on_error)(Error::StreamClosed {
                        reason: format!("connection to {} closed", self.host),
                    });
                    break;
                }
            };

            match self.watch.observe(&String::from_utf8_lossy(&bytes)) {
                LoginStep::Forward => (handlers.on_data)(&bytes),
                LoginStep::AnswerPassword => {
                    debug!("Answering login password request from {}", self.host);
                    let mut answer = Zeroizing::new(self.password.as_bytes().to_vec());
                    answer.push(b'\r');
                    if let Err(e) = write_shared(&self.writer, &answer) {
                        (handlers.on_error)(e);
                    }
                }
                LoginStep::Denied => (handlers.on_error)(Error::ConnectFailed {
                    host: self.host.clone(),
                    reason: "Permission denied".to_string(),
                }),
            }
        }
        debug!("ssh delivery thread for {} exiting", self.host);
    }
}

struct PtySshChannel {
    process: Option<PtyProcess>,
}

impl ShellChannel for PtySshChannel {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        match &self.process {
            Some(process) => process.write(data),
            None => Err(Error::NotConnected),
        }
    }

    fn flush(&mut self) -> Result<()> {
        // write_shared flushes after every write
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut process) = self.process.take() {
            debug!("Closing {}", process.program());
            process.kill();
        }
    }
}
