//! Remote session engine
//!
//! Output from the transport arrives on the transport's thread and is fed to
//! [`Shared::receive`], which reassembles lines across chunks, suppresses the
//! echo of the last command and recognises the prompt. A password request is
//! only swallowed while a privileged command waits for one. The
//! interpreter thread blocks in [`RemoteSession::send`] on a condition
//! variable until the prompt shows up again.

use super::prompt::{ends_like_prompt, is_password_cue, is_prompt_line, prompt_location};
use super::transport::{ShellChannel, StreamHandlers, Transport};
use super::Endpoint;
use crate::config::{DisplayConfig, RemoteConfig};
use crate::error::{Error, Result};
use crate::terminal::{fit_to_width, strip_control_sequences, Console};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use zeroize::Zeroizing;

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Disconnected,
    Connecting,
    Idle,
    AwaitingPrompt,
}

#[derive(Debug, Clone, Copy, Default)]
struct RedrawState {
    active: bool,
    anchor: u16,
    next_row: u16,
    max_row: u16,
}

#[derive(Debug, Default)]
struct SessionState {
    // Bumped per connection attempt; stale deliveries are dropped
    generation: u64,
    phase: Phase,
    user: String,
    superuser: String,
    password_cue: String,
    last_sent: Option<String>,
    // Bytes after the last line break; may end inside a character or sequence
    pending: Vec<u8>,
    queue: Vec<String>,
    completed: Vec<String>,
    prompt_seen: bool,
    // Set while a privileged command may still ask for the password
    awaiting_cue: bool,
    cue_seen: bool,
    location: Option<String>,
    redraw: RedrawState,
    stream_error: Option<String>,
}

enum WaitOutcome {
    Ready,
    Closed(String),
    TimedOut,
}

/// State shared with the transport's delivery thread
struct Shared {
    state: Mutex<SessionState>,
    signal: Condvar,
    console: Arc<dyn Console>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Consume one chunk of stream data
    ///
    /// Complete lines are handled as they arrive. The unterminated tail is
    /// kept for the next chunk unless it already reads as a prompt or a
    /// password request, which never end with a line break.
    fn receive(&self, generation: u64, bytes: &[u8]) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }

        state.pending.extend_from_slice(bytes);
        if let Some(end) = state.pending.iter().rposition(|b| *b == b'\n' || *b == b'\r') {
            let complete: Vec<u8> = state.pending.drain(..=end).collect();
            let text = strip_control_sequences(&String::from_utf8_lossy(&complete));
            for line in text.split(['\r', '\n']) {
                self.handle_line(&mut state, line);
            }
        }

        if state.pending.is_empty() {
            return;
        }
        let tail = strip_control_sequences(&String::from_utf8_lossy(&state.pending));
        let tail = tail.trim();
        let finished = (state.awaiting_cue && is_password_cue(tail, &state.password_cue))
            || (ends_like_prompt(tail) && is_prompt_line(tail, &state.user, &state.superuser));
        if finished {
            state.pending.clear();
            self.handle_line(&mut state, tail);
        }
    }

    fn handle_line(&self, state: &mut SessionState, line: &str) {
        let line = line.trim();
        if line.is_empty() || state.last_sent.as_deref() == Some(line) {
            return;
        }

        if state.awaiting_cue && is_password_cue(line, &state.password_cue) {
            state.awaiting_cue = false;
            state.cue_seen = true;
            self.signal.notify_all();
            return;
        }

        let width = self.console.width();
        if is_prompt_line(line, &state.user, &state.superuser) {
            state.location = Some(prompt_location(line));
            if state.redraw.active {
                let redraw = state.redraw;
                self.console.write_at(redraw.anchor, &fit_to_width(line, width));
                for row in redraw.next_row..=redraw.max_row {
                    self.console.write_at(row, &fit_to_width("", width));
                }
                state.redraw.max_row = redraw.next_row.saturating_sub(1).max(redraw.anchor);
            }
            state.completed = std::mem::take(&mut state.queue);
            state.awaiting_cue = false;
            state.prompt_seen = true;
            self.signal.notify_all();
            return;
        }

        if state.redraw.active {
            let row = state.redraw.next_row;
            self.console.write_at(row, &fit_to_width(line, width));
            state.redraw.next_row = row.saturating_add(1);
            state.redraw.max_row = state.redraw.max_row.max(row);
        } else {
            self.console.write_line(line);
        }
        state.queue.push(line.to_string());
    }

    /// Record a transport failure and wake any waiter
    fn fail(&self, generation: u64, error: Error) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        warn!("Remote stream error: {}", error);
        self.console.write_line(&error.to_string());
        state.stream_error = Some(error.to_string());
        self.signal.notify_all();
    }

    /// Block until a prompt has been seen
    fn wait_for_prompt(&self, timeout: Option<Duration>) -> WaitOutcome {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();
        loop {
            if state.prompt_seen {
                state.prompt_seen = false;
                return WaitOutcome::Ready;
            }
            if let Some(reason) = state.stream_error.clone() {
                return WaitOutcome::Closed(reason);
            }
            state = match deadline {
                None => self.signal.wait(state).unwrap_or_else(|e| e.into_inner()),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::TimedOut;
                    }
                    self.signal
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(|e| e.into_inner())
                        .0
                }
            };
        }
    }

    /// Block until a password request or the prompt, up to `timeout`
    ///
    /// Once this returns, later lines that look like a request are output.
    fn wait_for_cue(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        loop {
            if state.cue_seen {
                return true;
            }
            let now = Instant::now();
            if state.prompt_seen || state.stream_error.is_some() || now >= deadline {
                state.awaiting_cue = false;
                return false;
            }
            state = self
                .signal
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
    }
}

/// Interactive shell on a remote host
pub struct RemoteSession {
    config: RemoteConfig,
    default_anchor: u16,
    transport: Box<dyn Transport>,
    shared: Arc<Shared>,
    channel: Option<Box<dyn ShellChannel>>,
    endpoint: Option<Endpoint>,
}

impl RemoteSession {
    pub fn new(
        config: RemoteConfig,
        display: &DisplayConfig,
        transport: Box<dyn Transport>,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            config,
            default_anchor: display.redraw_anchor_row,
            transport,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::default()),
                signal: Condvar::new(),
                console,
            }),
            channel: None,
            endpoint: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.shared.lock().phase
    }

    /// Location from the most recent prompt
    pub fn location(&self) -> Option<String> {
        self.shared.lock().location.clone()
    }

    /// Open a session, retrying up to the configured number of attempts
    pub fn connect(&mut self, endpoint: Endpoint) -> Result<()> {
        if let Some(current) = &self.endpoint {
            return Err(Error::AlreadyConnected {
                host: current.host.clone(),
            });
        }

        let console = Arc::clone(&self.shared.console);
        let attempts = self.config.connect_attempts.max(1);
        for attempt in 1..=attempts {
            if attempt > 1 {
                console.write_line(&format!("Retry {}...", attempt - 1));
            }
            match self.try_connect(&endpoint) {
                Ok(channel) => {
                    self.channel = Some(channel);
                    self.shared.lock().phase = Phase::Idle;
                    info!("Connected to {}", endpoint);
                    self.endpoint = Some(endpoint);
                    console.write_line("Ssh connection success");
                    return Ok(());
                }
                Err(e) => warn!("Connection attempt {} to {} failed: {}", attempt, endpoint, e),
            }
        }

        self.reset_state();
        console.write_line(&format!("Retry more than {} times", attempts));
        Err(Error::ConnectRetriesExhausted {
            host: endpoint.host.clone(),
            attempts,
        })
    }

    fn try_connect(&mut self, endpoint: &Endpoint) -> Result<Box<dyn ShellChannel>> {
        let generation = {
            let mut state = self.shared.lock();
            let redraw = state.redraw;
            *state = SessionState {
                generation: state.generation + 1,
                phase: Phase::Connecting,
                user: endpoint.user.clone(),
                superuser: self.config.superuser.clone(),
                password_cue: self.config.password_cue.clone(),
                redraw,
                ..Default::default()
            };
            state.generation
        };

        let on_data = Arc::clone(&self.shared);
        let on_error = Arc::clone(&self.shared);
        let handlers = StreamHandlers {
            on_data: Arc::new(move |bytes: &[u8]| on_data.receive(generation, bytes)),
            on_error: Arc::new(move |error: Error| on_error.fail(generation, error)),
        };

        let timeout = self.config.connect_timeout();
        let mut channel = self.transport.open_shell(endpoint, timeout, handlers)?;

        match self.shared.wait_for_prompt(Some(timeout)) {
            WaitOutcome::Ready => Ok(channel),
            WaitOutcome::Closed(reason) => {
                channel.close();
                Err(Error::ConnectFailed {
                    host: endpoint.host.clone(),
                    reason,
                })
            }
            WaitOutcome::TimedOut => {
                channel.close();
                Err(Error::ConnectTimeout {
                    host: endpoint.host.clone(),
                    duration: timeout,
                })
            }
        }
    }

    /// Run one command and wait for the prompt
    ///
    /// Returns the output lines the command produced. Privileged commands
    /// get the session password when the remote asks for it.
    pub fn send(&mut self, text: &str) -> Result<Vec<String>> {
        let text = text.trim();
        let password = match &self.endpoint {
            Some(endpoint) => endpoint.password.clone(),
            None => return Err(Error::NotConnected),
        };
        let channel = self.channel.as_mut().ok_or(Error::NotConnected)?;

        {
            let mut state = self.shared.lock();
            if let Some(reason) = state.stream_error.clone() {
                return Err(Error::StreamClosed { reason });
            }
            state.queue.clear();
            state.completed.clear();
            state.prompt_seen = false;
            state.cue_seen = false;
            state.awaiting_cue = text.contains(self.config.sudo_marker.as_str());
            state.last_sent = Some(text.to_string());
            state.phase = Phase::AwaitingPrompt;
            state.redraw.next_row = state.redraw.anchor.saturating_add(1);
        }

        debug!("Sending remote command: {}", text);
        channel.write(format!("{}\r", text).as_bytes())?;
        channel.flush()?;

        if text.contains(self.config.sudo_marker.as_str()) {
            if self.shared.wait_for_cue(self.config.password_cue_timeout()) {
                debug!("Answering privileged password request");
                let mut answer = Zeroizing::new(password.as_bytes().to_vec());
                answer.push(b'\r');
                channel.write(&answer)?;
                channel.flush()?;
            } else {
                debug!("No password request for privileged command");
            }
        }

        match self.shared.wait_for_prompt(None) {
            WaitOutcome::Ready => {
                let mut state = self.shared.lock();
                state.phase = Phase::Idle;
                Ok(std::mem::take(&mut state.completed))
            }
            WaitOutcome::Closed(reason) => Err(Error::StreamClosed { reason }),
            WaitOutcome::TimedOut => Err(Error::StreamClosed {
                reason: "no prompt".to_string(),
            }),
        }
    }

    /// Draw the prompt at a fixed row and output below it
    pub fn enter_redraw(&mut self, anchor: Option<u16>) -> Result<()> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }
        let anchor = anchor.unwrap_or(self.default_anchor).max(1);
        self.shared.console.clear();
        let mut state = self.shared.lock();
        state.redraw = RedrawState {
            active: true,
            anchor,
            next_row: anchor.saturating_add(1),
            max_row: anchor,
        };
        debug!("Fixed-row mode at row {}", anchor);
        Ok(())
    }

    pub fn exit_redraw(&mut self) {
        let mut state = self.shared.lock();
        if state.redraw.active {
            debug!("Leaving fixed-row mode");
        }
        state.redraw = RedrawState::default();
    }

    /// Close the session; does nothing when already closed
    pub fn disconnect(&mut self) -> bool {
        let Some(mut channel) = self.channel.take() else {
            self.endpoint = None;
            return false;
        };
        if let Err(e) = channel.flush() {
            debug!("Flush before close failed: {}", e);
        }
        channel.close();
        if let Some(endpoint) = self.endpoint.take() {
            info!("Disconnected from {}", endpoint);
        }
        self.reset_state();
        self.shared.console.write_line("Ssh connection has been closed");
        true
    }

    fn reset_state(&mut self) {
        let mut state = self.shared.lock();
        *state = SessionState {
            generation: state.generation + 1,
            ..Default::default()
        };
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
    }
}
