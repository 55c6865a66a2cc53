//! Script interpreter
//!
//! [`Runner`] owns the engines (local shell, remote session, file transfer)
//! and the console, and executes parsed lines against a caller-owned
//! [`SessionContext`]. Script files run through the same dispatch with a
//! [`FileRunContext`] per imported file.

mod builtins;
pub mod context;
mod script;
pub mod signal;

pub use context::{FileRunContext, RunMode, SessionContext};
pub use signal::CommandResult;

use crate::command::{CommandLine, CommandType, PolicyTable};
use crate::config::Config;
use crate::error::Result;
use crate::execution::{LocalEngine, ProcessEngine};
use crate::remote::{FileTransfer, PtyScpTransfer, PtySshTransport, RemoteSession, Transport};
use crate::terminal::{Console, StdConsole};
use crate::variable::{substitute_line, VariableStore};
use std::sync::Arc;

/// Executes command lines
pub struct Runner {
    config: Config,
    console: Arc<dyn Console>,
    local: Box<dyn LocalEngine>,
    remote: RemoteSession,
    transfer: Box<dyn FileTransfer>,
    policies: PolicyTable,
}

impl Runner {
    /// Runner with the platform shell, system `ssh`/`scp` and stdout
    pub fn new(config: Config) -> Result<Self> {
        let width = config.display.effective_width();
        let rows = config.display.rows;
        let console: Arc<dyn Console> = Arc::new(StdConsole::new(width));
        let local = ProcessEngine::new(&config.local)?;
        let transport = PtySshTransport::new(config.remote.clone(), rows, width);
        let transfer = PtyScpTransfer::new(config.remote.clone(), rows, width);

        Ok(Self::with_components(
            config,
            console,
            Box::new(local),
            Box::new(transport),
            Box::new(transfer),
        ))
    }

    /// Runner over caller-supplied engines
    pub fn with_components(
        config: Config,
        console: Arc<dyn Console>,
        local: Box<dyn LocalEngine>,
        transport: Box<dyn Transport>,
        transfer: Box<dyn FileTransfer>,
    ) -> Self {
        let policies = PolicyTable::with_overrides(&config.capture);
        let remote = RemoteSession::new(
            config.remote.clone(),
            &config.display,
            transport,
            Arc::clone(&console),
        );
        Self {
            config,
            console,
            local,
            remote,
            transfer,
            policies,
        }
    }

    /// Fresh session starting in the local engine's directory
    pub fn new_session(&self) -> SessionContext {
        SessionContext::new(self.local.current_dir())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn console(&self) -> &Arc<dyn Console> {
        &self.console
    }

    /// Parse a line with this runner's capture policies
    pub fn parse(&self, text: &str) -> CommandLine {
        CommandLine::parse(text, &self.policies)
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_connected()
    }

    /// Prompt text for interactive input
    pub fn prompt(&self, session: &SessionContext) -> String {
        format!("{}> ", session.location())
    }

    /// Run one interactively typed line
    pub fn run_line(&mut self, session: &mut SessionContext, text: &str) -> CommandResult {
        if text.trim().is_empty() {
            return CommandResult::next();
        }
        session.mode = RunMode::UserInput;

        let parsed = self.parse(text);
        let line = self.substitute(&parsed, &session.variables, None);
        let result = self.run(session, &line, None);
        self.refresh_location(session);
        result
    }

    /// Dispatch one parsed, substituted line
    pub fn run(
        &mut self,
        session: &mut SessionContext,
        line: &CommandLine,
        file: Option<&mut FileRunContext>,
    ) -> CommandResult {
        if line.is_blank() || line.is_comment {
            return CommandResult::next();
        }
        trace!("Dispatching {} line", line.command_type);

        match line.command_type {
            CommandType::None => self.passthrough(session, line),
            CommandType::Connect => self.connect(line),
            CommandType::EndConnect => self.end_connect(),
            CommandType::Transfer => self.transfer(line),
            CommandType::Run => self.import_files(session, line),
            CommandType::Open => self.open(line),
            CommandType::Back => self.back(session),
            CommandType::DeclareVariable => self.declare_variables(session, line, file.as_deref()),
            CommandType::RemoveVariable => self.remove_variables(session, line),
            CommandType::RequireVariable => self.require_variables(line, file),
            CommandType::UnrequireVariable => self.unrequire_variables(line, file),
            CommandType::IfExist => self.if_exist(session, line),
            CommandType::EndIf => CommandResult::next(),
            CommandType::PrintMode => {
                session.echo = !session.echo;
                self.say(if session.echo { "Print mode on" } else { "Print mode off" });
                CommandResult::next()
            }
            CommandType::InvokeMode => {
                session.invoke = true;
                self.say("Invoke mode on");
                CommandResult::next()
            }
            CommandType::EndInvokeMode => {
                session.invoke = false;
                self.say("Invoke mode off");
                CommandResult::next()
            }
            CommandType::Clear => {
                self.console.clear();
                CommandResult::next()
            }
            CommandType::FixRow => self.fix_row(line),
            CommandType::EndFixRow => {
                self.remote.exit_redraw();
                CommandResult::next()
            }
        }
    }

    /// Close any remote session
    pub fn shutdown(&mut self) {
        self.remote.disconnect();
    }

    /// Resolve references and parse the result again
    fn substitute(
        &self,
        line: &CommandLine,
        session: &VariableStore,
        file: Option<&VariableStore>,
    ) -> CommandLine {
        let mut layers = vec![session];
        layers.extend(file);
        let text = substitute_line(line, &layers);
        if text == line.raw {
            return line.clone();
        }
        self.parse(&text)
    }

    fn refresh_location(&self, session: &mut SessionContext) {
        session.location = if self.remote.is_connected() {
            self.remote
                .location()
                .or_else(|| self.remote.endpoint().map(|e| e.destination()))
                .unwrap_or_default()
        } else {
            self.local.current_dir().display().to_string()
        };
    }

    fn say(&self, text: &str) {
        self.console.write_line(text);
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.shutdown();
    }
}
