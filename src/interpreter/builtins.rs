//! Built-in command handlers

use super::{CommandResult, FileRunContext, RunMode, Runner, SessionContext};
use crate::command::CommandLine;
use crate::error::Error;
use crate::execution::ShellResult;
use crate::remote::{parse_connect, transfer, TransferSpec};
use crate::variable::{lookup, marked_key};
use std::sync::Arc;

impl Runner {
    /// Non-keyword lines go to the remote session when one is open
    pub(super) fn passthrough(
        &mut self,
        session: &SessionContext,
        line: &CommandLine,
    ) -> CommandResult {
        if self.remote.is_connected() {
            return match self.remote.send(&line.raw) {
                Ok(_) => CommandResult::next(),
                Err(e) => {
                    error!("Remote command failed: {}", e);
                    // Stream failures were already reported as they happened
                    if !matches!(e, Error::StreamClosed { .. }) {
                        self.say(&e.to_string());
                    }
                    self.remote.disconnect();
                    CommandResult::halt()
                }
            };
        }

        let result = if session.invoke {
            let console = Arc::clone(&self.console);
            self.local
                .invoke_streaming(&line.raw, &mut |out: &str| console.write_line(out))
        } else {
            self.local.invoke(&line.raw)
        };
        self.print_shell_result(&result, session.invoke);
        CommandResult::next()
    }

    fn print_shell_result(&self, result: &ShellResult, streamed: bool) {
        if let Some(message) = &result.error_message {
            self.say(message);
            return;
        }
        if !streamed {
            for line in &result.output {
                self.say(line);
            }
        }
        for line in &result.errors {
            self.say(line);
        }
    }

    pub(super) fn connect(&mut self, line: &CommandLine) -> CommandResult {
        if self.remote.is_connected() {
            self.say("Cannot create new ssh connections in ssh mode");
            self.remote.disconnect();
            return CommandResult::halt();
        }

        let endpoint = match parse_connect(line, &self.config.remote) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                self.say(&e.to_string());
                return CommandResult::halt();
            }
        };

        self.say("Create new ssh connection");
        match self.remote.connect(endpoint) {
            Ok(()) => CommandResult::next(),
            Err(e) => {
                debug!("Connect failed: {}", e);
                CommandResult::halt()
            }
        }
    }

    pub(super) fn end_connect(&mut self) -> CommandResult {
        if !self.remote.disconnect() {
            self.say("No ssh connection to close");
        }
        CommandResult::next()
    }

    pub(super) fn transfer(&mut self, line: &CommandLine) -> CommandResult {
        let spec = match TransferSpec::parse(line, &self.config.remote) {
            Ok(spec) => spec,
            Err(e) => {
                self.say(&e.to_string());
                return CommandResult::next();
            }
        };

        if let Err(e) = transfer::execute(
            &spec,
            self.transfer.as_mut(),
            self.console.as_ref(),
            self.local.current_dir(),
        ) {
            warn!("Transfer failed: {}", e);
            self.say(&e.to_string());
        }
        CommandResult::next()
    }

    pub(super) fn import_files(
        &mut self,
        session: &mut SessionContext,
        line: &CommandLine,
    ) -> CommandResult {
        let files: Vec<String> = line
            .values_of("-f")
            .chain(line.positionals())
            .map(str::to_string)
            .collect();
        if files.is_empty() {
            self.say("No file to run");
            return CommandResult::next();
        }

        let previous = session.mode;
        session.mode = RunMode::FileRun;
        let mut result = CommandResult::next();
        for file_name in &files {
            result = self.run_file(session, file_name, &line.variables);
            if !result.can_continue {
                break;
            }
        }
        session.mode = previous;
        result
    }

    pub(super) fn open(&mut self, line: &CommandLine) -> CommandResult {
        let path = line.positionals().next().unwrap_or(".");
        let script = format!("{} {}", self.config.local.open_command, path);
        let result = self.local.invoke(&script);
        self.print_shell_result(&result, false);
        CommandResult::next()
    }

    pub(super) fn back(&mut self, session: &SessionContext) -> CommandResult {
        let script = format!("cd {}", session.start_path.display());
        let result = self.local.invoke(&script);
        self.print_shell_result(&result, false);
        CommandResult::next()
    }

    /// `var -@k v ...` declares; a line without any pair looks keys up
    pub(super) fn declare_variables(
        &mut self,
        session: &mut SessionContext,
        line: &CommandLine,
        file: Option<&FileRunContext>,
    ) -> CommandResult {
        if line.arguments().is_empty() {
            self.say("No variable to declare");
            return CommandResult::next();
        }

        let pairs: Vec<(&str, &str)> = line
            .arguments()
            .iter()
            .filter_map(|part| part.key.as_deref().map(|key| (key, part.value.as_str())))
            .collect();
        if !pairs.is_empty() {
            for (key, value) in pairs {
                let key = marked_key(key);
                session.variables.declare(&key, value);
                self.say(&format!("Declare variable {} = {}", key, value));
            }
            return CommandResult::next();
        }

        let mut layers = vec![&session.variables];
        layers.extend(file.map(|f| &f.variables));
        for key in line.positionals().map(marked_key) {
            let message = match lookup(&key, &layers) {
                Some(value) => format!("Variable {} = {}", key, value),
                None => format!("Variable {} not found", key),
            };
            self.say(&message);
        }
        CommandResult::next()
    }

    pub(super) fn remove_variables(
        &mut self,
        session: &mut SessionContext,
        line: &CommandLine,
    ) -> CommandResult {
        let keys: Vec<&str> = line.positionals().collect();
        if keys.is_empty() {
            self.say("No variables are removed");
            return CommandResult::next();
        }

        for key in keys {
            let message = match session.variables.remove(key) {
                Some(_) => format!("Variable {} has been removed", key),
                None => format!("Variable {} not found", key),
            };
            self.say(&message);
        }
        CommandResult::next()
    }

    pub(super) fn require_variables(
        &mut self,
        line: &CommandLine,
        file: Option<&mut FileRunContext>,
    ) -> CommandResult {
        let Some(file) = file else {
            self.say("Required variables only apply to file runs");
            return CommandResult::next();
        };

        for key in line.positionals() {
            let key = marked_key(key);
            let message = if file.require(&key) {
                format!("Register required variable: {}", key)
            } else {
                format!("Variable {} is already required", key)
            };
            self.say(&message);
        }
        CommandResult::next()
    }

    pub(super) fn unrequire_variables(
        &mut self,
        line: &CommandLine,
        file: Option<&mut FileRunContext>,
    ) -> CommandResult {
        let Some(file) = file else {
            self.say("Required variables only apply to file runs");
            return CommandResult::next();
        };

        let keys: Vec<String> = line.positionals().map(marked_key).collect();
        if keys.is_empty() {
            self.say("No variables are removed from required list");
            return CommandResult::next();
        }
        for key in keys {
            if file.unrequire(&key) {
                self.say(&format!("Variable {} has been removed from required list", key));
            }
        }
        CommandResult::next()
    }

    /// True only in a file run when every named file exists
    pub(super) fn if_exist(&mut self, session: &SessionContext, line: &CommandLine) -> CommandResult {
        let base = self.local.current_dir().to_path_buf();
        let mut all_exist = !line.arguments().is_empty();

        for name in line.arguments().iter().map(|p| p.tokens.join(" ")) {
            let exists = base.join(&name).is_file();
            all_exist &= exists;
            let state = if exists { "exist" } else { "not exist" };
            self.say(&format!("File「{}」is {} : {}", name, state, exists));
        }

        if session.mode == RunMode::FileRun && all_exist {
            CommandResult::if_true()
        } else {
            CommandResult::end_if()
        }
    }

    pub(super) fn fix_row(&mut self, line: &CommandLine) -> CommandResult {
        let row = match line.positionals().next().map(str::parse::<u16>) {
            Some(Ok(row)) => Some(row),
            Some(Err(_)) => {
                self.say("Row must be a positive number");
                return CommandResult::next();
            }
            None => None,
        };

        if let Err(e) = self.remote.enter_redraw(row) {
            debug!("Fixed-row mode unavailable: {}", e);
            self.say("Fixed-row mode needs an ssh connection");
        }
        CommandResult::next()
    }
}
