//! Script file execution

use super::{CommandResult, FileRunContext, RunMode, Runner, SessionContext};
use crate::command::CommandType;
use crate::error::Error;
use crate::variable::VariableStore;

impl Runner {
    /// Run one script file with the variables of the line that imported it
    pub(super) fn run_file(
        &mut self,
        session: &mut SessionContext,
        file_name: &str,
        trigger: &VariableStore,
    ) -> CommandResult {
        self.say(&format!("Start run file {}", file_name));

        let path = self.local.current_dir().join(file_name);
        let result = if !path.is_file() {
            self.say(&Error::ScriptNotFound { path: file_name.into() }.to_string());
            CommandResult::next()
        } else {
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    let mut file = FileRunContext::new(file_name, trigger.clone());
                    debug!("Running {} as {}", path.display(), file.id);
                    self.run_lines(session, &mut file, &text)
                }
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    self.say(&format!("Cannot read file {}: {}", file_name, e));
                    CommandResult::next()
                }
            }
        };

        self.say(&format!("Finish run file {}", file_name));
        result
    }

    /// Run script text as if it were an imported file
    pub fn run_script(
        &mut self,
        session: &mut SessionContext,
        file_name: &str,
        text: &str,
        variables: VariableStore,
    ) -> CommandResult {
        let previous = session.mode;
        session.mode = RunMode::FileRun;
        let mut file = FileRunContext::new(file_name, variables);
        let result = self.run_lines(session, &mut file, text);
        session.mode = previous;
        self.refresh_location(session);
        result
    }

    /// Line loop of one file: gating, conditional suppression and echo
    fn run_lines(
        &mut self,
        session: &mut SessionContext,
        file: &mut FileRunContext,
        text: &str,
    ) -> CommandResult {
        let mut suppress = false;

        for raw in text.lines() {
            if raw.trim().is_empty() {
                if session.echo && !suppress {
                    self.say("");
                }
                continue;
            }

            let parsed = self.parse(raw);
            let line = self.substitute(&parsed, &session.variables, Some(&file.variables));

            if let Some(key) = file.missing_required(&[&session.variables, &file.variables]) {
                let error = Error::RequiredVariableMissing { key: key.to_string() };
                self.say(&error.to_string());
                return CommandResult::halt();
            }

            if suppress {
                if line.command_type == CommandType::EndIf {
                    suppress = false;
                }
                continue;
            }

            if !line.is_comment {
                self.say(&format!("> {}", line.masked()));
            }

            let result = self.run(session, &line, Some(&mut *file));
            if !result.can_continue {
                return result;
            }
            if line.command_type == CommandType::IfExist && !result.is_if_true {
                suppress = true;
            }
        }

        CommandResult::next()
    }
}
