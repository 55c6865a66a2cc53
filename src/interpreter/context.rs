//! Session and file-run state
//!
//! Both contexts are plain values owned by the caller and passed into every
//! interpreter call.

use crate::variable::{lookup, VariableStore};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Where lines come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    UserInput,
    FileRun,
}

/// State that lives for the whole interactive session
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Variables declared with `var`
    pub variables: VariableStore,
    pub mode: RunMode,
    /// Echo blank script lines (`print`)
    pub echo: bool,
    /// Stream local output as it arrives (`invoke`)
    pub invoke: bool,
    /// Local directory the session started in (`back`)
    pub start_path: PathBuf,
    pub(crate) location: String,
}

impl SessionContext {
    pub fn new(start_path: &Path) -> Self {
        Self {
            variables: VariableStore::new(),
            mode: RunMode::UserInput,
            echo: false,
            invoke: false,
            start_path: start_path.to_path_buf(),
            location: start_path.display().to_string(),
        }
    }

    /// Current location for the prompt: local directory or remote prompt
    pub fn location(&self) -> &str {
        &self.location
    }
}

/// State of one imported script file
#[derive(Debug, Clone)]
pub struct FileRunContext {
    pub id: Uuid,
    pub file_name: String,
    /// Variables from the `run` line that imported the file
    pub variables: VariableStore,
    /// Keys that must be declared before each line runs
    pub required: Vec<String>,
}

impl FileRunContext {
    pub fn new(file_name: &str, variables: VariableStore) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            variables,
            required: Vec::new(),
        }
    }

    /// Add a required key; false if it was already listed
    pub fn require(&mut self, key: &str) -> bool {
        if self.required.iter().any(|k| k == key) {
            return false;
        }
        self.required.push(key.to_string());
        true
    }

    /// Drop a required key; false if it was not listed
    pub fn unrequire(&mut self, key: &str) -> bool {
        let before = self.required.len();
        self.required.retain(|k| k != key);
        self.required.len() != before
    }

    /// First required key missing from every layer
    pub fn missing_required<'a>(&'a self, layers: &[&VariableStore]) -> Option<&'a str> {
        self.required
            .iter()
            .find(|key| lookup(key, layers).is_none())
            .map(String::as_str)
    }
}
