//! Command-line model
//!
//! A [`CommandLine`] is the parsed form of one input line: its parts, its
//! command type and the runtime variables the line declares.

pub mod tokenizer;
pub mod types;

pub use types::{
    CapturePolicy, CaptureRule, CommandType, PolicyTable, COMMENT_MARKER, SECRET_MARKER,
    VARIABLE_MARKER,
};

use crate::variable::VariableStore;

/// Classification of one part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// Part 0
    CommandName,
    /// A key followed by a value
    Keyed,
    /// A bare argument
    Positional,
}

/// One group of tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPart {
    pub index: usize,
    /// First token of a multi-token group
    pub key: Option<String>,
    /// Remaining tokens joined by a space, or the only token
    pub value: String,
    pub tokens: Vec<String>,
}

impl CommandPart {
    pub(crate) fn from_tokens(index: usize, tokens: Vec<String>) -> Self {
        let (key, value) = match tokens.split_first() {
            Some((first, rest)) if !rest.is_empty() => (Some(first.clone()), rest.join(" ")),
            Some((first, _)) => (None, first.clone()),
            None => (None, String::new()),
        };
        Self {
            index,
            key,
            value,
            tokens,
        }
    }

    pub fn kind(&self) -> PartKind {
        if self.index == 0 {
            PartKind::CommandName
        } else if self.key.is_some() {
            PartKind::Keyed
        } else {
            PartKind::Positional
        }
    }

    /// Whether the part has the given key
    pub fn has_key(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}

/// Parsed representation of one input line
#[derive(Debug, Clone)]
pub struct CommandLine {
    /// Trimmed input text
    pub raw: String,
    pub parts: Vec<CommandPart>,
    pub command_type: CommandType,
    pub is_comment: bool,
    /// Runtime variables declared by `-@key value` parts of this line
    pub variables: VariableStore,
}

impl CommandLine {
    /// Parse a line with the given capture policies
    pub fn parse(text: &str, policies: &PolicyTable) -> Self {
        let raw = text.trim().to_string();
        let parts = tokenizer::tokenize(&raw, policies);
        let command_type = parts
            .first()
            .map(|p| CommandType::from_keyword(&p.value))
            .unwrap_or(CommandType::None);

        let mut variables = VariableStore::new();
        for part in parts.iter().skip(1) {
            if let Some(key) = &part.key {
                if key.starts_with(VARIABLE_MARKER) {
                    variables.declare(key, &part.value);
                }
            }
        }

        Self {
            is_comment: raw.starts_with(COMMENT_MARKER),
            raw,
            parts,
            command_type,
            variables,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.parts.is_empty()
    }

    /// The command keyword as typed
    pub fn name(&self) -> &str {
        self.parts.first().map(|p| p.value.as_str()).unwrap_or("")
    }

    /// Every part after the command name
    pub fn arguments(&self) -> &[CommandPart] {
        self.parts.get(1..).unwrap_or(&[])
    }

    /// Bare arguments, in order
    pub fn positionals(&self) -> impl Iterator<Item = &str> {
        self.arguments()
            .iter()
            .filter(|p| p.key.is_none())
            .map(|p| p.value.as_str())
    }

    /// Value of the first part with the given key
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.arguments()
            .iter()
            .find(|p| p.has_key(key))
            .map(|p| p.value.as_str())
    }

    /// Values of every part with the given key
    pub fn values_of<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.arguments()
            .iter()
            .filter(move |p| p.has_key(key))
            .map(|p| p.value.as_str())
    }

    /// Whether a bare flag such as `-v` is present
    pub fn has_flag(&self, flag: &str) -> bool {
        self.arguments()
            .iter()
            .any(|p| p.key.is_none() && p.value == flag)
    }

    /// The line with the values of `-#` secret flags hidden
    pub fn masked(&self) -> String {
        self.parts
            .iter()
            .map(|p| match &p.key {
                Some(key) if key.starts_with(SECRET_MARKER) => format!("{} ******", key),
                _ => p.tokens.join(" "),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
