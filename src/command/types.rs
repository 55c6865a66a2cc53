//! Command types and capture policies
//!
//! Every input line starts with a keyword that maps to a [`CommandType`].
//! Each command type owns a [`CapturePolicy`] that tells the tokenizer how
//! argument tokens group into parts.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Marker that prefixes runtime variable keys (`-@name`)
pub const VARIABLE_MARKER: &str = "-@";

/// Marker that prefixes secret flags (`-#p`)
pub const SECRET_MARKER: &str = "-#";

/// Marker that starts a comment line
pub const COMMENT_MARKER: &str = "--";

/// The closed set of commands the interpreter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    /// Not a keyword; the line goes to the local engine or remote session
    None,
    /// `ssh` - open a remote session
    Connect,
    /// `endssh` - close the remote session
    EndConnect,
    /// `scp` - copy a file to or from a remote host
    Transfer,
    /// `run` - execute script files
    Run,
    /// `open` - open a path with the platform opener
    Open,
    /// `back` - return to the start path
    Back,
    /// `var` - declare or look up variables
    DeclareVariable,
    /// `rmvar` - remove variables
    RemoveVariable,
    /// `required` - register required variables for the running file
    RequireVariable,
    /// `unrequired` - unregister required variables
    UnrequireVariable,
    /// `ifexist` - conditional block on file existence
    IfExist,
    /// `endif` - end of a conditional block
    EndIf,
    /// `print` - toggle echo mode
    PrintMode,
    /// `invoke` - enter synchronous invoke mode
    InvokeMode,
    /// `endinvoke` - leave synchronous invoke mode
    EndInvokeMode,
    /// `clear` / `cls`
    Clear,
    /// `fixrow` - enter fixed-row redraw mode
    FixRow,
    /// `endfixrow` - leave fixed-row redraw mode
    EndFixRow,
}

impl CommandType {
    /// Map a command keyword to its type
    ///
    /// Leading `#` characters are ignored and matching is case-insensitive.
    /// Anything unrecognised is [`CommandType::None`].
    pub fn from_keyword(keyword: &str) -> Self {
        let word = keyword.trim_start_matches('#').to_ascii_lowercase();
        match word.as_str() {
            "ssh" => CommandType::Connect,
            "endssh" => CommandType::EndConnect,
            "scp" => CommandType::Transfer,
            "run" => CommandType::Run,
            "open" => CommandType::Open,
            "back" => CommandType::Back,
            "var" => CommandType::DeclareVariable,
            "rmvar" => CommandType::RemoveVariable,
            "required" => CommandType::RequireVariable,
            "unrequired" => CommandType::UnrequireVariable,
            "ifexist" => CommandType::IfExist,
            "endif" => CommandType::EndIf,
            "print" => CommandType::PrintMode,
            "invoke" => CommandType::InvokeMode,
            "endinvoke" => CommandType::EndInvokeMode,
            "clear" | "cls" => CommandType::Clear,
            "fixrow" => CommandType::FixRow,
            "endfixrow" => CommandType::EndFixRow,
            _ => CommandType::None,
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandType::None => "passthrough",
            CommandType::Connect => "ssh",
            CommandType::EndConnect => "endssh",
            CommandType::Transfer => "scp",
            CommandType::Run => "run",
            CommandType::Open => "open",
            CommandType::Back => "back",
            CommandType::DeclareVariable => "var",
            CommandType::RemoveVariable => "rmvar",
            CommandType::RequireVariable => "required",
            CommandType::UnrequireVariable => "unrequired",
            CommandType::IfExist => "ifexist",
            CommandType::EndIf => "endif",
            CommandType::PrintMode => "print",
            CommandType::InvokeMode => "invoke",
            CommandType::EndInvokeMode => "endinvoke",
            CommandType::Clear => "clear",
            CommandType::FixRow => "fixrow",
            CommandType::EndFixRow => "endfixrow",
        };
        write!(f, "{}", name)
    }
}

/// How a token without a leading dash joins the current part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureRule {
    /// Always absorbed, parts keep growing
    AlwaysCapture,
    /// Never absorbed, every token is its own part
    AlwaysSingle,
    /// Absorbed when the key starts with `-`
    ValueMustStartWithDash,
    /// Absorbed when the key does not start with `-`
    ValueMustNotStartWithDash,
    /// Absorbed when the key starts with `-` but is not a `-@` variable
    ValueDashButNotMarked,
    /// Absorbed when the key is a `-@` variable
    ValueIsMarked,
    /// Absorbed when the key is not a `-@` variable
    ValueNotMarked,
}

impl CaptureRule {
    /// Whether a part whose first token is `key` takes the next value token
    pub fn accepts_value(&self, key: &str) -> bool {
        let dashed = key.starts_with('-');
        let marked = key.starts_with(VARIABLE_MARKER);
        match self {
            CaptureRule::AlwaysCapture => true,
            CaptureRule::AlwaysSingle => false,
            CaptureRule::ValueMustStartWithDash => dashed,
            CaptureRule::ValueMustNotStartWithDash => !dashed,
            CaptureRule::ValueDashButNotMarked => dashed && !marked,
            CaptureRule::ValueIsMarked => marked,
            CaptureRule::ValueNotMarked => !marked,
        }
    }

    /// Whether a part that already holds a value keeps absorbing
    pub fn keeps_capturing(&self) -> bool {
        matches!(self, CaptureRule::AlwaysCapture)
    }
}

/// Grouping policy of one command type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturePolicy {
    pub rule: CaptureRule,
    /// Leading argument tokens taken as plain positional parts
    #[serde(default)]
    pub skip: usize,
}

impl CapturePolicy {
    pub const fn new(rule: CaptureRule, skip: usize) -> Self {
        Self { rule, skip }
    }
}

impl Default for CapturePolicy {
    fn default() -> Self {
        Self::new(CaptureRule::AlwaysSingle, 0)
    }
}

static DEFAULT_POLICIES: Lazy<HashMap<CommandType, CapturePolicy>> = Lazy::new(|| {
    use CaptureRule::*;

    let mut table = HashMap::new();
    table.insert(CommandType::DeclareVariable, CapturePolicy::new(AlwaysCapture, 0));
    table.insert(CommandType::None, CapturePolicy::new(ValueMustStartWithDash, 0));
    table.insert(CommandType::Run, CapturePolicy::new(ValueMustStartWithDash, 0));
    table.insert(CommandType::Connect, CapturePolicy::new(ValueDashButNotMarked, 1));
    table.insert(CommandType::Transfer, CapturePolicy::new(ValueDashButNotMarked, 0));
    table
});

/// Lookup table from command type to capture policy
///
/// Types without an entry use [`CapturePolicy::default`].
#[derive(Debug, Clone)]
pub struct PolicyTable {
    policies: HashMap<CommandType, CapturePolicy>,
}

impl PolicyTable {
    /// Table with the built-in policies
    pub fn new() -> Self {
        Self {
            policies: DEFAULT_POLICIES.clone(),
        }
    }

    /// Built-in policies with overrides keyed by command keyword
    ///
    /// The key `passthrough` addresses non-keyword lines. Unknown keywords
    /// are ignored with a warning.
    pub fn with_overrides(overrides: &HashMap<String, CapturePolicy>) -> Self {
        let mut table = Self::new();
        for (keyword, policy) in overrides {
            let command_type = if keyword.eq_ignore_ascii_case("passthrough") {
                CommandType::None
            } else {
                match CommandType::from_keyword(keyword) {
                    CommandType::None => {
                        warn!("Ignoring capture policy for unknown keyword '{}'", keyword);
                        continue;
                    }
                    other => other,
                }
            };
            debug!("Capture policy for {}: {:?}", command_type, policy);
            table.set(command_type, *policy);
        }
        table
    }

    /// Policy for a command type
    pub fn policy(&self, command_type: CommandType) -> CapturePolicy {
        self.policies
            .get(&command_type)
            .copied()
            .unwrap_or_default()
    }

    /// Replace the policy of one command type
    pub fn set(&mut self, command_type: CommandType, policy: CapturePolicy) {
        self.policies.insert(command_type, policy);
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new()
    }
}
