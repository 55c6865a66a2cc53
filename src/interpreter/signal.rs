//! Control-flow result of one command

/// What the script loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandResult {
    /// False stops the enclosing file
    pub can_continue: bool,
    /// Set by a conditional whose condition held
    pub is_if_true: bool,
    /// Set by a conditional whose condition failed
    pub is_end_if: bool,
}

impl CommandResult {
    pub const fn next() -> Self {
        Self {
            can_continue: true,
            is_if_true: false,
            is_end_if: false,
        }
    }

    pub const fn halt() -> Self {
        Self {
            can_continue: false,
            is_if_true: false,
            is_end_if: false,
        }
    }

    pub const fn if_true() -> Self {
        Self {
            can_continue: true,
            is_if_true: true,
            is_end_if: false,
        }
    }

    pub const fn end_if() -> Self {
        Self {
            can_continue: true,
            is_if_true: false,
            is_end_if: true,
        }
    }
}

impl Default for CommandResult {
    fn default() -> Self {
        Self::next()
    }
}
