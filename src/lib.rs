//! ShellRunner - scriptable command runner for local shells and SSH sessions
//!
//! ShellRunner executes command lines either through the local platform shell
//! or over an interactive SSH session, driven by a small scripting language
//! with variables, conditionals and file imports.
//!
//! ## Module Organization
//!
//! ### Script language
//!
//! - [`command`] - Command-line model, command types and the tokenizer
//! - [`variable`] - Variable stores and the substitution engine
//! - [`interpreter`] - The runner, session/file contexts and control-flow signals
//!
//! ### Engines
//!
//! - [`execution`] - Local command execution through the platform shell
//! - [`remote`] - SSH session engine, prompt detection and file transfer
//! - [`terminal`] - Console output and control-sequence stripping
//!
//! ### Support
//!
//! - [`config`] - Configuration loading and validation
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use shellrunner::{init, Runner};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = init()?;
//! let mut runner = Runner::new(config)?;
//! let mut session = runner.new_session();
//!
//! runner.run_line(&mut session, "var -@name world");
//! runner.run_line(&mut session, "echo hello {name}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Threading
//!
//! The interpreter runs on the caller's thread, one line at a time. Remote
//! output arrives on a transport reader thread and is handed to the waiting
//! caller through a mutex and condition variable.

#[macro_use]
extern crate tracing;

pub mod command;
pub mod config;
pub mod error;
pub mod execution;
pub mod interpreter;
pub mod remote;
pub mod terminal;
pub mod variable;

// Re-exports for core functionality
pub use command::{CommandLine, CommandPart, CommandType};
pub use config::Config;
pub use error::{Error, Result};
pub use interpreter::{CommandResult, FileRunContext, RunMode, Runner, SessionContext};
pub use variable::VariableStore;

// Convenience re-exports for common types
pub use config::loader::ConfigLoader;

/// The current version of ShellRunner from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize ShellRunner with configuration from the default locations
///
/// Falls back to the built-in defaults when no configuration file is found
/// or the file found cannot be loaded.
pub fn init() -> Result<Config> {
    info!("Initializing {} v{}", NAME, VERSION);

    let config = match ConfigLoader::load() {
        Ok(config) => {
            debug!("Configuration loaded from default location");
            config
        }
        Err(e) => {
            warn!("Failed to load configuration: {}. Using defaults", e);
            Config::default()
        }
    };

    Ok(config)
}

/// Initialize ShellRunner with a specific configuration file
pub fn init_with_config(path: &std::path::Path) -> Result<Config> {
    info!("Initializing {} v{} with {}", NAME, VERSION, path.display());
    ConfigLoader::load_from_path(path)
}
