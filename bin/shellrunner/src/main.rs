//! ShellRunner - scriptable command runner
//!
//! With arguments, the arguments are run as a single `run` line and the
//! process exits. Without arguments, lines are read from standard input
//! until `exit`.

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use tracing::{debug, error, info};

use shellrunner::{Config, Runner};

/// Parsed command line
#[derive(Debug, Default)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Enable debug logging
    debug: bool,
    /// Everything else, run as `run <script>`
    script: Vec<String>,
}

impl AppArgs {
    fn parse() -> anyhow::Result<Self> {
        let mut app_args = AppArgs::default();
        let mut args = env::args().skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" if app_args.script.is_empty() => {
                    let path = args.next().context("Missing config file path")?;
                    app_args.config_path = Some(PathBuf::from(path));
                }
                "--debug" | "-d" if app_args.script.is_empty() => {
                    app_args.debug = true;
                }
                "--help" | "-?" if app_args.script.is_empty() => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-V" if app_args.script.is_empty() => {
                    println!("ShellRunner v{}", shellrunner::VERSION);
                    process::exit(0);
                }
                _ => app_args.script.push(arg),
            }
        }

        Ok(app_args)
    }
}

fn print_help() {
    println!("ShellRunner - scriptable command runner for local shells and SSH sessions");
    println!();
    println!("USAGE:");
    println!("    shellrunner [OPTIONS]                      Interactive mode");
    println!("    shellrunner [OPTIONS] <FILE>... [-@key value]...");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Path to configuration file");
    println!("    -d, --debug            Enable debug logging");
    println!("    -?, --help             Print this help message");
    println!("    -V, --version          Print version information");
    println!();
    println!("CONFIGURATION:");
    println!("    Configuration is read from the first of:");
    println!("    1. Path specified with --config");
    println!("    2. <config dir>/shellrunner/config.toml (or .json)");
    println!("    3. $XDG_CONFIG_HOME/shellrunner/config.toml");
    println!("    4. ~/.shellrunner.toml");
    println!("    5. ./.shellrunner.toml");
    println!("    6. Built-in defaults");
    println!();
    println!("ENVIRONMENT:");
    println!("    SHELLRUNNER_DEBUG      Enable debug logging (1 or true)");
    println!("    RUST_LOG               Set logging level (error, warn, info, debug, trace)");
}

fn init_logging(debug: bool) {
    let debug = debug
        || env::var("SHELLRUNNER_DEBUG").map_or(false, |v| v == "1" || v.eq_ignore_ascii_case("true"));
    let level = if debug { "debug" } else { "warn" };

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn load_configuration(args: &AppArgs) -> anyhow::Result<Config> {
    match &args.config_path {
        Some(path) => shellrunner::init_with_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(shellrunner::init()?),
    }
}

fn run_arguments(runner: &mut Runner, script: &[String]) -> bool {
    println!("CommandLine args mode");
    let mut session = runner.new_session();
    let line = format!("run {}", script.join(" "));
    runner.run_line(&mut session, &line).can_continue
}

fn run_interactive(runner: &mut Runner) -> anyhow::Result<()> {
    println!("User input mode");
    let mut session = runner.new_session();
    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("{}", runner.prompt(&session));
        io::stdout().flush()?;

        input.clear();
        if stdin.lock().read_line(&mut input)? == 0 {
            debug!("End of input");
            break;
        }
        let line = input.trim();
        if line == "exit" {
            break;
        }
        runner.run_line(&mut session, line);
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("Failed to parse arguments: {}", e);
        print_help();
        process::exit(1);
    });
    init_logging(args.debug);

    let config = load_configuration(&args)?;
    let mut runner = Runner::new(config).context("Failed to start runner")?;
    info!("Runner ready");
    println!("ShellRunner v{}", shellrunner::VERSION);

    if args.script.is_empty() {
        run_interactive(&mut runner)?;
    } else if !run_arguments(&mut runner, &args.script) {
        error!("Script run halted");
        runner.shutdown();
        process::exit(1);
    }

    runner.shutdown();
    Ok(())
}
