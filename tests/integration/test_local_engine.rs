//! Integration Tests: Local Process Engine
//!
//! Runs real scripts through the platform shell.

#![cfg(unix)]

use shellrunner::config::LocalConfig;
use shellrunner::execution::{LocalEngine, ProcessEngine};
use tempfile::TempDir;

fn engine_in(dir: &TempDir) -> ProcessEngine {
    let config = LocalConfig {
        working_directory: Some(dir.path().to_path_buf()),
        ..LocalConfig::default()
    };
    ProcessEngine::new(&config).expect("Failed to create engine")
}

#[test]
fn test_collects_stdout_and_stderr() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);

    let result = engine.invoke("echo out; echo err 1>&2");

    assert_eq!(result.output, vec!["out"]);
    assert_eq!(result.errors, vec!["err"]);
    assert_eq!(result.exit_code, Some(0));
    assert!(result.is_success());
}

#[test]
fn test_exit_code() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);

    let result = engine.invoke("exit 3");
    assert_eq!(result.exit_code, Some(3));
    assert!(!result.is_success());
}

#[test]
fn test_streaming_sees_each_line() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);
    let mut seen = Vec::new();

    let result = engine.invoke_streaming("printf 'a\\nb\\nc\\n'", &mut |line: &str| {
        seen.push(line.to_string())
    });

    assert_eq!(seen, vec!["a", "b", "c"]);
    assert_eq!(result.output, seen);
}

#[test]
fn test_cd_persists_between_invocations() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub").join("marker.txt"), "x").unwrap();
    let mut engine = engine_in(&dir);

    let result = engine.invoke("cd sub");
    assert!(result.is_success());
    assert_eq!(
        engine.current_dir(),
        dir.path().join("sub").canonicalize().unwrap()
    );

    let listing = engine.invoke("ls");
    assert_eq!(listing.output, vec!["marker.txt"]);
}

#[test]
fn test_cd_to_missing_directory() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);
    let before = engine.current_dir().to_path_buf();

    let result = engine.invoke("cd does-not-exist");
    assert_eq!(
        result.error_message.as_deref(),
        Some("cd: no such directory: does-not-exist")
    );
    assert_eq!(engine.current_dir(), before);
}

#[test]
fn test_environment_is_passed() {
    let dir = TempDir::new().unwrap();
    let mut engine = engine_in(&dir);
    engine.set_env("SHELLRUNNER_TEST".to_string(), "on".to_string());

    let result = engine.invoke("echo $SHELLRUNNER_TEST");
    assert_eq!(result.output, vec!["on"]);
}

#[test]
fn test_missing_shell() {
    let config = LocalConfig {
        shell: "/nonexistent/shell".into(),
        ..LocalConfig::default()
    };
    let mut engine = ProcessEngine::new(&config).unwrap();

    let result = engine.invoke("echo hi");
    assert!(result.error_message.is_some());
    assert!(!result.is_success());
}
