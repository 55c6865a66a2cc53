//! Security Tests: Password Isolation
//!
//! Passwords given with `-#p` reach the remote side but never the console,
//! debug output or error messages.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use shellrunner::command::PolicyTable;
use shellrunner::config::RemoteConfig;
use shellrunner::remote::{parse_connect, Endpoint, TransferSpec};
use shellrunner::CommandLine;
use test_utils::{MockHost, TestRig};

const SECRET: &str = "hunter2";

#[test]
fn test_script_echo_masks_password() {
    let mut rig = TestRig::with_host(MockHost::default());
    rig.script(
        "login.txt",
        "ssh deploy@box -#p hunter2\nsudo systemctl restart app\nendssh\n",
    );

    assert!(rig.line("run login.txt"));

    assert!(rig.saw("> ssh deploy@box -#p ******"));
    assert!(!rig.saw(SECRET), "console output: {:?}", rig.lines());
    // The password was still delivered for sudo
    assert!(rig.transport.writes().contains(&SECRET.to_string()));
}

#[test]
fn test_password_from_variable_is_masked() {
    let mut rig = TestRig::with_host(MockHost::default());
    rig.script("login.txt", "ssh deploy@box -#p {pw}\nendssh\n");

    assert!(rig.line("run login.txt -@pw hunter2"));
    assert!(rig.saw("Ssh connection success"));
    assert!(!rig.saw(SECRET));
}

#[test]
fn test_endpoint_debug_is_redacted() {
    let endpoint = Endpoint::new("deploy@box", SECRET, 22, "root");
    let debug = format!("{:?}", endpoint);
    assert!(debug.contains("<redacted>"));
    assert!(!debug.contains(SECRET));
    assert!(!endpoint.to_string().contains(SECRET));
}

#[test]
fn test_parsed_specs_do_not_leak() {
    let config = RemoteConfig::default();
    let policies = PolicyTable::new();

    let connect = CommandLine::parse("ssh deploy@box -#p hunter2", &policies);
    let endpoint = parse_connect(&connect, &config).unwrap();
    assert!(!format!("{:?}", endpoint).contains(SECRET));
    assert!(!connect.masked().contains(SECRET));

    let copy = CommandLine::parse("scp box:/tmp/a a -#p hunter2", &policies);
    let spec = TransferSpec::parse(&copy, &config).unwrap();
    assert!(!format!("{:?}", spec).contains(SECRET));
}

#[test]
fn test_failed_connect_does_not_leak() {
    let mut rig = TestRig::with_host(MockHost {
        failing_attempts: 10,
        ..MockHost::default()
    });
    rig.script("login.txt", "ssh deploy@box -#p hunter2\n");

    assert!(!rig.line("run login.txt"));
    assert!(!rig.saw(SECRET));
}
