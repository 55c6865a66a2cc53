//! Unit Tests: Tokenizer and Capture Policies

use shellrunner::command::{CapturePolicy, CaptureRule, PartKind, PolicyTable};
use shellrunner::{CommandLine, CommandType};
use std::collections::HashMap;

fn parse(text: &str) -> CommandLine {
    CommandLine::parse(text, &PolicyTable::new())
}

fn groups(line: &CommandLine) -> Vec<Vec<&str>> {
    line.parts
        .iter()
        .map(|p| p.tokens.iter().map(String::as_str).collect())
        .collect()
}

#[test]
fn test_keywords_are_case_insensitive() {
    assert_eq!(parse("SSH box").command_type, CommandType::Connect);
    assert_eq!(parse("#run a.txt").command_type, CommandType::Run);
    assert_eq!(parse("Cls").command_type, CommandType::Clear);
    assert_eq!(parse("clear").command_type, CommandType::Clear);
    assert_eq!(parse("git status").command_type, CommandType::None);
}

#[test]
fn test_passthrough_groups_dashed_keys() {
    let line = parse("grep -i pattern file.txt");
    assert_eq!(
        groups(&line),
        vec![vec!["grep"], vec!["-i", "pattern"], vec!["file.txt"]]
    );
}

#[test]
fn test_var_captures_everything_after_key() {
    let line = parse("var -@greeting hello there world -@n 1");
    assert_eq!(
        groups(&line),
        vec![
            vec!["var"],
            vec!["-@greeting", "hello", "there", "world"],
            vec!["-@n", "1"],
        ]
    );
    assert_eq!(line.arguments()[0].value, "hello there world");
}

#[test]
fn test_connect_skips_host() {
    let line = parse("ssh -weird-host -#p secret -p 22");
    assert_eq!(
        groups(&line),
        vec![
            vec!["ssh"],
            vec!["-weird-host"],
            vec!["-#p", "secret"],
            vec!["-p", "22"],
        ]
    );
    assert_eq!(line.arguments()[0].kind(), PartKind::Positional);
}

#[test]
fn test_marked_keys_do_not_capture_on_transfer() {
    let line = parse("scp a.txt -@flag b:/c");
    assert_eq!(
        groups(&line),
        vec![vec!["scp"], vec!["a.txt"], vec!["-@flag"], vec!["b:/c"]]
    );
}

#[test]
fn test_single_policy_never_groups() {
    let line = parse("ifexist -a b c");
    assert_eq!(
        groups(&line),
        vec![vec!["ifexist"], vec!["-a"], vec!["b"], vec!["c"]]
    );
}

#[test]
fn test_override_from_config() {
    let mut overrides = HashMap::new();
    overrides.insert(
        "ifexist".to_string(),
        CapturePolicy::new(CaptureRule::ValueMustStartWithDash, 0),
    );
    overrides.insert(
        "passthrough".to_string(),
        CapturePolicy::new(CaptureRule::AlwaysSingle, 0),
    );
    let table = PolicyTable::with_overrides(&overrides);

    let line = CommandLine::parse("ifexist -a b c", &table);
    assert_eq!(groups(&line), vec![vec!["ifexist"], vec!["-a", "b"], vec!["c"]]);

    let line = CommandLine::parse("grep -i x", &table);
    assert_eq!(groups(&line), vec![vec!["grep"], vec!["-i"], vec!["x"]]);
}

#[test]
fn test_whitespace_is_collapsed() {
    let line = parse("   echo\t a    b  ");
    assert_eq!(line.raw, "echo\t a    b");
    assert_eq!(groups(&line), vec![vec!["echo"], vec!["a"], vec!["b"]]);
}
