//! Property-based tests for variable substitution

use proptest::prelude::*;
use shellrunner::command::PolicyTable;
use shellrunner::variable::{substitute_line, substitute_token};
use shellrunner::{CommandLine, VariableStore};

/// Plain words and references to the declared names `a`, `b` and `c`
fn word() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9./]{1,8}",
        "[abc]".prop_map(|n| format!("{{{}}}", n)),
        "[abc]".prop_map(|n| format!("${{{}}}", n)),
        "[abc]".prop_map(|n| format!("-@var({})", n)),
        "[abc]".prop_map(|n| format!("-@{}", n)),
    ]
}

fn declared(values: &[String]) -> VariableStore {
    let mut vars = VariableStore::new();
    for (name, value) in ["a", "b", "c"].iter().zip(values) {
        vars.declare(name, value);
    }
    vars
}

proptest! {
    #[test]
    fn test_plain_tokens_unchanged(token in "[a-zA-Z0-9_./:=]{0,30}") {
        let mut vars = VariableStore::new();
        vars.declare("-@x", "value");
        prop_assert_eq!(substitute_token(&token, &[&vars]), token);
    }

    #[test]
    fn test_brace_reference_resolves(
        name in "[a-z][a-z0-9_]{0,8}",
        value in "[a-zA-Z0-9/]{0,12}",
        prefix in "[a-z]{0,4}",
        suffix in "[a-z]{0,4}",
    ) {
        let mut vars = VariableStore::new();
        vars.declare(&name, &value);
        let token = format!("{}{{{}}}{}", prefix, name, suffix);
        prop_assert_eq!(
            substitute_token(&token, &[&vars]),
            format!("{}{}{}", prefix, value, suffix)
        );
    }

    #[test]
    fn test_call_reference_resolves(
        name in "[a-z][a-z0-9_]{0,8}",
        value in "[a-zA-Z0-9]{1,12}",
    ) {
        let mut vars = VariableStore::new();
        vars.declare(&name, &value);
        let token = format!("-@var({})/tail", name);
        prop_assert_eq!(substitute_token(&token, &[&vars]), format!("{}/tail", value));
    }

    #[test]
    fn test_unknown_references_unchanged(name in "[a-z][a-z0-9_]{0,8}") {
        let vars = VariableStore::new();
        let braced = format!("${{{}}}", name);
        let called = format!("-@var({})", name);
        prop_assert_eq!(substitute_token(&braced, &[&vars]), braced);
        prop_assert_eq!(substitute_token(&called, &[&vars]), called);
    }

    #[test]
    fn test_line_substitution_is_idempotent(
        words in prop::collection::vec(word(), 1..10),
        values in prop::collection::vec("[a-z0-9/]{1,6}( [a-z0-9]{1,4})?", 3),
        gap in "[ \t]{1,4}",
    ) {
        let vars = declared(&values);
        let text = format!("cmd{}{}", gap, words.join(gap.as_str()));
        let once = substitute_line(&CommandLine::parse(&text, &PolicyTable::new()), &[&vars]);
        let twice = substitute_line(&CommandLine::parse(&once, &PolicyTable::new()), &[&vars]);
        prop_assert_eq!(&once, &twice);
        let prefix = format!("cmd{}", gap);
        prop_assert!(once.starts_with(&prefix));
    }

    #[test]
    fn test_declare_then_remove_keeps_membership(
        existing in prop::collection::vec(("[a-z]{1,6}", "[a-z0-9]{0,6}"), 0..8),
        key in "[a-z]{1,6}",
        value in "[a-z0-9]{0,6}",
    ) {
        let mut vars = VariableStore::new();
        for (k, v) in &existing {
            vars.declare(k, v);
        }
        prop_assume!(vars.get(&key).is_none());
        let before: Vec<String> = vars.iter().map(|(k, _)| k.to_string()).collect();

        vars.declare(&key, &value);
        let marked = format!("-@{}", key);
        prop_assert!(vars.remove(&marked).is_some());

        let after: Vec<String> = vars.iter().map(|(k, _)| k.to_string()).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn test_substitution_never_panics(token in "\\PC*") {
        let mut vars = VariableStore::new();
        vars.declare("-@a", "b");
        let _ = substitute_token(&token, &[&vars]);
    }
}
