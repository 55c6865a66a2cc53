//! Property-based tests for the tokenizer
//!
//! Grouping must never lose, reorder or invent tokens.

use proptest::prelude::*;
use shellrunner::command::{CaptureRule, CapturePolicy, PolicyTable};
use shellrunner::CommandLine;
use std::collections::HashMap;

fn rule() -> impl Strategy<Value = CaptureRule> {
    prop_oneof![
        Just(CaptureRule::AlwaysCapture),
        Just(CaptureRule::AlwaysSingle),
        Just(CaptureRule::ValueMustStartWithDash),
        Just(CaptureRule::ValueMustNotStartWithDash),
        Just(CaptureRule::ValueDashButNotMarked),
        Just(CaptureRule::ValueIsMarked),
        Just(CaptureRule::ValueNotMarked),
    ]
}

/// Rules that never group a value under a key without a leading dash
fn non_capturing_rule() -> impl Strategy<Value = CaptureRule> {
    prop_oneof![
        Just(CaptureRule::AlwaysSingle),
        Just(CaptureRule::ValueMustStartWithDash),
        Just(CaptureRule::ValueDashButNotMarked),
        Just(CaptureRule::ValueIsMarked),
    ]
}

fn token() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9./]{1,8}",
        "-[a-z]{1,4}",
        "-@[a-z]{1,4}",
        "-#[a-z]{1,2}",
    ]
}

proptest! {
    #[test]
    fn test_tokens_survive_grouping(
        tokens in prop::collection::vec(token(), 0..12),
        rule in rule(),
        skip in 0usize..3,
    ) {
        let mut overrides = HashMap::new();
        overrides.insert("passthrough".to_string(), CapturePolicy::new(rule, skip));
        let table = PolicyTable::with_overrides(&overrides);

        let text = format!("cmd {}", tokens.join(" "));
        let line = CommandLine::parse(&text, &table);

        let flattened: Vec<String> = line
            .parts
            .iter()
            .flat_map(|p| p.tokens.iter().cloned())
            .collect();
        let mut expected = vec!["cmd".to_string()];
        expected.extend(tokens.iter().cloned());
        prop_assert_eq!(flattened, expected);
    }

    #[test]
    fn test_undashed_tokens_are_one_part_each(
        tokens in prop::collection::vec("[a-z0-9./]{1,8}", 0..12),
        rule in non_capturing_rule(),
        skip in 0usize..3,
    ) {
        let mut overrides = HashMap::new();
        overrides.insert("passthrough".to_string(), CapturePolicy::new(rule, skip));
        let table = PolicyTable::with_overrides(&overrides);

        let line = CommandLine::parse(&format!("cmd {}", tokens.join(" ")), &table);
        prop_assert_eq!(line.parts.len(), tokens.len() + 1);
    }

    #[test]
    fn test_undashed_keyword_lines_with_default_rules(
        keyword in prop::sample::select(vec!["run", "ifexist", "open", "rmvar", "ls"]),
        tokens in prop::collection::vec("[a-z0-9./]{1,8}", 0..12),
    ) {
        let line = CommandLine::parse(&format!("{} {}", keyword, tokens.join(" ")), &PolicyTable::new());
        prop_assert_eq!(line.parts.len(), tokens.len() + 1);
    }

    #[test]
    fn test_part_indices_are_sequential(text in "[a-z@#\\- ]{0,60}") {
        let line = CommandLine::parse(&text, &PolicyTable::new());
        for (i, part) in line.parts.iter().enumerate() {
            prop_assert_eq!(part.index, i);
            prop_assert!(!part.tokens.is_empty());
        }
    }

    #[test]
    fn test_keyed_parts_start_new_groups(tokens in prop::collection::vec(token(), 1..10)) {
        let text = format!("cmd {}", tokens.join(" "));
        let line = CommandLine::parse(&text, &PolicyTable::new());
        for part in line.arguments() {
            for later in part.tokens.iter().skip(1) {
                prop_assert!(!later.starts_with('-'));
            }
        }
    }

    #[test]
    fn test_parse_never_panics(text in "\\PC*") {
        let line = CommandLine::parse(&text, &PolicyTable::new());
        let _ = line.masked();
    }
}
