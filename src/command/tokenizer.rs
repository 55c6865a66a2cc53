//! Command-line tokenizer
//!
//! Splits a line on whitespace and groups the tokens into parts according to
//! the capture policy of the line's command type.

use super::types::{CapturePolicy, CommandType, PolicyTable};
use super::CommandPart;

/// Split a line into parts
///
/// Part 0 is always the command name. Returns an empty list for a blank line.
pub fn tokenize(text: &str, policies: &PolicyTable) -> Vec<CommandPart> {
    let mut tokens = text.split_whitespace();
    let Some(name) = tokens.next() else {
        return Vec::new();
    };

    let policy = policies.policy(CommandType::from_keyword(name));
    let mut parts = vec![CommandPart::from_tokens(0, vec![name.to_string()])];
    group_arguments(tokens, policy, &mut parts);
    parts
}

fn group_arguments<'a>(
    tokens: impl Iterator<Item = &'a str>,
    policy: CapturePolicy,
    parts: &mut Vec<CommandPart>,
) {
    let mut current: Vec<String> = Vec::new();
    let mut skipped = 0;

    for token in tokens {
        if skipped < policy.skip {
            flush(&mut current, parts);
            parts.push(CommandPart::from_tokens(parts.len(), vec![token.to_string()]));
            skipped += 1;
            continue;
        }

        if token.starts_with('-') || current.is_empty() {
            flush(&mut current, parts);
            current.push(token.to_string());
            continue;
        }

        let open = current.len() == 1 || policy.rule.keeps_capturing();
        if open && policy.rule.accepts_value(&current[0]) {
            current.push(token.to_string());
        } else {
            flush(&mut current, parts);
            current.push(token.to_string());
        }
    }

    flush(&mut current, parts);
}

fn flush(current: &mut Vec<String>, parts: &mut Vec<CommandPart>) {
    if current.is_empty() {
        return;
    }
    let tokens = std::mem::take(current);
    parts.push(CommandPart::from_tokens(parts.len(), tokens));
}
