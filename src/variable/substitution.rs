//! Variable substitution
//!
//! Three reference forms are resolved per token, in this order:
//!
//! 1. a token equal to a declared `-@key` is replaced by its value (not on
//!    `var`, `rmvar`, `required` and `unrequired` lines, which name keys),
//! 2. `-@var(NAME)` call references, possibly embedded in a token,
//! 3. `{NAME}` placeholders; a leading `$` on the token is dropped when at
//!    least one placeholder resolved.
//!
//! Unknown references are left as written.

use super::{lookup, VariableStore};
use crate::command::{CommandLine, CommandType, VARIABLE_MARKER};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Prefix that marks a token containing placeholders
pub const BRACE_MARKER: char = '$';

static CALL_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-@var\(([^()\s]+)\)").expect("call reference pattern"));

static BRACE_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z0-9_\-@.]+)\}").expect("brace reference pattern"));

/// Resolve references in every token of a line
///
/// Tokens are rewritten in place; the whitespace between them is kept as
/// typed. Callers parse the result again to pick up new token boundaries.
pub fn substitute_line(line: &CommandLine, layers: &[&VariableStore]) -> String {
    let rewrite_keys = !matches!(
        line.command_type,
        CommandType::DeclareVariable
            | CommandType::RemoveVariable
            | CommandType::RequireVariable
            | CommandType::UnrequireVariable
    );
    let tokens = line.parts.iter().flat_map(|part| {
        part.tokens
            .iter()
            .enumerate()
            .map(move |(position, token)| (part, position, token))
    });

    let raw = line.raw.as_str();
    let mut out = String::with_capacity(raw.len());
    let mut cursor = 0;
    for ((start, end), (part, position, token)) in token_spans(raw).into_iter().zip(tokens) {
        out.push_str(&raw[cursor..start]);
        let is_key = part.key.is_some() && position == 0;
        let resolved = if rewrite_keys && part.index > 0 && !is_key {
            rewrite_declared_key(token, layers)
        } else {
            token.clone()
        };
        out.push_str(&substitute_token(&resolved, layers));
        cursor = end;
    }
    out.push_str(&raw[cursor..]);
    out
}

/// Byte ranges of the whitespace-separated tokens of `text`
fn token_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

fn rewrite_declared_key(token: &str, layers: &[&VariableStore]) -> String {
    if !token.starts_with(VARIABLE_MARKER) {
        return token.to_string();
    }
    match lookup(token, layers) {
        Some(value) => value.to_string(),
        None => token.to_string(),
    }
}

/// Resolve call references and placeholders inside one token
pub fn substitute_token(token: &str, layers: &[&VariableStore]) -> String {
    let called = CALL_REFERENCE.replace_all(token, |caps: &Captures| {
        match lookup(&caps[1], layers) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        }
    });

    let mut resolved = 0;
    let braced = BRACE_REFERENCE.replace_all(&called, |caps: &Captures| {
        match lookup(&caps[1], layers) {
            Some(value) => {
                resolved += 1;
                value.to_string()
            }
            None => caps[0].to_string(),
        }
    });

    match braced.strip_prefix(BRACE_MARKER) {
        Some(rest) if resolved > 0 => rest.to_string(),
        _ => braced.into_owned(),
    }
}
