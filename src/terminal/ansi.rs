//! Control-sequence stripping for remote output
//!
//! Remote shells decorate their output with colour codes, window-title
//! updates and cursor movement. The session engine only wants the text.

const ESC: char = '\x1b';
const BEL: char = '\x07';

/// Remove escape sequences and control characters
///
/// Keeps printable characters plus `\n`, `\r` and `\t`. Handles CSI
/// (`ESC [ ... final`), OSC (`ESC ] ... BEL` or `ESC ] ... ESC \`),
/// charset designations (`ESC ( B`) and two-character escapes.
pub fn strip_control_sequences(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != ESC {
            if !ch.is_control() || matches!(ch, '\n' | '\r' | '\t') {
                result.push(ch);
            }
            continue;
        }

        match chars.next() {
            Some('[') => {
                // Parameters and intermediates, then one final byte in @..~
                while let Some(c) = chars.next() {
                    if ('@'..='~').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                while let Some(c) = chars.next() {
                    if c == BEL {
                        break;
                    }
                    if c == ESC {
                        if chars.peek() == Some(&'\\') {
                            chars.next();
                        }
                        break;
                    }
                }
            }
            Some('(') | Some(')') | Some('*') | Some('+') => {
                chars.next();
            }
            _ => {}
        }
    }

    result
}
