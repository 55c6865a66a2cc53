//! Prompt and password-cue classification
//!
//! Pure functions over one cleaned output line.

/// Whether a line is the remote shell prompt
///
/// A prompt names the session user or the superuser and contains both `@`
/// and `:`, as in `deploy@box:~$`.
pub fn is_prompt_line(line: &str, user: &str, superuser: &str) -> bool {
    let names_user = (!user.is_empty() && line.contains(user))
        || (!superuser.is_empty() && line.contains(superuser));
    names_user && line.contains('@') && line.contains(':')
}

/// Whether unterminated output ends the way a shell prompt does
///
/// Used on the tail of a chunk, which may still be cut mid-prompt.
pub fn ends_like_prompt(text: &str) -> bool {
    text.trim_end().ends_with(['$', '#', '>', '%'])
}

/// Location recorded from a prompt line
///
/// Trailing spaces and the `#`/`$` terminator are removed.
pub fn prompt_location(line: &str) -> String {
    line.trim()
        .trim_end_matches([' ', '#', '$'])
        .to_string()
}

/// Whether a line asks for a password
///
/// Matches `cue` case-insensitively in a line that ends with `:`, such as
/// `[sudo] password for deploy:` or `deploy@box's password:`.
pub fn is_password_cue(line: &str, cue: &str) -> bool {
    let line = line.trim();
    line.ends_with(':') && line.to_lowercase().contains(&cue.to_lowercase())
}
