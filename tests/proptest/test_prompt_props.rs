//! Property-based tests for output classification

use proptest::prelude::*;
use shellrunner::remote::{is_password_cue, is_prompt_line, prompt_location};
use shellrunner::terminal::strip_control_sequences;

proptest! {
    #[test]
    fn test_prompts_are_recognised(
        user in "[a-z][a-z0-9]{0,7}",
        host in "[a-z][a-z0-9-]{0,10}",
        dir in "(~|/[a-z/]{0,12})",
        terminator in "[$#]",
    ) {
        let line = format!("{}@{}:{}{}", user, host, dir, terminator);
        prop_assert!(is_prompt_line(&line, &user, "root"));
        prop_assert_eq!(prompt_location(&line), format!("{}@{}:{}", user, host, dir));
    }

    #[test]
    fn test_prompt_pieces_in_any_order(
        pieces in ("[a-z][a-z0-9]{0,7}", "[a-z0-9 ~/$#]{0,8}", "[a-z0-9 ~/$#]{0,8}")
            .prop_flat_map(|(user, a, b)| {
                let parts = vec![user.clone(), "@".to_string(), ":".to_string(), a, b];
                (Just(user), Just(parts).prop_shuffle())
            }),
    ) {
        let (user, parts) = pieces;
        let line = parts.concat();
        prop_assert!(is_prompt_line(&line, &user, "root"));

        let without_at: String = parts.iter().filter(|p| p.as_str() != "@").cloned().collect();
        prop_assert!(!is_prompt_line(&without_at, &user, "root"));
        let without_colon: String = parts.iter().filter(|p| p.as_str() != ":").cloned().collect();
        prop_assert!(!is_prompt_line(&without_colon, &user, "root"));
    }

    #[test]
    fn test_lines_without_at_are_never_prompts(line in "[^@]{0,40}") {
        prop_assert!(!is_prompt_line(&line, "deploy", "root"));
    }

    #[test]
    fn test_cue_requires_trailing_colon(text in "[a-zA-Z ]{0,20}") {
        let line = format!("{} password for someone", text);
        prop_assert!(!is_password_cue(&line, "password"));
        let asked = format!("{}:", line);
        prop_assert!(is_password_cue(&asked, "password"));
    }

    #[test]
    fn test_colored_text_strips_to_plain(text in "[a-zA-Z0-9 ]{0,40}", color in 30u8..38u8) {
        let input = format!("\x1b[{}m{}\x1b[0m", color, text);
        prop_assert_eq!(strip_control_sequences(&input), text);
    }

    #[test]
    fn test_stripping_never_grows(s in "\\PC*") {
        prop_assert!(strip_control_sequences(&s).len() <= s.len());
    }
}
