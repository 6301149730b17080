use unicode_normalization::UnicodeNormalization;

/// Whether `text` reads the same forwards and backwards.
///
/// The text is normalized to NFC first so that a base letter followed by a
/// combining mark compares as one character. Comparison is per code point:
/// multi-code-point grapheme clusters (ZWJ emoji sequences, skin tone
/// modifiers) are not kept together, and invisible characters such as
/// U+200B are compared like any other.
pub fn is_palindrome(text: &str) -> bool {
    let chars: Vec<char> = text.nfc().collect();
    chars.iter().eq(chars.iter().rev())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_simple_cases() {
        let cases = [
            ("", true),
            ("a", true),
            ("bb", true),
            ("bd", false),
            ("bbb", true),
            ("cabac", true),
            ("ducks", false),
            ("atttta", true),
        ];
        for (value, expected) in cases {
            assert_eq!(is_palindrome(value), expected, "value {:?}", value);
        }
    }

    #[test]
    fn test_combining_characters_are_composed() {
        // e + U+0301 twice is "éé" once composed
        assert!(is_palindrome("\u{0065}\u{0301}\u{0065}\u{0301}"));
        assert!(is_palindrome("\u{00e9}\u{0065}\u{0301}"));
    }

    #[test]
    fn test_zero_width_space_is_not_stripped() {
        assert!(!is_palindrome("mee\u{200B}m"));
        assert!(is_palindrome("me\u{200B}em"));
    }

    #[test]
    fn test_zwj_sequences_are_compared_per_code_point() {
        // man facepalming: U+1F926 U+1F3FC U+200D U+2642 U+FE0F
        assert!(!is_palindrome("\u{1F926}\u{1F3FC}\u{200D}\u{2642}\u{FE0F}"));
    }

    fn reversed(s: &str) -> String {
        s.chars().rev().collect()
    }

    proptest! {
        #[test]
        fn prop_mirrored_ascii_is_palindrome(s in "[a-zA-Z0-9 ]{0,256}") {
            let pal = format!("{}{}", s, reversed(&s));
            prop_assert!(is_palindrome(&pal));
        }

        #[test]
        fn prop_mirrored_nfc_text_is_palindrome(s in "\\PC{0,128}") {
            // Mirror the composed form and check that mirroring survives
            // renormalization; otherwise the input is not a palindrome under
            // NFC and is skipped.
            let half: String = s.nfc().collect();
            let pal = format!("{}{}", half, reversed(&half));
            let normalized: Vec<char> = pal.nfc().collect();
            prop_assume!(normalized.iter().eq(normalized.iter().rev()));
            prop_assert!(is_palindrome(&pal));
        }

        #[test]
        fn prop_matches_reference_definition(s in "\\PC{0,64}") {
            let normalized: String = s.nfc().collect();
            prop_assert_eq!(is_palindrome(&s), normalized == reversed(&normalized));
        }
    }
}
