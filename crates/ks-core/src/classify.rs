//! Character-level classification of the text preceding the cursor.
//!
//! A character counts as Chinese when it belongs to one of three Unicode
//! blocks: CJK Unified Ideographs, CJK Symbols and Punctuation, and
//! Halfwidth and Fullwidth Forms. Everything else, including ASCII letters,
//! digits and punctuation, counts as English.

use crate::InputState;

/// CJK Unified Ideographs (U+4E00..U+9FFF).
pub fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// CJK Symbols and Punctuation (U+3000..U+303F): ideographic space, 。、「」 etc.
pub fn is_cjk_punctuation(c: char) -> bool {
    ('\u{3000}'..='\u{303F}').contains(&c)
}

/// Halfwidth and Fullwidth Forms (U+FF00..U+FFEF): ，！？ and fullwidth Latin.
pub fn is_fullwidth_form(c: char) -> bool {
    ('\u{FF00}'..='\u{FFEF}').contains(&c)
}

pub fn is_chinese(c: char) -> bool {
    is_cjk_ideograph(c) || is_cjk_punctuation(c) || is_fullwidth_form(c)
}

pub fn classify_char(c: char) -> InputState {
    if is_chinese(c) {
        InputState::Chinese
    } else {
        InputState::English
    }
}

/// Classify the last character of `text`, or `None` when it is empty.
pub fn classify_last(text: &str) -> Option<InputState> {
    text.chars().next_back().map(classify_char)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_char_classification() {
        assert_eq!(classify_char('汉'), InputState::Chinese);
        assert_eq!(classify_char('。'), InputState::Chinese);
        assert_eq!(classify_char('，'), InputState::Chinese);
        assert_eq!(classify_char('Ａ'), InputState::Chinese);
        assert_eq!(classify_char('a'), InputState::English);
        assert_eq!(classify_char('7'), InputState::English);
        assert_eq!(classify_char(';'), InputState::English);
        assert_eq!(classify_char(' '), InputState::English);
        // Outside the three blocks even though it is CJK-adjacent.
        assert_eq!(classify_char('あ'), InputState::English);
        assert_eq!(classify_char('\u{3400}'), InputState::English);
    }

    #[test]
    fn test_block_edges() {
        for c in ['\u{4E00}', '\u{9FFF}', '\u{3000}', '\u{303F}', '\u{FF00}', '\u{FFEF}'] {
            assert!(is_chinese(c), "{:?} should be Chinese", c);
        }
        for c in ['\u{4DFF}', '\u{A000}', '\u{2FFF}', '\u{3040}', '\u{FEFF}', '\u{FFF0}'] {
            assert!(!is_chinese(c), "{:?} should be English", c);
        }
    }

    #[test]
    fn test_classify_last() {
        assert_eq!(classify_last(""), None);
        assert_eq!(classify_last("let x = 中"), Some(InputState::Chinese));
        assert_eq!(classify_last("注释a"), Some(InputState::English));
    }

    fn chinese_block_char() -> impl Strategy<Value = char> {
        prop_oneof![
            (0x4E00u32..=0x9FFF).prop_map(|u| char::from_u32(u).unwrap()),
            (0x3000u32..=0x303F).prop_map(|u| char::from_u32(u).unwrap()),
            (0xFF00u32..=0xFFEF).prop_map(|u| char::from_u32(u).unwrap()),
        ]
    }

    proptest! {
        #[test]
        fn chinese_blocks_classify_chinese(c in chinese_block_char()) {
            prop_assert_eq!(classify_char(c), InputState::Chinese);
        }

        #[test]
        fn ascii_alphanumerics_classify_english(c in "[a-zA-Z0-9]") {
            let c = c.chars().next().unwrap();
            prop_assert_eq!(classify_char(c), InputState::English);
        }
    }
}
