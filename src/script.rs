//! Odia character classes.
//!
//! Everything in the pipeline that asks "is this target-script text?" goes
//! through this module, and the regex fragments exported here keep the
//! pattern rules and the analyzer on the same definitions.

use whatlang::detect_script;

pub const VIRAMA: char = '\u{0B4D}';
pub const DANDA: char = '\u{0964}';
pub const DOUBLE_DANDA: char = '\u{0965}';

/// Native numerals, indexed by the ASCII digit they replace.
pub const NATIVE_DIGITS: [char; 10] = ['୦', '୧', '୨', '୩', '୪', '୫', '୬', '୭', '୮', '୯'];

/// Independent vowels and consonants.
pub(crate) const BASE_CLASS: &str = r"[\x{0B05}-\x{0B39}\x{0B5C}\x{0B5D}\x{0B5F}-\x{0B61}\x{0B71}]";
/// Dependent vowel signs, including the length marks.
pub(crate) const SIGN_CLASS: &str = r"[\x{0B3E}-\x{0B4C}\x{0B56}\x{0B57}\x{0B62}\x{0B63}]";
/// Whitespace that does not break a line.
pub(crate) const HSPACE: &str = r"[^\S\r\n]";
/// Currency, math and typographic symbols that OCR emits for smudged glyphs.
pub(crate) const SYMBOL_CLASS: &str = "[€©™®†‡§¶•‰‱′″‴‵‶‷‸‹›‼‽⁇⁈⁉⁎⁏⁐⁑⁒⁓⁔⁕⁖⁗⁘⁙⁚⁛⁜⁝⁞×÷±∞∝∠∡∢∣∤∥∦∧∨∩∪∫∬∭∮∯∰∱∲∳¢£¤¥₹₨₩₪₫₯₰₱₲₳₴₵₶₷₸₺]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Consonant,
    IndependentVowel,
    VowelSign,
    Virama,
    Digit,
    OtherOdia,
    Other,
}

#[inline]
pub fn is_odia(c: char) -> bool {
    ('\u{0B00}'..='\u{0B7F}').contains(&c)
}

#[inline]
pub fn is_consonant(c: char) -> bool {
    matches!(c, '\u{0B15}'..='\u{0B39}' | '\u{0B5C}' | '\u{0B5D}' | '\u{0B5F}' | '\u{0B71}')
}

#[inline]
pub fn is_independent_vowel(c: char) -> bool {
    matches!(c, '\u{0B05}'..='\u{0B14}' | '\u{0B60}' | '\u{0B61}')
}

/// Independent letter: consonant or independent vowel.
#[inline]
pub fn is_base_char(c: char) -> bool {
    is_consonant(c) || is_independent_vowel(c)
}

#[inline]
pub fn is_vowel_sign(c: char) -> bool {
    matches!(c, '\u{0B3E}'..='\u{0B4C}' | '\u{0B56}' | '\u{0B57}' | '\u{0B62}' | '\u{0B63}')
}

#[inline]
pub fn is_native_digit(c: char) -> bool {
    ('\u{0B66}'..='\u{0B6F}').contains(&c)
}

#[inline]
pub fn is_target_punctuation(c: char) -> bool {
    c == DANDA || c == DOUBLE_DANDA
}

/// Characters that can sit inside an Odia word: letters, marks and the
/// zero-width joiners used to force or suppress conjuncts.
#[inline]
pub fn is_word_char(c: char) -> bool {
    matches!(c, '\u{0B01}'..='\u{0B63}' | '\u{0B71}' | '\u{200C}' | '\u{200D}')
}

/// Whitespace other than a line break; the character form of [`HSPACE`].
#[inline]
pub fn is_horizontal_space(c: char) -> bool {
    c.is_whitespace() && c != '\n' && c != '\r'
}

/// Whether two characters separated by whitespace belong to one broken word.
#[inline]
pub fn is_joinable(left: char, right: char) -> bool {
    (is_base_char(left) && (is_base_char(right) || is_vowel_sign(right)))
        || (is_vowel_sign(left) && is_base_char(right))
}

/// Characters the analyzer accepts as expected output.
pub fn is_recognized(c: char) -> bool {
    is_odia(c)
        || is_target_punctuation(c)
        || c.is_whitespace()
        || matches!(c, '.' | ',' | ';' | ':' | '!' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '\'' | '-')
}

pub fn classify(c: char) -> CharClass {
    if is_consonant(c) {
        CharClass::Consonant
    } else if is_independent_vowel(c) {
        CharClass::IndependentVowel
    } else if is_vowel_sign(c) {
        CharClass::VowelSign
    } else if c == VIRAMA {
        CharClass::Virama
    } else if is_native_digit(c) {
        CharClass::Digit
    } else if is_odia(c) {
        CharClass::OtherOdia
    } else {
        CharClass::Other
    }
}

/// Native numeral for an ASCII digit.
#[inline]
pub fn native_digit(c: char) -> Option<char> {
    c.is_ascii_digit().then(|| NATIVE_DIGITS[usize::from(c as u8 - b'0')])
}

/// Replace every ASCII digit with its native numeral, leaving other characters alone.
pub fn to_native_digits(text: &str) -> String {
    text.chars().map(|c| native_digit(c).unwrap_or(c)).collect()
}

/// Number of Odia characters and total characters in `text`.
pub fn odia_counts(text: &str) -> (usize, usize) {
    text.chars()
        .fold((0, 0), |(odia, total), c| (odia + usize::from(is_odia(c)), total + 1))
}

/// Share of Odia characters, `None` for empty text.
pub fn odia_ratio(text: &str) -> Option<f64> {
    let (odia, total) = odia_counts(text);
    if total == 0 {
        None
    } else {
        Some(odia as f64 / total as f64)
    }
}

/// Name of the script whatlang considers dominant in `text`.
pub fn dominant_script(text: &str) -> Option<String> {
    detect_script(text).map(|script| script.name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_mapping_is_bijective() {
        let mapped: Vec<char> = ('0'..='9').filter_map(native_digit).collect();
        assert_eq!(mapped.len(), 10);
        let mut unique = mapped.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 10);
        assert!(mapped.iter().all(|&c| is_native_digit(c)));
        assert_eq!(to_native_digits("123"), "୧୨୩");
    }

    #[test]
    fn test_non_ascii_digits_are_not_mapped() {
        // Bengali one is a decimal digit but not ASCII
        assert_eq!(native_digit('১'), None);
        assert_eq!(native_digit('x'), None);
    }

    #[test]
    fn test_classes() {
        assert!(is_consonant('କ'));
        assert!(is_independent_vowel('ଅ'));
        assert!(is_vowel_sign('ି'));
        assert!(!is_vowel_sign(VIRAMA));
        assert!(is_base_char('ୟ'));
        assert_eq!(classify('୍'), CharClass::Virama);
        assert_eq!(classify('୫'), CharClass::Digit);
        assert_eq!(classify('a'), CharClass::Other);
    }

    #[test]
    fn test_joinable_pairs() {
        assert!(is_joinable('ଭ', 'ି'));
        assert!(is_joinable('ି', 'ଷ'));
        assert!(is_joinable('ଷ', 'ପ'));
        assert!(!is_joinable('ି', 'ା'));
        assert!(!is_joinable(VIRAMA, 'କ'));
    }

    #[test]
    fn test_ratio() {
        assert_eq!(odia_ratio(""), None);
        assert_eq!(odia_ratio("କa"), Some(0.5));
        assert_eq!(odia_counts("ରୋଗ x"), (3, 5));
    }
}
