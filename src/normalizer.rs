use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

fn digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("valid digit pattern"))
}

fn spaces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" {2,}").expect("valid space pattern"))
}

fn symbols_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("valid symbol pattern"))
}

/// Normalize a free-text label so that spelling variants group together.
///
/// Digits are deleted, repeated spaces collapsed, the text lower-cased,
/// punctuation stripped, and accented characters reduced to their ASCII
/// base letter (anything without one is dropped). The output is always
/// lower-case ASCII with no digits or punctuation, and applying the
/// function twice gives the same result as applying it once.
pub fn normalize(text: &str) -> String {
    let text = digits_re().replace_all(text, "");
    let text = spaces_re().replace_all(&text, " ").to_lowercase();
    let text = symbols_re().replace_all(&text, "");
    let ascii: String = text.nfkd().filter(char::is_ascii).collect();

    // Decomposition and symbol removal can leave behind upper-case letters,
    // digits or fresh double spaces.
    let tidy: String = ascii
        .chars()
        .filter(|&c| !c.is_ascii_digit() && (c == '_' || !c.is_ascii_punctuation()))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    spaces_re().replace_all(&tidy, " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_digits_accents_and_case() {
        assert_eq!(normalize("Café123  ROOM"), "cafe room");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_normalize_removes_punctuation() {
        assert_eq!(normalize("Cardiology/Heart-Care."), "cardiologyheartcare");
        assert_eq!(normalize("Dr. O'Neil's (clinic)"), "dr oneils clinic");
    }

    #[test]
    fn test_normalize_digit_runs_are_deleted_not_replaced() {
        assert_eq!(normalize("ab12cd"), "abcd");
        assert_eq!(normalize("123"), "");
    }

    #[test]
    fn test_normalize_collapses_spaces_left_by_removals() {
        assert_eq!(normalize("room 12 b"), "room b");
        assert_eq!(normalize("a ! b"), "a b");
        assert_eq!(normalize("a\u{00a0} b"), "a b");
    }

    #[test]
    fn test_normalize_drops_non_latin_symbols() {
        assert_eq!(normalize("Résumé ✓ naïve"), "resume naive");
        assert_eq!(normalize("Øresund"), "resund");
        assert_eq!(normalize("ﬁle"), "file");
    }

    #[test]
    fn test_normalize_keeps_underscore_and_tabs() {
        assert_eq!(normalize("ICU_Unit\tB"), "icu_unit\tb");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Café123  ROOM",
            "  GENERAL   Practice ",
            "a ! b",
            "Ⅻ century",
            "x² + y³",
            "Ｆｕｌｌ１２ｗｉｄｔｈ",
            "ANESTHESIOLOGY - PAIN MEDICINE",
            "\u{2003}em\u{2003}\u{2003}space",
            "",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_normalize_output_is_ascii_lowercase_digit_free() {
        for s in ["Ünïcödé 42 Tëxt!", "ÀÉÎÕÜ", "Pédiatrie/2019"] {
            let out = normalize(s);
            assert!(out.is_ascii());
            assert!(!out.chars().any(|c| c.is_ascii_digit()));
            assert!(!out.chars().any(|c| c.is_ascii_uppercase()));
            assert!(!out.chars().any(|c| c.is_ascii_punctuation() && c != '_'));
        }
    }
}
