//! Arabic text normalization applied before every analysis.
//!
//! Output is stable under re-application: every substitution maps onto a
//! character that no rule touches again, and the result is recomposed after
//! marks are removed.

use unicode_normalization::UnicodeNormalization;

const TATWEEL: char = '\u{0640}';

/// Normalizes Arabic text for analysis and caching.
///
/// 1. Unicode NFKC (folds presentation forms and ligatures).
/// 2. Strips harakat, Quranic marks and tatweel.
/// 3. Unifies letter variants (alef forms, alef maksura, hamza carriers,
///    ta marbuta, Persian kaf/yeh).
/// 4. Maps Arabic-Indic digits to ASCII.
/// 5. Recomposes (NFKC again) and collapses whitespace.
pub fn normalize_arabic(text: &str) -> String {
    // A stripped mark can leave two combinable characters side by side.
    let unified: String = text
        .nfkc()
        .filter(|&c| !is_diacritic(c) && c != TATWEEL)
        .map(unify_char)
        .nfkc()
        .collect();

    unified.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Share of alphabetic characters that belong to the Arabic blocks.
/// Returns 0.0 when the text has no alphabetic characters.
pub fn arabic_ratio(text: &str) -> f64 {
    let (arabic, total) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(a, t), c| {
            (a + usize::from(is_arabic_letter(c)), t + 1)
        });
    if total == 0 {
        return 0.0;
    }
    arabic as f64 / total as f64
}

pub(crate) fn is_arabic_letter(c: char) -> bool {
    matches!(c,
        '\u{0600}'..='\u{06FF}'
        | '\u{0750}'..='\u{077F}'
        | '\u{08A0}'..='\u{08FF}'
        | '\u{FB50}'..='\u{FDFF}'
        | '\u{FE70}'..='\u{FEFF}')
}

fn is_diacritic(c: char) -> bool {
    matches!(c,
        '\u{0610}'..='\u{061A}'
        | '\u{064B}'..='\u{065F}'
        | '\u{0670}'
        | '\u{06D6}'..='\u{06ED}')
}

fn unify_char(c: char) -> char {
    match c {
        // alef with madda / hamza above / hamza below / wasla
        '\u{0622}' | '\u{0623}' | '\u{0625}' | '\u{0671}' => '\u{0627}',
        // alef maksura, yeh with hamza, farsi yeh
        '\u{0649}' | '\u{0626}' | '\u{06CC}' => '\u{064A}',
        // waw with hamza
        '\u{0624}' => '\u{0648}',
        // ta marbuta
        '\u{0629}' => '\u{0647}',
        // keheh
        '\u{06A9}' => '\u{0643}',
        '\u{0660}'..='\u{0669}' => digit_from(c, '\u{0660}'),
        '\u{06F0}'..='\u{06F9}' => digit_from(c, '\u{06F0}'),
        other => other,
    }
}

fn digit_from(c: char, zero: char) -> char {
    let offset = c as u32 - zero as u32;
    char::from_digit(offset, 10).unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unifies_alef_forms() {
        assert_eq!(normalize_arabic("أحمد إبراهيم آمن ٱلله"), "احمد ابراهيم امن الله");
    }

    #[test]
    fn test_strips_diacritics_and_tatweel() {
        assert_eq!(normalize_arabic("مُمْتَاز"), "ممتاز");
        assert_eq!(normalize_arabic("جمـــيل"), "جميل");
    }

    #[test]
    fn test_unifies_yeh_teh_marbuta_and_hamza_carriers() {
        assert_eq!(normalize_arabic("مستشفى"), "مستشفي");
        assert_eq!(normalize_arabic("الخدمة"), "الخدمه");
        assert_eq!(normalize_arabic("مسؤول"), "مسوول");
        assert_eq!(normalize_arabic("رئيسي"), "رييسي");
    }

    #[test]
    fn test_maps_arabic_indic_digits() {
        assert_eq!(normalize_arabic("انتظرت ٣ ساعات و۵ دقائق"), "انتظرت 3 ساعات و5 دقايق");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize_arabic("  الخدمة \n\t  سيئة  "), "الخدمه سييه");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let samples = [
            "الخِدْمَةُ مُمْتَازَةٌ جِدًّا!!",
            "أنا مش عايز أستنى كده تاني",
            "وايد زين، شكراً لكم ٣ مرات",
            "Service was ok لكن التوصيل تأخر",
            "",
            "   ",
            "ﻻ",
            "A\u{0610}\u{0301}",
            "e\u{064E}\u{0301} ok",
        ];
        for sample in samples {
            let once = normalize_arabic(sample);
            assert_eq!(normalize_arabic(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn test_recomposes_after_stripping_marks() {
        // U+0610 sits between A and the acute accent and blocks composition
        assert_eq!(normalize_arabic("A\u{0610}\u{0301}"), "\u{00C1}");
    }

    #[test]
    fn test_presentation_forms_are_folded() {
        // U+FEFB is the lam-alef ligature
        assert_eq!(normalize_arabic("\u{FEFB}"), "لا");
    }

    #[test]
    fn test_latin_text_passes_through() {
        assert_eq!(normalize_arabic("Great   service"), "Great service");
    }

    #[test]
    fn test_arabic_ratio() {
        assert_eq!(arabic_ratio("خدمة ممتازة"), 1.0);
        assert_eq!(arabic_ratio("great"), 0.0);
        assert_eq!(arabic_ratio("123 !!"), 0.0);
        let mixed = arabic_ratio("ok جيد");
        assert!((mixed - 0.6).abs() < 1e-9, "ratio was {mixed}");
    }
}
