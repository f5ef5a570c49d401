//! Dialect detection and complexity estimation.
//!
//! Both are cheap, deterministic heuristics feeding the model router. They
//! expect text that already went through `normalize_arabic`, so the marker
//! lists below are written in normalized form (no hamza carriers, ه for ة).

use serde::{Deserialize, Serialize};

use crate::text::normalize::arabic_ratio;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Modern Standard Arabic, or Arabic with no dialect markers.
    Msa,
    Gulf,
    Egyptian,
    Levantine,
    Maghrebi,
    NonArabic,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Msa => "msa",
            Dialect::Gulf => "gulf",
            Dialect::Egyptian => "egyptian",
            Dialect::Levantine => "levantine",
            Dialect::Maghrebi => "maghrebi",
            Dialect::NonArabic => "non_arabic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialectProfile {
    pub dialect: Dialect,
    /// 0.0 – 1.0
    pub confidence: f64,
    /// Marker hits for the winning dialect.
    pub hits: u32,
}

const GULF_MARKERS: &[&str] = &[
    "وايد", "شلون", "ابي", "ابغي", "ابغا", "الحين", "شنو", "مب", "هني", "زين",
];

const EGYPTIAN_MARKERS: &[&str] = &[
    "عايز", "عاوز", "ازاي", "كده", "اوي", "مش", "دلوقتي", "بتاع", "خالص", "النهارده", "امبارح",
];

const LEVANTINE_MARKERS: &[&str] = &[
    "كتير", "هيك", "بدي", "بدنا", "شو", "منيح", "هلق", "لسا", "مشان", "كتار",
];

const MAGHREBI_MARKERS: &[&str] = &[
    "بزاف", "واش", "كيفاش", "ديال", "مزيان", "دابا", "علاش", "شحال", "بصح", "راني",
];

/// Candidate order doubles as the tie-break order.
const CANDIDATES: [(Dialect, &[&str]); 4] = [
    (Dialect::Gulf, GULF_MARKERS),
    (Dialect::Egyptian, EGYPTIAN_MARKERS),
    (Dialect::Levantine, LEVANTINE_MARKERS),
    (Dialect::Maghrebi, MAGHREBI_MARKERS),
];

/// Below this share of Arabic letters the text is treated as non-Arabic.
const ARABIC_THRESHOLD: f64 = 0.5;

/// Detects the dominant Arabic dialect by whole-token marker counting.
///
/// A token also matches with a leading conjunction `و` removed. With no
/// marker hits, mostly-Arabic text is MSA at confidence 0.5 and anything else
/// is `NonArabic` at confidence 1.0.
pub fn detect_dialect(normalized: &str) -> DialectProfile {
    let tokens = tokenize(normalized);

    let counts: Vec<(Dialect, u32)> = CANDIDATES
        .iter()
        .map(|(dialect, markers)| {
            let hits = tokens
                .iter()
                .filter(|t| matches_marker(t, markers))
                .count() as u32;
            (*dialect, hits)
        })
        .collect();

    let total: u32 = counts.iter().map(|(_, h)| h).sum();
    if total == 0 {
        return if arabic_ratio(normalized) >= ARABIC_THRESHOLD {
            DialectProfile {
                dialect: Dialect::Msa,
                confidence: 0.5,
                hits: 0,
            }
        } else {
            DialectProfile {
                dialect: Dialect::NonArabic,
                confidence: 1.0,
                hits: 0,
            }
        };
    }

    // First maximum wins so ties resolve in CANDIDATES order.
    let (dialect, hits) = counts
        .iter()
        .fold((Dialect::Msa, 0u32), |best, &(d, h)| if h > best.1 { (d, h) } else { best });

    DialectProfile {
        dialect,
        confidence: f64::from(hits) / f64::from(total),
        hits,
    }
}

/// Estimates how demanding the text is for a model, in [0, 1].
///
/// 0.5 × length (saturates at 120 tokens) + 0.3 × sentence count (saturates
/// at 8) + 0.2 when the text mixes Arabic and Latin script.
pub fn estimate_complexity(text: &str) -> f64 {
    let tokens = text.split_whitespace().count();
    if tokens == 0 {
        return 0.0;
    }
    let length_factor = (tokens as f64 / 120.0).min(1.0);

    let sentences = text
        .split(['.', '!', '?', '؟', '\n', '؛'])
        .filter(|s| !s.trim().is_empty())
        .count();
    let sentence_factor = (sentences as f64 / 8.0).min(1.0);

    let ratio = arabic_ratio(text);
    let mixed = if ratio > 0.2 && ratio < 0.8 { 1.0 } else { 0.0 };

    (0.5 * length_factor + 0.3 * sentence_factor + 0.2 * mixed).clamp(0.0, 1.0)
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect()
}

fn matches_marker(token: &str, markers: &[&str]) -> bool {
    if markers.contains(&token) {
        return true;
    }
    match token.strip_prefix('و') {
        Some(rest) if rest.chars().count() >= 2 => markers.contains(&rest),
        _ => false,
    }
}
