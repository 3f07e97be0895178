//! Name normalization for matching local LRC files against track tags.
//!
//! Everything here is pure and filesystem-free. `fold_name` produces the
//! comparison key used by `scoring`; the other helpers exist so that key is
//! stable across punctuation, width, case and diacritic differences.

use any_ascii::any_ascii_char;
use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use unicode_normalization::UnicodeNormalization;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Multi-artist separators: &, /, ,, ;, •, +, ×, CJK list marks, and the
/// spaced words x, vs, and, with, feat, ft, featuring, 和.
pub static ARTIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\s*(?:[&/,;•+×、，､]|(?:\s+(?:x|vs\.?|and|with|feat\.?|ft\.?|featuring)\s+)|和)\s*",
    )
    .unwrap()
});

/// Leading "feat." marker without brackets: "feat. Someone" as a whole artist string
pub static FEAT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:feat\.?|ft\.?|featuring)\s+").unwrap());

/// "Artist - Title" stem. Accepts hyphen, en dash, em dash and full-width hyphen.
pub static LRC_STEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(.+?)\s+[-–—－]\s+(.+?)\s*$").unwrap());

/// Regex to collapse multiple whitespace into single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
/// Used to filter out accents during normalization.
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Han ideographs, kana and Hangul. Transliterating these loses tone and
/// homophone information, so they are compared as written.
pub fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x11FF
            | 0x3040..=0x30FF
            | 0x3130..=0x318F
            | 0x31F0..=0x31FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA960..=0xA97F
            | 0xAC00..=0xD7AF
            | 0xD7B0..=0xD7FF
            | 0xF900..=0xFAFF
            | 0x20000..=0x3FFFF
    )
}

/// Fold Unicode text by applying NFKD decomposition and removing combining marks.
/// Latin, Cyrillic, Greek and similar scripts are transliterated to ASCII;
/// CJK characters are kept.
/// e.g., "Beyoncé" → "beyonce", "（Live）" → "(live)", "世界" → "世界"
pub fn fold_to_ascii(s: &str) -> String {
    // NFKD also maps full-width forms to their ASCII counterparts
    let mut out = String::with_capacity(s.len());
    for c in s.nfkd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii() || is_cjk(c) {
            out.push(c);
        } else {
            out.push_str(any_ascii_char(c));
        }
    }
    out.to_lowercase()
}

/// Normalize quotes, CJK brackets and "&" spacing. NFKD does not cover these.
pub fn normalize_punctuation(s: &str) -> String {
    let result = s
        .replace(['\u{2018}', '\u{2019}', '\u{00B4}', '\u{0060}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['【', '「', '『', '《', '〈'], "[")
        .replace(['】', '」', '』', '》', '〉'], "]")
        .replace(['・', '·'], " ")
        .replace(" & ", " and ");
    MULTI_SPACE.replace_all(&result, " ").to_string()
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Comparison key for an artist or title.
///
/// Punctuation becomes whitespace (apostrophes vanish), text is folded to
/// lowercase (ASCII outside CJK) and whitespace is collapsed. A name made only of
/// punctuation keeps its trimmed lowercase form so it still compares equal
/// to itself.
pub fn fold_name(s: &str) -> String {
    let folded = fold_to_ascii(&normalize_punctuation(s));
    let cleaned: String = folded
        .chars()
        .filter(|c| *c != '\'')
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let key = MULTI_SPACE.replace_all(cleaned.trim(), " ").to_string();
    if key.is_empty() {
        s.trim().to_lowercase()
    } else {
        key
    }
}

/// Split a credited-artist string into folded individual names.
///
/// The whole string is kept as one of the names so that artists whose name
/// contains a separator ("AC/DC", "Simon & Garfunkel") still match exactly.
/// Output is sorted and deduplicated.
/// e.g., "Artist A & Artist B" → ["artist a", "artist a and artist b", "artist b"]
pub fn split_artists(artist: &str) -> Vec<String> {
    let mut names: FxHashSet<String> = FxHashSet::default();

    let whole = fold_name(artist);
    if !whole.is_empty() {
        names.insert(whole);
    }

    for part in ARTIST_SEPARATOR.split(artist) {
        let part = FEAT_PREFIX.replace(part.trim(), "");
        let key = fold_name(&part);
        if !key.is_empty() {
            names.insert(key);
        }
    }

    let mut out: Vec<String> = names.into_iter().collect();
    out.sort();
    out
}

/// Parse an LRC file stem of the form "Artist - Title".
/// Splits on the first dash surrounded by whitespace; titles may contain more dashes.
pub fn parse_lrc_stem(stem: &str) -> Option<(String, String)> {
    let caps = LRC_STEM.captures(stem)?;
    let artist = caps.get(1)?.as_str().trim();
    let title = caps.get(2)?.as_str().trim();
    if artist.is_empty() || title.is_empty() {
        return None;
    }
    Some((artist.to_string(), title.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================
