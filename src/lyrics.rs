//! LRC text handling: credit-line removal and plain-text derivation.
//!
//! `clean` only ever drops whole lines. Timing tags, metadata tags and blank
//! lines pass through untouched, which is what makes it idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// Regex Patterns
// ============================================================================

/// One LRC timing tag: [mm:ss], [mm:ss.xx], [mm:ss:xx], [mm:ss.xxx]
pub static TIME_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d{1,3}:\d{1,2}(?:[.:]\d{1,3})?\]").unwrap());

/// Any run of timing tags at the start of a line
pub static LEADING_TIME_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\[\d{1,3}:\d{1,2}(?:[.:]\d{1,3})?\]\s*)+").unwrap());

/// ID tag lines such as [ar:Artist], [ti:Title], [offset:+0], [by:someone]
pub static META_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[[A-Za-z#]{1,8}:[^\]]*\]$").unwrap());

/// Credit labels, Chinese (simplified + traditional), Japanese and Korean.
const CJK_CREDIT_LABELS: &str = concat!(
    "作词|作詞|作曲|填词|填詞|谱曲|譜曲|词曲|詞曲|词|詞|曲|",
    "작사|작곡"
);

/// English role nouns in title or upper case, plus any-case "... by" forms.
/// Bare "Music:" and "Lyrics:" are left alone; they open real lines too.
const ENGLISH_CREDIT_LABELS: &str = concat!(
    "Lyricists?|LYRICISTS?|Composers?|COMPOSERS?|Songwriters?|SONGWRITERS?|",
    "(?i:(?:lyrics|music|words|composed|written)\\s+by)"
);

/// A credit line: one or more labels joined by / & 、, then a colon. The
/// value may be missing.
/// e.g. "作词 : 周杰伦", "作詞／作曲：X", "Composer: Y", "作词："
pub static CREDIT_LINE: Lazy<Regex> = Lazy::new(|| {
    let labels = format!("{}|{}", CJK_CREDIT_LABELS, ENGLISH_CREDIT_LABELS);
    Regex::new(&format!(
        r"^(?:{labels})(?:\s*[/／&、]\s*(?:{labels}))*\s*[:：]",
        labels = labels
    ))
    .unwrap()
});

// ============================================================================
// Cleaned Lyric
// ============================================================================

/// Lyric text with credit annotations removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedLyric {
    pub text: String,
}

impl CleanedLyric {
    /// True when nothing singable remains.
    pub fn is_empty(&self) -> bool {
        self.plain_text().is_empty()
    }

    pub fn is_synced(&self) -> bool {
        has_timing_tags(&self.text)
    }

    /// Lyric with timing and ID tags stripped and outer blank lines trimmed.
    pub fn plain_text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        for line in self.text.split('\n') {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                lines.push(String::new());
                continue;
            }
            if META_TAG.is_match(trimmed) {
                continue;
            }
            lines.push(TIME_TAG.replace_all(trimmed, "").trim().to_string());
        }

        let start = lines.iter().position(|l| !l.is_empty());
        let end = lines.iter().rposition(|l| !l.is_empty());
        match (start, end) {
            (Some(s), Some(e)) => lines[s..=e].join("\n"),
            _ => String::new(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Does this line credit a lyricist or composer?
pub fn is_credit_line(line: &str) -> bool {
    let body = LEADING_TIME_TAGS.replace(line, "");
    CREDIT_LINE.is_match(body.trim())
}

/// Does the text contain at least one timed line?
pub fn has_timing_tags(text: &str) -> bool {
    text.lines().any(|l| LEADING_TIME_TAGS.is_match(l))
}

/// Convert CRLF / CR line endings to LF.
pub fn normalize_line_endings(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

/// Remove every credit-annotation line, wherever it appears.
pub fn clean(raw: &str) -> CleanedLyric {
    let text = normalize_line_endings(raw);
    let kept: Vec<&str> = text.split('\n').filter(|line| !is_credit_line(line)).collect();
    CleanedLyric {
        text: kept.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_lines_detected() {
        assert!(is_credit_line("作词: X"));
        assert!(is_credit_line("作词 : 周杰伦"));
        assert!(is_credit_line("[00:00.00]作曲：方文山"));
        assert!(is_credit_line("[00:00.00][00:01.00] 作詞 : 某人"));
        assert!(is_credit_line("作词/作曲：X"));
        assert!(is_credit_line("Composer: Y"));
        assert!(is_credit_line("[00:01.50]Lyrics by: Z"));
        assert!(is_credit_line("작사 : 누군가"));
        assert!(is_credit_line("Music by: Someone"));
        assert!(is_credit_line("LYRICS BY：Z"));
        assert!(is_credit_line("Lyricist / Composer: Y"));
    }

    #[test]
    fn test_bare_labels_are_credits() {
        assert!(is_credit_line("作词："));
        assert!(is_credit_line("[00:00.00]作曲 :"));
        assert!(is_credit_line("Composer:"));
        assert_eq!(clean("作词：
[00:01.00]Hello").text, "[00:01.00]Hello");
    }

    #[test]
    fn test_lines_opening_with_common_words_kept() {
        assert!(!is_credit_line("Music: turn it up"));
        assert!(!is_credit_line("[00:03.00]music: turn it up"));
        assert!(!is_credit_line("Lyrics: none of this matters"));
        assert!(!is_credit_line("composer: the night"));
        let raw = "[00:01.00]Music: turn it up\n[00:02.00]作词：X";
        assert_eq!(clean(raw).text, "[00:01.00]Music: turn it up");
    }

    #[test]
    fn test_ordinary_lines_kept() {
        assert!(!is_credit_line("[00:12.34]I wrote this song for you"));
        assert!(!is_credit_line("Music is my life"));
        assert!(!is_credit_line("曲终人散"));
        assert!(!is_credit_line("[ar:Artist]"));
        assert!(!is_credit_line(""));
    }

    #[test]
    fn test_clean_scenario() {
        let raw = "[ti:SongA]\n[00:00.00]作词: X\n[00:05.00]First line\n\n[00:10.00]Second line";
        let cleaned = clean(raw);
        assert_eq!(
            cleaned.text,
            "[ti:SongA]\n[00:05.00]First line\n\n[00:10.00]Second line"
        );
        assert!(cleaned.is_synced());
    }

    #[test]
    fn test_clean_anywhere_in_file() {
        let raw = "line one\n作曲：Y\nline two\n作词：X";
        assert_eq!(clean(raw).text, "line one\nline two");
    }

    #[test]
    fn test_clean_normalizes_crlf() {
        let raw = "[00:01.00]a\r\n作词：X\r\n[00:02.00]b\r\n";
        assert_eq!(clean(raw).text, "[00:01.00]a\n[00:02.00]b\n");
    }

    #[test]
    fn test_plain_text() {
        let cleaned = clean("[ar:A]\n\n[00:01.00]Hello\n[00:02.00]\n[00:03.00][00:04.00]World\n\n");
        assert_eq!(cleaned.plain_text(), "Hello\n\nWorld");
    }

    #[test]
    fn test_plain_text_of_unsynced() {
        let cleaned = clean("Hello\nWorld");
        assert!(!cleaned.is_synced());
        assert_eq!(cleaned.plain_text(), "Hello\nWorld");
    }

    #[test]
    fn test_only_credits_is_empty() {
        let cleaned = clean("[00:00.00]作词：X\n[00:00.50]作曲：Y");
        assert!(cleaned.is_empty());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// A single lyric line: maybe timed, maybe a credit, maybe blank.
    fn lyric_line() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            "[a-zA-Z ,']{1,30}",
            "\\[0[0-9]:[0-5][0-9]\\.[0-9]{2}\\][a-zA-Z ]{0,20}",
            "(作词|作曲|Composer|Lyricist) ?[:：] ?[a-zA-Z]{1,10}",
            "(作词|作曲)[:：]",
            "(Music|Lyrics) ?: ?[a-z]{1,10}",
            "\\[0[0-9]:[0-5][0-9]\\.[0-9]{2}\\](作词|作曲) ?: ?[a-zA-Z]{1,10}",
        ]
    }

    fn lyric_text() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(lyric_line(), 0..40)
    }

    proptest! {
        /// Cleaning twice equals cleaning once
        #[test]
        fn clean_is_idempotent(lines in lyric_text()) {
            let raw = lines.join("\n");
            let once = clean(&raw);
            let twice = clean(&once.text);
            prop_assert_eq!(once, twice);
        }

        /// N credit lines in, zero out, and every other line survives
        #[test]
        fn clean_removes_exactly_the_credits(lines in lyric_text()) {
            let raw = lines.join("\n");
            let credit_count = lines.iter().filter(|l| is_credit_line(l)).count();
            let cleaned = clean(&raw);

            let out_lines: Vec<&str> = if lines.is_empty() {
                Vec::new()
            } else {
                cleaned.text.split('\n').collect()
            };
            prop_assert_eq!(out_lines.iter().filter(|l| is_credit_line(l)).count(), 0);
            if !lines.is_empty() && credit_count < lines.len() {
                prop_assert_eq!(out_lines.len(), lines.len() - credit_count);
            }
        }
    }
}
