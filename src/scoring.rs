//! Similarity scoring for matching local LRC files to tracks.
//!
//! Metric: normalized Levenshtein similarity (`strsim`) between the
//! `fold_name` keys of both strings with all whitespace removed, giving a
//! value in [0.0, 1.0]. Identical keys score 1.0 and count as an exact match.
//!
//! A file matches a track when the numbers in both titles agree and its
//! title similarity AND its artist similarity both reach the threshold. Artist similarity is the maximum over
//! every pair of credited names on either side (see `split_artists`).

use crate::normalize::{fold_name, split_artists};

// ============================================================================
// Score Thresholds
// ============================================================================

/// Default minimum similarity for both artist and title
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;

/// Two combined scores closer than this are treated as a tie
pub const TIE_EPSILON: f64 = 1e-9;

// ============================================================================
// Similarity
// ============================================================================

fn compact(key: &str) -> String {
    key.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Similarity of two already-folded keys (0.0 to 1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = compact(a);
    let b = compact(b);
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&a, &b)
}

/// Digit runs in a folded key, leading zeros dropped.
/// e.g., "chapter 02 part 3" → ["2", "3"]
pub fn numeric_tokens(key: &str) -> Vec<&str> {
    key.split(|c: char| !c.is_ascii_digit())
        .filter(|t| !t.is_empty())
        .map(|t| t.trim_start_matches('0'))
        .collect()
}

/// Similarity of two raw names, folding both first.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    similarity(&fold_name(a), &fold_name(b))
}

/// Multi-artist matching result.
/// Returns the best similarity score across all credited artists.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiArtistMatchResult {
    pub best_similarity: f64,
    pub is_exact: bool,
}

/// Score every credited name on one side against every name on the other.
pub fn score_artist_multi(left: &[String], right: &[String]) -> MultiArtistMatchResult {
    let mut best_similarity: f64 = 0.0;

    for a in left {
        for b in right {
            let s = similarity(a, b);
            if s >= 1.0 {
                return MultiArtistMatchResult {
                    best_similarity: 1.0,
                    is_exact: true,
                };
            }
            if s > best_similarity {
                best_similarity = s;
            }
        }
    }

    MultiArtistMatchResult {
        best_similarity,
        is_exact: false,
    }
}

// ============================================================================
// Match Scoring
// ============================================================================

/// Exact matches sort before fuzzy ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Exact,
    Fuzzy,
}

/// Precomputed comparison keys for one (artist, title) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameKey {
    pub title: String,
    pub artists: Vec<String>,
}

impl NameKey {
    pub fn new(artist: &str, title: &str) -> Self {
        Self {
            title: fold_name(title),
            artists: split_artists(artist),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub artist: f64,
    pub title: f64,
    pub kind: MatchKind,
}

impl MatchScore {
    pub fn combined(&self) -> f64 {
        (self.artist + self.title) / 2.0
    }

    /// Same kind and same combined similarity.
    pub fn ties_with(&self, other: &MatchScore) -> bool {
        self.kind == other.kind && (self.combined() - other.combined()).abs() < TIE_EPSILON
    }
}

/// Score a candidate against a track. `None` when the title numbers differ
/// or either side is below the threshold.
pub fn score_match(track: &NameKey, candidate: &NameKey, threshold: f64) -> Option<MatchScore> {
    if numeric_tokens(&track.title) != numeric_tokens(&candidate.title) {
        return None;
    }

    let title = similarity(&track.title, &candidate.title);
    if title < threshold {
        return None;
    }

    let artist = score_artist_multi(&track.artists, &candidate.artists);
    if artist.best_similarity < threshold {
        return None;
    }

    let kind = if artist.is_exact && title >= 1.0 {
        MatchKind::Exact
    } else {
        MatchKind::Fuzzy
    };

    Some(MatchScore {
        artist: artist.best_similarity,
        title,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("abc", "abc"), 1.0);
        assert_eq!(similarity("", "abc"), 0.0);
        let s = similarity("kitten", "sitting");
        assert!(s > 0.5 && s < 0.6, "got {}", s);
    }

    #[test]
    fn test_similarity_ignores_whitespace() {
        assert_eq!(name_similarity("SongA", "Song A"), 1.0);
        assert_eq!(name_similarity("Beyoncé", "beyonce"), 1.0);
        assert_eq!(name_similarity("Don't Stop", "Dont Stop"), 1.0);
    }

    #[test]
    fn test_score_artist_multi() {
        let track = split_artists("Artist A feat. Artist B");
        let file = split_artists("Artist B");
        let r = score_artist_multi(&track, &file);
        assert!(r.is_exact);

        let r = score_artist_multi(&split_artists("Metallica"), &split_artists("Megadeth"));
        assert!(!r.is_exact);
        assert!(r.best_similarity < DEFAULT_MATCH_THRESHOLD);
    }

    #[test]
    fn test_score_match_exact() {
        let track = NameKey::new("Artist", "SongA");
        let file = NameKey::new("artist", "Song A");
        let score = score_match(&track, &file, DEFAULT_MATCH_THRESHOLD).unwrap();
        assert_eq!(score.kind, MatchKind::Exact);
        assert_eq!(score.combined(), 1.0);
    }

    #[test]
    fn test_score_match_fuzzy() {
        let track = NameKey::new("Artist", "Yesterday");
        let file = NameKey::new("Artist", "Yesterdays");
        let score = score_match(&track, &file, DEFAULT_MATCH_THRESHOLD).unwrap();
        assert_eq!(score.kind, MatchKind::Fuzzy);
        assert!(score.title >= DEFAULT_MATCH_THRESHOLD);
    }

    #[test]
    fn test_score_match_requires_both_sides() {
        let track = NameKey::new("Artist", "SongA");
        // Title matches, artist does not
        assert!(score_match(&track, &NameKey::new("Someone Else", "SongA"), 0.85).is_none());
        // Artist matches, title does not
        assert!(score_match(&track, &NameKey::new("Artist", "SongB Remix"), 0.85).is_none());
    }

    #[test]
    fn test_threshold_is_configurable() {
        let track = NameKey::new("Artist", "Halo");
        let file = NameKey::new("Artist", "Hallo");
        assert!(score_match(&track, &file, 0.85).is_none());
        assert!(score_match(&track, &file, 0.75).is_some());
    }

    #[test]
    fn test_numeric_tokens() {
        assert_eq!(numeric_tokens("chapter 02 part 3"), vec!["2", "3"]);
        assert_eq!(numeric_tokens("1999"), vec!["1999"]);
        assert!(numeric_tokens("yesterday").is_empty());
    }

    #[test]
    fn test_numbered_titles_never_match_each_other() {
        let pairs = [
            ("Chapter 2", "Chapter 1"),
            ("Part 1", "Part 2"),
            ("Vol. 3", "Vol. 4"),
            ("Symphony No. 5", "Symphony No. 9"),
            ("Song 2", "Song"),
        ];
        for (track_title, file_title) in pairs {
            let track = NameKey::new("Artist", track_title);
            let file = NameKey::new("Artist", file_title);
            assert!(
                score_match(&track, &file, DEFAULT_MATCH_THRESHOLD).is_none(),
                "{} matched {}",
                track_title,
                file_title
            );
            assert!(score_match(&track, &file, 0.1).is_none());
        }
    }

    #[test]
    fn test_equal_numbers_still_score() {
        let track = NameKey::new("Artist", "Chapter 2");
        let score = score_match(&track, &NameKey::new("artist", "Chapter 02"), 0.85).unwrap();
        assert_eq!(score.kind, MatchKind::Fuzzy);

        let score = score_match(&track, &NameKey::new("Artist", "Chapter ２"), 0.85).unwrap();
        assert_eq!(score.kind, MatchKind::Exact);
    }

    #[test]
    fn test_homophone_cjk_titles_do_not_match() {
        let track = NameKey::new("歌手", "世界");
        let file = NameKey::new("歌手", "视界");
        assert!(score_match(&track, &file, DEFAULT_MATCH_THRESHOLD).is_none());

        let same = score_match(&track, &NameKey::new("歌手", "世界"), DEFAULT_MATCH_THRESHOLD);
        assert_eq!(same.map(|s| s.kind), Some(MatchKind::Exact));
    }

    #[test]
    fn test_ties() {
        let a = MatchScore { artist: 1.0, title: 0.9, kind: MatchKind::Fuzzy };
        let b = MatchScore { artist: 0.9, title: 1.0, kind: MatchKind::Fuzzy };
        let c = MatchScore { artist: 1.0, title: 1.0, kind: MatchKind::Exact };
        assert!(a.ties_with(&b));
        assert!(!a.ties_with(&c));
    }
}
