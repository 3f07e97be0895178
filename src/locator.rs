//! Local LRC lookup.
//!
//! Scans a directory tree for `Artist - Title.lrc` files and picks the one
//! whose names best match a track. Ranking, best first:
//!
//! 1. exact match (both folded keys identical) over fuzzy match
//! 2. higher combined artist/title similarity
//! 3. fewer path components below the root
//! 4. sorted path order
//!
//! Candidates equal on (1) and (2) are reported as ambiguous.

use encoding_rs::GB18030;
use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::lyrics::has_timing_tags;
use crate::models::{LyricCandidate, TrackIdentity};
use crate::normalize::parse_lrc_stem;
use crate::scoring::{score_match, MatchScore, NameKey, DEFAULT_MATCH_THRESHOLD};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalLyricLocator {
    threshold: f64,
}

impl Default for LocalLyricLocator {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

/// A scored `.lrc` file.
#[derive(Debug, Clone)]
struct Scored {
    path: PathBuf,
    depth: usize,
    score: MatchScore,
}

impl Scored {
    fn rank(&self, other: &Scored) -> Ordering {
        self.score
            .kind
            .cmp(&other.score.kind)
            .then_with(|| {
                other
                    .score
                    .combined()
                    .partial_cmp(&self.score.combined())
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| self.depth.cmp(&other.depth))
            .then_with(|| self.path.cmp(&other.path))
    }
}

impl LocalLyricLocator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Best matching LRC file under `root`, read and wrapped as a candidate.
    pub fn find(&self, track: &TrackIdentity, root: &Path) -> io::Result<Option<LyricCandidate>> {
        let Some(path) = self.best_match(track, root) else {
            return Ok(None);
        };
        let text = read_lyric_file(&path)?;
        let synced = has_timing_tags(&text);
        Ok(Some(LyricCandidate::local(path, text, synced)))
    }

    /// Path of the best matching LRC file, without reading it.
    pub fn best_match(&self, track: &TrackIdentity, root: &Path) -> Option<PathBuf> {
        let key = NameKey::new(&track.artist, &track.title);

        let mut matches: Vec<Scored> = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_lrc(e.path()))
            .filter_map(|e| {
                let stem = e.path().file_stem()?.to_str()?;
                let (artist, title) = parse_lrc_stem(stem)?;
                let score = score_match(&key, &NameKey::new(&artist, &title), self.threshold)?;
                Some(Scored {
                    path: e.path().to_path_buf(),
                    depth: e.depth(),
                    score,
                })
            })
            .collect();

        if matches.is_empty() {
            tracing::debug!(track = %track, "no local lrc match");
            return None;
        }

        matches.sort_by(|a, b| a.rank(b));
        let best = &matches[0];
        let tied: Vec<&Scored> = matches
            .iter()
            .skip(1)
            .filter(|m| m.score.ties_with(&best.score))
            .collect();
        if !tied.is_empty() {
            tracing::warn!(
                track = %track,
                chosen = %best.path.display(),
                others = ?tied.iter().map(|m| m.path.display().to_string()).collect::<Vec<_>>(),
                "ambiguous local lrc match"
            );
        }

        tracing::debug!(
            path = %best.path.display(),
            artist = best.score.artist,
            title = best.score.title,
            kind = ?best.score.kind,
            "local lrc match"
        );
        Some(best.path.clone())
    }
}

fn is_lrc(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("lrc"))
        .unwrap_or(false)
}

/// Read an LRC file as UTF-8 (BOM dropped), falling back to GB18030.
pub fn read_lyric_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    decode_lyric_bytes(&bytes)
}

/// `InvalidData` when the bytes are neither UTF-8 nor GB18030.
pub fn decode_lyric_bytes(bytes: &[u8]) -> io::Result<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Ok(s.to_string());
    }

    let (text, had_errors) = GB18030.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "lyric file is neither UTF-8 nor GB18030",
        ));
    }
    tracing::debug!("decoded lyric file as GB18030");
    Ok(text.into_owned())
}
