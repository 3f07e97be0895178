//! Core data models for the lyric resolution pipeline.
//!
//! Everything here is transient per track: a `TrackIdentity` is read once,
//! resolved once, and dropped before the next file is touched. Nothing is
//! cached across tracks, even when two files carry identical tags.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Track Models
// ============================================================================

/// Identity of one audio file as read from its tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackIdentity {
    pub path: PathBuf,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_sec: u32,
}

impl TrackIdentity {
    pub fn new(
        path: impl Into<PathBuf>,
        title: impl Into<String>,
        artist: impl Into<String>,
        album: Option<String>,
        duration_sec: u32,
    ) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            artist: artist.into(),
            album,
            duration_sec,
        }
    }
}

impl fmt::Display for TrackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({}, {}s)",
            self.artist,
            self.title,
            self.album.as_deref().unwrap_or("no album"),
            self.duration_sec
        )
    }
}

// ============================================================================
// Lyric Models
// ============================================================================

/// Where a lyric candidate came from, in lookup priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SourceKind {
    CachedRemote,
    ExternalRemote,
    LocalFile,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::CachedRemote => "cached_remote",
            SourceKind::ExternalRemote => "external_remote",
            SourceKind::LocalFile => "local_file",
        }
    }
}

/// A lyric produced by exactly one lookup path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LyricCandidate {
    pub source: SourceKind,
    pub raw_text: String,
    pub is_synced: bool,
    /// Set only for `LocalFile` candidates; this is the file that gets archived.
    pub local_path: Option<PathBuf>,
}

impl LyricCandidate {
    pub fn external(raw_text: impl Into<String>, is_synced: bool) -> Self {
        Self {
            source: SourceKind::ExternalRemote,
            raw_text: raw_text.into(),
            is_synced,
            local_path: None,
        }
    }

    pub fn local(path: impl Into<PathBuf>, raw_text: impl Into<String>, is_synced: bool) -> Self {
        Self {
            source: SourceKind::LocalFile,
            raw_text: raw_text.into(),
            is_synced,
            local_path: Some(path.into()),
        }
    }
}

// ============================================================================
// Outcome Models
// ============================================================================

/// Why a track ended in `Failed`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    MetadataUnreadable(String),
    /// Transport-level failure (DNS, connect, timeout)
    Network(String),
    /// The service answered with a non-success status
    Service { status: u16, message: String },
    /// The service answered 2xx but the body did not decode
    Decode(String),
    Signer(String),
    /// The publish token was not produced for the content being published
    TokenMismatch,
    LocalRead(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MetadataUnreadable(msg) => write!(f, "metadata unreadable: {}", msg),
            FailureReason::Network(msg) => write!(f, "network error: {}", msg),
            FailureReason::Service { status, message } => {
                write!(f, "service error (HTTP {}): {}", status, message)
            }
            FailureReason::Decode(msg) => write!(f, "bad response: {}", msg),
            FailureReason::Signer(msg) => write!(f, "proof-of-work failed: {}", msg),
            FailureReason::TokenMismatch => write!(f, "publish token does not match content"),
            FailureReason::LocalRead(msg) => write!(f, "cannot read local lyric: {}", msg),
        }
    }
}

/// Terminal per-track result for one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ProcessingOutcome {
    AlreadyCached,
    /// In dry-run mode this is the outcome the track would have reached.
    Published { source: SourceKind },
    NoLyricFound,
    /// The operator refused the publish prompt
    Declined,
    Failed(FailureReason),
}

impl ProcessingOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingOutcome::AlreadyCached => "already_cached",
            ProcessingOutcome::Published { .. } => "published",
            ProcessingOutcome::NoLyricFound => "no_lyric_found",
            ProcessingOutcome::Declined => "declined",
            ProcessingOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ProcessingOutcome::Failed(_))
    }
}

/// What happened to the source files after the outcome was decided.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ArchiveStatus {
    /// Outcome does not call for archiving
    NotApplicable,
    /// Dry-run, or the operator refused the archive prompt
    Skipped,
    Archived {
        audio: PathBuf,
        lyric: Option<PathBuf>,
    },
    /// Nothing moved (collision, missing source, failed audio move)
    Failed(String),
    /// Audio moved, paired LRC did not. Needs manual attention.
    Partial(String),
}

impl ArchiveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ArchiveStatus::NotApplicable => "n/a",
            ArchiveStatus::Skipped => "skipped",
            ArchiveStatus::Archived { .. } => "archived",
            ArchiveStatus::Failed(_) => "archive_failed",
            ArchiveStatus::Partial(_) => "partial_archive",
        }
    }
}

/// Everything known about one processed file.
#[derive(Clone, Debug, Serialize)]
pub struct TrackReport {
    pub path: PathBuf,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub outcome: ProcessingOutcome,
    pub archive: ArchiveStatus,
}

impl TrackReport {
    pub fn new(path: &Path, track: Option<&TrackIdentity>, outcome: ProcessingOutcome) -> Self {
        Self {
            path: path.to_path_buf(),
            artist: track.map(|t| t.artist.clone()),
            title: track.map(|t| t.title.clone()),
            outcome,
            archive: ArchiveStatus::NotApplicable,
        }
    }

    pub fn with_archive(mut self, archive: ArchiveStatus) -> Self {
        self.archive = archive;
        self
    }
}

// ============================================================================
// Run Summary
// ============================================================================

/// Per-outcome counts for one run.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub already_cached: usize,
    pub published: usize,
    pub no_lyric_found: usize,
    pub declined: usize,
    pub failed: usize,
    pub archived: usize,
    pub archive_failed: usize,
    pub partial_archive: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub dry_run: bool,
    pub reports: Vec<TrackReport>,
}

impl RunSummary {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            reports: Vec::new(),
        }
    }

    pub fn push(&mut self, report: TrackReport) {
        self.reports.push(report);
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut c = OutcomeCounts::default();
        for r in &self.reports {
            match r.outcome {
                ProcessingOutcome::AlreadyCached => c.already_cached += 1,
                ProcessingOutcome::Published { .. } => c.published += 1,
                ProcessingOutcome::NoLyricFound => c.no_lyric_found += 1,
                ProcessingOutcome::Declined => c.declined += 1,
                ProcessingOutcome::Failed(_) => c.failed += 1,
            }
            match r.archive {
                ArchiveStatus::Archived { .. } => c.archived += 1,
                ArchiveStatus::Failed(_) => c.archive_failed += 1,
                ArchiveStatus::Partial(_) => c.partial_archive += 1,
                ArchiveStatus::NotApplicable | ArchiveStatus::Skipped => {}
            }
        }
        c
    }

    pub fn failures(&self) -> impl Iterator<Item = &TrackReport> {
        self.reports.iter().filter(|r| r.outcome.is_failed())
    }

    pub fn archive_problems(&self) -> impl Iterator<Item = &TrackReport> {
        self.reports
            .iter()
            .filter(|r| matches!(r.archive, ArchiveStatus::Failed(_) | ArchiveStatus::Partial(_)))
    }

    /// True when any track needs attention: a failed outcome, or a publish
    /// whose files could not be archived.
    pub fn needs_attention(&self) -> bool {
        let c = self.counts();
        c.failed > 0 || c.archive_failed > 0 || c.partial_archive > 0
    }

    pub fn exit_code(&self) -> i32 {
        if self.needs_attention() {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: ProcessingOutcome, archive: ArchiveStatus) -> TrackReport {
        TrackReport::new(Path::new("/lib/a.mp3"), None, outcome).with_archive(archive)
    }

    #[test]
    fn test_counts_and_exit_code() {
        let mut summary = RunSummary::new(false);
        summary.push(report(ProcessingOutcome::AlreadyCached, ArchiveStatus::NotApplicable));
        summary.push(report(
            ProcessingOutcome::Published { source: SourceKind::LocalFile },
            ArchiveStatus::Archived {
                audio: PathBuf::from("/done/a.mp3"),
                lyric: None,
            },
        ));
        summary.push(report(ProcessingOutcome::NoLyricFound, ArchiveStatus::NotApplicable));

        let c = summary.counts();
        assert_eq!(c.already_cached, 1);
        assert_eq!(c.published, 1);
        assert_eq!(c.archived, 1);
        assert_eq!(c.no_lyric_found, 1);
        assert_eq!(summary.exit_code(), 0);

        summary.push(report(
            ProcessingOutcome::Failed(FailureReason::Network("timeout".into())),
            ArchiveStatus::NotApplicable,
        ));
        assert_eq!(summary.exit_code(), 1);
        assert_eq!(summary.failures().count(), 1);
    }

    #[test]
    fn test_partial_archive_needs_attention() {
        let mut summary = RunSummary::new(false);
        summary.push(report(
            ProcessingOutcome::Published { source: SourceKind::LocalFile },
            ArchiveStatus::Partial("lrc move failed".into()),
        ));
        assert!(summary.needs_attention());
        assert_eq!(summary.failures().count(), 0);
        assert_eq!(summary.archive_problems().count(), 1);
    }

    #[test]
    fn test_track_display() {
        let t = TrackIdentity::new("/x.mp3", "Song", "Artist", None, 200);
        assert_eq!(t.to_string(), "Artist - Song (no album, 200s)");
    }
}
