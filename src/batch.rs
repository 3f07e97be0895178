//! Batch driver: one pass over the audio library.
//!
//! Tracks are processed one at a time in sorted path order. Each track is
//! read, planned, optionally confirmed, published and archived before the
//! next is touched. Per-track problems end up in the [`RunSummary`]; only
//! startup problems abort the run.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::archive::ArchiveManager;
use crate::config::RunConfig;
use crate::engine::{Plan, PreparedLyric, ResolutionEngine};
use crate::error::{ArchiveError, ConfigError, Error, Result};
use crate::journal::RunJournal;
use crate::metadata::MetadataReader;
use crate::models::{
    ArchiveStatus, FailureReason, ProcessingOutcome, RunSummary, TrackIdentity, TrackReport,
};
use crate::pow::ProofOfWorkSigner;
use crate::progress::Progress;
use crate::prompt::Prompter;
use crate::store::LyricStore;

pub struct BatchOrchestrator<S, P, M, R> {
    config: RunConfig,
    engine: ResolutionEngine<S, P>,
    reader: M,
    prompter: R,
    archive: ArchiveManager,
    progress: Progress,
    journal: Option<RunJournal>,
}

impl<S, P, M, R> BatchOrchestrator<S, P, M, R>
where
    S: LyricStore,
    P: ProofOfWorkSigner,
    M: MetadataReader,
    R: Prompter,
{
    pub fn new(config: RunConfig, engine: ResolutionEngine<S, P>, reader: M, prompter: R) -> Self {
        let archive = ArchiveManager::from_layout(&config.layout);
        Self {
            config,
            engine,
            reader,
            prompter,
            archive,
            progress: Progress::hidden(),
            journal: None,
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_journal(mut self, journal: RunJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Process every selected track. Fails only on startup problems.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.config.validate()?;
        self.config.layout.prepare(self.config.dry_run)?;
        self.engine
            .store()
            .check_reachable()
            .map_err(Error::Unreachable)?;

        let tracks = self.collect_tracks()?;
        tracing::info!(
            tracks = tracks.len(),
            dry_run = self.config.dry_run,
            confirm = self.config.confirm_before_write,
            "starting run"
        );

        let mut summary = RunSummary::new(self.config.dry_run);
        let pb = self.progress.bar(tracks.len() as u64, "Resolving");
        let total = tracks.len() as u64;

        for (i, path) in tracks.iter().enumerate() {
            let report = self.process_track(path);
            log_report(&report);

            if let Some(journal) = &self.journal {
                if let Err(e) = journal.record(&report) {
                    tracing::warn!(error = %e, "failed to journal outcome");
                }
            }
            summary.push(report);

            pb.inc(1);
            self.progress.log("resolve", i as u64 + 1, total, 10);
        }
        pb.finish_and_clear();

        if let Some(journal) = &self.journal {
            if let Err(e) = journal.finish(&summary) {
                tracing::warn!(error = %e, "failed to close journal run");
            }
        }
        Ok(summary)
    }

    /// Audio files to process, sorted by path.
    pub fn collect_tracks(&self) -> Result<Vec<PathBuf>> {
        if let Some(single) = self.config.single_file_path() {
            if !single.is_file() {
                return Err(ConfigError::SingleFileMissing(single).into());
            }
            return Ok(vec![single]);
        }

        let mut tracks: Vec<PathBuf> = WalkDir::new(&self.config.layout.tracks)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.config.is_audio_file(e.path()))
            .map(|e| e.into_path())
            .collect();
        tracks.sort();
        Ok(tracks)
    }

    fn process_track(&mut self, path: &Path) -> TrackReport {
        let track = match self.reader.read(path) {
            Ok(track) => track,
            Err(e) => {
                return TrackReport::new(
                    path,
                    None,
                    ProcessingOutcome::Failed(FailureReason::MetadataUnreadable(e.to_string())),
                );
            }
        };
        tracing::debug!(track = %track, "read metadata");

        let plan = self.engine.plan(&track, &self.config.layout.lrc_files);
        let prepared = match plan {
            Plan::Ready(prepared) => prepared,
            other => return TrackReport::new(path, Some(&track), other.expected_outcome()),
        };

        if self.config.dry_run {
            tracing::info!(
                track = %track,
                source = prepared.candidate.source.as_str(),
                lines = prepared.cleaned.line_count(),
                "dry run: would publish"
            );
            return TrackReport::new(
                path,
                Some(&track),
                ProcessingOutcome::Published {
                    source: prepared.candidate.source,
                },
            )
            .with_archive(ArchiveStatus::Skipped);
        }

        if self.config.confirm_before_write && !self.confirm_publish(&track, &prepared) {
            return TrackReport::new(path, Some(&track), ProcessingOutcome::Declined);
        }

        let outcome = self.engine.publish(&track, &prepared);
        if !matches!(outcome, ProcessingOutcome::Published { .. }) {
            return TrackReport::new(path, Some(&track), outcome);
        }

        let archive = self.archive_track(&track, &prepared);
        TrackReport::new(path, Some(&track), outcome).with_archive(archive)
    }

    fn confirm_publish(&mut self, track: &TrackIdentity, prepared: &PreparedLyric) -> bool {
        self.prompter.preview("plain", &prepared.cleaned.plain_text());
        if prepared.cleaned.is_synced() {
            self.prompter.preview("synced", &prepared.cleaned.text);
        }
        self.prompter.confirm(&format!(
            "Publish lyrics for {} (from {})?",
            track,
            prepared.candidate.source.as_str()
        ))
    }

    /// Archive after a confirmed publish. The LRC moves only if it was the published source.
    fn archive_track(&mut self, track: &TrackIdentity, prepared: &PreparedLyric) -> ArchiveStatus {
        let lyric = prepared.candidate.local_path.as_deref();

        if self.config.confirm_before_write {
            let question = match lyric {
                Some(lrc) => format!(
                    "Archive {} and {}?",
                    track.path.display(),
                    lrc.display()
                ),
                None => format!("Archive {}?", track.path.display()),
            };
            if !self.prompter.confirm(&question) {
                return ArchiveStatus::Skipped;
            }
        }

        match self.archive.archive(&track.path, lyric) {
            Ok(receipt) => ArchiveStatus::Archived {
                audio: receipt.audio,
                lyric: receipt.lyric,
            },
            Err(e @ ArchiveError::Partial { .. }) => {
                tracing::error!(track = %track, error = %e, "partial archive, fix manually");
                ArchiveStatus::Partial(e.to_string())
            }
            Err(e) => {
                tracing::error!(track = %track, error = %e, "archive failed, nothing moved");
                ArchiveStatus::Failed(e.to_string())
            }
        }
    }
}

fn log_report(report: &TrackReport) {
    let path = report.path.display();
    match &report.outcome {
        ProcessingOutcome::Failed(reason) => {
            tracing::warn!(%path, reason = %reason, "failed")
        }
        outcome => tracing::info!(
            %path,
            outcome = outcome.label(),
            archive = report.archive.label(),
            "done"
        ),
    }
}
