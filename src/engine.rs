//! Per-track lyric resolution.
//!
//! Sources are consulted in a fixed priority order and the first one that
//! yields a usable lyric wins:
//!
//! 1. cached lookup on the service: if present there is nothing to do
//! 2. external lookup on the service
//! 3. a local LRC file
//!
//! [`ResolutionEngine::plan`] covers the read-only part (lookups, local
//! match, cleaning). [`ResolutionEngine::publish`] signs and uploads a
//! prepared lyric. The orchestrator puts dry-run and confirmation between
//! the two. The engine never writes to the filesystem.

use std::path::Path;

use crate::locator::LocalLyricLocator;
use crate::lyrics::{clean, CleanedLyric};
use crate::models::{FailureReason, LyricCandidate, ProcessingOutcome, TrackIdentity};
use crate::pow::ProofOfWorkSigner;
use crate::store::{Lookup, LyricStore, PublishRequest, RemoteLyric};

/// Remote and local durations further apart than this get a warning.
pub const DURATION_TOLERANCE_SEC: f64 = 2.0;

/// A chosen candidate together with its cleaned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedLyric {
    pub candidate: LyricCandidate,
    pub cleaned: CleanedLyric,
}

/// Result of the read-only phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    AlreadyCached,
    NoLyricFound,
    Ready(PreparedLyric),
    Failed(FailureReason),
}

impl Plan {
    /// The outcome this plan reaches if publishing succeeds.
    pub fn expected_outcome(&self) -> ProcessingOutcome {
        match self {
            Plan::AlreadyCached => ProcessingOutcome::AlreadyCached,
            Plan::NoLyricFound => ProcessingOutcome::NoLyricFound,
            Plan::Ready(prepared) => ProcessingOutcome::Published {
                source: prepared.candidate.source,
            },
            Plan::Failed(reason) => ProcessingOutcome::Failed(reason.clone()),
        }
    }
}

pub struct ResolutionEngine<S, P> {
    store: S,
    signer: P,
    locator: LocalLyricLocator,
}

impl<S: LyricStore, P: ProofOfWorkSigner> ResolutionEngine<S, P> {
    pub fn new(store: S, signer: P, locator: LocalLyricLocator) -> Self {
        Self {
            store,
            signer,
            locator,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lookups, local match and cleaning. No writes of any kind.
    pub fn plan(&self, track: &TrackIdentity, lrc_root: &Path) -> Plan {
        match self.store.get_cached(track) {
            Ok(Lookup::Found(record)) => {
                warn_on_duration_mismatch(track, &record, "cached");
                return Plan::AlreadyCached;
            }
            Ok(Lookup::NotFound) => {}
            Err(e) => return Plan::Failed(e.into()),
        }

        match self.store.get_external(track) {
            Ok(Lookup::Found(record)) => {
                warn_on_duration_mismatch(track, &record, "external");
                match record.into_candidate().and_then(prepare) {
                    Some(prepared) => return Plan::Ready(prepared),
                    None => tracing::debug!(track = %track, "external record has no usable lyric"),
                }
            }
            Ok(Lookup::NotFound) => {}
            Err(e) => return Plan::Failed(e.into()),
        }

        match self.locator.find(track, lrc_root) {
            Ok(Some(candidate)) => match prepare(candidate) {
                Some(prepared) => Plan::Ready(prepared),
                None => {
                    tracing::warn!(track = %track, "local lyric is empty after cleaning");
                    Plan::NoLyricFound
                }
            },
            Ok(None) => Plan::NoLyricFound,
            Err(e) => Plan::Failed(FailureReason::LocalRead(e.to_string())),
        }
    }

    /// Sign and upload a prepared lyric. Not retried on failure.
    pub fn publish(&self, track: &TrackIdentity, prepared: &PreparedLyric) -> ProcessingOutcome {
        let text = &prepared.cleaned.text;
        let token = match self.signer.sign(track.duration_sec, text) {
            Ok(token) => token,
            Err(e) => return ProcessingOutcome::Failed(FailureReason::Signer(e.to_string())),
        };
        if !token.is_bound_to(track.duration_sec, text) {
            return ProcessingOutcome::Failed(FailureReason::TokenMismatch);
        }

        let request = PublishRequest::new(track, &prepared.cleaned);
        match self.store.publish(&request, &token) {
            Ok(()) => {
                tracing::info!(
                    track = %track,
                    source = prepared.candidate.source.as_str(),
                    synced = prepared.cleaned.is_synced(),
                    "published"
                );
                ProcessingOutcome::Published {
                    source: prepared.candidate.source,
                }
            }
            Err(e) => ProcessingOutcome::Failed(e.into()),
        }
    }

    /// `plan` followed by `publish`, with no prompt in between.
    pub fn resolve(&self, track: &TrackIdentity, lrc_root: &Path) -> ProcessingOutcome {
        match self.plan(track, lrc_root) {
            Plan::Ready(prepared) => self.publish(track, &prepared),
            other => other.expected_outcome(),
        }
    }
}

/// Clean a candidate; `None` if nothing remains.
fn prepare(candidate: LyricCandidate) -> Option<PreparedLyric> {
    let cleaned = clean(&candidate.raw_text);
    if cleaned.is_empty() {
        return None;
    }
    Some(PreparedLyric { candidate, cleaned })
}

fn warn_on_duration_mismatch(track: &TrackIdentity, record: &RemoteLyric, lookup: &str) {
    if let Some(remote) = record.duration {
        let diff = (remote - f64::from(track.duration_sec)).abs();
        if diff > DURATION_TOLERANCE_SEC {
            tracing::warn!(
                track = %track,
                lookup,
                remote_duration = remote,
                "remote duration differs by {:.1}s",
                diff
            );
        }
    }
}
