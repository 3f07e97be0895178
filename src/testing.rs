//! Test doubles shared by the engine and batch tests.

use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::config::{LibraryLayout, RunConfig};
use crate::error::{MetadataError, SignerError, StoreError};
use crate::metadata::MetadataReader;
use crate::models::TrackIdentity;
use crate::pow::{ProofOfWorkSigner, PublishToken};
use crate::prompt::Prompter;
use crate::store::{Lookup, LyricStore, PublishRequest, RemoteLyric};

// ============================================================================
// Store
// ============================================================================

/// In-memory lyrics service keyed by track title. A successful publish makes
/// the track visible to later cached lookups, like the real service.
#[derive(Default)]
pub struct MockStore {
    pub cached: RefCell<FxHashMap<String, RemoteLyric>>,
    pub external: FxHashMap<String, RemoteLyric>,
    pub lookup_error: Option<StoreError>,
    pub publish_error: Option<StoreError>,
    pub unreachable: bool,
    pub calls: RefCell<Vec<String>>,
    pub published: RefCell<Vec<PublishRequest>>,
}

impl MockStore {
    pub fn with_cached(self, title: &str) -> Self {
        self.cached.borrow_mut().insert(title.to_string(), synced_record("[00:01.00]cached"));
        self
    }

    pub fn with_external(mut self, title: &str, record: RemoteLyric) -> Self {
        self.external.insert(title.to_string(), record);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.published.borrow().len()
    }

    fn log(&self, call: &str, title: &str) {
        self.calls.borrow_mut().push(format!("{}:{}", call, title));
    }
}

pub fn synced_record(text: &str) -> RemoteLyric {
    RemoteLyric {
        synced_lyrics: Some(text.to_string()),
        ..Default::default()
    }
}

impl LyricStore for MockStore {
    fn check_reachable(&self) -> Result<(), StoreError> {
        if self.unreachable {
            Err(StoreError::Network("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn get_cached(&self, track: &TrackIdentity) -> Result<Lookup, StoreError> {
        self.log("get_cached", &track.title);
        if let Some(e) = &self.lookup_error {
            return Err(e.clone());
        }
        Ok(match self.cached.borrow().get(&track.title) {
            Some(r) => Lookup::Found(r.clone()),
            None => Lookup::NotFound,
        })
    }

    fn get_external(&self, track: &TrackIdentity) -> Result<Lookup, StoreError> {
        self.log("get", &track.title);
        if let Some(e) = &self.lookup_error {
            return Err(e.clone());
        }
        Ok(match self.external.get(&track.title) {
            Some(r) => Lookup::Found(r.clone()),
            None => Lookup::NotFound,
        })
    }

    fn publish(&self, request: &PublishRequest, _token: &PublishToken) -> Result<(), StoreError> {
        self.log("publish", &request.track_name);
        if let Some(e) = &self.publish_error {
            return Err(e.clone());
        }
        self.published.borrow_mut().push(request.clone());
        self.cached.borrow_mut().insert(
            request.track_name.clone(),
            RemoteLyric {
                plain_lyrics: Some(request.plain_lyrics.clone()),
                synced_lyrics: request.synced_lyrics.clone(),
                ..Default::default()
            },
        );
        Ok(())
    }
}

// ============================================================================
// Signer
// ============================================================================

#[derive(Default)]
pub struct MockSigner {
    pub fail: bool,
    /// Hand out tokens bound to other content
    pub tamper: bool,
    pub signed: RefCell<Vec<(u32, String)>>,
}

impl MockSigner {
    pub fn sign_count(&self) -> usize {
        self.signed.borrow().len()
    }
}

impl ProofOfWorkSigner for MockSigner {
    fn sign(&self, duration_sec: u32, text: &str) -> Result<PublishToken, SignerError> {
        if self.fail {
            return Err(SignerError::Exhausted(0));
        }
        self.signed.borrow_mut().push((duration_sec, text.to_string()));
        if self.tamper {
            Ok(PublishToken::new("mock:0", duration_sec + 1, text))
        } else {
            Ok(PublishToken::new("mock:0", duration_sec, text))
        }
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// Tags keyed by audio path. Unknown paths are unreadable.
#[derive(Default)]
pub struct MapReader {
    pub tracks: FxHashMap<PathBuf, TrackIdentity>,
    pub reads: Cell<usize>,
}

impl MapReader {
    pub fn insert(&mut self, track: TrackIdentity) {
        self.tracks.insert(track.path.clone(), track);
    }
}

impl MetadataReader for MapReader {
    fn read(&self, path: &Path) -> Result<TrackIdentity, MetadataError> {
        self.reads.set(self.reads.get() + 1);
        self.tracks
            .get(path)
            .cloned()
            .ok_or_else(|| MetadataError::Unreadable {
                path: path.to_path_buf(),
                message: "no tags".into(),
            })
    }
}

// ============================================================================
// Prompter
// ============================================================================

/// Answers questions from a script, then falls back to `default_answer`.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub answers: VecDeque<bool>,
    pub default_answer: bool,
    pub questions: Vec<String>,
    pub previews: Vec<String>,
}

impl ScriptedPrompter {
    pub fn always(answer: bool) -> Self {
        Self {
            default_answer: answer,
            ..Default::default()
        }
    }

    pub fn scripted(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            ..Default::default()
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_string());
        self.answers.pop_front().unwrap_or(self.default_answer)
    }

    fn preview(&mut self, label: &str, _text: &str) {
        self.previews.push(label.to_string());
    }
}

// ============================================================================
// Library on disk
// ============================================================================

pub struct LibraryFixture {
    pub dir: TempDir,
    pub layout: LibraryLayout,
}

impl LibraryFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let layout = LibraryLayout::under(dir.path());
        fs::create_dir_all(&layout.tracks).unwrap();
        fs::create_dir_all(&layout.lrc_files).unwrap();
        Self { dir, layout }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Run config for this library in non-interactive mode.
    pub fn config(&self) -> RunConfig {
        let mut config = RunConfig::new(self.root());
        config.confirm_before_write = false;
        config
    }

    /// Write a placeholder audio file and return its tags.
    pub fn add_track(&self, rel: &str, artist: &str, title: &str) -> TrackIdentity {
        let path = self.layout.tracks.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("audio:{}", title)).unwrap();
        TrackIdentity::new(path, title, artist, None, 200)
    }

    pub fn add_lrc(&self, rel: &str, body: &str) -> PathBuf {
        let path = self.layout.lrc_files.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    /// Every file under the root with its bytes, keyed by relative path.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        WalkDir::new(self.root())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(self.root()).unwrap().to_path_buf();
                (rel, fs::read(e.path()).unwrap())
            })
            .collect()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.root().join(rel).exists()
    }
}
