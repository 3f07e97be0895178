//! Moving processed inputs into the done directories.
//!
//! An archive is planned in full before any file moves: both destinations are
//! computed and checked for collisions, and both sources must still exist.
//! Only then is the audio moved, followed by the lyric. A failure after the
//! audio move is reported as [`ArchiveError::Partial`] and left for the
//! operator; nothing is moved back.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::LibraryLayout;
use crate::error::ArchiveError;

/// Source and done roots for audio and lyric files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveManager {
    audio_root: PathBuf,
    lyric_root: PathBuf,
    done_audio: PathBuf,
    done_lyrics: PathBuf,
}

/// A planned relocation of one audio file and, optionally, its LRC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMove {
    pub audio_from: PathBuf,
    pub audio_to: PathBuf,
    pub lyric: Option<(PathBuf, PathBuf)>,
}

/// Where the files ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReceipt {
    pub audio: PathBuf,
    pub lyric: Option<PathBuf>,
}

impl ArchiveManager {
    pub fn new(
        audio_root: impl Into<PathBuf>,
        lyric_root: impl Into<PathBuf>,
        done_audio: impl Into<PathBuf>,
        done_lyrics: impl Into<PathBuf>,
    ) -> Self {
        Self {
            audio_root: audio_root.into(),
            lyric_root: lyric_root.into(),
            done_audio: done_audio.into(),
            done_lyrics: done_lyrics.into(),
        }
    }

    pub fn from_layout(layout: &LibraryLayout) -> Self {
        Self::new(
            &layout.tracks,
            &layout.lrc_files,
            &layout.done_tracks,
            &layout.done_lrc_files,
        )
    }

    /// Compute destinations and run every pre-move check.
    pub fn plan(&self, audio: &Path, lyric: Option<&Path>) -> Result<ArchiveMove, ArchiveError> {
        let audio_to = destination(audio, &self.audio_root, &self.done_audio);
        check_movable(audio, &audio_to)?;

        let lyric = match lyric {
            Some(from) => {
                let to = destination(from, &self.lyric_root, &self.done_lyrics);
                check_movable(from, &to)?;
                Some((from.to_path_buf(), to))
            }
            None => None,
        };

        Ok(ArchiveMove {
            audio_from: audio.to_path_buf(),
            audio_to,
            lyric,
        })
    }

    /// Move the audio file and, when given, the local LRC that was published.
    pub fn archive(&self, audio: &Path, lyric: Option<&Path>) -> Result<ArchiveReceipt, ArchiveError> {
        let plan = self.plan(audio, lyric)?;
        self.execute(&plan)
    }

    pub fn execute(&self, plan: &ArchiveMove) -> Result<ArchiveReceipt, ArchiveError> {
        move_file(&plan.audio_from, &plan.audio_to)?;
        tracing::info!(from = %plan.audio_from.display(), to = %plan.audio_to.display(), "archived audio");

        let lyric = match &plan.lyric {
            Some((from, to)) => {
                move_file(from, to).map_err(|cause| ArchiveError::Partial {
                    audio: plan.audio_to.clone(),
                    cause: Box::new(cause),
                })?;
                tracing::info!(from = %from.display(), to = %to.display(), "archived lyric");
                Some(to.clone())
            }
            None => None,
        };

        Ok(ArchiveReceipt {
            audio: plan.audio_to.clone(),
            lyric,
        })
    }
}

/// `done_root` joined with the path of `file` relative to `source_root`.
/// Files outside the source root keep only their file name.
pub fn destination(file: &Path, source_root: &Path, done_root: &Path) -> PathBuf {
    match file.strip_prefix(source_root) {
        Ok(rel) if !rel.as_os_str().is_empty() => done_root.join(rel),
        _ => done_root.join(file.file_name().unwrap_or(file.as_os_str())),
    }
}

fn check_movable(from: &Path, to: &Path) -> Result<(), ArchiveError> {
    if !from.is_file() {
        return Err(ArchiveError::SourceMissing(from.to_path_buf()));
    }
    if to.exists() {
        return Err(ArchiveError::DestinationExists(to.to_path_buf()));
    }
    Ok(())
}

/// Rename, falling back to copy + remove across filesystems. Never overwrites.
fn move_file(from: &Path, to: &Path) -> Result<(), ArchiveError> {
    let io_err = |source| ArchiveError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if !from.is_file() {
        return Err(ArchiveError::SourceMissing(from.to_path_buf()));
    }
    if to.exists() {
        return Err(ArchiveError::DestinationExists(to.to_path_buf()));
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(error = %rename_err, "rename failed, copying instead");
            fs::copy(from, to).map_err(io_err)?;
            fs::remove_file(from).map_err(io_err)
        }
    }
}
