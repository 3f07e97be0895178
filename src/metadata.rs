//! Audio tag reading.
//!
//! Uses the lofty crate for format-independent metadata access. Only the
//! four fields the lyrics service keys on are read: title, artist, album,
//! and duration rounded to whole seconds.

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::path::Path;

use crate::error::MetadataError;
use crate::models::TrackIdentity;

/// Source of track identities. Implemented by [`TagReader`] and by test fixtures.
pub trait MetadataReader {
    fn read(&self, path: &Path) -> Result<TrackIdentity, MetadataError>;
}

impl<T: MetadataReader + ?Sized> MetadataReader for &T {
    fn read(&self, path: &Path) -> Result<TrackIdentity, MetadataError> {
        (**self).read(path)
    }
}

/// Reads tags and duration from the audio file itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagReader;

impl MetadataReader for TagReader {
    fn read(&self, path: &Path) -> Result<TrackIdentity, MetadataError> {
        let unreadable = |e: lofty::error::LoftyError| MetadataError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        };

        let tagged_file = Probe::open(path)
            .map_err(unreadable)?
            .read()
            .map_err(unreadable)?;

        // Primary tag first, then whatever else the container carries
        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag())
            .ok_or_else(|| MetadataError::Unreadable {
                path: path.to_path_buf(),
                message: "no tags".to_string(),
            })?;

        let title = non_empty(tag.title().map(|s| s.to_string())).ok_or(
            MetadataError::MissingField {
                path: path.to_path_buf(),
                field: "title",
            },
        )?;
        let artist = non_empty(tag.artist().map(|s| s.to_string())).ok_or(
            MetadataError::MissingField {
                path: path.to_path_buf(),
                field: "artist",
            },
        )?;
        let album = non_empty(tag.album().map(|s| s.to_string()));

        let duration_sec = round_duration(tagged_file.properties().duration().as_secs_f64())
            .ok_or_else(|| MetadataError::InvalidDuration {
                path: path.to_path_buf(),
            })?;

        Ok(TrackIdentity {
            path: path.to_path_buf(),
            title,
            artist,
            album,
            duration_sec,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Round to whole seconds; zero and non-finite durations are rejected.
pub fn round_duration(secs: f64) -> Option<u32> {
    if !secs.is_finite() {
        return None;
    }
    let rounded = secs.round();
    if rounded < 1.0 || rounded > u32::MAX as f64 {
        return None;
    }
    Some(rounded as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_round_duration() {
        assert_eq!(round_duration(215.4), Some(215));
        assert_eq!(round_duration(215.5), Some(216));
        assert_eq!(round_duration(0.2), None);
        assert_eq!(round_duration(f64::NAN), None);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  Song ".into())), Some("Song".into()));
        assert_eq!(non_empty(Some("   ".into())), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_garbage_file_is_unreadable() {
        let file = NamedTempFile::with_suffix(".mp3").unwrap();
        std::fs::write(file.path(), b"definitely not audio").unwrap();
        let err = TagReader.read(file.path()).unwrap_err();
        assert!(matches!(err, MetadataError::Unreadable { .. }));
    }
}
