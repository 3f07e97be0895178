//! Safety checks on the directory layout.
//!
//! Archiving moves files out of the source trees. If a done directory sat
//! inside a source directory, the next scan would pick archived files up again
//! (and a done directory equal to a source would turn every move into a
//! no-op collision). These checks run before anything touches the disk.

use std::path::{Component, Path, PathBuf};

use crate::config::LibraryLayout;
use crate::error::ConfigError;

/// Validates that the four layout directories cannot interfere with each other.
///
/// Checks:
/// - No two directories are the same path
/// - No directory is nested inside another
///
/// Paths are compared lexically after removing `.` components, so the check
/// works for directories that do not exist yet.
pub fn validate_layout(layout: &LibraryLayout) -> Result<(), ConfigError> {
    let dirs: Vec<(&str, PathBuf)> = layout
        .sources()
        .into_iter()
        .chain(layout.done())
        .map(|(role, path)| (role, lexical(path)))
        .collect();

    for (i, (role_a, a)) in dirs.iter().enumerate() {
        for (role_b, b) in dirs.iter().skip(i + 1) {
            if a == b {
                return Err(ConfigError::UnsafeLayout(format!(
                    "Safety check failed: {} and {} are the same directory '{}'",
                    role_a,
                    role_b,
                    a.display()
                )));
            }
            if b.starts_with(a) || a.starts_with(b) {
                let (outer, inner) = if b.starts_with(a) {
                    ((role_a, a), (role_b, b))
                } else {
                    ((role_b, b), (role_a, a))
                };
                return Err(ConfigError::UnsafeLayout(format!(
                    "Safety check failed: {} '{}' is nested inside {} '{}'",
                    inner.0,
                    inner.1.display(),
                    outer.0,
                    outer.1.display()
                )));
            }
        }
    }
    Ok(())
}

fn lexical(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}
