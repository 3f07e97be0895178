//! Run configuration.
//!
//! A [`RunConfig`] is assembled once per run from an optional TOML file and
//! the command line, CLI values winning, then passed down explicitly.
//!
//! ```toml
//! root = "/music/upload"
//! done_tracks = "/music/archive/tracks"
//! threshold = 0.9
//! extensions = ["mp3", "flac"]
//!
//! [api]
//! base_url = "https://lrclib.net/api"
//! timeout_secs = 30
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::safety::validate_layout;
use crate::scoring::DEFAULT_MATCH_THRESHOLD;
use crate::store::{DEFAULT_API_BASE, DEFAULT_USER_AGENT};

pub const DEFAULT_EXTENSIONS: &[&str] = &["mp3", "flac", "m4a", "ogg", "opus", "wav"];
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const TRACKS_DIR: &str = "tracks";
pub const LRC_FILES_DIR: &str = "lrc-files";
pub const DONE_TRACKS_DIR: &str = "done-tracks";
pub const DONE_LRC_FILES_DIR: &str = "done-lrc-files";

// ============================================================================
// File config
// ============================================================================

/// Contents of the optional TOML config file. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub root: Option<PathBuf>,
    pub tracks: Option<PathBuf>,
    pub lrc_files: Option<PathBuf>,
    pub done_tracks: Option<PathBuf>,
    pub done_lrc_files: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub extensions: Option<Vec<String>>,
    pub journal: Option<PathBuf>,
    pub api: FileApiConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileApiConfig {
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&text).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}

/// Values taken from the command line. `None` defers to the file, then to defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub tracks: Option<PathBuf>,
    pub lrc_files: Option<PathBuf>,
    pub done_tracks: Option<PathBuf>,
    pub done_lrc_files: Option<PathBuf>,
    pub api_base: Option<String>,
    pub threshold: Option<f64>,
    pub extensions: Option<Vec<String>>,
    pub journal: Option<PathBuf>,
    pub single: Option<PathBuf>,
    pub yes: bool,
    pub dry_run: bool,
}

// ============================================================================
// Layout
// ============================================================================

/// The four directories a run works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryLayout {
    pub tracks: PathBuf,
    pub lrc_files: PathBuf,
    pub done_tracks: PathBuf,
    pub done_lrc_files: PathBuf,
}

impl LibraryLayout {
    /// Default directory names under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            tracks: root.join(TRACKS_DIR),
            lrc_files: root.join(LRC_FILES_DIR),
            done_tracks: root.join(DONE_TRACKS_DIR),
            done_lrc_files: root.join(DONE_LRC_FILES_DIR),
        }
    }

    pub fn sources(&self) -> [(&'static str, &Path); 2] {
        [(TRACKS_DIR, &self.tracks), (LRC_FILES_DIR, &self.lrc_files)]
    }

    pub fn done(&self) -> [(&'static str, &Path); 2] {
        [
            (DONE_TRACKS_DIR, &self.done_tracks),
            (DONE_LRC_FILES_DIR, &self.done_lrc_files),
        ]
    }

    /// Startup checks. Source directories must exist. Done directories are
    /// created, except in dry-run where they only have to be creatable.
    pub fn prepare(&self, dry_run: bool) -> Result<(), ConfigError> {
        validate_layout(self)?;

        for (role, path) in self.sources() {
            if !path.is_dir() {
                return Err(ConfigError::MissingDir {
                    role,
                    path: path.to_path_buf(),
                });
            }
        }

        for (role, path) in self.done() {
            if dry_run {
                if !is_creatable(path) {
                    return Err(ConfigError::CreateDir {
                        role,
                        path: path.to_path_buf(),
                        source: std::io::Error::new(
                            std::io::ErrorKind::Other,
                            "nearest existing ancestor is not a directory",
                        ),
                    });
                }
            } else {
                fs::create_dir_all(path).map_err(|source| ConfigError::CreateDir {
                    role,
                    path: path.to_path_buf(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

/// A directory that exists, or whose nearest existing ancestor is a directory.
fn is_creatable(path: &Path) -> bool {
    path.ancestors()
        .find(|p| p.exists())
        .map(|p| p.is_dir())
        .unwrap_or(false)
}

// ============================================================================
// Run config
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub confirm_before_write: bool,
    pub dry_run: bool,
    pub single_file: Option<PathBuf>,
    pub layout: LibraryLayout,
    pub match_threshold: f64,
    /// Lowercase, without the leading dot
    pub extensions: Vec<String>,
    pub journal: Option<PathBuf>,
    pub api: ApiConfig,
}

impl RunConfig {
    /// Defaults for a library rooted at `root`: confirm mode, live run.
    pub fn new(root: &Path) -> Self {
        Self {
            confirm_before_write: true,
            dry_run: false,
            single_file: None,
            layout: LibraryLayout::under(root),
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            journal: None,
            api: ApiConfig::default(),
        }
    }

    /// Merge file values and CLI overrides; the CLI wins.
    pub fn build(file: &FileConfig, cli: Overrides) -> Result<Self, ConfigError> {
        let root = cli
            .root
            .or_else(|| file.root.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        let mut config = Self::new(&root);

        let pick = |cli: Option<PathBuf>, file: &Option<PathBuf>, default: PathBuf| {
            cli.or_else(|| file.clone()).unwrap_or(default)
        };
        config.layout = LibraryLayout {
            tracks: pick(cli.tracks, &file.tracks, config.layout.tracks),
            lrc_files: pick(cli.lrc_files, &file.lrc_files, config.layout.lrc_files),
            done_tracks: pick(cli.done_tracks, &file.done_tracks, config.layout.done_tracks),
            done_lrc_files: pick(
                cli.done_lrc_files,
                &file.done_lrc_files,
                config.layout.done_lrc_files,
            ),
        };

        config.confirm_before_write = !cli.yes;
        config.dry_run = cli.dry_run;
        config.single_file = cli.single;
        config.journal = cli.journal.or_else(|| file.journal.clone());

        if let Some(threshold) = cli.threshold.or(file.threshold) {
            config.match_threshold = threshold;
        }
        if let Some(exts) = cli.extensions.or_else(|| file.extensions.clone()) {
            config.extensions = normalize_extensions(&exts);
        }

        if let Some(base) = cli.api_base.or_else(|| file.api.base_url.clone()) {
            config.api.base_url = base;
        }
        if let Some(ua) = &file.api.user_agent {
            config.api.user_agent = ua.clone();
        }
        if let Some(secs) = file.api.timeout_secs {
            config.api.timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.match_threshold > 0.0 && self.match_threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(self.match_threshold));
        }
        Ok(())
    }

    /// The single file to process, relative to the tracks directory unless absolute.
    pub fn single_file_path(&self) -> Option<PathBuf> {
        self.single_file.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                self.layout.tracks.join(p)
            }
        })
    }

    pub fn is_audio_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

/// Lowercase, strip leading dots, drop empties and duplicates.
pub fn normalize_extensions(exts: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for ext in exts {
        let e = ext.trim().trim_start_matches('.').to_lowercase();
        if !e.is_empty() && !out.contains(&e) {
            out.push(e);
        }
    }
    out
}
