//! LRCLIB HTTP client.
//!
//! Blocking round-trips only; the pipeline resolves one track at a time.
//!
//! API: https://lrclib.net/docs
//! - `GET  /api/get-cached`        lyrics already ingested by LRCLIB
//! - `GET  /api/get`               same, plus LRCLIB's external aggregation
//! - `POST /api/request-challenge` proof-of-work challenge
//! - `POST /api/publish`           publish, requires `X-Publish-Token`

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::StoreError;
use crate::lyrics::CleanedLyric;
use crate::models::{LyricCandidate, TrackIdentity};
use crate::pow::{Challenge, ChallengeSource, PublishToken};

pub const DEFAULT_API_BASE: &str = "https://lrclib.net/api";
pub const DEFAULT_USER_AGENT: &str = concat!("lrclib-upload/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// DTOs
// ============================================================================

/// A lyric record as returned by the get endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLyric {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub track_name: Option<String>,
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub album_name: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub instrumental: bool,
    #[serde(default)]
    pub plain_lyrics: Option<String>,
    #[serde(default)]
    pub synced_lyrics: Option<String>,
}

impl RemoteLyric {
    /// Synced text when present, plain text otherwise. Blank strings count as absent.
    pub fn into_candidate(self) -> Option<LyricCandidate> {
        let present = |s: Option<String>| s.filter(|t| !t.trim().is_empty());
        if let Some(synced) = present(self.synced_lyrics) {
            return Some(LyricCandidate::external(synced, true));
        }
        present(self.plain_lyrics).map(|plain| LyricCandidate::external(plain, false))
    }
}

/// Tagged result of a lookup. A 404 is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(RemoteLyric),
    NotFound,
}

/// Body of `POST /api/publish`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub duration: u32,
    pub plain_lyrics: String,
    pub synced_lyrics: Option<String>,
}

impl PublishRequest {
    pub fn new(track: &TrackIdentity, lyric: &CleanedLyric) -> Self {
        Self {
            track_name: track.title.clone(),
            artist_name: track.artist.clone(),
            album_name: track.album.clone().unwrap_or_default(),
            duration: track.duration_sec,
            plain_lyrics: lyric.plain_text(),
            synced_lyrics: lyric.is_synced().then(|| lyric.text.clone()),
        }
    }
}

/// Error body returned by LRCLIB on 4xx/5xx.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ============================================================================
// Store trait
// ============================================================================

/// The shared lyrics service, as seen by the resolution engine.
pub trait LyricStore {
    /// Startup probe. Any HTTP answer counts as reachable.
    fn check_reachable(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn get_cached(&self, track: &TrackIdentity) -> Result<Lookup, StoreError>;

    fn get_external(&self, track: &TrackIdentity) -> Result<Lookup, StoreError>;

    fn publish(&self, request: &PublishRequest, token: &PublishToken) -> Result<(), StoreError>;
}

impl<T: LyricStore + ?Sized> LyricStore for &T {
    fn check_reachable(&self) -> Result<(), StoreError> {
        (**self).check_reachable()
    }

    fn get_cached(&self, track: &TrackIdentity) -> Result<Lookup, StoreError> {
        (**self).get_cached(track)
    }

    fn get_external(&self, track: &TrackIdentity) -> Result<Lookup, StoreError> {
        (**self).get_external(track)
    }

    fn publish(&self, request: &PublishRequest, token: &PublishToken) -> Result<(), StoreError> {
        (**self).publish(request, token)
    }
}

// ============================================================================
// LRCLIB client
// ============================================================================

#[derive(Debug, Clone)]
pub struct LrclibClient {
    http: Client,
    base_url: String,
}

impl LrclibClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self, StoreError> {
        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn lookup(&self, endpoint: &str, track: &TrackIdentity) -> Result<Lookup, StoreError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .query(&lookup_params(track))
            .send()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        tracing::debug!(%url, status = %response.status(), "lookup");

        match response.status() {
            StatusCode::NOT_FOUND => Ok(Lookup::NotFound),
            s if s.is_success() => response
                .json::<RemoteLyric>()
                .map(Lookup::Found)
                .map_err(|e| StoreError::Decode(e.to_string())),
            _ => Err(service_error(response)),
        }
    }
}

/// Query string shared by both get endpoints.
pub fn lookup_params(track: &TrackIdentity) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("track_name", track.title.clone()),
        ("artist_name", track.artist.clone()),
    ];
    if let Some(album) = &track.album {
        params.push(("album_name", album.clone()));
    }
    params.push(("duration", track.duration_sec.to_string()));
    params
}

fn service_error(response: Response) -> StoreError {
    let status = response.status();
    let message = response
        .json::<ApiError>()
        .ok()
        .and_then(|e| match (e.name, e.message) {
            (Some(name), Some(msg)) => Some(format!("{}: {}", name, msg)),
            (name, msg) => name.or(msg),
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
    StoreError::Service {
        status: status.as_u16(),
        message,
    }
}

impl LyricStore for LrclibClient {
    fn check_reachable(&self) -> Result<(), StoreError> {
        self.http
            .get(&self.base_url)
            .send()
            .map(|_| ())
            .map_err(|e| StoreError::Network(e.to_string()))
    }

    fn get_cached(&self, track: &TrackIdentity) -> Result<Lookup, StoreError> {
        self.lookup("get-cached", track)
    }

    fn get_external(&self, track: &TrackIdentity) -> Result<Lookup, StoreError> {
        self.lookup("get", track)
    }

    fn publish(&self, request: &PublishRequest, token: &PublishToken) -> Result<(), StoreError> {
        let url = format!("{}/publish", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("X-Publish-Token", token.value())
            .json(request)
            .send()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(service_error(response))
        }
    }
}

impl ChallengeSource for LrclibClient {
    fn request_challenge(&self) -> Result<Challenge, StoreError> {
        let url = format!("{}/request-challenge", self.base_url);
        let response = self
            .http
            .post(&url)
            .send()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(service_error(response));
        }
        response
            .json::<Challenge>()
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lyrics::clean;
    use crate::models::SourceKind;

    #[test]
    fn test_remote_lyric_decodes_lrclib_shape() {
        let json = r#"{
            "id": 3396226,
            "trackName": "I Want to Live",
            "artistName": "Borislav Slavov",
            "albumName": "Baldur's Gate 3 (Original Game Soundtrack)",
            "duration": 233,
            "instrumental": false,
            "plainLyrics": "I feel your breath",
            "syncedLyrics": "[00:17.12] I feel your breath"
        }"#;
        let record: RemoteLyric = serde_json::from_str(json).unwrap();
        assert_eq!(record.duration, Some(233.0));
        let candidate = record.into_candidate().unwrap();
        assert_eq!(candidate.source, SourceKind::ExternalRemote);
        assert!(candidate.is_synced);
        assert_eq!(candidate.raw_text, "[00:17.12] I feel your breath");
    }

    #[test]
    fn test_remote_lyric_falls_back_to_plain() {
        let record = RemoteLyric {
            plain_lyrics: Some("plain words".into()),
            synced_lyrics: Some("   ".into()),
            ..Default::default()
        };
        let candidate = record.into_candidate().unwrap();
        assert!(!candidate.is_synced);
        assert_eq!(candidate.raw_text, "plain words");
    }

    #[test]
    fn test_instrumental_record_has_no_candidate() {
        let record = RemoteLyric {
            instrumental: true,
            ..Default::default()
        };
        assert!(record.into_candidate().is_none());
    }

    #[test]
    fn test_publish_request_shape() {
        let track = TrackIdentity::new("/t/a.mp3", "SongA", "Artist", None, 200);
        let lyric = clean("[00:01.00]Hello\n[00:02.00]World");
        let body = serde_json::to_value(PublishRequest::new(&track, &lyric)).unwrap();
        assert_eq!(body["trackName"], "SongA");
        assert_eq!(body["artistName"], "Artist");
        assert_eq!(body["albumName"], "");
        assert_eq!(body["duration"], 200);
        assert_eq!(body["plainLyrics"], "Hello\nWorld");
        assert_eq!(body["syncedLyrics"], "[00:01.00]Hello\n[00:02.00]World");
    }

    #[test]
    fn test_publish_request_plain_only() {
        let track = TrackIdentity::new("/t/a.mp3", "SongA", "Artist", Some("Album".into()), 200);
        let body = serde_json::to_value(PublishRequest::new(&track, &clean("Hello"))).unwrap();
        assert_eq!(body["albumName"], "Album");
        assert!(body["syncedLyrics"].is_null());
    }

    #[test]
    fn test_lookup_params_skip_missing_album() {
        let track = TrackIdentity::new("/t/a.mp3", "SongA", "Artist", None, 200);
        let params = lookup_params(&track);
        assert_eq!(
            params,
            vec![
                ("track_name", "SongA".to_string()),
                ("artist_name", "Artist".to_string()),
                ("duration", "200".to_string()),
            ]
        );
    }

    #[test]
    fn test_default_user_agent_names_this_tool() {
        assert_eq!(
            DEFAULT_USER_AGENT,
            format!("lrclib-upload/{}", env!("CARGO_PKG_VERSION"))
        );
        assert!(!DEFAULT_USER_AGENT.contains("github.com"));
    }

    #[test]
    fn test_client_trims_base_url() {
        let client =
            LrclibClient::new("https://lrclib.net/api/", DEFAULT_USER_AGENT, Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.base_url(), "https://lrclib.net/api");
    }
}
