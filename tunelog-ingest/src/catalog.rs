//! Music catalog API client
//!
//! Thin typed client over the catalog's REST API: track search with an
//! artist-qualified query and a bare-title fallback, plus lookups for
//! tracks, artists, albums and precomputed audio features.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use tunelog_common::config::CatalogAuth;

/// Catalog base URL used when neither CLI nor config provides one
pub const DEFAULT_BASE_URL: &str = "https://api.spotify.com/v1";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Catalog API failures, split by how callers should react
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog has no entry for the query
    #[error("not found: {0}")]
    NotFound(String),

    /// Network trouble, rate limiting or server errors; retryable
    #[error("transient catalog failure: {0}")]
    Transient(String),

    /// The catalog answered with something we cannot interpret
    #[error("malformed catalog response: {0}")]
    Malformed(String),

    #[error("HTTP client init failed: {0}")]
    Init(String),
}

/// Track search / lookup result
#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    pub id: String,
    pub name: String,
    pub popularity: u32,
    pub preview_url: Option<String>,
    pub album: AlbumRef,
    pub artists: Vec<ArtistRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistObject {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub popularity: u32,
    pub followers: Followers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Followers {
    pub total: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumObject {
    pub id: String,
    pub name: String,
    pub popularity: u32,
}

/// Precomputed perceptual descriptors served by the catalog
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AudioFeatures {
    pub danceability: f64,
    pub energy: f64,
    pub key: i32,
    pub loudness: f64,
    pub mode: i32,
    pub speechiness: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    pub valence: f64,
    pub tempo: f64,
    pub duration_ms: u64,
    pub time_signature: i32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SearchTracks,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    items: Vec<TrackObject>,
}

/// Authenticated catalog API client
pub struct CatalogClient {
    http: reqwest::Client,
    auth: CatalogAuth,
}

impl CatalogClient {
    pub fn new(auth: CatalogAuth) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tunelog/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Init(e.to_string()))?;
        Ok(Self { http, auth })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, CatalogError> {
        let url = format!("{}/{}", self.auth.base_url.trim_end_matches('/'), path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.auth.bearer_token)
            .query(query)
            .send()
            .await
            .map_err(|e| CatalogError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, path));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Malformed(format!("{}: {}", path, e)))
    }

    /// Find the catalog entry for a (track, artist) pair.
    ///
    /// The first query qualifies the title with the artist. If that
    /// returns nothing, a bare-title query is tried. In both passes an
    /// exact (trimmed) artist-and-title match is preferred; failing
    /// that, the first result wins. Two different exact hits are
    /// possible between passes, so the qualified query always runs
    /// first.
    pub async fn search_track(
        &self,
        track_name: &str,
        artist_name: &str,
    ) -> Result<TrackObject, CatalogError> {
        let qualified = format!("{} artist: {}", track_name, artist_name);
        let response: SearchResponse = self
            .get_json("search", &[("q", qualified.as_str()), ("type", "track")])
            .await?;

        let items = response.tracks.items;
        if !items.is_empty() {
            return Ok(pick_result(items, track_name, artist_name));
        }

        debug!(track = %track_name, artist = %artist_name,
               "qualified search empty, retrying with bare title");
        let response: SearchResponse = self
            .get_json("search", &[("q", track_name), ("type", "track")])
            .await?;

        let items = response.tracks.items;
        if items.is_empty() {
            return Err(CatalogError::NotFound(format!(
                "no search results for '{}' by '{}'",
                track_name, artist_name
            )));
        }
        Ok(pick_result(items, track_name, artist_name))
    }

    pub async fn track(&self, track_id: &str) -> Result<TrackObject, CatalogError> {
        self.get_json(&format!("tracks/{}", track_id), &[]).await
    }

    /// Track lookup scoped to a market; some entries only expose a
    /// preview URL when a market is given.
    pub async fn track_in_market(
        &self,
        track_id: &str,
        market: &str,
    ) -> Result<TrackObject, CatalogError> {
        self.get_json(&format!("tracks/{}", track_id), &[("market", market)])
            .await
    }

    pub async fn artist(&self, artist_id: &str) -> Result<ArtistObject, CatalogError> {
        self.get_json(&format!("artists/{}", artist_id), &[]).await
    }

    pub async fn album(&self, album_id: &str) -> Result<AlbumObject, CatalogError> {
        self.get_json(&format!("albums/{}", album_id), &[]).await
    }

    pub async fn audio_features(&self, track_id: &str) -> Result<AudioFeatures, CatalogError> {
        self.get_json(&format!("audio-features/{}", track_id), &[])
            .await
    }

    /// Resolve a track's preview URL, re-fetching in the US market when
    /// the plain object carries none.
    pub async fn resolve_preview_url(&self, track: &TrackObject) -> Option<String> {
        if track.preview_url.is_some() {
            return track.preview_url.clone();
        }
        match self.track_in_market(&track.id, "US").await {
            Ok(scoped) => scoped.preview_url,
            Err(e) => {
                warn!(track_id = %track.id, error = %e, "market-scoped preview lookup failed");
                None
            }
        }
    }
}

/// Prefer an exact trimmed artist+title match; otherwise the first result.
fn pick_result(mut items: Vec<TrackObject>, track_name: &str, artist_name: &str) -> TrackObject {
    let exact = items.iter().position(|item| {
        item.artists
            .first()
            .map_or(false, |a| a.name.trim() == artist_name.trim())
            && item.name.trim() == track_name.trim()
    });
    items.swap_remove(exact.unwrap_or(0))
}

fn status_error(status: reqwest::StatusCode, context: &str) -> CatalogError {
    if status == reqwest::StatusCode::NOT_FOUND {
        CatalogError::NotFound(context.to_string())
    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        CatalogError::Transient(format!("{}: HTTP {}", context, status))
    } else {
        CatalogError::Malformed(format!("{}: HTTP {}", context, status))
    }
}
