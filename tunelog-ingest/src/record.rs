//! Track enrichment
//!
//! For each distinct track in the history, pulls the catalog metadata
//! (track, lead artist, album, precomputed descriptors) and the analyzed
//! preview features, and flattens everything into one record keyed by the
//! track join key.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use tunelog_common::track_key;
use tunelog_fx::{collect_rich_features, FeatureVector, PreviewFetcher};

use crate::catalog::{AudioFeatures, CatalogClient, CatalogError, TrackObject};

/// Enrichment failures; all catalog-side
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Catalog metadata for one track, flattened for dataset output
#[derive(Debug, Clone, Serialize)]
pub struct TrackRecord {
    pub track_key: String,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: String,
    pub track_id: String,
    pub artist_id: String,
    pub album_id: String,
    pub artist_genres: Vec<String>,
    pub artist_followers: u64,
    pub artist_popularity: u32,
    pub album_popularity: u32,
    pub preview_url: Option<String>,
    #[serde(flatten)]
    pub audio_features: AudioFeatures,
    pub track_popularity: u32,
}

/// A fully enriched track: catalog metadata plus analyzed features
#[derive(Debug, Clone)]
pub struct EnrichedTrack {
    pub record: TrackRecord,
    pub features: FeatureVector,
}

impl EnrichedTrack {
    /// Flatten into one JSON object: record fields first, then the
    /// feature keys in schema order.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = match serde_json::to_value(&self.record) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        for (key, value) in self.features.iter() {
            map.insert(key.to_string(), serde_json::json!(value));
        }
        serde_json::Value::Object(map)
    }
}

/// Builds enriched records by combining catalog lookups with preview
/// analysis.
pub struct TrackEnricher {
    catalog: CatalogClient,
    fetcher: PreviewFetcher,
}

impl TrackEnricher {
    pub fn new(catalog: CatalogClient, fetcher: PreviewFetcher) -> Self {
        Self { catalog, fetcher }
    }

    /// Enrich one (track, artist) pair from the history.
    ///
    /// Catalog failures propagate; preview analysis never fails, tracks
    /// without usable audio get the all-null feature vector.
    pub async fn enrich(
        &self,
        track_name: &str,
        artist_name: &str,
    ) -> Result<EnrichedTrack, EnrichError> {
        debug!(track = %track_name, artist = %artist_name, "enriching track");
        let track = self.catalog.search_track(track_name, artist_name).await?;
        let preview_url = self.catalog.resolve_preview_url(&track).await;

        let record = self.build_record(track, preview_url.clone()).await?;
        let features = collect_rich_features(&self.fetcher, preview_url.as_deref()).await;
        if features.is_null() {
            warn!(track_key = %record.track_key, "no analyzable preview, features are null");
        } else {
            info!(track_key = %record.track_key, "track enriched");
        }

        Ok(EnrichedTrack { record, features })
    }

    async fn build_record(
        &self,
        track: TrackObject,
        preview_url: Option<String>,
    ) -> Result<TrackRecord, EnrichError> {
        let lead_artist = track.artists.first().cloned().ok_or_else(|| {
            CatalogError::Malformed(format!("track {} has no artists", track.id))
        })?;

        let artist = self.catalog.artist(&lead_artist.id).await?;
        let album = self.catalog.album(&track.album.id).await?;
        let audio_features = self.catalog.audio_features(&track.id).await?;

        Ok(TrackRecord {
            track_key: track_key(&track.name, &lead_artist.name),
            track_name: track.name,
            artist_name: lead_artist.name,
            album_name: track.album.name,
            track_id: track.id,
            artist_id: lead_artist.id,
            album_id: track.album.id,
            artist_genres: artist.genres,
            artist_followers: artist.followers.total,
            artist_popularity: artist.popularity,
            album_popularity: album.popularity,
            preview_url,
            audio_features,
            track_popularity: track.popularity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> TrackRecord {
        TrackRecord {
            track_key: "Holocene___Bon Iver".to_string(),
            track_name: "Holocene".to_string(),
            artist_name: "Bon Iver".to_string(),
            album_name: "Bon Iver, Bon Iver".to_string(),
            track_id: "t1".to_string(),
            artist_id: "a1".to_string(),
            album_id: "al1".to_string(),
            artist_genres: vec!["indie folk".to_string()],
            artist_followers: 1_000_000,
            artist_popularity: 75,
            album_popularity: 70,
            preview_url: None,
            audio_features: AudioFeatures {
                danceability: 0.32,
                energy: 0.43,
                key: 1,
                loudness: -10.5,
                mode: 1,
                speechiness: 0.03,
                acousticness: 0.71,
                instrumentalness: 0.02,
                liveness: 0.1,
                valence: 0.2,
                tempo: 73.0,
                duration_ms: 337_000,
                time_signature: 4,
            },
            track_popularity: 71,
        }
    }

    #[test]
    fn test_record_serializes_flat() {
        let json = serde_json::to_value(sample_record()).unwrap();
        // Audio features flatten into the record itself
        assert_eq!(json["danceability"], 0.32);
        assert_eq!(json["track_key"], "Holocene___Bon Iver");
        assert_eq!(json["track_popularity"], 71);
        assert!(json.get("audio_features").is_none());
    }

    #[test]
    fn test_enriched_track_merges_features() {
        let enriched = EnrichedTrack {
            record: sample_record(),
            features: FeatureVector::null(),
        };
        let json = enriched.to_json();
        let map = json.as_object().unwrap();

        assert_eq!(map["track_name"], "Holocene");
        assert_eq!(map["tempo_calc"], serde_json::Value::Null);
        assert_eq!(map["mfcc20_skew"], serde_json::Value::Null);
        // Record fields + feature keys, no collisions
        assert_eq!(
            map.len(),
            13 + 13 + tunelog_fx::FEATURE_COUNT
        );
    }
}
