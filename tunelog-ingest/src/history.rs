//! Streaming-history ingestion
//!
//! A listening-history export arrives as a directory of numbered
//! `StreamingHistoryN.json` files, each holding an array of stream
//! events. Files are read in name order and concatenated.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use tunelog_common::{track_key, Error, Result};

/// Timestamp format used by the export (minute precision, no zone)
const END_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One played stream from the history export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingEvent {
    /// When the stream ended, in [`END_TIME_FORMAT`]
    pub end_time: String,
    pub artist_name: String,
    pub track_name: String,
    /// Milliseconds actually played
    pub ms_played: u64,
    /// Join key; attached after loading, absent in the raw export
    #[serde(rename = "track_key", skip_serializing_if = "Option::is_none", default)]
    pub track_key: Option<String>,
}

impl StreamingEvent {
    /// Parse the end-time string.
    pub fn parsed_end_time(&self) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.end_time, END_TIME_FORMAT).map_err(|e| {
            Error::InvalidInput(format!("bad endTime '{}': {}", self.end_time, e))
        })
    }
}

/// Load every `StreamingHistoryN.json` file under `dir`, in name order.
pub fn compile_streaming_history(dir: &Path) -> Result<Vec<StreamingEvent>> {
    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_history_file(path))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(Error::NotFound(format!(
            "no StreamingHistory*.json files in {}",
            dir.display()
        )));
    }

    let mut streams = Vec::new();
    for file in &files {
        let content = std::fs::read_to_string(file)?;
        let mut events: Vec<StreamingEvent> = serde_json::from_str(&content)
            .map_err(|e| Error::InvalidInput(format!("{}: {}", file.display(), e)))?;
        debug!(file = %file.display(), events = events.len(), "loaded history file");
        streams.append(&mut events);
    }

    info!(
        files = files.len(),
        streams = streams.len(),
        "compiled streaming history"
    );
    Ok(streams)
}

fn is_history_file(path: &Path) -> bool {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return false;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_prefix("StreamingHistory"))
        .map_or(false, |rest| {
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
        })
}

/// Attach the track join key to every stream.
pub fn attach_track_keys(streams: &mut [StreamingEvent]) {
    for stream in streams.iter_mut() {
        stream.track_key = Some(track_key(&stream.track_name, &stream.artist_name));
    }
}

/// Distinct (track name, artist name) pairs, first-seen order.
pub fn unique_tracks(streams: &[StreamingEvent]) -> Vec<(String, String)> {
    let mut seen = std::collections::HashSet::new();
    let mut unique = Vec::new();
    for stream in streams {
        let key = track_key(&stream.track_name, &stream.artist_name);
        if seen.insert(key) {
            unique.push((stream.track_name.clone(), stream.artist_name.clone()));
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_history(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    const FILE0: &str = r#"[
        {"endTime": "2024-03-01 10:15", "artistName": "Bon Iver",
         "trackName": "Holocene", "msPlayed": 201000},
        {"endTime": "2024-03-01 10:19", "artistName": "The xx",
         "trackName": "Intro", "msPlayed": 128000}
    ]"#;

    const FILE1: &str = r#"[
        {"endTime": "2024-03-02 08:00", "artistName": "Bon Iver",
         "trackName": "Holocene", "msPlayed": 95000}
    ]"#;

    #[test]
    fn test_compile_reads_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        // Written out of order; name sort must restore it
        write_history(dir.path(), "StreamingHistory1.json", FILE1);
        write_history(dir.path(), "StreamingHistory0.json", FILE0);
        write_history(dir.path(), "Playlist0.json", "[]");
        write_history(dir.path(), "StreamingHistory.txt", "ignored");

        let streams = compile_streaming_history(dir.path()).unwrap();
        assert_eq!(streams.len(), 3);
        assert_eq!(streams[0].track_name, "Holocene");
        assert_eq!(streams[2].ms_played, 95000);
        assert!(streams[0].track_key.is_none());
    }

    #[test]
    fn test_empty_dir_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            compile_streaming_history(dir.path()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_history_file_filter() {
        assert!(is_history_file(Path::new("StreamingHistory0.json")));
        assert!(is_history_file(Path::new("StreamingHistory12.json")));
        assert!(!is_history_file(Path::new("StreamingHistory.json")));
        assert!(!is_history_file(Path::new("SearchQueries0.json")));
        assert!(!is_history_file(Path::new("StreamingHistory0.csv")));
    }

    #[test]
    fn test_attach_track_keys() {
        let dir = tempfile::tempdir().unwrap();
        write_history(dir.path(), "StreamingHistory0.json", FILE0);
        let mut streams = compile_streaming_history(dir.path()).unwrap();
        attach_track_keys(&mut streams);
        assert_eq!(
            streams[0].track_key.as_deref(),
            Some("Holocene___Bon Iver")
        );
    }

    #[test]
    fn test_unique_tracks_dedupes_preserving_order() {
        let dir = tempfile::tempdir().unwrap();
        write_history(dir.path(), "StreamingHistory0.json", FILE0);
        write_history(dir.path(), "StreamingHistory1.json", FILE1);
        let streams = compile_streaming_history(dir.path()).unwrap();
        let unique = unique_tracks(&streams);
        assert_eq!(
            unique,
            vec![
                ("Holocene".to_string(), "Bon Iver".to_string()),
                ("Intro".to_string(), "The xx".to_string()),
            ]
        );
    }

    #[test]
    fn test_end_time_parsing() {
        let event = StreamingEvent {
            end_time: "2024-03-01 10:15".to_string(),
            artist_name: "x".to_string(),
            track_name: "y".to_string(),
            ms_played: 1,
            track_key: None,
        };
        let dt = event.parsed_end_time().unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-03-01 10:15");

        let bad = StreamingEvent {
            end_time: "not a time".to_string(),
            ..event
        };
        assert!(bad.parsed_end_time().is_err());
    }

    #[test]
    fn test_serialization_round_trip_keeps_export_field_names() {
        let mut streams: Vec<StreamingEvent> = serde_json::from_str(FILE0).unwrap();
        attach_track_keys(&mut streams);
        let json = serde_json::to_value(&streams[0]).unwrap();
        assert_eq!(json["endTime"], "2024-03-01 10:15");
        assert_eq!(json["msPlayed"], 201000);
        assert_eq!(json["track_key"], "Holocene___Bon Iver");
    }
}
