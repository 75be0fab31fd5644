//! Dataset assembly and output
//!
//! The final dataset is one JSON document with the full stream list and
//! a track library keyed by the join key, so every stream row can be
//! joined to its enriched record without repeating the record per play.

use serde_json::json;
use std::path::Path;
use tracing::info;
use tunelog_common::{Error, Result};

use crate::history::StreamingEvent;
use crate::record::EnrichedTrack;

/// Assemble the dataset document from streams and enriched tracks.
pub fn build_dataset(streams: &[StreamingEvent], tracks: &[EnrichedTrack]) -> serde_json::Value {
    let mut library = serde_json::Map::new();
    for track in tracks {
        library.insert(track.record.track_key.clone(), track.to_json());
    }
    json!({
        "streams": streams,
        "tracks": library,
    })
}

/// Write a JSON value to disk, pretty-printed.
pub fn write_json(value: &serde_json::Value, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)
        .map_err(|e| Error::Internal(format!("serialize {}: {}", path.display(), e)))?;
    info!(path = %path.display(), "dataset written");
    Ok(())
}
