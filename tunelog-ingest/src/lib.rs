//! tunelog-ingest: streaming-history enrichment pipeline
//!
//! Loads a listening-history export, resolves each distinct track
//! against the music catalog API, analyzes its preview clip with
//! tunelog-fx, and writes one joined JSON dataset.

pub mod catalog;
pub mod dataset;
pub mod history;
pub mod record;

pub use catalog::{CatalogClient, CatalogError};
pub use history::{attach_track_keys, compile_streaming_history, StreamingEvent};
pub use record::{EnrichedTrack, TrackEnricher};
