//! Track identity
//!
//! A streaming-history entry carries only a track name and an artist name.
//! Enriched catalog records are joined to history entries through a key
//! formed by concatenating the two with a fixed separator. Two different
//! tracks sharing name and artist collide under this key; that is an
//! accepted limitation of the join.

/// Separator between track name and artist name in the join key
pub const TRACK_KEY_SEPARATOR: &str = "___";

/// Build the join key for a (track, artist) pair.
pub fn track_key(track_name: &str, artist_name: &str) -> String {
    format!("{}{}{}", track_name, TRACK_KEY_SEPARATOR, artist_name)
}
