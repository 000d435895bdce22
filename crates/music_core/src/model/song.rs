//! Song record.
//!
//! # Invariants
//! - `track_num` starts at 1 and orders songs within their album.
//! - `length_seconds` is finite and non-negative.

use super::album::AlbumId;
use super::{validate_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// SQLite row id of a song.
pub type SongId = i64;

/// Persisted song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub track_num: i64,
    pub length_seconds: f64,
    pub album_id: AlbumId,
}

impl Song {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_song_fields(&self.title, self.track_num, self.length_seconds)
    }
}

impl Display for Song {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Song id={} track_num={} album={}>",
            self.id, self.track_num, self.album_id
        )
    }
}

/// Song that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSong {
    pub title: String,
    pub track_num: i64,
    pub length_seconds: f64,
    pub album_id: AlbumId,
}

impl NewSong {
    pub fn new(
        album_id: AlbumId,
        track_num: i64,
        title: impl Into<String>,
        length_seconds: f64,
    ) -> Self {
        Self {
            title: title.into(),
            track_num,
            length_seconds,
            album_id,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_song_fields(&self.title, self.track_num, self.length_seconds)
    }
}

fn validate_song_fields(
    title: &str,
    track_num: i64,
    length_seconds: f64,
) -> Result<(), ModelValidationError> {
    validate_text("song title", title)?;
    if track_num < 1 {
        return Err(ModelValidationError::InvalidTrackNumber(track_num));
    }
    if !length_seconds.is_finite() || length_seconds < 0.0 {
        return Err(ModelValidationError::InvalidLength(length_seconds));
    }
    Ok(())
}
