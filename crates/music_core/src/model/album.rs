//! Album record.
//!
//! An album is owned by one band and is deleted together with it.
//! `release_date` is optional because sources often only know the year.

use super::band::BandId;
use super::{validate_text, ModelValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// SQLite row id of an album.
pub type AlbumId = i64;

/// Persisted album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    /// Serialized as `YYYY-MM-DD`; `None` when the day is unknown.
    pub release_date: Option<NaiveDate>,
    pub band_id: BandId,
}

impl Album {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_text("album title", &self.title)
    }
}

impl Display for Album {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<Album id={} title={} band={}>",
            self.id, self.title, self.band_id
        )
    }
}

/// Album that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlbum {
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub band_id: BandId,
}

impl NewAlbum {
    /// Creates an undated album for the given band.
    pub fn new(band_id: BandId, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            release_date: None,
            band_id,
        }
    }

    /// Sets the release date.
    pub fn released(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_text("album title", &self.title)
    }
}
