//! Bulk import of artist discographies.
//!
//! # Responsibility
//! - Decode artist documents shaped like public music-API payloads
//!   (artist → albums → track page).
//! - Register the whole tree with one session and commit once.
//!
//! # Invariants
//! - An import is all-or-nothing: any failing row rolls back every row.
//! - Albums credited to more than one artist are skipped, not imported.
//! - A release date is kept only when its precision is `day`.

use crate::model::band::NewBand;
use crate::session::{AlbumDraft, CatalogSession, SessionConfig, SessionError, SongDraft};
use chrono::NaiveDate;
use log::{info, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const DAY_PRECISION: &str = "day";
const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// One artist with its album listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistDocument {
    pub name: String,
    #[serde(default)]
    pub albums: Vec<AlbumDocument>,
}

/// Album entry as returned by the album detail endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumDocument {
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistCredit>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// `year`, `month` or `day`.
    #[serde(default)]
    pub release_date_precision: Option<String>,
    #[serde(default)]
    pub tracks: TrackPage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistCredit {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<TrackDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackDocument {
    pub name: String,
    pub track_number: i64,
    pub duration_ms: u64,
}

/// Accepts either one artist object or an array of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportPayload {
    Many(Vec<ArtistDocument>),
    One(ArtistDocument),
}

/// Counts of rows written by one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub bands: usize,
    pub albums: usize,
    pub songs: usize,
    pub skipped_albums: usize,
}

#[derive(Debug)]
pub enum ImportError {
    /// Payload is not valid artist JSON.
    Parse(serde_json::Error),
    /// Writing the catalog failed; nothing was committed.
    Session(SessionError),
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid import document: {err}"),
            Self::Session(err) => write!(f, "import failed: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Session(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<SessionError> for ImportError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

/// Imports artist documents into a catalog connection.
pub struct ImportService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> ImportService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Decodes a JSON payload (one artist or an array) and imports it.
    pub fn import_json(&mut self, payload: &str) -> Result<ImportSummary, ImportError> {
        let artists = match serde_json::from_str::<ImportPayload>(payload)? {
            ImportPayload::Many(artists) => artists,
            ImportPayload::One(artist) => vec![artist],
        };
        self.import_artists(&artists)
    }

    /// Imports every artist in one transaction.
    pub fn import_artists(
        &mut self,
        artists: &[ArtistDocument],
    ) -> Result<ImportSummary, ImportError> {
        let started_at = Instant::now();
        let mut summary = ImportSummary::default();
        let mut session = CatalogSession::begin(self.conn, SessionConfig::default())?;

        for artist in artists {
            let band = session.add_band(NewBand::new(artist.name.as_str()));
            summary.bands += 1;

            for album in &artist.albums {
                if album.artists.len() > 1 {
                    summary.skipped_albums += 1;
                    continue;
                }

                let draft = AlbumDraft::new(band, album.name.as_str())
                    .released(day_precision_release_date(album));
                let album_ref = session.add_album(draft);
                summary.albums += 1;

                for track in &album.tracks.items {
                    session.add_song(SongDraft::new(
                        album_ref,
                        track.track_number,
                        track.name.as_str(),
                        duration_seconds(track.duration_ms),
                    ));
                    summary.songs += 1;
                }
            }
        }

        // Dropping the session on error rolls the transaction back.
        if let Err(err) = session.commit() {
            warn!(
                "event=catalog_import module=service status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            );
            return Err(err.into());
        }

        info!(
            "event=catalog_import module=service status=ok duration_ms={} bands={} albums={} songs={} skipped_albums={}",
            started_at.elapsed().as_millis(),
            summary.bands,
            summary.albums,
            summary.songs,
            summary.skipped_albums
        );
        Ok(summary)
    }
}

/// Release date of an album when the source knows the exact day.
pub fn day_precision_release_date(album: &AlbumDocument) -> Option<NaiveDate> {
    if album.release_date_precision.as_deref() != Some(DAY_PRECISION) {
        return None;
    }
    album
        .release_date
        .as_deref()
        .and_then(|value| NaiveDate::parse_from_str(value, RELEASE_DATE_FORMAT).ok())
}

pub fn duration_seconds(duration_ms: u64) -> f64 {
    duration_ms as f64 / 1000.0
}
