//! Read-only catalog queries: filters and joins.
//!
//! # Responsibility
//! - Answer cross-table questions (songs of a band, albums in a date range)
//!   without going through per-entity repositories.
//! - Return small read models that carry the joined names alongside rows.
//!
//! # Invariants
//! - Every query has an explicit `ORDER BY` ending in a row id, so results
//!   are deterministic.
//! - Queries never write; they can run on a plain connection or inside a
//!   session's transaction.

use crate::model::album::{Album, AlbumId};
use crate::model::band::Band;
use crate::model::song::Song;
use crate::repo::album_repo::parse_album_row;
use crate::repo::band_repo::{BandListQuery, BandRepository, SqliteBandRepository};
use crate::repo::song_repo::{parse_song_row, SongRepository, SqliteSongRepository};
use crate::repo::{like_contains, push_pagination, RepoResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Params};

mod stats;

pub use stats::{AlbumDuration, BandAlbumCount, BandAverageLength, CatalogTotals, LongestSong};

const ALBUM_WITH_BAND_SQL: &str = "SELECT
    albums.id AS id,
    albums.title AS title,
    albums.release_date AS release_date,
    albums.band_id AS band_id,
    bands.name AS band_name
FROM albums
INNER JOIN bands ON bands.id = albums.band_id";

const SONG_DETAIL_SQL: &str = "SELECT
    songs.id AS id,
    songs.title AS title,
    songs.track_num AS track_num,
    songs.length_seconds AS length_seconds,
    songs.album_id AS album_id,
    albums.title AS album_title,
    bands.name AS band_name
FROM songs
INNER JOIN albums ON albums.id = songs.album_id
INNER JOIN bands ON bands.id = albums.band_id";

/// Song joined with its album title and band name.
#[derive(Debug, Clone, PartialEq)]
pub struct SongDetail {
    pub song: Song,
    pub album_title: String,
    pub band_name: String,
}

/// Album joined with its band name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumWithBand {
    pub album: Album,
    pub band_name: String,
}

/// Query facade over one borrowed connection.
pub struct CatalogQueries<'conn> {
    conn: &'conn Connection,
}

impl<'conn> CatalogQueries<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Bands whose name contains `needle`, case-insensitively.
    pub fn bands_matching(&self, needle: &str) -> RepoResult<Vec<Band>> {
        SqliteBandRepository::new(self.conn).list_bands(&BandListQuery {
            name_contains: Some(needle.to_string()),
            ..BandListQuery::default()
        })
    }

    /// Albums released on or between `from` and `to`, oldest first.
    pub fn albums_released_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepoResult<Vec<AlbumWithBand>> {
        self.albums_with_band_where(
            "albums.release_date BETWEEN ?1 AND ?2
             ORDER BY albums.release_date ASC, albums.id ASC",
            params![from, to],
        )
    }

    /// Albums whose release day is unknown.
    pub fn undated_albums(&self) -> RepoResult<Vec<AlbumWithBand>> {
        self.albums_with_band_where(
            "albums.release_date IS NULL
             ORDER BY bands.name ASC, albums.id ASC",
            [],
        )
    }

    /// Every album with its band, ordered by band name then release date.
    pub fn albums_with_band(&self, limit: Option<u32>) -> RepoResult<Vec<AlbumWithBand>> {
        let mut sql = format!(
            "{ALBUM_WITH_BAND_SQL}
             ORDER BY bands.name ASC, albums.release_date IS NULL,
                      albums.release_date ASC, albums.id ASC"
        );
        let mut bind_values: Vec<Value> = Vec::new();
        push_pagination(&mut sql, &mut bind_values, limit, 0);
        self.collect_albums_with_band(&sql, params_from_iter(bind_values))
    }

    /// Songs strictly longer than `seconds`, longest first.
    pub fn songs_longer_than(&self, seconds: f64) -> RepoResult<Vec<SongDetail>> {
        self.song_details_where(
            "songs.length_seconds > ?1
             ORDER BY songs.length_seconds DESC, songs.id ASC",
            [seconds],
        )
    }

    /// Songs whose title contains `needle`, case-insensitively.
    pub fn songs_titled(&self, needle: &str) -> RepoResult<Vec<SongDetail>> {
        self.song_details_where(
            "songs.title LIKE ?1 ESCAPE '\\'
             ORDER BY songs.title ASC, songs.id ASC",
            [like_contains(needle)],
        )
    }

    /// All songs by the band with exactly this name, album by album.
    ///
    /// Albums are walked in release order (undated last); songs in track
    /// order. Unknown band names yield an empty list.
    pub fn songs_by_band(&self, band_name: &str) -> RepoResult<Vec<SongDetail>> {
        self.song_details_where(
            "bands.name = ?1
             ORDER BY albums.release_date IS NULL, albums.release_date ASC,
                      albums.id ASC, songs.track_num ASC, songs.id ASC",
            [band_name],
        )
    }

    /// Songs of one album ordered by track number.
    pub fn track_listing(&self, album_id: AlbumId) -> RepoResult<Vec<Song>> {
        SqliteSongRepository::new(self.conn).list_songs_for_album(album_id)
    }

    fn albums_with_band_where<P: Params>(
        &self,
        clause: &str,
        params: P,
    ) -> RepoResult<Vec<AlbumWithBand>> {
        let sql = format!("{ALBUM_WITH_BAND_SQL} WHERE {clause};");
        self.collect_albums_with_band(&sql, params)
    }

    fn collect_albums_with_band<P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> RepoResult<Vec<AlbumWithBand>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut albums = Vec::new();
        while let Some(row) = rows.next()? {
            albums.push(AlbumWithBand {
                album: parse_album_row(row)?,
                band_name: row.get("band_name")?,
            });
        }
        Ok(albums)
    }

    fn song_details_where<P: Params>(
        &self,
        clause: &str,
        params: P,
    ) -> RepoResult<Vec<SongDetail>> {
        let sql = format!("{SONG_DETAIL_SQL} WHERE {clause};");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params)?;
        let mut songs = Vec::new();
        while let Some(row) = rows.next()? {
            songs.push(SongDetail {
                song: parse_song_row(row)?,
                album_title: row.get("album_title")?,
                band_name: row.get("band_name")?,
            });
        }
        Ok(songs)
    }
}
