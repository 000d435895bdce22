//! Aggregate and subquery reports.
//!
//! # Invariants
//! - Aggregates over empty groups report zero rather than dropping the
//!   group, except where a report is defined over songs only
//!   (`average_song_length_per_band`, `longest_song_per_album`).

use super::{AlbumWithBand, CatalogQueries, SongDetail};
use crate::model::album::Album;
use crate::model::band::Band;
use crate::model::song::Song;
use crate::repo::album_repo::{parse_album_row, parse_release_date};
use crate::repo::band_repo::parse_band_row;
use crate::repo::{RepoError, RepoResult};
use rusqlite::Row;

/// Band with the number of albums it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandAlbumCount {
    pub band: Band,
    pub album_count: i64,
}

/// Album with track count and summed song length.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumDuration {
    pub album: Album,
    pub band_name: String,
    pub track_count: i64,
    pub total_seconds: f64,
}

/// Mean song length across every album of a band.
#[derive(Debug, Clone, PartialEq)]
pub struct BandAverageLength {
    pub band: Band,
    pub song_count: i64,
    pub average_seconds: f64,
}

/// Longest song of one album.
#[derive(Debug, Clone, PartialEq)]
pub struct LongestSong {
    pub album: Album,
    pub song: Song,
}

/// Whole-catalog row counts and playing time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogTotals {
    pub bands: i64,
    pub albums: i64,
    pub songs: i64,
    pub total_seconds: f64,
}

impl CatalogQueries<'_> {
    /// Album count per band, including bands with no albums.
    ///
    /// Ordered by count descending, then band name.
    pub fn album_counts_per_band(&self) -> RepoResult<Vec<BandAlbumCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                bands.id AS id,
                bands.name AS name,
                COUNT(albums.id) AS album_count
             FROM bands
             LEFT JOIN albums ON albums.band_id = bands.id
             GROUP BY bands.id
             ORDER BY album_count DESC, bands.name ASC, bands.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next()? {
            counts.push(BandAlbumCount {
                band: parse_band_row(row)?,
                album_count: row.get("album_count")?,
            });
        }
        Ok(counts)
    }

    /// Track count and total length per album, longest album first.
    ///
    /// Albums without songs are reported with zero tracks and zero seconds.
    pub fn album_durations(&self) -> RepoResult<Vec<AlbumDuration>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                albums.id AS id,
                albums.title AS title,
                albums.release_date AS release_date,
                albums.band_id AS band_id,
                bands.name AS band_name,
                COUNT(songs.id) AS track_count,
                COALESCE(SUM(songs.length_seconds), 0.0) AS total_seconds
             FROM albums
             INNER JOIN bands ON bands.id = albums.band_id
             LEFT JOIN songs ON songs.album_id = albums.id
             GROUP BY albums.id
             ORDER BY total_seconds DESC, albums.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut durations = Vec::new();
        while let Some(row) = rows.next()? {
            durations.push(AlbumDuration {
                album: parse_album_row(row)?,
                band_name: row.get("band_name")?,
                track_count: row.get("track_count")?,
                total_seconds: row.get("total_seconds")?,
            });
        }
        Ok(durations)
    }

    /// Average song length per band, for bands that have at least one song.
    pub fn average_song_length_per_band(&self) -> RepoResult<Vec<BandAverageLength>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                bands.id AS id,
                bands.name AS name,
                COUNT(songs.id) AS song_count,
                AVG(songs.length_seconds) AS average_seconds
             FROM bands
             INNER JOIN albums ON albums.band_id = bands.id
             INNER JOIN songs ON songs.album_id = albums.id
             GROUP BY bands.id
             ORDER BY average_seconds DESC, bands.name ASC, bands.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut averages = Vec::new();
        while let Some(row) = rows.next()? {
            averages.push(BandAverageLength {
                band: parse_band_row(row)?,
                song_count: row.get("song_count")?,
                average_seconds: row.get("average_seconds")?,
            });
        }
        Ok(averages)
    }

    pub fn catalog_totals(&self) -> RepoResult<CatalogTotals> {
        let totals = self.conn.query_row(
            "SELECT
                (SELECT COUNT(*) FROM bands) AS bands,
                (SELECT COUNT(*) FROM albums) AS albums,
                (SELECT COUNT(*) FROM songs) AS songs,
                (SELECT COALESCE(SUM(length_seconds), 0.0) FROM songs) AS total_seconds;",
            [],
            |row| {
                Ok(CatalogTotals {
                    bands: row.get("bands")?,
                    albums: row.get("albums")?,
                    songs: row.get("songs")?,
                    total_seconds: row.get("total_seconds")?,
                })
            },
        )?;
        Ok(totals)
    }

    /// Albums with at least `min_tracks` songs.
    ///
    /// `min_tracks <= 0` matches every album, including empty ones.
    pub fn albums_with_min_tracks(&self, min_tracks: i64) -> RepoResult<Vec<AlbumWithBand>> {
        self.albums_with_band_where(
            "(?1 <= 0 OR albums.id IN (
                SELECT songs.album_id
                FROM songs
                GROUP BY songs.album_id
                HAVING COUNT(*) >= ?1
             ))
             ORDER BY albums.id ASC",
            [min_tracks],
        )
    }

    /// The longest song of every album that has songs.
    ///
    /// Ties on length go to the song with the lowest track number.
    pub fn longest_song_per_album(&self) -> RepoResult<Vec<LongestSong>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                albums.id AS album_id,
                albums.title AS album_title,
                albums.release_date AS album_release_date,
                albums.band_id AS album_band_id,
                songs.id AS song_id,
                songs.title AS song_title,
                songs.track_num AS song_track_num,
                songs.length_seconds AS song_length_seconds
             FROM albums
             INNER JOIN songs ON songs.id = (
                SELECT inner_songs.id
                FROM songs AS inner_songs
                WHERE inner_songs.album_id = albums.id
                ORDER BY inner_songs.length_seconds DESC,
                         inner_songs.track_num ASC,
                         inner_songs.id ASC
                LIMIT 1
             )
             ORDER BY albums.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut longest = Vec::new();
        while let Some(row) = rows.next()? {
            longest.push(longest_song_from_row(row)?);
        }
        Ok(longest)
    }

    /// Songs longer than the average song of their own album.
    pub fn songs_longer_than_album_average(&self) -> RepoResult<Vec<SongDetail>> {
        self.song_details_where(
            "songs.length_seconds > (
                SELECT AVG(peer.length_seconds)
                FROM songs AS peer
                WHERE peer.album_id = songs.album_id
             )
             ORDER BY songs.album_id ASC, songs.track_num ASC, songs.id ASC",
            [],
        )
    }

    pub fn bands_without_albums(&self) -> RepoResult<Vec<Band>> {
        let mut stmt = self.conn.prepare(
            "SELECT bands.id AS id, bands.name AS name
             FROM bands
             WHERE NOT EXISTS (
                SELECT 1 FROM albums WHERE albums.band_id = bands.id
             )
             ORDER BY bands.name ASC, bands.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut bands = Vec::new();
        while let Some(row) = rows.next()? {
            bands.push(parse_band_row(row)?);
        }
        Ok(bands)
    }
}

fn longest_song_from_row(row: &Row<'_>) -> RepoResult<LongestSong> {
    let album = Album {
        id: row.get("album_id")?,
        title: row.get("album_title")?,
        release_date: parse_release_date(row.get("album_release_date")?)?,
        band_id: row.get("album_band_id")?,
    };
    album.validate().map_err(|err| {
        RepoError::InvalidData(format!("albums row {} failed validation: {err}", album.id))
    })?;
    let song = Song {
        id: row.get("song_id")?,
        title: row.get("song_title")?,
        track_num: row.get("song_track_num")?,
        length_seconds: row.get("song_length_seconds")?,
        album_id: album.id,
    };
    song.validate().map_err(|err| {
        RepoError::InvalidData(format!("songs row {} failed validation: {err}", song.id))
    })?;
    Ok(LongestSong { album, song })
}
