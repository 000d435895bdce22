//! Song repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Songs always reference an existing album; a missing album surfaces as
//!   `RepoError::NotFound(EntityKind::Album, id)`.
//! - Album track listings are ordered by `track_num ASC, id ASC`.

use crate::model::album::AlbumId;
use crate::model::song::{NewSong, Song, SongId};
use crate::repo::{is_foreign_key_violation, EntityKind, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

pub(crate) const SONG_SELECT_SQL: &str = "SELECT
    songs.id AS id,
    songs.title AS title,
    songs.track_num AS track_num,
    songs.length_seconds AS length_seconds,
    songs.album_id AS album_id
FROM songs";

/// Repository interface for song CRUD operations.
pub trait SongRepository {
    fn create_song(&self, song: &NewSong) -> RepoResult<Song>;
    fn get_song(&self, id: SongId) -> RepoResult<Option<Song>>;
    fn list_songs_for_album(&self, album_id: AlbumId) -> RepoResult<Vec<Song>>;
    fn update_song(&self, song: &Song) -> RepoResult<()>;
    fn delete_song(&self, id: SongId) -> RepoResult<()>;
}

/// SQLite-backed song repository.
pub struct SqliteSongRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSongRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SongRepository for SqliteSongRepository<'_> {
    fn create_song(&self, song: &NewSong) -> RepoResult<Song> {
        song.validate()?;

        self.conn
            .execute(
                "INSERT INTO songs (title, track_num, length_seconds, album_id)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    song.title.as_str(),
                    song.track_num,
                    song.length_seconds,
                    song.album_id
                ],
            )
            .map_err(|err| missing_album_or(err, song.album_id))?;

        Ok(Song {
            id: self.conn.last_insert_rowid(),
            title: song.title.clone(),
            track_num: song.track_num,
            length_seconds: song.length_seconds,
            album_id: song.album_id,
        })
    }

    fn get_song(&self, id: SongId) -> RepoResult<Option<Song>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SONG_SELECT_SQL} WHERE songs.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_song_row(row)?));
        }
        Ok(None)
    }

    fn list_songs_for_album(&self, album_id: AlbumId) -> RepoResult<Vec<Song>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SONG_SELECT_SQL}
             WHERE songs.album_id = ?1
             ORDER BY songs.track_num ASC, songs.id ASC;"
        ))?;
        let mut rows = stmt.query([album_id])?;
        let mut songs = Vec::new();
        while let Some(row) = rows.next()? {
            songs.push(parse_song_row(row)?);
        }
        Ok(songs)
    }

    fn update_song(&self, song: &Song) -> RepoResult<()> {
        song.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE songs
                 SET
                    title = ?1,
                    track_num = ?2,
                    length_seconds = ?3,
                    album_id = ?4
                 WHERE id = ?5;",
                params![
                    song.title.as_str(),
                    song.track_num,
                    song.length_seconds,
                    song.album_id,
                    song.id
                ],
            )
            .map_err(|err| missing_album_or(err, song.album_id))?;

        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Song, song.id));
        }
        Ok(())
    }

    fn delete_song(&self, id: SongId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM songs WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Song, id));
        }
        Ok(())
    }
}

/// Decodes one row selected with [`SONG_SELECT_SQL`] column names.
pub(crate) fn parse_song_row(row: &Row<'_>) -> RepoResult<Song> {
    let song = Song {
        id: row.get("id")?,
        title: row.get("title")?,
        track_num: row.get("track_num")?,
        length_seconds: row.get("length_seconds")?,
        album_id: row.get("album_id")?,
    };
    song.validate().map_err(|err| {
        RepoError::InvalidData(format!("songs row {} failed validation: {err}", song.id))
    })?;
    Ok(song)
}

fn missing_album_or(err: rusqlite::Error, album_id: AlbumId) -> RepoError {
    if is_foreign_key_violation(&err) {
        RepoError::NotFound(EntityKind::Album, album_id)
    } else {
        err.into()
    }
}
