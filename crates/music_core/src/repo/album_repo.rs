//! Album repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `albums` table.
//! - Decode `release_date` text into calendar dates.
//!
//! # Invariants
//! - Albums always reference an existing band; a missing band surfaces as
//!   `RepoError::NotFound(EntityKind::Band, id)`.
//! - Per-band listing is ordered by release date (undated last), then id.

use crate::model::album::{Album, AlbumId, NewAlbum};
use crate::model::band::BandId;
use crate::repo::{is_foreign_key_violation, EntityKind, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

pub(crate) const ALBUM_SELECT_SQL: &str = "SELECT
    albums.id AS id,
    albums.title AS title,
    albums.release_date AS release_date,
    albums.band_id AS band_id
FROM albums";

const RELEASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository interface for album CRUD operations.
pub trait AlbumRepository {
    fn create_album(&self, album: &NewAlbum) -> RepoResult<Album>;
    fn get_album(&self, id: AlbumId) -> RepoResult<Option<Album>>;
    fn list_albums_for_band(&self, band_id: BandId) -> RepoResult<Vec<Album>>;
    /// Replaces title, release date and owning band of an existing album.
    fn update_album(&self, album: &Album) -> RepoResult<()>;
    /// Deletes one album together with its songs.
    fn delete_album(&self, id: AlbumId) -> RepoResult<()>;
}

/// SQLite-backed album repository.
pub struct SqliteAlbumRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAlbumRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AlbumRepository for SqliteAlbumRepository<'_> {
    fn create_album(&self, album: &NewAlbum) -> RepoResult<Album> {
        album.validate()?;

        self.conn
            .execute(
                "INSERT INTO albums (title, release_date, band_id) VALUES (?1, ?2, ?3);",
                params![album.title.as_str(), album.release_date, album.band_id],
            )
            .map_err(|err| missing_band_or(err, album.band_id))?;

        Ok(Album {
            id: self.conn.last_insert_rowid(),
            title: album.title.clone(),
            release_date: album.release_date,
            band_id: album.band_id,
        })
    }

    fn get_album(&self, id: AlbumId) -> RepoResult<Option<Album>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ALBUM_SELECT_SQL} WHERE albums.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_album_row(row)?));
        }
        Ok(None)
    }

    fn list_albums_for_band(&self, band_id: BandId) -> RepoResult<Vec<Album>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ALBUM_SELECT_SQL}
             WHERE albums.band_id = ?1
             ORDER BY albums.release_date IS NULL, albums.release_date ASC, albums.id ASC;"
        ))?;
        let mut rows = stmt.query([band_id])?;
        let mut albums = Vec::new();
        while let Some(row) = rows.next()? {
            albums.push(parse_album_row(row)?);
        }
        Ok(albums)
    }

    fn update_album(&self, album: &Album) -> RepoResult<()> {
        album.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE albums
                 SET
                    title = ?1,
                    release_date = ?2,
                    band_id = ?3
                 WHERE id = ?4;",
                params![
                    album.title.as_str(),
                    album.release_date,
                    album.band_id,
                    album.id
                ],
            )
            .map_err(|err| missing_band_or(err, album.band_id))?;

        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Album, album.id));
        }
        Ok(())
    }

    fn delete_album(&self, id: AlbumId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM albums WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Album, id));
        }
        Ok(())
    }
}

/// Decodes one row selected with [`ALBUM_SELECT_SQL`] column names.
pub(crate) fn parse_album_row(row: &Row<'_>) -> RepoResult<Album> {
    let album = Album {
        id: row.get("id")?,
        title: row.get("title")?,
        release_date: parse_release_date(row.get("release_date")?)?,
        band_id: row.get("band_id")?,
    };
    album.validate().map_err(|err| {
        RepoError::InvalidData(format!("albums row {} failed validation: {err}", album.id))
    })?;
    Ok(album)
}

pub(crate) fn parse_release_date(value: Option<String>) -> RepoResult<Option<NaiveDate>> {
    match value {
        Some(text) => NaiveDate::parse_from_str(&text, RELEASE_DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                RepoError::InvalidData(format!(
                    "invalid release date `{text}` in albums.release_date"
                ))
            }),
        None => Ok(None),
    }
}

fn missing_band_or(err: rusqlite::Error, band_id: BandId) -> RepoError {
    if is_foreign_key_violation(&err) {
        RepoError::NotFound(EntityKind::Band, band_id)
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::parse_release_date;
    use crate::repo::RepoError;
    use chrono::NaiveDate;

    #[test]
    fn parse_release_date_accepts_iso_days_only() {
        assert_eq!(
            parse_release_date(Some("1997-05-21".to_string())).unwrap(),
            NaiveDate::from_ymd_opt(1997, 5, 21)
        );
        assert_eq!(parse_release_date(None).unwrap(), None);

        let err = parse_release_date(Some("1997".to_string())).unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }
}
