//! Catalog browsing and editing service.
//!
//! # Responsibility
//! - Walk band → albums → songs relationships for read use-cases.
//! - Provide load-modify-store edits on top of repository contracts.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Discographies list albums in release order and songs in track order.

use crate::model::album::{Album, AlbumId};
use crate::model::band::{Band, BandId};
use crate::model::song::Song;
use crate::repo::album_repo::{AlbumRepository, SqliteAlbumRepository};
use crate::repo::band_repo::{BandRepository, SqliteBandRepository};
use crate::repo::song_repo::{SongRepository, SqliteSongRepository};
use crate::repo::{EntityKind, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::Connection;

/// One album with its songs in track order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumTracks {
    pub album: Album,
    pub songs: Vec<Song>,
}

impl AlbumTracks {
    pub fn total_seconds(&self) -> f64 {
        self.songs.iter().map(|song| song.length_seconds).sum()
    }
}

/// A band with its full album/song tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Discography {
    pub band: Band,
    pub albums: Vec<AlbumTracks>,
}

impl Discography {
    pub fn song_count(&self) -> usize {
        self.albums.iter().map(|album| album.songs.len()).sum()
    }
}

/// Service facade over band, album and song repositories.
pub struct CatalogService<B, A, S>
where
    B: BandRepository,
    A: AlbumRepository,
    S: SongRepository,
{
    bands: B,
    albums: A,
    songs: S,
}

impl<'conn>
    CatalogService<
        SqliteBandRepository<'conn>,
        SqliteAlbumRepository<'conn>,
        SqliteSongRepository<'conn>,
    >
{
    /// Builds a service over SQLite repositories sharing one connection.
    pub fn sqlite(conn: &'conn Connection) -> Self {
        Self::new(
            SqliteBandRepository::new(conn),
            SqliteAlbumRepository::new(conn),
            SqliteSongRepository::new(conn),
        )
    }
}

impl<B, A, S> CatalogService<B, A, S>
where
    B: BandRepository,
    A: AlbumRepository,
    S: SongRepository,
{
    pub fn new(bands: B, albums: A, songs: S) -> Self {
        Self {
            bands,
            albums,
            songs,
        }
    }

    /// Loads a band with every album and song, or `None` if it is unknown.
    pub fn discography(&self, band_id: BandId) -> RepoResult<Option<Discography>> {
        match self.bands.get_band(band_id)? {
            Some(band) => self.load_discography(band).map(Some),
            None => Ok(None),
        }
    }

    pub fn discography_by_name(&self, name: &str) -> RepoResult<Option<Discography>> {
        match self.bands.find_band_by_name(name)? {
            Some(band) => self.load_discography(band).map(Some),
            None => Ok(None),
        }
    }

    /// Changes an album's title, keeping its date and band.
    pub fn retitle_album(&self, album_id: AlbumId, title: &str) -> RepoResult<Album> {
        let mut album = self.require_album(album_id)?;
        album.title = title.to_string();
        self.albums.update_album(&album)?;
        Ok(album)
    }

    /// Sets or clears an album's release date.
    pub fn redate_album(
        &self,
        album_id: AlbumId,
        release_date: Option<NaiveDate>,
    ) -> RepoResult<Album> {
        let mut album = self.require_album(album_id)?;
        album.release_date = release_date;
        self.albums.update_album(&album)?;
        Ok(album)
    }

    /// Removes a band; SQLite cascades the delete to albums and songs.
    ///
    /// Returns what was removed so callers can report it.
    pub fn remove_band(&self, band_id: BandId) -> RepoResult<Discography> {
        let removed = self
            .discography(band_id)?
            .ok_or(RepoError::NotFound(EntityKind::Band, band_id))?;
        self.bands.delete_band(band_id)?;
        Ok(removed)
    }

    fn require_album(&self, album_id: AlbumId) -> RepoResult<Album> {
        self.albums
            .get_album(album_id)?
            .ok_or(RepoError::NotFound(EntityKind::Album, album_id))
    }

    fn load_discography(&self, band: Band) -> RepoResult<Discography> {
        let mut albums = Vec::new();
        for album in self.albums.list_albums_for_band(band.id)? {
            let songs = self.songs.list_songs_for_album(album.id)?;
            albums.push(AlbumTracks { album, songs });
        }
        Ok(Discography { band, albums })
    }
}
