//! Unit-of-work session over one SQLite transaction.
//!
//! # Responsibility
//! - Buffer inserts, updates and deletes until a flush.
//! - Let callers register a whole band/album/song tree before any row id
//!   exists, via pending references resolved at flush time.
//! - Flush automatically before queries issued through the session.
//!
//! # Invariants
//! - Buffered writes are applied in registration order; a parent is always
//!   registered before children that reference it.
//! - Nothing becomes durable before `commit`; `rollback` (or dropping the
//!   session) discards both flushed and pending writes.
//! - A pending reference is only valid in the session that issued it.

use crate::model::album::{Album, AlbumId, NewAlbum};
use crate::model::band::{Band, BandId, NewBand};
use crate::model::song::{NewSong, Song, SongId};
use crate::query::CatalogQueries;
use crate::repo::album_repo::{AlbumRepository, SqliteAlbumRepository};
use crate::repo::band_repo::{BandRepository, SqliteBandRepository};
use crate::repo::song_repo::{SongRepository, SqliteSongRepository};
use crate::repo::{EntityKind, RepoError};
use chrono::NaiveDate;
use log::{debug, info, warn};
use rusqlite::{Connection, Transaction};
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

pub type SessionResult<T> = Result<T, SessionError>;

/// Error raised by session flush, commit or lookups.
#[derive(Debug)]
pub enum SessionError {
    /// A buffered write failed; it stays at the head of the pending queue.
    Repo(RepoError),
    /// A pending reference was issued by another session or was never
    /// registered.
    UnresolvedReference(EntityKind),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::UnresolvedReference(kind) => {
                write!(f, "pending {kind} reference does not belong to this session")
            }
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::UnresolvedReference(_) => None,
        }
    }
}

impl From<RepoError> for SessionError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for SessionError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Session behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Flush pending writes before every query issued through the session.
    pub autoflush: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { autoflush: true }
    }
}

/// Handle to an entity registered with a session but possibly not flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingKey {
    session: u64,
    seq: u32,
}

/// Reference to a band that is either persisted or pending in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandRef {
    Persisted(BandId),
    Pending(PendingKey),
}

impl From<&Band> for BandRef {
    fn from(value: &Band) -> Self {
        Self::Persisted(value.id)
    }
}

/// Reference to an album that is either persisted or pending in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumRef {
    Persisted(AlbumId),
    Pending(PendingKey),
}

impl From<&Album> for AlbumRef {
    fn from(value: &Album) -> Self {
        Self::Persisted(value.id)
    }
}

/// Reference to a song registered with a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongRef {
    Persisted(SongId),
    Pending(PendingKey),
}

/// Album to insert, owned by a persisted or pending band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumDraft {
    pub band: BandRef,
    pub title: String,
    pub release_date: Option<NaiveDate>,
}

impl AlbumDraft {
    pub fn new(band: BandRef, title: impl Into<String>) -> Self {
        Self {
            band,
            title: title.into(),
            release_date: None,
        }
    }

    pub fn released(mut self, date: Option<NaiveDate>) -> Self {
        self.release_date = date;
        self
    }
}

/// Song to insert, owned by a persisted or pending album.
#[derive(Debug, Clone, PartialEq)]
pub struct SongDraft {
    pub album: AlbumRef,
    pub title: String,
    pub track_num: i64,
    pub length_seconds: f64,
}

impl SongDraft {
    pub fn new(
        album: AlbumRef,
        track_num: i64,
        title: impl Into<String>,
        length_seconds: f64,
    ) -> Self {
        Self {
            album,
            title: title.into(),
            track_num,
            length_seconds,
        }
    }
}

#[derive(Debug, Clone)]
enum PendingWrite {
    InsertBand(PendingKey, NewBand),
    InsertAlbum(PendingKey, AlbumDraft),
    InsertSong(PendingKey, SongDraft),
    RenameBand(BandId, String),
    UpdateAlbum(Album),
    UpdateSong(Song),
    DeleteBand(BandId),
    DeleteAlbum(AlbumId),
    DeleteSong(SongId),
}

/// Unit of work bound to one open transaction.
pub struct CatalogSession<'conn> {
    tx: Transaction<'conn>,
    config: SessionConfig,
    session_id: u64,
    next_seq: u32,
    pending: VecDeque<PendingWrite>,
    resolved: HashMap<PendingKey, i64>,
}

impl<'conn> CatalogSession<'conn> {
    /// Opens a deferred transaction and returns an empty session over it.
    pub fn begin(conn: &'conn mut Connection, config: SessionConfig) -> SessionResult<Self> {
        let tx = conn.transaction()?;
        let session_id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        debug!(
            "event=session_begin module=session status=ok session={session_id} autoflush={}",
            config.autoflush
        );
        Ok(Self {
            tx,
            config,
            session_id,
            next_seq: 0,
            pending: VecDeque::new(),
            resolved: HashMap::new(),
        })
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Number of buffered writes not yet flushed.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn add_band(&mut self, band: NewBand) -> BandRef {
        let key = self.next_key();
        self.pending.push_back(PendingWrite::InsertBand(key, band));
        BandRef::Pending(key)
    }

    pub fn add_album(&mut self, album: AlbumDraft) -> AlbumRef {
        let key = self.next_key();
        self.pending.push_back(PendingWrite::InsertAlbum(key, album));
        AlbumRef::Pending(key)
    }

    pub fn add_song(&mut self, song: SongDraft) -> SongRef {
        let key = self.next_key();
        self.pending.push_back(PendingWrite::InsertSong(key, song));
        SongRef::Pending(key)
    }

    pub fn rename_band(&mut self, id: BandId, name: impl Into<String>) {
        self.pending
            .push_back(PendingWrite::RenameBand(id, name.into()));
    }

    pub fn update_album(&mut self, album: Album) {
        self.pending.push_back(PendingWrite::UpdateAlbum(album));
    }

    pub fn update_song(&mut self, song: Song) {
        self.pending.push_back(PendingWrite::UpdateSong(song));
    }

    /// Buffers a band delete; its albums and songs go with it.
    pub fn delete_band(&mut self, id: BandId) {
        self.pending.push_back(PendingWrite::DeleteBand(id));
    }

    pub fn delete_album(&mut self, id: AlbumId) {
        self.pending.push_back(PendingWrite::DeleteAlbum(id));
    }

    pub fn delete_song(&mut self, id: SongId) {
        self.pending.push_back(PendingWrite::DeleteSong(id));
    }

    /// Applies buffered writes inside the open transaction.
    ///
    /// Returns how many writes were applied. On failure the failing write
    /// and everything after it stay buffered; writes applied before it stay
    /// in the transaction until `commit` or `rollback`.
    pub fn flush(&mut self) -> SessionResult<usize> {
        let mut applied = 0;
        while let Some(write) = self.pending.front() {
            match self.apply(write) {
                Ok(Some((key, id))) => {
                    self.resolved.insert(key, id);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        "event=session_flush module=session status=error session={} applied={applied} remaining={} error={err}",
                        self.session_id,
                        self.pending.len()
                    );
                    return Err(err);
                }
            }
            self.pending.pop_front();
            applied += 1;
        }

        if applied > 0 {
            debug!(
                "event=session_flush module=session status=ok session={} applied={applied}",
                self.session_id
            );
        }
        Ok(applied)
    }

    /// Returns the transaction's connection for repository access, flushing
    /// first when autoflush is enabled.
    pub fn connection(&mut self) -> SessionResult<&Connection> {
        self.autoflush()?;
        let conn: &Connection = &self.tx;
        Ok(conn)
    }

    /// Returns the read-query facade, flushing first when autoflush is on.
    pub fn queries(&mut self) -> SessionResult<CatalogQueries<'_>> {
        self.autoflush()?;
        Ok(CatalogQueries::new(&self.tx))
    }

    /// Resolves a band reference to its row id.
    ///
    /// Returns `None` for a pending band that has not been flushed yet
    /// (only possible with autoflush disabled).
    pub fn band_id(&mut self, band: BandRef) -> SessionResult<Option<BandId>> {
        match band {
            BandRef::Persisted(id) => Ok(Some(id)),
            BandRef::Pending(key) => self.lookup_pending(key, EntityKind::Band),
        }
    }

    pub fn album_id(&mut self, album: AlbumRef) -> SessionResult<Option<AlbumId>> {
        match album {
            AlbumRef::Persisted(id) => Ok(Some(id)),
            AlbumRef::Pending(key) => self.lookup_pending(key, EntityKind::Album),
        }
    }

    pub fn song_id(&mut self, song: SongRef) -> SessionResult<Option<SongId>> {
        match song {
            SongRef::Persisted(id) => Ok(Some(id)),
            SongRef::Pending(key) => self.lookup_pending(key, EntityKind::Song),
        }
    }

    /// Flushes remaining writes and commits the transaction.
    ///
    /// Returns the number of writes flushed by this call.
    pub fn commit(mut self) -> SessionResult<usize> {
        let flushed = self.flush()?;
        self.tx.commit()?;
        info!(
            "event=session_commit module=session status=ok session={} flushed={flushed}",
            self.session_id
        );
        Ok(flushed)
    }

    /// Discards pending writes and rolls back flushed ones.
    ///
    /// Returns the number of pending writes that were never flushed.
    pub fn rollback(self) -> SessionResult<usize> {
        let discarded = self.pending.len();
        self.tx.rollback()?;
        info!(
            "event=session_rollback module=session status=ok session={} discarded={discarded}",
            self.session_id
        );
        Ok(discarded)
    }

    fn next_key(&mut self) -> PendingKey {
        let key = PendingKey {
            session: self.session_id,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        key
    }

    fn autoflush(&mut self) -> SessionResult<()> {
        if self.config.autoflush && self.is_dirty() {
            self.flush()?;
        }
        Ok(())
    }

    fn lookup_pending(&mut self, key: PendingKey, kind: EntityKind) -> SessionResult<Option<i64>> {
        if key.session != self.session_id || key.seq >= self.next_seq {
            return Err(SessionError::UnresolvedReference(kind));
        }
        self.autoflush()?;
        Ok(self.resolved.get(&key).copied())
    }

    fn resolve(&self, key: PendingKey, kind: EntityKind) -> SessionResult<i64> {
        if key.session != self.session_id {
            return Err(SessionError::UnresolvedReference(kind));
        }
        self.resolved
            .get(&key)
            .copied()
            .ok_or(SessionError::UnresolvedReference(kind))
    }

    fn resolve_band(&self, band: BandRef) -> SessionResult<BandId> {
        match band {
            BandRef::Persisted(id) => Ok(id),
            BandRef::Pending(key) => self.resolve(key, EntityKind::Band),
        }
    }

    fn resolve_album(&self, album: AlbumRef) -> SessionResult<AlbumId> {
        match album {
            AlbumRef::Persisted(id) => Ok(id),
            AlbumRef::Pending(key) => self.resolve(key, EntityKind::Album),
        }
    }

    fn apply(&self, write: &PendingWrite) -> SessionResult<Option<(PendingKey, i64)>> {
        let conn: &Connection = &self.tx;
        match write {
            PendingWrite::InsertBand(key, band) => {
                let created = SqliteBandRepository::new(conn).create_band(band)?;
                Ok(Some((*key, created.id)))
            }
            PendingWrite::InsertAlbum(key, draft) => {
                let album = NewAlbum {
                    title: draft.title.clone(),
                    release_date: draft.release_date,
                    band_id: self.resolve_band(draft.band)?,
                };
                let created = SqliteAlbumRepository::new(conn).create_album(&album)?;
                Ok(Some((*key, created.id)))
            }
            PendingWrite::InsertSong(key, draft) => {
                let song = NewSong {
                    title: draft.title.clone(),
                    track_num: draft.track_num,
                    length_seconds: draft.length_seconds,
                    album_id: self.resolve_album(draft.album)?,
                };
                let created = SqliteSongRepository::new(conn).create_song(&song)?;
                Ok(Some((*key, created.id)))
            }
            PendingWrite::RenameBand(id, name) => {
                SqliteBandRepository::new(conn).rename_band(*id, name)?;
                Ok(None)
            }
            PendingWrite::UpdateAlbum(album) => {
                SqliteAlbumRepository::new(conn).update_album(album)?;
                Ok(None)
            }
            PendingWrite::UpdateSong(song) => {
                SqliteSongRepository::new(conn).update_song(song)?;
                Ok(None)
            }
            PendingWrite::DeleteBand(id) => {
                SqliteBandRepository::new(conn).delete_band(*id)?;
                Ok(None)
            }
            PendingWrite::DeleteAlbum(id) => {
                SqliteAlbumRepository::new(conn).delete_album(*id)?;
                Ok(None)
            }
            PendingWrite::DeleteSong(id) => {
                SqliteSongRepository::new(conn).delete_song(*id)?;
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AlbumDraft, CatalogSession, SessionConfig, SessionError, SongDraft};
    use crate::db::open_db_in_memory;
    use crate::model::band::NewBand;
    use crate::repo::EntityKind;

    #[test]
    fn pending_children_resolve_parent_ids_on_flush() {
        let mut conn = open_db_in_memory().unwrap();
        let mut session = CatalogSession::begin(&mut conn, SessionConfig::default()).unwrap();

        let band = session.add_band(NewBand::new("Radiohead"));
        let album = session.add_album(AlbumDraft::new(band, "OK Computer"));
        session.add_song(SongDraft::new(album, 1, "Airbag", 284.0));
        assert_eq!(session.pending_count(), 3);

        assert_eq!(session.flush().unwrap(), 3);
        assert!(!session.is_dirty());
        assert!(session.band_id(band).unwrap().is_some());
        assert!(session.album_id(album).unwrap().is_some());
    }

    #[test]
    fn references_from_another_session_are_rejected() {
        let mut first_conn = open_db_in_memory().unwrap();
        let mut second_conn = open_db_in_memory().unwrap();
        let mut first = CatalogSession::begin(&mut first_conn, SessionConfig::default()).unwrap();
        let mut second =
            CatalogSession::begin(&mut second_conn, SessionConfig::default()).unwrap();

        let foreign_band = first.add_band(NewBand::new("Portishead"));
        let err = second.band_id(foreign_band).unwrap_err();
        assert!(matches!(
            err,
            SessionError::UnresolvedReference(EntityKind::Band)
        ));
    }

    #[test]
    fn without_autoflush_pending_band_has_no_id() {
        let mut conn = open_db_in_memory().unwrap();
        let mut session =
            CatalogSession::begin(&mut conn, SessionConfig { autoflush: false }).unwrap();

        let band = session.add_band(NewBand::new("Massive Attack"));
        assert_eq!(session.band_id(band).unwrap(), None);
        assert_eq!(session.pending_count(), 1);

        session.flush().unwrap();
        assert!(session.band_id(band).unwrap().is_some());
    }
}
