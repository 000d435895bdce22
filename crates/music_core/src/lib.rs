//! Music catalog core: bands, albums and songs over SQLite.
//!
//! Layers, bottom-up: `db` (bootstrap + migrations), `model` (records),
//! `repo` (per-entity SQL), `session` (unit of work), `query` (joins and
//! reports), `service` (use-cases).

pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;
pub mod session;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::album::{Album, AlbumId, NewAlbum};
pub use model::band::{Band, BandId, NewBand};
pub use model::song::{NewSong, Song, SongId};
pub use model::ModelValidationError;
pub use query::{
    AlbumDuration, AlbumWithBand, BandAlbumCount, BandAverageLength, CatalogQueries,
    CatalogTotals, LongestSong, SongDetail,
};
pub use repo::album_repo::{AlbumRepository, SqliteAlbumRepository};
pub use repo::band_repo::{BandListQuery, BandRepository, SqliteBandRepository};
pub use repo::song_repo::{SongRepository, SqliteSongRepository};
pub use repo::{EntityKind, RepoError, RepoResult};
pub use service::catalog_service::{AlbumTracks, CatalogService, Discography};
pub use service::import_service::{
    AlbumDocument, ArtistCredit, ArtistDocument, ImportError, ImportService, ImportSummary,
    TrackDocument, TrackPage,
};
pub use session::{
    AlbumDraft, AlbumRef, BandRef, CatalogSession, SessionConfig, SessionError, SessionResult,
    SongDraft, SongRef,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
