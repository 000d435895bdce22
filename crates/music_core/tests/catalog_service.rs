use chrono::NaiveDate;
use music_core::db::open_db_in_memory;
use music_core::{
    AlbumRepository, BandRepository, CatalogQueries, CatalogService, EntityKind, NewAlbum,
    NewBand, NewSong, RepoError, SongRepository, SqliteAlbumRepository, SqliteBandRepository,
    SqliteSongRepository,
};
use rusqlite::Connection;

fn seeded() -> (Connection, i64) {
    let conn = open_db_in_memory().unwrap();
    let band_id = {
        let band = SqliteBandRepository::new(&conn)
            .create_band(&NewBand::new("Radiohead"))
            .unwrap();
        let albums = SqliteAlbumRepository::new(&conn);
        let songs = SqliteSongRepository::new(&conn);
        let kid_a = albums
            .create_album(&NewAlbum::new(band.id, "Kid A").released(date(2000, 10, 2)))
            .unwrap();
        let ok_computer = albums
            .create_album(&NewAlbum::new(band.id, "OK Computer").released(date(1997, 5, 21)))
            .unwrap();
        songs
            .create_song(&NewSong::new(kid_a.id, 2, "Kid A", 284.0))
            .unwrap();
        songs
            .create_song(&NewSong::new(kid_a.id, 1, "Everything In Its Right Place", 251.0))
            .unwrap();
        songs
            .create_song(&NewSong::new(ok_computer.id, 1, "Airbag", 284.0))
            .unwrap();
        band.id
    };
    (conn, band_id)
}

#[test]
fn discography_walks_albums_and_tracks_in_order() {
    let (conn, band_id) = seeded();
    let service = CatalogService::sqlite(&conn);

    let discography = service.discography(band_id).unwrap().unwrap();
    let titles: Vec<&str> = discography
        .albums
        .iter()
        .map(|entry| entry.album.title.as_str())
        .collect();
    assert_eq!(titles, vec!["OK Computer", "Kid A"]);
    assert_eq!(discography.song_count(), 3);

    let kid_a = &discography.albums[1];
    assert_eq!(kid_a.songs[0].title, "Everything In Its Right Place");
    assert_eq!(kid_a.total_seconds(), 535.0);

    assert!(service.discography(band_id + 100).unwrap().is_none());
    assert!(service.discography_by_name("Nobody").unwrap().is_none());
}

#[test]
fn retitle_and_redate_album_keep_other_fields() {
    let (conn, band_id) = seeded();
    let service = CatalogService::sqlite(&conn);
    let album_id = service.discography(band_id).unwrap().unwrap().albums[0]
        .album
        .id;

    let retitled = service.retitle_album(album_id, "OK Computer OKNOTOK").unwrap();
    assert_eq!(retitled.release_date, Some(date(1997, 5, 21)));
    assert_eq!(retitled.band_id, band_id);

    let undated = service.redate_album(album_id, None).unwrap();
    assert_eq!(undated.title, "OK Computer OKNOTOK");
    assert_eq!(undated.release_date, None);

    let err = service.retitle_album(album_id, "").unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let err = service.retitle_album(9_999, "Ghost").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(EntityKind::Album, 9_999)));
}

#[test]
fn remove_band_reports_and_cascades() {
    let (conn, band_id) = seeded();
    let service = CatalogService::sqlite(&conn);

    let removed = service.remove_band(band_id).unwrap();
    assert_eq!(removed.band.name, "Radiohead");
    assert_eq!(removed.albums.len(), 2);
    assert_eq!(removed.song_count(), 3);

    let totals = CatalogQueries::new(&conn).catalog_totals().unwrap();
    assert_eq!((totals.bands, totals.albums, totals.songs), (0, 0, 0));

    let err = service.remove_band(band_id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(EntityKind::Band, _)));
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
