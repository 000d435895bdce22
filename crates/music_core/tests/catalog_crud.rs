use chrono::NaiveDate;
use music_core::db::open_db_in_memory;
use music_core::{
    AlbumRepository, BandListQuery, BandRepository, EntityKind, ModelValidationError, NewAlbum,
    NewBand, NewSong, RepoError, SongRepository, SqliteAlbumRepository, SqliteBandRepository,
    SqliteSongRepository,
};

#[test]
fn create_and_get_band_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let bands = SqliteBandRepository::new(&conn);

    let created = bands.create_band(&NewBand::new("Radiohead")).unwrap();
    let loaded = bands.get_band(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(
        bands.find_band_by_name("Radiohead").unwrap(),
        Some(created.clone())
    );
    assert_eq!(bands.find_band_by_name("radiohead").unwrap(), None);
    assert_eq!(loaded.to_string(), format!("<Band id={} name=Radiohead>", created.id));
}

#[test]
fn duplicate_band_name_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let bands = SqliteBandRepository::new(&conn);
    bands.create_band(&NewBand::new("Portishead")).unwrap();
    let other = bands.create_band(&NewBand::new("Tricky")).unwrap();

    let err = bands.create_band(&NewBand::new("Portishead")).unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    let err = bands.rename_band(other.id, "Portishead").unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));
}

#[test]
fn blank_band_name_is_rejected_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let bands = SqliteBandRepository::new(&conn);

    let err = bands.create_band(&NewBand::new("   ")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ModelValidationError::EmptyText { .. })
    ));
}

#[test]
fn list_bands_filters_and_paginates_by_name() {
    let conn = open_db_in_memory().unwrap();
    let bands = SqliteBandRepository::new(&conn);
    for name in ["Radiohead", "Portishead", "Massive Attack", "Motörhead"] {
        bands.create_band(&NewBand::new(name)).unwrap();
    }

    let heads = bands
        .list_bands(&BandListQuery {
            name_contains: Some("HEAD".to_string()),
            ..BandListQuery::default()
        })
        .unwrap();
    let names: Vec<&str> = heads.iter().map(|band| band.name.as_str()).collect();
    assert_eq!(names, vec!["Motörhead", "Portishead", "Radiohead"]);

    let page = bands
        .list_bands(&BandListQuery {
            name_contains: None,
            limit: Some(2),
            offset: 1,
        })
        .unwrap();
    let names: Vec<&str> = page.iter().map(|band| band.name.as_str()).collect();
    assert_eq!(names, vec!["Motörhead", "Portishead"]);
}

#[test]
fn album_for_unknown_band_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let albums = SqliteAlbumRepository::new(&conn);

    let err = albums
        .create_album(&NewAlbum::new(999, "Orphan"))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(EntityKind::Band, 999)));
}

#[test]
fn song_for_unknown_album_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let songs = SqliteSongRepository::new(&conn);

    let err = songs
        .create_song(&NewSong::new(42, 1, "Lost", 120.0))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(EntityKind::Album, 42)));
}

#[test]
fn albums_list_in_release_order_with_undated_last() {
    let conn = open_db_in_memory().unwrap();
    let band = SqliteBandRepository::new(&conn)
        .create_band(&NewBand::new("Radiohead"))
        .unwrap();
    let albums = SqliteAlbumRepository::new(&conn);

    let undated = albums
        .create_album(&NewAlbum::new(band.id, "I Might Be Wrong"))
        .unwrap();
    let kid_a = albums
        .create_album(&NewAlbum::new(band.id, "Kid A").released(date(2000, 10, 2)))
        .unwrap();
    let ok_computer = albums
        .create_album(&NewAlbum::new(band.id, "OK Computer").released(date(1997, 5, 21)))
        .unwrap();

    let listed: Vec<i64> = albums
        .list_albums_for_band(band.id)
        .unwrap()
        .iter()
        .map(|album| album.id)
        .collect();
    assert_eq!(listed, vec![ok_computer.id, kid_a.id, undated.id]);

    let loaded = albums.get_album(ok_computer.id).unwrap().unwrap();
    assert_eq!(loaded.release_date, Some(date(1997, 5, 21)));
}

#[test]
fn update_album_and_song_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let band = SqliteBandRepository::new(&conn)
        .create_band(&NewBand::new("Portishead"))
        .unwrap();
    let albums = SqliteAlbumRepository::new(&conn);
    let songs = SqliteSongRepository::new(&conn);

    let mut album = albums
        .create_album(&NewAlbum::new(band.id, "Dumy"))
        .unwrap();
    album.title = "Dummy".to_string();
    album.release_date = Some(date(1994, 8, 22));
    albums.update_album(&album).unwrap();
    assert_eq!(albums.get_album(album.id).unwrap(), Some(album.clone()));

    let mut song = songs
        .create_song(&NewSong::new(album.id, 2, "Sour Times", 251.0))
        .unwrap();
    song.length_seconds = 254.5;
    songs.update_song(&song).unwrap();
    assert_eq!(songs.get_song(song.id).unwrap(), Some(song.clone()));

    let mut missing = song.clone();
    missing.id = 10_000;
    let err = songs.update_song(&missing).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(EntityKind::Song, 10_000)));
}

#[test]
fn track_listing_is_ordered_by_track_number() {
    let conn = open_db_in_memory().unwrap();
    let band = SqliteBandRepository::new(&conn)
        .create_band(&NewBand::new("Radiohead"))
        .unwrap();
    let album = SqliteAlbumRepository::new(&conn)
        .create_album(&NewAlbum::new(band.id, "OK Computer"))
        .unwrap();
    let songs = SqliteSongRepository::new(&conn);
    songs
        .create_song(&NewSong::new(album.id, 3, "Subterranean Homesick Alien", 267.0))
        .unwrap();
    songs
        .create_song(&NewSong::new(album.id, 1, "Airbag", 284.0))
        .unwrap();
    songs
        .create_song(&NewSong::new(album.id, 2, "Paranoid Android", 383.0))
        .unwrap();

    let tracks: Vec<i64> = songs
        .list_songs_for_album(album.id)
        .unwrap()
        .iter()
        .map(|song| song.track_num)
        .collect();
    assert_eq!(tracks, vec![1, 2, 3]);
}

#[test]
fn deleting_band_cascades_to_albums_and_songs() {
    let conn = open_db_in_memory().unwrap();
    let bands = SqliteBandRepository::new(&conn);
    let albums = SqliteAlbumRepository::new(&conn);
    let songs = SqliteSongRepository::new(&conn);

    let doomed = bands.create_band(&NewBand::new("Radiohead")).unwrap();
    let kept = bands.create_band(&NewBand::new("Portishead")).unwrap();
    let doomed_album = albums
        .create_album(&NewAlbum::new(doomed.id, "Kid A"))
        .unwrap();
    let kept_album = albums
        .create_album(&NewAlbum::new(kept.id, "Dummy"))
        .unwrap();
    let doomed_song = songs
        .create_song(&NewSong::new(doomed_album.id, 1, "Kid A", 284.0))
        .unwrap();
    let kept_song = songs
        .create_song(&NewSong::new(kept_album.id, 1, "Mysterons", 302.0))
        .unwrap();

    bands.delete_band(doomed.id).unwrap();

    assert_eq!(bands.get_band(doomed.id).unwrap(), None);
    assert_eq!(albums.get_album(doomed_album.id).unwrap(), None);
    assert_eq!(songs.get_song(doomed_song.id).unwrap(), None);
    assert!(albums.get_album(kept_album.id).unwrap().is_some());
    assert!(songs.get_song(kept_song.id).unwrap().is_some());

    let err = bands.delete_band(doomed.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(EntityKind::Band, _)));
}

#[test]
fn invalid_persisted_release_date_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let band = SqliteBandRepository::new(&conn)
        .create_band(&NewBand::new("Radiohead"))
        .unwrap();
    conn.execute(
        "INSERT INTO albums (title, release_date, band_id) VALUES ('Broken', 'someday', ?1);",
        [band.id],
    )
    .unwrap();

    let err = SqliteAlbumRepository::new(&conn)
        .list_albums_for_band(band.id)
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}
