//! Music catalog walkthrough.
//!
//! Opens (or creates) a catalog, seeds it when empty, then runs through
//! filters, joins, aggregates, subqueries, session writes, rollback,
//! update and cascading delete, printing each result.

mod config;

use chrono::NaiveDate;
use config::CliConfig;
use log::info;
use music_core::db::{open_db, open_db_in_memory};
use music_core::{
    core_version, init_logging, AlbumDraft, CatalogQueries, CatalogService, CatalogSession,
    ImportService, NewBand, SessionConfig, SongDraft,
};
use rusqlite::Connection;
use std::error::Error;
use std::process::ExitCode;

const SAMPLE_CATALOG: &str = include_str!("../data/sample_catalog.json");

fn main() -> ExitCode {
    let config = CliConfig::from_env_and_args(std::env::args().skip(1));
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("music_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &CliConfig) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }
    println!("music_core version={}", core_version());

    let mut conn = match config.db_path.as_ref() {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };

    seed_if_empty(&mut conn, config)?;
    print_queries(&conn)?;
    demonstrate_session(&mut conn)?;
    Ok(())
}

fn seed_if_empty(conn: &mut Connection, config: &CliConfig) -> Result<(), Box<dyn Error>> {
    let totals = CatalogQueries::new(conn).catalog_totals()?;
    if totals.bands > 0 {
        println!("catalog already holds {} bands; skipping seed", totals.bands);
        return Ok(());
    }

    let payload = match config.seed_path.as_ref() {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE_CATALOG.to_string(),
    };
    let summary = ImportService::new(conn).import_json(&payload)?;
    println!(
        "seeded bands={} albums={} songs={} skipped_albums={}",
        summary.bands, summary.albums, summary.songs, summary.skipped_albums
    );
    Ok(())
}

fn print_queries(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let queries = CatalogQueries::new(conn);

    section("bands matching `head`");
    for band in queries.bands_matching("head")? {
        println!("  {band}");
    }

    section("albums released in the 1990s");
    let from = date(1990, 1, 1)?;
    let to = date(1999, 12, 31)?;
    for entry in queries.albums_released_between(from, to)? {
        println!("  {} by {}", entry.album, entry.band_name);
    }

    section("undated albums");
    for entry in queries.undated_albums()? {
        println!("  {} by {}", entry.album.title, entry.band_name);
    }

    section("songs longer than 5 minutes");
    for detail in queries.songs_longer_than(300.0)? {
        println!(
            "  {:>6.1}s {} ({} / {})",
            detail.song.length_seconds, detail.song.title, detail.band_name, detail.album_title
        );
    }

    section("album counts per band");
    for count in queries.album_counts_per_band()? {
        println!("  {:<16} {}", count.band.name, count.album_count);
    }

    section("album durations");
    for duration in queries.album_durations()? {
        println!(
            "  {:<24} tracks={} total={:.1}s",
            duration.album.title, duration.track_count, duration.total_seconds
        );
    }

    section("average song length per band");
    for average in queries.average_song_length_per_band()? {
        println!(
            "  {:<16} songs={} avg={:.1}s",
            average.band.name, average.song_count, average.average_seconds
        );
    }

    section("albums with at least 3 tracks");
    for entry in queries.albums_with_min_tracks(3)? {
        println!("  {}", entry.album.title);
    }

    section("longest song per album");
    for longest in queries.longest_song_per_album()? {
        println!("  {:<24} {}", longest.album.title, longest.song.title);
    }

    section("songs longer than their album average");
    for detail in queries.songs_longer_than_album_average()? {
        println!("  {} ({})", detail.song.title, detail.album_title);
    }

    section("bands without albums");
    for band in queries.bands_without_albums()? {
        println!("  {band}");
    }

    let totals = queries.catalog_totals()?;
    section("totals");
    println!(
        "  bands={} albums={} songs={} playing_time={:.1}s",
        totals.bands, totals.albums, totals.songs, totals.total_seconds
    );
    Ok(())
}

fn demonstrate_session(conn: &mut Connection) -> Result<(), Box<dyn Error>> {
    section("session: autoflush then rollback");
    {
        let mut session = CatalogSession::begin(conn, SessionConfig::default())?;
        session.add_band(NewBand::new("Boards of Canada"));
        println!(
            "  autoflush={} pending writes before query: {}",
            session.config().autoflush,
            session.pending_count()
        );
        let visible = session.queries()?.bands_matching("Boards")?;
        println!("  visible inside session after autoflush: {}", visible.len());
        session.rollback()?;
    }
    let after_rollback = CatalogQueries::new(conn).bands_matching("Boards")?;
    println!("  visible after rollback: {}", after_rollback.len());

    section("session: commit, update, cascading delete");
    let band_id = {
        let mut session = CatalogSession::begin(conn, SessionConfig::default())?;
        let band = session.add_band(NewBand::new("Boards of Canada"));
        let album = session.add_album(AlbumDraft::new(band, "Music Has the Right to Children"));
        session.add_song(SongDraft::new(album, 1, "Wildlife Analysis", 77.0));
        session.add_song(SongDraft::new(album, 2, "An Eagle in Your Mind", 383.0));
        let band_id = session.band_id(band)?.ok_or("band id missing after flush")?;
        session.commit()?;
        band_id
    };

    let service = CatalogService::sqlite(conn);
    if let Some(discography) = service.discography(band_id)? {
        if let Some(first) = discography.albums.first() {
            let retitled = service
                .retitle_album(first.album.id, "Music Has the Right to Children (Remaster)")?;
            println!("  retitled: {retitled}");
        }
    }
    let removed = service.remove_band(band_id)?;
    println!(
        "  removed {} with {} albums and {} songs",
        removed.band,
        removed.albums.len(),
        removed.song_count()
    );
    info!("event=walkthrough module=cli status=ok");
    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate, Box<dyn Error>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| format!("invalid date {year}-{month}-{day}").into())
}

fn section(title: &str) {
    println!();
    println!("== {title}");
}
