//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory catalog databases.
//! - Configure connection pragmas required by catalog behavior.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.
//! - Returned connections report each finished statement at debug level.
//!   Only the prepared SQL text is logged; bound values never are.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{debug, error, info, log_enabled, Level};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a catalog database file and applies pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with("file", || Connection::open(path))
}

/// Opens an in-memory catalog database and applies all migrations.
///
/// Used by tests and by the CLI walkthrough when no path is configured.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with<F>(mode: &'static str, connect: F) -> DbResult<Connection>
where
    F: FnOnce() -> rusqlite::Result<Connection>,
{
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match connect() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.profile(Some(log_statement));
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}

// `sqlite3_profile` hands over the statement as prepared, with `?N`
// placeholders intact. `Connection::trace` would expand them to row values.
fn log_statement(sql: &str, elapsed: Duration) {
    if log_enabled!(Level::Debug) {
        debug!("{}", statement_line(sql, elapsed));
    }
}

fn statement_line(sql: &str, elapsed: Duration) -> String {
    let sql = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    format!(
        "event=db_statement module=db duration_us={} sql=\"{sql}\"",
        elapsed.as_micros()
    )
}

#[cfg(test)]
mod tests {
    use super::statement_line;
    use std::time::Duration;

    #[test]
    fn statement_line_collapses_whitespace_and_keeps_placeholders() {
        let line = statement_line(
            "SELECT id, name\n             FROM bands\n             WHERE name = ?1;",
            Duration::from_micros(42),
        );
        assert_eq!(
            line,
            "event=db_statement module=db duration_us=42 sql=\"SELECT id, name FROM bands WHERE name = ?1;\""
        );
    }
}
