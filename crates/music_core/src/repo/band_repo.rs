//! Band repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `bands` table.
//! - Translate the unique-name constraint into `RepoError::Conflict`.
//!
//! # Invariants
//! - Band names are unique; comparisons for lookups are exact.
//! - `delete_band` relies on `ON DELETE CASCADE` to remove albums and songs.

use crate::model::band::{Band, BandId, NewBand};
use crate::repo::{
    is_unique_violation, like_contains, push_pagination, EntityKind, RepoError, RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const BAND_SELECT_SQL: &str = "SELECT id, name FROM bands";

/// Query options for listing bands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BandListQuery {
    /// Case-insensitive substring filter on `name`.
    pub name_contains: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for band CRUD operations.
pub trait BandRepository {
    fn create_band(&self, band: &NewBand) -> RepoResult<Band>;
    fn get_band(&self, id: BandId) -> RepoResult<Option<Band>>;
    fn find_band_by_name(&self, name: &str) -> RepoResult<Option<Band>>;
    /// Lists bands ordered by `name ASC, id ASC`.
    fn list_bands(&self, query: &BandListQuery) -> RepoResult<Vec<Band>>;
    fn rename_band(&self, id: BandId, name: &str) -> RepoResult<Band>;
    /// Deletes one band together with its albums and songs.
    fn delete_band(&self, id: BandId) -> RepoResult<()>;
}

/// SQLite-backed band repository.
///
/// Borrows the connection, so it can run on a plain connection or inside an
/// open transaction (which derefs to `Connection`).
pub struct SqliteBandRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBandRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BandRepository for SqliteBandRepository<'_> {
    fn create_band(&self, band: &NewBand) -> RepoResult<Band> {
        band.validate()?;

        self.conn
            .execute("INSERT INTO bands (name) VALUES (?1);", [band.name.as_str()])
            .map_err(|err| duplicate_name_or(err, &band.name))?;

        Ok(Band {
            id: self.conn.last_insert_rowid(),
            name: band.name.clone(),
        })
    }

    fn get_band(&self, id: BandId) -> RepoResult<Option<Band>> {
        let row = self
            .conn
            .query_row(
                &format!("{BAND_SELECT_SQL} WHERE id = ?1;"),
                [id],
                band_from_row,
            )
            .optional()?;
        row.map(checked).transpose()
    }

    fn find_band_by_name(&self, name: &str) -> RepoResult<Option<Band>> {
        let row = self
            .conn
            .query_row(
                &format!("{BAND_SELECT_SQL} WHERE name = ?1;"),
                [name],
                band_from_row,
            )
            .optional()?;
        row.map(checked).transpose()
    }

    fn list_bands(&self, query: &BandListQuery) -> RepoResult<Vec<Band>> {
        let mut sql = format!("{BAND_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(needle) = query.name_contains.as_deref() {
            sql.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(like_contains(needle)));
        }

        sql.push_str(" ORDER BY name ASC, id ASC");
        push_pagination(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind_values), band_from_row)?;
        let mut bands = Vec::new();
        for row in rows {
            bands.push(checked(row?)?);
        }
        Ok(bands)
    }

    fn rename_band(&self, id: BandId, name: &str) -> RepoResult<Band> {
        let band = Band {
            id,
            name: name.to_string(),
        };
        band.validate()?;

        let changed = self
            .conn
            .execute("UPDATE bands SET name = ?1 WHERE id = ?2;", params![name, id])
            .map_err(|err| duplicate_name_or(err, name))?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Band, id));
        }

        Ok(band)
    }

    fn delete_band(&self, id: BandId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM bands WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityKind::Band, id));
        }
        Ok(())
    }
}

fn band_from_row(row: &Row<'_>) -> rusqlite::Result<Band> {
    Ok(Band {
        id: row.get("id")?,
        name: row.get("name")?,
    })
}

/// Decodes and validates one row carrying `id` and `name` columns.
pub(crate) fn parse_band_row(row: &Row<'_>) -> RepoResult<Band> {
    checked(band_from_row(row)?)
}

fn checked(band: Band) -> RepoResult<Band> {
    band.validate().map_err(|err| {
        RepoError::InvalidData(format!("bands row {} failed validation: {err}", band.id))
    })?;
    Ok(band)
}

fn duplicate_name_or(err: rusqlite::Error, name: &str) -> RepoError {
    if is_unique_violation(&err) {
        RepoError::Conflict(format!("band name `{name}` already exists"))
    } else {
        err.into()
    }
}
