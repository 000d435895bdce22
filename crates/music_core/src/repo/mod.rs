//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-entity data access contracts for bands, albums and songs.
//! - Isolate SQLite statements and constraint decoding from sessions,
//!   queries and services.
//!
//! # Invariants
//! - Repository writes call the record's `validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Constraint failures surface as semantic errors (`Conflict`,
//!   `NotFound`) rather than raw SQLite errors.

use crate::db::DbError;
use crate::model::ModelValidationError;
use rusqlite::types::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::os::raw::c_int;

pub mod album_repo;
pub mod band_repo;
pub mod song_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Catalog entity kind, used to qualify not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Band,
    Album,
    Song,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Band => f.write_str("band"),
            Self::Album => f.write_str("album"),
            Self::Song => f.write_str("song"),
        }
    }
}

/// Repository error for catalog persistence and lookups.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    /// Target row, or the parent row a write refers to, does not exist.
    NotFound(EntityKind, i64),
    /// Write violates a uniqueness rule (e.g. duplicate band name).
    Conflict(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(kind, id) => write!(f, "{kind} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted catalog data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(..) | Self::Conflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    has_extended_code(err, rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    has_extended_code(err, rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
}

fn has_extended_code(err: &rusqlite::Error, code: c_int) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(inner, _) if inner.extended_code == code)
}

/// Builds a `LIKE ... ESCAPE '\'` operand matching `needle` as a substring.
///
/// `%`, `_` and `\` in the needle are matched literally.
pub(crate) fn like_contains(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Appends `LIMIT`/`OFFSET` clauses and their bind values.
pub(crate) fn push_pagination(
    sql: &mut String,
    bind_values: &mut Vec<Value>,
    limit: Option<u32>,
    offset: u32,
) {
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(offset)));
        }
    } else if offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(offset)));
    }
}

#[cfg(test)]
mod tests {
    use super::{like_contains, push_pagination};

    #[test]
    fn like_contains_escapes_wildcards() {
        assert_eq!(like_contains("AC/DC"), "%AC/DC%");
        assert_eq!(like_contains("100%_"), "%100\\%\\_%");
    }

    #[test]
    fn pagination_uses_unbounded_limit_for_offset_only() {
        let mut sql = String::from("SELECT 1");
        let mut values = Vec::new();
        push_pagination(&mut sql, &mut values, None, 5);
        assert_eq!(sql, "SELECT 1 LIMIT -1 OFFSET ?");
        assert_eq!(values.len(), 1);
    }
}
