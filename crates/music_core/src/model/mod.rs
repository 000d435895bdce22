//! Catalog domain model: bands, their albums, and album songs.
//!
//! # Responsibility
//! - Define the flat records mapped onto the `bands`, `albums` and `songs`
//!   tables.
//! - Provide validation shared by repository write and read paths.
//!
//! # Invariants
//! - Every album belongs to exactly one band; every song to one album.
//! - Ids are SQLite-assigned surrogate keys and never reused by the model.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod album;
pub mod band;
pub mod song;

/// Upper bound for band names and album/song titles, in characters.
pub const MAX_TEXT_CHARS: usize = 255;

/// Validation failure for a catalog record.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelValidationError {
    /// Required text field is empty or whitespace-only.
    EmptyText { field: &'static str },
    /// Text field exceeds [`MAX_TEXT_CHARS`].
    TextTooLong { field: &'static str, chars: usize },
    /// Track numbers start at 1.
    InvalidTrackNumber(i64),
    /// Song length must be a finite, non-negative number of seconds.
    InvalidLength(f64),
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText { field } => write!(f, "{field} must not be empty"),
            Self::TextTooLong { field, chars } => write!(
                f,
                "{field} has {chars} characters; at most {MAX_TEXT_CHARS} are allowed"
            ),
            Self::InvalidTrackNumber(value) => {
                write!(f, "track number must be >= 1, got {value}")
            }
            Self::InvalidLength(value) => {
                write!(f, "song length must be finite and >= 0, got {value}")
            }
        }
    }
}

impl Error for ModelValidationError {}

pub(crate) fn validate_text(field: &'static str, value: &str) -> Result<(), ModelValidationError> {
    if value.trim().is_empty() {
        return Err(ModelValidationError::EmptyText { field });
    }
    let chars = value.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(ModelValidationError::TextTooLong { field, chars });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_text, ModelValidationError, MAX_TEXT_CHARS};

    #[test]
    fn validate_text_rejects_blank_and_oversized_values() {
        assert_eq!(
            validate_text("name", "  \t"),
            Err(ModelValidationError::EmptyText { field: "name" })
        );

        let long = "x".repeat(MAX_TEXT_CHARS + 1);
        assert!(matches!(
            validate_text("title", &long),
            Err(ModelValidationError::TextTooLong { field: "title", .. })
        ));

        let exact = "é".repeat(MAX_TEXT_CHARS);
        assert!(validate_text("title", &exact).is_ok());
    }
}
