//! Band record.

use super::{validate_text, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// SQLite row id of a band.
pub type BandId = i64;

/// Persisted band. `name` is unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub id: BandId,
    pub name: String,
}

impl Band {
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_text("band name", &self.name)
    }
}

impl Display for Band {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<Band id={} name={}>", self.id, self.name)
    }
}

/// Band that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBand {
    pub name: String,
}

impl NewBand {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        validate_text("band name", &self.name)
    }
}
