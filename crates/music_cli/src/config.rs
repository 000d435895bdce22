//! CLI configuration from environment variables and positional arguments.
//!
//! Positional arguments override environment variables:
//! `music_cli [DB_PATH] [SEED_JSON]`.

use music_core::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "MUSIC_CATALOG_DB";
pub const SEED_PATH_ENV: &str = "MUSIC_CATALOG_SEED";
pub const LOG_DIR_ENV: &str = "MUSIC_CATALOG_LOG_DIR";
pub const LOG_LEVEL_ENV: &str = "MUSIC_CATALOG_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// `None` runs against an in-memory database.
    pub db_path: Option<PathBuf>,
    /// `None` seeds from the bundled sample catalog.
    pub seed_path: Option<PathBuf>,
    /// `None` leaves file logging disabled.
    pub log_dir: Option<String>,
    pub log_level: String,
}

impl CliConfig {
    pub fn from_env_and_args(args: impl IntoIterator<Item = String>) -> Self {
        Self::resolve(|key| std::env::var(key).ok(), args)
    }

    fn resolve(
        lookup: impl Fn(&str) -> Option<String>,
        args: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut positional = args.into_iter().filter(|arg| !arg.trim().is_empty());
        let db_path = positional
            .next()
            .or_else(|| lookup(DB_PATH_ENV))
            .map(PathBuf::from);
        let seed_path = positional
            .next()
            .or_else(|| lookup(SEED_PATH_ENV))
            .map(PathBuf::from);

        Self {
            db_path,
            seed_path,
            log_dir: lookup(LOG_DIR_ENV).filter(|dir| !dir.trim().is_empty()),
            log_level: lookup(LOG_LEVEL_ENV).unwrap_or_else(|| default_log_level().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CliConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn positional_arguments_override_environment() {
        let env = HashMap::from([
            (DB_PATH_ENV, "/var/lib/env.db".to_string()),
            (LOG_LEVEL_ENV, "warn".to_string()),
            (LOG_DIR_ENV, "  ".to_string()),
        ]);
        let config = CliConfig::resolve(
            |key| env.get(key).cloned(),
            vec!["/tmp/arg.db".to_string()],
        );

        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/arg.db")));
        assert_eq!(config.seed_path, None);
        assert_eq!(config.log_dir, None);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn defaults_to_in_memory_database() {
        let config = CliConfig::resolve(|_| None, Vec::new());
        assert_eq!(config.db_path, None);
        assert_eq!(config.log_level, music_core::default_log_level());
    }
}
