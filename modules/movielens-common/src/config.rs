use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_NEO4J_URI: &str = "bolt://localhost:7687";
pub const DEFAULT_NEO4J_USER: &str = "neo4j";
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Application configuration loaded from environment variables.
/// Built once at the top of a run and passed down by reference.
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    // Data directories
    pub raw_data_dir: PathBuf,
    pub processed_data_dir: PathBuf,

    // Input files, relative to `raw_data_dir`
    pub ratings_file: String,
    pub movies_file: String,
    pub tags_file: String,

    pub batch_size: usize,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first if present.
    /// `NEO4J_PASSWORD` is the only variable without a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let neo4j_password = lookup("NEO4J_PASSWORD")
            .filter(|p| !p.is_empty())
            .ok_or(ConfigError::Missing("NEO4J_PASSWORD"))?;

        let batch_size = match lookup("BATCH_SIZE") {
            None => DEFAULT_BATCH_SIZE,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "BATCH_SIZE",
                        expected: "a positive integer",
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            neo4j_uri: var("NEO4J_URI", DEFAULT_NEO4J_URI),
            neo4j_user: var("NEO4J_USER", DEFAULT_NEO4J_USER),
            neo4j_password,
            raw_data_dir: PathBuf::from(var("RAW_DATA_DIR", "raw")),
            processed_data_dir: PathBuf::from(var("PROCESSED_DATA_DIR", "processed")),
            ratings_file: var("RATINGS_FILE", "ratings.csv"),
            movies_file: var("MOVIES_FILE", "movies.csv"),
            tags_file: var("TAGS_FILE", "tags.csv"),
            batch_size,
        })
    }

    pub fn ratings_path(&self) -> PathBuf {
        self.raw_data_dir.join(&self.ratings_file)
    }

    pub fn movies_path(&self) -> PathBuf {
        self.raw_data_dir.join(&self.movies_file)
    }

    pub fn tags_path(&self) -> PathBuf {
        self.raw_data_dir.join(&self.tags_file)
    }

    /// Log the effective settings without leaking the password.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let n = val.chars().take(2).map(char::len_utf8).sum::<usize>();
            format!("{}...({} chars)", &val[..n], val.chars().count())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  NEO4J_URI: {}", self.neo4j_uri);
        tracing::info!("  NEO4J_USER: {}", self.neo4j_user);
        tracing::info!("  NEO4J_PASSWORD: {}", preview(&self.neo4j_password));
        tracing::info!("  RAW_DATA_DIR: {}", self.raw_data_dir.display());
        tracing::info!("  PROCESSED_DATA_DIR: {}", self.processed_data_dir.display());
        tracing::info!("  BATCH_SIZE: {}", self.batch_size);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_password_is_set() {
        let config = Config::from_lookup(lookup(&[("NEO4J_PASSWORD", "secret")])).unwrap();
        assert_eq!(config.neo4j_uri, DEFAULT_NEO4J_URI);
        assert_eq!(config.neo4j_user, DEFAULT_NEO4J_USER);
        assert_eq!(config.neo4j_password, "secret");
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.ratings_path(), PathBuf::from("raw/ratings.csv"));
        assert_eq!(config.movies_path(), PathBuf::from("raw/movies.csv"));
        assert_eq!(config.tags_path(), PathBuf::from("raw/tags.csv"));
        assert_eq!(config.processed_data_dir, PathBuf::from("processed"));
    }

    #[test]
    fn password_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("NEO4J_PASSWORD"));

        let err = Config::from_lookup(lookup(&[("NEO4J_PASSWORD", "")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("NEO4J_PASSWORD"));
    }

    #[test]
    fn overrides_are_honoured() {
        let config = Config::from_lookup(lookup(&[
            ("NEO4J_PASSWORD", "pw"),
            ("NEO4J_URI", "bolt://db:7687"),
            ("RAW_DATA_DIR", "/data/ml"),
            ("MOVIES_FILE", "m.csv"),
            ("BATCH_SIZE", "250"),
        ]))
        .unwrap();
        assert_eq!(config.neo4j_uri, "bolt://db:7687");
        assert_eq!(config.movies_path(), PathBuf::from("/data/ml/m.csv"));
        assert_eq!(config.batch_size, 250);
    }

    #[test]
    fn batch_size_must_be_positive_integer() {
        for bad in ["0", "-5", "lots"] {
            let err =
                Config::from_lookup(lookup(&[("NEO4J_PASSWORD", "pw"), ("BATCH_SIZE", bad)]))
                    .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: "BATCH_SIZE", .. }));
        }
    }
}
